//! Repository boundary and change notification.

use std::cell::RefCell;

use super::{DbError, DbResult, Entity};

/// Kind of mutation reported to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Updated,
    Deleted,
}

/// A committed mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: &'static str,
    pub id: String,
    pub kind: ChangeKind,
}

/// Callback invoked after a mutation commits.
pub type Listener = Box<dyn Fn(&ChangeEvent) + Send>;

/// Per-entity capabilities of the clinic data store.
///
/// `list`, `add`, `update` and `delete` are available for every [`Entity`];
/// `atomically` groups several of them into one all-or-nothing unit.
pub trait Repository {
    /// All records of a type, in insertion order.
    fn list<T: Entity>(&self) -> DbResult<Vec<T>>;

    /// Records whose owner key equals `owner_id`.
    fn list_for<T: Entity>(&self, owner_id: &str) -> DbResult<Vec<T>>;

    fn get<T: Entity>(&self, id: &str) -> DbResult<Option<T>>;

    /// Insert a new record. Fails with [`DbError::Constraint`] on a duplicate id.
    fn add<T: Entity>(&self, entity: &T) -> DbResult<()>;

    /// Replace an existing record. Returns `false` when the id is unknown.
    fn update<T: Entity>(&self, entity: &T) -> DbResult<bool>;

    /// Remove a record. Returns `false` when the id is unknown.
    fn delete<T: Entity>(&self, id: &str) -> DbResult<bool>;

    /// Run `f` so that either all of its mutations persist or none do.
    /// Change events are delivered only after a successful commit.
    fn atomically<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&Self) -> Result<R, E>,
        E: From<DbError>;

    /// Register a listener for committed mutations.
    fn subscribe(&self, listener: Listener);

    /// Fetch a record that must exist.
    fn require<T: Entity>(&self, id: &str) -> DbResult<T> {
        self.get(id)?
            .ok_or_else(|| DbError::NotFound(format!("{} {}", T::TABLE, id)))
    }
}

/// Listener registry with transaction-aware buffering.
#[derive(Default)]
pub struct Notifier {
    listeners: RefCell<Vec<Listener>>,
    pending: RefCell<Option<Vec<ChangeEvent>>>,
}

impl Notifier {
    pub fn subscribe(&self, listener: Listener) {
        self.listeners.borrow_mut().push(listener);
    }

    /// Start buffering events. Returns `false` if already buffering.
    pub fn begin(&self) -> bool {
        let mut pending = self.pending.borrow_mut();
        if pending.is_some() {
            return false;
        }
        *pending = Some(Vec::new());
        true
    }

    /// Deliver buffered events.
    pub fn commit(&self) {
        let events = self.pending.borrow_mut().take().unwrap_or_default();
        for event in &events {
            self.dispatch(event);
        }
    }

    /// Drop buffered events.
    pub fn rollback(&self) {
        self.pending.borrow_mut().take();
    }

    pub fn emit(&self, table: &'static str, id: &str, kind: ChangeKind) {
        let event = ChangeEvent {
            table,
            id: id.to_string(),
            kind,
        };
        if let Some(pending) = self.pending.borrow_mut().as_mut() {
            pending.push(event);
            return;
        }
        self.dispatch(&event);
    }

    fn dispatch(&self, event: &ChangeEvent) {
        for listener in self.listeners.borrow().iter() {
            listener(event);
        }
    }
}
