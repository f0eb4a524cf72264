//! In-memory repository.

use std::cell::RefCell;
use std::collections::HashMap;

use super::{ChangeKind, DbError, DbResult, Entity, Listener, Notifier, Repository};

/// A stored document: id, owner key, JSON body.
#[derive(Debug, Clone)]
struct Row {
    id: String,
    owner_id: Option<String>,
    body: String,
}

type Tables = HashMap<&'static str, Vec<Row>>;

/// Repository backed by process memory. Records are held as JSON so the
/// round trip matches [`crate::db::Database`].
#[derive(Default)]
pub struct MemoryStore {
    tables: RefCell<Tables>,
    notifier: Notifier,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Repository for MemoryStore {
    fn list<T: Entity>(&self) -> DbResult<Vec<T>> {
        let tables = self.tables.borrow();
        let Some(rows) = tables.get(T::TABLE) else {
            return Ok(Vec::new());
        };
        rows.iter()
            .map(|row| serde_json::from_str(&row.body).map_err(Into::into))
            .collect()
    }

    fn list_for<T: Entity>(&self, owner_id: &str) -> DbResult<Vec<T>> {
        let tables = self.tables.borrow();
        let Some(rows) = tables.get(T::TABLE) else {
            return Ok(Vec::new());
        };
        rows.iter()
            .filter(|row| row.owner_id.as_deref() == Some(owner_id))
            .map(|row| serde_json::from_str(&row.body).map_err(Into::into))
            .collect()
    }

    fn get<T: Entity>(&self, id: &str) -> DbResult<Option<T>> {
        let tables = self.tables.borrow();
        tables
            .get(T::TABLE)
            .and_then(|rows| rows.iter().find(|row| row.id == id))
            .map(|row| serde_json::from_str(&row.body))
            .transpose()
            .map_err(Into::into)
    }

    fn add<T: Entity>(&self, entity: &T) -> DbResult<()> {
        let row = Row {
            id: entity.id().to_string(),
            owner_id: entity.owner_id().map(str::to_string),
            body: serde_json::to_string(entity)?,
        };

        {
            let mut tables = self.tables.borrow_mut();
            let rows = tables.entry(T::TABLE).or_default();
            if rows.iter().any(|r| r.id == row.id) {
                return Err(DbError::Constraint(format!(
                    "{} {} already exists",
                    T::TABLE,
                    row.id
                )));
            }
            rows.push(row);
        }

        self.notifier.emit(T::TABLE, entity.id(), ChangeKind::Added);
        Ok(())
    }

    fn update<T: Entity>(&self, entity: &T) -> DbResult<bool> {
        if is_append_only(T::TABLE) {
            return Err(DbError::Constraint(format!(
                "{} {} is immutable",
                T::TABLE,
                entity.id()
            )));
        }
        let body = serde_json::to_string(entity)?;

        let found = {
            let mut tables = self.tables.borrow_mut();
            match tables
                .get_mut(T::TABLE)
                .and_then(|rows| rows.iter_mut().find(|r| r.id == entity.id()))
            {
                Some(row) => {
                    row.owner_id = entity.owner_id().map(str::to_string);
                    row.body = body;
                    true
                }
                None => false,
            }
        };

        if found {
            self.notifier.emit(T::TABLE, entity.id(), ChangeKind::Updated);
        }
        Ok(found)
    }

    fn delete<T: Entity>(&self, id: &str) -> DbResult<bool> {
        if is_append_only(T::TABLE) {
            return Err(DbError::Constraint(format!(
                "{} {} cannot be deleted",
                T::TABLE,
                id
            )));
        }

        let removed = {
            let mut tables = self.tables.borrow_mut();
            match tables.get_mut(T::TABLE) {
                Some(rows) => {
                    let before = rows.len();
                    rows.retain(|r| r.id != id);
                    rows.len() < before
                }
                None => false,
            }
        };

        if removed {
            self.notifier.emit(T::TABLE, id, ChangeKind::Deleted);
        }
        Ok(removed)
    }

    fn atomically<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&Self) -> Result<R, E>,
        E: From<DbError>,
    {
        if !self.notifier.begin() {
            return f(self);
        }

        let snapshot = self.tables.borrow().clone();
        match f(self) {
            Ok(value) => {
                self.notifier.commit();
                Ok(value)
            }
            Err(e) => {
                *self.tables.borrow_mut() = snapshot;
                self.notifier.rollback();
                Err(e)
            }
        }
    }

    fn subscribe(&self, listener: Listener) {
        self.notifier.subscribe(listener);
    }
}

fn is_append_only(table: &str) -> bool {
    table == <crate::models::AuditEntry as Entity>::TABLE
}
