//! SQLite implementation of the repository boundary.

use rusqlite::{params, ErrorCode, OptionalExtension, Transaction, TransactionBehavior};

use super::{ChangeKind, Database, DbError, DbResult, Entity, Listener, Repository};

impl Repository for Database {
    fn list<T: Entity>(&self) -> DbResult<Vec<T>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT body FROM {} ORDER BY rowid", T::TABLE))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for body in rows {
            records.push(serde_json::from_str(&body?)?);
        }
        Ok(records)
    }

    fn list_for<T: Entity>(&self, owner_id: &str) -> DbResult<Vec<T>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT body FROM {} WHERE owner_id = ? ORDER BY rowid",
            T::TABLE
        ))?;
        let rows = stmt.query_map([owner_id], |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for body in rows {
            records.push(serde_json::from_str(&body?)?);
        }
        Ok(records)
    }

    fn get<T: Entity>(&self, id: &str) -> DbResult<Option<T>> {
        let body: Option<String> = self
            .conn
            .query_row(
                &format!("SELECT body FROM {} WHERE id = ?", T::TABLE),
                [id],
                |row| row.get(0),
            )
            .optional()?;

        body.map(|b| serde_json::from_str(&b))
            .transpose()
            .map_err(Into::into)
    }

    fn add<T: Entity>(&self, entity: &T) -> DbResult<()> {
        let body = serde_json::to_string(entity)?;
        self.conn
            .execute(
                &format!(
                    "INSERT INTO {} (id, owner_id, body) VALUES (?1, ?2, ?3)",
                    T::TABLE
                ),
                params![entity.id(), entity.owner_id(), body],
            )
            .map_err(|e| constraint_or(e, || format!("{} {} already exists", T::TABLE, entity.id())))?;

        self.notifier.emit(T::TABLE, entity.id(), ChangeKind::Added);
        Ok(())
    }

    fn update<T: Entity>(&self, entity: &T) -> DbResult<bool> {
        let body = serde_json::to_string(entity)?;
        let rows_affected = self
            .conn
            .execute(
                &format!(
                    r#"
                    UPDATE {} SET
                        owner_id = ?2,
                        body = ?3,
                        updated_at = datetime('now')
                    WHERE id = ?1
                    "#,
                    T::TABLE
                ),
                params![entity.id(), entity.owner_id(), body],
            )
            .map_err(|e| constraint_or(e, || format!("{} {} is immutable", T::TABLE, entity.id())))?;

        if rows_affected > 0 {
            self.notifier.emit(T::TABLE, entity.id(), ChangeKind::Updated);
        }
        Ok(rows_affected > 0)
    }

    fn delete<T: Entity>(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute(&format!("DELETE FROM {} WHERE id = ?", T::TABLE), [id])
            .map_err(|e| constraint_or(e, || format!("{} {} cannot be deleted", T::TABLE, id)))?;

        if rows_affected > 0 {
            self.notifier.emit(T::TABLE, id, ChangeKind::Deleted);
        }
        Ok(rows_affected > 0)
    }

    fn atomically<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&Self) -> Result<R, E>,
        E: From<DbError>,
    {
        if !self.notifier.begin() {
            // Already inside an atomic unit; join it.
            return f(self);
        }

        let tx = match Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate) {
            Ok(tx) => tx,
            Err(e) => {
                self.notifier.rollback();
                return Err(DbError::from(e).into());
            }
        };

        match f(self) {
            Ok(value) => {
                if let Err(e) = tx.commit() {
                    self.notifier.rollback();
                    return Err(DbError::from(e).into());
                }
                self.notifier.commit();
                Ok(value)
            }
            Err(e) => {
                // Dropping the transaction rolls it back.
                drop(tx);
                self.notifier.rollback();
                Err(e)
            }
        }
    }

    fn subscribe(&self, listener: Listener) {
        self.notifier.subscribe(listener);
    }
}

/// Map SQLite constraint failures (unique key, immutability triggers) to
/// [`DbError::Constraint`].
fn constraint_or(e: rusqlite::Error, message: impl FnOnce() -> String) -> DbError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
            DbError::Constraint(message())
        }
        _ => DbError::Sqlite(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditAction, AuditEntry, Patient, Payment, PaymentMethod};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::sync::{Arc, Mutex};

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn payment(patient_id: &str, amount: rust_decimal::Decimal) -> Payment {
        Payment::new(
            patient_id.into(),
            amount,
            PaymentMethod::Cash,
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        )
    }

    #[test]
    fn test_add_and_get() {
        let db = setup_db();

        let mut patient = Patient::new("Mona Adel".into());
        patient.phone = Some("010 1234 5678".into());
        db.add(&patient).unwrap();

        let retrieved: Patient = db.get(&patient.id).unwrap().unwrap();
        assert_eq!(retrieved, patient);
    }

    #[test]
    fn test_duplicate_add_is_constraint() {
        let db = setup_db();
        let patient = Patient::new("Mona Adel".into());
        db.add(&patient).unwrap();

        let result = db.add(&patient);
        assert!(matches!(result, Err(DbError::Constraint(_))));
    }

    #[test]
    fn test_update_and_delete() {
        let db = setup_db();
        let mut patient = Patient::new("Mona Adel".into());
        db.add(&patient).unwrap();

        patient.notes = Some("Prefers mornings".into());
        assert!(db.update(&patient).unwrap());

        let retrieved: Patient = db.require(&patient.id).unwrap();
        assert_eq!(retrieved.notes, Some("Prefers mornings".into()));

        assert!(db.delete::<Patient>(&patient.id).unwrap());
        assert!(!db.delete::<Patient>(&patient.id).unwrap());
        assert!(db.get::<Patient>(&patient.id).unwrap().is_none());
    }

    #[test]
    fn test_update_unknown_returns_false() {
        let db = setup_db();
        let patient = Patient::new("Ghost".into());
        assert!(!db.update(&patient).unwrap());
    }

    #[test]
    fn test_list_for_owner() {
        let db = setup_db();
        db.add(&payment("p1", dec!(100))).unwrap();
        db.add(&payment("p2", dec!(50))).unwrap();
        db.add(&payment("p1", dec!(25))).unwrap();

        let p1: Vec<Payment> = db.list_for("p1").unwrap();
        assert_eq!(p1.len(), 2);
        assert_eq!(p1[0].amount, dec!(100));
        assert_eq!(p1[1].amount, dec!(25));

        let all: Vec<Payment> = db.list().unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_atomically_rolls_back() {
        let db = setup_db();

        let result: DbResult<()> = db.atomically(|db| {
            db.add(&payment("p1", dec!(100)))?;
            Err(DbError::Constraint("forced".into()))
        });
        assert!(result.is_err());

        let all: Vec<Payment> = db.list().unwrap();
        assert!(all.is_empty());
    }

    #[test]
    fn test_events_delivered_after_commit() {
        let db = setup_db();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        db.subscribe(Box::new(move |e| sink.lock().unwrap().push(e.clone())));

        let _: DbResult<()> = db.atomically(|db| {
            db.add(&payment("p1", dec!(100)))?;
            Err(DbError::Constraint("forced".into()))
        });
        assert!(seen.lock().unwrap().is_empty());

        let p = payment("p1", dec!(40));
        db.atomically(|db| db.add(&p)).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].table, "payments");
        assert_eq!(seen[0].id, p.id);
        assert_eq!(seen[0].kind, ChangeKind::Added);
    }

    #[test]
    fn test_audit_entries_immutable() {
        let db = setup_db();
        let entry = AuditEntry {
            id: "a1".into(),
            sequence: 1,
            actor_id: "s1".into(),
            action: AuditAction::DiscountApproved,
            subject_id: "pay-1".into(),
            patient_id: None,
            amount: None,
            reason: None,
            at: "2024-01-01T00:00:00Z".into(),
            prev_hash: None,
            hash: "h".into(),
        };
        db.add(&entry).unwrap();

        assert!(matches!(db.update(&entry), Err(DbError::Constraint(_))));
        assert!(matches!(db.delete::<AuditEntry>("a1"), Err(DbError::Constraint(_))));
    }
}
