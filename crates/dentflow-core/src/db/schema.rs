//! SQLite schema definition.
//!
//! Each entity table stores the record as a JSON document in `body`, keyed by
//! `id`, with `owner_id` holding the scoping key (patient, supplier or dentist)
//! for indexed lookups.

/// Tables backing [`crate::db::Entity`] implementations.
pub const ENTITY_TABLES: &[&str] = &[
    "patients",
    "staff",
    "appointments",
    "treatment_definitions",
    "treatment_records",
    "inventory_items",
    "payments",
    "doctor_payments",
    "expenses",
    "suppliers",
    "supplier_invoices",
    "lab_cases",
    "prescriptions",
    "audit_log",
];

/// Complete database schema.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- People
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    owner_id TEXT,
    body TEXT NOT NULL,                          -- JSON Patient (chart, attachments inline)
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS staff (
    id TEXT PRIMARY KEY,
    owner_id TEXT,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Scheduling
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointments (
    id TEXT PRIMARY KEY,
    owner_id TEXT,                               -- patient id
    body TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_appointments_owner ON appointments(owner_id);

-- ============================================================================
-- Treatments & Inventory
-- ============================================================================

CREATE TABLE IF NOT EXISTS treatment_definitions (
    id TEXT PRIMARY KEY,
    owner_id TEXT,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS treatment_records (
    id TEXT PRIMARY KEY,
    owner_id TEXT,                               -- patient id
    body TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_treatment_records_owner ON treatment_records(owner_id);

CREATE TABLE IF NOT EXISTS inventory_items (
    id TEXT PRIMARY KEY,
    owner_id TEXT,                               -- supplier id
    body TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Money
-- ============================================================================

CREATE TABLE IF NOT EXISTS payments (
    id TEXT PRIMARY KEY,
    owner_id TEXT,                               -- patient id
    body TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_payments_owner ON payments(owner_id);

CREATE TABLE IF NOT EXISTS doctor_payments (
    id TEXT PRIMARY KEY,
    owner_id TEXT,                               -- dentist id
    body TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_doctor_payments_owner ON doctor_payments(owner_id);

CREATE TABLE IF NOT EXISTS expenses (
    id TEXT PRIMARY KEY,
    owner_id TEXT,                               -- supplier id, NULL for general expenses
    body TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_expenses_owner ON expenses(owner_id);

-- ============================================================================
-- Suppliers & Labs
-- ============================================================================

CREATE TABLE IF NOT EXISTS suppliers (
    id TEXT PRIMARY KEY,
    owner_id TEXT,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS supplier_invoices (
    id TEXT PRIMARY KEY,
    owner_id TEXT,                               -- supplier id
    body TEXT NOT NULL,                          -- JSON invoice (line items, payments inline)
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_supplier_invoices_owner ON supplier_invoices(owner_id);

CREATE TABLE IF NOT EXISTS lab_cases (
    id TEXT PRIMARY KEY,
    owner_id TEXT,                               -- patient id
    body TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_lab_cases_owner ON lab_cases(owner_id);

-- ============================================================================
-- Prescriptions
-- ============================================================================

CREATE TABLE IF NOT EXISTS prescriptions (
    id TEXT PRIMARY KEY,
    owner_id TEXT,                               -- patient id
    body TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_prescriptions_owner ON prescriptions(owner_id);

-- ============================================================================
-- Audit Log (Append-Only)
-- ============================================================================

CREATE TABLE IF NOT EXISTS audit_log (
    id TEXT PRIMARY KEY,
    owner_id TEXT,                               -- patient id, if any
    body TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_audit_log_owner ON audit_log(owner_id);

CREATE TRIGGER IF NOT EXISTS audit_log_no_update BEFORE UPDATE ON audit_log
BEGIN
    SELECT RAISE(ABORT, 'Audit entries are immutable');
END;

CREATE TRIGGER IF NOT EXISTS audit_log_no_delete BEFORE DELETE ON audit_log
BEGIN
    SELECT RAISE(ABORT, 'Audit entries are immutable');
END;
"#;
