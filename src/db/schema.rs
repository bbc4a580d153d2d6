/// Schema for the option and fragment tables.
pub const SCHEMA: &str = r#"
-- Durable key-value options (JSON values)
CREATE TABLE IF NOT EXISTS options (
    name TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Rendered fragments; NULL expires_at never expires
CREATE TABLE IF NOT EXISTS fragments (
    cache_key TEXT PRIMARY KEY,
    body TEXT NOT NULL,
    expires_at TEXT,
    stored_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_fragments_expires ON fragments(expires_at);
"#;
