pub const SCHEMA: &str = r#"
-- Documents are JSON field maps addressed by (collection, id)
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    fields TEXT NOT NULL,

    -- Commit sequence number of the last write; never reused
    version INTEGER NOT NULL,
    updated_at TEXT DEFAULT (datetime('now')),

    PRIMARY KEY (collection, id)
);

-- Single-row counter handing out commit versions
CREATE TABLE IF NOT EXISTS commit_sequence (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    value INTEGER NOT NULL
);

INSERT OR IGNORE INTO commit_sequence (id, value) VALUES (1, 0);

CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
"#;
