pub const SCHEMA: &str = r#"
-- Accounts; permissions is a capability bitmask, ignored for admins
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,       -- argon2id hash with embedded salt
    role TEXT NOT NULL DEFAULT 'user', -- 'admin' | 'user'
    permissions INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Login sessions; the raw token is only ever shown to the client
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    token_hash TEXT NOT NULL,
    token_lookup TEXT NOT NULL,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),
    expires_at TEXT NOT NULL,
    last_used_at TEXT
);

-- Reports are owned exclusively by their author
CREATE TABLE IF NOT EXISTS reports (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    content TEXT NOT NULL DEFAULT '',
    date TEXT NOT NULL,
    author_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,

    -- total_violations is written once, at creation
    accepted_violations INTEGER NOT NULL DEFAULT 0,
    rejected_violations INTEGER NOT NULL DEFAULT 0,
    total_violations INTEGER NOT NULL DEFAULT 0,

    -- Paths relative to the data directory
    image_path TEXT,
    signature_path TEXT,

    status TEXT NOT NULL DEFAULT 'pending', -- 'pending' | 'accepted' | 'rejected'
    created_at TEXT DEFAULT (datetime('now'))
);

-- Print layout; exactly one row
CREATE TABLE IF NOT EXISTS system_settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    header_text TEXT NOT NULL DEFAULT '',
    logo_path TEXT,
    commander_name TEXT NOT NULL DEFAULT '',
    paper_size TEXT NOT NULL DEFAULT 'A4',
    margin_top REAL NOT NULL DEFAULT 20,
    margin_bottom REAL NOT NULL DEFAULT 20,
    margin_right REAL NOT NULL DEFAULT 20,
    margin_left REAL NOT NULL DEFAULT 20,
    font_family TEXT NOT NULL DEFAULT 'Arial',
    font_size INTEGER NOT NULL DEFAULT 14,
    show_logo INTEGER NOT NULL DEFAULT 1,
    show_header INTEGER NOT NULL DEFAULT 1,
    show_signature INTEGER NOT NULL DEFAULT 1,
    show_image INTEGER NOT NULL DEFAULT 1,
    footer_text TEXT NOT NULL DEFAULT ''
);

-- Reusable report bodies
CREATE TABLE IF NOT EXISTS report_templates (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    content TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Create indexes
CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_lookup ON sessions(token_lookup);
CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
CREATE INDEX IF NOT EXISTS idx_reports_author ON reports(author_id);
CREATE INDEX IF NOT EXISTS idx_reports_status ON reports(status);
"#;
