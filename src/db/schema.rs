pub const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS agent_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    agent_name TEXT NOT NULL,
    recorded_at_us INTEGER NOT NULL,
    summary TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_agent_history_agent_time
    ON agent_history(agent_name, recorded_at_us);
";
