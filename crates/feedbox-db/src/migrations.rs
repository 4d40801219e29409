use crate::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            name        TEXT NOT NULL,
            surname     TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- The per-user active-token set. One row per live session token;
        -- logout deletes exactly one row.
        CREATE TABLE IF NOT EXISTS tokens (
            token       TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            issued_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_tokens_user
            ON tokens(user_id);

        CREATE TABLE IF NOT EXISTS channels (
            id          TEXT PRIMARY KEY,
            url         TEXT NOT NULL UNIQUE,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Junction between users and channels; the unique pair is what
        -- makes a second subscribe attempt observable as a conflict.
        CREATE TABLE IF NOT EXISTS subscriptions (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id),
            channel_id  TEXT NOT NULL REFERENCES channels(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, channel_id)
        );

        CREATE INDEX IF NOT EXISTS idx_subscriptions_user
            ON subscriptions(user_id);

        CREATE TABLE IF NOT EXISTS items (
            id           TEXT PRIMARY KEY,
            channel_id   TEXT NOT NULL REFERENCES channels(id),
            guid         TEXT NOT NULL,
            title        TEXT NOT NULL,
            link         TEXT NOT NULL,
            published_at TEXT,
            created_at   TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(channel_id, guid)
        );

        CREATE INDEX IF NOT EXISTS idx_items_channel
            ON items(channel_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
