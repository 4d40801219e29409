use crate::Database;
use crate::error::{Result, StoreError, is_unique_violation};
use crate::models::{
    ChannelRow, ItemRow, SubscribeResult, SubscribedChannelRow, SubscriptionRow, UserRow,
};
use rusqlite::{Connection, params};

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        email: &str,
        password_hash: &str,
        name: &str,
        surname: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password, name, surname, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, email, password_hash, name, surname, now()],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Conflict("users.email")
                } else {
                    e.into()
                }
            })?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- Session tokens --

    pub fn insert_token(&self, token: &str, user_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tokens (token, user_id, issued_at) VALUES (?1, ?2, ?3)",
                params![token, user_id, now()],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Conflict("tokens")
                } else {
                    e.into()
                }
            })?;
            Ok(())
        })
    }

    /// Stored-set membership check: a token with a valid signature but no
    /// row here has been revoked.
    pub fn token_exists(&self, user_id: &str, token: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM tokens WHERE token = ?1 AND user_id = ?2)",
                params![token, user_id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    /// Removes exactly one token. Returns false when the token was not in
    /// the user's set; other sessions are never touched.
    pub fn delete_token(&self, user_id: &str, token: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM tokens WHERE token = ?1 AND user_id = ?2",
                params![token, user_id],
            )?;
            Ok(n == 1)
        })
    }

    // -- Channels --

    pub fn get_channel(&self, id: &str) -> Result<Option<ChannelRow>> {
        self.with_conn(|conn| query_channel_by_id(conn, id))
    }

    /// Find-or-create keyed on the canonical URL. `candidate_id` is only
    /// used when this call wins the insert; a racing loser reads the
    /// winner's row instead of erroring.
    pub fn find_or_create_channel(
        &self,
        candidate_id: &str,
        url: &str,
    ) -> Result<(ChannelRow, bool)> {
        self.with_conn(|conn| find_or_create_channel(conn, candidate_id, url))
    }

    pub fn update_channel_url(&self, id: &str, url: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE channels SET url = ?1 WHERE id = ?2",
                params![url, id],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Conflict("channels.url")
                } else {
                    e.into()
                }
            })?;
            Ok(())
        })
    }

    pub fn channel_has_items(&self, channel_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM items WHERE channel_id = ?1)",
                [channel_id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    // -- Subscriptions --

    /// The subscribe unit of work: channel find-or-create plus link insert
    /// in one transaction, so a failure partway leaves nothing behind and a
    /// retry with the same inputs lands on the existing rows.
    pub fn create_subscription(
        &self,
        sub_id: &str,
        user_id: &str,
        channel_candidate_id: &str,
        url: &str,
    ) -> Result<SubscribeResult> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let (channel, channel_created) =
                find_or_create_channel(&tx, channel_candidate_id, url)?;

            let created_at = now();
            let inserted = tx.execute(
                "INSERT INTO subscriptions (id, user_id, channel_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![sub_id, user_id, channel.id, created_at],
            );

            let (subscription, already_subscribed) = match inserted {
                Ok(_) => (
                    SubscriptionRow {
                        id: sub_id.to_string(),
                        user_id: user_id.to_string(),
                        channel_id: channel.id.clone(),
                        created_at,
                    },
                    false,
                ),
                Err(e) if is_unique_violation(&e) => {
                    let existing = query_subscription(&tx, user_id, &channel.id)?
                        .ok_or(StoreError::Conflict("subscriptions"))?;
                    (existing, true)
                }
                Err(e) => return Err(e.into()),
            };

            tx.commit()?;

            Ok(SubscribeResult {
                subscription,
                channel,
                channel_created,
                already_subscribed,
            })
        })
    }

    /// The ownership chokepoint. A missing channel and a channel the user
    /// is not linked to both come back as None.
    pub fn confirm_ownership(
        &self,
        user_id: &str,
        channel_id: &str,
    ) -> Result<Option<SubscriptionRow>> {
        self.with_conn(|conn| query_subscription(conn, user_id, channel_id))
    }

    pub fn delete_subscription(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM subscriptions WHERE id = ?1", [id])?;
            Ok(n == 1)
        })
    }

    pub fn list_subscriptions(&self, user_id: &str) -> Result<Vec<SubscribedChannelRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT s.id, s.channel_id, c.url, s.created_at
                 FROM subscriptions s
                 JOIN channels c ON s.channel_id = c.id
                 WHERE s.user_id = ?1
                 ORDER BY s.created_at ASC",
            )?;

            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(SubscribedChannelRow {
                        subscription_id: row.get(0)?,
                        channel_id: row.get(1)?,
                        url: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Content items --

    /// Append-only ingest write. Returns false when the (channel, guid)
    /// pair was already present.
    pub fn insert_item(
        &self,
        id: &str,
        channel_id: &str,
        guid: &str,
        title: &str,
        link: &str,
        published_at: Option<&str>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "INSERT OR IGNORE INTO items (id, channel_id, guid, title, link, published_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![id, channel_id, guid, title, link, published_at, now()],
            )?;
            Ok(n == 1)
        })
    }

    pub fn get_items(&self, channel_id: &str, limit: u32) -> Result<Vec<ItemRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, channel_id, guid, title, link, published_at, created_at
                 FROM items
                 WHERE channel_id = ?1
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2",
            )?;

            let rows = stmt
                .query_map(params![channel_id, limit], |row| {
                    Ok(ItemRow {
                        id: row.get(0)?,
                        channel_id: row.get(1)?,
                        guid: row.get(2)?,
                        title: row.get(3)?,
                        link: row.get(4)?,
                        published_at: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn find_or_create_channel(
    conn: &Connection,
    candidate_id: &str,
    url: &str,
) -> Result<(ChannelRow, bool)> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO channels (id, url, created_at) VALUES (?1, ?2, ?3)",
        params![candidate_id, url, now()],
    )?;

    // The row must exist after the insert, whether we created it or lost
    // the race to an earlier subscriber.
    let row = query_channel_by_url(conn, url)?
        .ok_or(StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows))?;

    Ok((row, inserted == 1))
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, email, password, name, surname, created_at FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                password: row.get(2)?,
                name: row.get(3)?,
                surname: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_channel_by_id(conn: &Connection, id: &str) -> Result<Option<ChannelRow>> {
    let mut stmt = conn.prepare("SELECT id, url, created_at FROM channels WHERE id = ?1")?;

    let row = stmt
        .query_row([id], |row| {
            Ok(ChannelRow {
                id: row.get(0)?,
                url: row.get(1)?,
                created_at: row.get(2)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_channel_by_url(conn: &Connection, url: &str) -> Result<Option<ChannelRow>> {
    let mut stmt = conn.prepare("SELECT id, url, created_at FROM channels WHERE url = ?1")?;

    let row = stmt
        .query_row([url], |row| {
            Ok(ChannelRow {
                id: row.get(0)?,
                url: row.get(1)?,
                created_at: row.get(2)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_subscription(
    conn: &Connection,
    user_id: &str,
    channel_id: &str,
) -> Result<Option<SubscriptionRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, channel_id, created_at
         FROM subscriptions
         WHERE user_id = ?1 AND channel_id = ?2",
    )?;

    let row = stmt
        .query_row(params![user_id, channel_id], |row| {
            Ok(SubscriptionRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                channel_id: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
