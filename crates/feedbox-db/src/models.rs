/// Database row types — these map directly to SQLite rows.
/// Distinct from feedbox-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub name: String,
    pub surname: String,
    pub created_at: String,
}

pub struct ChannelRow {
    pub id: String,
    pub url: String,
    pub created_at: String,
}

pub struct SubscriptionRow {
    pub id: String,
    pub user_id: String,
    pub channel_id: String,
    pub created_at: String,
}

/// A subscription joined with its channel's canonical URL, as listed under
/// the caller's channels.
pub struct SubscribedChannelRow {
    pub subscription_id: String,
    pub channel_id: String,
    pub url: String,
    pub created_at: String,
}

pub struct ItemRow {
    pub id: String,
    pub channel_id: String,
    pub guid: String,
    pub title: String,
    pub link: String,
    pub published_at: Option<String>,
    pub created_at: String,
}

/// Result of the subscribe transaction: the link, the channel it points at,
/// and how we got there.
pub struct SubscribeResult {
    pub subscription: SubscriptionRow,
    pub channel: ChannelRow,
    /// True when this call created the channel row (first subscriber
    /// anywhere to this canonical URL).
    pub channel_created: bool,
    /// True when the caller already held this link; the transaction then
    /// changed nothing.
    pub already_subscribed: bool,
}
