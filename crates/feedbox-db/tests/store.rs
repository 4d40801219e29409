use feedbox_db::{Database, StoreError};
use uuid::Uuid;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn make_user(db: &Database, email: &str) -> String {
    let id = new_id();
    db.create_user(&id, email, "argon2-hash", "Test", "User")
        .unwrap();
    id
}

#[test]
fn duplicate_email_is_a_conflict() {
    let db = Database::open_in_memory().unwrap();
    make_user(&db, "a@example.com");

    let err = db
        .create_user(&new_id(), "a@example.com", "hash", "Other", "User")
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict("users.email")));
}

#[test]
fn find_or_create_reuses_the_existing_channel() {
    let db = Database::open_in_memory().unwrap();

    let (first, created) = db
        .find_or_create_channel(&new_id(), "http://example.com/feed")
        .unwrap();
    assert!(created);

    // Second caller loses the insert and reads the winner's row.
    let (second, created) = db
        .find_or_create_channel(&new_id(), "http://example.com/feed")
        .unwrap();
    assert!(!created);
    assert_eq!(first.id, second.id);
}

#[test]
fn two_users_share_one_channel_row() {
    let db = Database::open_in_memory().unwrap();
    let alice = make_user(&db, "alice@example.com");
    let bob = make_user(&db, "bob@example.com");

    let a = db
        .create_subscription(&new_id(), &alice, &new_id(), "http://example.com/feed")
        .unwrap();
    let b = db
        .create_subscription(&new_id(), &bob, &new_id(), "http://example.com/feed")
        .unwrap();

    assert!(a.channel_created);
    assert!(!b.channel_created);
    assert_eq!(a.channel.id, b.channel.id);
    assert_ne!(a.subscription.id, b.subscription.id);
}

#[test]
fn subscribing_twice_yields_one_link() {
    let db = Database::open_in_memory().unwrap();
    let alice = make_user(&db, "alice@example.com");

    let first = db
        .create_subscription(&new_id(), &alice, &new_id(), "http://example.com/feed")
        .unwrap();
    assert!(!first.already_subscribed);

    let second = db
        .create_subscription(&new_id(), &alice, &new_id(), "http://example.com/feed")
        .unwrap();
    assert!(second.already_subscribed);
    assert_eq!(first.subscription.id, second.subscription.id);
    assert_eq!(db.list_subscriptions(&alice).unwrap().len(), 1);
}

#[test]
fn ownership_check_hides_existence() {
    let db = Database::open_in_memory().unwrap();
    let alice = make_user(&db, "alice@example.com");
    let bob = make_user(&db, "bob@example.com");

    let sub = db
        .create_subscription(&new_id(), &alice, &new_id(), "http://example.com/feed")
        .unwrap();

    // Nonexistent channel and someone else's channel are indistinguishable.
    assert!(db.confirm_ownership(&bob, &new_id()).unwrap().is_none());
    assert!(
        db.confirm_ownership(&bob, &sub.channel.id)
            .unwrap()
            .is_none()
    );
    assert!(
        db.confirm_ownership(&alice, &sub.channel.id)
            .unwrap()
            .is_some()
    );
}

#[test]
fn unsubscribe_leaves_other_links_alone() {
    let db = Database::open_in_memory().unwrap();
    let alice = make_user(&db, "alice@example.com");
    let bob = make_user(&db, "bob@example.com");

    let a = db
        .create_subscription(&new_id(), &alice, &new_id(), "http://example.com/feed")
        .unwrap();
    let b = db
        .create_subscription(&new_id(), &bob, &new_id(), "http://example.com/feed")
        .unwrap();

    assert!(db.delete_subscription(&a.subscription.id).unwrap());

    // The channel row and bob's link survive.
    assert!(db.get_channel(&a.channel.id).unwrap().is_some());
    assert!(
        db.confirm_ownership(&bob, &b.channel.id)
            .unwrap()
            .is_some()
    );
    assert!(db.list_subscriptions(&alice).unwrap().is_empty());
}

#[test]
fn reinserting_a_token_is_a_conflict_not_a_sqlite_error() {
    let db = Database::open_in_memory().unwrap();
    let alice = make_user(&db, "alice@example.com");

    db.insert_token("token-one", &alice).unwrap();

    // The tokens table's PRIMARY KEY reports a different extended code
    // than a plain unique index; it must still map to Conflict.
    let err = db.insert_token("token-one", &alice).unwrap_err();
    assert!(matches!(err, StoreError::Conflict("tokens")));
}

#[test]
fn token_removal_is_per_token() {
    let db = Database::open_in_memory().unwrap();
    let alice = make_user(&db, "alice@example.com");

    db.insert_token("token-one", &alice).unwrap();
    db.insert_token("token-two", &alice).unwrap();

    assert!(db.delete_token(&alice, "token-one").unwrap());
    assert!(!db.token_exists(&alice, "token-one").unwrap());
    assert!(db.token_exists(&alice, "token-two").unwrap());

    // Removing a token that is not in the set reports failure.
    assert!(!db.delete_token(&alice, "token-one").unwrap());
}

#[test]
fn items_dedup_by_guid_and_list_newest_first() {
    let db = Database::open_in_memory().unwrap();
    let (channel, _) = db
        .find_or_create_channel(&new_id(), "http://example.com/feed")
        .unwrap();

    assert!(!db.channel_has_items(&channel.id).unwrap());

    assert!(
        db.insert_item(&new_id(), &channel.id, "guid-1", "First", "http://example.com/1", None)
            .unwrap()
    );
    assert!(
        db.insert_item(&new_id(), &channel.id, "guid-2", "Second", "http://example.com/2", None)
            .unwrap()
    );
    // Same guid again is ignored.
    assert!(
        !db.insert_item(&new_id(), &channel.id, "guid-1", "First again", "http://example.com/1", None)
            .unwrap()
    );

    assert!(db.channel_has_items(&channel.id).unwrap());

    let items = db.get_items(&channel.id, 20).unwrap();
    assert_eq!(items.len(), 2);

    let limited = db.get_items(&channel.id, 1).unwrap();
    assert_eq!(limited.len(), 1);
}

#[test]
fn url_edit_respects_the_unique_index() {
    let db = Database::open_in_memory().unwrap();
    let (a, _) = db
        .find_or_create_channel(&new_id(), "http://example.com/feed")
        .unwrap();
    let (b, _) = db
        .find_or_create_channel(&new_id(), "http://other.com/feed")
        .unwrap();

    db.update_channel_url(&a.id, "http://example.com/v2").unwrap();
    assert_eq!(
        db.get_channel(&a.id).unwrap().unwrap().url,
        "http://example.com/v2"
    );

    let err = db.update_channel_url(&b.id, "http://example.com/v2").unwrap_err();
    assert!(matches!(err, StoreError::Conflict("channels.url")));
}
