//! Presence integration tests
//!
//! Several tabs share one in-memory store under paused Tokio time.
//!
//! Run with: cargo test -p integration-tests --test presence_tests

use std::time::Duration;

use community_core::{KeyValueStore, StorageEvent, StorageKey, UserId};
use community_service::{CommunityDirectory, DirectoryError, MessagingModal};
use integration_tests::{message, unique_user, user, TestCommunity, START_MS};
use tokio::time::sleep;

fn id(email: &str) -> UserId {
    UserId::from(email)
}

// ============================================================================
// Online set
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_recent_marker_online_stale_marker_offline() {
    let community = TestCommunity::new();
    community.seed_users(&[user("a@x.com"), user("b@x.com"), user("c@x.com")]);
    community.seed_marker("a@x.com", START_MS - 100_000);
    community.seed_marker("b@x.com", START_MS - 400_000);

    let (_, session) = community.mount().await;

    assert!(session.is_online(&id("a@x.com")));
    assert!(!session.is_online(&id("b@x.com")));
    assert!(!session.is_online(&id("c@x.com")));
    assert_eq!(session.online().len(), 1);

    session.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn test_viewer_online_after_mount() {
    let community = TestCommunity::new();
    let me = unique_user();
    community.seed_users(&[me.clone(), user("b@x.com")]);
    community.seed_login(&me);

    let (_, session) = community.mount().await;

    assert!(session.is_online(me.id()));
    assert_eq!(community.marker(me.email.as_str()).await, Some(START_MS));

    session.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn test_unregistered_viewer_not_listed_online() {
    let community = TestCommunity::new();
    community.seed_users(&[user("b@x.com")]);
    community.seed_login(&user("ghost@x.com"));

    let (_, session) = community.mount().await;

    // The marker is written, but only registered users are ever online
    assert_eq!(community.marker("ghost@x.com").await, Some(START_MS));
    assert!(session.online().is_empty());

    session.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn test_viewer_stays_online_through_heartbeats() {
    let community = TestCommunity::new();
    let me = user("a@x.com");
    community.seed_users(&[me.clone()]);
    community.seed_login(&me);

    let (_, session) = community.mount().await;

    // Well past the threshold; heartbeats every 2 minutes keep the marker fresh
    sleep(Duration::from_secs(20 * 60 + 1)).await;
    assert!(session.is_online(me.id()));
    assert_eq!(community.marker("a@x.com").await, Some(START_MS + 20 * 60_000));

    session.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn test_other_tab_going_quiet_drops_offline() {
    let community = TestCommunity::new();
    let a = user("a@x.com");
    let b = user("b@x.com");
    community.seed_users(&[a.clone(), b.clone()]);

    community.seed_login(&b);
    let (_, tab_b) = community.mount().await;
    community.seed_login(&a);
    let (_, tab_a) = community.mount().await;

    assert!(tab_a.is_online(b.id()));

    // b closes their tab; a keeps polling
    tab_b.unmount().await;
    sleep(Duration::from_secs(4 * 60 + 50)).await;
    assert!(tab_a.is_online(b.id()));

    sleep(Duration::from_secs(30)).await;
    assert!(!tab_a.is_online(b.id()));
    assert!(tab_a.is_online(a.id()));

    tab_a.unmount().await;
}

// ============================================================================
// Cross-context notifications
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_registration_in_other_tab_reaches_recompute() {
    let community = TestCommunity::new();
    community.seed_users(&[user("a@x.com")]);
    let (_, session) = community.mount().await;

    let newcomer = unique_user();
    community
        .register_from_other_tab(&[user("a@x.com"), newcomer.clone()])
        .await
        .unwrap();
    community.seed_marker(newcomer.email.as_str(), START_MS);

    sleep(Duration::from_secs(31)).await;

    assert_eq!(session.users().len(), 2);
    assert!(session.is_online(newcomer.id()));

    session.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn test_registration_announcement_in_same_tab() {
    let community = TestCommunity::new();
    community.seed_users(&[user("a@x.com")]);
    let (tab, session) = community.mount().await;

    community.seed_users(&[user("a@x.com"), user("b@x.com")]);
    tab.store()
        .announce(StorageEvent::user_registered(
            tab.store().context_id(),
            Some(id("b@x.com")),
        ))
        .await
        .unwrap();

    sleep(Duration::from_millis(1)).await;
    assert_eq!(session.users().len(), 2);

    session.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn test_store_cleared_elsewhere_empties_list() {
    let community = TestCommunity::new();
    community.seed_users(&[user("a@x.com"), user("b@x.com")]);
    let (_, session) = community.mount().await;
    assert_eq!(session.users().len(), 2);

    community.store().open_context().clear();

    sleep(Duration::from_millis(1)).await;
    assert!(session.users().is_empty());

    sleep(Duration::from_secs(30)).await;
    assert!(session.online().is_empty());

    session.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn test_heartbeats_of_other_tabs_do_not_reload() {
    let community = TestCommunity::new();
    community.seed_users(&[user("a@x.com")]);
    let (_, session) = community.mount().await;

    // Silently change the list, then let another tab write an unrelated key
    community.seed_users(&[user("a@x.com"), user("b@x.com")]);
    community
        .store()
        .open_context()
        .set(&StorageKey::last_seen(&id("a@x.com")), &START_MS.to_string())
        .await
        .unwrap();

    sleep(Duration::from_millis(1)).await;
    assert_eq!(session.users().len(), 1);

    session.unmount().await;
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_no_writes_after_unmount() {
    let community = TestCommunity::new();
    let me = user("a@x.com");
    community.seed_users(&[me.clone()]);
    community.seed_login(&me);

    let (_, session) = community.mount().await;
    sleep(Duration::from_secs(5 * 60)).await;
    session.unmount().await;

    let writes = community.store().writes();
    let marker = community.marker("a@x.com").await;

    sleep(Duration::from_secs(60 * 60)).await;
    assert_eq!(community.store().writes(), writes);
    assert_eq!(community.marker("a@x.com").await, marker);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_storage_degrades() {
    let community = TestCommunity::new();
    community.store().seed([
        ("registeredUsers", "{\"oops\":true}"),
        ("messages", "[[[["),
        ("lastSeen_a@x.com", "NaN"),
    ]);

    let (tab, session) = community.mount().await;
    assert!(session.users().is_empty());
    assert!(session.online().is_empty());

    let snapshot = CommunityDirectory::new(tab).snapshot(&session).await;
    assert!(snapshot.is_empty());
    assert!(snapshot.show_join_prompt());

    session.unmount().await;
}

// ============================================================================
// Directory
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_directory_shows_latest_activity() {
    let community = TestCommunity::new();
    let me = user("a@x.com");
    community.seed_users(&[me.clone(), user("b@x.com"), user("c@x.com")]);
    community.seed_login(&me);

    // T1 < T2 with T2 stored first
    let t1 = chrono::DateTime::parse_from_rfc3339("2024-01-05T12:00:00Z")
        .unwrap()
        .timestamp_millis();
    let t2 = chrono::DateTime::parse_from_rfc3339("2024-04-22T12:00:00Z")
        .unwrap()
        .timestamp_millis();
    community.seed_messages(&[message("a@x.com", "b@x.com", t2), message("b@x.com", "a@x.com", t1)]);

    let (tab, session) = community.mount().await;
    let snapshot = CommunityDirectory::new(tab).snapshot(&session).await;
    let cards = snapshot.member_cards();

    assert_eq!(snapshot.member_count(), 3);
    assert_eq!(snapshot.online_count(), 1);
    assert!(cards[0].is_current_user);
    assert_eq!(cards[1].last_activity.as_deref(), Some("22/04/2024"));
    assert!(cards[2].last_activity.is_none());

    session.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn test_messaging_modal_flow() {
    let community = TestCommunity::new();
    let me = user("a@x.com");
    community.seed_users(&[me.clone(), user("b@x.com")]);
    community.seed_login(&me);

    let (tab, session) = community.mount().await;
    let snapshot = CommunityDirectory::new(tab).snapshot(&session).await;
    let mut modal = MessagingModal::new();

    assert_eq!(
        modal.open_for(&snapshot, me.id()),
        Err(DirectoryError::CannotMessageSelf)
    );

    modal.open_for(&snapshot, &id("b@x.com")).unwrap();
    let invocation = modal.invocation();
    assert!(invocation.is_open);
    assert_eq!(invocation.current_user.as_ref(), Some(&me));

    modal.close();
    assert!(!modal.invocation().is_open);
    assert_eq!(modal.invocation().recipient, Some(user("b@x.com")));

    session.unmount().await;
}
