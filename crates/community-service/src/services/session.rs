//! Presence session
//!
//! Lifecycle of one viewer of the community page. Mounting marks the viewer
//! active and computes a first online set, then three tasks keep it fresh:
//!
//! - a recompute timer that rebuilds the online set from the latest user list
//! - a heartbeat timer that re-marks the viewer active
//! - a listener that re-reads the user list when another context changes it
//!
//! All tasks stop on `unmount`, and are aborted if the session is dropped.

use std::sync::Arc;
use std::time::Duration;

use community_core::{ContextId, StorageEvent, UserId, UserRecord};
use parking_lot::RwLock;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, trace, warn};

use super::context::ServiceContext;
use super::presence::{OnlineSet, PresenceTracker};

/// State shared between the session handle and its tasks
#[derive(Debug)]
struct SessionState {
    current_user: Option<UserRecord>,
    users: RwLock<Vec<UserRecord>>,
    online: RwLock<OnlineSet>,
}

impl SessionState {
    /// Rebuild the online set over the latest known users
    async fn recompute(&self, tracker: &PresenceTracker) {
        let users = self.users.read().clone();
        let online = tracker.online_set_now(&users).await;
        debug!(users = users.len(), online = online.len(), "Online set refreshed");
        *self.online.write() = online;
    }

    /// Re-read the registered users
    async fn reload_users(&self, tracker: &PresenceTracker) {
        let users = tracker.load_users().await;
        debug!(users = users.len(), "User list reloaded");
        *self.users.write() = users;
    }
}

/// A mounted community page
#[derive(Debug)]
pub struct PresenceSession {
    state: Arc<SessionState>,
    tracker: PresenceTracker,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl PresenceSession {
    /// Mount a session: mark the viewer active, load the users, compute the
    /// first online set and start the background tasks.
    #[instrument(skip_all, fields(context = %ctx.store().context_id()))]
    pub async fn mount(ctx: ServiceContext) -> Self {
        let tracker = PresenceTracker::new(ctx);
        // Subscribe before the first read so no change slips in between
        let events = tracker.context().store().subscribe();

        let current_user = tracker.load_current_user().await;
        if let Some(me) = &current_user {
            tracker.mark_active(me.id()).await;
        }

        let users = tracker.load_users().await;
        let online = tracker.online_set_now(&users).await;

        info!(
            current_user = current_user.as_ref().map(|u| u.email.as_str()),
            users = users.len(),
            online = online.len(),
            "Presence session mounted"
        );

        let state = Arc::new(SessionState {
            current_user,
            users: RwLock::new(users),
            online: RwLock::new(online),
        });

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let config = tracker.context().config();
        let mut tasks = Vec::with_capacity(3);

        tasks.push(tokio::spawn(recompute_loop(
            state.clone(),
            tracker.clone(),
            config.recompute_interval(),
            shutdown_rx.clone(),
        )));

        if let Some(me) = &state.current_user {
            tasks.push(tokio::spawn(heartbeat_loop(
                me.id().clone(),
                tracker.clone(),
                config.heartbeat_interval(),
                shutdown_rx.clone(),
            )));
        }

        tasks.push(tokio::spawn(listen_loop(
            state.clone(),
            tracker.clone(),
            events,
            shutdown_rx,
        )));

        Self {
            state,
            tracker,
            shutdown_tx,
            tasks,
        }
    }

    /// Stop every task and wait for them to finish.
    ///
    /// Once this returns the session performs no further reads or writes.
    pub async fn unmount(mut self) {
        // Receivers may already be gone if every task ended
        let _ = self.shutdown_tx.send(true);

        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                warn!(error = %e, "Presence task ended abnormally");
            }
        }

        info!(context = %self.context_id(), "Presence session unmounted");
    }

    /// Context this session reads and writes through
    pub fn context_id(&self) -> ContextId {
        self.tracker.context().store().context_id()
    }

    pub fn tracker(&self) -> &PresenceTracker {
        &self.tracker
    }

    /// The logged-in viewer read at mount
    pub fn current_user(&self) -> Option<UserRecord> {
        self.state.current_user.clone()
    }

    /// Latest known registered users
    pub fn users(&self) -> Vec<UserRecord> {
        self.state.users.read().clone()
    }

    /// Latest computed online set
    pub fn online(&self) -> OnlineSet {
        self.state.online.read().clone()
    }

    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.state.online.read().contains(user_id)
    }

    /// Rebuild the online set now, outside the timer
    pub async fn recompute(&self) {
        self.state.recompute(&self.tracker).await;
    }

    /// Re-read the user list now, outside the notification path
    pub async fn reload_users(&self) {
        self.state.reload_users(&self.tracker).await;
    }
}

impl Drop for PresenceSession {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

fn ticker(period: Duration) -> tokio::time::Interval {
    // The first tick fires one period after mount, not immediately
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

async fn recompute_loop(
    state: Arc<SessionState>,
    tracker: PresenceTracker,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = ticker(period);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = ticker.tick() => state.recompute(&tracker).await,
        }
    }

    trace!("Recompute timer stopped");
}

async fn heartbeat_loop(
    user_id: UserId,
    tracker: PresenceTracker,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = ticker(period);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                debug!(user_id = %user_id, "Heartbeat");
                tracker.mark_active(&user_id).await;
            }
        }
    }

    trace!("Heartbeat timer stopped");
}

async fn listen_loop(
    state: Arc<SessionState>,
    tracker: PresenceTracker,
    mut events: broadcast::Receiver<StorageEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let observer = tracker.context().store().context_id();

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            event = events.recv() => match event {
                Ok(event) => {
                    trace!(
                        event_type = event.name(),
                        origin = %event.origin(),
                        "Storage notification"
                    );
                    if event.invalidates_user_list(observer) {
                        state.reload_users(&tracker).await;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped = skipped, "Notifications lagged, reloading users");
                    state.reload_users(&tracker).await;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Notification stream closed");
                    break;
                }
            },
        }
    }

    trace!("Notification listener stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use community_cache::MemoryStore;
    use community_core::{KeyValueStore, MonotonicClock, StorageKey};

    const START: i64 = 1_700_000_000_000;

    fn context(store: &MemoryStore) -> ServiceContext {
        ServiceContext::builder(Arc::new(store.clone()))
            .clock(Arc::new(MonotonicClock::new(START)))
            .build()
    }

    fn seed_users(store: &MemoryStore, emails: &[&str]) {
        let users: Vec<UserRecord> = emails
            .iter()
            .map(|email| UserRecord::new(*email, *email))
            .collect();
        store.seed([("registeredUsers", serde_json::to_string(&users).unwrap())]);
    }

    fn login(store: &MemoryStore, email: &str) {
        let me = UserRecord::new(email, email);
        store.seed([("currentUser", serde_json::to_string(&me).unwrap())]);
    }

    async fn marker(store: &MemoryStore, email: &str) -> Option<i64> {
        store
            .get(&StorageKey::last_seen(&UserId::from(email)))
            .await
            .unwrap()
            .and_then(|raw| raw.parse().ok())
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_marks_viewer_and_computes() {
        let store = MemoryStore::new();
        seed_users(&store, &["a@x.com", "b@x.com"]);
        login(&store, "a@x.com");

        let session = PresenceSession::mount(context(&store)).await;

        assert_eq!(store.writes(), 1);
        assert_eq!(marker(&store, "a@x.com").await, Some(START));
        assert!(session.is_online(&UserId::from("a@x.com")));
        assert!(!session.is_online(&UserId::from("b@x.com")));
        assert_eq!(session.users().len(), 2);

        session.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_anonymous_mount_writes_nothing() {
        let store = MemoryStore::new();
        seed_users(&store, &["a@x.com"]);

        let session = PresenceSession::mount(context(&store)).await;
        tokio::time::sleep(Duration::from_secs(600)).await;

        assert!(session.current_user().is_none());
        assert_eq!(store.writes(), 0);
        session.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_every_two_minutes() {
        let store = MemoryStore::new();
        seed_users(&store, &["a@x.com"]);
        login(&store, "a@x.com");

        let session = PresenceSession::mount(context(&store)).await;

        tokio::time::sleep(Duration::from_millis(119_000)).await;
        assert_eq!(store.writes(), 1);

        tokio::time::sleep(Duration::from_millis(2_000)).await;
        assert_eq!(store.writes(), 2);
        assert_eq!(marker(&store, "a@x.com").await, Some(START + 120_000));

        session.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_recompute_drops_stale_users() {
        let store = MemoryStore::new();
        seed_users(&store, &["a@x.com", "b@x.com"]);
        store.seed([("lastSeen_b@x.com", (START - 280_000).to_string())]);

        let session = PresenceSession::mount(context(&store)).await;
        assert!(session.is_online(&UserId::from("b@x.com")));

        // The marker crosses the threshold at +20s, picked up at the +30s tick
        tokio::time::sleep(Duration::from_millis(25_000)).await;
        assert!(session.is_online(&UserId::from("b@x.com")));

        tokio::time::sleep(Duration::from_millis(6_000)).await;
        assert!(!session.is_online(&UserId::from("b@x.com")));

        session.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_context_registration_reloads_users() {
        let store = MemoryStore::new();
        seed_users(&store, &["a@x.com"]);
        let session = PresenceSession::mount(context(&store)).await;

        let other_tab = store.open_context();
        let users = vec![
            UserRecord::new("a", "a@x.com"),
            UserRecord::new("b", "b@x.com"),
        ];
        other_tab
            .set(&StorageKey::RegisteredUsers, &serde_json::to_string(&users).unwrap())
            .await
            .unwrap();
        other_tab
            .set(&StorageKey::last_seen(&UserId::from("b@x.com")), &START.to_string())
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(session.users().len(), 2);
        // Reload alone does not touch the online set
        assert!(!session.is_online(&UserId::from("b@x.com")));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(session.is_online(&UserId::from("b@x.com")));

        session.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_own_writes_do_not_reload() {
        let store = MemoryStore::new();
        seed_users(&store, &["a@x.com"]);
        let ctx = context(&store);
        let session = PresenceSession::mount(ctx.clone()).await;

        // Same context: mirrors a tab never seeing its own storage events
        seed_users(&store, &["a@x.com", "b@x.com"]);
        ctx.store()
            .set(&StorageKey::custom("theme"), "dark")
            .await
            .unwrap();
        store
            .set(&StorageKey::RegisteredUsers, r#"[{"name":"a","email":"a@x.com"},{"name":"b","email":"b@x.com"}]"#)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(session.users().len(), 1);

        session.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_registration_announcement_reloads_from_any_context() {
        let store = MemoryStore::new();
        seed_users(&store, &["a@x.com"]);
        let session = PresenceSession::mount(context(&store)).await;

        seed_users(&store, &["a@x.com", "b@x.com"]);
        store
            .announce(StorageEvent::user_registered(
                store.context_id(),
                Some(UserId::from("b@x.com")),
            ))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(session.users().len(), 2);

        session.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_lagged_notifications_reload_users() {
        let store = MemoryStore::new();
        seed_users(&store, &["a@x.com"]);
        let session = PresenceSession::mount(context(&store)).await;

        // Heartbeats alone never reload, so only the overflow can
        let other_tab = store.open_context();
        for i in 0..300 {
            other_tab
                .set(
                    &StorageKey::last_seen(&UserId::from(format!("u{i}@x.com"))),
                    &START.to_string(),
                )
                .await
                .unwrap();
        }
        seed_users(&store, &["a@x.com", "b@x.com"]);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(session.users().len(), 2);

        session.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_writes_after_unmount() {
        let store = MemoryStore::new();
        seed_users(&store, &["a@x.com"]);
        login(&store, "a@x.com");

        let session = PresenceSession::mount(context(&store)).await;
        session.unmount().await;
        let writes = store.writes();

        tokio::time::sleep(Duration::from_secs(3_600)).await;
        assert_eq!(store.writes(), writes);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_tasks() {
        let store = MemoryStore::new();
        seed_users(&store, &["a@x.com"]);
        login(&store, "a@x.com");

        let session = PresenceSession::mount(context(&store)).await;
        drop(session);
        let writes = store.writes();

        tokio::time::sleep(Duration::from_secs(3_600)).await;
        assert_eq!(store.writes(), writes);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_storage_degrades_to_empty() {
        let store = MemoryStore::new();
        store.seed([
            ("registeredUsers", "not json"),
            ("currentUser", "{\"name\":"),
        ]);

        let session = PresenceSession::mount(context(&store)).await;

        assert!(session.users().is_empty());
        assert!(session.current_user().is_none());
        assert!(session.online().is_empty());
        assert_eq!(store.writes(), 0);

        session.unmount().await;
    }
}
