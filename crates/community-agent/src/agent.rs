//! Agent loop
//!
//! Mounts a presence session for the configured store, logs a directory
//! snapshot on every recompute period and unmounts on shutdown.

use std::future::Future;

use community_common::{AppConfig, AppResult};
use community_service::{CommunityDirectory, DirectorySnapshot, PresenceSession, ServiceContext};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::store::connect_store;

/// Run until Ctrl-C
pub async fn run(config: AppConfig) -> AppResult<()> {
    run_until(config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C, shutting down");
        }
    })
    .await
}

/// Run until `shutdown` resolves
pub async fn run_until<F>(config: AppConfig, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()>,
{
    let store = connect_store(&config.storage).await?;
    let ctx = ServiceContext::builder(store)
        .config(config.presence.clone())
        .build();

    let session = PresenceSession::mount(ctx.clone()).await;
    let directory = CommunityDirectory::new(ctx);

    let mut report = tokio::time::interval(config.presence.recompute_interval());
    report.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
            _ = report.tick() => {
                let snapshot = directory.snapshot(&session).await;
                log_snapshot(&snapshot);
            }
        }
    }

    session.unmount().await;
    Ok(())
}

/// Log the directory counters, and each member at debug level
pub fn log_snapshot(snapshot: &DirectorySnapshot) {
    info!(
        members = snapshot.member_count(),
        online = snapshot.online_count(),
        logged_in = !snapshot.show_join_prompt(),
        "Community directory"
    );

    for card in snapshot.member_cards() {
        debug!(
            email = %card.id(),
            name = %card.user.name,
            online = card.is_online,
            me = card.is_current_user,
            last_activity = card.last_activity.as_deref(),
            "Member"
        );
    }
}
