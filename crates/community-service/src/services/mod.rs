//! Presence and directory services
//!
//! Every service reads through a `ServiceContext`, which carries the storage
//! port, the clock and the presence settings.

pub mod activity;
pub mod context;
pub mod directory;
pub mod error;
pub mod presence;
pub mod session;

pub use activity::LastActivityLookup;
pub use context::{ServiceContext, ServiceContextBuilder};
pub use directory::{CommunityDirectory, DirectorySnapshot, MessagingModal};
pub use error::DirectoryError;
pub use presence::{OnlineSet, PresenceTracker};
pub use session::PresenceSession;
