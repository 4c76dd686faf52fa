//! # community-service
//!
//! Application layer: presence tracking over the shared store, the session
//! that keeps an online set fresh, and the community directory built on top.

pub mod dto;
pub mod services;

pub use dto::{MemberCard, ModalInvocation};
pub use services::{
    CommunityDirectory, DirectoryError, DirectorySnapshot, LastActivityLookup, MessagingModal,
    OnlineSet, PresenceSession, PresenceTracker, ServiceContext, ServiceContextBuilder,
};
