//! Data Transfer Objects
//!
//! View models handed to whatever renders the community page.

pub mod responses;

pub use responses::{MemberCard, ModalInvocation};
