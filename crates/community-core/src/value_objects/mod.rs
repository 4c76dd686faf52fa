//! Value objects - immutable types that represent domain concepts

mod context_id;
mod storage_key;
mod user_id;

pub use context_id::ContextId;
pub use storage_key::{
    StorageKey, CURRENT_USER_KEY, LAST_SEEN_PREFIX, MESSAGES_KEY, REGISTERED_USERS_KEY,
};
pub use user_id::UserId;
