//! Ports - interfaces the domain needs from the outside world

mod clock;
mod store;

pub use clock::{Clock, ManualClock, MonotonicClock, SystemClock};
pub use store::{KeyValueStore, SharedStore, StoreResult};
