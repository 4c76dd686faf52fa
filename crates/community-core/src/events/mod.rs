//! Storage events - notifications exchanged between storage contexts

mod storage_event;

pub use storage_event::StorageEvent;
