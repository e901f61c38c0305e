//! Utility functions for id generation, timestamps and clocks.

pub mod timestamps;
mod uuid_utils;

pub use timestamps::{format_iso8601, Clock, ManualClock, SystemClock, Timestamp};
pub use uuid_utils::{generate_id, generate_uuid};
