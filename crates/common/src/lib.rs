//! Small utilities shared by the whalebuddy crates.

pub mod http;
pub mod time;
