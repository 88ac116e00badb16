//! Request handlers.

pub mod collections;
pub mod health;
pub mod history;
pub mod jobs;
pub mod providers;

pub use health::*;
