//! Video engine wrapper.
//!
//! This crate provides:
//! - [`Engine`]: process-wide FFmpeg handle, initialized once on first use
//! - Filter-graph builders for trim, crop, rotate, preset filters, color
//!   correction, merge and export
//! - FFmpeg command builder and runner with cancellation and timeout

pub mod command;
pub mod engine;
pub mod error;
pub mod filters;

pub use command::{FfmpegCommand, FfmpegRunner};
pub use engine::{Engine, EngineSlot};
pub use error::{MediaError, MediaResult};
pub use filters::{ColorCorrection, FilterPreset, Resolution};
