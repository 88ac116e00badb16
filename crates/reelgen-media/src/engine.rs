//! Process-wide video engine handle.
//!
//! The engine is loaded lazily on first use. Concurrent first callers all
//! await the same in-flight initialization; a failed initialization is not
//! cached, so the next call tries again.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::{watch, OnceCell};
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Overrides the binary lookup in `PATH`.
pub const FFMPEG_PATH_ENV: &str = "FFMPEG_PATH";

static GLOBAL: EngineSlot = EngineSlot::new();

/// A located, verified FFmpeg binary.
#[derive(Debug, Clone)]
pub struct Engine {
    binary: PathBuf,
    version: String,
}

impl Engine {
    /// The shared engine, loading it on first call.
    pub async fn global() -> MediaResult<&'static Engine> {
        GLOBAL.get_or_init(Engine::load).await
    }

    /// Locate FFmpeg and probe its version.
    pub async fn load() -> MediaResult<Engine> {
        let binary = match std::env::var(FFMPEG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path.trim()),
            _ => which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?,
        };
        Self::probe(binary).await
    }

    /// Verify `binary` answers `-version`.
    pub async fn probe(binary: PathBuf) -> MediaResult<Engine> {
        let output = Command::new(&binary)
            .arg("-hide_banner")
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| MediaError::engine_init(format!("{}: {}", binary.display(), e)))?;

        if !output.status.success() {
            return Err(MediaError::engine_init(format!(
                "{} -version exited with {:?}",
                binary.display(),
                output.status.code()
            )));
        }

        let version = parse_version(&String::from_utf8_lossy(&output.stdout))
            .unwrap_or_else(|| "unknown".to_string());
        info!(binary = %binary.display(), version = %version, "Video engine loaded");
        Ok(Engine { binary, version })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Run `filter_graph` over `input`, writing `output`.
    pub async fn apply(
        &self,
        input: impl AsRef<Path>,
        filter_graph: &str,
        output: impl AsRef<Path>,
    ) -> MediaResult<()> {
        self.apply_with_cancel(input, filter_graph, output, None).await
    }

    pub async fn apply_with_cancel(
        &self,
        input: impl AsRef<Path>,
        filter_graph: &str,
        output: impl AsRef<Path>,
        cancel: Option<watch::Receiver<bool>>,
    ) -> MediaResult<()> {
        if filter_graph.trim().is_empty() {
            return Err(MediaError::invalid_parameter("filter graph is empty"));
        }
        let cmd = FfmpegCommand::new(input, output).video_filter(filter_graph);
        self.run(&cmd, cancel).await
    }

    /// Concatenate `inputs` with a graph from [`crate::filters::merge`].
    pub async fn merge<P: AsRef<Path>>(
        &self,
        inputs: &[P],
        filter_graph: &str,
        output: impl AsRef<Path>,
    ) -> MediaResult<()> {
        if inputs.len() < 2 {
            return Err(MediaError::invalid_parameter("merge needs at least two inputs"));
        }
        let cmd = FfmpegCommand::with_inputs(inputs, output)
            .filter_complex(filter_graph)
            .map("[outv]");
        self.run(&cmd, None).await
    }

    async fn run(&self, cmd: &FfmpegCommand, cancel: Option<watch::Receiver<bool>>) -> MediaResult<()> {
        debug!(output = %cmd.output().display(), "Applying filter graph");
        let mut runner = FfmpegRunner::new(&self.binary);
        if let Some(cancel) = cancel {
            runner = runner.with_cancel(cancel);
        }
        runner.run(cmd).await
    }
}

/// Lazily-initialized engine slot.
///
/// Backed by `tokio::sync::OnceCell`: exactly one initializer runs at a time
/// and everyone else waits on it.
pub struct EngineSlot {
    cell: OnceCell<Engine>,
}

impl EngineSlot {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::const_new(),
        }
    }

    pub async fn get_or_init<F, Fut>(&self, init: F) -> MediaResult<&Engine>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = MediaResult<Engine>>,
    {
        self.cell.get_or_try_init(init).await
    }

    pub fn get(&self) -> Option<&Engine> {
        self.cell.get()
    }
}

impl Default for EngineSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract "6.1.1" from "ffmpeg version 6.1.1 Copyright ...".
fn parse_version(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .next()?
        .strip_prefix("ffmpeg version ")?
        .split_whitespace()
        .next()
        .map(str::to_string)
}
