//! Volume measurement through an external mesh analysis tool.
//!
//! The tool is run as `<tool> <path>` and its human readable report is
//! scanned for the `Volume   :  ` line ADMesh prints.

use async_trait::async_trait;
use std::{
    io,
    path::Path,
    process::{ExitStatus, Stdio},
    time::Duration,
};
use thiserror::Error;
use tokio::{
    io::AsyncReadExt,
    process::{Child, ChildStdout, Command},
    sync::{AcquireError, Semaphore},
};
use tracing::{debug, warn};

pub const VOLUME_MARKER: &str = "Volume   :  ";
const VOLUME_FIELD_WIDTH: usize = 9;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VolumeResult {
    pub volume: Option<f64>,
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Could not launch {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },
    #[error("Volume tool failed: {0}")]
    ProcessFailure(#[from] io::Error),
    #[error("Volume tool did not finish within {0:?}")]
    TimedOut(Duration),
    #[error("Probe limiter closed")]
    Unavailable(#[from] AcquireError),
    #[error("Unreadable volume field {0:?}")]
    MalformedVolume(String),
}

#[async_trait]
pub trait VolumeProbe: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<VolumeResult, ProbeError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSettings {
    pub tool: String,
    pub timeout: Option<Duration>,
    pub max_output_bytes: Option<u64>,
    pub max_concurrent: Option<usize>,
}

/// Runs the configured tool as a child process for every probe.
pub struct CommandProbe {
    tool: String,
    timeout: Option<Duration>,
    max_output_bytes: Option<u64>,
    limiter: Option<Semaphore>,
}

impl CommandProbe {
    pub fn new(settings: ProbeSettings) -> Self {
        Self {
            tool: settings.tool,
            timeout: settings.timeout,
            max_output_bytes: settings.max_output_bytes,
            limiter: settings.max_concurrent.map(Semaphore::new),
        }
    }

    #[tracing::instrument(skip_all, fields(tool = %self.tool, path = %path.display()))]
    async fn run(&self, path: &Path) -> Result<(String, ExitStatus), ProbeError> {
        let mut child = Command::new(&self.tool)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProbeError::Spawn {
                tool: self.tool.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            io::Error::new(io::ErrorKind::BrokenPipe, "tool stdout was not captured")
        })?;

        let limit = match self.timeout {
            Some(limit) => limit,
            None => return capture(stdout, self.max_output_bytes, &mut child).await,
        };

        let outcome =
            tokio::time::timeout(limit, capture(stdout, self.max_output_bytes, &mut child)).await;

        match outcome {
            Ok(captured) => captured,
            Err(_) => {
                warn!(?limit, "Volume tool timed out, killing it");
                child.kill().await?;
                Err(ProbeError::TimedOut(limit))
            }
        }
    }
}

#[async_trait]
impl VolumeProbe for CommandProbe {
    async fn probe(&self, path: &Path) -> Result<VolumeResult, ProbeError> {
        let _permit = match &self.limiter {
            Some(limiter) => Some(limiter.acquire().await?),
            None => None,
        };

        let (report, status) = self.run(path).await?;

        // The exit status is not trusted either way: ADMesh reports failures
        // in its text, so a partial report is still parsed.
        if !status.success() {
            warn!(
                tool = %self.tool,
                %status,
                path = %path.display(),
                "Volume tool exited unsuccessfully"
            );
        }
        debug!(bytes = report.len(), %status, "Captured volume report");

        Ok(VolumeResult {
            volume: parse_volume(&report)?,
        })
    }
}

/// Reads the child's stdout up to `limit` bytes, drains whatever is left, and
/// waits for the child to exit.
async fn capture(
    mut stdout: ChildStdout,
    limit: Option<u64>,
    child: &mut Child,
) -> Result<(String, ExitStatus), ProbeError> {
    let mut buf = Vec::new();

    match limit {
        Some(limit) => {
            let mut bounded = stdout.take(limit);
            bounded.read_to_end(&mut buf).await?;

            let mut rest = bounded.into_inner();
            let discarded = tokio::io::copy(&mut rest, &mut tokio::io::sink()).await?;
            if discarded > 0 {
                warn!(limit, discarded, "Volume report exceeded capture limit");
            }
        }
        None => {
            stdout.read_to_end(&mut buf).await?;
        }
    }

    let status = child.wait().await?;

    Ok((String::from_utf8_lossy(&buf).into_owned(), status))
}

/// Extracts the fixed width volume field that follows [`VOLUME_MARKER`].
///
/// A report without the marker yields `Ok(None)`.
pub fn parse_volume(report: &str) -> Result<Option<f64>, ProbeError> {
    let start = match report.find(VOLUME_MARKER) {
        Some(index) => index + VOLUME_MARKER.len(),
        None => return Ok(None),
    };

    let field: String = report[start..].chars().take(VOLUME_FIELD_WIDTH).collect();
    if field.chars().count() < VOLUME_FIELD_WIDTH {
        return Err(ProbeError::MalformedVolume(field));
    }

    match field.parse::<f64>() {
        Ok(volume) if volume.is_finite() && volume >= 0.0 => Ok(Some(volume)),
        _ => Err(ProbeError::MalformedVolume(field)),
    }
}
