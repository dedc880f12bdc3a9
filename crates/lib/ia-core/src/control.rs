//! Operation handlers for the four archive tools.
//!
//! Each handler validates its inputs, confirms the CLI answers a version
//! probe, runs exactly one subcommand, and shapes the raw output. Every
//! failure leaves the handler as an [`OperationError`] tagged with the
//! operation name.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{CliError, CliResult, OperationError};
use crate::invoker::InvocationOutput;
use crate::runner::ArchiveRunner;

pub mod download;
pub mod item;
pub mod search;

pub use download::DownloadRequest;
pub use search::{SearchRequest, SearchResults};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Per-operation timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationTimeouts {
    /// Applies to search, metadata and list.
    pub default: Duration,
    pub download: Duration,
}

impl Default for OperationTimeouts {
    fn default() -> Self {
        Self {
            default: DEFAULT_TIMEOUT,
            download: DEFAULT_DOWNLOAD_TIMEOUT,
        }
    }
}

pub struct ArchiveControlPlane<R: ArchiveRunner> {
    runner: Arc<R>,
    timeouts: OperationTimeouts,
}

impl<R: ArchiveRunner> Clone for ArchiveControlPlane<R> {
    fn clone(&self) -> Self {
        Self {
            runner: self.runner.clone(),
            timeouts: self.timeouts,
        }
    }
}

impl<R: ArchiveRunner> ArchiveControlPlane<R> {
    #[must_use]
    pub fn new(runner: R, timeouts: OperationTimeouts) -> Self {
        Self::with_runner(Arc::new(runner), timeouts)
    }

    #[must_use]
    pub const fn with_runner(runner: Arc<R>, timeouts: OperationTimeouts) -> Self {
        Self { runner, timeouts }
    }

    #[must_use]
    pub fn runner(&self) -> Arc<R> {
        self.runner.clone()
    }

    /// Confirms the CLI answers `--version`.
    async fn ensure_available(&self) -> CliResult<()> {
        match self.runner.version().await {
            Ok(_) => Ok(()),
            Err(err @ CliError::Unavailable { .. }) => Err(err),
            Err(other) => Err(CliError::Unavailable {
                reason: other.to_string(),
            }),
        }
    }

    async fn run(&self, args: Vec<String>, timeout: Duration) -> CliResult<InvocationOutput> {
        self.ensure_available().await?;
        self.runner.run(args, timeout).await
    }
}

pub(crate) fn tag<T>(operation: &'static str, result: CliResult<T>) -> Result<T, OperationError> {
    result.map_err(|source| OperationError::new(operation, source))
}
