//! The seam between operation handlers and the external process.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::{CliError, CliResult};
use crate::invoker::{DEFAULT_MAX_OUTPUT_BYTES, InvocationOutput, InvocationRequest, invoke};
use crate::resolver::{ExecutableResolver, ResolvedExecutable, ResolverConfig};

const DEFAULT_VERSION_TIMEOUT: Duration = Duration::from_secs(15);

/// Runs `ia` subcommands on behalf of the control plane.
pub trait ArchiveRunner: Send + Sync + 'static {
    /// Runs `ia <args...>` and returns its raw output.
    fn run(
        &self,
        args: Vec<String>,
        timeout: Duration,
    ) -> impl Future<Output = CliResult<InvocationOutput>> + Send;

    /// Runs `ia --version`, returning the trimmed version string.
    fn version(&self) -> impl Future<Output = CliResult<String>> + Send;
}

/// Limits applied to every invocation made by [`ArchiveCli`].
#[derive(Debug, Clone, Copy)]
pub struct CliLimits {
    pub max_output_bytes: usize,
    pub version_timeout: Duration,
}

impl Default for CliLimits {
    fn default() -> Self {
        Self {
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            version_timeout: DEFAULT_VERSION_TIMEOUT,
        }
    }
}

/// The real `ia` CLI, resolved once per instance.
#[derive(Debug)]
pub struct ArchiveCli {
    resolver: ExecutableResolver,
    limits: CliLimits,
}

impl ArchiveCli {
    #[must_use]
    pub fn new(config: ResolverConfig, limits: CliLimits) -> Self {
        Self {
            resolver: ExecutableResolver::new(config),
            limits,
        }
    }

    /// Returns the memoized executable, resolving it on first use.
    pub async fn executable(&self) -> &ResolvedExecutable {
        self.resolver.resolve().await
    }
}

impl ArchiveRunner for ArchiveCli {
    async fn run(&self, args: Vec<String>, timeout: Duration) -> CliResult<InvocationOutput> {
        let executable = self.resolver.resolve().await;
        let request =
            InvocationRequest::new(args, timeout).with_max_output_bytes(self.limits.max_output_bytes);
        invoke(executable, &request).await
    }

    async fn version(&self) -> CliResult<String> {
        let executable = self.resolver.resolve().await;
        let request = InvocationRequest::new(vec!["--version".to_string()], self.limits.version_timeout)
            .with_max_output_bytes(self.limits.max_output_bytes);
        let output = invoke(executable, &request)
            .await
            .map_err(|err| CliError::Unavailable {
                reason: err.to_string(),
            })?;
        let version = output.stdout.trim().to_string();
        debug!(%version, executable = %executable.display(), "ia responded to version probe");
        Ok(version)
    }
}
