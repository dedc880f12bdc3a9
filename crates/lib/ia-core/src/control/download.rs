use tracing::info;

use super::{ArchiveControlPlane, tag};
use crate::error::{CliResult, OperationError};
use crate::runner::ArchiveRunner;
use crate::validate;

/// Raw download parameters as received from a caller.
#[derive(Debug, Clone, Default)]
pub struct DownloadRequest {
    pub identifier: String,
    pub glob: Option<String>,
    pub destdir: Option<String>,
    pub format: Option<String>,
    pub dry_run: bool,
}

impl DownloadRequest {
    #[must_use]
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Self::default()
        }
    }
}

impl<R: ArchiveRunner> ArchiveControlPlane<R> {
    /// Downloads files of an item, or reports what would be downloaded.
    ///
    /// Empty output counts as success: `ia` prints nothing when every file
    /// already exists locally.
    ///
    /// # Errors
    /// Returns `OperationError` for invalid input or a failed invocation.
    pub async fn download(&self, request: DownloadRequest) -> Result<String, OperationError> {
        tag("download", self.download_inner(request).await)
    }

    async fn download_inner(&self, request: DownloadRequest) -> CliResult<String> {
        let identifier = validate::identifier(&request.identifier)?;
        let glob = request.glob.as_deref().map(validate::glob).transpose()?;
        let destdir = request.destdir.as_deref().map(validate::destdir).transpose()?;
        let format = request.format.as_deref().map(validate::format).transpose()?;

        let mut args = vec!["download".to_string(), identifier.clone()];
        if let Some(glob) = glob {
            args.push("--glob".to_string());
            args.push(glob);
        }
        if let Some(destdir) = destdir {
            args.push("--destdir".to_string());
            args.push(destdir);
        }
        if let Some(format) = format {
            args.push("--format".to_string());
            args.push(format);
        }
        if request.dry_run {
            args.push("--dry-run".to_string());
        }

        let output = self.run(args, self.timeouts.download).await?;
        // `ia` reports progress on stderr; both streams are returned as written.
        let text = [output.stdout.as_str(), output.stderr.as_str()]
            .into_iter()
            .filter(|stream| !stream.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        info!(%identifier, dry_run = request.dry_run, "download finished");
        if text.is_empty() {
            return Ok(format!(
                "Download of '{identifier}' completed with no output (files may already exist locally)."
            ));
        }
        if request.dry_run {
            Ok(format!(
                "Dry run for '{identifier}' (no files were transferred):\n{text}"
            ))
        } else {
            Ok(format!("Download of '{identifier}' completed:\n{text}"))
        }
    }
}
