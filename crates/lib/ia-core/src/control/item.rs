use serde_json::Value;
use tracing::info;

use super::{ArchiveControlPlane, tag};
use crate::error::{CliError, CliResult, OperationError};
use crate::runner::ArchiveRunner;
use crate::validate;

impl<R: ArchiveRunner> ArchiveControlPlane<R> {
    /// Fetches the full metadata document of an item, pretty-printed.
    ///
    /// # Errors
    /// Returns `OperationError` for invalid input, a failed invocation, an
    /// empty response, or a response that is not JSON.
    pub async fn metadata(&self, identifier: &str) -> Result<String, OperationError> {
        tag("metadata", self.metadata_inner(identifier).await)
    }

    /// Lists every file of an item with verbose details.
    ///
    /// # Errors
    /// Returns `OperationError` for invalid input, a failed invocation, or an
    /// empty listing.
    pub async fn list_files(&self, identifier: &str) -> Result<String, OperationError> {
        tag("list", self.list_files_inner(identifier).await)
    }

    async fn metadata_inner(&self, identifier: &str) -> CliResult<String> {
        let identifier = validate::identifier(identifier)?;
        let output = self
            .run(
                vec!["metadata".to_string(), identifier.clone()],
                self.timeouts.default,
            )
            .await?;

        if output.stdout.trim().is_empty() {
            return Err(CliError::NotFound {
                what: format!("no metadata found for item '{identifier}'"),
            });
        }

        // Unlike search lines, a malformed document is an error.
        let document: Value =
            serde_json::from_str(&output.stdout).map_err(|err| CliError::InvalidOutput {
                message: format!("metadata for '{identifier}' is not valid JSON: {err}"),
            })?;
        let pretty =
            serde_json::to_string_pretty(&document).map_err(|err| CliError::InvalidOutput {
                message: err.to_string(),
            })?;
        info!(%identifier, "metadata fetched");
        Ok(pretty)
    }

    async fn list_files_inner(&self, identifier: &str) -> CliResult<String> {
        let identifier = validate::identifier(identifier)?;
        let output = self
            .run(
                vec![
                    "list".to_string(),
                    identifier.clone(),
                    "--all".to_string(),
                    "--verbose".to_string(),
                ],
                self.timeouts.default,
            )
            .await?;

        if output.stdout.trim().is_empty() {
            return Err(CliError::NotFound {
                what: format!("no files found for item '{identifier}'"),
            });
        }
        info!(%identifier, "file listing fetched");
        Ok(format!("Files in item '{identifier}':\n{}", output.stdout))
    }
}
