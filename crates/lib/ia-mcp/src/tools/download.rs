use ia_core::control::DownloadRequest;
use ia_core::runner::ArchiveRunner;
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};

use crate::{IaMcp, helpers};

/// Parameters for downloading item files.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DownloadParams {
    /// Item identifier (letters, digits, `.`, `_`, `-`).
    pub identifier: String,
    /// Only download files matching this glob, e.g. `*.mp3`.
    pub glob: Option<String>,
    /// Directory to download into.
    pub destdir: Option<String>,
    /// Only download files of this format, e.g. `VBR MP3`.
    pub format: Option<String>,
    /// Report what would be downloaded without transferring anything.
    pub dry_run: Option<bool>,
}

#[tool_router(router = tool_router_download, vis = "pub")]
impl<R: ArchiveRunner> IaMcp<R> {
    #[tool(description = "Download files from an item. Use dry_run to preview without transferring data.")]
    async fn download(
        &self,
        Parameters(params): Parameters<DownloadParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let request = DownloadRequest {
            identifier: params.identifier,
            glob: params.glob,
            destdir: params.destdir,
            format: params.format,
            dry_run: params.dry_run.unwrap_or(false),
        };
        Ok(helpers::text_result(self.control.download(request).await))
    }
}
