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

/// Parameters addressing a single archive item.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ItemParams {
    /// Item identifier (letters, digits, `.`, `_`, `-`).
    pub identifier: String,
}

#[tool_router(router = tool_router_item, vis = "pub")]
impl<R: ArchiveRunner> IaMcp<R> {
    #[tool(description = "Fetch the full metadata document of an item as pretty-printed JSON.")]
    async fn metadata(
        &self,
        Parameters(params): Parameters<ItemParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(helpers::text_result(
            self.control.metadata(&params.identifier).await,
        ))
    }

    #[tool(description = "List every file of an item with sizes, formats and checksums.")]
    async fn list(
        &self,
        Parameters(params): Parameters<ItemParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(helpers::text_result(
            self.control.list_files(&params.identifier).await,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    fn params(identifier: &str) -> Parameters<ItemParams> {
        Parameters(ItemParams {
            identifier: identifier.to_string(),
        })
    }

    #[tokio::test]
    async fn empty_metadata_is_reported_as_tool_error() {
        let server = test_support::server("");

        let result = server
            .metadata(params("nonexistent-item-xyz"))
            .await
            .expect("tool call");

        assert_eq!(result.is_error, Some(true));
        let text = test_support::first_text(&result);
        assert!(text.starts_with("Error in metadata:"), "{text}");
        assert!(text.contains("nonexistent-item-xyz"), "{text}");
    }

    #[tokio::test]
    async fn list_returns_listing_text() {
        let server = test_support::server("file.mp3\n");

        let result = server.list(params("apollo11")).await.expect("tool call");

        assert_ne!(result.is_error, Some(true));
        assert_eq!(
            test_support::first_text(&result),
            "Files in item 'apollo11':\nfile.mp3\n"
        );
    }

    #[tokio::test]
    async fn unavailable_cli_gives_guidance() {
        let server = test_support::unavailable_server();

        let result = server.list(params("apollo11")).await.expect("tool call");

        assert_eq!(result.is_error, Some(true));
        assert!(test_support::first_text(&result).contains("pip install internetarchive"));
    }
}
