//! MCP server implementation for ia-mcp.
//!
//! This crate wires the archive control plane into rmcp tool handlers and
//! exposes the four read-only Internet Archive tools.

mod helpers;
mod tools;
pub mod server;
#[cfg(test)]
mod test_support;

use ia_core::control::ArchiveControlPlane;
use ia_core::runner::ArchiveRunner;
use rmcp::{
    ServerHandler,
    handler::server::tool::ToolRouter,
    tool_handler,
};
use rmcp::model::{ServerCapabilities, ServerInfo};

pub use tools::download::DownloadParams;
pub use tools::item::ItemParams;
pub use tools::search::SearchParams;

const SERVER_INSTRUCTIONS: &str = r#"ia-mcp exposes read-only Internet Archive operations through the `ia` command-line tool.

Tools:
- `search`: `query` (advanced search syntax, e.g. `title:"Apollo 11" AND mediatype:movies`),
  optional `fields` (metadata field names), `rows` (1-10000, default 50), `page` (default 1).
  Returns JSON `{total_results, page, rows, results}`; `total_results` counts the records returned.
- `metadata`: `identifier`. Returns the item's full metadata document.
- `list`: `identifier`. Returns the item's verbose file listing.
- `download`: `identifier`, optional `glob`, `destdir`, `format`, `dry_run`.
  Use `dry_run` first to preview large items.

Notes:
- Identifiers may only contain letters, digits, `.`, `_` and `-`.
- Failures are returned as tool errors prefixed with `Error in <tool>:`.
- If `ia` is missing, install it with `pip install internetarchive` and run `ia configure`."#;

/// MCP server wrapper around the archive control plane and tool routers.
pub struct IaMcp<R: ArchiveRunner> {
    tool_router: ToolRouter<Self>,
    control: ArchiveControlPlane<R>,
}

impl<R: ArchiveRunner> Clone for IaMcp<R> {
    fn clone(&self) -> Self {
        Self {
            tool_router: self.tool_router.clone(),
            control: self.control.clone(),
        }
    }
}

impl<R: ArchiveRunner> IaMcp<R> {
    /// Creates a new server around a control plane.
    #[must_use]
    pub fn new(control: ArchiveControlPlane<R>) -> Self {
        let tool_router = Self::tool_router_search()
            + Self::tool_router_item()
            + Self::tool_router_download();
        Self {
            tool_router,
            control,
        }
    }
}

#[tool_handler]
impl<R: ArchiveRunner> ServerHandler for IaMcp<R> {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support;

    #[test]
    fn registers_the_four_archive_tools() {
        let server = test_support::server("");
        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["download", "list", "metadata", "search"]);
    }

    #[test]
    fn instructions_mention_every_tool() {
        let info = rmcp::ServerHandler::get_info(&test_support::server(""));
        let instructions = info.instructions.expect("instructions");
        for tool in ["`search`", "`metadata`", "`list`", "`download`"] {
            assert!(instructions.contains(tool), "missing {tool}");
        }
    }
}
