use ia_core::control::SearchRequest;
use ia_core::runner::ArchiveRunner;
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::{IaMcp, helpers};

/// Parameters for searching the archive.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SearchParams {
    /// Query in Internet Archive advanced search syntax, e.g. `title:"Apollo 11"`.
    pub query: String,
    /// Metadata fields to return for each result, e.g. `identifier`, `title`.
    pub fields: Option<Vec<String>>,
    /// Results per page, 1 to 10000. Defaults to 50.
    pub rows: Option<Number>,
    /// 1-based page number. Defaults to 1.
    pub page: Option<Number>,
}

#[tool_router(router = tool_router_search, vis = "pub")]
impl<R: ArchiveRunner> IaMcp<R> {
    #[tool(description = "Search Internet Archive items. Returns JSON with total_results, page, rows and results.")]
    async fn search(
        &self,
        Parameters(params): Parameters<SearchParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let request = SearchRequest {
            query: params.query,
            fields: params.fields.unwrap_or_default(),
            rows: params.rows,
            page: params.page,
        };
        match self.control.search(request).await {
            Ok(results) => Ok(CallToolResult::success(vec![Content::json(results)?])),
            Err(err) => Ok(helpers::operation_failed(&err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    fn params(query: &str, rows: Option<Number>) -> Parameters<SearchParams> {
        Parameters(SearchParams {
            query: query.to_string(),
            fields: None,
            rows,
            page: None,
        })
    }

    #[tokio::test]
    async fn returns_json_summary() {
        let server = test_support::server("{\"identifier\":\"a\"}\nbroken\n{\"identifier\":\"b\"}\n");

        let result = server
            .search(params("apollo", Some(Number::from(2))))
            .await
            .expect("tool call");

        assert_ne!(result.is_error, Some(true));
        let body: serde_json::Value =
            serde_json::from_str(&test_support::first_text(&result)).expect("json body");
        assert_eq!(body["total_results"], 2);
        assert_eq!(body["rows"], 2);
        assert_eq!(body["page"], 1);
        assert_eq!(body["results"][1]["identifier"], "b");
    }

    #[tokio::test]
    async fn invalid_rows_is_a_tool_error() {
        let server = test_support::server("");

        let result = server
            .search(params("apollo", Some(Number::from(10_001))))
            .await
            .expect("tool call");

        assert_eq!(result.is_error, Some(true));
        assert!(test_support::first_text(&result).starts_with("Error in search:"));
    }
}
