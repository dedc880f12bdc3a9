use ia_core::OperationError;
use rmcp::model::{CallToolResult, Content};
use tracing::warn;

/// Converts a failed operation into a tool-level error result.
pub fn operation_failed(err: &OperationError) -> CallToolResult {
    warn!(operation = err.operation, error = %err.source, "tool call failed");
    CallToolResult::error(vec![Content::text(err.to_string())])
}

pub fn text_result(result: Result<String, OperationError>) -> CallToolResult {
    match result {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(err) => operation_failed(&err),
    }
}
