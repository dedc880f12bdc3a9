use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use tracing::{info, warn};

use super::{ArchiveControlPlane, tag};
use crate::error::{CliResult, OperationError};
use crate::runner::ArchiveRunner;
use crate::validate;

pub const DEFAULT_ROWS: u32 = 50;
pub const DEFAULT_PAGE: u32 = 1;

/// Raw search parameters as received from a caller.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: String,
    pub fields: Vec<String>,
    pub rows: Option<Number>,
    pub page: Option<Number>,
}

impl SearchRequest {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    /// Number of records that parsed, not the archive-wide hit count.
    pub total_results: usize,
    pub page: u32,
    pub rows: u32,
    pub results: Vec<Value>,
}

impl<R: ArchiveRunner> ArchiveControlPlane<R> {
    /// Runs `ia search` and collects its newline-delimited JSON records.
    ///
    /// # Errors
    /// Returns `OperationError` for invalid input or a failed invocation.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResults, OperationError> {
        tag("search", self.search_inner(request).await)
    }

    async fn search_inner(&self, request: SearchRequest) -> CliResult<SearchResults> {
        let query = validate::query(&request.query)?;
        let rows = request
            .rows
            .as_ref()
            .map_or(Ok(DEFAULT_ROWS), validate::rows)?;
        let page = request
            .page
            .as_ref()
            .map_or(Ok(DEFAULT_PAGE), validate::page)?;
        let fields = request
            .fields
            .iter()
            .map(|field| validate::field_name(field))
            .collect::<Result<Vec<_>, _>>()?;

        let mut args = vec![
            "search".to_string(),
            query,
            "--parameters".to_string(),
            format!("page={page}&rows={rows}"),
        ];
        for field in fields {
            args.push("--field".to_string());
            args.push(field);
        }

        let output = self.run(args, self.timeouts.default).await?;
        let results = parse_records(&output.stdout);
        info!(count = results.len(), page, rows, "search completed");
        Ok(SearchResults {
            total_results: results.len(),
            page,
            rows,
            results,
        })
    }
}

/// Parses one JSON document per line, skipping lines that do not parse.
#[must_use]
pub fn parse_records(stdout: &str) -> Vec<Value> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<Value>(line) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(%err, "skipping unparseable search result line");
                None
            }
        })
        .collect()
}
