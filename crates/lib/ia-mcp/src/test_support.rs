use std::time::Duration;

use ia_core::control::{ArchiveControlPlane, OperationTimeouts};
use ia_core::error::{CliError, CliResult};
use ia_core::invoker::InvocationOutput;
use ia_core::runner::ArchiveRunner;
use rmcp::model::CallToolResult;

use crate::IaMcp;

/// Answers every `run` with the same stdout.
pub struct CannedRunner {
    pub stdout: String,
    pub available: bool,
}

impl ArchiveRunner for CannedRunner {
    async fn run(&self, _args: Vec<String>, _timeout: Duration) -> CliResult<InvocationOutput> {
        Ok(InvocationOutput {
            stdout: self.stdout.clone(),
            stderr: String::new(),
        })
    }

    async fn version(&self) -> CliResult<String> {
        if self.available {
            Ok("5.4.0".to_string())
        } else {
            Err(CliError::Unavailable {
                reason: "ia: command not found".to_string(),
            })
        }
    }
}

pub fn control(stdout: &str) -> ArchiveControlPlane<CannedRunner> {
    ArchiveControlPlane::new(
        CannedRunner {
            stdout: stdout.to_string(),
            available: true,
        },
        OperationTimeouts::default(),
    )
}

pub fn server(stdout: &str) -> IaMcp<CannedRunner> {
    IaMcp::new(control(stdout))
}

pub fn unavailable_server() -> IaMcp<CannedRunner> {
    IaMcp::new(ArchiveControlPlane::new(
        CannedRunner {
            stdout: String::new(),
            available: false,
        },
        OperationTimeouts::default(),
    ))
}

pub fn first_text(result: &CallToolResult) -> String {
    result
        .content
        .first()
        .and_then(|content| content.as_text())
        .map(|text| text.text.clone())
        .expect("tool result should carry text content")
}
