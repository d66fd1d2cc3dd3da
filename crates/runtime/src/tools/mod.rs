//! Tool registry and execution.

pub mod errors;
mod registry;
mod types;

pub use errors::ToolError;
pub use registry::{Tool, ToolRegistry};
pub use types::{ToolKind, ToolOutput, parse_args};

use async_trait::async_trait;
use serde_json::Value;

/// Capability that executes one tool.
///
/// This is the boundary between the dispatch loop and side effects.
/// Expected provider failures should come back as a failed [`ToolOutput`];
/// an `Err` is still absorbed by the loop.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn invoke(&self, input: &Value) -> Result<ToolOutput, ToolError>;
}
