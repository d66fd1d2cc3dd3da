//! Chatbot runtime: completion-service abstraction, tool registry, and the
//! single-turn function-calling loop.
//!
//! # Overview
//!
//! - **Backend**: a trait abstracting completion services (Gemini, etc.).
//! - **ToolRegistry**: the fixed set of tools advertised to the model.
//! - **Dispatcher**: runs one user turn, resolving at most one tool call.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use runtime::{ChatRequest, Dispatcher, GeminiBackend, ToolRegistry};
//!
//! # async fn example() -> runtime::Result<()> {
//! let backend = GeminiBackend::builder("AIza...", "gemini-2.0-flash").build()?;
//! let registry = ToolRegistry::new();
//!
//! let dispatcher = Dispatcher::new(Arc::new(backend), Arc::new(registry));
//! let response = dispatcher.run(ChatRequest::new("oi")?).await?;
//! println!("{}", response.response_text);
//! # Ok(())
//! # }
//! ```

mod dispatch;
mod error;
pub mod model;
pub mod providers;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod tools;

pub use dispatch::{
    CLARIFICATION_PROMPT, ChatRequest, ChatResponse, Dispatcher, UNKNOWN_TOOL_TEXT,
};
pub use error::{Error, Result};
pub use model::{
    Backend, FinishReason, Message, ModelError, ModelRequest, ModelResponse, Part, Role,
    ToolCall, ToolChoice, ToolResult, ToolSpec, Usage,
};
pub use providers::{GeminiBackend, GeminiBackendBuilder};
pub use tools::{Tool, ToolError, ToolHandler, ToolKind, ToolOutput, ToolRegistry, parse_args};
