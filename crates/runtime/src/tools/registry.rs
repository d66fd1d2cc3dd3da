//! Registry of the tools advertised to the completion service.

use std::sync::Arc;

use serde_json::Value;

use super::{ToolHandler, ToolKind};
use crate::model::ToolSpec;
use crate::{Error, Result};

/// A registered tool: its schema plus the capability that runs it.
#[derive(Clone)]
pub struct Tool {
    pub kind: ToolKind,
    pub description: String,
    pub schema: Value,
    pub handler: Arc<dyn ToolHandler>,
}

impl Tool {
    pub fn new(
        kind: ToolKind,
        description: impl Into<String>,
        schema: Value,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            kind,
            description: description.into(),
            schema,
            handler,
        }
    }

    /// The model-facing description of this tool.
    pub fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.kind.name().to_string(),
            description: self.description.clone(),
            schema: self.schema.clone(),
        }
    }
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("kind", &self.kind)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Tools in registration order.
///
/// Built once at startup and shared read-only between turns.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. Each kind may be registered once.
    pub fn register(&mut self, tool: Tool) -> Result<()> {
        if self.tools.iter().any(|t| t.kind == tool.kind) {
            return Err(Error::DuplicateTool(tool.kind.name().to_string()));
        }
        self.tools.push(tool);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, tool: Tool) -> Result<Self> {
        self.register(tool)?;
        Ok(self)
    }

    /// Look a tool up by its wire name.
    pub fn get(&self, name: &str) -> Result<&Tool> {
        let kind: ToolKind = name.parse()?;
        self.get_kind(kind)
    }

    /// Look a tool up by kind.
    pub fn get_kind(&self, kind: ToolKind) -> Result<&Tool> {
        self.tools
            .iter()
            .find(|t| t.kind == kind)
            .ok_or_else(|| Error::UnknownTool(kind.name().to_string()))
    }

    /// Specs for every tool, in registration order.
    pub fn describe_all(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(Tool::spec).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
