//! Compiled template handle.

use dockmeta_common::error::Result;
use serde_json::Value;

use crate::exec;
use crate::parser::{self, ast::Node};

/// A compiled template, ready to render any number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    nodes: Vec<Node>,
}

impl Template {
    /// Compiles `source`. `name` labels errors, typically the field name.
    ///
    /// # Errors
    ///
    /// Returns [`dockmeta_common::error::DockmetaError::TemplateSyntax`] if
    /// the source is malformed.
    pub fn compile(name: impl Into<String>, source: &str) -> Result<Self> {
        let name = name.into();
        let nodes = parser::parse_template(&name, source)?;
        tracing::trace!(template = %name, nodes = nodes.len(), "template compiled");
        Ok(Self { name, nodes })
    }

    /// Returns the template name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the compiled nodes.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Renders the template against `data`.
    ///
    /// # Errors
    ///
    /// Returns [`dockmeta_common::error::DockmetaError::TemplateExec`] if
    /// the template references something `data` does not have.
    pub fn render(&self, data: &Value) -> Result<String> {
        exec::execute(&self.name, &self.nodes, data)
    }
}
