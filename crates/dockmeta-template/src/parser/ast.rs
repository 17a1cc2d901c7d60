//! Syntax tree for compiled templates.

/// One piece of a compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Literal text copied to the output.
    Text(String),
    /// An expression whose value is rendered into the output.
    Action(Expr),
}

/// An expression inside an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A field chain from the document root; empty for `.`.
    Field(Vec<String>),
    /// A string literal.
    String(String),
    /// An integer literal.
    Integer(i64),
    /// `index target key...`: successive map or array lookups.
    Index {
        /// Value being indexed.
        target: Box<Expr>,
        /// Keys applied left to right.
        keys: Vec<Expr>,
    },
}
