//! Template parser built on `nom`.
//!
//! Transforms template source into a list of [`Node`]s through a lexing
//! phase and a recursive-descent pass over the token stream.

pub mod ast;
pub mod lexer;

use dockmeta_common::error::{DockmetaError, Result};

use self::ast::{Expr, Node};
use self::lexer::Token;

/// Cursor into a token stream for recursive-descent parsing.
struct TokenCursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> TokenCursor<'a> {
    const fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }
}

fn parse_err(name: &str, message: impl Into<String>) -> DockmetaError {
    DockmetaError::TemplateSyntax {
        name: name.to_string(),
        message: message.into(),
    }
}

/// Parses template source into its node list.
///
/// # Errors
///
/// Returns [`DockmetaError::TemplateSyntax`] if the source cannot be
/// tokenized, an action is empty or malformed, or an unknown function is
/// called.
pub fn parse_template(name: &str, input: &str) -> Result<Vec<Node>> {
    let tokens = lexer::tokenize(name, input)?;
    let mut cursor = TokenCursor::new(&tokens);
    let mut nodes = Vec::new();
    let mut trim_next = false;

    while let Some(tok) = cursor.advance() {
        match tok {
            Token::Text(text) => {
                let text = if trim_next {
                    text.trim_start()
                } else {
                    text.as_str()
                };
                trim_next = false;
                if !text.is_empty() {
                    nodes.push(Node::Text(text.to_owned()));
                }
            }
            Token::Open { trim } => {
                if *trim {
                    trim_trailing_text(&mut nodes);
                }
                let (expr, close_trim) = parse_action(name, &mut cursor)?;
                if let Some(expr) = expr {
                    nodes.push(Node::Action(expr));
                }
                trim_next = close_trim;
            }
            other => {
                return Err(parse_err(
                    name,
                    format!("unexpected {} outside of an action", other.describe()),
                ));
            }
        }
    }

    Ok(nodes)
}

fn trim_trailing_text(nodes: &mut Vec<Node>) {
    if let Some(Node::Text(text)) = nodes.last_mut() {
        let len = text.trim_end().len();
        text.truncate(len);
        if text.is_empty() {
            let _ = nodes.pop();
        }
    }
}

/// Parses the body of an action after its opening delimiter.
///
/// Returns the expression (`None` for a comment) and whether the closing
/// delimiter trims following whitespace.
fn parse_action(name: &str, cursor: &mut TokenCursor<'_>) -> Result<(Option<Expr>, bool)> {
    let expr = match cursor.advance() {
        None => return Err(parse_err(name, "unclosed action")),
        Some(Token::Close { .. }) => return Err(parse_err(name, "missing value for action")),
        Some(Token::Comment) => None,
        Some(Token::Identifier(func)) => Some(parse_call(name, func, cursor)?),
        Some(tok) => Some(parse_operand(name, tok)?),
    };

    match cursor.advance() {
        Some(Token::Close { trim }) => Ok((expr, *trim)),
        None => Err(parse_err(name, "unclosed action")),
        Some(other) => Err(parse_err(
            name,
            format!("unexpected {} in action", other.describe()),
        )),
    }
}

fn parse_call(name: &str, func: &str, cursor: &mut TokenCursor<'_>) -> Result<Expr> {
    if func != "index" {
        return Err(parse_err(name, format!("function {func:?} not defined")));
    }

    let mut args = Vec::new();
    while let Some(tok) = cursor.peek() {
        if matches!(tok, Token::Close { .. }) {
            break;
        }
        let _ = cursor.advance();
        args.push(parse_operand(name, tok)?);
    }

    let mut args = args.into_iter();
    let Some(target) = args.next() else {
        return Err(parse_err(name, "wrong number of args for index: want at least 1 got 0"));
    };
    Ok(Expr::Index {
        target: Box::new(target),
        keys: args.collect(),
    })
}

fn parse_operand(name: &str, tok: &Token) -> Result<Expr> {
    match tok {
        Token::Field(path) => Ok(Expr::Field(path.clone())),
        Token::StringLiteral(s) => Ok(Expr::String(s.clone())),
        Token::Integer(n) => Ok(Expr::Integer(*n)),
        Token::Identifier(func) => Err(parse_err(
            name,
            format!("function {func:?} cannot be used as an argument"),
        )),
        other => Err(parse_err(
            name,
            format!("unexpected {} in operand", other.describe()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(path: &[&str]) -> Expr {
        Expr::Field(path.iter().map(|s| (*s).to_string()).collect())
    }

    #[test]
    fn parse_text_and_field() {
        let nodes = parse_template("t", "image: {{ .Config.Image }}").expect("should parse");
        assert_eq!(
            nodes,
            vec![
                Node::Text("image: ".into()),
                Node::Action(field(&["Config", "Image"])),
            ]
        );
    }

    #[test]
    fn parse_index_with_keys() {
        let nodes =
            parse_template("t", r#"{{ index .Config.Labels "team" }}"#).expect("should parse");
        assert_eq!(
            nodes,
            vec![Node::Action(Expr::Index {
                target: Box::new(field(&["Config", "Labels"])),
                keys: vec![Expr::String("team".into())],
            })]
        );
    }

    #[test]
    fn parse_drops_comments() {
        let nodes = parse_template("t", "a{{/* hidden */}}b").expect("should parse");
        assert_eq!(nodes, vec![Node::Text("a".into()), Node::Text("b".into())]);
    }

    #[test]
    fn parse_trims_around_markers() {
        let nodes = parse_template("t", "a  {{- .X -}}\n  b").expect("should parse");
        assert_eq!(
            nodes,
            vec![
                Node::Text("a".into()),
                Node::Action(field(&["X"])),
                Node::Text("b".into()),
            ]
        );
    }

    #[test]
    fn parse_error_on_empty_action() {
        let err = parse_template("t", "{{ }}").unwrap_err();
        assert!(err.to_string().contains("missing value"));
    }

    #[test]
    fn parse_error_on_unknown_function() {
        let err = parse_template("t", "{{ upper .Name }}").unwrap_err();
        assert!(err.to_string().contains("not defined"));
    }

    #[test]
    fn parse_error_on_index_without_args() {
        assert!(parse_template("t", "{{ index }}").is_err());
    }

    #[test]
    fn parse_error_on_two_operands() {
        assert!(parse_template("t", "{{ .A .B }}").is_err());
    }

    #[test]
    fn parse_error_names_the_template() {
        let err = parse_template("image", "{{ .Config.Image").unwrap_err();
        assert!(matches!(
            err,
            DockmetaError::TemplateSyntax { ref name, .. } if name == "image"
        ));
    }
}
