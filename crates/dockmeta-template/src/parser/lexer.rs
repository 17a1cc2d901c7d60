//! Tokenization of template source text using `nom`.
//!
//! Literal text between actions becomes a single [`Token::Text`]. Inside
//! `{{ ... }}` whitespace is discarded between tokens.

use dockmeta_common::error::{DockmetaError, Result};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_until, take_while, take_while1},
    character::complete::{char, digit1, multispace0},
    combinator::{map, map_res, opt, recognize, value},
    multi::many0,
    sequence::{delimited, preceded},
};

/// A token in template source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Literal text outside of actions.
    Text(String),
    /// `{{`, or `{{-` when `trim` is set.
    Open {
        /// Whether preceding whitespace is trimmed.
        trim: bool,
    },
    /// `}}`, or `-}}` when `trim` is set.
    Close {
        /// Whether following whitespace is trimmed.
        trim: bool,
    },
    /// A `/* ... */` comment.
    Comment,
    /// A field chain such as `.Config.Image`; empty for a lone `.`.
    Field(Vec<String>),
    /// A function name.
    Identifier(String),
    /// A double-quoted or backquoted string literal.
    StringLiteral(String),
    /// An integer literal.
    Integer(i64),
}

impl Token {
    /// Short human-readable description used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Text(_) => "text".to_string(),
            Self::Open { .. } => "{{".to_string(),
            Self::Close { .. } => "}}".to_string(),
            Self::Comment => "comment".to_string(),
            Self::Field(path) if path.is_empty() => ".".to_string(),
            Self::Field(path) => format!(".{}", path.join(".")),
            Self::Identifier(name) => name.clone(),
            Self::StringLiteral(s) => format!("{s:?}"),
            Self::Integer(n) => n.to_string(),
        }
    }
}

/// Opening delimiter; `{{-` only trims when followed by whitespace.
fn open_delim(input: &str) -> IResult<&str, Token> {
    let (input, _) = tag("{{").parse(input)?;
    match input.strip_prefix('-') {
        Some(rest) if rest.starts_with(char::is_whitespace) => {
            Ok((rest, Token::Open { trim: true }))
        }
        _ => Ok((input, Token::Open { trim: false })),
    }
}

fn close_delim(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::Close { trim: true }, tag("-}}")),
        value(Token::Close { trim: false }, tag("}}")),
    ))
    .parse(input)
}

fn comment(input: &str) -> IResult<&str, Token> {
    value(
        Token::Comment,
        delimited(tag("/*"), take_until("*/"), tag("*/")),
    )
    .parse(input)
}

/// `"..."`: `\n`, `\t`, `\\` and `\"` are unescaped, other escapes are
/// kept as written.
fn quoted_string(input: &str) -> IResult<&str, Token> {
    let (body, _) = char('"')(input)?;
    let mut text = String::new();
    let mut escaped = false;
    for (idx, c) in body.char_indices() {
        if escaped {
            match c {
                'n' => text.push('\n'),
                't' => text.push('\t'),
                '\\' | '"' => text.push(c),
                other => {
                    text.push('\\');
                    text.push(other);
                }
            }
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return Ok((&body[idx + 1..], Token::StringLiteral(text)));
        } else {
            text.push(c);
        }
    }
    Err(nom::Err::Failure(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

/// `` `...` ``, taken verbatim.
fn raw_string(input: &str) -> IResult<&str, Token> {
    map(
        delimited(char('`'), take_while(|c: char| c != '`'), char('`')),
        |raw: &str| Token::StringLiteral(raw.to_owned()),
    )
    .parse(input)
}

fn integer(input: &str) -> IResult<&str, Token> {
    map(map_res(digit1, str::parse::<i64>), Token::Integer).parse(input)
}

const fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

const fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn field_name(input: &str) -> IResult<&str, &str> {
    take_while1(is_ident_continue)(input)
}

/// Parses `.` or a chain such as `.NetworkSettings.IPAddress`.
fn field_chain(input: &str) -> IResult<&str, Token> {
    let (input, _) = char('.')(input)?;
    let (input, first) = opt(field_name).parse(input)?;
    let Some(first) = first else {
        return Ok((input, Token::Field(Vec::new())));
    };
    let (input, rest) = many0(preceded(char('.'), field_name)).parse(input)?;

    let mut path = Vec::with_capacity(rest.len() + 1);
    path.push(first.to_owned());
    path.extend(rest.into_iter().map(str::to_owned));
    Ok((input, Token::Field(path)))
}

fn identifier(input: &str) -> IResult<&str, Token> {
    let (input, word) =
        recognize((take_while1(is_ident_start), take_while(is_ident_continue))).parse(input)?;
    Ok((input, Token::Identifier(word.to_owned())))
}

/// Parses a single token inside an action (after whitespace is skipped).
fn action_token(input: &str) -> IResult<&str, Token> {
    alt((
        close_delim,
        comment,
        quoted_string,
        raw_string,
        field_chain,
        integer,
        identifier,
    ))
    .parse(input)
}

fn syntax_err(name: &str, message: String) -> DockmetaError {
    DockmetaError::TemplateSyntax {
        name: name.to_string(),
        message,
    }
}

fn snippet(input: &str) -> &str {
    let end = input
        .char_indices()
        .nth(20)
        .map_or(input.len(), |(idx, _)| idx);
    &input[..end]
}

/// Lexes one action body, pushing tokens up to and including the close
/// delimiter. Returns the input following the action.
fn tokenize_action<'a>(name: &str, input: &'a str, tokens: &mut Vec<Token>) -> Result<&'a str> {
    let mut remaining = input;
    loop {
        let (rest, _) = multispace0::<&str, nom::error::Error<&str>>(remaining).map_err(|e| {
            syntax_err(name, format!("lexer error skipping whitespace: {e}"))
        })?;
        if rest.is_empty() {
            return Err(syntax_err(name, "unclosed action".to_string()));
        }
        // `-}}` only trims after whitespace, like `{{-` before it.
        if rest.len() == remaining.len() && rest.starts_with("-}}") {
            return Err(syntax_err(
                name,
                format!("trim marker needs a space before it at: \"{}\"", snippet(rest)),
            ));
        }

        let (rest, token) = action_token(rest).map_err(|e| {
            syntax_err(
                name,
                format!("unexpected character at: \"{}\" ({e})", snippet(rest)),
            )
        })?;
        let closed = matches!(token, Token::Close { .. });
        tokens.push(token);
        remaining = rest;

        if closed {
            return Ok(remaining);
        }
    }
}

/// Tokenizes template source into a vector of tokens.
///
/// `name` only labels error messages.
///
/// # Errors
///
/// Returns an error if an action is never closed or contains characters
/// that cannot be tokenized.
pub fn tokenize(name: &str, input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut remaining = input;

    while !remaining.is_empty() {
        let (rest, text) = take_until::<&str, &str, nom::error::Error<&str>>("{{")(remaining)
            .unwrap_or(("", remaining));
        if !text.is_empty() {
            tokens.push(Token::Text(text.to_owned()));
        }
        if rest.is_empty() {
            break;
        }

        let (rest, open) = open_delim(rest).map_err(|e| {
            syntax_err(name, format!("malformed action delimiter ({e})"))
        })?;
        tokens.push(open);
        remaining = tokenize_action(name, rest, &mut tokens)?;
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(path: &[&str]) -> Token {
        Token::Field(path.iter().map(|s| (*s).to_string()).collect())
    }

    #[test]
    fn tokenize_plain_text() {
        let tokens = tokenize("t", "no actions here").expect("should tokenize");
        assert_eq!(tokens, vec![Token::Text("no actions here".into())]);
    }

    #[test]
    fn tokenize_field_chain() {
        let tokens = tokenize("t", "img={{ .Config.Image }}!").expect("should tokenize");
        assert_eq!(
            tokens,
            vec![
                Token::Text("img=".into()),
                Token::Open { trim: false },
                field(&["Config", "Image"]),
                Token::Close { trim: false },
                Token::Text("!".into()),
            ]
        );
    }

    #[test]
    fn tokenize_lone_dot() {
        let tokens = tokenize("t", "{{.}}").expect("should tokenize");
        assert_eq!(
            tokens,
            vec![
                Token::Open { trim: false },
                field(&[]),
                Token::Close { trim: false },
            ]
        );
    }

    #[test]
    fn tokenize_index_call() {
        let input = r#"{{ index .Config.Labels "com.example.team" 0 }}"#;
        let tokens = tokenize("t", input).expect("should tokenize");
        assert_eq!(
            tokens,
            vec![
                Token::Open { trim: false },
                Token::Identifier("index".into()),
                field(&["Config", "Labels"]),
                Token::StringLiteral("com.example.team".into()),
                Token::Integer(0),
                Token::Close { trim: false },
            ]
        );
    }

    #[test]
    fn tokenize_trim_markers() {
        let tokens = tokenize("t", "a {{- .X -}} b").expect("should tokenize");
        assert_eq!(tokens[1], Token::Open { trim: true });
        assert_eq!(tokens[3], Token::Close { trim: true });
    }

    #[test]
    fn tokenize_comment_and_raw_string() {
        let tokens = tokenize("t", "{{/* note */}}{{ `a\\b` }}").expect("should tokenize");
        assert_eq!(tokens[1], Token::Comment);
        assert_eq!(tokens[4], Token::StringLiteral("a\\b".into()));
    }

    #[test]
    fn tokenize_error_on_unclosed_action() {
        let err = tokenize("t", "{{ .Name ").unwrap_err();
        assert!(err.to_string().contains("unclosed action"));
    }

    #[test]
    fn close_trim_marker_needs_space() {
        let err = tokenize("t", "{{ .X-}}").unwrap_err();
        assert!(err.to_string().contains("trim marker"));
        let tokens = tokenize("t", "{{ .X\t-}}").expect("should tokenize");
        assert_eq!(tokens[2], Token::Close { trim: true });
    }

    #[test]
    fn string_escapes() {
        let tokens = tokenize("t", r#"{{ "a\"b\n\q" }}"#).expect("should tokenize");
        assert_eq!(tokens[1], Token::StringLiteral("a\"b\n\\q".into()));
    }

    #[test]
    fn tokenize_error_on_invalid_char() {
        assert!(tokenize("t", "{{ @Name }}").is_err());
    }

    #[test]
    fn stray_close_is_literal_text() {
        let tokens = tokenize("t", "a }} b").expect("should tokenize");
        assert_eq!(tokens, vec![Token::Text("a }} b".into())]);
    }
}
