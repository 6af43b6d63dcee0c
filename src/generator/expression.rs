//! Tokenizer and parser for the `Name(p1, p2, ...)` generator grammar.

use crate::error::{FlowError, FlowResult};

#[derive(Debug, Clone, Copy, PartialEq)]
enum TokenKind<'a> {
    Ident(&'a str),
    Number(&'a str),
    LParen,
    RParen,
    Comma,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Token<'a> {
    kind: TokenKind<'a>,
    offset: usize,
}

/// A parsed but not yet validated generator expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression<'a> {
    pub name: &'a str,
    pub params: Vec<f64>,
}

fn tokenize(input: &str) -> FlowResult<Vec<Token<'_>>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos] as char;
        let start = pos;
        let kind = match c {
            c if c.is_ascii_whitespace() => {
                pos += 1;
                continue;
            }
            '(' => {
                pos += 1;
                TokenKind::LParen
            }
            ')' => {
                pos += 1;
                TokenKind::RParen
            }
            ',' => {
                pos += 1;
                TokenKind::Comma
            }
            c if c.is_ascii_digit() || c == '.' || c == '-' || c == '+' => {
                pos += 1;
                while pos < bytes.len() {
                    let next = bytes[pos] as char;
                    let exponent_sign =
                        (next == '-' || next == '+') && matches!(bytes[pos - 1], b'e' | b'E');
                    if next.is_ascii_alphanumeric() || next == '.' || exponent_sign {
                        pos += 1;
                    } else {
                        break;
                    }
                }
                TokenKind::Number(&input[start..pos])
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                pos += 1;
                while pos < bytes.len()
                    && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_')
                {
                    pos += 1;
                }
                TokenKind::Ident(&input[start..pos])
            }
            _ => {
                let found = input[start..].chars().next().unwrap_or(c);
                return Err(FlowError::parse(
                    input,
                    format!("unexpected character `{found}` at offset {start}"),
                ));
            }
        };
        tokens.push(Token {
            kind,
            offset: start,
        });
    }
    Ok(tokens)
}

fn describe(token: Option<&Token<'_>>) -> String {
    match token.map(|t| t.kind) {
        None => "end of input".to_string(),
        Some(TokenKind::Ident(text)) | Some(TokenKind::Number(text)) => format!("`{text}`"),
        Some(TokenKind::LParen) => "`(`".to_string(),
        Some(TokenKind::RParen) => "`)`".to_string(),
        Some(TokenKind::Comma) => "`,`".to_string(),
    }
}

fn offset_of(token: Option<&Token<'_>>, input: &str) -> usize {
    token.map(|t| t.offset).unwrap_or(input.len())
}

/// Parses `Name(p1, p2, ...)` into a name and its floating-point parameters.
///
/// The name is not checked against the registry here.
pub fn parse_expression(input: &str) -> FlowResult<Expression<'_>> {
    let tokens = tokenize(input)?;
    let mut iter = tokens.iter().peekable();

    let name = match iter.next() {
        Some(Token {
            kind: TokenKind::Ident(name),
            ..
        }) => *name,
        other => {
            return Err(FlowError::parse(
                input,
                format!("expected a distribution name, found {}", describe(other)),
            ));
        }
    };

    match iter.next() {
        Some(Token {
            kind: TokenKind::LParen,
            ..
        }) => {}
        other => {
            return Err(FlowError::parse(
                input,
                format!(
                    "expected `(` after `{name}` at offset {}, found {}",
                    offset_of(other, input),
                    describe(other)
                ),
            ));
        }
    }

    let mut params = Vec::new();
    if matches!(iter.peek().map(|t| t.kind), Some(TokenKind::RParen)) {
        iter.next();
    } else {
        loop {
            let token = iter.next();
            match token.map(|t| t.kind) {
                Some(TokenKind::Number(text)) => {
                    let value: f64 = text.parse().map_err(|_| {
                        FlowError::parse(
                            input,
                            format!(
                                "parameter {} `{text}` is not a valid number",
                                params.len() + 1
                            ),
                        )
                    })?;
                    if value.is_nan() {
                        return Err(FlowError::parse(
                            input,
                            format!("parameter {} is NaN", params.len() + 1),
                        ));
                    }
                    params.push(value);
                }
                Some(TokenKind::Ident(text)) => {
                    // Rust's float grammar accepts `inf`/`infinity`, which is
                    // a meaningful Pareto cap.
                    let value: f64 = text.parse().map_err(|_| {
                        FlowError::parse(
                            input,
                            format!(
                                "parameter {} `{text}` is not a valid number",
                                params.len() + 1
                            ),
                        )
                    })?;
                    if value.is_nan() {
                        return Err(FlowError::parse(
                            input,
                            format!("parameter {} is NaN", params.len() + 1),
                        ));
                    }
                    params.push(value);
                }
                _ => {
                    return Err(FlowError::parse(
                        input,
                        format!(
                            "expected parameter {} at offset {}, found {}",
                            params.len() + 1,
                            offset_of(token, input),
                            describe(token)
                        ),
                    ));
                }
            }

            let separator = iter.next();
            match separator.map(|t| t.kind) {
                Some(TokenKind::Comma) => continue,
                Some(TokenKind::RParen) => break,
                None => {
                    return Err(FlowError::parse(input, "missing closing `)`"));
                }
                _ => {
                    return Err(FlowError::parse(
                        input,
                        format!(
                            "expected `,` or `)` at offset {}, found {}",
                            offset_of(separator, input),
                            describe(separator)
                        ),
                    ));
                }
            }
        }
    }

    if let Some(trailing) = iter.next() {
        return Err(FlowError::parse(
            input,
            format!(
                "unexpected {} after `)` at offset {}",
                describe(Some(trailing)),
                trailing.offset
            ),
        ));
    }

    Ok(Expression { name, params })
}
