//! Lexer/tokenizer for CQL2-text.

use winnow::ascii::multispace0;
use winnow::combinator::{alt, opt};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take_while;

/// Token types for CQL2-text.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Names and literals
    Ident(String), // property name, keyword or function name
    Integer(i64),
    Float(f64),
    Str(String), // 'quoted'
    Wkt(String), // POLYGON((...)) etc, kept verbatim

    // Comparison operators
    Eq, // =
    Ne, // <>
    Lt, // <
    Le, // <=
    Gt, // >
    Ge, // >=

    // Punctuation
    LParen, // (
    RParen, // )
    Comma,  // ,

    // End of input
    Eof,
}

type PResult<T> = Result<T, ErrMode<ContextError>>;

const WKT_TYPES: [&str; 7] = [
    "POINT",
    "LINESTRING",
    "POLYGON",
    "MULTIPOINT",
    "MULTILINESTRING",
    "MULTIPOLYGON",
    "GEOMETRYCOLLECTION",
];

fn backtrack() -> ErrMode<ContextError> {
    ErrMode::Backtrack(ContextError::default())
}

/// Lex a bare identifier.
/// Allowed: alphanumeric, underscore, colon and dot; must not start with a digit.
fn lex_ident(input: &mut &str) -> PResult<Token> {
    let first = take_while(1, |c: char| c.is_alphabetic() || c == '_').parse_next(input)?;
    let rest = take_while(0.., |c: char| {
        c.is_alphanumeric() || c == '_' || c == ':' || c == '.'
    })
    .parse_next(input)?;

    Ok(Token::Ident(format!("{}{}", first, rest)))
}

/// Lex a double-quoted identifier: `"Site_Name"`.
fn lex_quoted_ident(input: &mut &str) -> PResult<Token> {
    '"'.parse_next(input)?;
    let name = take_while(1.., |c: char| c != '"').parse_next(input)?;
    '"'.parse_next(input)?;
    Ok(Token::Ident(name.to_string()))
}

/// Lex a single-quoted string; `''` escapes a quote.
fn lex_string(input: &mut &str) -> PResult<Token> {
    '\''.parse_next(input)?;
    let mut value = String::new();
    loop {
        let chunk = take_while(0.., |c: char| c != '\'').parse_next(input)?;
        value.push_str(chunk);
        '\''.parse_next(input)?;
        if input.starts_with('\'') {
            '\''.parse_next(input)?;
            value.push('\'');
        } else {
            break;
        }
    }
    Ok(Token::Str(value))
}

/// Lex a number (integer or float).
fn lex_number(input: &mut &str) -> PResult<Token> {
    let neg = opt('-').parse_next(input)?;
    let num_str = take_while(1.., |c: char| c.is_ascii_digit() || c == '.').parse_next(input)?;
    let full = if neg.is_some() {
        format!("-{}", num_str)
    } else {
        num_str.to_string()
    };

    if full.contains('.') {
        full.parse().map(Token::Float).map_err(|_| backtrack())
    } else {
        full.parse().map(Token::Integer).map_err(|_| backtrack())
    }
}

/// Lex a WKT geometry literal, keeping its text for the geometry reader.
fn lex_wkt(input: &mut &str) -> PResult<Token> {
    let start = *input;
    let keyword = take_while(1.., |c: char| c.is_ascii_alphabetic()).parse_next(input)?;
    if !WKT_TYPES.iter().any(|t| t.eq_ignore_ascii_case(keyword)) {
        return Err(backtrack());
    }
    multispace0.parse_next(input)?;
    if !input.starts_with('(') {
        return Err(backtrack());
    }

    let mut depth = 0usize;
    let mut body_end = None;
    for (idx, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    body_end = Some(idx + 1);
                    break;
                }
            }
            _ => {}
        }
    }
    let body_end = body_end.ok_or_else(backtrack)?;

    let consumed = start.len() - input.len() + body_end;
    *input = &start[consumed..];
    Ok(Token::Wkt(start[..consumed].to_string()))
}

/// Lex a single token.
fn lex_token(input: &mut &str) -> PResult<Token> {
    multispace0.parse_next(input)?;

    if input.is_empty() {
        return Ok(Token::Eof);
    }

    alt((
        // Multi-char operators first
        "<>".value(Token::Ne),
        "<=".value(Token::Le),
        ">=".value(Token::Ge),
        // Single-char operators
        "=".value(Token::Eq),
        "<".value(Token::Lt),
        ">".value(Token::Gt),
        "(".value(Token::LParen),
        ")".value(Token::RParen),
        ",".value(Token::Comma),
        lex_string,
        lex_quoted_ident,
        // Number (before ident to catch negative numbers)
        lex_number,
        // Geometry literal (before ident, POINT etc. are otherwise plain names)
        lex_wkt,
        lex_ident,
    ))
    .parse_next(input)
}

/// Tokenize the entire input.
pub fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut remaining = input;
    let mut tokens = Vec::new();

    loop {
        match lex_token(&mut remaining) {
            Ok(Token::Eof) => break,
            Ok(tok) => tokens.push(tok),
            Err(_) => return Err(format!("unexpected input at '{}'", remaining)),
        }
    }

    tokens.push(Token::Eof);
    Ok(tokens)
}
