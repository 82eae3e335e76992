//! Tolerant parser for JavaScript object/array literals found in bundles.
//!
//! Bundler output is not JSON: keys are unquoted, strings may use single
//! quotes or backticks, minifiers write `!0` for `true`, and trailing commas
//! are common. The source is first lexed into spanned [`Token`]s and then
//! folded into a [`serde_json::Value`] tree, both with `chumsky`. Anything
//! that is not plain data (calls, operators, template substitutions) is
//! rejected with a positioned [`LiteralError`].

mod lexer;
mod parser;
mod tokens;

use std::fmt::Display;
use std::hash::Hash;
use std::iter::Peekable;
use std::ops::Range;
use std::str::CharIndices;

use chumsky::Stream;
use chumsky::error::{Simple, SimpleReason};
use chumsky::prelude::Parser;
use serde_json::Value;
use thiserror::Error;

use lexer::lexer;
use parser::value_parser;
use tokens::Token;

const MAX_DEPTH: usize = 64;

/// Parse failure with the byte offset it was detected at.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message} at offset {offset}")]
pub struct LiteralError {
    pub offset: usize,
    pub message: String,
}

impl LiteralError {
    fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

/// Parse a single literal into a value tree.
pub fn parse_literal(src: &str) -> Result<Value, LiteralError> {
    let eoi = src.len()..src.len() + 1;
    let chars = src.char_indices().map(|(i, c)| (c, i..i + c.len_utf8()));
    let tokens = lexer()
        .parse(Stream::from_iter(eoi.clone(), chars))
        .map_err(|errs| first_error(errs, "character"))?;
    check_depth(&tokens)?;

    value_parser()
        .parse(Stream::from_iter(eoi, tokens.into_iter()))
        .map_err(|errs| first_error(errs, "token"))
}

fn check_depth(tokens: &[(Token, Range<usize>)]) -> Result<(), LiteralError> {
    let mut depth = 0usize;
    for (token, span) in tokens {
        match token {
            Token::LBrace | Token::LBracket => {
                depth += 1;
                if depth > MAX_DEPTH {
                    return Err(LiteralError::new(span.start, "literal nested too deeply"));
                }
            }
            Token::RBrace | Token::RBracket => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

fn first_error<T: Display + Hash + Eq>(errs: Vec<Simple<T>>, what: &str) -> LiteralError {
    errs.into_iter()
        .map(|err| to_literal_error(err, what))
        .min_by_key(|err| err.offset)
        .unwrap_or_else(|| LiteralError::new(0, "invalid literal"))
}

fn to_literal_error<T: Display + Hash + Eq>(err: Simple<T>, what: &str) -> LiteralError {
    let message = match err.reason() {
        SimpleReason::Custom(message) => message.clone(),
        SimpleReason::Unclosed { delimiter, .. } => format!("unclosed '{delimiter}'"),
        SimpleReason::Unexpected => match err.found() {
            Some(found) => format!("unexpected {what} '{found}'"),
            None => "unexpected end of literal".to_string(),
        },
    };
    LiteralError::new(err.span().start, message)
}

/// Cut the self-contained literal starting at `start` (which must be `[` or
/// `{`) out of surrounding code, honoring strings and comments.
pub fn balanced_literal(text: &str, start: usize) -> Result<&str, LiteralError> {
    let rest = text
        .get(start..)
        .filter(|rest| rest.starts_with(['[', '{']))
        .ok_or_else(|| LiteralError::new(start, "expected '[' or '{'"))?;

    let mut stack: Vec<char> = Vec::new();
    let mut chars = rest.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let offset = start + i;
        match c {
            '[' | '{' | '(' => stack.push(c),
            ']' | '}' | ')' => {
                let expected = match stack.pop() {
                    Some('[') => ']',
                    Some('{') => '}',
                    Some(_) => ')',
                    None => return Err(LiteralError::new(offset, format!("unmatched '{c}'"))),
                };
                if c != expected {
                    return Err(LiteralError::new(
                        offset,
                        format!("expected '{expected}' but found '{c}'"),
                    ));
                }
                if stack.is_empty() {
                    return Ok(&text[start..offset + 1]);
                }
            }
            '\'' | '"' | '`' => {
                skip_string(&mut chars, c)
                    .ok_or_else(|| LiteralError::new(offset, "unterminated string"))?;
            }
            '/' if matches!(chars.peek(), Some((_, '/'))) => {
                for (_, n) in chars.by_ref() {
                    if n == '\n' {
                        break;
                    }
                }
            }
            '/' if matches!(chars.peek(), Some((_, '*'))) => {
                chars.next();
                skip_block_comment(&mut chars)
                    .ok_or_else(|| LiteralError::new(offset, "unterminated block comment"))?;
            }
            _ => {}
        }
    }
    Err(LiteralError::new(start, "unbalanced literal: reached end of input"))
}

fn skip_string(chars: &mut Peekable<CharIndices<'_>>, quote: char) -> Option<()> {
    loop {
        match chars.next()?.1 {
            '\\' => {
                chars.next()?;
            }
            c if c == quote => return Some(()),
            _ => {}
        }
    }
}

fn skip_block_comment(chars: &mut Peekable<CharIndices<'_>>) -> Option<()> {
    let mut prev = '\0';
    loop {
        let (_, c) = chars.next()?;
        if prev == '*' && c == '/' {
            return Some(());
        }
        prev = c;
    }
}
