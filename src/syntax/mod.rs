//! Text form of patterns and values
//!
//! ```text
//! [head, tail, ..]             list with a splat
//! [Seq(k, v), ..1?, rest, ..]  repeated sequence, at least once, lazily
//! Int & n | Str                conjunction binds, `|` binds loosest
//! !Nil                         negation
//! {:name => n, :age}           map entries by key, `:age` binds `age`
//! Point{x: 0, :y}              record fields by name
//! Rational(n, d)               decomposer registered under a name
//! /(\w+)@(\w+)/(user, host)    capture groups of an anchored regex
//! ```
//!
//! Lowercase names other than `nil`, `true`, `false` and `_` are variables,
//! value kinds such as `Int` or `Number` test the kind of the value. Guards
//! have no text form.

mod lexer;
mod parser;

pub use lexer::{lex, Entry, Lexeme, PType};

use crate::config::Options;
use crate::decompose::Registry;
use crate::error::Error;
use crate::matcher::{Bindings, Pattern};
use crate::pattern::Pat;
use crate::value::Value;

/// Malformed text, with the byte offset where reading stopped
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("parse error at {pos}: {message}")]
pub struct ParseError {
  pub pos: usize,
  pub message: String,
}
impl ParseError {
  pub fn new(pos: usize, message: impl Into<String>) -> Self { Self { pos, message: message.into() } }
}

/// Match a value against a pattern given as text, treating a failed match as
/// an error
pub fn assert_pattern(value: &Value, source: &str, registry: &Registry) -> Result<Bindings, Error> {
  let pattern = Pattern::compile(&Pat::parse(source)?, registry, &Options::default())?;
  pattern.matches(value).ok_or_else(|| Error::NoMatchingPattern(value.clone()))
}
