use std::fmt;

use super::Value;

/// A category of values. Kind tests accept every value of the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
  Nil,
  Bool,
  Int,
  Float,
  /// Any of [Kind::Int], [Kind::Float], [Kind::Rational] or [Kind::Complex]
  Number,
  Str,
  Sym,
  List,
  Map,
  Record,
  Rational,
  Complex,
  Foreign,
}

impl Kind {
  pub const ALL: [Kind; 13] = [
    Self::Nil,
    Self::Bool,
    Self::Int,
    Self::Float,
    Self::Number,
    Self::Str,
    Self::Sym,
    Self::List,
    Self::Map,
    Self::Record,
    Self::Rational,
    Self::Complex,
    Self::Foreign,
  ];

  /// Whether the value belongs to this category
  pub fn accepts(self, value: &Value) -> bool {
    match self {
      Self::Number => matches!(value.kind(), Self::Int | Self::Float | Self::Rational | Self::Complex),
      kind => value.kind() == kind,
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      Self::Nil => "Nil",
      Self::Bool => "Bool",
      Self::Int => "Int",
      Self::Float => "Float",
      Self::Number => "Number",
      Self::Str => "Str",
      Self::Sym => "Sym",
      Self::List => "List",
      Self::Map => "Map",
      Self::Record => "Record",
      Self::Rational => "Rational",
      Self::Complex => "Complex",
      Self::Foreign => "Foreign",
    }
  }

  /// Find a kind by its name
  pub fn from_name(name: &str) -> Option<Self> { Self::ALL.into_iter().find(|k| k.name() == name) }
}

impl fmt::Display for Kind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.name()) }
}

#[cfg(test)]
mod test {
  use super::Kind;
  use crate::value::{Rational, Value};

  #[test]
  fn number_covers_numerics() {
    assert!(Kind::Number.accepts(&Value::Int(1)));
    assert!(Kind::Number.accepts(&Value::from(Rational::new(1, 2).unwrap())));
    assert!(!Kind::Number.accepts(&Value::str("1")));
    assert!(!Kind::Int.accepts(&Value::float(1.0).unwrap()));
  }

  #[test]
  fn names_round_trip() {
    for kind in Kind::ALL {
      assert_eq!(Kind::from_name(kind.name()), Some(kind));
    }
    assert_eq!(Kind::from_name("Point"), None);
  }
}
