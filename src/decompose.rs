//! Decomposers turn a value into the ordered list of sub-values a
//! deconstructor pattern recurses into, or reject it.

use std::fmt;
use std::rc::Rc;

use hashbrown::HashMap;
use intern_all::{i, Tok};
use regex::Regex;

use crate::error::Error;
use crate::utils::unwrap_or;
use crate::value::Value;

/// The value does not have the shape the decomposer handles. This is an
/// ordinary match failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejected;

/// Outcome of a decomposition. An empty list is a successful decomposition
/// into zero parts.
pub type Decomposition = Result<Vec<Value>, Rejected>;

/// Splits values of a shape into their parts. Must be a pure function of the
/// value.
pub trait Decomposer {
  fn decompose(&self, value: &Value) -> Decomposition;
}

impl<F: Fn(&Value) -> Decomposition> Decomposer for F {
  fn decompose(&self, value: &Value) -> Decomposition { self(value) }
}

/// Elements of a list
#[derive(Debug, Clone, Copy, Default)]
pub struct ListShape;
impl Decomposer for ListShape {
  fn decompose(&self, value: &Value) -> Decomposition {
    value.as_list().map(<[Value]>::to_vec).ok_or(Rejected)
  }
}

/// Numerator and denominator of a rational number
#[derive(Debug, Clone, Copy, Default)]
pub struct RationalShape;
impl Decomposer for RationalShape {
  fn decompose(&self, value: &Value) -> Decomposition {
    let r = unwrap_or!(value => Value::Rational; return Err(Rejected));
    Ok(vec![Value::Int(r.numer()), Value::Int(r.denom())])
  }
}

/// Real and imaginary part of a complex number
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexShape;
impl Decomposer for ComplexShape {
  fn decompose(&self, value: &Value) -> Decomposition {
    let c = unwrap_or!(value => Value::Complex; return Err(Rejected));
    Ok(vec![Value::Float(c.re), Value::Float(c.im)])
  }
}

/// Field values of a record with a specific tag in declaration order
#[derive(Debug, Clone)]
pub struct RecordShape {
  pub tag: Tok<String>,
}
impl Decomposer for RecordShape {
  fn decompose(&self, value: &Value) -> Decomposition {
    let record = unwrap_or!(value => Value::Record; return Err(Rejected));
    if record.tag != self.tag {
      return Err(Rejected);
    }
    Ok(record.values().cloned().collect())
  }
}

/// Capture groups of a regular expression that must match the whole text of
/// a string or symbol. Groups that did not participate are [Value::Nil].
/// Without groups the entire match is the only part.
#[derive(Debug, Clone)]
pub struct RegexShape(pub Rc<Regex>);
impl RegexShape {
  /// Anchor the expression at both ends and compile it
  pub fn new(source: &str) -> Result<Self, regex::Error> {
    Ok(Self(Rc::new(Regex::new(&format!(r"\A(?:{source})\z"))?)))
  }
}
impl Decomposer for RegexShape {
  fn decompose(&self, value: &Value) -> Decomposition {
    let text = value.as_text().ok_or(Rejected)?;
    let caps = self.0.captures(text).ok_or(Rejected)?;
    if caps.len() == 1 {
      return Ok(vec![Value::str(&caps[0])]);
    }
    let groups = caps.iter().skip(1);
    Ok(groups.map(|g| g.map_or(Value::Nil, |m| Value::str(m.as_str()))).collect())
  }
}

/// Selects the decomposer of a deconstructor pattern
#[derive(Clone)]
pub enum Shape {
  /// Looked up in the [Registry] by name when the pattern is compiled
  Named(Tok<String>),
  /// A record with this tag, needs no registration
  Record(Tok<String>),
  /// Captures of an anchored regular expression
  Regex(RegexShape),
}
impl Shape {
  pub fn named(name: &str) -> Self { Self::Named(i(name)) }
}

impl fmt::Debug for Shape {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{self}") }
}

impl fmt::Display for Shape {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Named(name) | Self::Record(name) => write!(f, "{}", name.as_str()),
      Self::Regex(re) => {
        let src = re.0.as_str();
        let inner = src.strip_prefix(r"\A(?:").and_then(|s| s.strip_suffix(r")\z")).unwrap_or(src);
        write!(f, "/{}/", inner.replace('/', r"\/"))
      },
    }
  }
}

/// Decomposers by shape name. Extend it with [Registry::register] without
/// touching the engine.
#[derive(Clone)]
pub struct Registry {
  table: HashMap<Tok<String>, Rc<dyn Decomposer>>,
}
impl Registry {
  /// A registry that knows no shapes
  pub fn empty() -> Self { Self { table: HashMap::new() } }

  /// A registry with `List`, `Rational` and `Complex`
  pub fn new() -> Self {
    let mut this = Self::empty();
    this.register("List", ListShape);
    this.register("Rational", RationalShape);
    this.register("Complex", ComplexShape);
    this
  }

  /// Add or replace the decomposer for a shape name
  pub fn register(&mut self, name: &str, decomposer: impl Decomposer + 'static) -> &mut Self {
    self.table.insert(i(name), Rc::new(decomposer));
    self
  }

  /// Register positional deconstruction for records with this tag under the
  /// same name
  pub fn register_record(&mut self, tag: &str) -> &mut Self {
    self.register(tag, RecordShape { tag: i(tag) })
  }

  pub fn contains(&self, name: &str) -> bool { self.table.contains_key(&i(name)) }

  /// Find the decomposer for a shape. A name without an entry is an error,
  /// not a failed match.
  pub fn resolve(&self, shape: &Shape) -> Result<Rc<dyn Decomposer>, Error> {
    match shape {
      Shape::Named(name) => match self.table.get(name) {
        Some(d) => Ok(d.clone()),
        None => Err(Error::UnimplementedShape(name.clone())),
      },
      Shape::Record(tag) => Ok(Rc::new(RecordShape { tag: tag.clone() })),
      Shape::Regex(re) => Ok(Rc::new(re.clone())),
    }
  }

  /// Resolve and apply in one step
  pub fn decompose(&self, shape: &Shape, value: &Value) -> Result<Decomposition, Error> {
    Ok(self.resolve(shape)?.decompose(value))
  }
}

impl Default for Registry {
  fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod test {
  use super::{Registry, Rejected, Shape};
  use crate::error::Error;
  use crate::value::{Complex, Rational, Value};

  #[test]
  fn builtins() {
    let reg = Registry::new();
    let list = Shape::named("List");
    assert_eq!(reg.decompose(&list, &Value::list([1, 2])).unwrap(), Ok(vec![Value::Int(1), Value::Int(2)]));
    assert_eq!(reg.decompose(&list, &Value::list(Vec::<Value>::new())).unwrap(), Ok(vec![]));
    assert_eq!(reg.decompose(&list, &Value::Int(1)).unwrap(), Err(Rejected));
    let half = Value::from(Rational::new(2, 4).unwrap());
    assert_eq!(reg.decompose(&Shape::named("Rational"), &half).unwrap(), Ok(vec![Value::Int(1), Value::Int(2)]));
    let c = Value::from(Complex::new(1.0, 2.0).unwrap());
    let parts = reg.decompose(&Shape::named("Complex"), &c).unwrap().unwrap();
    assert_eq!(parts, vec![Value::float(1.0).unwrap(), Value::float(2.0).unwrap()]);
  }

  #[test]
  fn unknown_shape_is_an_error() {
    let err = Registry::empty().resolve(&Shape::named("List")).err();
    assert!(matches!(err, Some(Error::UnimplementedShape(name)) if name.as_str() == "List"));
  }

  #[test]
  fn records_and_closures() {
    let mut reg = Registry::empty();
    reg.register_record("Point").register("Evens", |v: &Value| match v.as_int() {
      Some(n) if n % 2 == 0 => Ok(vec![Value::Int(n / 2)]),
      _ => Err(Rejected),
    });
    let p = Value::record("Point", [("x", 1), ("y", 2)]);
    assert_eq!(reg.decompose(&Shape::named("Point"), &p).unwrap(), Ok(vec![Value::Int(1), Value::Int(2)]));
    let q = Value::record("Pair", [("x", 1), ("y", 2)]);
    assert_eq!(reg.decompose(&Shape::named("Point"), &q).unwrap(), Err(Rejected));
    assert_eq!(reg.decompose(&Shape::named("Evens"), &Value::Int(6)).unwrap(), Ok(vec![Value::Int(3)]));
  }

  #[test]
  fn regex_captures() {
    let re = Shape::Regex(super::RegexShape::new(r"(\d+)-(\d+)?").unwrap());
    let reg = Registry::empty();
    assert_eq!(reg.decompose(&re, &Value::str("12-")).unwrap(), Ok(vec![Value::str("12"), Value::Nil]));
    assert_eq!(reg.decompose(&re, &Value::str("x12-3")).unwrap(), Err(Rejected));
    let whole = Shape::Regex(super::RegexShape::new("a+").unwrap());
    assert_eq!(reg.decompose(&whole, &Value::sym("aa")).unwrap(), Ok(vec![Value::str("aa")]));
    assert_eq!(whole.to_string(), "/a+/");
  }
}
