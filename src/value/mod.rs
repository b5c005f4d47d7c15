//! The dynamically typed data patterns are matched against.
//!
//! Compound values are reference counted so that handing sub-values to
//! decomposers and bindings is cheap.

mod atom;
mod kind;

use std::fmt;
use std::rc::Rc;

pub use atom::{Atom, Atomic, InertAtomic};
use intern_all::{i, Tok};
use itertools::Itertools;
pub use kind::Kind;
use ordered_float::NotNan;

/// A scrutinee or a part of one
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
  Nil,
  Bool(bool),
  Int(i64),
  Float(NotNan<f64>),
  Str(Rc<str>),
  /// An interned name, written `:name`
  Sym(Tok<String>),
  List(Rc<Vec<Value>>),
  /// Association list in insertion order. Keys are unique.
  Map(Rc<Vec<(Value, Value)>>),
  Record(Rc<Record>),
  Rational(Rational),
  Complex(Complex),
  Foreign(Atom),
}

impl Value {
  /// A float, or [None] for NaN
  pub fn float(f: f64) -> Option<Self> { NotNan::new(f).ok().map(Self::Float) }
  /// An interned symbol
  pub fn sym(name: &str) -> Self { Self::Sym(i(name)) }
  /// A string
  pub fn str(s: &str) -> Self { Self::Str(Rc::from(s)) }
  /// A list of values
  pub fn list<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
    Self::List(Rc::new(items.into_iter().map(Into::into).collect()))
  }
  /// A map. Later entries override earlier ones with an equal key but the
  /// key keeps its original position.
  pub fn map<K: Into<Value>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
    let mut out: Vec<(Value, Value)> = Vec::new();
    for (k, v) in entries {
      let (k, v) = (k.into(), v.into());
      match out.iter_mut().find(|(key, _)| *key == k) {
        Some(entry) => entry.1 = v,
        None => out.push((k, v)),
      }
    }
    Self::Map(Rc::new(out))
  }
  /// A tagged record with fields in declaration order
  pub fn record<'a, V: Into<Value>>(tag: &str, fields: impl IntoIterator<Item = (&'a str, V)>) -> Self {
    Self::Record(Rc::new(Record::new(tag, fields)))
  }
  /// Wrap an application object
  pub fn foreign(data: impl Atomic) -> Self { Self::Foreign(Atom::new(data)) }

  /// The category this value belongs to
  pub fn kind(&self) -> Kind {
    match self {
      Self::Nil => Kind::Nil,
      Self::Bool(_) => Kind::Bool,
      Self::Int(_) => Kind::Int,
      Self::Float(_) => Kind::Float,
      Self::Str(_) => Kind::Str,
      Self::Sym(_) => Kind::Sym,
      Self::List(_) => Kind::List,
      Self::Map(_) => Kind::Map,
      Self::Record(_) => Kind::Record,
      Self::Rational(_) => Kind::Rational,
      Self::Complex(_) => Kind::Complex,
      Self::Foreign(_) => Kind::Foreign,
    }
  }

  /// Look up a key in a map
  pub fn get(&self, key: &Value) -> Option<&Value> {
    match self {
      Self::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
      _ => None,
    }
  }

  /// The text of a string or symbol
  pub fn as_text(&self) -> Option<&str> {
    match self {
      Self::Str(s) => Some(&**s),
      Self::Sym(t) => Some(t.as_str()),
      _ => None,
    }
  }

  /// The items of a list
  pub fn as_list(&self) -> Option<&[Value]> {
    match self {
      Self::List(items) => Some(&items[..]),
      _ => None,
    }
  }

  pub fn as_int(&self) -> Option<i64> {
    match self {
      Self::Int(n) => Some(*n),
      _ => None,
    }
  }
}

impl From<bool> for Value {
  fn from(value: bool) -> Self { Self::Bool(value) }
}
impl From<i64> for Value {
  fn from(value: i64) -> Self { Self::Int(value) }
}
impl From<i32> for Value {
  fn from(value: i32) -> Self { Self::Int(value.into()) }
}
impl From<usize> for Value {
  fn from(value: usize) -> Self { Self::Int(i64::try_from(value).unwrap_or(i64::MAX)) }
}
impl From<NotNan<f64>> for Value {
  fn from(value: NotNan<f64>) -> Self { Self::Float(value) }
}
impl From<&str> for Value {
  fn from(value: &str) -> Self { Self::str(value) }
}
impl From<String> for Value {
  fn from(value: String) -> Self { Self::Str(Rc::from(value)) }
}
impl From<Vec<Value>> for Value {
  fn from(value: Vec<Value>) -> Self { Self::List(Rc::new(value)) }
}
impl From<Record> for Value {
  fn from(value: Record) -> Self { Self::Record(Rc::new(value)) }
}
impl From<Rational> for Value {
  fn from(value: Rational) -> Self { Self::Rational(value) }
}
impl From<Complex> for Value {
  fn from(value: Complex) -> Self { Self::Complex(value) }
}
impl From<Atom> for Value {
  fn from(value: Atom) -> Self { Self::Foreign(value) }
}

/// A value with a tag and named fields in declaration order
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
  pub tag: Tok<String>,
  pub fields: Vec<(Tok<String>, Value)>,
}
impl Record {
  pub fn new<'a, V: Into<Value>>(tag: &str, fields: impl IntoIterator<Item = (&'a str, V)>) -> Self {
    Self { tag: i(tag), fields: fields.into_iter().map(|(k, v)| (i(k), v.into())).collect() }
  }
  /// The value of a field
  pub fn field(&self, name: &str) -> Option<&Value> {
    self.fields.iter().find(|(k, _)| k.as_str() == name).map(|(_, v)| v)
  }
  /// Field values in declaration order
  pub fn values(&self) -> impl Iterator<Item = &Value> + '_ { self.fields.iter().map(|(_, v)| v) }
}

/// A fraction in lowest terms with a positive denominator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rational {
  num: i64,
  den: i64,
}
impl Rational {
  /// Normalize a fraction. Fails if the denominator is zero or the normal
  /// form does not fit.
  pub fn new(num: i64, den: i64) -> Option<Self> {
    if den == 0 {
      return None;
    }
    let g = i128::from(gcd(num.unsigned_abs(), den.unsigned_abs()).max(1));
    let sign = if den < 0 { -1 } else { 1 };
    let num = i64::try_from(sign * i128::from(num) / g).ok()?;
    let den = i64::try_from(sign * i128::from(den) / g).ok()?;
    Some(Self { num, den })
  }
  pub fn numer(&self) -> i64 { self.num }
  pub fn denom(&self) -> i64 { self.den }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
  while b != 0 {
    (a, b) = (b, a % b);
  }
  a
}

/// A complex number in rectangular form
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Complex {
  pub re: NotNan<f64>,
  pub im: NotNan<f64>,
}
impl Complex {
  /// Fails if either component is NaN
  pub fn new(re: f64, im: f64) -> Option<Self> {
    Some(Self { re: NotNan::new(re).ok()?, im: NotNan::new(im).ok()? })
  }
}

// ################ Display ################

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Nil => write!(f, "nil"),
      Self::Bool(b) => write!(f, "{b}"),
      Self::Int(n) => write!(f, "{n}"),
      Self::Float(x) => write!(f, "{:?}", x.into_inner()),
      Self::Str(s) => write!(f, "\"{}\"", s.escape_debug()),
      Self::Sym(t) => write!(f, ":{}", t.as_str()),
      Self::List(items) => write!(f, "[{}]", items.iter().join(", ")),
      Self::Map(entries) => write!(f, "{{{}}}", entries.iter().map(|(k, v)| format!("{k} => {v}")).join(", ")),
      Self::Record(r) => write!(f, "{r}"),
      Self::Rational(r) => write!(f, "({}/{})", r.num, r.den),
      Self::Complex(c) => write!(f, "({:?}{:+?}i)", c.re.into_inner(), c.im.into_inner()),
      Self::Foreign(a) => write!(f, "#<{} {:?}>", a.data().type_str(), a.data()),
    }
  }
}

impl fmt::Display for Record {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let fields = self.fields.iter().map(|(k, v)| format!("{}: {v}", k.as_str())).join(", ");
    write!(f, "{}{{{fields}}}", self.tag.as_str())
  }
}
