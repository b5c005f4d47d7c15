//! Owned pattern trees as the caller builds them. [crate::Pattern::compile]
//! turns them into a linked arena.

use std::fmt;
use std::rc::Rc;

use intern_all::{i, Tok};
use itertools::Itertools;
use trait_set::trait_set;

use crate::config::Greed;
use crate::decompose::{RegexShape, Shape};
use crate::error::Error;
use crate::matcher::Bindings;
use crate::value::{Kind, Value};

trait_set! {
  /// Custom equality of a literal pattern. Receives the literal first and the
  /// scrutinee second.
  pub trait CompareFn = Fn(&Value, &Value) -> bool + 'static;
  /// A side condition over the bindings made so far
  pub trait GuardFn = Fn(&Bindings) -> bool + 'static;
}

/// Where the entries of a keyed deconstructor are looked up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyedShape {
  /// Keys of a [Value::Map]
  Map,
  /// Fields of a [Value::Record] with this tag
  Record(Tok<String>),
}

/// A pattern
#[derive(Clone)]
pub enum Pat {
  /// Equal to the literal
  Value(Value),
  /// Accepted by the comparator
  ValueBy(Value, Rc<dyn CompareFn>),
  /// Any value of the kind
  Kind(Kind),
  /// Anything, recorded under the name
  Var(Tok<String>),
  /// Anything
  Wildcard,
  /// Decomposed by the shape, parts matched against the items
  Decon(Shape, Vec<Pat>),
  /// Looked up by key, each entry matched against its pattern
  Keyed(KeyedShape, Vec<(Value, Pat)>),
  /// Repeat the preceding item at least `min` times. Without a search order
  /// the compile options decide.
  Quant { min: usize, greed: Option<Greed> },
  /// A contiguous run of items
  Seq(Vec<Pat>),
  And(Vec<Pat>),
  Or(Vec<Pat>),
  Not(Vec<Pat>),
  /// Side condition at the end of a pattern
  Cond(Rc<dyn GuardFn>),
}

impl Pat {
  /// Whether any variable occurs in this subtree
  pub fn binds(&self) -> bool {
    match self {
      Self::Var(_) => true,
      Self::Decon(_, items) | Self::Seq(items) | Self::And(items) | Self::Or(items) | Self::Not(items) =>
        items.iter().any(Self::binds),
      Self::Keyed(_, entries) => entries.iter().any(|(_, p)| p.binds()),
      _ => false,
    }
  }
}

/// Literal pattern
pub fn val(v: impl Into<Value>) -> Pat { Pat::Value(v.into()) }
/// Literal pattern with a custom comparator
pub fn val_by(v: impl Into<Value>, cmp: impl Fn(&Value, &Value) -> bool + 'static) -> Pat {
  Pat::ValueBy(v.into(), Rc::new(cmp))
}
pub fn kind(kind: Kind) -> Pat { Pat::Kind(kind) }
pub fn var(name: &str) -> Pat { Pat::Var(i(name)) }
/// Wildcard
pub fn any() -> Pat { Pat::Wildcard }
/// Elements of a list
pub fn list(items: impl IntoIterator<Item = Pat>) -> Pat { decon("List", items) }
/// Parts produced by the decomposer registered under `shape`
pub fn decon(shape: &str, items: impl IntoIterator<Item = Pat>) -> Pat {
  Pat::Decon(Shape::named(shape), items.into_iter().collect())
}
/// Field values of a record with this tag in declaration order
pub fn record(tag: &str, items: impl IntoIterator<Item = Pat>) -> Pat {
  Pat::Decon(Shape::Record(i(tag)), items.into_iter().collect())
}
/// Capture groups of a regular expression matched against the whole text
pub fn regex(source: &str, items: impl IntoIterator<Item = Pat>) -> Result<Pat, Error> {
  Ok(Pat::Decon(Shape::Regex(RegexShape::new(source)?), items.into_iter().collect()))
}
/// Map entries by key
pub fn keyed_map(entries: impl IntoIterator<Item = (Value, Pat)>) -> Pat {
  Pat::Keyed(KeyedShape::Map, entries.into_iter().collect())
}
/// Record fields by name
pub fn keyed_record(tag: &str, entries: impl IntoIterator<Item = (Value, Pat)>) -> Pat {
  Pat::Keyed(KeyedShape::Record(i(tag)), entries.into_iter().collect())
}
/// An entry of a keyed deconstructor
pub fn key(k: impl Into<Value>, pat: Pat) -> (Value, Pat) { (k.into(), pat) }
/// An entry that binds the value under a symbol key to a variable of the same
/// name
pub fn bare(name: &str) -> (Value, Pat) { (Value::sym(name), var(name)) }
/// Zero or more, in the default order
pub fn many() -> Pat { Pat::Quant { min: 0, greed: None } }
/// Zero or more, shortest first
pub fn many_lazy() -> Pat { Pat::Quant { min: 0, greed: Some(Greed::Lazy) } }
/// `min` or more, in the default order
pub fn at_least(min: usize) -> Pat { Pat::Quant { min, greed: None } }
/// `min` or more, shortest first
pub fn at_least_lazy(min: usize) -> Pat { Pat::Quant { min, greed: Some(Greed::Lazy) } }
pub fn seq(items: impl IntoIterator<Item = Pat>) -> Pat { Pat::Seq(items.into_iter().collect()) }
pub fn and(items: impl IntoIterator<Item = Pat>) -> Pat { Pat::And(items.into_iter().collect()) }
pub fn or(items: impl IntoIterator<Item = Pat>) -> Pat { Pat::Or(items.into_iter().collect()) }
pub fn not(pat: Pat) -> Pat { Pat::Not(vec![pat]) }
/// Side condition. Only valid at the very end of a pattern.
pub fn cond(guard: impl Fn(&Bindings) -> bool + 'static) -> Pat { Pat::Cond(Rc::new(guard)) }

impl From<Value> for Pat {
  fn from(value: Value) -> Self { Self::Value(value) }
}
impl From<Kind> for Pat {
  fn from(value: Kind) -> Self { Self::Kind(value) }
}
impl From<i64> for Pat {
  fn from(value: i64) -> Self { val(value) }
}
impl From<i32> for Pat {
  fn from(value: i32) -> Self { val(value) }
}
impl From<bool> for Pat {
  fn from(value: bool) -> Self { val(value) }
}
impl From<&str> for Pat {
  fn from(value: &str) -> Self { val(value) }
}

fn items(items: &[Pat]) -> String { items.iter().join(", ") }

impl fmt::Display for Pat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Value(v) => write!(f, "{v}"),
      Self::ValueBy(v, _) => write!(f, "~{v}"),
      Self::Kind(k) => write!(f, "{k}"),
      Self::Var(name) => write!(f, "{}", name.as_str()),
      Self::Wildcard => write!(f, "_"),
      Self::Decon(Shape::Named(n), v) if n.as_str() == "List" => write!(f, "[{}]", items(v)),
      Self::Decon(shape, v) => write!(f, "{shape}({})", items(v)),
      Self::Keyed(shape, entries) => {
        let entries = entries.iter().map(|(k, p)| match (k, p, shape) {
          (Value::Sym(k), Self::Var(v), _) if k == v => format!(":{}", k.as_str()),
          (k, p, KeyedShape::Map) => format!("{k} => {p}"),
          (k, p, KeyedShape::Record(_)) => format!("{}: {p}", k.as_text().unwrap_or("?")),
        });
        match shape {
          KeyedShape::Map => write!(f, "{{{}}}", entries.format(", ")),
          KeyedShape::Record(tag) => write!(f, "{}{{{}}}", tag.as_str(), entries.format(", ")),
        }
      },
      Self::Quant { min, greed } => {
        write!(f, "..")?;
        if *min != 0 {
          write!(f, "{min}")?;
        }
        if *greed == Some(Greed::Lazy) {
          write!(f, "?")?;
        }
        Ok(())
      },
      Self::Seq(v) => write!(f, "Seq({})", items(v)),
      Self::And(v) => write!(f, "And({})", items(v)),
      Self::Or(v) => write!(f, "Or({})", items(v)),
      Self::Not(v) => write!(f, "Not({})", items(v)),
      Self::Cond(_) => write!(f, "<cond>"),
    }
  }
}

impl fmt::Debug for Pat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{self}") }
}
