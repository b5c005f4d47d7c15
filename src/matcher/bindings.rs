use std::fmt;
use std::ops::Index;

use intern_all::{i, Tok};
use itertools::Itertools;

use crate::pattern::NodeId;
use crate::value::Value;

/// The value recorded by one variable node. Variables under quantifiers
/// collect one entry per repetition, nested once per enclosing quantifier.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
  Scalar(Value),
  Vec(Vec<Entry>),
}
impl Entry {
  pub fn to_value(&self) -> Value {
    match self {
      Self::Scalar(v) => v.clone(),
      Self::Vec(v) => Value::list(v.iter().map(Self::to_value)),
    }
  }
}

/// Walk down `levels` times through the latest repetition
fn group(entry: &mut Entry, levels: usize) -> Option<&mut Vec<Entry>> {
  let mut cur = match entry {
    Entry::Vec(v) => v,
    Entry::Scalar(_) => return None,
  };
  for _ in 0..levels {
    cur = match cur.last_mut()? {
      Entry::Vec(v) => v,
      Entry::Scalar(_) => return None,
    };
  }
  Some(cur)
}

enum Undo {
  Restore(NodeId, Option<Entry>),
  Pop(NodeId, usize),
}

/// Scratch state of one match attempt. Every change is recorded on a trail
/// so that backtracking can roll it back to a mark.
pub(crate) struct Slots {
  slots: Vec<Option<Entry>>,
  trail: Vec<Undo>,
}
impl Slots {
  pub fn new(len: usize) -> Self { Self { slots: vec![None; len], trail: Vec::new() } }
  pub fn mark(&self) -> usize { self.trail.len() }
  pub fn get(&self, id: NodeId) -> Option<&Entry> { self.slots[id.0].as_ref() }

  /// Roll back every change made since the mark
  pub fn undo(&mut self, mark: usize) {
    while mark < self.trail.len() {
      match self.trail.pop() {
        Some(Undo::Restore(id, old)) => self.slots[id.0] = old,
        Some(Undo::Pop(id, levels)) => {
          if let Some(g) = self.slots[id.0].as_mut().and_then(|e| group(e, levels)) {
            g.pop();
          }
        },
        None => break,
      }
    }
  }

  fn push(&mut self, id: NodeId, levels: usize, entry: Entry) {
    if let Some(g) = self.slots[id.0].as_mut().and_then(|e| group(e, levels)) {
      g.push(entry);
      self.trail.push(Undo::Pop(id, levels));
    }
  }

  /// Start the quantifier at `level` among the quantifiers enclosing the
  /// variable. The outermost one resets the slot, inner ones open a new list
  /// in the current repetition of the one above.
  pub fn open(&mut self, id: NodeId, level: usize) {
    match level {
      0 => {
        let old = self.slots[id.0].replace(Entry::Vec(Vec::new()));
        self.trail.push(Undo::Restore(id, old));
      },
      _ => self.push(id, level - 1, Entry::Vec(Vec::new())),
    }
  }

  /// Record a match of a variable with `depth` enclosing quantifiers
  pub fn bind(&mut self, id: NodeId, depth: usize, value: Value) {
    match depth {
      0 => {
        let old = self.slots[id.0].replace(Entry::Scalar(value));
        self.trail.push(Undo::Restore(id, old));
      },
      _ => self.push(id, depth - 1, Entry::Scalar(value)),
    }
  }

  /// Convert the recorded values of the listed variables
  pub fn snapshot<'a>(&self, vars: impl IntoIterator<Item = &'a (Tok<String>, NodeId)>) -> Bindings {
    let pairs = vars.into_iter().filter_map(|(name, id)| Some((name.clone(), self.get(*id)?.to_value())));
    Bindings(pairs.collect())
  }
}

/// The values matched by the variables of a pattern in the order of their
/// first occurrence
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bindings(Vec<(Tok<String>, Value)>);
impl Bindings {
  pub fn new<'a>(pairs: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
    Self(pairs.into_iter().map(|(k, v)| (i(k), v)).collect())
  }
  pub fn get(&self, name: &str) -> Option<&Value> {
    self.0.iter().find(|(k, _)| k.as_str() == name).map(|(_, v)| v)
  }
  pub fn contains(&self, name: &str) -> bool { self.get(name).is_some() }
  pub fn iter(&self) -> impl Iterator<Item = (&Tok<String>, &Value)> { self.0.iter().map(|(k, v)| (k, v)) }
  pub fn names(&self) -> impl Iterator<Item = &str> { self.0.iter().map(|(k, _)| k.as_str()) }
  pub fn len(&self) -> usize { self.0.len() }
  pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl Index<&str> for Bindings {
  type Output = Value;
  fn index(&self, name: &str) -> &Value {
    match self.get(name) {
      Some(v) => v,
      None => panic!("{name} is not bound"),
    }
  }
}

impl IntoIterator for Bindings {
  type Item = (Tok<String>, Value);
  type IntoIter = std::vec::IntoIter<(Tok<String>, Value)>;
  fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

impl fmt::Display for Bindings {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.iter().map(|(k, v)| format!("{} = {v}", k.as_str())).join(", "))
  }
}

#[cfg(test)]
mod test {
  use intern_all::i;

  use super::{Bindings, Slots};
  use crate::pattern::NodeId;
  use crate::value::Value;

  #[test]
  fn nested_groups_roll_back() {
    let x = NodeId(0);
    let mut slots = Slots::new(1);
    slots.open(x, 0);
    slots.open(x, 1);
    slots.bind(x, 2, Value::Int(1));
    slots.bind(x, 2, Value::Int(2));
    let mark = slots.mark();
    slots.open(x, 1);
    slots.bind(x, 2, Value::Int(3));
    let vars = [(i("x"), x)];
    assert_eq!(slots.snapshot(&vars)["x"].to_string(), "[[1, 2], [3]]");
    slots.undo(mark);
    assert_eq!(slots.snapshot(&vars)["x"].to_string(), "[[1, 2]]");
    slots.undo(0);
    assert_eq!(slots.snapshot(&vars), Bindings::default());
  }

  #[test]
  fn scalar_restores_previous() {
    let mut slots = Slots::new(2);
    slots.bind(NodeId(1), 0, Value::Int(1));
    let mark = slots.mark();
    slots.bind(NodeId(1), 0, Value::Int(2));
    slots.undo(mark);
    let b = slots.snapshot(&[(i("y"), NodeId(1))]);
    assert_eq!(b, Bindings::new([("y", Value::Int(1))]));
    assert_eq!(b.to_string(), "y = 1");
  }
}
