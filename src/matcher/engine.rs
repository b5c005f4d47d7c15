//! The backtracking search. Every step receives the values left at its level
//! and a continuation describing what must match after it. A step succeeds
//! only if its continuation does, so a failure anywhere downstream, including
//! a guard, retries the latest open choice: the next split of a quantifier,
//! the next repetition count of a sequence, or the next way to match inside a
//! deconstructor.

use std::slice;

use itertools::Itertools;

use super::bindings::{Bindings, Entry, Slots};
use super::Pattern;
use crate::config::Greed;
use crate::decompose::Rejected;
use crate::pattern::{GuardFn, KeyedShape, NodeId, NodeKind};
use crate::utils::unwrap_or;
use crate::value::Value;

/// What to do with the values that remain once a step has matched
enum Cont<'a> {
  /// The root matched, finish the attempt
  Done,
  /// An isolated attempt under Or or Not matched
  Accept,
  /// Continue with a sibling
  Next { node: Option<NodeId>, up: &'a Cont<'a> },
  /// The parts of a deconstructed value are done, continue after it
  Close { rest: &'a [Value], up: &'a Cont<'a> },
  /// Match the remaining operands of an And against the same value
  All { nodes: &'a [NodeId], value: &'a Value, up: &'a Cont<'a> },
  /// Match each remaining value against the repeated node
  Repeat { unit: NodeId, rest: &'a [Value], up: &'a Cont<'a> },
  /// Replay a quantified sequence `left` more times
  Rewind { group: NodeId, left: usize, after: Option<NodeId>, up: &'a Cont<'a> },
}

/// State of one attempt to match a [Pattern] against a value
pub(super) struct Matcher<'p> {
  pat: &'p Pattern,
  guard: Option<&'p dyn GuardFn>,
  slots: Slots,
  found: Option<Bindings>,
}

impl<'p> Matcher<'p> {
  pub fn new(pat: &'p Pattern, guard: Option<&'p dyn GuardFn>) -> Self {
    Self { pat, guard, slots: Slots::new(pat.tree.len()), found: None }
  }

  pub fn run(mut self, value: &Value) -> Option<Bindings> {
    let root = self.pat.tree.root();
    match self.chain(Some(root), slice::from_ref(value), &Cont::Done) {
      true => self.found,
      false => None,
    }
  }

  fn resume(&mut self, k: &Cont, vals: &[Value]) -> bool {
    match k {
      Cont::Done => vals.is_empty() && self.finish(),
      Cont::Accept => vals.is_empty(),
      Cont::Next { node, up } => self.chain(*node, vals, up),
      Cont::Close { rest, up } => vals.is_empty() && self.resume(up, rest),
      Cont::All { nodes, value, up } => self.all(nodes, value, vals, up),
      Cont::Repeat { unit, rest, up } => self.repeat_items(*unit, vals, rest, up),
      Cont::Rewind { group, left, after, up } => self.rewind(*group, *left, vals, *after, up),
    }
  }

  /// Match a node and its following siblings against a run of values
  fn chain(&mut self, node: Option<NodeId>, vals: &[Value], k: &Cont) -> bool {
    let pat = self.pat;
    let tree = &pat.tree;
    let id = unwrap_or!(node; return self.resume(k, vals));
    let next = tree.node(id).next;
    match tree.kind(id) {
      NodeKind::Cond(guard) => {
        if !vals.is_empty() {
          return false;
        }
        let passed = guard(&self.snapshot());
        tracing::trace!("Condition at {} {}", tree.path(id), if passed { "passed" } else { "failed" });
        passed && self.chain(next, vals, k)
      },
      NodeKind::Quant { .. } => self.chain(next, vals, k),
      kind => match tree.quantifier_of(id) {
        Some(q) => self.repeat(id, q, vals, k),
        None if matches!(kind, NodeKind::Seq) =>
          self.chain(tree.first_child(id), vals, &Cont::Next { node: next, up: k }),
        None => match vals.split_first() {
          Some((v, rest)) => self.one(id, v, rest, &Cont::Next { node: next, up: k }),
          None => false,
        },
      },
    }
  }

  /// Match a node against a single value, then resume with `rest`
  fn one(&mut self, id: NodeId, v: &Value, rest: &[Value], k: &Cont) -> bool {
    let pat = self.pat;
    let node = pat.tree.node(id);
    match &node.kind {
      NodeKind::Literal(lit) => lit.test(v) && self.resume(k, rest),
      NodeKind::Wildcard => self.resume(k, rest),
      NodeKind::Var(_) => {
        let mark = self.slots.mark();
        self.slots.bind(id, pat.depths[id.0], v.clone());
        if self.resume(k, rest) {
          return true;
        }
        self.slots.undo(mark);
        false
      },
      NodeKind::Decon(shape) => {
        let decomposer = unwrap_or!(pat.decomposers.get(&id); return false);
        match decomposer.decompose(v) {
          Ok(parts) => self.chain(node.children.first().copied(), &parts, &Cont::Close { rest, up: k }),
          Err(Rejected) => {
            tracing::trace!("{shape} rejected {v}");
            false
          },
        }
      },
      NodeKind::Keyed { shape, keys } => {
        let parts = unwrap_or!(lookup(shape, keys, v); return false);
        self.chain(node.children.first().copied(), &parts, &Cont::Close { rest, up: k })
      },
      NodeKind::And => self.all(&node.children, v, rest, k),
      NodeKind::Or => node.children.iter().any(|c| self.isolated(*c, v)) && self.resume(k, rest),
      NodeKind::Not => !node.children.iter().any(|c| self.isolated(*c, v)) && self.resume(k, rest),
      NodeKind::Seq | NodeKind::Quant { .. } | NodeKind::Cond(_) => false,
    }
  }

  /// Match every node against the same value
  fn all(&mut self, nodes: &[NodeId], v: &Value, rest: &[Value], k: &Cont) -> bool {
    match nodes.split_first() {
      None => self.resume(k, rest),
      Some((first, tail)) => self.one(*first, v, rest, &Cont::All { nodes: tail, value: v, up: k }),
    }
  }

  /// Match a node on its own. Nothing it records survives.
  fn isolated(&mut self, id: NodeId, v: &Value) -> bool {
    let mark = self.slots.mark();
    let matched = self.one(id, v, &[], &Cont::Accept);
    self.slots.undo(mark);
    matched
  }

  /// Try the repetition counts of a quantified node in the quantifier's
  /// order
  fn repeat(&mut self, unit: NodeId, q: NodeId, vals: &[Value], k: &Cont) -> bool {
    let pat = self.pat;
    let NodeKind::Quant { min, greed } = pat.tree.kind(q) else { return false };
    let after = pat.tree.node(q).next;
    let is_group = matches!(pat.tree.kind(unit), NodeKind::Seq);
    let mark = self.slots.mark();
    if !is_group && !pat.branching[unit.0] {
      self.open(q);
      if self.repeat_flat(unit, *min, *greed, vals, &Cont::Next { node: after, up: k }) {
        return true;
      }
      self.slots.undo(mark);
      return false;
    }
    for count in greed.walk(*min..=vals.len()) {
      self.open(q);
      let matched = if is_group {
        self.rewind(unit, count, vals, after, k)
      } else {
        let (items, rest) = vals.split_at(count);
        self.repeat_items(unit, items, rest, &Cont::Next { node: after, up: k })
      };
      if matched {
        return true;
      }
      self.slots.undo(mark);
    }
    false
  }

  /// Start a new repetition list for the variables under the quantifier
  fn open(&mut self, q: NodeId) {
    let pat = self.pat;
    for (var, level) in &pat.openers[q.0] {
      self.slots.open(*var, *level);
    }
  }

  /// Repeat a unit that can match a value in at most one way. Items are
  /// matched in a loop and every count is retried by rolling the trail back,
  /// so the depth of the search does not grow with the number of values.
  fn repeat_flat(&mut self, unit: NodeId, min: usize, greed: Greed, vals: &[Value], k: &Cont) -> bool {
    match greed {
      Greed::Greedy => {
        let mut marks = vec![self.slots.mark()];
        for v in vals {
          if !self.one(unit, v, &[], &Cont::Accept) {
            break;
          }
          marks.push(self.slots.mark());
        }
        for count in (min..marks.len()).rev() {
          self.slots.undo(marks[count]);
          if self.resume(k, &vals[count..]) {
            return true;
          }
        }
        false
      },
      Greed::Lazy => {
        for count in 0..=vals.len() {
          if min <= count {
            let mark = self.slots.mark();
            if self.resume(k, &vals[count..]) {
              return true;
            }
            self.slots.undo(mark);
          }
          if count == vals.len() || !self.one(unit, &vals[count], &[], &Cont::Accept) {
            return false;
          }
        }
        false
      },
    }
  }

  /// Match each item against the unit, then resume with `rest`
  fn repeat_items(&mut self, unit: NodeId, items: &[Value], rest: &[Value], k: &Cont) -> bool {
    match items.split_first() {
      None => self.resume(k, rest),
      Some((first, tail)) => self.one(unit, first, tail, &Cont::Repeat { unit, rest, up: k }),
    }
  }

  /// Match the items of a sequence `left` more times, then continue after
  /// its quantifier
  fn rewind(&mut self, group: NodeId, left: usize, vals: &[Value], after: Option<NodeId>, k: &Cont) -> bool {
    match left {
      0 => self.chain(after, vals, k),
      _ => {
        let first = self.pat.tree.first_child(group);
        self.chain(first, vals, &Cont::Rewind { group, left: left - 1, after, up: k })
      },
    }
  }

  fn snapshot(&self) -> Bindings { self.slots.snapshot(&self.pat.names) }

  /// The positional match is complete. Check that variables sharing a name
  /// agree, then consult the guard.
  fn finish(&mut self) -> bool {
    for group in &self.pat.dups {
      let mut values = group.iter().map(|id| self.slots.get(*id).map(Entry::to_value));
      if !values.all_equal() {
        tracing::trace!("Variables sharing a name disagree");
        return false;
      }
    }
    let bindings = self.snapshot();
    if let Some(guard) = self.guard {
      if !guard(&bindings) {
        tracing::debug!("Guard rejected {bindings}");
        return false;
      }
    }
    self.found = Some(bindings);
    true
  }
}

/// Values under the keys of a keyed deconstructor in entry order
fn lookup(shape: &KeyedShape, keys: &[Value], v: &Value) -> Option<Vec<Value>> {
  match (shape, v) {
    (KeyedShape::Map, Value::Map(_)) => keys.iter().map(|k| v.get(k).cloned()).collect(),
    (KeyedShape::Record(tag), Value::Record(r)) if r.tag == *tag =>
      keys.iter().map(|k| r.field(k.as_text()?).cloned()).collect(),
    _ => None,
  }
}
