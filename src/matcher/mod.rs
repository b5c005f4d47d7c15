//! Compiled patterns and the matching engine

mod bindings;
mod engine;

use std::fmt;
use std::rc::Rc;

pub use bindings::{Bindings, Entry};
use hashbrown::HashMap;
use intern_all::Tok;
use substack::Substack;

use crate::config::Options;
use crate::decompose::{Decomposer, Registry};
use crate::error::Error;
use crate::pattern::{validate, GuardFn, NodeId, NodeKind, Pat, PatternTree};
use crate::value::Value;

/// A validated pattern with its decomposers resolved, ready to be matched
/// any number of times
pub struct Pattern {
  source: Pat,
  tree: PatternTree,
  decomposers: HashMap<NodeId, Rc<dyn Decomposer>>,
  /// Number of enclosing quantifiers for every variable node, indexed by
  /// node
  depths: Vec<usize>,
  /// For every quantifier node the variables it starts and the level it
  /// occupies among their enclosing quantifiers
  openers: Vec<Vec<(NodeId, usize)>>,
  /// First occurrence of every variable name
  names: Vec<(Tok<String>, NodeId)>,
  /// Nodes of variable names that occur more than once
  dups: Vec<Vec<NodeId>>,
  /// Whether a quantifier occurs in the subtree of each node, that is,
  /// whether the node can match a single value in more than one way
  branching: Vec<bool>,
}

impl Pattern {
  /// Build the node arena, validate it and look up the decomposers of its
  /// deconstructors
  pub fn compile(pat: &Pat, registry: &Registry, opts: &Options) -> Result<Self, Error> {
    let tree = PatternTree::build(pat, opts);
    validate(&tree, opts)?;
    let mut decomposers = HashMap::new();
    for id in tree.ids() {
      if let NodeKind::Decon(shape) = tree.kind(id) {
        decomposers.insert(id, registry.resolve(shape)?);
      }
    }
    let mut vars = Vec::new();
    collect_vars(&tree, tree.root(), &Substack::Bottom, &mut vars);
    let mut depths = vec![0; tree.len()];
    let mut openers = vec![Vec::new(); tree.len()];
    let mut groups: Vec<(Tok<String>, Vec<NodeId>)> = Vec::new();
    for (id, name, quants) in vars {
      depths[id.0] = quants.len();
      for (level, q) in quants.into_iter().enumerate() {
        openers[q.0].push((id, level));
      }
      match groups.iter_mut().find(|(n, _)| *n == name) {
        Some((_, ids)) => ids.push(id),
        None => groups.push((name, vec![id])),
      }
    }
    let mut branching = vec![false; tree.len()];
    for id in (0..tree.len()).rev().map(NodeId) {
      let below = tree.node(id).children.iter().any(|c| branching[c.0]);
      branching[id.0] = below || matches!(tree.kind(id), NodeKind::Quant { .. });
    }
    let names = groups.iter().map(|(name, ids)| (name.clone(), ids[0])).collect();
    let dups = groups.into_iter().map(|(_, ids)| ids).filter(|ids| 1 < ids.len()).collect();
    Ok(Self { source: pat.clone(), tree, decomposers, depths, openers, names, dups, branching })
  }

  /// Compile with the built-in decomposers and default options
  pub fn new(pat: &Pat) -> Result<Self, Error> { Self::compile(pat, &Registry::new(), &Options::default()) }

  /// Match a value. A failed match is [None], never an error.
  pub fn matches(&self, value: &Value) -> Option<Bindings> { engine::Matcher::new(self, None).run(value) }

  /// Match a value and additionally require the guard to accept the
  /// bindings. A rejection by the guard backtracks into the pattern.
  pub fn match_guarded(&self, value: &Value, guard: &dyn GuardFn) -> Option<Bindings> {
    engine::Matcher::new(self, Some(guard)).run(value)
  }

  pub fn is_match(&self, value: &Value) -> bool { self.matches(value).is_some() }
  pub fn tree(&self) -> &PatternTree { &self.tree }
  pub fn source(&self) -> &Pat { &self.source }
  /// Variable names in order of first occurrence
  pub fn var_names(&self) -> impl Iterator<Item = &str> { self.names.iter().map(|(n, _)| n.as_str()) }
}

impl fmt::Display for Pattern {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.source) }
}

impl fmt::Debug for Pattern {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Pattern({})", self.source) }
}

/// Variables with the quantifiers enclosing them, outermost first
fn collect_vars(
  tree: &PatternTree,
  id: NodeId,
  quants: &Substack<NodeId>,
  out: &mut Vec<(NodeId, Tok<String>, Vec<NodeId>)>,
) {
  match tree.quantifier_of(id) {
    Some(q) => collect_vars_in(tree, id, &quants.push(q), out),
    None => collect_vars_in(tree, id, quants, out),
  }
}

fn collect_vars_in(
  tree: &PatternTree,
  id: NodeId,
  quants: &Substack<NodeId>,
  out: &mut Vec<(NodeId, Tok<String>, Vec<NodeId>)>,
) {
  if let NodeKind::Var(name) = tree.kind(id) {
    out.push((id, name.clone(), quants.unreverse()));
  }
  for child in &tree.node(id).children {
    collect_vars(tree, *child, quants, out)
  }
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use super::{Bindings, Pattern};
  use crate::config::{DuplicateVars, Greed, Options};
  use crate::decompose::Registry;
  use crate::pattern::pat::*;
  use crate::value::{Kind, Value};

  fn ints(items: &[i64]) -> Value { Value::list(items.iter().copied()) }

  fn render(p: &Pattern, v: &Value) -> Option<String> { p.matches(v).map(|b| b.to_string()) }

  #[test]
  fn literals_and_kinds() {
    let p = Pattern::new(&list([1.into(), Kind::Str.into(), any()])).unwrap();
    assert!(p.is_match(&Value::list([Value::Int(1), Value::str("a"), Value::Nil])));
    assert!(!p.is_match(&Value::list([Value::Int(1), Value::Int(2), Value::Nil])));
    assert!(!p.is_match(&ints(&[1])));
    let near = |a: &Value, b: &Value| a.as_int().zip(b.as_int()).is_some_and(|(a, b)| (a - b).abs() < 2);
    let approx = Pattern::new(&val_by(10, near)).unwrap();
    assert!(approx.is_match(&Value::Int(11)));
    assert!(!approx.is_match(&Value::Int(12)));
  }

  #[test]
  fn splat_binds_empty_list() {
    let p = Pattern::new(&list([var("a"), many()])).unwrap();
    assert_eq!(render(&p, &ints(&[])), Some("a = []".to_string()));
    assert_eq!(render(&p, &ints(&[7])), Some("a = [7]".to_string()));
    let p = Pattern::new(&list([var("a"), at_least(2)])).unwrap();
    assert_eq!(render(&p, &ints(&[7])), None);
  }

  #[test]
  fn greedy_and_lazy_splits() {
    let greedy = Pattern::new(&list([var("a"), many(), var("b"), many()])).unwrap();
    assert_eq!(render(&greedy, &ints(&[1, 2, 3])), Some("a = [1, 2, 3], b = []".to_string()));
    let lazy = Pattern::new(&list([var("a"), many_lazy(), var("b"), many()])).unwrap();
    assert_eq!(render(&lazy, &ints(&[1, 2, 3])), Some("a = [], b = [1, 2, 3]".to_string()));
    let opts = Options::default().default_greed(Greed::Lazy);
    let bare = Pattern::compile(&list([var("a"), many(), var("b"), many()]), &Registry::new(), &opts);
    assert_eq!(render(&bare.unwrap(), &ints(&[1, 2, 3])), Some("a = [], b = [1, 2, 3]".to_string()));
  }

  #[test]
  fn equal_duplicates_backtrack() {
    let p = list([var("a"), many(), var("b"), var("b"), var("c"), many()]);
    let v = ints(&[0, 1, 1, 2, 3, 3, 4]);
    let compiled = Pattern::new(&p).unwrap();
    assert_eq!(render(&compiled, &v), Some("a = [0, 1, 1, 2], b = 3, c = [4]".to_string()));
    let guarded = compiled.match_guarded(&v, &|b: &Bindings| b["b"].as_int().is_some_and(|b| b < 3)).unwrap();
    assert_eq!(guarded.to_string(), "a = [0], b = 1, c = [2, 3, 3, 4]");
    let opts = Options::default().duplicates(DuplicateVars::Reject);
    assert!(Pattern::compile(&p, &Registry::new(), &opts).is_err());
  }

  #[test]
  fn nested_quantifiers() {
    let p = Pattern::new(&list([var("x"), list([var("y"), var("z")]), many()])).unwrap();
    let v = Value::list([Value::Int(0), ints(&[1, 2]), ints(&[3, 4])]);
    assert_eq!(render(&p, &v), Some("x = 0, y = [1, 3], z = [2, 4]".to_string()));
    let deep = Pattern::new(&list([list([var("a"), many()]), many()])).unwrap();
    let v = Value::list([ints(&[1, 2]), ints(&[]), ints(&[3])]);
    assert_eq!(render(&deep, &v), Some("a = [[1, 2], [], [3]]".to_string()));
  }

  #[test]
  fn sequences_repeat_as_a_unit() {
    let p = Pattern::new(&list([seq([var("k"), var("v")]), many(), var("tail"), many()])).unwrap();
    assert_eq!(
      render(&p, &ints(&[1, 2, 3, 4, 5])),
      Some("k = [1, 3], v = [2, 4], tail = [5]".to_string())
    );
    let p = Pattern::new(&list([seq([0.into(), var("x")]), at_least_lazy(1), var("r"), many()])).unwrap();
    assert_eq!(render(&p, &ints(&[0, 1, 0, 2])), Some("x = [1], r = [0, 2]".to_string()));
    let inline = Pattern::new(&list([1.into(), seq([var("a"), var("b")]), 4.into()])).unwrap();
    assert_eq!(render(&inline, &ints(&[1, 2, 3, 4])), Some("a = 2, b = 3".to_string()));
    assert_eq!(render(&inline, &ints(&[1, 2, 4])), None);
  }

  #[test]
  fn composites() {
    let p = Pattern::new(&and([Kind::Int.into(), var("n")])).unwrap();
    assert_eq!(render(&p, &Value::Int(3)), Some("n = 3".to_string()));
    assert_eq!(render(&p, &Value::str("3")), None);
    let p = Pattern::new(&or([1.into(), list([any(), many()])])).unwrap();
    assert!(p.is_match(&Value::Int(1)));
    assert!(p.is_match(&ints(&[4, 5])));
    assert!(!p.is_match(&Value::Int(2)));
    for inner in [val(1), Kind::Str.into(), list([any()])] {
      let once = Pattern::new(&inner).unwrap();
      let twice = Pattern::new(&not(not(inner.clone()))).unwrap();
      for v in [Value::Int(1), Value::str("s"), ints(&[2])] {
        assert_eq!(once.is_match(&v), twice.is_match(&v), "{inner} against {v}");
      }
    }
  }

  #[test]
  fn conditions_backtrack() {
    let p = list([var("a"), many(), var("b"), many(), cond(|b| b["a"].as_list().is_some_and(|a| a.len() == 1))]);
    let p = Pattern::new(&p).unwrap();
    assert_eq!(render(&p, &ints(&[1, 2, 3])), Some("a = [1], b = [2, 3]".to_string()));
    let never = Pattern::new(&list([var("x"), cond(|_| false)])).unwrap();
    assert!(!never.is_match(&ints(&[1])));
  }

  #[test]
  fn keyed() {
    let p = Pattern::new(&keyed_map([key(Value::sym("name"), var("n")), bare("age")])).unwrap();
    let v = Value::map([(Value::sym("name"), Value::str("Ann")), (Value::sym("age"), Value::Int(3))]);
    assert_eq!(render(&p, &v), Some("n = \"Ann\", age = 3".to_string()));
    assert!(!p.is_match(&Value::map([(Value::sym("name"), 1)])));
    let r = Pattern::new(&keyed_record("Point", [bare("y")])).unwrap();
    assert_eq!(render(&r, &Value::record("Point", [("x", 1), ("y", 2)])), Some("y = 2".to_string()));
    assert!(!r.is_match(&Value::record("Pair", [("y", 2)])));
  }

  #[test]
  fn quantifiers_inside_repeated_sequences() {
    let p = Pattern::new(&list([seq([var("k"), list([var("v"), many()])]), many()])).unwrap();
    let v = Value::list([Value::Int(1), ints(&[2, 3]), Value::Int(4), ints(&[5])]);
    assert_eq!(render(&p, &v), Some("k = [1, 4], v = [[2, 3], [5]]".to_string()));
    let end = || Value::sym("end");
    let p = Pattern::new(&list([seq([var("a"), many(), end().into()]), many()])).unwrap();
    let v = Value::list([Value::Int(1), Value::Int(2), end(), end(), Value::Int(3), end()]);
    assert_eq!(render(&p, &v), Some("a = [[1, 2], [], [3]]".to_string()));
  }

  #[test]
  fn condition_in_nested_list() {
    let less = |b: &Bindings| b["x"].as_int() < b["y"].as_int();
    let p = Pattern::new(&list([var("x"), list([var("y"), cond(less)])])).unwrap();
    assert_eq!(render(&p, &Value::list([Value::Int(1), ints(&[2])])), Some("x = 1, y = 2".to_string()));
    assert_eq!(render(&p, &Value::list([Value::Int(3), ints(&[2])])), None);
  }

  #[test]
  fn long_lists_do_not_deepen_the_search() {
    let n = 200_000;
    let long = Value::list(0..n);
    let p = Pattern::new(&list([var("x"), many()])).unwrap();
    assert_eq!(p.matches(&long).unwrap()["x"].as_list().map(<[Value]>::len), Some(n as usize));
    let p = Pattern::new(&list([var("x"), many(), var("last")])).unwrap();
    let b = p.matches(&long).unwrap();
    assert_eq!(b["x"].as_list().map(<[Value]>::len), Some(n as usize - 1));
    assert_eq!(b["last"], Value::Int(n - 1));
    let p = Pattern::new(&list([Kind::Int.into(), many_lazy(), val(Value::Nil)])).unwrap();
    assert!(!p.is_match(&long));
    let p = Pattern::new(&list([list([var("a"), var("b")]), many()])).unwrap();
    let pairs = Value::list((0..n).map(|i| Value::list([i, i + 1])));
    assert_eq!(p.matches(&pairs).unwrap()["b"].as_list().map(<[Value]>::len), Some(n as usize));
  }

  #[test]
  fn unknown_shape_fails_compilation() {
    let err = Pattern::new(&decon("Tree", [any()])).unwrap_err();
    assert!(matches!(err, crate::Error::UnimplementedShape(_)));
  }
}
