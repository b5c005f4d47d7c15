use hashbrown::HashSet;
use itertools::Itertools;

use super::tree::{NodeId, NodeKind, PatternTree};
use crate::config::{DuplicateVars, Options};
use crate::error::{
  BadFieldKey, BindingInAlternative, DanglingQuantifier, DuplicateKey, DuplicateVariable,
  EmptyComposite, EmptySequence, KeyedArity, Malformed, MalformedKind, MisplacedCondition,
  MisplacedQuantifier, MisplacedSequence, NotArity, StackedQuantifier,
};
use crate::pattern::pat::KeyedShape;

/// Check the structure of a pattern. Nodes are visited in preorder and the
/// first problem is reported. Checking never changes the tree, so repeated
/// calls agree.
pub fn validate(tree: &PatternTree, opts: &Options) -> Result<(), Malformed> {
  let mut seen = HashSet::new();
  for id in tree.ids() {
    check_node(tree, id).map_err(|e| {
      tracing::debug!("{e}");
      e
    })?;
    if let (NodeKind::Var(name), DuplicateVars::Reject) = (tree.kind(id), opts.duplicates) {
      if !seen.insert(name.clone()) {
        return Err(DuplicateVariable { name: name.clone() }.at(tree.path(id)));
      }
    }
  }
  Ok(())
}

fn check_node(tree: &PatternTree, id: NodeId) -> Result<(), Malformed> {
  let node = tree.node(id);
  let parent_kind = node.parent.map(|p| tree.kind(p));
  let in_list = matches!(parent_kind, Some(NodeKind::Decon(_) | NodeKind::Seq));
  let path = tree.path(id);
  match &node.kind {
    NodeKind::Quant { .. } => {
      if !in_list {
        return Err(MisplacedQuantifier.at(path));
      }
      match node.prev.map(|p| tree.kind(p)) {
        None => Err(DanglingQuantifier.at(path)),
        Some(NodeKind::Quant { .. }) => Err(StackedQuantifier.at(path)),
        Some(_) => Ok(()),
      }
    },
    NodeKind::Seq if !in_list => Err(MisplacedSequence.at(path)),
    NodeKind::Seq if node.children.is_empty() => Err(EmptySequence.at(path)),
    NodeKind::And | NodeKind::Or | NodeKind::Not if node.children.is_empty() => {
      let operator = node.kind.name();
      Err(EmptyComposite { operator }.at(path))
    },
    NodeKind::Not if 1 < node.children.len() => {
      let count = node.children.len();
      Err(NotArity { count }.at(path))
    },
    NodeKind::Or | NodeKind::Not => match tree.vars(id).into_iter().next() {
      Some((var, name)) => {
        let operator = node.kind.name();
        Err(BindingInAlternative { name, operator }.at(tree.path(var)))
      },
      None => Ok(()),
    },
    NodeKind::Keyed { keys, .. } if keys.is_empty() => Err(KeyedArity.at(path)),
    NodeKind::Keyed { keys, shape } => {
      if let KeyedShape::Record(_) = shape {
        if let Some(key) = keys.iter().find(|k| k.as_text().is_none()) {
          return Err(BadFieldKey { key: key.clone() }.at(path));
        }
        if let Some(key) = keys.iter().duplicates_by(|k| k.as_text()).next() {
          return Err(DuplicateKey { key: key.clone() }.at(path));
        }
      }
      match keys.iter().enumerate().find(|(n, k)| keys[..*n].contains(*k)) {
        Some((_, key)) => Err(DuplicateKey { key: key.clone() }.at(path)),
        None => Ok(()),
      }
    },
    NodeKind::Cond(_) => {
      let at_tail = |n: NodeId| match tree.node(n).next {
        None => true,
        Some(next) => matches!(tree.kind(next), NodeKind::Cond(_)),
      };
      let alternative = tree.ancestors(id).any(|a| matches!(tree.kind(a), NodeKind::Or | NodeKind::Not));
      if !in_list || alternative || !at_tail(id) || !tree.ancestors(id).all(at_tail) {
        return Err(MisplacedCondition.at(path));
      }
      Ok(())
    },
    _ => Ok(()),
  }
}

#[cfg(test)]
mod test {
  use super::validate;
  use crate::config::{DuplicateVars, Options};
  use crate::error::{
    BadFieldKey, BindingInAlternative, DanglingQuantifier, DuplicateKey, DuplicateVariable,
    EmptyComposite, EmptySequence, KeyedArity, Malformed, MisplacedCondition, MisplacedQuantifier,
    MisplacedSequence, NotArity, StackedQuantifier,
  };
  use crate::pattern::pat::*;
  use crate::pattern::tree::PatternTree;
  use crate::value::Value;

  fn check_with(p: Pat, opts: Options) -> Result<(), Malformed> {
    validate(&PatternTree::build(&p, &opts), &opts)
  }
  fn check(p: Pat) -> Result<(), Malformed> { check_with(p, Options::default()) }

  #[test]
  fn valid_patterns() {
    let p = list([var("a"), many(), seq([var("b"), list([var("c"), many()]), at_least(1)]), cond(|_| true)]);
    assert!(check(p.clone()).is_ok());
    let tree = PatternTree::build(&p, &Options::default());
    assert!(validate(&tree, &Options::default()).is_ok());
    assert!(validate(&tree, &Options::default()).is_ok(), "checking twice gives the same answer");
    assert!(check(or([1.into(), and([any(), not(2.into())])])).is_ok());
    assert!(check(keyed_map([bare("a"), key(1, any())])).is_ok());
  }

  #[test]
  fn quantifiers() {
    assert!(check(list([many()])).unwrap_err().is::<DanglingQuantifier>());
    assert!(check(list([any(), many(), many_lazy()])).unwrap_err().is::<StackedQuantifier>());
    assert!(check(many()).unwrap_err().is::<MisplacedQuantifier>());
    assert!(check(and([any(), many()])).unwrap_err().is::<MisplacedQuantifier>());
    assert!(check(keyed_map([key(1, many())])).unwrap_err().is::<MisplacedQuantifier>());
  }

  #[test]
  fn misplaced_quantifier_wins_regardless_of_siblings() {
    for extra in [any(), var("x"), list([]), seq([1.into()])] {
      let err = check(list([extra, and([many()])])).unwrap_err();
      assert!(err.is::<MisplacedQuantifier>(), "{err}");
    }
  }

  #[test]
  fn composites() {
    assert!(check(and([])).unwrap_err().is::<EmptyComposite>());
    assert!(check(or([])).unwrap_err().is::<EmptyComposite>());
    assert!(check(Pat::Not(vec![])).unwrap_err().is::<EmptyComposite>());
    assert!(check(Pat::Not(vec![any(), any()])).unwrap_err().is::<NotArity>());
    let err = check(or([var("x"), 1.into()])).unwrap_err();
    assert!(err.is::<BindingInAlternative>());
    assert_eq!(err.path.0, vec![0]);
    assert!(check(not(list([var("y")]))).unwrap_err().is::<BindingInAlternative>());
  }

  #[test]
  fn sequences() {
    assert!(check(list([seq([])])).unwrap_err().is::<EmptySequence>());
    assert!(check(seq([any()])).unwrap_err().is::<MisplacedSequence>());
    assert!(check(list([and([seq([any()])])])).unwrap_err().is::<MisplacedSequence>());
  }

  #[test]
  fn conditions() {
    assert!(check(cond(|_| true)).unwrap_err().is::<MisplacedCondition>());
    assert!(check(list([cond(|_| true), any()])).unwrap_err().is::<MisplacedCondition>());
    assert!(check(list([list([any(), cond(|_| true)]), any()])).unwrap_err().is::<MisplacedCondition>());
    assert!(check(list([list([any(), cond(|_| true)]), many()])).unwrap_err().is::<MisplacedCondition>());
    assert!(check(list([any(), cond(|_| true), cond(|_| true)])).is_ok());
    assert!(check(list([list([any(), cond(|_| true)])])).is_ok());
  }

  #[test]
  fn keyed() {
    assert!(check(keyed_map([])).unwrap_err().is::<KeyedArity>());
    assert!(check(keyed_map([bare("a"), key(Value::sym("a"), any())])).unwrap_err().is::<DuplicateKey>());
    assert!(check(keyed_record("P", [key(1, any())])).unwrap_err().is::<BadFieldKey>());
    assert!(check(keyed_record("P", [bare("x"), key("x", any())])).unwrap_err().is::<DuplicateKey>());
  }

  #[test]
  fn duplicate_policy() {
    let p = list([var("a"), list([var("a")])]);
    assert!(check(p.clone()).is_ok());
    let err = check_with(p, Options::default().duplicates(DuplicateVars::Reject)).unwrap_err();
    assert!(err.is::<DuplicateVariable>());
    assert_eq!(err.path.0, vec![1, 0]);
  }
}
