use std::fmt;
use std::rc::Rc;

use intern_all::Tok;
use itertools::Itertools;

use super::pat::{CompareFn, GuardFn, KeyedShape, Pat};
use crate::config::{Greed, Options};
use crate::decompose::Shape;
use crate::value::{Kind, Value};

/// Index of a node in a [PatternTree]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Child indices leading from the root to a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NodePath(pub Vec<usize>);

impl fmt::Display for NodePath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.0.is_empty() {
      return write!(f, "/");
    }
    self.0.iter().try_for_each(|i| write!(f, "/{i}"))
  }
}

/// The test applied by a value pattern
#[derive(Clone)]
pub enum Literal {
  Eq(Value),
  By(Value, Rc<dyn CompareFn>),
  Kind(Kind),
}
impl Literal {
  pub fn test(&self, value: &Value) -> bool {
    match self {
      Self::Eq(lit) => lit == value,
      Self::By(lit, cmp) => cmp(lit, value),
      Self::Kind(kind) => kind.accepts(value),
    }
  }
}

/// Node variants. Children are stored on the [Node].
#[derive(Clone)]
pub enum NodeKind {
  Literal(Literal),
  Var(Tok<String>),
  Wildcard,
  Decon(Shape),
  Keyed { shape: KeyedShape, keys: Vec<Value> },
  Quant { min: usize, greed: Greed },
  Seq,
  And,
  Or,
  Not,
  Cond(Rc<dyn GuardFn>),
}
impl NodeKind {
  /// Whether the children form a list of siblings that consume values in
  /// order
  pub fn is_ordered(&self) -> bool { matches!(self, Self::Decon(_) | Self::Seq | Self::Keyed { .. }) }

  /// Name used in messages
  pub fn name(&self) -> &'static str {
    match self {
      Self::Literal(_) => "Value",
      Self::Var(_) => "Var",
      Self::Wildcard => "Wildcard",
      Self::Decon(_) => "Deconstructor",
      Self::Keyed { .. } => "Keyed",
      Self::Quant { .. } => "Quantifier",
      Self::Seq => "Seq",
      Self::And => "And",
      Self::Or => "Or",
      Self::Not => "Not",
      Self::Cond(_) => "Cond",
    }
  }
}

/// A pattern node with its links
#[derive(Clone)]
pub struct Node {
  pub kind: NodeKind,
  pub parent: Option<NodeId>,
  pub children: Vec<NodeId>,
  /// Following sibling, only among the children of an ordered parent
  pub next: Option<NodeId>,
  /// Preceding sibling, only among the children of an ordered parent
  pub prev: Option<NodeId>,
}

/// A pattern stored as an arena of nodes addressed by [NodeId]
#[derive(Clone)]
pub struct PatternTree {
  nodes: Vec<Node>,
  root: NodeId,
}

impl PatternTree {
  /// Flatten a pattern into an arena and link parents and siblings.
  /// Quantifiers without a search order receive the default from the
  /// options.
  pub fn build(pat: &Pat, opts: &Options) -> Self {
    let mut this = Self { nodes: Vec::new(), root: NodeId(0) };
    this.root = this.add(pat, None, opts);
    this
  }

  fn add(&mut self, pat: &Pat, parent: Option<NodeId>, opts: &Options) -> NodeId {
    let (kind, children): (NodeKind, Vec<&Pat>) = match pat {
      Pat::Value(v) => (NodeKind::Literal(Literal::Eq(v.clone())), vec![]),
      Pat::ValueBy(v, cmp) => (NodeKind::Literal(Literal::By(v.clone(), cmp.clone())), vec![]),
      Pat::Kind(k) => (NodeKind::Literal(Literal::Kind(*k)), vec![]),
      Pat::Var(name) => (NodeKind::Var(name.clone()), vec![]),
      Pat::Wildcard => (NodeKind::Wildcard, vec![]),
      Pat::Decon(shape, items) => (NodeKind::Decon(shape.clone()), items.iter().collect()),
      Pat::Keyed(shape, entries) => {
        let keys = entries.iter().map(|(k, _)| k.clone()).collect();
        (NodeKind::Keyed { shape: shape.clone(), keys }, entries.iter().map(|(_, p)| p).collect())
      },
      Pat::Quant { min, greed } =>
        (NodeKind::Quant { min: *min, greed: greed.unwrap_or(opts.default_greed) }, vec![]),
      Pat::Seq(items) => (NodeKind::Seq, items.iter().collect()),
      Pat::And(items) => (NodeKind::And, items.iter().collect()),
      Pat::Or(items) => (NodeKind::Or, items.iter().collect()),
      Pat::Not(items) => (NodeKind::Not, items.iter().collect()),
      Pat::Cond(guard) => (NodeKind::Cond(guard.clone()), vec![]),
    };
    let id = NodeId(self.nodes.len());
    let ordered = kind.is_ordered();
    self.nodes.push(Node { kind, parent, children: Vec::new(), next: None, prev: None });
    let children = children.into_iter().map(|c| self.add(c, Some(id), opts)).collect_vec();
    if ordered {
      for (&prev, &next) in children.iter().tuple_windows() {
        self.nodes[prev.0].next = Some(next);
        self.nodes[next.0].prev = Some(prev);
      }
    }
    self.nodes[id.0].children = children;
    id
  }

  pub fn root(&self) -> NodeId { self.root }
  pub fn node(&self, id: NodeId) -> &Node { &self.nodes[id.0] }
  pub fn kind(&self, id: NodeId) -> &NodeKind { &self.nodes[id.0].kind }
  pub fn len(&self) -> usize { self.nodes.len() }
  pub fn is_empty(&self) -> bool { self.nodes.is_empty() }
  /// All node ids in preorder
  pub fn ids(&self) -> impl Iterator<Item = NodeId> { (0..self.nodes.len()).map(NodeId) }
  pub fn first_child(&self, id: NodeId) -> Option<NodeId> { self.node(id).children.first().copied() }

  /// The quantifier that repeats this node, if any
  pub fn quantifier_of(&self, id: NodeId) -> Option<NodeId> {
    let next = self.node(id).next?;
    matches!(self.kind(next), NodeKind::Quant { .. }).then_some(next)
  }

  /// The sibling to continue with after this node and its quantifier
  pub fn after(&self, id: NodeId) -> Option<NodeId> {
    match self.quantifier_of(id) {
      Some(q) => self.node(q).next,
      None => self.node(id).next,
    }
  }

  /// Parents up to the root, nearest first
  pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    std::iter::successors(self.node(id).parent, |p| self.node(*p).parent)
  }

  /// Variables in the subtree in preorder
  pub fn vars(&self, id: NodeId) -> Vec<(NodeId, Tok<String>)> {
    let mut out = Vec::new();
    self.vars_rec(id, &mut out);
    out
  }

  fn vars_rec(&self, id: NodeId, out: &mut Vec<(NodeId, Tok<String>)>) {
    if let NodeKind::Var(name) = self.kind(id) {
      out.push((id, name.clone()));
    }
    for c in &self.node(id).children {
      self.vars_rec(*c, out)
    }
  }

  /// Location of a node for error messages
  pub fn path(&self, id: NodeId) -> NodePath {
    let mut path = Vec::new();
    let mut cur = id;
    while let Some(parent) = self.node(cur).parent {
      path.push(self.node(parent).children.iter().position(|c| *c == cur).unwrap_or_default());
      cur = parent;
    }
    path.reverse();
    NodePath(path)
  }
}
