//! Visible names for clause actions. Entering a scope pushes the bindings of
//! a match on top of whatever the same names meant before, leaving it brings
//! the old values back, so nested and reentrant matches can reuse names.

use std::ops::{Deref, DerefMut};

use hashbrown::HashMap;
use intern_all::{i, Tok};

use crate::matcher::Bindings;
use crate::value::Value;

/// A stack of values for every name
#[derive(Debug, Clone, Default)]
pub struct Env {
  stacks: HashMap<Tok<String>, Vec<Value>>,
}
impl Env {
  pub fn new() -> Self { Self::default() }

  /// The innermost value of a name
  pub fn get(&self, name: &str) -> Option<&Value> { self.stacks.get(&i(name))?.last() }

  /// How many scopes currently define the name
  pub fn depth(&self, name: &str) -> usize { self.stacks.get(&i(name)).map_or(0, Vec::len) }

  /// Whether no name is visible
  pub fn is_empty(&self) -> bool { self.stacks.is_empty() }

  /// Shadow names with the bindings until the returned scope is dropped
  #[must_use]
  pub fn enter(&mut self, bindings: &Bindings) -> Scope<'_> {
    let mut pushed = Vec::with_capacity(bindings.len());
    for (name, value) in bindings.iter() {
      self.stacks.entry(name.clone()).or_default().push(value.clone());
      pushed.push(name.clone());
    }
    Scope { env: self, pushed }
  }
}

/// The dynamic extent of one set of bindings. Dereferences to the [Env].
pub struct Scope<'a> {
  env: &'a mut Env,
  pushed: Vec<Tok<String>>,
}

impl Deref for Scope<'_> {
  type Target = Env;
  fn deref(&self) -> &Env { self.env }
}
impl DerefMut for Scope<'_> {
  fn deref_mut(&mut self) -> &mut Env { self.env }
}

impl Drop for Scope<'_> {
  fn drop(&mut self) {
    for name in self.pushed.drain(..).rev() {
      if let Some(stack) = self.env.stacks.get_mut(&name) {
        stack.pop();
        if stack.is_empty() {
          self.env.stacks.remove(&name);
        }
      }
    }
  }
}
