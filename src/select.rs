//! Ordered clause lists. The first clause whose pattern matches and whose
//! guard accepts runs its action, and no other clause is tried.

use std::fmt;
use std::rc::Rc;

use crate::config::Options;
use crate::decompose::Registry;
use crate::error::Error;
use crate::matcher::{Bindings, Pattern};
use crate::pattern::{GuardFn, Pat};
use crate::scope::Env;
use crate::value::Value;

struct Clause<R> {
  /// Compiled when the clause is added; a malformed pattern is reported
  /// when the clause is reached
  pattern: Result<Pattern, Error>,
  guard: Option<Rc<dyn GuardFn>>,
  action: Box<dyn Fn(&mut Env) -> R>,
}

/// A list of clauses tried in order against a value
pub struct Selector<R> {
  registry: Rc<Registry>,
  opts: Options,
  clauses: Vec<Clause<R>>,
}

impl<R> Selector<R> {
  /// Built-in decomposers and default options
  pub fn new() -> Self { Self::using(Rc::new(Registry::new()), Options::default()) }

  /// Compile clause patterns against this registry with these options
  pub fn using(registry: Rc<Registry>, opts: Options) -> Self {
    Self { registry, opts, clauses: Vec::new() }
  }

  /// Add a clause. The action sees the bindings of the match through the
  /// [Env], on top of any names that were visible before.
  pub fn with(self, pat: impl Into<Pat>, action: impl Fn(&mut Env) -> R + 'static) -> Self {
    self.push(pat.into(), None, Box::new(action))
  }

  /// Add a clause that is only selected if the guard accepts the bindings.
  /// A rejection by the guard backtracks into the pattern before the next
  /// clause is tried.
  pub fn with_guard(
    self,
    pat: impl Into<Pat>,
    guard: impl Fn(&Bindings) -> bool + 'static,
    action: impl Fn(&mut Env) -> R + 'static,
  ) -> Self {
    self.push(pat.into(), Some(Rc::new(guard)), Box::new(action))
  }

  fn push(mut self, pat: Pat, guard: Option<Rc<dyn GuardFn>>, action: Box<dyn Fn(&mut Env) -> R>) -> Self {
    let pattern = Pattern::compile(&pat, &self.registry, &self.opts);
    self.clauses.push(Clause { pattern, guard, action });
    self
  }

  pub fn len(&self) -> usize { self.clauses.len() }
  pub fn is_empty(&self) -> bool { self.clauses.is_empty() }

  /// Run the first matching clause with a fresh [Env]
  pub fn eval(&self, value: &Value) -> Result<R, Error> { self.eval_in(&mut Env::new(), value) }

  /// Run the first matching clause with its bindings pushed onto `env` for
  /// the duration of the action
  pub fn eval_in(&self, env: &mut Env, value: &Value) -> Result<R, Error> {
    for (n, clause) in self.clauses.iter().enumerate() {
      let pattern = clause.pattern.as_ref().map_err(Clone::clone)?;
      tracing::debug!("Clause {n}: trying {pattern} against {value}");
      let found = match &clause.guard {
        Some(guard) => pattern.match_guarded(value, guard.as_ref()),
        None => pattern.matches(value),
      };
      if let Some(bindings) = found {
        tracing::debug!("Clause {n} selected with {bindings}");
        let mut scope = env.enter(&bindings);
        return Ok((clause.action)(&mut *scope));
      }
    }
    tracing::debug!("No clause matched {value}");
    Err(Error::NoMatchingPattern(value.clone()))
  }

  /// A reusable matcher over the clauses
  pub fn into_fn(self) -> impl Fn(&Value) -> Result<R, Error> { move |value| self.eval(value) }
}

impl<R> Default for Selector<R> {
  fn default() -> Self { Self::new() }
}

impl<R> fmt::Debug for Selector<R> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut list = f.debug_list();
    for clause in &self.clauses {
      match &clause.pattern {
        Ok(p) => list.entry(&format_args!("{p}")),
        Err(e) => list.entry(&format_args!("<{e}>")),
      };
    }
    list.finish()
  }
}

#[cfg(test)]
mod test {
  use std::cell::RefCell;
  use std::rc::Rc;

  use super::Selector;
  use crate::error::{BindingInAlternative, Error};
  use crate::matcher::Bindings;
  use crate::pattern::pat::*;
  use crate::scope::Env;
  use crate::value::{Kind, Value};

  #[test]
  fn first_match_wins() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let (c1, c2, c3) = (calls.clone(), calls.clone(), calls.clone());
    let sel = Selector::new()
      .with(0, move |_| c1.borrow_mut().push(0))
      .with(Kind::Int, move |_| c2.borrow_mut().push(1))
      .with(any(), move |_| c3.borrow_mut().push(2));
    sel.eval(&Value::Int(5)).unwrap();
    sel.eval(&Value::str("x")).unwrap();
    assert_eq!(*calls.borrow(), vec![1, 2]);
  }

  #[test]
  fn exhaustion_is_an_error() {
    let sel = Selector::new().with(1, |_| ());
    assert!(matches!(sel.eval(&Value::Int(2)), Err(Error::NoMatchingPattern(Value::Int(2)))));
  }

  #[test]
  fn rejected_decomposition_moves_on() {
    let sel = Selector::new()
      .with(list([var("x")]), |env: &mut Env| env.get("x").cloned())
      .with(var("y"), |env: &mut Env| env.get("y").cloned());
    assert_eq!(sel.eval(&Value::list([3])).unwrap(), Some(Value::Int(3)));
    assert_eq!(sel.eval(&Value::Int(4)).unwrap(), Some(Value::Int(4)));
  }

  #[test]
  fn guard_backtracks_then_falls_through() {
    let sel = Selector::new()
      .with_guard(
        list([var("a"), many(), var("b"), many()]),
        |b: &Bindings| b["a"].as_list().is_some_and(|a| a.len() == 1),
        |env: &mut Env| env.get("b").map(|b| b.to_string()),
      )
      .with(any(), |_| None);
    assert_eq!(sel.eval(&Value::list([1, 2, 3])).unwrap().as_deref(), Some("[2, 3]"));
    assert_eq!(sel.eval(&Value::list(Vec::<Value>::new())).unwrap(), None);
  }

  #[test]
  fn malformed_clause_is_reported_when_reached() {
    let sel = Selector::new().with(1, |_| 1).with(or([var("x"), 2.into()]), |_| 2);
    assert_eq!(sel.eval(&Value::Int(1)).unwrap(), 1);
    let err = sel.eval(&Value::Int(2)).unwrap_err();
    assert!(err.malformed().is_some_and(|m| m.is::<BindingInAlternative>()));
  }

  #[test]
  fn nested_matches_restore_names() {
    let inner = Rc::new(Selector::new().with(var("a"), |env: &mut Env| env.get("a").cloned()));
    let outer = Selector::new().with(list([var("a"), var("b")]), move |env: &mut Env| {
      let shadowed = inner.eval_in(env, &Value::sym("inner")).unwrap();
      (shadowed, env.get("a").cloned(), env.get("b").cloned())
    });
    let (shadowed, a, b) = outer.eval(&Value::list([1, 2])).unwrap();
    assert_eq!(shadowed, Some(Value::sym("inner")));
    assert_eq!(a, Some(Value::Int(1)));
    assert_eq!(b, Some(Value::Int(2)));
  }

  #[test]
  fn reusable_function() {
    let f = Selector::new().with(Kind::Str, |_| "str").with(any(), |_| "other").into_fn();
    assert_eq!(f(&Value::str("s")).unwrap(), "str");
    assert_eq!(f(&Value::Nil).unwrap(), "other");
  }
}
