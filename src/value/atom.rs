//! Application objects carried through matching without the engine knowing
//! their structure. A decomposer registered for their shape can downcast them.

use std::any::Any;
use std::fmt;

use dyn_clone::DynClone;

/// Functionality the engine needs to handle an opaque value
pub trait Atomic: Any + fmt::Debug + DynClone
where Self: 'static
{
  /// Casts this value to [Any] so that decomposers can recover the concrete
  /// type.
  fn as_any_ref(&self) -> &dyn Any;

  /// Typename to be shown in messages and in the display of the value
  fn type_str(&self) -> &'static str;

  /// Equality with another atom. Values of different types must report
  /// false.
  fn strict_eq(&self, other: &dyn Any) -> bool;
}

/// A proxy trait that implements [Atomic] for plain data which can be compared
/// with [PartialEq], so that the usual derives are all it takes to put a
/// custom type into a [crate::Value].
pub trait InertAtomic: fmt::Debug + Clone + PartialEq + 'static {
  /// Typename to be shown in messages
  #[must_use]
  fn type_str() -> &'static str;
}
impl<T: InertAtomic> Atomic for T {
  fn as_any_ref(&self) -> &dyn Any { self }
  fn type_str(&self) -> &'static str { <T as InertAtomic>::type_str() }
  fn strict_eq(&self, other: &dyn Any) -> bool {
    other.downcast_ref::<T>().is_some_and(|other| self == other)
  }
}

/// A type-erased [Atomic]
pub struct Atom(pub Box<dyn Atomic>);
impl Atom {
  /// Wrap an [Atomic] in a type-erased box
  pub fn new<T: Atomic>(data: T) -> Self { Self(Box::new(data) as Box<dyn Atomic>) }
  /// Get the contained data
  pub fn data(&self) -> &dyn Atomic { self.0.as_ref() as &dyn Atomic }
  /// Attempt to downcast contained data to a specific type
  pub fn try_cast<T: Atomic>(&self) -> Option<&T> { self.data().as_any_ref().downcast_ref() }
  /// Test the type of the contained data without downcasting
  pub fn is<T: 'static>(&self) -> bool { self.data().as_any_ref().is::<T>() }
}

impl Clone for Atom {
  fn clone(&self) -> Self { Self(dyn_clone::clone_box(self.data())) }
}

impl PartialEq for Atom {
  fn eq(&self, other: &Self) -> bool { self.data().strict_eq(other.data().as_any_ref()) }
}

impl fmt::Debug for Atom {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "##ATOM[{:?}]##", self.data()) }
}
