/// A type-erased iterator
pub type BoxedIter<'a, T> = Box<dyn Iterator<Item = T> + 'a>;
