pub mod boxed_iter;
mod unwrap_or;

pub(crate) use unwrap_or::unwrap_or;
