#![doc(html_root_url = "https://docs.rs/patmatch")]
//! Structural pattern matching over dynamic values. Patterns destructure
//! lists, maps, records and anything a registered decomposer can take apart,
//! bind variables, repeat items greedily or lazily, and backtrack through
//! every choice until the whole pattern and its guard agree.
//!
//! ```
//! use patmatch::pat::{list, many, var};
//! use patmatch::{Pattern, Value};
//!
//! let p = Pattern::new(&list([var("first"), var("rest"), many()])).unwrap();
//! let b = p.matches(&Value::list([1, 2, 3])).unwrap();
//! assert_eq!(b["first"], Value::Int(1));
//! assert_eq!(b["rest"], Value::list([2, 3]));
//! ```
pub mod config;
pub mod decompose;
pub mod error;
pub mod matcher;
pub mod pattern;
pub mod scope;
pub mod select;
pub mod syntax;
pub mod utils;
pub mod value;

pub use config::{DuplicateVars, Greed, Options};
pub use decompose::{Decomposer, Registry, Rejected, Shape};
pub use error::{Error, Malformed};
pub use matcher::{Bindings, Pattern};
pub use pattern::{pat, Pat};
pub use scope::Env;
pub use select::Selector;
pub use syntax::{assert_pattern, ParseError};
pub use value::{Kind, Value};
