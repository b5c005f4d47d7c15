/// A macro version of [Option::unwrap_or_else] which supports flow
/// control statements such as `return` and `continue` in the "else" branch.
///
/// ```ignore
/// let items = unwrap_or!(value.as_list(); return false);
/// ```
///
/// It also unwraps single-field variants of other enums
///
/// ```ignore
/// let record = unwrap_or!(value => Value::Record; return Err(Rejected));
/// ```
macro_rules! unwrap_or {
  ($m:expr; $fail:expr) => {{ if let Some(res) = ($m) { res } else { $fail } }};
  ($m:expr => $pattern:path; $fail:expr) => {{ if let $pattern(res) = ($m) { res } else { $fail } }};
}

pub(crate) use unwrap_or;
