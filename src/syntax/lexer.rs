use std::fmt;

use ordered_float::NotNan;

use super::ParseError;

/// Kinds of brackets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PType {
  Par,
  Sqr,
  Curl,
}
impl PType {
  pub fn l(self) -> char {
    match self {
      Self::Par => '(',
      Self::Sqr => '[',
      Self::Curl => '{',
    }
  }
  pub fn r(self) -> char {
    match self {
      Self::Par => ')',
      Self::Sqr => ']',
      Self::Curl => '}',
    }
  }
}

/// A unit of syntax
#[derive(Debug, Clone, PartialEq)]
pub enum Lexeme {
  LP(PType),
  RP(PType),
  Comma,
  /// `|`
  Pipe,
  /// `&`
  Amp,
  /// `!`
  Bang,
  /// `=>`
  Arrow,
  /// `:` not directly followed by a name
  Colon,
  Name(String),
  /// `:name`
  Sym(String),
  Int(i64),
  Float(NotNan<f64>),
  Str(String),
  /// `/source/`
  Regex(String),
  /// `..`, `..N`, `..?`, `..N?`
  Quant { min: usize, lazy: bool },
}

impl fmt::Display for Lexeme {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::LP(t) => write!(f, "{}", t.l()),
      Self::RP(t) => write!(f, "{}", t.r()),
      Self::Comma => write!(f, ","),
      Self::Pipe => write!(f, "|"),
      Self::Amp => write!(f, "&"),
      Self::Bang => write!(f, "!"),
      Self::Arrow => write!(f, "=>"),
      Self::Colon => write!(f, ":"),
      Self::Name(n) => write!(f, "{n}"),
      Self::Sym(n) => write!(f, ":{n}"),
      Self::Int(n) => write!(f, "{n}"),
      Self::Float(n) => write!(f, "{:?}", n.into_inner()),
      Self::Str(s) => write!(f, "{s:?}"),
      Self::Regex(s) => write!(f, "/{s}/"),
      Self::Quant { min, lazy } => write!(f, "..{min}{}", if *lazy { "?" } else { "" }),
    }
  }
}

/// A lexeme and the byte offset where it starts
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
  pub lexeme: Lexeme,
  pub pos: usize,
}

/// Character filter that can appear in a name
pub fn namechar(c: char) -> bool { c.is_alphanumeric() || c == '_' }
/// Character filter that can start a name
pub fn namestart(c: char) -> bool { c.is_alphabetic() || c == '_' }

/// Split off all characters from the beginning that match a filter
pub fn split_filter(s: &str, mut pred: impl FnMut(char) -> bool) -> (&str, &str) {
  s.find(|c| !pred(c)).map_or((s, ""), |i| s.split_at(i))
}

fn lit_table() -> impl IntoIterator<Item = (&'static str, Lexeme)> {
  [
    ("(", Lexeme::LP(PType::Par)),
    ("[", Lexeme::LP(PType::Sqr)),
    ("{", Lexeme::LP(PType::Curl)),
    (")", Lexeme::RP(PType::Par)),
    ("]", Lexeme::RP(PType::Sqr)),
    ("}", Lexeme::RP(PType::Curl)),
    (",", Lexeme::Comma),
    ("|", Lexeme::Pipe),
    ("&", Lexeme::Amp),
    ("!", Lexeme::Bang),
    ("=>", Lexeme::Arrow),
  ]
}

/// Split the source into lexemes
pub fn lex(source: &str) -> Result<Vec<Entry>, ParseError> {
  let mut tokens: Vec<Entry> = Vec::new();
  let mut data = source.trim_start();
  'tail: while !data.is_empty() {
    let pos = source.len() - data.len();
    let after_name = matches!(tokens.last(), Some(Entry { lexeme: Lexeme::Name(_), .. }));
    let mut push = |lexeme, tail| push_entry(&mut tokens, pos, lexeme, tail);
    if let Some(tail) = data.strip_prefix("..") {
      let (digits, tail) = split_filter(tail, |c| c.is_ascii_digit());
      let min = match digits {
        "" => 0,
        d => d.parse().map_err(|_| ParseError::new(pos, "quantifier count is too large"))?,
      };
      let (lazy, tail) = tail.strip_prefix('?').map_or((false, tail), |t| (true, t));
      data = push(Lexeme::Quant { min, lazy }, tail);
      continue 'tail;
    }
    for (prefix, lexeme) in lit_table() {
      if let Some(tail) = data.strip_prefix(prefix) {
        data = push(lexeme, tail);
        continue 'tail;
      }
    }
    if let Some(tail) = data.strip_prefix(':') {
      let (name, rest) = split_filter(tail, namechar);
      data = match name.chars().next() {
        Some(c) if namestart(c) && !after_name => push(Lexeme::Sym(name.to_string()), rest),
        _ => push(Lexeme::Colon, tail),
      };
      continue 'tail;
    }
    if let Some(tail) = data.strip_prefix('"') {
      let (text, tail) = lex_string(tail).ok_or_else(|| ParseError::new(pos, "unterminated string"))?;
      data = push(Lexeme::Str(text), tail);
      continue 'tail;
    }
    if let Some(tail) = data.strip_prefix('/') {
      let (text, tail) = lex_regex(tail).ok_or_else(|| ParseError::new(pos, "unterminated regex"))?;
      data = push(Lexeme::Regex(text), tail);
      continue 'tail;
    }
    let unsigned = data.strip_prefix('-').unwrap_or(data);
    if unsigned.starts_with(|c: char| c.is_ascii_digit()) {
      let (lexeme, tail) = lex_number(data).ok_or_else(|| ParseError::new(pos, "invalid number"))?;
      data = push(lexeme, tail);
      continue 'tail;
    }
    if data.starts_with(namestart) {
      let (name, tail) = split_filter(data, namechar);
      data = push(Lexeme::Name(name.to_string()), tail);
      continue 'tail;
    }
    let c = data.chars().next().unwrap_or_default();
    return Err(ParseError::new(pos, format!("unexpected character {c:?}")));
  }
  Ok(tokens)
}

/// Record a lexeme and skip the whitespace after it
fn push_entry<'a>(tokens: &mut Vec<Entry>, pos: usize, lexeme: Lexeme, tail: &'a str) -> &'a str {
  tokens.push(Entry { lexeme, pos });
  tail.trim_start()
}

/// Read a string body after the opening quote
fn lex_string(data: &str) -> Option<(String, &str)> {
  let mut out = String::new();
  let mut chars = data.char_indices();
  while let Some((i, c)) = chars.next() {
    match c {
      '"' => return Some((out, &data[i + 1..])),
      '\\' => out.push(match chars.next()?.1 {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        other => other,
      }),
      c => out.push(c),
    }
  }
  None
}

/// Read a regex body after the opening slash. `\/` stands for a slash, every
/// other escape is left for the regex engine.
fn lex_regex(data: &str) -> Option<(String, &str)> {
  let mut out = String::new();
  let mut chars = data.char_indices();
  while let Some((i, c)) = chars.next() {
    match c {
      '/' => return Some((out, &data[i + 1..])),
      '\\' => match chars.next()?.1 {
        '/' => out.push('/'),
        other => {
          out.push('\\');
          out.push(other)
        },
      },
      c => out.push(c),
    }
  }
  None
}

fn lex_number(data: &str) -> Option<(Lexeme, &str)> {
  let (sign, unsigned) = data.strip_prefix('-').map_or(("", data), |t| ("-", t));
  let (int, tail) = split_filter(unsigned, |c| c.is_ascii_digit());
  let mut end = sign.len() + int.len();
  let mut float = false;
  if let Some(frac) = tail.strip_prefix('.').filter(|t| t.starts_with(|c: char| c.is_ascii_digit())) {
    float = true;
    end += 1 + split_filter(frac, |c| c.is_ascii_digit()).0.len();
  }
  if let Some(exp) = data[end..].strip_prefix(['e', 'E']) {
    let exp_digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
    let (digits, _) = split_filter(exp_digits, |c| c.is_ascii_digit());
    if !digits.is_empty() {
      float = true;
      end += 1 + (exp.len() - exp_digits.len()) + digits.len();
    }
  }
  let (text, tail) = data.split_at(end);
  let lexeme = match float {
    true => Lexeme::Float(NotNan::new(text.parse().ok()?).ok()?),
    false => Lexeme::Int(text.parse().ok()?),
  };
  Some((lexeme, tail))
}

#[cfg(test)]
mod test {
  use ordered_float::NotNan;

  use super::{lex, Lexeme, PType};

  fn lexemes(src: &str) -> Vec<Lexeme> { lex(src).unwrap().into_iter().map(|e| e.lexeme).collect() }

  #[test]
  fn quantifiers_and_numbers() {
    assert_eq!(lexemes("[a, ..2?, -1.5e1, 3..]"), vec![
      Lexeme::LP(PType::Sqr),
      Lexeme::Name("a".to_string()),
      Lexeme::Comma,
      Lexeme::Quant { min: 2, lazy: true },
      Lexeme::Comma,
      Lexeme::Float(NotNan::new(-15.0).unwrap()),
      Lexeme::Comma,
      Lexeme::Int(3),
      Lexeme::Quant { min: 0, lazy: false },
      Lexeme::RP(PType::Sqr),
    ]);
  }

  #[test]
  fn symbols_and_colons() {
    assert_eq!(lexemes("{:a => x}"), vec![
      Lexeme::LP(PType::Curl),
      Lexeme::Sym("a".to_string()),
      Lexeme::Arrow,
      Lexeme::Name("x".to_string()),
      Lexeme::RP(PType::Curl),
    ]);
    assert_eq!(lexemes("P{x:y}")[2..4], [Lexeme::Name("x".to_string()), Lexeme::Colon]);
  }

  #[test]
  fn strings_and_regexes() {
    assert_eq!(lexemes(r#""a\"b\n""#), vec![Lexeme::Str("a\"b\n".to_string())]);
    assert_eq!(lexemes(r"/a\/b\d/"), vec![Lexeme::Regex(r"a/b\d".to_string())]);
    let err = lex("[1, \"open").unwrap_err();
    assert_eq!(err.pos, 4);
    assert!(lex("#").is_err());
  }
}
