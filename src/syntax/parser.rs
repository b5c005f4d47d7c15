use super::lexer::{lex, Entry, Lexeme, PType};
use super::ParseError;
use crate::decompose::{RegexShape, Shape};
use crate::error::Error;
use crate::pattern::pat::{self, Pat};
use crate::value::{Kind, Value};

/// Names that build a composite instead of a deconstructor
const BUILTINS: [&str; 4] = ["Seq", "And", "Or", "Not"];

struct Parser<'a> {
  tokens: &'a [Entry],
  cur: usize,
  end: usize,
}

impl<'a> Parser<'a> {
  fn new(tokens: &'a [Entry], source: &str) -> Self { Self { tokens, cur: 0, end: source.len() } }

  fn peek(&self) -> Option<&'a Lexeme> { self.tokens.get(self.cur).map(|e| &e.lexeme) }
  fn pos(&self) -> usize { self.tokens.get(self.cur).map_or(self.end, |e| e.pos) }
  fn next(&mut self) -> Option<&'a Lexeme> {
    let lx = self.peek()?;
    self.cur += 1;
    Some(lx)
  }

  fn eat(&mut self, lx: &Lexeme) -> bool {
    let found = self.peek() == Some(lx);
    if found {
      self.cur += 1;
    }
    found
  }

  fn fail<T>(&self, message: impl Into<String>) -> Result<T, ParseError> {
    let found = match self.peek() {
      Some(lx) => format!("found `{lx}`"),
      None => "found end of input".to_string(),
    };
    Err(ParseError::new(self.pos(), format!("{}, {found}", message.into())))
  }

  fn expect(&mut self, lx: Lexeme) -> Result<(), ParseError> {
    match self.eat(&lx) {
      true => Ok(()),
      false => self.fail(format!("expected `{lx}`")),
    }
  }

  fn finish(&self) -> Result<(), ParseError> {
    match self.peek() {
      None => Ok(()),
      Some(_) => self.fail("expected end of input"),
    }
  }

  /// Comma separated items up to the closing bracket, trailing comma allowed
  fn list_of<T>(
    &mut self,
    close: PType,
    mut item: impl FnMut(&mut Self) -> Result<T, Error>,
  ) -> Result<Vec<T>, Error> {
    let mut out = Vec::new();
    while !self.eat(&Lexeme::RP(close)) {
      out.push(item(self)?);
      if !self.eat(&Lexeme::Comma) {
        self.expect(Lexeme::RP(close))?;
        break;
      }
    }
    Ok(out)
  }

  fn pattern(&mut self) -> Result<Pat, Error> {
    let mut alts = vec![self.conjunction()?];
    while self.eat(&Lexeme::Pipe) {
      alts.push(self.conjunction()?);
    }
    Ok(if alts.len() == 1 { alts.remove(0) } else { Pat::Or(alts) })
  }

  fn conjunction(&mut self) -> Result<Pat, Error> {
    let mut ops = vec![self.unary()?];
    while self.eat(&Lexeme::Amp) {
      ops.push(self.unary()?);
    }
    Ok(if ops.len() == 1 { ops.remove(0) } else { Pat::And(ops) })
  }

  fn unary(&mut self) -> Result<Pat, Error> {
    match self.eat(&Lexeme::Bang) {
      true => Ok(pat::not(self.unary()?)),
      false => self.primary(),
    }
  }

  fn primary(&mut self) -> Result<Pat, Error> {
    let start = self.cur;
    match self.next() {
      Some(Lexeme::LP(PType::Sqr)) => Ok(pat::list(self.list_of(PType::Sqr, Self::pattern)?)),
      Some(Lexeme::LP(PType::Curl)) => Ok(pat::keyed_map(self.list_of(PType::Curl, Self::map_entry)?)),
      Some(Lexeme::LP(PType::Par)) => {
        let inner = self.pattern()?;
        self.expect(Lexeme::RP(PType::Par))?;
        Ok(inner)
      },
      Some(Lexeme::Quant { min, lazy: false }) => Ok(pat::at_least(*min)),
      Some(Lexeme::Quant { min, lazy: true }) => Ok(pat::at_least_lazy(*min)),
      Some(Lexeme::Regex(src)) => {
        let shape = RegexShape::new(src)?;
        let items = match self.eat(&Lexeme::LP(PType::Par)) {
          true => self.list_of(PType::Par, Self::pattern)?,
          false => {
            let parts = shape.0.captures_len().saturating_sub(1).max(1);
            vec![Pat::Wildcard; parts]
          },
        };
        Ok(Pat::Decon(Shape::Regex(shape), items))
      },
      Some(Lexeme::Name(name)) => self.named(name),
      Some(Lexeme::Int(_) | Lexeme::Float(_) | Lexeme::Str(_) | Lexeme::Sym(_)) => {
        self.cur = start;
        Ok(Pat::Value(self.value()?))
      },
      _ => {
        self.cur = start;
        Ok(self.fail("expected a pattern")?)
      },
    }
  }

  fn named(&mut self, name: &str) -> Result<Pat, Error> {
    if self.eat(&Lexeme::LP(PType::Par)) {
      let items = self.list_of(PType::Par, Self::pattern)?;
      return Ok(match name {
        "Seq" => Pat::Seq(items),
        "And" => Pat::And(items),
        "Or" => Pat::Or(items),
        "Not" => Pat::Not(items),
        shape => pat::decon(shape, items),
      });
    }
    if self.eat(&Lexeme::LP(PType::Curl)) {
      return Ok(pat::keyed_record(name, self.list_of(PType::Curl, Self::field)?));
    }
    Ok(match name {
      "_" => Pat::Wildcard,
      "nil" => pat::val(Value::Nil),
      "true" => pat::val(true),
      "false" => pat::val(false),
      name if BUILTINS.contains(&name) => self.fail(format!("expected `(` after {name}"))?,
      name => match Kind::from_name(name) {
        Some(kind) => Pat::Kind(kind),
        None => pat::var(name),
      },
    })
  }

  /// `key => pattern` or `:name`
  fn map_entry(&mut self) -> Result<(Value, Pat), Error> {
    if let Some(Lexeme::Sym(name)) = self.peek() {
      let after = self.tokens.get(self.cur + 1).map(|e| &e.lexeme);
      if matches!(after, Some(Lexeme::Comma | Lexeme::RP(_)) | None) {
        self.cur += 1;
        return Ok(pat::bare(name));
      }
    }
    let key = self.value()?;
    self.expect(Lexeme::Arrow)?;
    Ok((key, self.pattern()?))
  }

  /// `field: pattern` or `:field`
  fn field(&mut self) -> Result<(Value, Pat), Error> {
    match self.peek() {
      Some(Lexeme::Sym(name)) => {
        self.cur += 1;
        Ok(pat::bare(name))
      },
      Some(Lexeme::Name(name)) => {
        self.cur += 1;
        self.expect(Lexeme::Colon)?;
        Ok(pat::key(Value::sym(name), self.pattern()?))
      },
      _ => Ok(self.fail("expected a field")?),
    }
  }

  fn value(&mut self) -> Result<Value, ParseError> {
    let start = self.cur;
    Ok(match self.next() {
      Some(Lexeme::Int(n)) => Value::Int(*n),
      Some(Lexeme::Float(x)) => Value::Float(*x),
      Some(Lexeme::Str(s)) => Value::str(s),
      Some(Lexeme::Sym(s)) => Value::sym(s),
      Some(Lexeme::LP(PType::Sqr)) => Value::list(self.values(PType::Sqr, Self::value)?),
      Some(Lexeme::LP(PType::Curl)) => {
        let entry = |p: &mut Self| {
          let k = p.value()?;
          p.expect(Lexeme::Arrow)?;
          Ok((k, p.value()?))
        };
        Value::map(self.values(PType::Curl, entry)?)
      },
      Some(Lexeme::Name(n)) if n == "nil" => Value::Nil,
      Some(Lexeme::Name(n)) if n == "true" => Value::Bool(true),
      Some(Lexeme::Name(n)) if n == "false" => Value::Bool(false),
      Some(Lexeme::Name(tag)) if self.eat(&Lexeme::LP(PType::Curl)) => {
        let field = |p: &mut Self| match p.peek() {
          Some(Lexeme::Name(name)) => {
            p.cur += 1;
            p.expect(Lexeme::Colon)?;
            Ok((name.as_str(), p.value()?))
          },
          _ => p.fail("expected a field name"),
        };
        Value::record(tag, self.values(PType::Curl, field)?)
      },
      _ => {
        self.cur = start;
        return self.fail("expected a value");
      },
    })
  }

  /// [Self::list_of] for the value grammar, which can only fail on syntax
  fn values<T>(
    &mut self,
    close: PType,
    mut item: impl FnMut(&mut Self) -> Result<T, ParseError>,
  ) -> Result<Vec<T>, ParseError> {
    let list = self.list_of(close, |p| Ok(item(p)?));
    list.map_err(|e| match e {
      Error::Parse(e) => e,
      e => ParseError::new(self.pos(), e.to_string()),
    })
  }
}

impl Pat {
  /// Read a pattern from its text form
  ///
  /// ```
  /// use patmatch::{Pat, Pattern, Value};
  /// let p = Pattern::new(&Pat::parse("[head, tail, ..]").unwrap()).unwrap();
  /// let b = p.matches(&Value::parse("[1, 2, 3]").unwrap()).unwrap();
  /// assert_eq!(b.to_string(), "head = 1, tail = [2, 3]");
  /// ```
  pub fn parse(source: &str) -> Result<Pat, Error> {
    let tokens = lex(source)?;
    let mut parser = Parser::new(&tokens, source);
    let pat = parser.pattern()?;
    parser.finish()?;
    Ok(pat)
  }
}

impl Value {
  /// Read a value from its text form
  pub fn parse(source: &str) -> Result<Value, ParseError> {
    let tokens = lex(source)?;
    let mut parser = Parser::new(&tokens, source);
    let value = parser.value()?;
    parser.finish()?;
    Ok(value)
  }
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use crate::error::Error;
  use crate::pattern::Pat;
  use crate::value::Value;

  fn round(src: &str) -> String { Pat::parse(src).unwrap().to_string() }

  #[test]
  fn pattern_forms() {
    assert_eq!(round("[a, .., b, ..?]"), "[a, .., b, ..?]");
    assert_eq!(round("[Seq(k, v), ..1, Int]"), "[Seq(k, v), ..1, Int]");
    assert_eq!(round("Int & n | Str"), "Or(And(Int, n), Str)");
    assert_eq!(round("!!(1 | 2)"), "Not(Not(Or(1, 2)))");
    assert_eq!(round("{:name => n, :age}"), "{:name => n, :age}");
    assert_eq!(round("Point{x: 0, :y}"), "Point{x: 0, :y}");
    assert_eq!(round("Rational(n, _)"), "Rational(n, _)");
    assert_eq!(round("[nil, true, -2, 1.5, \"s\", :k]"), "[nil, true, -2, 1.5, \"s\", :k]");
  }

  #[test]
  fn regex_shapes() {
    let Pat::Decon(_, items) = Pat::parse(r"/(\d+)-(\d+)/").unwrap() else { panic!("not a deconstructor") };
    assert_eq!(items.len(), 2);
    let Pat::Decon(_, items) = Pat::parse("/a+/(x)").unwrap() else { panic!("not a deconstructor") };
    assert_eq!(items.len(), 1);
    assert!(matches!(Pat::parse("/(/"), Err(Error::Regex(_))));
  }

  #[test]
  fn syntax_errors() {
    let Err(Error::Parse(e)) = Pat::parse("[a, b") else { panic!("expected a parse error") };
    assert_eq!(e.pos, 5);
    assert!(Pat::parse("[a] b").is_err());
    assert!(Pat::parse("Seq").is_err());
    assert!(Pat::parse("{1 2}").is_err());
  }

  #[test]
  fn values() {
    let v = Value::parse("[1, -2.5, \"x\", :s, nil, {:a => [true]}, P{x: 1}]").unwrap();
    assert_eq!(v.to_string(), "[1, -2.5, \"x\", :s, nil, {:a => [true]}, P{x: 1}]");
    assert!(Value::parse("[1,").is_err());
    assert!(Value::parse("x").is_err());
  }
}
