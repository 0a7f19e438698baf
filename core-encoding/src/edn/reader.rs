use super::{Edn, ReadError};

type Result<T> = std::result::Result<T, ReadError>;

/// Deepest form nesting accepted, matching serde_json's recursion limit.
const MAX_DEPTH: usize = 128;

/// Read exactly one form from `input`.
///
/// Leading and trailing whitespace, commas, comments and `#_` discards are
/// ignored. Anything else after the first form is an error.
pub fn read(input: &str) -> Result<Edn> {
    let mut reader = Reader {
        input,
        pos: 0,
        depth: 0,
    };
    let form = match reader.read_form()? {
        Some(form) => form,
        None if reader.peek().is_some() => {
            return Err(reader.error(format!("unexpected '{}'", reader.rest_head())))
        }
        None => return Err(reader.error("unexpected end of input")),
    };
    reader.skip_ignorable()?;
    if reader.peek().is_some() {
        return Err(reader.error("unexpected trailing content"));
    }
    Ok(form)
}

struct Reader<'a> {
    input: &'a str,
    pos: usize,
    /// Forms currently open on the call stack.
    depth: usize,
}

impl<'a> Reader<'a> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn rest_head(&self) -> char {
        self.peek().unwrap_or(' ')
    }

    fn error(&self, message: impl Into<String>) -> ReadError {
        ReadError::Syntax {
            message: message.into(),
            offset: self.pos,
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == ',' {
                self.bump();
            } else if c == ';' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn skip_ignorable(&mut self) -> Result<()> {
        loop {
            self.skip_whitespace();
            if !self.input[self.pos..].starts_with("#_") {
                return Ok(());
            }
            self.pos += 2;
            if self.read_form()?.is_none() {
                return Err(self.error("discard marker without a form"));
            }
        }
    }

    /// Next form, or `None` when positioned at a closing delimiter or the
    /// end of input.
    ///
    /// Every recursive path goes through here, so `depth` bounds the stack.
    fn read_form(&mut self) -> Result<Option<Edn>> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        let form = self.read_next();
        self.depth -= 1;
        form
    }

    fn read_next(&mut self) -> Result<Option<Edn>> {
        self.skip_ignorable()?;
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let form = match c {
            ')' | ']' | '}' => return Ok(None),
            '(' => {
                self.bump();
                Edn::List(self.read_seq(')')?)
            }
            '[' => {
                self.bump();
                Edn::Vector(self.read_seq(']')?)
            }
            '{' => {
                self.bump();
                self.read_map()?
            }
            '"' => {
                self.bump();
                Edn::String(self.read_string()?)
            }
            '\\' => {
                self.bump();
                Edn::Char(self.read_char()?)
            }
            ':' => {
                self.bump();
                let name = self.read_token();
                if name.is_empty() {
                    return Err(self.error("keyword without a name"));
                }
                Edn::Keyword(name.to_string())
            }
            '#' => {
                self.bump();
                self.read_dispatch()?
            }
            _ => self.read_atom()?,
        };

        Ok(Some(form))
    }

    fn read_seq(&mut self, close: char) -> Result<Vec<Edn>> {
        let mut items = Vec::new();
        loop {
            if let Some(form) = self.read_form()? {
                items.push(form);
                continue;
            }
            return match self.bump() {
                Some(c) if c == close => Ok(items),
                Some(c) => Err(self.error(format!("unexpected '{c}', expected '{close}'"))),
                None => Err(self.error(format!("unterminated collection, expected '{close}'"))),
            };
        }
    }

    fn read_map(&mut self) -> Result<Edn> {
        let items = self.read_seq('}')?;
        if items.len() % 2 != 0 {
            return Err(self.error("map literal must contain an even number of forms"));
        }

        let mut entries = Vec::with_capacity(items.len() / 2);
        let mut items = items.into_iter();
        while let (Some(key), Some(value)) = (items.next(), items.next()) {
            entries.push((key, value));
        }
        Ok(Edn::Map(entries))
    }

    fn read_dispatch(&mut self) -> Result<Edn> {
        if self.peek() == Some('{') {
            self.bump();
            return Ok(Edn::Set(self.read_seq('}')?));
        }

        let tag = self.read_token().to_string();
        if tag.is_empty() {
            return Err(self.error("dispatch character without a tag"));
        }
        match self.read_form()? {
            Some(value) => Ok(Edn::Tagged(tag, Box::new(value))),
            None => Err(self.error(format!("tag #{tag} without a value"))),
        }
    }

    fn read_string(&mut self) -> Result<String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(out),
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('n') => '\n',
                        Some('b') => '\u{8}',
                        Some('f') => '\u{c}',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some('u') => self.read_unicode_escape()?,
                        Some(other) => {
                            return Err(self.error(format!("invalid escape '\\{other}'")))
                        }
                        None => return Err(self.error("unterminated string")),
                    };
                    out.push(escaped);
                }
                Some(c) => out.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn read_unicode_escape(&mut self) -> Result<char> {
        let start = self.pos;
        let digits = self
            .input
            .get(start..start + 4)
            .ok_or_else(|| self.error("truncated unicode escape"))?;
        if !is_hex4(digits) {
            return Err(self.error(format!("invalid unicode escape '{digits}'")));
        }
        let code = u32::from_str_radix(digits, 16)
            .map_err(|_| self.error(format!("invalid unicode escape '{digits}'")))?;
        self.pos += 4;
        char::from_u32(code).ok_or_else(|| self.error(format!("invalid code point {code:#x}")))
    }

    fn read_char(&mut self) -> Result<char> {
        let first = self
            .bump()
            .ok_or_else(|| self.error("character literal without a character"))?;
        if !first.is_alphabetic() {
            return Ok(first);
        }

        let rest = self.read_token();
        if rest.is_empty() {
            return Ok(first);
        }

        let name = format!("{first}{rest}");
        match name.as_str() {
            "newline" => Ok('\n'),
            "space" => Ok(' '),
            "tab" => Ok('\t'),
            "return" => Ok('\r'),
            "formfeed" => Ok('\u{c}'),
            "backspace" => Ok('\u{8}'),
            _ => match name.strip_prefix('u') {
                Some(hex) if is_hex4(hex) => u32::from_str_radix(hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| self.error(format!("invalid character \\{name}"))),
                _ => Err(self.error(format!("invalid character \\{name}"))),
            },
        }
    }

    fn read_token(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_delimiter(c) {
                break;
            }
            self.bump();
        }
        &self.input[start..self.pos]
    }

    fn read_atom(&mut self) -> Result<Edn> {
        let start = self.pos;
        let token = self.read_token();
        if token.is_empty() {
            return Err(self.error(format!("unexpected '{}'", self.rest_head())));
        }

        match token {
            "nil" => Ok(Edn::Nil),
            "true" => Ok(Edn::Bool(true)),
            "false" => Ok(Edn::Bool(false)),
            _ if looks_numeric(token) => parse_number(token).ok_or(ReadError::Syntax {
                message: format!("invalid number '{token}'"),
                offset: start,
            }),
            _ => Ok(Edn::Symbol(token.to_string())),
        }
    }
}

fn is_hex4(digits: &str) -> bool {
    digits.len() == 4 && digits.bytes().all(|b| b.is_ascii_hexdigit())
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | '(' | ')' | '[' | ']' | '{' | '}' | '"' | ';')
}

fn looks_numeric(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('+') | Some('-') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}

fn parse_number(token: &str) -> Option<Edn> {
    if let Some(decimal) = token.strip_suffix('M') {
        return decimal.parse().ok().map(Edn::Float);
    }
    if let Some(big) = token.strip_suffix('N') {
        return big.parse().ok().map(Edn::Integer);
    }
    if token.contains(['.', 'e', 'E']) {
        token.parse().ok().map(Edn::Float)
    } else {
        token.parse().ok().map(Edn::Integer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(name: &str) -> Edn {
        Edn::Keyword(name.to_string())
    }

    #[test]
    fn test_read_scalars() {
        assert_eq!(read("nil").unwrap(), Edn::Nil);
        assert_eq!(read("true").unwrap(), Edn::Bool(true));
        assert_eq!(read("false").unwrap(), Edn::Bool(false));
        assert_eq!(read("42").unwrap(), Edn::Integer(42));
        assert_eq!(read("-7").unwrap(), Edn::Integer(-7));
        assert_eq!(read("+3").unwrap(), Edn::Integer(3));
        assert_eq!(read("12N").unwrap(), Edn::Integer(12));
        assert_eq!(read("1993.0").unwrap(), Edn::Float(1993.0));
        assert_eq!(read("1.5M").unwrap(), Edn::Float(1.5));
        assert_eq!(read("2e3").unwrap(), Edn::Float(2000.0));
        assert_eq!(read(":num-tracks").unwrap(), kw("num-tracks"));
        assert_eq!(read("artist/name").unwrap(), Edn::Symbol("artist/name".to_string()));
    }

    #[test]
    fn test_read_strings_and_escapes() {
        assert_eq!(
            read(r#""In the Night""#).unwrap(),
            Edn::String("In the Night".to_string())
        );
        assert_eq!(
            read(r#""a\"b\\c\nd&""#).unwrap(),
            Edn::String("a\"b\\c\nd&".to_string())
        );
        assert!(read(r#""open"#).is_err());
        assert!(read(r#""bad \q escape""#).is_err());
    }

    #[test]
    fn test_read_characters() {
        assert_eq!(read(r"\a").unwrap(), Edn::Char('a'));
        assert_eq!(read(r"\newline").unwrap(), Edn::Char('\n'));
        assert_eq!(read(r"\space").unwrap(), Edn::Char(' '));
        assert_eq!(read(r"\A").unwrap(), Edn::Char('A'));
        assert_eq!(read(r"\(").unwrap(), Edn::Char('('));
        assert!(read(r"\nope").is_err());
    }

    #[test]
    fn test_read_collections() {
        assert_eq!(
            read("[1 (2) #{3}]").unwrap(),
            Edn::Vector(vec![
                Edn::Integer(1),
                Edn::List(vec![Edn::Integer(2)]),
                Edn::Set(vec![Edn::Integer(3)]),
            ])
        );
        assert_eq!(
            read(r#"{:artist "Megadeth", :year 1985}"#).unwrap(),
            Edn::Map(vec![
                (kw("artist"), Edn::String("Megadeth".to_string())),
                (kw("year"), Edn::Integer(1985)),
            ])
        );
        assert_eq!(read("{}").unwrap(), Edn::Map(vec![]));
    }

    #[test]
    fn test_ignorable_input() {
        let form = read("  ; leading comment\n {:id 1 #_ :ignored #_ 2} ,, ").unwrap();
        assert_eq!(form, Edn::Map(vec![(kw("id"), Edn::Integer(1))]));
    }

    #[test]
    fn test_tagged_element() {
        assert_eq!(
            read("#uuid \"f81d4fae\"").unwrap(),
            Edn::Tagged(
                "uuid".to_string(),
                Box::new(Edn::String("f81d4fae".to_string()))
            )
        );
        assert!(read("#inst").is_err());
    }

    #[test]
    fn test_structural_errors() {
        assert!(matches!(
            read(""),
            Err(ReadError::Syntax { offset: 0, .. })
        ));
        assert!(read("   ").is_err());
        assert!(read("{:id}").is_err());
        assert!(read("[1 2").is_err());
        assert!(read("[1 2}").is_err());
        assert!(read("]").is_err());
        assert!(read("1 2").is_err());
        assert!(read(":").is_err());
        assert!(read("1.2.3").is_err());
    }

    #[test]
    fn test_error_reports_offset() {
        let err = read("{:id 1} x").unwrap_err();
        assert_eq!(
            err,
            ReadError::Syntax {
                message: "unexpected trailing content".to_string(),
                offset: 8,
            }
        );
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        for open in ["[", "{", "(", "#{", "#tag "] {
            let err = read(&open.repeat(100_000)).unwrap_err();
            assert!(
                matches!(&err, ReadError::Syntax { message, .. } if message == "nesting too deep"),
                "{open}: {err}"
            );
        }

        let err = read(&"#_ ".repeat(100_000)).unwrap_err();
        assert!(matches!(err, ReadError::Syntax { .. }));
    }

    #[test]
    fn test_nesting_within_limit() {
        let depth = 100;
        let input = format!("{}{}", "[".repeat(depth), "]".repeat(depth));
        let mut form = read(&input).unwrap();
        for _ in 1..depth {
            form = match form {
                Edn::Vector(mut items) => items.remove(0),
                other => panic!("expected a vector, got {other:?}"),
            };
        }
        assert_eq!(form, Edn::Vector(vec![]));
    }

    #[test]
    fn test_unicode_escapes_require_four_hex_digits() {
        assert_eq!(read(r#""\u0041""#).unwrap(), Edn::String("A".to_string()));
        assert!(read(r#""\u+041""#).is_err());
        assert!(read(r#""\u00g1""#).is_err());
        assert!(read(r#""\u41""#).is_err());
        assert_eq!(read(r"\u0041").unwrap(), Edn::Char('A'));
        assert!(read(r"\u+041").is_err());
    }
}
