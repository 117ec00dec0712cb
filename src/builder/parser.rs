//! Parser for the handler-module language.
//!
//! ```text
//! module := item*
//! item   := "use" path ";" | "group" IDENT ":" path "{" op* "}"
//! op     := "op" IDENT "(" ")" "->" path "=" body ";"
//! body   := JSON-value | "fail" STRING
//! path   := IDENT ("::" IDENT)*
//! ```
//!
//! `//` starts a line comment. Parsing stops at the first syntax error.

use super::diagnostics::{Diagnostic, Location};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SymbolPath {
    pub segments: Vec<String>,
    pub location: Location,
}

impl SymbolPath {
    pub fn joined(&self) -> String {
        self.segments.join("::")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Body {
    Value(Value),
    Fail(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OpDecl {
    pub name: String,
    pub location: Location,
    pub returns: SymbolPath,
    pub body: Body,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GroupDecl {
    pub name: String,
    pub location: Location,
    pub base: SymbolPath,
    pub ops: Vec<OpDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Item {
    Use(SymbolPath),
    Group(GroupDecl),
}

type ParseResult<T> = Result<T, Diagnostic>;

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn location(&self) -> Location {
        Location::at(self.src, self.pos)
    }

    fn error<T>(&self, message: impl Into<String>) -> ParseResult<T> {
        Err(Diagnostic::error(message, self.location()))
    }

    fn skip_trivia(&mut self) {
        loop {
            let trimmed = self.rest().trim_start();
            self.pos = self.src.len() - trimmed.len();
            if trimmed.starts_with("//") {
                self.pos += trimmed.find('\n').unwrap_or(trimmed.len());
            } else {
                return;
            }
        }
    }

    fn at_end(&mut self) -> bool {
        self.skip_trivia();
        self.pos >= self.src.len()
    }

    /// Next token for error messages
    fn describe_next(&mut self) -> String {
        self.skip_trivia();
        match self.rest().chars().next() {
            None => "end of input".to_string(),
            Some(c) if is_ident_start(c) => format!("`{}`", self.peek_ident().unwrap_or_default()),
            Some(c) => format!("`{c}`"),
        }
    }

    fn peek_ident(&mut self) -> Option<&'a str> {
        self.skip_trivia();
        let rest = self.rest();
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, c)) if is_ident_start(c) => {}
            _ => return None,
        }
        let end = chars
            .find(|&(_, c)| !is_ident_continue(c))
            .map_or(rest.len(), |(i, _)| i);
        Some(&rest[..end])
    }

    fn ident(&mut self, what: &str) -> ParseResult<(String, Location)> {
        match self.peek_ident() {
            Some(id) => {
                let location = self.location();
                self.pos += id.len();
                Ok((id.to_string(), location))
            }
            None => {
                let found = self.describe_next();
                self.error(format!("expected {what}, found {found}"))
            }
        }
    }

    fn keyword(&mut self, kw: &str) -> bool {
        if self.peek_ident() == Some(kw) {
            self.pos += kw.len();
            true
        } else {
            false
        }
    }

    fn punct(&mut self, p: &str) -> ParseResult<()> {
        self.skip_trivia();
        if self.rest().starts_with(p) {
            self.pos += p.len();
            Ok(())
        } else {
            let found = self.describe_next();
            self.error(format!("expected `{p}`, found {found}"))
        }
    }

    fn path(&mut self, what: &str) -> ParseResult<SymbolPath> {
        let (first, location) = self.ident(what)?;
        let mut segments = vec![first];
        loop {
            self.skip_trivia();
            if !self.rest().starts_with("::") {
                break;
            }
            self.pos += 2;
            let (seg, _) = self.ident("identifier after `::`")?;
            segments.push(seg);
        }
        Ok(SymbolPath { segments, location })
    }

    /// Raw text of a body expression, up to (not including) the terminating `;`.
    ///
    /// `;` inside JSON strings does not terminate the body.
    fn body_text(&mut self) -> ParseResult<(&'a str, Location)> {
        self.skip_trivia();
        let start = self.pos;
        let location = self.location();
        let rest = self.rest();
        let mut in_string = false;
        let mut escaped = false;
        for (i, c) in rest.char_indices() {
            if in_string {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    in_string = false;
                }
                continue;
            }
            match c {
                '"' => in_string = true,
                ';' => {
                    self.pos = start + i;
                    let text = rest[..i].trim_end();
                    if text.is_empty() {
                        return self.error("expected a value before `;`");
                    }
                    return Ok((text, location));
                }
                _ => {}
            }
        }
        Err(Diagnostic::error("expected `;` after operation body", location))
    }

    fn body(&mut self) -> ParseResult<Body> {
        if self.keyword("fail") {
            let (text, location) = self.body_text()?;
            return match serde_json::from_str::<String>(text) {
                Ok(msg) => Ok(Body::Fail(msg)),
                Err(_) => Err(Diagnostic::error(
                    "expected a string literal after `fail`",
                    location,
                )),
            };
        }
        let (text, location) = self.body_text()?;
        serde_json::from_str::<Value>(text)
            .map(Body::Value)
            .map_err(|e| Diagnostic::error(format!("invalid JSON value: {e}"), location))
    }

    fn op(&mut self) -> ParseResult<OpDecl> {
        let (name, location) = self.ident("operation name")?;
        self.punct("(")?;
        self.punct(")")?;
        self.punct("->")?;
        let returns = self.path("result type")?;
        self.punct("=")?;
        let body = self.body()?;
        self.punct(";")?;
        Ok(OpDecl {
            name,
            location,
            returns,
            body,
        })
    }

    fn group(&mut self) -> ParseResult<GroupDecl> {
        let (name, location) = self.ident("group name")?;
        self.punct(":")?;
        let base = self.path("group base")?;
        self.punct("{")?;
        let mut ops = Vec::new();
        loop {
            if self.at_end() {
                return self.error(format!("unclosed group `{name}`, expected `}}`"));
            }
            if self.rest().starts_with('}') {
                self.pos += 1;
                break;
            }
            if !self.keyword("op") {
                let found = self.describe_next();
                return self.error(format!("expected `op` or `}}`, found {found}"));
            }
            ops.push(self.op()?);
        }
        Ok(GroupDecl {
            name,
            location,
            base,
            ops,
        })
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parse a whole module.
pub(crate) fn parse_module(src: &str) -> ParseResult<Vec<Item>> {
    let mut cursor = Cursor { src, pos: 0 };
    let mut items = Vec::new();
    while !cursor.at_end() {
        if cursor.keyword("use") {
            let path = cursor.path("import path")?;
            cursor.punct(";")?;
            items.push(Item::Use(path));
        } else if cursor.keyword("group") {
            items.push(Item::Group(cursor.group()?));
        } else {
            let found = cursor.describe_next();
            return cursor.error(format!("expected `use` or `group`, found {found}"));
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_group_with_ops() {
        let items = parse_module(
            r#"
            // header comment
            use handler::Base;
            group Widgets : Base {
                // GET /api/widgets
                op list() -> Json = [];
                op broken() -> result::Json = fail "boom; really";
                op odd() -> Json = {"url": "http://x/y;z"};
            }
            "#,
        )
        .unwrap();

        assert_eq!(items.len(), 2);
        let Item::Group(group) = &items[1] else {
            panic!("expected group");
        };
        assert_eq!(group.name, "Widgets");
        assert_eq!(group.location, Location { line: 4, column: 19 });
        assert_eq!(group.ops.len(), 3);
        assert_eq!(group.ops[0].body, Body::Value(json!([])));
        assert_eq!(group.ops[1].returns.joined(), "result::Json");
        assert_eq!(group.ops[1].body, Body::Fail("boom; really".into()));
        assert_eq!(group.ops[2].body, Body::Value(json!({"url": "http://x/y;z"})));
    }

    #[test]
    fn test_scalar_bodies() {
        let items = parse_module("group G : Base { op a() -> Json = 42; op b() -> Json = null; }")
            .unwrap();
        let Item::Group(group) = &items[0] else {
            panic!("expected group");
        };
        assert_eq!(group.ops[0].body, Body::Value(json!(42)));
        assert_eq!(group.ops[1].body, Body::Value(Value::Null));
    }

    #[test]
    fn test_empty_source() {
        assert!(parse_module("").unwrap().is_empty());
        assert!(parse_module("  // nothing here\n").unwrap().is_empty());
    }

    #[test]
    fn test_syntax_error_reports_position() {
        let err = parse_module("use handler::Base;\ngroup G : Base {\n  op a( -> Json = 1;\n}").unwrap_err();
        assert_eq!(err.location, Location { line: 3, column: 9 });
        assert!(err.message.contains("expected `)`"), "{}", err.message);
    }

    #[test]
    fn test_bad_json_body() {
        let err = parse_module("group G : Base { op a() -> Json = {oops}; }").unwrap_err();
        assert!(err.message.starts_with("invalid JSON value"));
    }

    #[test]
    fn test_unclosed_group() {
        let err = parse_module("group G : Base { op a() -> Json = 1;").unwrap_err();
        assert!(err.message.contains("unclosed group `G`"));
    }

    #[test]
    fn test_unknown_item() {
        let err = parse_module("fn main() {}").unwrap_err();
        assert_eq!(err.message, "expected `use` or `group`, found `fn`");
        assert_eq!(err.location, Location { line: 1, column: 1 });
    }
}
