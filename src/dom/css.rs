//! CSS selector parsing and matching.
//!
//! Supported: type and universal selectors, `#id`, `.class`, attribute selectors
//! (`[a]`, `=`, `~=`, `|=`, `^=`, `$=`, `*=`, with an optional `i` flag), the pseudo-classes
//! `:checked :disabled :enabled :first-child :last-child :only-child :nth-child()
//! :nth-last-child() :empty :root :not()`, the four combinators and selector groups.

use super::document::Document;
use super::node::NodeId;
use crate::error::{ProbeError, Result};

/// Comma-separated group of complex selectors
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SelectorList {
    complexes: Vec<Complex>,
}

#[derive(Debug, Clone, PartialEq)]
struct Complex {
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Combinator {
    Descendant,
    Child,
    Adjacent,
    Sibling,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Compound {
    tag: Option<String>,
    parts: Vec<Simple>,
}

#[derive(Debug, Clone, PartialEq)]
enum Simple {
    Id(String),
    Class(String),
    Attr {
        name: String,
        test: Option<(AttrOp, String)>,
        ignore_case: bool,
    },
    Pseudo(Pseudo),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AttrOp {
    Equals,
    Includes,
    DashMatch,
    Prefix,
    Suffix,
    Substring,
}

#[derive(Debug, Clone, PartialEq)]
enum Pseudo {
    Checked,
    Disabled,
    Enabled,
    FirstChild,
    LastChild,
    OnlyChild,
    NthChild(i64, i64),
    NthLastChild(i64, i64),
    Empty,
    Root,
    Not(SelectorList),
}

impl SelectorList {
    pub fn parse(query: &str) -> Result<Self> {
        let mut parser = Parser {
            chars: query.chars().collect(),
            pos: 0,
            depth: 0,
        };
        let list = parser
            .parse_list()
            .and_then(|list| {
                parser.skip_ws();
                if parser.pos < parser.chars.len() {
                    Err(format!("unexpected '{}'", parser.chars[parser.pos]))
                } else {
                    Ok(list)
                }
            })
            .map_err(|reason| ProbeError::InvalidSelector {
                query: query.to_string(),
                reason,
            })?;
        log::trace!("parsed selector {:?} into {} group(s)", query, list.complexes.len());
        Ok(list)
    }

    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        doc.is_element(node)
            && self
                .complexes
                .iter()
                .any(|c| c.matches_at(doc, node, c.compounds.len() - 1))
    }
}

impl Complex {
    fn matches_at(&self, doc: &Document, node: NodeId, index: usize) -> bool {
        if !self.compounds[index].matches(doc, node) {
            return false;
        }
        if index == 0 {
            return true;
        }
        let next = index - 1;
        match self.combinators[next] {
            Combinator::Descendant => {
                let mut cursor = doc.parent_element(node);
                while let Some(ancestor) = cursor {
                    if self.matches_at(doc, ancestor, next) {
                        return true;
                    }
                    cursor = doc.parent_element(ancestor);
                }
                false
            }
            Combinator::Child => doc
                .parent_element(node)
                .is_some_and(|p| self.matches_at(doc, p, next)),
            Combinator::Adjacent => doc
                .previous_element_sibling(node)
                .is_some_and(|s| self.matches_at(doc, s, next)),
            Combinator::Sibling => {
                let mut cursor = doc.previous_element_sibling(node);
                while let Some(sibling) = cursor {
                    if self.matches_at(doc, sibling, next) {
                        return true;
                    }
                    cursor = doc.previous_element_sibling(sibling);
                }
                false
            }
        }
    }
}

impl Compound {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(tag) = doc.tag_name(node) else {
            return false;
        };
        if self.tag.as_deref().is_some_and(|t| t != tag) {
            return false;
        }
        self.parts.iter().all(|part| part.matches(doc, node))
    }
}

impl Simple {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        match self {
            Simple::Id(id) => doc.attr(node, "id") == Some(id.as_str()),
            Simple::Class(class) => doc.has_class(node, class),
            Simple::Attr {
                name,
                test,
                ignore_case,
            } => {
                let Some(actual) = doc.attr(node, name) else {
                    return false;
                };
                let Some((op, expected)) = test else {
                    return true;
                };
                let (actual, expected) = if *ignore_case {
                    (actual.to_lowercase(), expected.to_lowercase())
                } else {
                    (actual.to_string(), expected.clone())
                };
                match op {
                    AttrOp::Equals => actual == expected,
                    AttrOp::Includes => actual.split_whitespace().any(|w| w == expected),
                    AttrOp::DashMatch => actual == expected || actual.starts_with(&format!("{}-", expected)),
                    AttrOp::Prefix => !expected.is_empty() && actual.starts_with(&expected),
                    AttrOp::Suffix => !expected.is_empty() && actual.ends_with(&expected),
                    AttrOp::Substring => !expected.is_empty() && actual.contains(&expected),
                }
            }
            Simple::Pseudo(pseudo) => pseudo.matches(doc, node),
        }
    }
}

impl Pseudo {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        match self {
            Pseudo::Checked => match doc.tag_name(node) {
                Some("input") => {
                    matches!(doc.input_type(node).as_deref(), Some("checkbox" | "radio"))
                        && doc.checked(node) == Some(true)
                }
                Some("option") => doc.selected(node) == Some(true),
                _ => false,
            },
            Pseudo::Disabled => doc.disabled(node) == Some(true),
            Pseudo::Enabled => doc.disabled(node) == Some(false),
            Pseudo::FirstChild => doc.parent(node).is_some() && doc.previous_element_sibling(node).is_none(),
            Pseudo::LastChild => doc.parent(node).is_some() && doc.next_element_sibling(node).is_none(),
            Pseudo::OnlyChild => {
                doc.parent(node).is_some()
                    && doc.previous_element_sibling(node).is_none()
                    && doc.next_element_sibling(node).is_none()
            }
            Pseudo::NthChild(a, b) | Pseudo::NthLastChild(a, b) => {
                let Some(parent) = doc.parent(node) else {
                    return false;
                };
                let siblings = doc.element_children(parent);
                let Some(index) = siblings.iter().position(|s| *s == node) else {
                    return false;
                };
                let position = if matches!(self, Pseudo::NthChild(..)) {
                    index as i64 + 1
                } else {
                    (siblings.len() - index) as i64
                };
                nth_matches(*a, *b, position)
            }
            Pseudo::Empty => doc
                .children(node)
                .iter()
                .all(|c| doc.text(*c).is_some_and(str::is_empty)),
            Pseudo::Root => node == doc.document_element(),
            Pseudo::Not(list) => !list.matches(doc, node),
        }
    }
}

fn nth_matches(a: i64, b: i64, position: i64) -> bool {
    if a == 0 {
        return position == b;
    }
    let diff = position - b;
    diff % a == 0 && diff / a >= 0
}

fn parse_nth(arg: &str) -> std::result::Result<(i64, i64), String> {
    let compact: String = arg.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_ascii_lowercase();
    match compact.as_str() {
        "odd" => return Ok((2, 1)),
        "even" => return Ok((2, 0)),
        "" => return Err("empty :nth-child() argument".to_string()),
        _ => {}
    }
    let bad = || format!("invalid :nth-child() argument '{}'", arg.trim());
    match compact.split_once('n') {
        Some((a, b)) => {
            let a = match a {
                "" | "+" => 1,
                "-" => -1,
                other => other.parse().map_err(|_| bad())?,
            };
            let b = if b.is_empty() {
                0
            } else {
                b.trim_start_matches('+').parse().map_err(|_| bad())?
            };
            Ok((a, b))
        }
        None => Ok((0, compact.trim_start_matches('+').parse().map_err(|_| bad())?)),
    }
}

/// Deepest `:not()` nesting and longest compound chain a selector may have
const MAX_NESTING: usize = 256;

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

type ParseResult<T> = std::result::Result<T, String>;

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_list(&mut self) -> ParseResult<SelectorList> {
        let mut complexes = vec![self.parse_complex()?];
        loop {
            self.skip_ws();
            if !self.eat(',') {
                break;
            }
            complexes.push(self.parse_complex()?);
        }
        Ok(SelectorList { complexes })
    }

    fn parse_complex(&mut self) -> ParseResult<Complex> {
        self.skip_ws();
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                Some('>') => Combinator::Child,
                Some('+') => Combinator::Adjacent,
                Some('~') => Combinator::Sibling,
                None | Some(',') | Some(')') => break,
                Some(_) if had_ws => {
                    combinators.push(Combinator::Descendant);
                    compounds.push(self.parse_compound()?);
                    continue;
                }
                Some(c) => return Err(format!("unexpected '{}'", c)),
            };
            self.pos += 1;
            self.skip_ws();
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }
        if compounds.len() > MAX_NESTING {
            return Err("too many compound selectors".to_string());
        }
        Ok(Complex { compounds, combinators })
    }

    fn parse_compound(&mut self) -> ParseResult<Compound> {
        let mut compound = Compound::default();
        let mut any = false;
        if self.eat('*') {
            any = true;
        } else if self.peek().is_some_and(is_ident_char) {
            compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
            any = true;
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.parts.push(Simple::Id(self.parse_ident()?));
                }
                Some('.') => {
                    self.pos += 1;
                    compound.parts.push(Simple::Class(self.parse_ident()?));
                }
                Some('[') => {
                    self.pos += 1;
                    compound.parts.push(self.parse_attr()?);
                }
                Some(':') => {
                    self.pos += 1;
                    compound.parts.push(Simple::Pseudo(self.parse_pseudo()?));
                }
                _ => break,
            }
            any = true;
        }
        if !any {
            return Err(match self.peek() {
                Some(c) => format!("expected a selector at '{}'", c),
                None => "expected a selector".to_string(),
            });
        }
        Ok(compound)
    }

    fn parse_ident(&mut self) -> ParseResult<String> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 1;
                match self.peek() {
                    Some(escaped) => out.push(escaped),
                    None => return Err("dangling escape".to_string()),
                }
                self.pos += 1;
            } else if is_ident_char(c) {
                out.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        if out.is_empty() {
            return Err("expected an identifier".to_string());
        }
        Ok(out)
    }

    fn parse_attr(&mut self) -> ParseResult<Simple> {
        self.skip_ws();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_ws();
        if self.eat(']') {
            return Ok(Simple::Attr {
                name,
                test: None,
                ignore_case: false,
            });
        }
        let op = match self.peek() {
            Some('=') => AttrOp::Equals,
            Some('~') => AttrOp::Includes,
            Some('|') => AttrOp::DashMatch,
            Some('^') => AttrOp::Prefix,
            Some('$') => AttrOp::Suffix,
            Some('*') => AttrOp::Substring,
            _ => return Err("expected an attribute operator".to_string()),
        };
        self.pos += 1;
        if op != AttrOp::Equals && !self.eat('=') {
            return Err("expected '=' in attribute selector".to_string());
        }
        self.skip_ws();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let mut value = String::new();
                loop {
                    match self.peek() {
                        Some(c) if c == quote => {
                            self.pos += 1;
                            break;
                        }
                        Some('\\') => {
                            self.pos += 1;
                            if let Some(c) = self.peek() {
                                value.push(c);
                                self.pos += 1;
                            }
                        }
                        Some(c) => {
                            value.push(c);
                            self.pos += 1;
                        }
                        None => return Err("unterminated string".to_string()),
                    }
                }
                value
            }
            _ => self.parse_ident()?,
        };
        self.skip_ws();
        let mut ignore_case = false;
        if matches!(self.peek(), Some('i' | 'I' | 's' | 'S')) {
            ignore_case = matches!(self.peek(), Some('i' | 'I'));
            self.pos += 1;
            self.skip_ws();
        }
        if !self.eat(']') {
            return Err("expected ']'".to_string());
        }
        Ok(Simple::Attr {
            name,
            test: Some((op, value)),
            ignore_case,
        })
    }

    fn parse_pseudo(&mut self) -> ParseResult<Pseudo> {
        let name = self.parse_ident()?.to_ascii_lowercase();
        let pseudo = match name.as_str() {
            "checked" => Pseudo::Checked,
            "disabled" => Pseudo::Disabled,
            "enabled" => Pseudo::Enabled,
            "first-child" => Pseudo::FirstChild,
            "last-child" => Pseudo::LastChild,
            "only-child" => Pseudo::OnlyChild,
            "empty" => Pseudo::Empty,
            "root" => Pseudo::Root,
            "not" => {
                self.expect_open(&name)?;
                if self.depth >= MAX_NESTING {
                    return Err(":not() nests too deeply".to_string());
                }
                self.depth += 1;
                let inner = self.parse_list();
                self.depth -= 1;
                let inner = inner?;
                self.skip_ws();
                if !self.eat(')') {
                    return Err("expected ')'".to_string());
                }
                Pseudo::Not(inner)
            }
            "nth-child" | "nth-last-child" => {
                self.expect_open(&name)?;
                let start = self.pos;
                while self.peek().is_some_and(|c| c != ')') {
                    self.pos += 1;
                }
                let arg: String = self.chars[start..self.pos].iter().collect();
                if !self.eat(')') {
                    return Err("expected ')'".to_string());
                }
                let (a, b) = parse_nth(&arg)?;
                if name == "nth-child" {
                    Pseudo::NthChild(a, b)
                } else {
                    Pseudo::NthLastChild(a, b)
                }
            }
            other => return Err(format!("unsupported pseudo-class ':{}'", other)),
        };
        Ok(pseudo)
    }

    fn expect_open(&mut self, name: &str) -> ParseResult<()> {
        if self.eat('(') {
            Ok(())
        } else {
            Err(format!("expected '(' after ':{}'", name))
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementNode;

    fn fixture() -> Document {
        Document::from_elements([
            ElementNode::new("div")
                .with_id("main")
                .with_class("container wide")
                .with_child(ElementNode::new("p").with_class("lead").with_text("one"))
                .with_child(ElementNode::new("p").with_text("two"))
                .with_child(ElementNode::new("span").with_attr("data-kind", "fruit-apple"))
                .with_child(ElementNode::new("p").with_text("three")),
            ElementNode::input("checkbox").with_id("c").with_attr("checked", ""),
            ElementNode::input("text").with_id("t").with_attr("disabled", ""),
            ElementNode::new("div").with_id("empty"),
        ])
    }

    fn ids(doc: &Document, selector: &str) -> Vec<String> {
        doc.query_selector_all(selector)
            .unwrap()
            .into_iter()
            .map(|n| doc.attr(n, "id").map(str::to_string).unwrap_or_else(|| doc.text_content(n)))
            .collect()
    }

    #[test]
    fn test_simple_selectors() {
        let doc = fixture();
        assert_eq!(ids(&doc, "#main"), vec!["main"]);
        assert_eq!(ids(&doc, "div.container.wide"), vec!["main"]);
        assert_eq!(ids(&doc, "p.lead"), vec!["one"]);
        assert_eq!(ids(&doc, "DIV#empty"), vec!["empty"]);
    }

    #[test]
    fn test_combinators() {
        let doc = fixture();
        assert_eq!(ids(&doc, "#main > p"), vec!["one", "two", "three"]);
        assert_eq!(ids(&doc, "body p.lead + p"), vec!["two"]);
        assert_eq!(ids(&doc, "span ~ p"), vec!["three"]);
        assert_eq!(ids(&doc, "html div > p:last-child"), vec!["three"]);
    }

    #[test]
    fn test_attribute_operators() {
        let doc = fixture();
        let span = doc.query_selector("span").unwrap().unwrap();
        for selector in [
            "[data-kind]",
            "[data-kind='fruit-apple']",
            "[data-kind|=fruit]",
            "[data-kind^=\"fruit\"]",
            "[data-kind$=apple]",
            "[data-kind*=t-a]",
            "[data-kind=FRUIT-APPLE i]",
        ] {
            assert_eq!(doc.query_selector(selector).unwrap(), Some(span), "{}", selector);
        }
        assert_eq!(doc.query_selector("[data-kind=FRUIT-APPLE]").unwrap(), None);
    }

    #[test]
    fn test_pseudo_classes() {
        let doc = fixture();
        assert_eq!(ids(&doc, "input:checked"), vec!["c"]);
        assert_eq!(ids(&doc, "input:disabled"), vec!["t"]);
        assert_eq!(ids(&doc, "input:enabled"), vec!["c"]);
        assert_eq!(ids(&doc, "div:empty"), vec!["empty"]);
        assert_eq!(ids(&doc, "#main > :nth-child(odd)"), vec!["one", ""]);
        assert_eq!(ids(&doc, "#main > p:not(.lead)"), vec!["two", "three"]);
        assert_eq!(ids(&doc, "#main > :nth-last-child(1)"), vec!["three"]);
    }

    #[test]
    fn test_groups_keep_document_order() {
        let doc = fixture();
        assert_eq!(ids(&doc, "#empty, #main"), vec!["main", "empty"]);
    }

    #[test]
    fn test_nth_parse() {
        assert_eq!(parse_nth("2n+1").unwrap(), (2, 1));
        assert_eq!(parse_nth(" -n + 3 ").unwrap(), (-1, 3));
        assert_eq!(parse_nth("4").unwrap(), (0, 4));
        assert!(parse_nth("x").is_err());
        assert!(nth_matches(-1, 3, 2));
        assert!(!nth_matches(-1, 3, 4));
    }

    #[test]
    fn test_invalid_selectors() {
        for bad in ["", "#", "div >", "[x", "p:hover", "a b)"] {
            let err = SelectorList::parse(bad).unwrap_err();
            assert_eq!(err.to_string(), format!("'{}' is not a valid selector", bad));
        }
    }

    #[test]
    fn test_nesting_limits() {
        let doc = fixture();
        assert_eq!(ids(&doc, "p:not(:not(:not(.lead)))"), ids(&doc, "p:not(.lead)"));

        let deep = format!("{}div{}", ":not(".repeat(100_000), ")".repeat(100_000));
        let err = SelectorList::parse(&deep).unwrap_err();
        assert!(matches!(err, ProbeError::InvalidSelector { .. }));

        let long = vec!["div"; 100_000].join(" ");
        assert!(SelectorList::parse(&long).is_err());
    }
}
