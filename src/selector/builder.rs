//! Fluent construction of path queries.
//!
//! ```
//! use page_probe::selector::XPath;
//!
//! let button = XPath::new("button").with_text("Submit").first();
//! assert_eq!(button.as_str(), "//button[text()='Submit'][1]");
//! ```

use std::fmt;

/// A path query under construction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct XPath(String);

/// Quote a string literal, switching quote style (or falling back to `concat()`) when the
/// value itself contains quotes
pub fn literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{}'", value);
    }
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }
    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{}'", part))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

fn step(tag: Option<&str>) -> &str {
    tag.unwrap_or("*")
}

impl XPath {
    /// `//tag` anywhere in the document. Paths already starting with `/` or `./` are kept.
    pub fn new(tag: &str) -> Self {
        if tag.starts_with('/') || tag.starts_with("./") {
            XPath(tag.to_string())
        } else {
            XPath(format!("//{}", tag))
        }
    }

    /// `//*`
    pub fn any() -> Self {
        XPath::new("*")
    }

    /// `./tag`, relative to the context node
    pub fn relative(tag: &str) -> Self {
        if tag.starts_with('/') || tag.starts_with("./") {
            XPath(tag.to_string())
        } else {
            XPath(format!("./{}", tag))
        }
    }

    /// An empty path, for building predicates passed to [`not`](Self::not), [`or`](Self::or)
    /// and [`and`](Self::and)
    pub fn predicate() -> Self {
        XPath(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    fn push(mut self, suffix: &str) -> Self {
        self.0.push_str(suffix);
        self
    }

    /// The inside of a single `[...]` predicate
    fn predicate_body(&self) -> &str {
        self.0
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .unwrap_or(&self.0)
    }

    pub fn with_attr(self, attr: &str, value: &str) -> Self {
        let suffix = format!("[@{}={}]", attr, literal(value));
        self.push(&suffix)
    }

    pub fn with_attr_starts_with(self, attr: &str, value: &str) -> Self {
        let suffix = format!("[starts-with(@{}, {})]", attr, literal(value));
        self.push(&suffix)
    }

    pub fn with_attr_contains(self, attr: &str, value: &str) -> Self {
        let suffix = format!("[contains(@{}, {})]", attr, literal(value));
        self.push(&suffix)
    }

    pub fn with_text(self, value: &str) -> Self {
        let suffix = format!("[text()={}]", literal(value));
        self.push(&suffix)
    }

    pub fn with_text_starts_with(self, value: &str) -> Self {
        let suffix = format!("[starts-with(text(), {})]", literal(value));
        self.push(&suffix)
    }

    pub fn with_text_contains(self, value: &str) -> Self {
        let suffix = format!("[contains(text(), {})]", literal(value));
        self.push(&suffix)
    }

    pub fn with_id(self, id: &str) -> Self {
        self.with_attr("id", id)
    }

    /// Match one class among the element's whitespace-separated classes
    pub fn with_class(self, class: &str) -> Self {
        let suffix = format!(
            "[contains(concat(' ',normalize-space(@class),' '),{})]",
            literal(&format!(" {} ", class))
        );
        self.push(&suffix)
    }

    pub fn not(self, predicate: &XPath) -> Self {
        let suffix = format!("[not({})]", predicate.predicate_body());
        self.push(&suffix)
    }

    pub fn or(self, predicates: &[XPath]) -> Self {
        self.combine(predicates, " or ")
    }

    pub fn and(self, predicates: &[XPath]) -> Self {
        self.combine(predicates, " and ")
    }

    fn combine(self, predicates: &[XPath], joiner: &str) -> Self {
        let body = predicates
            .iter()
            .map(|p| format!("({})", p.predicate_body()))
            .collect::<Vec<_>>()
            .join(joiner);
        let suffix = format!("[{}]", body);
        self.push(&suffix)
    }

    /// Direct child; `None` for any element
    pub fn child(self, tag: Option<&str>) -> Self {
        let suffix = format!("/{}", step(tag));
        self.push(&suffix)
    }

    pub fn parent(self) -> Self {
        self.push("/..")
    }

    /// Any descendant; `None` for any element
    pub fn descendant(self, tag: Option<&str>) -> Self {
        let suffix = format!("//{}", step(tag));
        self.push(&suffix)
    }

    /// Nearest matching ancestor, including the element itself
    pub fn ancestor(self, tag: Option<&str>) -> Self {
        let suffix = format!("/ancestor-or-self::{}", step(tag));
        self.push(&suffix)
    }

    pub fn descendant_not_self(self, tag: Option<&str>) -> Self {
        let suffix = format!("/descendant::{}", step(tag));
        self.push(&suffix)
    }

    pub fn ancestor_not_self(self, tag: Option<&str>) -> Self {
        let suffix = format!("/ancestor::{}", step(tag));
        self.push(&suffix)
    }

    pub fn following_sibling(self, tag: Option<&str>) -> Self {
        let suffix = format!("/following-sibling::{}", step(tag));
        self.push(&suffix)
    }

    pub fn preceding_sibling(self, tag: Option<&str>) -> Self {
        let suffix = format!("/preceding-sibling::{}", step(tag));
        self.push(&suffix)
    }

    /// Keep elements that have a node matching the relative `child` path
    pub fn with_child_matching(self, child: &XPath) -> Self {
        let suffix = format!("[{}]", child.as_str());
        self.push(&suffix)
    }

    pub fn first(self) -> Self {
        self.push("[1]")
    }

    /// 1-based position among siblings matched by the preceding step
    pub fn nth(self, n: usize) -> Self {
        let suffix = format!("[{}]", n);
        self.push(&suffix)
    }

    pub fn last(self) -> Self {
        self.push("[last()]")
    }
}

impl fmt::Display for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, ElementNode};

    #[test]
    fn test_constructors() {
        assert_eq!(XPath::new("div").as_str(), "//div");
        assert_eq!(XPath::new("/html/body").as_str(), "/html/body");
        assert_eq!(XPath::any().as_str(), "//*");
        assert_eq!(XPath::relative("span").as_str(), "./span");
        assert_eq!(XPath::predicate().as_str(), "");
    }

    #[test]
    fn test_literal_quoting() {
        assert_eq!(literal("plain"), "'plain'");
        assert_eq!(literal("Can't"), "\"Can't\"");
        assert_eq!(literal("a'b\"c"), "concat('a', \"'\", 'b\"c')");
    }

    #[test]
    fn test_refinements() {
        let path = XPath::new("ul")
            .with_id("list")
            .child(Some("li"))
            .not(&XPath::predicate().with_class("hidden"))
            .last();
        assert_eq!(
            path.as_str(),
            "//ul[@id='list']/li[not(contains(concat(' ',normalize-space(@class),' '),' hidden '))][last()]"
        );

        let either = XPath::new("input").or(&[
            XPath::predicate().with_attr("type", "text"),
            XPath::predicate().with_attr("type", "email"),
        ]);
        assert_eq!(either.as_str(), "//input[(@type='text') or (@type='email')]");
    }

    #[test]
    fn test_partial_matches_and_axes() {
        assert_eq!(
            XPath::new("a").with_attr_starts_with("href", "https").as_str(),
            "//a[starts-with(@href, 'https')]"
        );
        assert_eq!(
            XPath::new("a").with_attr_contains("href", "docs").as_str(),
            "//a[contains(@href, 'docs')]"
        );
        assert_eq!(
            XPath::new("p").with_text_starts_with("Hi").with_text_contains("there").as_str(),
            "//p[starts-with(text(), 'Hi')][contains(text(), 'there')]"
        );
        assert_eq!(
            XPath::new("li").following_sibling(Some("li")).descendant_not_self(None).as_str(),
            "//li/following-sibling::li/descendant::*"
        );
        assert_eq!(XPath::new("span").ancestor_not_self(Some("div")).as_str(), "//span/ancestor::div");
        assert_eq!(
            XPath::new("td").ancestor(Some("tr")).parent().nth(2).as_str(),
            "//td/ancestor-or-self::tr/..[2]"
        );
        assert_eq!(XPath::new("input").and(&[XPath::predicate().with_id("a")]).into_string(), "//input[(@id='a')]");
    }

    #[test]
    fn test_built_paths_evaluate() {
        let doc = Document::from_elements([ElementNode::new("div")
            .with_class("card featured")
            .with_child(ElementNode::new("h2").with_text("Can't stop"))
            .with_child(ElementNode::new("button").with_text("Go"))]);

        let button = XPath::new("div")
            .with_class("featured")
            .with_child_matching(&XPath::relative("h2").with_text("Can't stop"))
            .descendant(Some("button"));
        let found = doc.evaluate_xpath(button.as_str()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(doc.text_content(found[0]), "Go");

        let heading = XPath::new("button").preceding_sibling(None).first();
        let found = doc.evaluate_xpath(heading.as_str()).unwrap();
        assert_eq!(doc.tag_name(found[0]), Some("h2"));
    }
}
