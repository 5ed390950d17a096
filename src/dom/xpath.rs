//! XPath 1.0 evaluation over a [`Document`].
//!
//! Covers location paths on every axis, predicates, unions, comparisons, `and`/`or`,
//! addition and subtraction, and the core string, boolean and number functions. Name
//! tests compare element names case-insensitively, as browsers do for HTML documents.

use super::document::Document;
use super::node::NodeId;
use crate::error::{ProbeError, Result};
use std::collections::HashMap;

type EvalResult<T> = std::result::Result<T, String>;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Slash,
    DoubleSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Comma,
    Dot,
    DotDot,
    Pipe,
    Plus,
    Minus,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Star,
    DoubleColon,
    Literal(String),
    Number(f64),
    Name(String),
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || c == '.'
}

fn tokenize(input: &str) -> EvalResult<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        let (token, width) = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '/' if next == Some('/') => (Token::DoubleSlash, 2),
            '/' => (Token::Slash, 1),
            '[' => (Token::LBracket, 1),
            ']' => (Token::RBracket, 1),
            '(' => (Token::LParen, 1),
            ')' => (Token::RParen, 1),
            '@' => (Token::At, 1),
            ',' => (Token::Comma, 1),
            '|' => (Token::Pipe, 1),
            '+' => (Token::Plus, 1),
            '-' => (Token::Minus, 1),
            '=' => (Token::Eq, 1),
            '*' => (Token::Star, 1),
            '!' if next == Some('=') => (Token::Ne, 2),
            '<' if next == Some('=') => (Token::Le, 2),
            '<' => (Token::Lt, 1),
            '>' if next == Some('=') => (Token::Ge, 2),
            '>' => (Token::Gt, 1),
            ':' if next == Some(':') => (Token::DoubleColon, 2),
            '.' if next == Some('.') => (Token::DotDot, 2),
            '.' if !next.is_some_and(|n| n.is_ascii_digit()) => (Token::Dot, 1),
            '"' | '\'' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|ch| *ch == c)
                    .ok_or_else(|| "unterminated string literal".to_string())?;
                let literal: String = chars[i + 1..i + 1 + end].iter().collect();
                (Token::Literal(literal), end + 2)
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut end = i;
                let mut seen_dot = false;
                while let Some(ch) = chars.get(end) {
                    if ch.is_ascii_digit() || (*ch == '.' && !seen_dot) {
                        seen_dot |= *ch == '.';
                        end += 1;
                    } else {
                        break;
                    }
                }
                let text: String = chars[i..end].iter().collect();
                let number = text.parse().map_err(|_| format!("invalid number '{}'", text))?;
                (Token::Number(number), end - i)
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut end = i;
                while chars.get(end).is_some_and(|ch| is_name_char(*ch)) {
                    end += 1;
                }
                (Token::Name(chars[i..end].iter().collect()), end - i)
            }
            other => return Err(format!("unexpected character '{}'", other)),
        };
        tokens.push(token);
        i += width;
    }
    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
    Attribute,
    SelfAxis,
}

impl Axis {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "child" => Axis::Child,
            "descendant" => Axis::Descendant,
            "descendant-or-self" => Axis::DescendantOrSelf,
            "parent" => Axis::Parent,
            "ancestor" => Axis::Ancestor,
            "ancestor-or-self" => Axis::AncestorOrSelf,
            "following-sibling" => Axis::FollowingSibling,
            "preceding-sibling" => Axis::PrecedingSibling,
            "following" => Axis::Following,
            "preceding" => Axis::Preceding,
            "attribute" => Axis::Attribute,
            "self" => Axis::SelfAxis,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NodeTest {
    Name(String),
    Any,
    Text,
    Node,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
}

/// Parsed path query
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    Union(Box<Expr>, Box<Expr>),
    Literal(String),
    Number(f64),
    Call(String, Vec<Expr>),
    Path { absolute: bool, steps: Vec<Step> },
    Filter {
        primary: Box<Expr>,
        predicates: Vec<Expr>,
        steps: Vec<Step>,
    },
}

/// Deepest parenthesis/predicate/argument nesting, and most operators, one expression may have
const MAX_NESTING: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    operators: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> EvalResult<()> {
        if self.eat(&token) {
            Ok(())
        } else {
            Err(format!("expected {:?}, found {}", token, self.describe_next()))
        }
    }

    fn describe_next(&self) -> String {
        match self.peek() {
            Some(token) => format!("{:?}", token),
            None => "end of expression".to_string(),
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Name(n)) if n == keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Count an operator node; chains of them nest as deeply as brackets do
    fn operator(&mut self, expr: Expr) -> EvalResult<Expr> {
        self.operators += 1;
        if self.operators > MAX_NESTING {
            return Err("expression has too many operators".to_string());
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> EvalResult<Expr> {
        if self.depth >= MAX_NESTING {
            return Err("expression nests too deeply".to_string());
        }
        self.depth += 1;
        let expr = self.parse_or_chain();
        self.depth -= 1;
        expr
    }

    fn parse_or_chain(&mut self) -> EvalResult<Expr> {
        let mut left = self.parse_and()?;
        while self.eat_keyword("or") {
            let right = self.parse_and()?;
            left = self.operator(Expr::Binary(BinOp::Or, Box::new(left), Box::new(right)))?;
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> EvalResult<Expr> {
        let mut left = self.parse_equality()?;
        while self.eat_keyword("and") {
            let right = self.parse_equality()?;
            left = self.operator(Expr::Binary(BinOp::And, Box::new(left), Box::new(right)))?;
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> EvalResult<Expr> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => BinOp::Eq,
                Some(Token::Ne) => BinOp::Ne,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_relational()?;
            left = self.operator(Expr::Binary(op, Box::new(left), Box::new(right)))?;
        }
    }

    fn parse_relational(&mut self) -> EvalResult<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinOp::Lt,
                Some(Token::Le) => BinOp::Le,
                Some(Token::Gt) => BinOp::Gt,
                Some(Token::Ge) => BinOp::Ge,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_additive()?;
            left = self.operator(Expr::Binary(op, Box::new(left), Box::new(right)))?;
        }
    }

    fn parse_additive(&mut self) -> EvalResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = self.operator(Expr::Binary(op, Box::new(left), Box::new(right)))?;
        }
    }

    fn parse_unary(&mut self) -> EvalResult<Expr> {
        let mut negations = 0;
        while self.eat(&Token::Minus) {
            negations += 1;
        }
        let mut expr = self.parse_union()?;
        for _ in 0..negations {
            expr = self.operator(Expr::Neg(Box::new(expr)))?;
        }
        Ok(expr)
    }

    fn parse_union(&mut self) -> EvalResult<Expr> {
        let mut left = self.parse_path_expr()?;
        while self.eat(&Token::Pipe) {
            let right = self.parse_path_expr()?;
            left = self.operator(Expr::Union(Box::new(left), Box::new(right)))?;
        }
        Ok(left)
    }

    fn starts_filter(&self) -> bool {
        match self.peek() {
            Some(Token::Literal(_) | Token::Number(_) | Token::LParen) => true,
            Some(Token::Name(name)) => {
                self.peek_at(1) == Some(&Token::LParen) && !matches!(name.as_str(), "text" | "node" | "comment")
            }
            _ => false,
        }
    }

    fn parse_path_expr(&mut self) -> EvalResult<Expr> {
        if !self.starts_filter() {
            return self.parse_location_path();
        }
        let primary = self.parse_primary()?;
        let predicates = self.parse_predicates()?;
        let steps = match self.peek() {
            Some(Token::Slash | Token::DoubleSlash) => self.parse_relative_steps(Vec::new(), true)?,
            _ => Vec::new(),
        };
        if predicates.is_empty() && steps.is_empty() {
            return Ok(primary);
        }
        Ok(Expr::Filter {
            primary: Box::new(primary),
            predicates,
            steps,
        })
    }

    fn parse_primary(&mut self) -> EvalResult<Expr> {
        match self.peek().cloned() {
            Some(Token::Literal(s)) => {
                self.pos += 1;
                Ok(Expr::Literal(s))
            }
            Some(Token::Number(n)) => {
                self.pos += 1;
                Ok(Expr::Number(n))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.parse_or()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Name(name)) => {
                self.pos += 2;
                let mut args = Vec::new();
                if !self.eat(&Token::RParen) {
                    loop {
                        args.push(self.parse_or()?);
                        if self.eat(&Token::RParen) {
                            break;
                        }
                        self.expect(Token::Comma)?;
                    }
                }
                Ok(Expr::Call(name, args))
            }
            _ => Err(format!("unexpected {}", self.describe_next())),
        }
    }

    fn parse_predicates(&mut self) -> EvalResult<Vec<Expr>> {
        let mut predicates = Vec::new();
        while self.eat(&Token::LBracket) {
            predicates.push(self.parse_or()?);
            self.expect(Token::RBracket)?;
        }
        Ok(predicates)
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Dot | Token::DotDot | Token::At | Token::Star | Token::Name(_))
        )
    }

    fn parse_location_path(&mut self) -> EvalResult<Expr> {
        match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                let steps = if self.starts_step() {
                    let first = self.parse_step()?;
                    self.parse_relative_steps(vec![first], false)?
                } else {
                    Vec::new()
                };
                Ok(Expr::Path { absolute: true, steps })
            }
            Some(Token::DoubleSlash) => {
                let steps = self.parse_relative_steps(Vec::new(), true)?;
                Ok(Expr::Path { absolute: true, steps })
            }
            _ if self.starts_step() => {
                let first = self.parse_step()?;
                let steps = self.parse_relative_steps(vec![first], false)?;
                Ok(Expr::Path { absolute: false, steps })
            }
            _ => Err(format!("expected a location step, found {}", self.describe_next())),
        }
    }

    /// Continue a path with `/step` and `//step` segments. With `leading`, a separator is
    /// required before the first step.
    fn parse_relative_steps(&mut self, mut steps: Vec<Step>, leading: bool) -> EvalResult<Vec<Step>> {
        let mut need_separator = leading;
        loop {
            match self.peek() {
                Some(Token::Slash) => {
                    self.pos += 1;
                }
                Some(Token::DoubleSlash) => {
                    self.pos += 1;
                    steps.push(Step {
                        axis: Axis::DescendantOrSelf,
                        test: NodeTest::Node,
                        predicates: Vec::new(),
                    });
                }
                _ if need_separator => return Err(format!("expected '/', found {}", self.describe_next())),
                _ => return Ok(steps),
            }
            need_separator = false;
            steps.push(self.parse_step()?);
        }
    }

    fn parse_step(&mut self) -> EvalResult<Step> {
        if self.eat(&Token::Dot) {
            return Ok(Step {
                axis: Axis::SelfAxis,
                test: NodeTest::Node,
                predicates: self.parse_predicates()?,
            });
        }
        if self.eat(&Token::DotDot) {
            return Ok(Step {
                axis: Axis::Parent,
                test: NodeTest::Node,
                predicates: self.parse_predicates()?,
            });
        }
        let axis = if self.eat(&Token::At) {
            Axis::Attribute
        } else if let (Some(Token::Name(name)), Some(Token::DoubleColon)) = (self.peek(), self.peek_at(1)) {
            let axis = Axis::from_name(name).ok_or_else(|| format!("unknown axis '{}'", name))?;
            self.pos += 2;
            axis
        } else {
            Axis::Child
        };
        let test = match self.peek().cloned() {
            Some(Token::Star) => {
                self.pos += 1;
                NodeTest::Any
            }
            Some(Token::Name(name)) if self.peek_at(1) == Some(&Token::LParen) => {
                let test = match name.as_str() {
                    "text" => NodeTest::Text,
                    "node" => NodeTest::Node,
                    other => return Err(format!("unsupported node type test '{}()'", other)),
                };
                self.pos += 2;
                self.expect(Token::RParen)?;
                test
            }
            Some(Token::Name(name)) => {
                self.pos += 1;
                NodeTest::Name(name.to_ascii_lowercase())
            }
            _ => return Err(format!("expected a node test, found {}", self.describe_next())),
        };
        Ok(Step {
            axis,
            test,
            predicates: self.parse_predicates()?,
        })
    }
}

impl Expr {
    pub fn parse(source: &str) -> Result<Self> {
        let invalid = |reason: String| ProbeError::InvalidXPath {
            expr: source.to_string(),
            reason,
        };
        let tokens = tokenize(source).map_err(invalid)?;
        if tokens.is_empty() {
            return Err(invalid("empty expression".to_string()));
        }
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
            operators: 0,
        };
        let expr = parser.parse_or().map_err(invalid)?;
        if parser.pos < parser.tokens.len() {
            return Err(invalid(format!("unexpected {}", parser.describe_next())));
        }
        Ok(expr)
    }
}

/// A node in an XPath result: document nodes plus attribute nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum XNode {
    Node(NodeId),
    Attr(NodeId, usize),
}

#[derive(Debug, Clone)]
enum XValue {
    Nodes(Vec<XNode>),
    Str(String),
    Num(f64),
    Bool(bool),
}

#[derive(Debug, Clone, Copy)]
struct Context {
    node: XNode,
    position: usize,
    size: usize,
}

struct Evaluator<'a> {
    doc: &'a Document,
    order: HashMap<NodeId, usize>,
}

/// Evaluate `expr` and return the selected document nodes in document order.
/// Attribute nodes are dropped; a non-node-set result is an error.
pub(crate) fn select_nodes(doc: &Document, expr: &Expr, source: &str) -> Result<Vec<NodeId>> {
    let evaluator = Evaluator {
        doc,
        order: doc.document_order(),
    };
    let context = Context {
        node: XNode::Node(doc.root()),
        position: 1,
        size: 1,
    };
    let invalid = |reason: String| ProbeError::InvalidXPath {
        expr: source.to_string(),
        reason,
    };
    match evaluator.eval(expr, context).map_err(invalid)? {
        XValue::Nodes(nodes) => Ok(nodes
            .into_iter()
            .filter_map(|n| match n {
                XNode::Node(id) => Some(id),
                XNode::Attr(..) => None,
            })
            .collect()),
        _ => Err(invalid("expression does not evaluate to a node set".to_string())),
    }
}

impl Evaluator<'_> {
    fn sort_key(&self, node: XNode) -> (usize, usize) {
        let (owner, rank) = match node {
            XNode::Node(id) => (id, 0),
            XNode::Attr(id, index) => (id, index + 1),
        };
        (self.order.get(&owner).copied().unwrap_or(usize::MAX), rank)
    }

    fn sorted(&self, mut nodes: Vec<XNode>) -> Vec<XNode> {
        nodes.sort_by_key(|n| self.sort_key(*n));
        nodes.dedup();
        nodes
    }

    fn eval(&self, expr: &Expr, ctx: Context) -> EvalResult<XValue> {
        match expr {
            Expr::Literal(s) => Ok(XValue::Str(s.clone())),
            Expr::Number(n) => Ok(XValue::Num(*n)),
            Expr::Neg(inner) => Ok(XValue::Num(-self.number(&self.eval(inner, ctx)?))),
            Expr::Binary(op, left, right) => self.eval_binary(*op, left, right, ctx),
            Expr::Union(left, right) => {
                let (XValue::Nodes(mut a), XValue::Nodes(b)) = (self.eval(left, ctx)?, self.eval(right, ctx)?) else {
                    return Err("union operands must be node sets".to_string());
                };
                a.extend(b);
                Ok(XValue::Nodes(self.sorted(a)))
            }
            Expr::Call(name, args) => self.call(name, args, ctx),
            Expr::Path { absolute, steps } => {
                let start = if *absolute {
                    XNode::Node(self.doc.root())
                } else {
                    ctx.node
                };
                Ok(XValue::Nodes(self.apply_steps(vec![start], steps)?))
            }
            Expr::Filter {
                primary,
                predicates,
                steps,
            } => {
                let XValue::Nodes(nodes) = self.eval(primary, ctx)? else {
                    return Err("predicates and paths require a node set".to_string());
                };
                let mut nodes = self.sorted(nodes);
                for predicate in predicates {
                    nodes = self.filter(nodes, predicate)?;
                }
                Ok(XValue::Nodes(self.apply_steps(nodes, steps)?))
            }
        }
    }

    fn apply_steps(&self, mut nodes: Vec<XNode>, steps: &[Step]) -> EvalResult<Vec<XNode>> {
        for step in steps {
            let mut next = Vec::new();
            for node in &nodes {
                let candidates: Vec<XNode> = self
                    .axis(*node, step.axis)
                    .into_iter()
                    .filter(|n| self.test(*n, step.axis, &step.test))
                    .collect();
                let mut selected = candidates;
                for predicate in &step.predicates {
                    selected = self.filter(selected, predicate)?;
                }
                next.extend(selected);
            }
            nodes = self.sorted(next);
        }
        Ok(nodes)
    }

    fn filter(&self, nodes: Vec<XNode>, predicate: &Expr) -> EvalResult<Vec<XNode>> {
        let size = nodes.len();
        let mut kept = Vec::new();
        for (index, node) in nodes.into_iter().enumerate() {
            let ctx = Context {
                node,
                position: index + 1,
                size,
            };
            let keep = match self.eval(predicate, ctx)? {
                XValue::Num(n) => n == ctx.position as f64,
                other => self.boolean(&other),
            };
            if keep {
                kept.push(node);
            }
        }
        Ok(kept)
    }

    /// Nodes along `axis` from `node`, in axis order (reverse axes nearest first)
    fn axis(&self, node: XNode, axis: Axis) -> Vec<XNode> {
        let doc = self.doc;
        let id = match node {
            XNode::Node(id) => id,
            XNode::Attr(owner, _) => {
                return match axis {
                    Axis::Parent => vec![XNode::Node(owner)],
                    Axis::SelfAxis => vec![node],
                    Axis::Ancestor => std::iter::once(owner)
                        .chain(doc.ancestors(owner))
                        .map(XNode::Node)
                        .collect(),
                    Axis::AncestorOrSelf => std::iter::once(node)
                        .chain(std::iter::once(owner).chain(doc.ancestors(owner)).map(XNode::Node))
                        .collect(),
                    _ => Vec::new(),
                };
            }
        };
        let nodes: Vec<NodeId> = match axis {
            Axis::Child => doc.children(id).to_vec(),
            Axis::Descendant => doc.descendants(id),
            Axis::DescendantOrSelf => std::iter::once(id).chain(doc.descendants(id)).collect(),
            Axis::Parent => doc.parent(id).into_iter().collect(),
            Axis::Ancestor => doc.ancestors(id),
            Axis::AncestorOrSelf => std::iter::once(id).chain(doc.ancestors(id)).collect(),
            Axis::FollowingSibling | Axis::PrecedingSibling => {
                let Some(parent) = doc.parent(id) else {
                    return Vec::new();
                };
                let siblings = doc.children(parent);
                let Some(index) = siblings.iter().position(|s| *s == id) else {
                    return Vec::new();
                };
                if axis == Axis::FollowingSibling {
                    siblings[index + 1..].to_vec()
                } else {
                    siblings[..index].iter().rev().copied().collect()
                }
            }
            Axis::Following | Axis::Preceding => {
                let Some(own) = self.order.get(&id).copied() else {
                    return Vec::new();
                };
                let ancestors = doc.ancestors(id);
                let mut nodes: Vec<(usize, NodeId)> = self
                    .order
                    .iter()
                    .filter(|(n, position)| {
                        if axis == Axis::Following {
                            **position > own && !doc.is_ancestor(id, **n)
                        } else {
                            **position < own && !ancestors.contains(*n)
                        }
                    })
                    .map(|(n, position)| (*position, *n))
                    .collect();
                nodes.sort();
                if axis == Axis::Preceding {
                    nodes.reverse();
                }
                nodes.into_iter().map(|(_, n)| n).collect()
            }
            Axis::Attribute => {
                return (0..doc.attrs(id).len()).map(|i| XNode::Attr(id, i)).collect();
            }
            Axis::SelfAxis => vec![id],
        };
        nodes.into_iter().map(XNode::Node).collect()
    }

    fn test(&self, node: XNode, axis: Axis, test: &NodeTest) -> bool {
        match (node, test) {
            (_, NodeTest::Node) => true,
            (XNode::Attr(owner, index), NodeTest::Name(name)) => {
                axis == Axis::Attribute
                    && self
                        .doc
                        .attrs(owner)
                        .get(index)
                        .is_some_and(|(attr, _)| attr.eq_ignore_ascii_case(name))
            }
            (XNode::Attr(..), NodeTest::Any) => axis == Axis::Attribute,
            (XNode::Attr(..), NodeTest::Text) => false,
            (XNode::Node(id), NodeTest::Name(name)) => self.doc.tag_name(id).is_some_and(|t| t == name),
            (XNode::Node(id), NodeTest::Any) => self.doc.is_element(id),
            (XNode::Node(id), NodeTest::Text) => self.doc.text(id).is_some(),
        }
    }

    fn node_string(&self, node: XNode) -> String {
        match node {
            XNode::Node(id) => self.doc.text_content(id),
            XNode::Attr(owner, index) => self
                .doc
                .attrs(owner)
                .get(index)
                .map(|(_, value)| value.to_string())
                .unwrap_or_default(),
        }
    }

    fn node_name(&self, node: XNode) -> String {
        match node {
            XNode::Node(id) => self.doc.tag_name(id).unwrap_or("").to_string(),
            XNode::Attr(owner, index) => self
                .doc
                .attrs(owner)
                .get(index)
                .map(|(name, _)| name.to_string())
                .unwrap_or_default(),
        }
    }

    fn string(&self, value: &XValue) -> String {
        match value {
            XValue::Str(s) => s.clone(),
            XValue::Num(n) => format_number(*n),
            XValue::Bool(b) => b.to_string(),
            XValue::Nodes(nodes) => nodes.first().map(|n| self.node_string(*n)).unwrap_or_default(),
        }
    }

    fn number(&self, value: &XValue) -> f64 {
        match value {
            XValue::Num(n) => *n,
            XValue::Bool(b) => f64::from(u8::from(*b)),
            other => parse_number(&self.string(other)),
        }
    }

    fn boolean(&self, value: &XValue) -> bool {
        match value {
            XValue::Bool(b) => *b,
            XValue::Num(n) => *n != 0.0 && !n.is_nan(),
            XValue::Str(s) => !s.is_empty(),
            XValue::Nodes(nodes) => !nodes.is_empty(),
        }
    }

    fn eval_binary(&self, op: BinOp, left: &Expr, right: &Expr, ctx: Context) -> EvalResult<XValue> {
        match op {
            BinOp::Or => {
                let l = self.eval(left, ctx)?;
                Ok(XValue::Bool(self.boolean(&l) || self.boolean(&self.eval(right, ctx)?)))
            }
            BinOp::And => {
                let l = self.eval(left, ctx)?;
                Ok(XValue::Bool(self.boolean(&l) && self.boolean(&self.eval(right, ctx)?)))
            }
            BinOp::Add | BinOp::Sub => {
                let l = self.number(&self.eval(left, ctx)?);
                let r = self.number(&self.eval(right, ctx)?);
                Ok(XValue::Num(if op == BinOp::Add { l + r } else { l - r }))
            }
            _ => {
                let l = self.eval(left, ctx)?;
                let r = self.eval(right, ctx)?;
                Ok(XValue::Bool(self.compare(op, &l, &r)))
            }
        }
    }

    fn compare(&self, op: BinOp, left: &XValue, right: &XValue) -> bool {
        match (left, right) {
            (XValue::Nodes(l), XValue::Nodes(r)) => l.iter().any(|a| {
                let a = XValue::Str(self.node_string(*a));
                r.iter().any(|b| self.compare(op, &a, &XValue::Str(self.node_string(*b))))
            }),
            (XValue::Nodes(_), XValue::Bool(_)) | (XValue::Bool(_), XValue::Nodes(_)) => {
                self.compare_atomic(op, &XValue::Bool(self.boolean(left)), &XValue::Bool(self.boolean(right)))
            }
            (XValue::Nodes(nodes), other) => nodes
                .iter()
                .any(|n| self.compare_atomic(op, &XValue::Str(self.node_string(*n)), other)),
            (other, XValue::Nodes(nodes)) => nodes
                .iter()
                .any(|n| self.compare_atomic(op, other, &XValue::Str(self.node_string(*n)))),
            _ => self.compare_atomic(op, left, right),
        }
    }

    fn compare_atomic(&self, op: BinOp, left: &XValue, right: &XValue) -> bool {
        match op {
            BinOp::Eq | BinOp::Ne => {
                let equal = match (left, right) {
                    (XValue::Bool(_), _) | (_, XValue::Bool(_)) => self.boolean(left) == self.boolean(right),
                    (XValue::Num(_), _) | (_, XValue::Num(_)) => self.number(left) == self.number(right),
                    _ => self.string(left) == self.string(right),
                };
                equal == (op == BinOp::Eq)
            }
            _ => {
                let (l, r) = (self.number(left), self.number(right));
                match op {
                    BinOp::Lt => l < r,
                    BinOp::Le => l <= r,
                    BinOp::Gt => l > r,
                    _ => l >= r,
                }
            }
        }
    }

    fn call(&self, name: &str, args: &[Expr], ctx: Context) -> EvalResult<XValue> {
        let arity = |min: usize, max: usize| {
            if args.len() < min || args.len() > max {
                Err(format!("{}() takes between {} and {} arguments", name, min, max))
            } else {
                Ok(())
            }
        };
        let values = args
            .iter()
            .map(|a| self.eval(a, ctx))
            .collect::<EvalResult<Vec<_>>>()?;
        let string_arg = |i: usize| match values.get(i) {
            Some(v) => self.string(v),
            None => self.node_string(ctx.node),
        };
        let value = match name {
            "last" => {
                arity(0, 0)?;
                XValue::Num(ctx.size as f64)
            }
            "position" => {
                arity(0, 0)?;
                XValue::Num(ctx.position as f64)
            }
            "count" => {
                arity(1, 1)?;
                match &values[0] {
                    XValue::Nodes(nodes) => XValue::Num(nodes.len() as f64),
                    _ => return Err("count() requires a node set".to_string()),
                }
            }
            "name" | "local-name" => {
                arity(0, 1)?;
                let node = match values.first() {
                    Some(XValue::Nodes(nodes)) => nodes.first().copied(),
                    Some(_) => return Err(format!("{}() requires a node set", name)),
                    None => Some(ctx.node),
                };
                XValue::Str(node.map(|n| self.node_name(n)).unwrap_or_default())
            }
            "string" => {
                arity(0, 1)?;
                XValue::Str(string_arg(0))
            }
            "concat" => {
                if args.len() < 2 {
                    return Err("concat() takes at least 2 arguments".to_string());
                }
                XValue::Str(values.iter().map(|v| self.string(v)).collect())
            }
            "contains" => {
                arity(2, 2)?;
                XValue::Bool(string_arg(0).contains(&string_arg(1)))
            }
            "starts-with" => {
                arity(2, 2)?;
                XValue::Bool(string_arg(0).starts_with(&string_arg(1)))
            }
            "substring-before" => {
                arity(2, 2)?;
                let (haystack, needle) = (string_arg(0), string_arg(1));
                XValue::Str(haystack.split_once(&needle).map(|(b, _)| b.to_string()).unwrap_or_default())
            }
            "substring-after" => {
                arity(2, 2)?;
                let (haystack, needle) = (string_arg(0), string_arg(1));
                XValue::Str(haystack.split_once(&needle).map(|(_, a)| a.to_string()).unwrap_or_default())
            }
            "substring" => {
                arity(2, 3)?;
                let chars: Vec<char> = string_arg(0).chars().collect();
                let start = round_half_up(self.number(&values[1]));
                let end = match values.get(2) {
                    Some(len) => start + round_half_up(self.number(len)),
                    None => f64::INFINITY,
                };
                XValue::Str(
                    chars
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| {
                            let position = (*i + 1) as f64;
                            position >= start && position < end
                        })
                        .map(|(_, c)| *c)
                        .collect(),
                )
            }
            "string-length" => {
                arity(0, 1)?;
                XValue::Num(string_arg(0).chars().count() as f64)
            }
            "normalize-space" => {
                arity(0, 1)?;
                XValue::Str(string_arg(0).split_whitespace().collect::<Vec<_>>().join(" "))
            }
            "translate" => {
                arity(3, 3)?;
                let from: Vec<char> = string_arg(1).chars().collect();
                let to: Vec<char> = string_arg(2).chars().collect();
                XValue::Str(
                    string_arg(0)
                        .chars()
                        .filter_map(|c| match from.iter().position(|f| *f == c) {
                            Some(i) => to.get(i).copied(),
                            None => Some(c),
                        })
                        .collect(),
                )
            }
            "not" => {
                arity(1, 1)?;
                XValue::Bool(!self.boolean(&values[0]))
            }
            "boolean" => {
                arity(1, 1)?;
                XValue::Bool(self.boolean(&values[0]))
            }
            "true" => {
                arity(0, 0)?;
                XValue::Bool(true)
            }
            "false" => {
                arity(0, 0)?;
                XValue::Bool(false)
            }
            "number" => {
                arity(0, 1)?;
                match values.first() {
                    Some(v) => XValue::Num(self.number(v)),
                    None => XValue::Num(parse_number(&self.node_string(ctx.node))),
                }
            }
            "sum" => {
                arity(1, 1)?;
                match &values[0] {
                    XValue::Nodes(nodes) => {
                        XValue::Num(nodes.iter().map(|n| parse_number(&self.node_string(*n))).sum())
                    }
                    _ => return Err("sum() requires a node set".to_string()),
                }
            }
            "floor" => {
                arity(1, 1)?;
                XValue::Num(self.number(&values[0]).floor())
            }
            "ceiling" => {
                arity(1, 1)?;
                XValue::Num(self.number(&values[0]).ceil())
            }
            "round" => {
                arity(1, 1)?;
                XValue::Num(round_half_up(self.number(&values[0])))
            }
            other => return Err(format!("unknown function '{}()'", other)),
        };
        Ok(value)
    }
}

fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-') {
        return f64::NAN;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

fn round_half_up(n: f64) -> f64 {
    (n + 0.5).floor()
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        (if n > 0.0 { "Infinity" } else { "-Infinity" }).to_string()
    } else if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
