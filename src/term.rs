//! # Term trees
//!
//! The parser produces immutable rose trees of [`Term`]s. A term is either an
//! [`AtomicTerm`] leaf or a [`NodeTerm`] with a functor and ordered children.
//! The tree shape alone determines meaning; walkers such as the
//! [`FilterBuilder`](crate::filter_builder::FilterBuilder) dispatch on the
//! functor through [`TermWalker`].
//!
//! ## Term language
//!
//! Terms render to (and parse back from) a compact functional notation:
//!
//! ```text
//! binaryOperatorNode('==', identifier(foo), literal('bar'))
//! ```
//!
//! ```
//! use cohql::term::{self, Term};
//!
//! let t = term::create("binaryOperatorNode('==', identifier(foo), literal('bar'))").unwrap();
//! assert_eq!(t.functor(), "binaryOperatorNode");
//! assert_eq!(t.len(), 3);
//! ```
pub mod atomic;
pub mod text;

use std::fmt;

pub use atomic::{AtomicTerm, LiteralKind};
pub use text::create;

/// Functor names of the standard AST nodes.
pub mod functor {
    pub const IDENTIFIER: &str = "identifier";
    pub const LITERAL: &str = "literal";
    pub const BINARY_OPERATOR: &str = "binaryOperatorNode";
    pub const UNARY_OPERATOR: &str = "unaryOperatorNode";
    pub const CALL: &str = "callNode";
    pub const DEREF: &str = "derefNode";
    pub const LIST: &str = "listNode";
    pub const BINDING: &str = "bindingNode";
    pub const LIST_LITERAL: &str = "listLiteral";
    pub const BAG_LITERAL: &str = "bagLiteral";
    pub const PAIR: &str = "pairNode";
    /// Functor reported by atomic terms
    pub const ATOM: &str = "atom";
}

#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Atomic(AtomicTerm),
    Node(NodeTerm),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeTerm {
    functor: String,
    children: Vec<Term>,
}

impl NodeTerm {
    pub fn new(functor: impl Into<String>, children: Vec<Term>) -> Self {
        NodeTerm {
            functor: functor.into(),
            children,
        }
    }

    pub fn functor(&self) -> &str {
        &self.functor
    }

    pub fn children(&self) -> &[Term] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn child(&self, index: usize) -> Option<&Term> {
        self.children.get(index)
    }

    pub fn into_children(self) -> Vec<Term> {
        self.children
    }

    /// First direct child with the given functor.
    pub fn find_child(&self, functor: &str) -> Option<&NodeTerm> {
        self.children.iter().find_map(|c| match c {
            Term::Node(node) if node.functor == functor => Some(node),
            _ => None,
        })
    }

    /// The single child of the first direct child named `functor`, if any.
    ///
    /// Statement nodes store their clauses as `from(name)`, `whereClause(expr)`.
    pub fn find_attribute(&self, functor: &str) -> Option<&Term> {
        self.find_child(functor).and_then(|node| node.child(0))
    }
}

impl Term {
    pub fn node(functor: impl Into<String>, children: Vec<Term>) -> Self {
        Term::Node(NodeTerm::new(functor, children))
    }

    pub fn atom(atom: AtomicTerm) -> Self {
        Term::Atomic(atom)
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Term::Atomic(AtomicTerm::symbol(name))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Term::Atomic(AtomicTerm::string(s))
    }

    pub fn null() -> Self {
        Term::Atomic(AtomicTerm::null())
    }

    /// `identifier(name)`
    pub fn identifier(name: impl Into<String>) -> Self {
        Term::node(functor::IDENTIFIER, vec![Term::symbol(name)])
    }

    /// `literal(atom)`
    pub fn literal(atom: AtomicTerm) -> Self {
        Term::node(functor::LITERAL, vec![Term::Atomic(atom)])
    }

    pub fn functor(&self) -> &str {
        match self {
            Term::Atomic(_) => functor::ATOM,
            Term::Node(node) => node.functor(),
        }
    }

    /// Number of children; atoms have none.
    pub fn len(&self) -> usize {
        match self {
            Term::Atomic(_) => 0,
            Term::Node(node) => node.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn child(&self, index: usize) -> Option<&Term> {
        match self {
            Term::Atomic(_) => None,
            Term::Node(node) => node.child(index),
        }
    }

    pub fn children(&self) -> &[Term] {
        match self {
            Term::Atomic(_) => &[],
            Term::Node(node) => node.children(),
        }
    }

    pub fn is_atom(&self) -> bool {
        matches!(self, Term::Atomic(_))
    }

    pub fn as_atom(&self) -> Option<&AtomicTerm> {
        match self {
            Term::Atomic(atom) => Some(atom),
            Term::Node(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<&NodeTerm> {
        match self {
            Term::Node(node) => Some(node),
            Term::Atomic(_) => None,
        }
    }

    pub fn is_functor(&self, name: &str) -> bool {
        matches!(self, Term::Node(node) if node.functor == name)
    }

    /// Name carried by an `identifier(name)` node or a bare symbol.
    pub fn identifier_name(&self) -> Option<&str> {
        match self {
            Term::Atomic(AtomicTerm::Symbol(name)) => Some(name),
            Term::Node(node) if node.functor == functor::IDENTIFIER => match node.child(0) {
                Some(Term::Atomic(AtomicTerm::Symbol(name))) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }

    /// Dispatches to the walker method matching this term's shape.
    pub fn accept<W: TermWalker + ?Sized>(&self, walker: &W) -> W::Output {
        let node = match self {
            Term::Atomic(atom) => return walker.accept_atom(atom),
            Term::Node(node) => node,
        };

        let first_atom = || node.child(0).and_then(Term::as_atom);
        match node.functor() {
            functor::LIST => walker.accept_list(node),
            functor::IDENTIFIER if node.len() == 1 => match first_atom() {
                Some(atom) => walker.accept_identifier(&atom.text()),
                None => walker.accept_node(node.functor(), node),
            },
            functor::LITERAL if node.len() == 1 => match first_atom() {
                Some(atom) => walker.accept_literal(atom),
                None => walker.accept_node(node.functor(), node),
            },
            functor::BINARY_OPERATOR if node.len() == 3 => match first_atom() {
                Some(op) => walker.accept_binary_operator(&op.text(), &node.children[1], &node.children[2]),
                None => walker.accept_node(node.functor(), node),
            },
            functor::UNARY_OPERATOR if node.len() == 2 => match first_atom() {
                Some(op) => walker.accept_unary_operator(&op.text(), &node.children[1]),
                None => walker.accept_node(node.functor(), node),
            },
            functor::CALL if node.len() == 1 => match &node.children[0] {
                Term::Node(call) => walker.accept_call(call.functor(), call),
                Term::Atomic(_) => walker.accept_node(node.functor(), node),
            },
            functor::DEREF => walker.accept_path(node),
            functor::BINDING if node.len() == 2 => match first_atom() {
                Some(kind) => walker.accept_binding(&kind.text(), &node.children[1]),
                None => walker.accept_node(node.functor(), node),
            },
            other => walker.accept_node(other, node),
        }
    }
}

/// Functor-dispatched tree walk.
///
/// [`Term::accept`] routes each node shape to one method; implementors return
/// their result directly rather than storing it.
pub trait TermWalker {
    type Output;

    fn walk(&self, term: &Term) -> Self::Output {
        term.accept(self)
    }

    fn accept_atom(&self, atom: &AtomicTerm) -> Self::Output;

    fn accept_list(&self, node: &NodeTerm) -> Self::Output;

    fn accept_identifier(&self, name: &str) -> Self::Output;

    fn accept_literal(&self, atom: &AtomicTerm) -> Self::Output;

    fn accept_binary_operator(&self, op: &str, left: &Term, right: &Term) -> Self::Output;

    fn accept_unary_operator(&self, op: &str, operand: &Term) -> Self::Output;

    fn accept_call(&self, name: &str, call: &NodeTerm) -> Self::Output;

    fn accept_path(&self, node: &NodeTerm) -> Self::Output;

    fn accept_binding(&self, kind: &str, term: &Term) -> Self::Output;

    /// Any node the other methods do not cover.
    fn accept_node(&self, functor: &str, node: &NodeTerm) -> Self::Output;
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Atomic(atom) => write!(f, "{}", atom),
            Term::Node(node) => write!(f, "{}", node),
        }
    }
}

impl fmt::Display for NodeTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.functor)?;
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", child)?;
        }
        f.write_str(")")
    }
}

impl From<AtomicTerm> for Term {
    fn from(atom: AtomicTerm) -> Self {
        Term::Atomic(atom)
    }
}

impl From<NodeTerm> for Term {
    fn from(node: NodeTerm) -> Self {
        Term::Node(node)
    }
}
