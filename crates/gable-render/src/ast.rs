//! Template syntax tree.
//!
//! Templates are built from [`Node`]s holding [`Expr`]s. There is no text
//! parser; trees are produced by a front-end or written by hand with the
//! builder methods:
//!
//! ```rust
//! use gable_render::{Expr, ForLoop, Node};
//!
//! let body = vec![
//!     Node::text("<ul>"),
//!     ForLoop::new("item", Expr::var("items"), vec![
//!         Node::text("<li>"),
//!         Node::print(Expr::var("item").attr("name")),
//!         Node::text("</li>"),
//!     ])
//!     .into(),
//!     Node::text("</ul>"),
//! ];
//! # let _ = body;
//! ```

use crate::value::Value;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// String concatenation (`~`).
    Concat,
    /// Membership (`in`).
    In,
}

/// Tests usable with `is`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Test {
    Defined,
    Empty,
    Null,
    Iterable,
}

/// An expression.
#[derive(Debug, Clone)]
pub enum Expr {
    Const(Value),
    Var(String),
    Attr {
        base: Box<Expr>,
        name: String,
    },
    Item {
        base: Box<Expr>,
        key: Box<Expr>,
    },
    /// Call of a registered function.
    Call {
        name: String,
        args: Vec<Expr>,
    },
    /// Application of a registered filter.
    Filter {
        name: String,
        input: Box<Expr>,
        args: Vec<Expr>,
    },
    /// Explicit escape; yields a string marked safe for `strategy`.
    Escape {
        input: Box<Expr>,
        strategy: String,
    },
    Not(Box<Expr>),
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Is {
        input: Box<Expr>,
        test: Test,
    },
    List(Vec<Expr>),
    Map(Vec<(String, Expr)>),
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        Expr::Const(value.into())
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.into(),
            args,
        }
    }

    pub fn list(items: Vec<Expr>) -> Self {
        Expr::List(items)
    }

    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Expr)>) -> Self {
        Expr::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    pub fn conditional(cond: Expr, then: Expr, otherwise: Expr) -> Self {
        Expr::Conditional {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    /// `self.name`
    pub fn attr(self, name: impl Into<String>) -> Self {
        Expr::Attr {
            base: Box::new(self),
            name: name.into(),
        }
    }

    /// `self[key]`
    pub fn item(self, key: Expr) -> Self {
        Expr::Item {
            base: Box::new(self),
            key: Box::new(key),
        }
    }

    /// `self|name(args)`
    pub fn filter(self, name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Filter {
            name: name.into(),
            input: Box::new(self),
            args,
        }
    }

    /// `self|escape(strategy)`
    pub fn escape(self, strategy: impl Into<String>) -> Self {
        Expr::Escape {
            input: Box::new(self),
            strategy: strategy.into(),
        }
    }

    /// `self is test`
    pub fn is(self, test: Test) -> Self {
        Expr::Is {
            input: Box::new(self),
            test,
        }
    }

    pub fn binary(self, op: BinOp, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(self),
            right: Box::new(rhs),
        }
    }

    pub fn and(self, rhs: Expr) -> Self {
        self.binary(BinOp::And, rhs)
    }

    pub fn or(self, rhs: Expr) -> Self {
        self.binary(BinOp::Or, rhs)
    }

    pub fn equals(self, rhs: Expr) -> Self {
        self.binary(BinOp::Eq, rhs)
    }

    /// `self ~ rhs`
    pub fn concat(self, rhs: Expr) -> Self {
        self.binary(BinOp::Concat, rhs)
    }
}

impl std::ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}

/// A statement.
#[derive(Debug, Clone)]
pub enum Node {
    /// Literal text, emitted verbatim.
    Text(String),
    /// Source line of the nodes that follow, used in error reports.
    Line(u32),
    /// Prints an expression through the auto-escape policy.
    Print(Expr),
    /// Prints an expression verbatim.
    Raw(Expr),
    If(If),
    For(ForLoop),
    Set {
        name: String,
        value: Expr,
    },
    /// Displays the named block, resolved through the block table.
    Block(String),
    /// Displays the next less-derived definition of the enclosing block.
    ParentBlock,
    Include(Include),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn print(expr: Expr) -> Self {
        Node::Print(expr)
    }

    pub fn raw(expr: Expr) -> Self {
        Node::Raw(expr)
    }

    pub fn block(name: impl Into<String>) -> Self {
        Node::Block(name.into())
    }

    pub fn set(name: impl Into<String>, value: Expr) -> Self {
        Node::Set {
            name: name.into(),
            value,
        }
    }

    pub fn include(template: impl Into<String>) -> Self {
        Node::Include(Include::new(template))
    }
}

/// `if` / `elseif` / `else`.
#[derive(Debug, Clone)]
pub struct If {
    pub(crate) branches: Vec<(Expr, Vec<Node>)>,
    pub(crate) otherwise: Vec<Node>,
}

impl If {
    pub fn new(cond: Expr, body: Vec<Node>) -> Self {
        Self {
            branches: vec![(cond, body)],
            otherwise: Vec::new(),
        }
    }

    pub fn elif(mut self, cond: Expr, body: Vec<Node>) -> Self {
        self.branches.push((cond, body));
        self
    }

    pub fn otherwise(mut self, body: Vec<Node>) -> Self {
        self.otherwise = body;
        self
    }
}

impl From<If> for Node {
    fn from(node: If) -> Self {
        Node::If(node)
    }
}

/// `for [key,] value in seq` with an optional `else` body for empty input.
#[derive(Debug, Clone)]
pub struct ForLoop {
    pub(crate) key: Option<String>,
    pub(crate) value: String,
    pub(crate) seq: Expr,
    pub(crate) body: Vec<Node>,
    pub(crate) otherwise: Vec<Node>,
}

impl ForLoop {
    pub fn new(value: impl Into<String>, seq: Expr, body: Vec<Node>) -> Self {
        Self {
            key: None,
            value: value.into(),
            seq,
            body,
            otherwise: Vec::new(),
        }
    }

    /// Also binds the key (index for sequences) to `name`.
    pub fn key(mut self, name: impl Into<String>) -> Self {
        self.key = Some(name.into());
        self
    }

    pub fn otherwise(mut self, body: Vec<Node>) -> Self {
        self.otherwise = body;
        self
    }
}

impl From<ForLoop> for Node {
    fn from(node: ForLoop) -> Self {
        Node::For(node)
    }
}

/// Inclusion of another template.
#[derive(Debug, Clone)]
pub struct Include {
    pub(crate) template: String,
    pub(crate) with: Option<Expr>,
    pub(crate) only: bool,
    pub(crate) ignore_missing: bool,
}

impl Include {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            with: None,
            only: false,
            ignore_missing: false,
        }
    }

    /// Extra variables; must evaluate to a mapping.
    pub fn with(mut self, vars: Expr) -> Self {
        self.with = Some(vars);
        self
    }

    /// Hides the including template's variables.
    pub fn only(mut self) -> Self {
        self.only = true;
        self
    }

    /// Renders nothing instead of failing when the template does not exist.
    pub fn ignore_missing(mut self) -> Self {
        self.ignore_missing = true;
        self
    }
}

impl From<Include> for Node {
    fn from(node: Include) -> Self {
        Node::Include(node)
    }
}
