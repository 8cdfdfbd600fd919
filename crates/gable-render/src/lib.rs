//! # Gable Render - Template Inheritance Runtime
//!
//! `gable-render` executes compiled document templates: template trees with
//! single inheritance, named blocks, loops with loop metadata, includes and
//! an output-format escaping policy. It is the runtime behind static
//! documentation generators that produce HTML pages and JavaScript search
//! indexes from one set of templates.
//!
//! ## Core Concepts
//!
//! - [`Template`]: a name, an optional parent, a body and named blocks
//! - [`TemplateSource`]: resolves template names; [`TemplateRegistry`] is the
//!   in-memory implementation
//! - [`BlockTable`]: which definition of each block a chain displays
//! - [`Engine`]: renders a template name with a [`Context`]
//! - [`Value`] and [`Object`]: data seen by templates
//! - [`LoopContext`]: `loop.index`, `loop.last` and friends
//!
//! ## Quick Start
//!
//! ```rust
//! use gable_render::{Context, Engine, Expr, ForLoop, Node, Template, TemplateRegistry};
//!
//! let mut registry = TemplateRegistry::new();
//! registry.add(
//!     Template::new("layout.html")
//!         .with_body(vec![
//!             Node::text("<title>"),
//!             Node::block("title"),
//!             Node::text("</title>"),
//!             Node::block("content"),
//!         ])
//!         .with_block("title", vec![Node::text("Docs")]),
//! );
//! registry.add(
//!     Template::new("index.html")
//!         .extends("layout.html")
//!         .with_block("content", vec![ForLoop::new(
//!             "name",
//!             Expr::var("names"),
//!             vec![
//!                 Node::print(Expr::var("name")),
//!                 Node::print(Expr::conditional(
//!                     Expr::var("loop").attr("last"),
//!                     Expr::constant(""),
//!                     Expr::constant(", "),
//!                 )),
//!             ],
//!         )
//!         .into()]),
//! );
//!
//! let engine = Engine::new(registry);
//! let context = Context::new().with("names", vec!["A<B>", "C"]);
//! let html = engine.render("index.html", context).unwrap();
//! assert_eq!(html, "<title>Docs</title>A&lt;B&gt;, C");
//! ```
//!
//! ## Escaping
//!
//! `print` nodes escape through the configured [`AutoEscape`] policy.
//! Explicit escapes ([`Expr::escape`]) produce strings marked safe for their
//! strategy; printing those in the same format emits them as they are, and
//! printing them in another format escapes them again. Functions registered
//! with [`Engine::add_safe_function`] return pre-escaped markup the same way.
//!
//! ## Logging
//!
//! The engine emits `tracing` events: `debug` for each resolved chain and
//! finished render, `trace` for blocks, loops and includes.

mod ast;
mod blocks;
mod config;
mod context;
mod engine;
mod error;
mod eval;
mod functions;
mod loops;
mod registry;
mod render;
mod template;
mod value;

pub use ast::{BinOp, Expr, ForLoop, If, Include, Node, Test};
pub use blocks::BlockTable;
pub use config::{AutoEscape, ConfigError, EngineConfig, DEFAULT_MAX_INCLUDE_DEPTH};
pub use context::Context;
pub use engine::Engine;
pub use error::{ErrorKind, RenderError, Result};
pub use functions::{map_value, Filter, Function, Functions};
pub use loops::LoopContext;
pub use registry::{normalize_name, RegistryError, TemplateRegistry, TemplateSource};
pub use template::Template;
pub use value::{Map, Object, Value};

pub use gable_escape::{Escapers, Markup, SafeString};
