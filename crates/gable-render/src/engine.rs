//! The render engine.
//!
//! [`Engine`] ties a [`TemplateSource`] to the configuration, the escapers
//! and the registered functions and filters. It holds no per-render state:
//! every call to [`Engine::render`] builds its own scope, loop stack and
//! output buffer, so one engine can serve many threads at once.
//!
//! # Rendering
//!
//! 1. Resolve the inheritance chain of the requested template by following
//!    `extends` until a root; a template seen twice is
//!    [`ErrorKind::CircularInheritance`].
//! 2. Build the [`BlockTable`] for the chain.
//! 3. Display the root's body. Block nodes anywhere in the chain resolve
//!    through the table, so the most-derived definition wins.
//!
//! ```rust
//! use gable_render::{Context, Engine, Expr, Node, Template, TemplateRegistry};
//!
//! let mut registry = TemplateRegistry::new();
//! registry.add(
//!     Template::new("base.html")
//!         .with_body(vec![Node::text("<p>"), Node::block("b"), Node::text("</p>")])
//!         .with_block("b", vec![Node::text("base")]),
//! );
//! registry.add(
//!     Template::new("page.html")
//!         .extends("base.html")
//!         .with_block("b", vec![Node::print(Expr::var("who"))]),
//! );
//!
//! let engine = Engine::new(registry);
//! let html = engine.render("page.html", Context::new().with("who", "<X>")).unwrap();
//! assert_eq!(html, "<p>&lt;X&gt;</p>");
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use gable_escape::Escapers;
use serde::Serialize;
use tracing::debug;

use crate::blocks::BlockTable;
use crate::config::EngineConfig;
use crate::context::Context;
use crate::error::{ErrorKind, RenderError, Result};
use crate::functions::{Filter, Function, Functions};
use crate::registry::{RegistryError, TemplateSource};
use crate::render::State;
use crate::template::Template;
use crate::value::{Map, Value};

/// Renders templates from a [`TemplateSource`].
pub struct Engine {
    source: Arc<dyn TemplateSource>,
    config: EngineConfig,
    functions: Functions,
    escapers: Escapers,
}

impl Engine {
    /// Creates an engine with the default configuration.
    pub fn new<S: TemplateSource + 'static>(source: S) -> Self {
        Self::with_config(source, EngineConfig::default())
    }

    pub fn with_config<S: TemplateSource + 'static>(source: S, config: EngineConfig) -> Self {
        Self::from_shared(Arc::new(source), config)
    }

    /// Creates an engine over a source shared with other owners.
    pub fn from_shared(source: Arc<dyn TemplateSource>, config: EngineConfig) -> Self {
        Self {
            source,
            config,
            functions: Functions::new(),
            escapers: Escapers::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn functions(&self) -> &Functions {
        &self.functions
    }

    pub fn escapers(&self) -> &Escapers {
        &self.escapers
    }

    /// Registers a function. String results are escaped when printed.
    pub fn add_function<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value]) -> std::result::Result<Value, ErrorKind> + Send + Sync + 'static,
    {
        self.functions.add_function(name, Function::new(f));
    }

    /// Registers a function whose string results are already safe for
    /// `strategy`.
    pub fn add_safe_function<F>(&mut self, name: impl Into<String>, strategy: &str, f: F)
    where
        F: Fn(&[Value]) -> std::result::Result<Value, ErrorKind> + Send + Sync + 'static,
    {
        self.functions
            .add_function(name, Function::new(f).safe_for(strategy));
    }

    pub fn add_filter<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&Value, &[Value]) -> std::result::Result<Value, ErrorKind> + Send + Sync + 'static,
    {
        self.functions.add_filter(name, Filter::new(f));
    }

    pub fn add_safe_filter<F>(&mut self, name: impl Into<String>, strategy: &str, f: F)
    where
        F: Fn(&Value, &[Value]) -> std::result::Result<Value, ErrorKind> + Send + Sync + 'static,
    {
        self.functions
            .add_filter(name, Filter::new(f).safe_for(strategy));
    }

    /// Registers (or replaces) an escaping strategy.
    pub fn add_escaper<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.escapers.register(name, f);
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.source.resolve(name).is_ok()
    }

    /// The inheritance chain of `name`, most-derived first, root last.
    pub fn resolve_chain(&self, name: &str) -> Result<Vec<Arc<Template>>> {
        self.chain(name)
            .map_err(|kind| RenderError::new(name, None, kind))
    }

    /// The block table of `name`'s inheritance chain.
    pub fn block_table(&self, name: &str) -> Result<BlockTable> {
        Ok(BlockTable::from_chain(&self.resolve_chain(name)?))
    }

    /// Renders `name` with `context`.
    ///
    /// Output is produced only if the whole render succeeds.
    pub fn render(&self, name: &str, context: Context) -> Result<String> {
        let (chain, table) = self.prepare(name)?;
        let mut state = self.state(name, &chain, context.into_map())?;
        state.display(&chain, &table)?;
        let output = state.into_output();
        debug!(template = name, bytes = output.len(), "rendered template");
        Ok(output)
    }

    /// Renders `name` with any value that serializes to a mapping.
    pub fn render_serialize<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> Result<String> {
        let context = Context::from_serialize(data).map_err(|kind| RenderError::new(name, None, kind))?;
        self.render(name, context)
    }

    /// Renders only block `block` of `name`, as the full render would
    /// display it.
    pub fn render_block(&self, name: &str, block: &str, context: Context) -> Result<String> {
        let (chain, table) = self.prepare(name)?;
        if !table.contains(block) {
            return Err(RenderError::new(
                name,
                None,
                ErrorKind::UnknownBlock {
                    block: block.to_string(),
                },
            ));
        }
        let mut state = self.state(name, &chain, context.into_map())?;
        state.display_block(block, 0, &table)?;
        Ok(state.into_output())
    }

    fn prepare(&self, name: &str) -> Result<(Vec<Arc<Template>>, BlockTable)> {
        let chain = self.resolve_chain(name)?;
        let table = BlockTable::from_chain(&chain);
        debug!(
            template = name,
            chain = ?chain.iter().map(|t| t.name()).collect::<Vec<_>>(),
            blocks = table.len(),
            "resolved inheritance chain"
        );
        Ok((chain, table))
    }

    fn state(&self, name: &str, chain: &[Arc<Template>], vars: Map) -> Result<State<'_>> {
        match chain.first() {
            Some(template) => Ok(State::new(self, vars, Arc::clone(template))),
            None => Err(RenderError::new(
                name,
                None,
                ErrorKind::TemplateNotFound {
                    name: name.to_string(),
                },
            )),
        }
    }

    pub(crate) fn load(&self, name: &str) -> std::result::Result<Arc<Template>, ErrorKind> {
        self.source.resolve(name).map_err(|err| match err {
            RegistryError::NotFound { name } => ErrorKind::TemplateNotFound { name },
            RegistryError::Load { name, message } => {
                ErrorKind::InvalidOperation(format!("failed to load \"{}\": {}", name, message))
            }
        })
    }

    /// Follows `extends` from `name` to the root.
    pub(crate) fn chain(&self, name: &str) -> std::result::Result<Vec<Arc<Template>>, ErrorKind> {
        let mut chain: Vec<Arc<Template>> = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(name.to_string());
        while let Some(current) = next {
            let template = self.load(&current)?;
            if !seen.insert(template.name().to_string()) {
                let mut names: Vec<String> =
                    chain.iter().map(|t| t.name().to_string()).collect();
                names.push(template.name().to_string());
                return Err(ErrorKind::CircularInheritance { chain: names });
            }
            next = template.parent().map(str::to_string);
            chain.push(template);
        }
        Ok(chain)
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("functions", &self.functions)
            .field("escapers", &self.escapers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, ForLoop, Include, Node, Test};
    use crate::config::AutoEscape;
    use crate::registry::TemplateRegistry;

    fn engine(templates: Vec<Template>) -> Engine {
        Engine::new(templates.into_iter().collect::<TemplateRegistry>())
    }

    fn render(templates: Vec<Template>, name: &str, context: Context) -> String {
        engine(templates).render(name, context).unwrap()
    }

    #[test]
    fn test_plain_body() {
        let out = render(
            vec![Template::new("t").with_body(vec![Node::text("hello "), Node::print(Expr::var("name"))])],
            "t",
            Context::new().with("name", "world"),
        );
        assert_eq!(out, "hello world");
    }

    #[test]
    fn test_undefined_prints_empty() {
        let out = render(
            vec![Template::new("t").with_body(vec![Node::text("["), Node::print(Expr::var("missing")), Node::text("]")])],
            "t",
            Context::new(),
        );
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_strict_variables() {
        let config = EngineConfig::default().with_strict_variables(true);
        let registry: TemplateRegistry =
            vec![Template::new("t").with_body(vec![Node::print(Expr::var("missing"))])]
                .into_iter()
                .collect();
        let err = Engine::with_config(registry, config)
            .render("t", Context::new())
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UndefinedVariable { name } if name == "missing"));
    }

    #[test]
    fn test_attribute_of_undefined_fails_with_line() {
        let template = Template::new("t").with_body(vec![
            Node::Line(7),
            Node::print(Expr::var("element").attr("name")),
        ]);
        let err = engine(vec![template]).render("t", Context::new()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::AttributeError { attribute } if attribute == "name"));
        assert_eq!(err.template_name(), "t");
        assert_eq!(err.line(), Some(7));
    }

    #[test]
    fn test_loop_metadata_and_restore() {
        let body = vec![
            ForLoop::new(
                "x",
                Expr::var("items"),
                vec![
                    Node::print(Expr::var("loop").attr("index0")),
                    Node::print(Expr::var("loop").attr("index")),
                    Node::print(Expr::var("loop").attr("first")),
                    Node::print(Expr::var("loop").attr("last")),
                    Node::text(";"),
                ],
            )
            .into(),
            Node::print(Expr::var("x").is(Test::Defined)),
        ];
        let out = render(
            vec![Template::new("t").with_body(body)],
            "t",
            Context::new().with("items", vec!["a", "b", "c"]),
        );
        assert_eq!(out, "01truefalse;12falsefalse;23falsetrue;false");
    }

    #[test]
    fn test_loop_shadowing_is_restored() {
        let body = vec![
            ForLoop::new("x", Expr::var("items"), vec![Node::print(Expr::var("x"))]).into(),
            Node::print(Expr::var("x")),
        ];
        let out = render(
            vec![Template::new("t").with_body(body)],
            "t",
            Context::new().with("x", "outer").with("items", vec![1, 2]),
        );
        assert_eq!(out, "12outer");
    }

    #[test]
    fn test_for_else_and_non_iterable() {
        let body: Vec<Node> = vec![ForLoop::new("x", Expr::var("items"), vec![Node::print(Expr::var("x"))])
            .otherwise(vec![Node::text("none")])
            .into()];
        let templates = || vec![Template::new("t").with_body(body.clone())];
        assert_eq!(render(templates(), "t", Context::new().with("items", Vec::<i32>::new())), "none");
        assert_eq!(render(templates(), "t", Context::new().with("items", 5)), "none");
    }

    #[test]
    fn test_nested_loop_parent() {
        let inner = ForLoop::new(
            "y",
            Expr::var("x"),
            vec![
                Node::print(Expr::var("loop").attr("parent").attr("index")),
                Node::print(Expr::var("y")),
            ],
        );
        let outer = ForLoop::new("x", Expr::var("rows"), vec![inner.into(), Node::text("|")]);
        let out = render(
            vec![Template::new("t").with_body(vec![outer.into()])],
            "t",
            Context::new().with("rows", vec![vec!["a"], vec!["b", "c"]]),
        );
        assert_eq!(out, "1a|2b2c|");
    }

    #[test]
    fn test_key_value_loop() {
        let body: Vec<Node> = vec![ForLoop::new("v", Expr::var("m"), vec![
            Node::print(Expr::var("k")),
            Node::text("="),
            Node::print(Expr::var("v")),
            Node::text(" "),
        ])
        .key("k")
        .into()];
        let context = Context::from_json(r#"{"m": {"b": 1, "a": 2}}"#).unwrap();
        assert_eq!(render(vec![Template::new("t").with_body(body)], "t", context), "b=1 a=2 ");
    }

    #[test]
    fn test_autoescape_by_name() {
        let config = EngineConfig::default().with_autoescape(AutoEscape::ByName);
        let registry: TemplateRegistry = vec![
            Template::new("a.txt").with_body(vec![Node::print(Expr::var("v"))]),
            Template::new("a.html.twig").with_body(vec![Node::print(Expr::var("v"))]),
        ]
        .into_iter()
        .collect();
        let engine = Engine::with_config(registry, config);
        let ctx = || Context::new().with("v", "<&>");
        assert_eq!(engine.render("a.txt", ctx()).unwrap(), "<&>");
        assert_eq!(engine.render("a.html.twig", ctx()).unwrap(), "&lt;&amp;&gt;");
    }

    #[test]
    fn test_safe_function_is_not_escaped_twice() {
        let registry: TemplateRegistry = vec![Template::new("t").with_body(vec![
            Node::print(Expr::call("link", vec![])),
            Node::print(Expr::call("plain", vec![])),
        ])]
        .into_iter()
        .collect();
        let mut engine = Engine::new(registry);
        engine.add_safe_function("link", "html", |_| Ok(Value::from("<a href=\"x\">x</a>")));
        engine.add_function("plain", |_| Ok(Value::from("<b>")));
        assert_eq!(
            engine.render("t", Context::new()).unwrap(),
            "<a href=\"x\">x</a>&lt;b&gt;"
        );
    }

    #[test]
    fn test_explicit_escape_composes() {
        let expr = Expr::var("v").escape("js").escape("html");
        let out = render(
            vec![Template::new("t").with_body(vec![Node::print(expr)])],
            "t",
            Context::new().with("v", r"A\B"),
        );
        assert_eq!(out, r"A\\B");
    }

    #[test]
    fn test_escape_keeps_numbers() {
        let out = render(
            vec![Template::new("t").with_body(vec![Node::print(Expr::var("n").escape("js"))])],
            "t",
            Context::new().with("n", 42),
        );
        assert_eq!(out, "42");
    }

    #[test]
    fn test_unknown_function_and_filter() {
        let e = engine(vec![
            Template::new("f").with_body(vec![Node::print(Expr::call("nope", vec![]))]),
            Template::new("g").with_body(vec![Node::print(Expr::var("x").filter("nope", vec![]))]),
        ]);
        assert!(matches!(
            e.render("f", Context::new()).unwrap_err().kind(),
            ErrorKind::UnknownFunction(_)
        ));
        assert!(matches!(
            e.render("g", Context::new()).unwrap_err().kind(),
            ErrorKind::UnknownFilter(_)
        ));
    }

    #[test]
    fn test_unknown_escape_strategy() {
        let e = engine(vec![Template::new("t").with_body(vec![Node::print(Expr::var("x").escape("rtf"))])]);
        let err = e.render("t", Context::new().with("x", "a")).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Escape(_)));
    }

    #[test]
    fn test_set_and_conditionals() {
        let body = vec![
            Node::set("greeting", Expr::constant("hi ").concat(Expr::var("name"))),
            crate::ast::If::new(Expr::var("name").is(Test::Empty), vec![Node::text("anon")])
                .otherwise(vec![Node::print(Expr::var("greeting"))])
                .into(),
        ];
        let out = render(
            vec![Template::new("t").with_body(body)],
            "t",
            Context::new().with("name", "Ann"),
        );
        assert_eq!(out, "hi Ann");
    }

    #[test]
    fn test_include_shares_and_isolates() {
        let templates = vec![
            Template::new("page").with_body(vec![
                ForLoop::new("x", Expr::var("items"), vec![Include::new("row")
                    .with(Expr::map([("extra", Expr::constant("!"))]))
                    .into()])
                .into(),
                Include::new("cell").only().into(),
            ]),
            Template::new("row").with_body(vec![
                Node::print(Expr::var("x")),
                Node::print(Expr::var("loop").attr("index")),
                Node::print(Expr::var("extra")),
                Node::text(";"),
            ]),
            Template::new("cell").with_body(vec![
                Node::text("["),
                Node::print(Expr::var("items")),
                Node::text("]"),
            ]),
        ];
        let out = render(templates, "page", Context::new().with("items", vec!["a", "b"]));
        assert_eq!(out, "a1!;b2!;[]");
    }

    #[test]
    fn test_include_ignore_missing() {
        let templates = vec![Template::new("page").with_body(vec![
            Include::new("missing").ignore_missing().into(),
            Node::text("ok"),
        ])];
        assert_eq!(render(templates, "page", Context::new()), "ok");

        let err = engine(vec![Template::new("page").with_body(vec![Node::include("missing")])])
            .render("page", Context::new())
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TemplateNotFound { name } if name == "missing"));
    }

    #[test]
    fn test_include_recursion_limit() {
        let config = EngineConfig::default().with_max_include_depth(3);
        let registry: TemplateRegistry =
            vec![Template::new("self").with_body(vec![Node::include("self")])]
                .into_iter()
                .collect();
        let err = Engine::with_config(registry, config)
            .render("self", Context::new())
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::RecursionLimit { limit: 3 }));
    }

    #[test]
    fn test_render_serialize() {
        #[derive(serde::Serialize)]
        struct Data {
            title: &'static str,
        }
        let e = engine(vec![Template::new("t").with_body(vec![Node::print(Expr::var("title"))])]);
        assert_eq!(e.render_serialize("t", &Data { title: "API" }).unwrap(), "API");
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }
}
