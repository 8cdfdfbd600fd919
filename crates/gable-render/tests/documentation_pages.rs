//! End-to-end renders of documentation-site templates: an HTML page layout
//! with includes, and a JavaScript search index.

use gable_render::{
    AutoEscape, Context, Engine, EngineConfig, ErrorKind, Expr, ForLoop, If, Include, Node,
    Object, Template, TemplateRegistry, Value,
};

/// A documented element as the host application exposes it.
#[derive(Debug, Clone)]
struct Element {
    fqsen: String,
    name: String,
    summary: String,
}

impl Element {
    fn new(fqsen: &str, name: &str, summary: &str) -> Self {
        Self {
            fqsen: fqsen.to_string(),
            name: name.to_string(),
            summary: summary.to_string(),
        }
    }
}

impl Object for Element {
    fn get_field(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(Value::from(self.name.as_str())),
            "summary" => Some(Value::from(self.summary.as_str())),
            _ => None,
        }
    }

    fn call_method(&self, name: &str) -> Option<Value> {
        match name {
            "getFullyQualifiedStructuralElementName" => Some(Value::from(self.fqsen.as_str())),
            _ => None,
        }
    }
}

fn element_value(element: &Element) -> Value {
    Value::from_object(element.clone())
}

fn escaped_attr(name: &str) -> Expr {
    Expr::var("element").attr(name).escape("js").escape("html")
}

fn search_index() -> Template {
    let entry = vec![
        Node::Line(4),
        Node::text("        {\n            \"fqsen\": \""),
        Node::print(escaped_attr("fullyQualifiedStructuralElementName")),
        Node::text("\",\n            \"name\": \""),
        Node::print(escaped_attr("name")),
        Node::text("\",\n            \"summary\": \""),
        Node::print(escaped_attr("summary")),
        Node::text("\",\n            \"url\": \""),
        Node::print(Expr::call("link", vec![Expr::var("element")]).escape("html")),
        Node::text("\"\n        }"),
        If::new(!Expr::var("loop").attr("last"), vec![Node::text(",")]).into(),
        Node::text("        "),
    ];
    Template::new("js/searchIndex.js.twig").with_body(vec![
        Node::text("Search.appendIndex(\n    [\n        "),
        ForLoop::new(
            "element",
            Expr::var("project").attr("indexes").attr("elements"),
            entry,
        )
        .into(),
        Node::text("    ]\n);\n"),
    ])
}

fn link(args: &[Value]) -> Result<Value, ErrorKind> {
    let element = args
        .first()
        .ok_or_else(|| ErrorKind::InvalidOperation("link() expects an element".into()))?;
    let fqsen = element
        .get_attr("fullyQualifiedStructuralElementName")?
        .to_string();
    let slug = fqsen.trim_start_matches('\\').replace('\\', "-");
    Ok(Value::from(format!("classes/{slug}.html")))
}

fn project(elements: &[Element]) -> Value {
    let elements: Vec<Value> = elements.iter().map(element_value).collect();
    let mut indexes = gable_render::Map::new();
    indexes.insert("elements".into(), Value::from(elements));
    let mut project = gable_render::Map::new();
    project.insert("name".into(), Value::from("Documentation"));
    project.insert("indexes".into(), Value::from(indexes));
    Value::from(project)
}

fn search_engine() -> Engine {
    let mut registry = TemplateRegistry::new();
    registry.add(search_index());
    let mut engine = Engine::new(registry);
    engine.add_function("link", link);
    engine
}

#[test]
fn search_index_single_element() {
    let context = Context::new().with("project", project(&[Element::new("A\\B", "B", "desc")]));
    let out = search_engine()
        .render("js/searchIndex.js.twig", context)
        .unwrap();
    let expected = "Search.appendIndex(\n    [\n                {\n            \"fqsen\": \"A\\\\B\",\n            \"name\": \"B\",\n            \"summary\": \"desc\",\n            \"url\": \"classes/A-B.html\"\n        }            ]\n);\n";
    assert_eq!(out, expected);
}

#[test]
fn search_index_separates_entries() {
    let context = Context::new().with(
        "project",
        project(&[
            Element::new("\\App\\First", "First", ""),
            Element::new("\\App\\Second", "Second", ""),
        ]),
    );
    let out = search_engine()
        .render("/js/searchIndex.js.twig", context)
        .unwrap();
    assert_eq!(out.matches("\"fqsen\"").count(), 2);
    assert!(out.contains("\"url\": \"classes/App-First.html\"\n        },                {"));
    assert!(out.contains("\"url\": \"classes/App-Second.html\"\n        }            ]"));
}

#[test]
fn search_index_escapes_for_javascript() {
    let context = Context::new().with(
        "project",
        project(&[Element::new("A\\B", "B", "Returns \"x\" & <y>")]),
    );
    let out = search_engine()
        .render("js/searchIndex.js.twig", context)
        .unwrap();
    assert!(out.contains(
        "\"summary\": \"Returns\\u0020\\u0022x\\u0022\\u0020\\u0026\\u0020\\u003Cy\\u003E\""
    ));
}

#[test]
fn search_index_empty_project() {
    let out = search_engine()
        .render("js/searchIndex.js.twig", Context::new().with("project", project(&[])))
        .unwrap();
    assert_eq!(out, "Search.appendIndex(\n    [\n            ]\n);\n");
}

#[test]
fn search_index_without_project_fails() {
    let err = search_engine()
        .render("js/searchIndex.js.twig", Context::new())
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::AttributeError { attribute } if attribute == "indexes"));
    assert_eq!(err.template_name(), "js/searchIndex.js.twig");
}

fn site() -> TemplateRegistry {
    let mut registry = TemplateRegistry::new();
    registry.add(
        Template::new("base.html.twig")
            .with_body(vec![
                Node::text("<title>"),
                Node::block("title"),
                Node::text("</title>"),
                Node::include("sidebar.html.twig"),
                Node::text("<main>"),
                Node::block("content"),
                Node::text("</main>"),
            ])
            .with_block(
                "title",
                vec![Node::print(Expr::var("project").attr("name"))],
            ),
    );
    registry.add(Template::new("sidebar.html.twig").with_body(vec![
        Node::text("<nav>"),
        ForLoop::new(
            "namespace",
            Expr::var("namespaces"),
            vec![Include::new("menu.html.twig")
                .with(Expr::map([("menuItem", Expr::var("namespace"))]))
                .only()
                .into()],
        )
        .into(),
        Node::text("</nav>"),
    ]));
    registry.add(Template::new("menu.html.twig").with_body(vec![
        Node::text("<a>"),
        Node::print(Expr::var("menuItem").attr("name")),
        Node::print(Expr::var("project").filter("default", vec![Expr::constant("")])),
        Node::text("</a>"),
    ]));
    registry.add(
        Template::new("/index.html.twig")
            .extends("base.html.twig")
            .with_block(
                "title",
                vec![Node::ParentBlock, Node::text(" - Overview")],
            )
            .with_block(
                "content",
                vec![
                    Node::text("<h2>"),
                    Node::print(Expr::var("project").attr("name")),
                    Node::text("</h2>"),
                    Node::Include(Include::new("breadcrumbs.html.twig").ignore_missing()),
                ],
            ),
    );
    registry
}

fn site_context() -> Context {
    Context::from_json(
        r#"{
            "project": {"name": "Docs & API"},
            "namespaces": [{"name": "App"}, {"name": "App<Tests>"}]
        }"#,
    )
    .unwrap()
}

#[test]
fn index_page_renders_layout_with_includes() {
    let engine = Engine::new(site());
    let out = engine.render("index.html.twig", site_context()).unwrap();
    assert_eq!(
        out,
        "<title>Docs &amp; API - Overview</title>\
         <nav><a>App</a><a>App&lt;Tests&gt;</a></nav>\
         <main><h2>Docs &amp; API</h2></main>"
    );
}

#[test]
fn layout_renders_alone() {
    let engine = Engine::new(site());
    let out = engine.render("base.html.twig", site_context()).unwrap();
    assert_eq!(
        out,
        "<title>Docs &amp; API</title>\
         <nav><a>App</a><a>App&lt;Tests&gt;</a></nav>\
         <main></main>"
    );
}

#[test]
fn autoescape_by_name_leaves_text_templates_raw() {
    let mut registry = site();
    registry.add(
        Template::new("README.txt")
            .with_body(vec![Node::print(Expr::var("project").attr("name"))]),
    );
    let config = EngineConfig::default().with_autoescape(AutoEscape::ByName);
    let engine = Engine::with_config(registry, config);
    assert_eq!(engine.render("README.txt", site_context()).unwrap(), "Docs & API");
    assert!(engine
        .render("index.html.twig", site_context())
        .unwrap()
        .contains("Docs &amp; API"));
}

#[test]
fn failed_render_produces_no_output() {
    let mut registry = site();
    registry.add(
        Template::new("broken.html.twig")
            .extends("base.html.twig")
            .with_block("content", vec![Node::print(Expr::var("missing").attr("x"))]),
    );
    let engine = Engine::new(registry);
    let result = engine.render("broken.html.twig", site_context());
    let err = result.unwrap_err();
    assert_eq!(err.template_name(), "broken.html.twig");
}
