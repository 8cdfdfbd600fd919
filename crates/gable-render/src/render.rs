//! Statement execution.
//!
//! A [`State`] lives for one render (or one include). It owns the output
//! buffer, the variable scope and the loop stack, and tracks which template
//! owns the nodes being executed so errors and auto-escaping use the right
//! name.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::trace;

use crate::ast::{Expr, ForLoop, If, Include, Node};
use crate::blocks::BlockTable;
use crate::context::{Frame, Scope};
use crate::engine::Engine;
use crate::error::{ErrorKind, RenderError, Result};
use crate::loops::LoopContext;
use crate::template::Template;
use crate::value::{Map, Value};

pub(crate) struct State<'e> {
    pub(crate) engine: &'e Engine,
    out: String,
    pub(crate) scope: Scope,
    pub(crate) loops: Vec<LoopContext>,
    template: Arc<Template>,
    line: Option<u32>,
    /// Blocks being displayed, innermost last, with their definition depth.
    active_blocks: Vec<(String, usize)>,
    /// Block displays in progress, including those outside the current include.
    block_depth: usize,
    include_depth: usize,
}

impl<'e> State<'e> {
    pub(crate) fn new(engine: &'e Engine, vars: Map, template: Arc<Template>) -> Self {
        Self {
            engine,
            out: String::new(),
            scope: Scope::new(vars),
            loops: Vec::new(),
            template,
            line: None,
            active_blocks: Vec::new(),
            block_depth: 0,
            include_depth: 0,
        }
    }

    pub(crate) fn into_output(self) -> String {
        self.out
    }

    /// Wraps `kind` with the current template name and line.
    pub(crate) fn error(&self, kind: ErrorKind) -> RenderError {
        RenderError::new(self.template.name(), self.line, kind)
    }

    /// Displays a resolved chain: the root's body, with blocks looked up in
    /// `blocks`.
    ///
    /// Top-level `set` nodes of the children run first, most-derived first,
    /// so their bindings are visible to the root and to every block. Other
    /// nodes in a child's body are ignored.
    pub(crate) fn display(&mut self, chain: &[Arc<Template>], blocks: &BlockTable) -> Result<()> {
        let Some((root, children)) = chain.split_last() else {
            return Ok(());
        };
        for child in children {
            let saved = self.enter(Arc::clone(child));
            let result = self.exec_sets(child.body());
            self.leave(saved);
            result?;
        }
        let saved = self.enter(Arc::clone(root));
        let result = self.exec(root.body(), blocks);
        self.leave(saved);
        result
    }

    /// Displays the definition of block `name` at `depth` in the table.
    /// A block without any definition renders nothing.
    pub(crate) fn display_block(
        &mut self,
        name: &str,
        depth: usize,
        blocks: &BlockTable,
    ) -> Result<()> {
        let Some(owner) = blocks.resolve_at(name, depth).cloned() else {
            trace!(block = name, depth, "block has no definition");
            return Ok(());
        };
        let limit = self.engine.config().max_block_depth;
        if self.block_depth >= limit {
            return Err(self.error(ErrorKind::RecursionLimit { limit }));
        }
        let body = owner.block(name).unwrap_or_default();
        trace!(block = name, template = owner.name(), depth, "display block");

        let saved = self.enter(Arc::clone(&owner));
        self.active_blocks.push((name.to_string(), depth));
        self.block_depth += 1;
        let result = self.exec(body, blocks);
        self.block_depth -= 1;
        self.active_blocks.pop();
        self.leave(saved);
        result
    }

    fn exec_sets(&mut self, nodes: &[Node]) -> Result<()> {
        for node in nodes {
            match node {
                Node::Line(line) => self.line = Some(*line),
                Node::Set { name, value } => {
                    let value = self.value(value)?;
                    self.scope.set(name, value);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn enter(&mut self, template: Arc<Template>) -> (Arc<Template>, Option<u32>) {
        let previous = std::mem::replace(&mut self.template, template);
        (previous, self.line.take())
    }

    fn leave(&mut self, (template, line): (Arc<Template>, Option<u32>)) {
        self.template = template;
        self.line = line;
    }

    fn exec(&mut self, nodes: &[Node], blocks: &BlockTable) -> Result<()> {
        for node in nodes {
            match node {
                Node::Text(text) => self.out.push_str(text),
                Node::Line(line) => self.line = Some(*line),
                Node::Print(expr) => {
                    let value = self.value(expr)?;
                    self.emit(&value)?;
                }
                Node::Raw(expr) => {
                    let value = self.value(expr)?;
                    let _ = write!(self.out, "{}", value);
                }
                Node::If(node) => self.exec_if(node, blocks)?,
                Node::For(node) => self.exec_for(node, blocks)?,
                Node::Set { name, value } => {
                    let value = self.value(value)?;
                    self.scope.set(name, value);
                }
                Node::Block(name) => self.display_block(name, 0, blocks)?,
                Node::ParentBlock => self.display_parent(blocks)?,
                Node::Include(include) => self.include(include)?,
            }
        }
        Ok(())
    }

    fn value(&self, expr: &Expr) -> Result<Value> {
        self.eval(expr).map_err(|kind| self.error(kind))
    }

    /// Prints `value` with the auto-escape strategy of the owning template.
    fn emit(&mut self, value: &Value) -> Result<()> {
        let engine = self.engine;
        let strategy = engine.config().autoescape.strategy_for(self.template.name());
        match (strategy, value) {
            (_, Value::Undefined | Value::Null) => {}
            (Some(_), Value::Bool(_) | Value::Int(_) | Value::Float(_)) | (None, _) => {
                let _ = write!(self.out, "{}", value);
            }
            (Some(strategy), _) => {
                let safe = engine
                    .escapers()
                    .apply(&value.to_markup(), strategy)
                    .map_err(|err| self.error(err.into()))?;
                self.out.push_str(safe.as_str());
            }
        }
        Ok(())
    }

    fn exec_if(&mut self, node: &If, blocks: &BlockTable) -> Result<()> {
        for (cond, body) in &node.branches {
            if self.value(cond)?.is_truthy() {
                return self.exec(body, blocks);
            }
        }
        self.exec(&node.otherwise, blocks)
    }

    fn exec_for(&mut self, node: &ForLoop, blocks: &BlockTable) -> Result<()> {
        let items = self.value(&node.seq)?.iterate();
        if items.is_empty() {
            return self.exec(&node.otherwise, blocks);
        }

        trace!(var = %node.value, length = items.len(), "enter loop");
        let ctx = LoopContext::begin(items.len(), self.loops.last());
        self.loops.push(ctx);
        let slot = self.loops.len() - 1;
        self.scope.push(Frame::for_loop(slot));

        let result = self.run_loop(node, items, slot, blocks);

        self.scope.pop();
        self.loops.pop();
        result
    }

    fn run_loop(
        &mut self,
        node: &ForLoop,
        items: Vec<(Value, Value)>,
        slot: usize,
        blocks: &BlockTable,
    ) -> Result<()> {
        for (position, (key, item)) in items.into_iter().enumerate() {
            if position > 0 {
                if let Some(ctx) = self.loops.get_mut(slot) {
                    ctx.advance();
                }
            }
            if let Some(key_name) = &node.key {
                self.scope.set(key_name, key);
            }
            self.scope.set(&node.value, item);
            self.exec(&node.body, blocks)?;
        }
        Ok(())
    }

    fn display_parent(&mut self, blocks: &BlockTable) -> Result<()> {
        let Some((name, depth)) = self.active_blocks.last().cloned() else {
            return Err(self.error(ErrorKind::InvalidOperation(
                "parent() can only be used inside a block".to_string(),
            )));
        };
        if blocks.resolve_at(&name, depth + 1).is_none() {
            return Err(self.error(ErrorKind::NoParentBlock { block: name }));
        }
        self.display_block(&name, depth + 1, blocks)
    }

    fn include(&mut self, include: &Include) -> Result<()> {
        let engine = self.engine;
        if include.ignore_missing && !engine.has_template(&include.template) {
            trace!(template = %include.template, "skip missing include");
            return Ok(());
        }
        let limit = engine.config().max_include_depth;
        if self.include_depth >= limit {
            return Err(self.error(ErrorKind::RecursionLimit { limit }));
        }

        let extra = match &include.with {
            Some(expr) => match self.value(expr)? {
                Value::Map(map) => Some(map),
                Value::Undefined | Value::Null => None,
                _ => {
                    return Err(self.error(ErrorKind::InvalidOperation(
                        "variables passed to an include must be a mapping".to_string(),
                    )))
                }
            },
            None => None,
        };
        let mut vars = if include.only {
            Map::new()
        } else {
            self.scope.flatten(&self.loops)
        };
        if let Some(extra) = extra {
            for (name, value) in extra.iter() {
                vars.insert(name.clone(), value.clone());
            }
        }

        let chain = engine
            .chain(&include.template)
            .map_err(|kind| self.error(kind))?;
        let table = BlockTable::from_chain(&chain);
        trace!(template = %include.template, only = include.only, "include");

        let saved_scope = std::mem::replace(&mut self.scope, Scope::new(vars));
        let saved_loops = std::mem::take(&mut self.loops);
        let saved_blocks = std::mem::take(&mut self.active_blocks);
        self.include_depth += 1;

        let result = self.display(&chain, &table);

        self.include_depth -= 1;
        self.active_blocks = saved_blocks;
        self.loops = saved_loops;
        self.scope = saved_scope;
        result
    }
}
