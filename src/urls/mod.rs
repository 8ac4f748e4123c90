//! URL extraction from parsed JavaScript.
//!
//! Two passes over the tree: `symbols` records bindings, then the driver
//! here walks string-producing expressions, reduces each through `eval`,
//! normalizes route parameters, expands HTML-embedded URLs, filters junk,
//! and emits the survivors deduplicated in discovery order.

pub mod aliases;
pub mod context;
pub mod eval;
pub mod filters;
pub mod literal;
pub mod routes;
pub mod symbols;

use anyhow::Result;
use std::collections::HashSet;
use tree_sitter::Node;

use crate::html::{self, HtmlBackend};
use crate::parser::{SourceUnit, node_text};
use context::{ContextMap, ContextPolicy};
use eval::Evaluator;
use symbols::{PROGRAM_SCOPE, ScopeId, SymbolTable, SymbolTableBuilder};

/// Everything the extraction pipeline can be told from the outside.
#[derive(Debug)]
pub struct UrlConfig {
    /// Token substituted for unresolved values.
    pub placeholder: String,
    /// Emit `{name}`-form templates alongside placeholder forms.
    pub include_templates: bool,
    /// Print candidates as they are discovered.
    pub verbose: bool,
    /// Node-visit budget shared by both passes.
    pub max_nodes: usize,
    /// Above this size the symbol pass is skipped.
    pub max_file_size_mb: f64,
    pub html_parser: HtmlBackend,
    pub skip_symbols: bool,
    pub skip_aliases: bool,
    /// Extra URL path extensions retained by the filter.
    pub extensions: HashSet<String>,
    pub context: Option<ContextMap>,
    pub context_policy: ContextPolicy,
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            placeholder: "FUZZ".to_string(),
            include_templates: false,
            verbose: false,
            max_nodes: 1_000_000,
            max_file_size_mb: 1.0,
            html_parser: HtmlBackend::default(),
            skip_symbols: false,
            skip_aliases: false,
            extensions: HashSet::new(),
            context: None,
            context_policy: ContextPolicy::Merge,
        }
    }
}

/// Counts node visits against the configured ceiling. Exhaustion warns
/// once on stderr; extraction then returns whatever was collected.
pub struct NodeBudget {
    visited: usize,
    max: usize,
    warned: bool,
}

impl NodeBudget {
    pub fn new(max: usize) -> Self {
        Self {
            visited: 0,
            max,
            warned: false,
        }
    }

    pub fn spend(&mut self) -> bool {
        self.visited += 1;
        if self.visited > self.max {
            if !self.warned {
                eprintln!(
                    "urx: Warning: stopped after visiting {} nodes; file may be too large or complex",
                    self.max
                );
                self.warned = true;
            }
            return false;
        }
        true
    }

    pub fn reset(&mut self) {
        self.visited = 0;
    }

    pub fn exhausted(&self) -> bool {
        self.visited > self.max
    }
}

/// Runs the full pipeline over one source unit and returns the
/// deduplicated candidates in first-discovery order.
pub fn extract_urls(unit: &SourceUnit, config: &UrlConfig) -> Result<Vec<String>> {
    let file_size_mb = unit.byte_len() as f64 / (1024.0 * 1024.0);
    let large_file = file_size_mb > config.max_file_size_mb;
    let context_provided = config
        .context
        .as_ref()
        .map(|context| !context.is_empty())
        .unwrap_or(false);

    // context forces symbol resolution even for oversized files
    let skip_symbols = config.skip_symbols || (large_file && !context_provided);
    let skip_pass1 =
        skip_symbols || (context_provided && config.context_policy == ContextPolicy::Only);

    if config.verbose && large_file {
        if context_provided {
            eprintln!("urx: large file ({file_size_mb:.1}MB): context provided, forcing symbol resolution");
        } else {
            eprintln!("urx: large file ({file_size_mb:.1}MB): skipping symbol resolution");
        }
    }

    let mut budget = NodeBudget::new(config.max_nodes);
    let table = if skip_pass1 {
        SymbolTable::seeded(config.context.as_ref(), config.context_policy)
    } else {
        SymbolTableBuilder::build(unit, config, config.context.as_ref(), &mut budget)
    };
    budget.reset();

    let mut extractor = Extractor {
        config,
        table: &table,
        // with context in play the seeded table still resolves names;
        // otherwise a skipped pass 1 leaves identifiers unresolvable
        degraded: skip_pass1 && !context_provided,
        symbols_recorded: !skip_pass1,
        skip_aliases: config.skip_aliases || large_file,
        results: Vec::new(),
        seen: HashSet::new(),
        budget,
        html_depth: 0,
    };
    extractor.walk(unit.root(), unit.source(), PROGRAM_SCOPE);
    Ok(extractor.results)
}

/// Expression kinds whose value pass 1 already recorded on the binding;
/// re-emitting them at the declaration site would only surface fragments
/// of values that appear assembled at their use sites.
fn is_recorded_literal(kind: &str) -> bool {
    matches!(
        kind,
        "string" | "number" | "regex" | "true" | "false" | "null" | "undefined"
    )
}

fn is_function_like(kind: &str) -> bool {
    matches!(
        kind,
        "function" | "function_expression" | "generator_function" | "arrow_function"
    )
}

const URL_SINK_PROPERTIES: &[&str] = &["location", "href", "src", "action"];
const URL_SINK_ATTRIBUTES: &[&str] = &["href", "src", "action", "formaction", "data"];

struct Extractor<'a> {
    config: &'a UrlConfig,
    table: &'a SymbolTable,
    degraded: bool,
    /// When pass 1 ran, binding initializers were recorded and are not
    /// re-emitted at the declaration site.
    symbols_recorded: bool,
    skip_aliases: bool,
    results: Vec<String>,
    seen: HashSet<String>,
    budget: NodeBudget,
    html_depth: usize,
}

impl<'a> Extractor<'a> {
    fn walk<'t>(&mut self, root: Node<'t>, source: &str, scope: ScopeId) {
        let mut stack: Vec<(Node<'t>, ScopeId)> = vec![(root, scope)];
        while let Some((node, scope)) = stack.pop() {
            if !self.budget.spend() {
                return;
            }
            let scope = self
                .table
                .scope_for_range((node.start_byte(), node.end_byte()))
                .unwrap_or(scope);
            match node.kind() {
                "string" => self.extract_root(node, source, scope),
                "template_string" => self.extract_root(node, source, scope),
                "binary_expression" => {
                    let operator = node
                        .child_by_field_name("operator")
                        .map(|op| crate::parser::raw_text(op, source).to_string())
                        .unwrap_or_default();
                    if operator == "+" {
                        self.extract_root(node, source, scope);
                    } else {
                        push_children(&mut stack, node, scope);
                    }
                }
                "variable_declarator" => {
                    if let Some(value) = node.child_by_field_name("value") {
                        self.consume_value(&mut stack, value, source, scope);
                    }
                }
                "assignment_expression" => {
                    self.handle_assignment(&mut stack, node, source, scope);
                }
                "call_expression" => {
                    self.handle_call(&mut stack, node, source, scope);
                }
                "comment" | "hash_bang_line" => {
                    self.process_comment(node, source, scope);
                }
                // candidates inside parse-error subtrees are not retained
                "ERROR" => {}
                _ => push_children(&mut stack, node, scope),
            }
        }
    }

    /// A value recorded by pass 1 is not re-emitted at its binding site,
    /// but code hiding inside it (object methods, callbacks) still gets
    /// walked.
    fn consume_value<'t>(
        &mut self,
        stack: &mut Vec<(Node<'t>, ScopeId)>,
        value: Node<'t>,
        source: &str,
        scope: ScopeId,
    ) {
        if !self.symbols_recorded {
            match value.kind() {
                "identifier" => {}
                "array" | "object" => push_children(stack, value, scope),
                _ => self.extract_root(value, source, scope),
            }
            return;
        }
        match value.kind() {
            "string" => self.scan_recorded_string(value, source),
            kind if is_recorded_literal(kind) => {}
            "array" | "object" => self.push_structure_children(stack, value, source, scope),
            "identifier" => {}
            _ => self.extract_root(value, source, scope),
        }
    }

    /// A string folded into a binding still gets scanned for markup and
    /// embedded URLs; only the bare value itself is deferred to its use
    /// sites.
    fn scan_recorded_string(&mut self, node: Node<'_>, source: &str) {
        let text = literal::decode_string_literal(crate::parser::raw_text(node, source));
        if html::looks_like_html(&text) && self.html_depth < 4 {
            self.expand_html(&text);
            return;
        }
        for url in filters::embedded_urls(&text) {
            self.offer(&url);
        }
    }

    fn push_structure_children<'t>(
        &mut self,
        stack: &mut Vec<(Node<'t>, ScopeId)>,
        node: Node<'t>,
        source: &str,
        scope: ScopeId,
    ) {
        let mut cursor = node.walk();
        let mut interesting: Vec<Node<'t>> = Vec::new();
        let mut recorded: Vec<Node<'t>> = Vec::new();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "pair" => {
                    if let Some(value) = child.child_by_field_name("value") {
                        match value.kind() {
                            "string" => recorded.push(value),
                            kind if is_recorded_literal(kind) => {}
                            "identifier" => {}
                            _ => interesting.push(value),
                        }
                    }
                }
                "string" => recorded.push(child),
                kind if is_recorded_literal(kind) => {}
                "shorthand_property_identifier" => {}
                _ => interesting.push(child),
            }
        }
        for node in recorded {
            self.scan_recorded_string(node, source);
        }
        interesting.reverse();
        for child in interesting {
            if child.kind() == "array" || child.kind() == "object" {
                self.push_structure_children(stack, child, source, scope);
            } else {
                stack.push((child, scope));
            }
        }
    }

    fn handle_assignment<'t>(
        &mut self,
        stack: &mut Vec<(Node<'t>, ScopeId)>,
        node: Node<'t>,
        source: &str,
        scope: ScopeId,
    ) {
        let Some(right) = node.child_by_field_name("right") else {
            return;
        };
        let sink = node
            .child_by_field_name("left")
            .map(|left| {
                let text = node_text(left, source);
                let last = text.rsplit('.').next().unwrap_or(&text);
                URL_SINK_PROPERTIES.contains(&last)
            })
            .unwrap_or(false);
        if sink {
            // assignments into location/href/src force evaluation even of
            // a bare identifier on the right
            self.extract_root(right, source, scope);
            return;
        }
        self.consume_value(stack, right, source, scope);
    }

    fn handle_call<'t>(
        &mut self,
        stack: &mut Vec<(Node<'t>, ScopeId)>,
        node: Node<'t>,
        source: &str,
        scope: ScopeId,
    ) {
        let Some(callee) = node.child_by_field_name("function") else {
            push_children(stack, node, scope);
            return;
        };
        if callee.kind() == "member_expression" {
            if let Some(property) = callee.child_by_field_name("property") {
                let method = node_text(property, source);
                if matches!(method.as_str(), "concat" | "join" | "replace" | "replaceAll") {
                    self.extract_root(node, source, scope);
                    return;
                }
            }
        }
        if let Some(arg_index) = self.url_sink_argument(node, callee, source) {
            let args = named_arguments(node);
            for (index, arg) in args.iter().enumerate() {
                if index == arg_index && !is_function_like(arg.kind()) {
                    self.extract_root(*arg, source, scope);
                } else {
                    stack.push((*arg, scope));
                }
            }
            return;
        }
        push_children(stack, node, scope);
    }

    /// Calls whose argument is known to carry a URL: `fetch(u)`,
    /// `xhr.open(method, u)`, `el.setAttribute("href", u)`, axios-style
    /// method calls.
    fn url_sink_argument(&self, node: Node<'_>, callee: Node<'_>, source: &str) -> Option<usize> {
        match callee.kind() {
            "identifier" => {
                let name = node_text(callee, source);
                (name == "fetch").then_some(0)
            }
            "member_expression" => {
                let property = callee.child_by_field_name("property")?;
                match node_text(property, source).as_str() {
                    "fetch" => Some(0),
                    "open" => Some(1),
                    "setAttribute" => {
                        let args = named_arguments(node);
                        let first = args.first()?;
                        if first.kind() != "string" {
                            return None;
                        }
                        let attr = literal::decode_string_literal(crate::parser::raw_text(
                            *first, source,
                        ));
                        URL_SINK_ATTRIBUTES
                            .contains(&attr.as_str())
                            .then_some(1)
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Evaluates one expression root and emits every surviving candidate.
    fn extract_root(&mut self, node: Node<'_>, source: &str, scope: ScopeId) {
        let evaluator = Evaluator::new(
            source,
            self.table,
            &self.config.placeholder,
            self.skip_aliases,
            self.degraded,
        );
        let out = evaluator.eval(node, scope);
        self.emit(out);
    }

    fn emit(&mut self, out: eval::EvalOutput) {
        let (template, route_params) = routes::convert_route_params(&out.template);
        let templated = out.templated || route_params;

        if !templated {
            self.offer_static(&template);
            return;
        }

        for combo in &out.combos {
            let (converted, _) = routes::convert_route_params(combo);
            let filled = filters::fill_placeholders(&converted, &self.config.placeholder);
            self.offer(&filled);
        }
        if self.config.include_templates {
            self.offer(&template);
            let filled = filters::fill_placeholders(&template, &self.config.placeholder);
            self.offer(&filled);
        }
    }

    /// Fully static candidates may hide markup or prose with embedded
    /// URLs; everything else goes straight through the filter.
    fn offer_static(&mut self, text: &str) {
        if html::looks_like_html(text) && self.html_depth < 4 {
            self.expand_html(text);
            return;
        }
        let cleaned = filters::clean_unbalanced_brackets(text);
        if filters::keeps(cleaned, &self.config.placeholder, &self.config.extensions) {
            self.push(cleaned.to_string());
            return;
        }
        for url in filters::embedded_urls(text) {
            self.offer(&url);
        }
    }

    fn offer(&mut self, text: &str) {
        let cleaned = filters::clean_unbalanced_brackets(text);
        if filters::keeps(cleaned, &self.config.placeholder, &self.config.extensions) {
            self.push(cleaned.to_string());
        }
    }

    /// HTML inside a string: URL-bearing attributes become candidates,
    /// inline scripts are parsed and traversed like any other source.
    /// The HTML string itself is never emitted.
    fn expand_html(&mut self, text: &str) {
        self.html_depth += 1;
        for value in html::extract_attribute_urls(text, self.config.html_parser) {
            let (converted, _) = routes::convert_route_params(&value);
            self.offer(&converted);
        }
        for script in html::extract_inline_scripts(text, self.config.html_parser) {
            if let Ok(unit) = SourceUnit::parse(script) {
                self.walk(unit.root(), unit.source(), PROGRAM_SCOPE);
            }
        }
        self.html_depth -= 1;
    }

    /// Comments often hold commented-out code; parse the marker-stripped
    /// text and traverse whatever it yields.
    fn process_comment(&mut self, node: Node<'_>, source: &str, scope: ScopeId) {
        let raw = crate::parser::raw_text(node, source);
        let stripped = strip_comment_markers(raw);
        if stripped.trim().is_empty() {
            return;
        }
        if let Ok(unit) = SourceUnit::parse(stripped.to_string()) {
            self.walk(unit.root(), unit.source(), scope);
        }
    }

    fn push(&mut self, text: String) {
        if text.is_empty() || !self.seen.insert(text.clone()) {
            return;
        }
        if self.config.verbose {
            println!("{text}");
        }
        self.results.push(text);
    }
}

fn push_children<'a>(stack: &mut Vec<(Node<'a>, ScopeId)>, node: Node<'a>, scope: ScopeId) {
    let mut cursor = node.walk();
    let mut children: Vec<Node<'a>> = node.named_children(&mut cursor).collect();
    children.reverse();
    for child in children {
        stack.push((child, scope));
    }
}

fn named_arguments<'a>(node: Node<'a>) -> Vec<Node<'a>> {
    let mut out = Vec::new();
    let Some(args) = node.child_by_field_name("arguments") else {
        return out;
    };
    let mut cursor = args.walk();
    for child in args.named_children(&mut cursor) {
        out.push(child);
    }
    out
}

fn strip_comment_markers(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(inner) = trimmed.strip_prefix("/*") {
        return inner.strip_suffix("*/").unwrap_or(inner).to_string();
    }
    if let Some(inner) = trimmed.strip_prefix("#!") {
        return inner.to_string();
    }
    let mut text = trimmed;
    while let Some(inner) = text.strip_prefix("//") {
        text = inner.trim_start();
    }
    text.to_string()
}
