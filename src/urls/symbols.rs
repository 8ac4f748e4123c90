//! Symbol table construction (pass 1).
//!
//! A single walk over the tree records variable bindings, object-literal
//! shapes, array elements, and property mutations under lexical scopes,
//! so the evaluator can resolve identifiers during extraction.

use std::collections::HashMap;
use tree_sitter::Node;

use super::aliases::{AliasTable, Confidence};
use super::context::{ContextMap, ContextPolicy};
use super::eval::Evaluator;
use super::literal;
use super::{NodeBudget, UrlConfig};
use crate::parser::{SourceUnit, node_text};

pub type ScopeId = usize;

pub const PROGRAM_SCOPE: ScopeId = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    Program,
    Function,
    Block,
    Catch,
}

#[derive(Debug)]
struct Scope {
    parent: Option<ScopeId>,
    kind: ScopeKind,
    symbols: HashMap<String, Symbol>,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub value: SymbolValue,
    pub scope: ScopeId,
}

/// A symbol's tracked value: concrete strings, an object shape, array
/// elements, or nothing statically derivable.
#[derive(Debug, Clone)]
pub enum SymbolValue {
    Strings(Vec<String>),
    Shape(ObjectShape),
    Array(Vec<ArrayElement>),
    Unresolved,
}

#[derive(Debug, Clone, Default)]
pub struct ObjectShape {
    entries: HashMap<String, ShapeValue>,
}

#[derive(Debug, Clone)]
pub enum ShapeValue {
    Strings(Vec<String>),
    Shape(ObjectShape),
    Unresolved,
}

/// One array element: resolved value choices, or a template token for a
/// position that could not be determined.
#[derive(Debug, Clone)]
pub enum ArrayElement {
    Strings(Vec<String>),
    Token(String),
}

impl ObjectShape {
    pub fn get(&self, key: &str) -> Option<&ShapeValue> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: &str, value: ShapeValue) {
        match (self.entries.get_mut(key), value) {
            (Some(ShapeValue::Strings(existing)), ShapeValue::Strings(values)) => {
                for value in values {
                    if !existing.contains(&value) {
                        existing.push(value);
                    }
                }
            }
            (_, value) => {
                self.entries.insert(key.to_string(), value);
            }
        }
    }

    /// Returns the nested shape at `key`, converting any previously
    /// recorded scalar into a shape.
    pub fn entry_shape(&mut self, key: &str) -> &mut ObjectShape {
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| ShapeValue::Shape(ObjectShape::default()));
        if !matches!(entry, ShapeValue::Shape(_)) {
            *entry = ShapeValue::Shape(ObjectShape::default());
        }
        match entry {
            ShapeValue::Shape(shape) => shape,
            _ => unreachable!(),
        }
    }
}

#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    by_range: HashMap<(usize, usize), ScopeId>,
    pub aliases: AliasTable,
    location: HashMap<String, String>,
    context_names: Vec<String>,
    policy: ContextPolicy,
}

impl SymbolTable {
    /// An empty table holding only context-seeded bindings; the starting
    /// point for pass 1 and the whole table in degraded or `only` mode.
    pub fn seeded(context: Option<&ContextMap>, policy: ContextPolicy) -> Self {
        let mut table = Self {
            scopes: vec![Scope {
                parent: None,
                kind: ScopeKind::Program,
                symbols: HashMap::new(),
            }],
            by_range: HashMap::new(),
            aliases: AliasTable::default(),
            location: HashMap::new(),
            context_names: Vec::new(),
            policy,
        };
        if let Some(context) = context {
            for (name, values) in &context.scalars {
                table.bind(
                    PROGRAM_SCOPE,
                    name.clone(),
                    SymbolValue::Strings(values.clone()),
                );
                table.context_names.push(name.clone());
            }
            for (name, shape) in &context.shapes {
                table.bind(
                    PROGRAM_SCOPE,
                    name.clone(),
                    SymbolValue::Shape(shape.clone()),
                );
                table.context_names.push(name.clone());
            }
            for (name, elements) in &context.arrays {
                let elements = elements
                    .iter()
                    .map(|value| ArrayElement::Strings(vec![value.clone()]))
                    .collect();
                table.bind(PROGRAM_SCOPE, name.clone(), SymbolValue::Array(elements));
                table.context_names.push(name.clone());
            }
            table.location = context.location.clone();
        }
        table
    }

    pub fn location_override(&self, prop: &str) -> Option<&str> {
        self.location.get(prop).map(String::as_str)
    }

    /// Scope opened by the node covering this byte range, if pass 1 saw
    /// one. Extraction over re-parsed comment or inline-script trees
    /// falls back to the program scope.
    pub fn scope_for_range(&self, range: (usize, usize)) -> Option<ScopeId> {
        self.by_range.get(&range).copied()
    }

    /// Resolves a name by walking the scope parent chain.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id];
            if let Some(symbol) = scope.symbols.get(name) {
                return Some(symbol);
            }
            current = scope.parent;
        }
        None
    }

    fn lookup_scope(&self, scope: ScopeId, name: &str) -> Option<ScopeId> {
        self.lookup(scope, name).map(|symbol| symbol.scope)
    }

    fn push_scope(&mut self, parent: ScopeId, kind: ScopeKind, range: (usize, usize)) -> ScopeId {
        let id = self.scopes.len();
        self.scopes.push(Scope {
            parent: Some(parent),
            kind,
            symbols: HashMap::new(),
        });
        self.by_range.insert(range, id);
        id
    }

    /// Nearest enclosing function or program scope, the hoisting target
    /// for `var` and function declarations.
    fn hoist_target(&self, scope: ScopeId) -> ScopeId {
        let mut current = scope;
        loop {
            match self.scopes[current].kind {
                ScopeKind::Program | ScopeKind::Function => return current,
                _ => match self.scopes[current].parent {
                    Some(parent) => current = parent,
                    None => return current,
                },
            }
        }
    }

    fn bind(&mut self, scope: ScopeId, name: String, value: SymbolValue) {
        let replace = self.policy == ContextPolicy::Override;
        let symbols = &mut self.scopes[scope].symbols;
        match symbols.get_mut(&name) {
            Some(existing) if !replace => match (&mut existing.value, value) {
                (SymbolValue::Strings(current), SymbolValue::Strings(values)) => {
                    for value in values {
                        if !current.contains(&value) {
                            current.push(value);
                        }
                    }
                }
                (_, SymbolValue::Unresolved) => {}
                (slot, value) => *slot = value,
            },
            _ => {
                symbols.insert(name, Symbol { value, scope });
            }
        }
    }

    fn context_defines(&self, name: &str) -> bool {
        self.context_names.iter().any(|known| known == name)
    }
}

/// Walks the tree once and records every binding the evaluator can use.
pub struct SymbolTableBuilder<'a> {
    source: &'a str,
    config: &'a UrlConfig,
    table: SymbolTable,
}

impl<'a> SymbolTableBuilder<'a> {
    pub fn build(
        unit: &'a SourceUnit,
        config: &'a UrlConfig,
        context: Option<&ContextMap>,
        budget: &mut NodeBudget,
    ) -> SymbolTable {
        let mut builder = Self {
            source: unit.source(),
            config,
            table: SymbolTable::seeded(context, config.context_policy),
        };
        let root = unit.root();
        builder
            .table
            .by_range
            .insert((root.start_byte(), root.end_byte()), PROGRAM_SCOPE);
        builder.walk(root, budget);
        builder.table
    }

    fn walk(&mut self, root: Node<'a>, budget: &mut NodeBudget) {
        let mut stack: Vec<(Node<'a>, ScopeId)> = vec![(root, PROGRAM_SCOPE)];
        while let Some((node, scope)) = stack.pop() {
            if !budget.spend() {
                return;
            }
            let scope = self.enter_scope(node, scope);
            match node.kind() {
                "lexical_declaration" | "variable_declaration" => {
                    let hoisted = node.kind() == "variable_declaration";
                    let mut cursor = node.walk();
                    for child in node.named_children(&mut cursor) {
                        if child.kind() == "variable_declarator" {
                            self.bind_declarator(child, scope, hoisted);
                        }
                    }
                }
                "assignment_expression" => self.record_assignment(node, scope),
                "function_declaration" | "generator_function_declaration" => {
                    if let Some(name_node) = node.child_by_field_name("name") {
                        let name = node_text(name_node, self.source);
                        if !name.is_empty() {
                            let target = self.table.hoist_target(scope);
                            self.table.bind(target, name, SymbolValue::Unresolved);
                        }
                    }
                }
                "object" => self.record_pair_aliases(node, false),
                "object_pattern" => self.record_pair_aliases(node, true),
                "call_expression" => self.record_param_call_alias(node),
                _ => {}
            }
            let mut cursor = node.walk();
            let mut children: Vec<Node<'a>> = node.named_children(&mut cursor).collect();
            children.reverse();
            for child in children {
                stack.push((child, scope));
            }
        }
    }

    /// Opens a new scope for scope-creating nodes and binds function
    /// parameters into it.
    fn enter_scope(&mut self, node: Node<'a>, scope: ScopeId) -> ScopeId {
        let range = (node.start_byte(), node.end_byte());
        match node.kind() {
            "statement_block" => {
                let kind = match node.parent().map(|parent| parent.kind()) {
                    Some(
                        "function_declaration"
                        | "generator_function_declaration"
                        | "function"
                        | "function_expression"
                        | "generator_function"
                        | "method_definition"
                        | "arrow_function",
                    ) => ScopeKind::Function,
                    _ => ScopeKind::Block,
                };
                let id = self.table.push_scope(scope, kind, range);
                if kind == ScopeKind::Function {
                    if let Some(parent) = node.parent() {
                        self.bind_parameters(parent, id);
                    }
                }
                id
            }
            "arrow_function" => {
                let id = self.table.push_scope(scope, ScopeKind::Function, range);
                self.bind_parameters(node, id);
                id
            }
            "catch_clause" => self.table.push_scope(scope, ScopeKind::Catch, range),
            _ => scope,
        }
    }

    fn bind_parameters(&mut self, function: Node<'a>, scope: ScopeId) {
        let Some(params) = function
            .child_by_field_name("parameters")
            .or_else(|| function.child_by_field_name("parameter"))
        else {
            return;
        };
        let mut stack = vec![params];
        while let Some(node) = stack.pop() {
            match node.kind() {
                "identifier" | "shorthand_property_identifier_pattern" => {
                    let name = node_text(node, self.source);
                    if !name.is_empty() {
                        self.table.bind(scope, name, SymbolValue::Unresolved);
                    }
                }
                _ => {
                    let mut cursor = node.walk();
                    for child in node.named_children(&mut cursor) {
                        stack.push(child);
                    }
                }
            }
        }
    }

    fn bind_declarator(&mut self, node: Node<'a>, scope: ScopeId, hoisted: bool) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        if name_node.kind() != "identifier" {
            // destructuring patterns contribute aliases, not bindings
            return;
        }
        let name = node_text(name_node, self.source);
        if name.is_empty() || self.skip_file_value(&name) {
            return;
        }
        let target = if hoisted {
            self.table.hoist_target(scope)
        } else {
            scope
        };
        let Some(value_node) = node.child_by_field_name("value") else {
            self.table.bind(target, name, SymbolValue::Unresolved);
            return;
        };
        if value_node.kind() == "identifier" {
            let referent = node_text(value_node, self.source);
            if !referent.is_empty() {
                self.table.aliases.add(&name, &referent, Confidence::Medium);
            }
        }
        let value = self.value_of(value_node, scope);
        self.table.bind(target, name, value);
    }

    fn record_assignment(&mut self, node: Node<'a>, scope: ScopeId) {
        let Some(left) = node.child_by_field_name("left") else {
            return;
        };
        let Some(right) = node.child_by_field_name("right") else {
            return;
        };
        match left.kind() {
            "identifier" => {
                let name = node_text(left, self.source);
                if name.is_empty() || self.skip_file_value(&name) {
                    return;
                }
                if right.kind() == "identifier" {
                    let referent = node_text(right, self.source);
                    if !referent.is_empty() {
                        self.table.aliases.add(&name, &referent, Confidence::Medium);
                    }
                }
                let value = self.value_of(right, scope);
                let target = self
                    .table
                    .lookup_scope(scope, &name)
                    .unwrap_or(scope);
                self.table.bind(target, name, value);
            }
            "member_expression" | "subscript_expression" => {
                self.record_member_assignment(left, right, scope);
            }
            _ => {}
        }
    }

    fn record_member_assignment(&mut self, left: Node<'a>, right: Node<'a>, scope: ScopeId) {
        let Some((root, path)) = self.member_path(left) else {
            return;
        };
        if path.is_empty() {
            return;
        }
        let values = match self.value_of(right, scope) {
            SymbolValue::Strings(values) => values,
            _ => return,
        };
        let target = self.table.lookup_scope(scope, &root).unwrap_or(scope);
        let symbols = &mut self.table.scopes[target].symbols;
        let symbol = symbols.entry(root).or_insert(Symbol {
            value: SymbolValue::Shape(ObjectShape::default()),
            scope: target,
        });
        if !matches!(symbol.value, SymbolValue::Shape(_)) {
            symbol.value = SymbolValue::Shape(ObjectShape::default());
        }
        let SymbolValue::Shape(shape) = &mut symbol.value else {
            return;
        };
        let mut current = shape;
        for segment in &path[..path.len() - 1] {
            current = current.entry_shape(segment);
        }
        let last = &path[path.len() - 1];
        if matches!(current.get(last), Some(ShapeValue::Shape(_))) {
            return;
        }
        current.insert(last, ShapeValue::Strings(values));
    }

    /// Builds the dotted path of a member or subscript chain rooted at an
    /// identifier: `a.b["c"]` becomes `("a", ["b", "c"])`.
    fn member_path(&self, node: Node<'a>) -> Option<(String, Vec<String>)> {
        let mut path = Vec::new();
        let mut current = node;
        loop {
            match current.kind() {
                "member_expression" => {
                    let property = current.child_by_field_name("property")?;
                    path.push(node_text(property, self.source));
                    current = current.child_by_field_name("object")?;
                }
                "subscript_expression" => {
                    let index = current.child_by_field_name("index")?;
                    if index.kind() != "string" {
                        return None;
                    }
                    let raw = crate::parser::raw_text(index, self.source);
                    path.push(literal::decode_string_literal(raw));
                    current = current.child_by_field_name("object")?;
                }
                "identifier" | "this" => {
                    let root = node_text(current, self.source);
                    path.reverse();
                    return Some((root, path));
                }
                _ => return None,
            }
        }
    }

    fn value_of(&self, node: Node<'a>, scope: ScopeId) -> SymbolValue {
        match node.kind() {
            "array" => SymbolValue::Array(self.array_elements(node, scope)),
            "object" => SymbolValue::Shape(self.object_shape(node, scope)),
            _ => {
                let evaluator = self.evaluator();
                let out = evaluator.eval(node, scope);
                if out.templated
                    && out
                        .combos
                        .iter()
                        .all(|combo| combo == &self.config.placeholder)
                {
                    SymbolValue::Unresolved
                } else {
                    SymbolValue::Strings(out.combos)
                }
            }
        }
    }

    fn array_elements(&self, node: Node<'a>, scope: ScopeId) -> Vec<ArrayElement> {
        let mut elements = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            let evaluator = self.evaluator();
            let out = evaluator.eval(child, scope);
            if out.templated
                && out
                    .combos
                    .iter()
                    .all(|combo| combo == &self.config.placeholder)
            {
                elements.push(ArrayElement::Token(out.template));
            } else {
                elements.push(ArrayElement::Strings(out.combos));
            }
        }
        elements
    }

    fn object_shape(&self, node: Node<'a>, scope: ScopeId) -> ObjectShape {
        let mut shape = ObjectShape::default();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() != "pair" {
                continue;
            }
            let Some(key_node) = child.child_by_field_name("key") else {
                continue;
            };
            let Some(key) = self.property_key(key_node, scope) else {
                continue;
            };
            let Some(value_node) = child.child_by_field_name("value") else {
                continue;
            };
            match value_node.kind() {
                "object" => {
                    let nested = self.object_shape(value_node, scope);
                    shape.insert(&key, ShapeValue::Shape(nested));
                }
                "array" | "function" | "function_expression" | "arrow_function" => {
                    shape.insert(&key, ShapeValue::Unresolved);
                }
                _ => {
                    let evaluator = self.evaluator();
                    let out = evaluator.eval(value_node, scope);
                    if out.templated
                        && out
                            .combos
                            .iter()
                            .all(|combo| combo == &self.config.placeholder)
                    {
                        shape.insert(&key, ShapeValue::Unresolved);
                    } else {
                        shape.insert(&key, ShapeValue::Strings(out.combos));
                    }
                }
            }
        }
        shape
    }

    /// A pair key used statically: plain and quoted names directly, and
    /// computed keys only when they reduce to a single literal string.
    fn property_key(&self, node: Node<'a>, scope: ScopeId) -> Option<String> {
        match node.kind() {
            "property_identifier" | "number" => Some(node_text(node, self.source)),
            "string" => Some(literal::decode_string_literal(crate::parser::raw_text(
                node,
                self.source,
            ))),
            "computed_property_name" => {
                let inner = node.named_child(0)?;
                let evaluator = self.evaluator();
                let out = evaluator.eval(inner, scope);
                if !out.templated && out.combos.len() == 1 {
                    out.combos.into_iter().next()
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn record_pair_aliases(&mut self, node: Node<'a>, pattern: bool) {
        let pair_kind = if pattern { "pair_pattern" } else { "pair" };
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() != pair_kind {
                continue;
            }
            let Some(key_node) = child.child_by_field_name("key") else {
                continue;
            };
            let Some(value_node) = child.child_by_field_name("value") else {
                continue;
            };
            if value_node.kind() != "identifier" {
                continue;
            }
            let key = node_text(key_node, self.source);
            let key = key.trim_matches(['"', '\'']);
            let value = node_text(value_node, self.source);
            if !key.is_empty() && !value.is_empty() {
                self.table.aliases.add(&value, key, Confidence::High);
            }
        }
    }

    /// `params.append('key', value)` and `params.set('key', value)`
    /// reveal the request-parameter name a variable feeds.
    fn record_param_call_alias(&mut self, node: Node<'a>) {
        let Some(callee) = node.child_by_field_name("function") else {
            return;
        };
        if callee.kind() != "member_expression" {
            return;
        }
        let Some(property) = callee.child_by_field_name("property") else {
            return;
        };
        let method = node_text(property, self.source);
        if method != "append" && method != "set" {
            return;
        }
        let Some(args) = node.child_by_field_name("arguments") else {
            return;
        };
        let mut cursor = args.walk();
        let named: Vec<Node<'a>> = args.named_children(&mut cursor).collect();
        let (Some(key_node), Some(value_node)) = (named.first(), named.get(1)) else {
            return;
        };
        if key_node.kind() != "string" || value_node.kind() != "identifier" {
            return;
        }
        let key = literal::decode_string_literal(crate::parser::raw_text(*key_node, self.source));
        let value = node_text(*value_node, self.source);
        if !key.is_empty() && !value.is_empty() {
            self.table.aliases.add(&value, &key, Confidence::High);
        }
    }

    fn skip_file_value(&self, name: &str) -> bool {
        self.config.context_policy == ContextPolicy::Override && self.table.context_defines(name)
    }

    fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::new(
            self.source,
            &self.table,
            &self.config.placeholder,
            self.config.skip_aliases,
            false,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SourceUnit;

    fn build(source: &str) -> SymbolTable {
        let unit = SourceUnit::parse(source.to_string()).unwrap();
        let config = UrlConfig::default();
        let mut budget = NodeBudget::new(config.max_nodes);
        SymbolTableBuilder::build(&unit, &config, None, &mut budget)
    }

    #[test]
    fn records_string_bindings() {
        let table = build(r#"const base = "/api";"#);
        let symbol = table.lookup(PROGRAM_SCOPE, "base").unwrap();
        match &symbol.value {
            SymbolValue::Strings(values) => assert_eq!(values, &vec!["/api".to_string()]),
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn merges_reassignments() {
        let table = build(r#"let env = "/dev"; env = "/prod";"#);
        let symbol = table.lookup(PROGRAM_SCOPE, "env").unwrap();
        match &symbol.value {
            SymbolValue::Strings(values) => {
                assert_eq!(values, &vec!["/dev".to_string(), "/prod".to_string()])
            }
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn records_object_shapes() {
        let table = build(r#"const cfg = { api: { base: "/v2" }, name: "svc" };"#);
        let symbol = table.lookup(PROGRAM_SCOPE, "cfg").unwrap();
        let SymbolValue::Shape(shape) = &symbol.value else {
            panic!("expected shape");
        };
        let Some(ShapeValue::Shape(api)) = shape.get("api") else {
            panic!("expected nested shape");
        };
        assert!(matches!(api.get("base"), Some(ShapeValue::Strings(_))));
    }

    #[test]
    fn records_member_assignments() {
        let table = build(r#"const cfg = {}; cfg.api = "/v2";"#);
        let symbol = table.lookup(PROGRAM_SCOPE, "cfg").unwrap();
        let SymbolValue::Shape(shape) = &symbol.value else {
            panic!("expected shape");
        };
        assert!(matches!(shape.get("api"), Some(ShapeValue::Strings(_))));
    }

    #[test]
    fn scopes_shadow_outer_bindings() {
        let table = build(
            r#"
const who = "/outer";
function inner() {
    const who = "/inner";
}
"#,
        );
        let symbol = table.lookup(PROGRAM_SCOPE, "who").unwrap();
        match &symbol.value {
            SymbolValue::Strings(values) => assert_eq!(values, &vec!["/outer".to_string()]),
            other => panic!("unexpected value: {other:?}"),
        }
        // the inner binding lives in a child scope
        assert!(table.scopes.len() > 1);
        let inner = table
            .scopes
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, scope)| scope.symbols.contains_key("who"))
            .map(|(id, _)| id)
            .unwrap();
        let shadowed = table.lookup(inner, "who").unwrap();
        match &shadowed.value {
            SymbolValue::Strings(values) => assert_eq!(values, &vec!["/inner".to_string()]),
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn var_declarations_hoist_to_function_scope() {
        let table = build(
            r#"
function outer() {
    if (true) {
        var hoisted = "/from-block";
    }
}
"#,
        );
        let function_scope = table
            .scopes
            .iter()
            .enumerate()
            .find(|(_, scope)| scope.kind == ScopeKind::Function)
            .map(|(id, _)| id)
            .unwrap();
        assert!(table.scopes[function_scope].symbols.contains_key("hoisted"));
    }

    #[test]
    fn records_array_elements() {
        let table = build(r#"const parts = ["/api", "/v2"];"#);
        let symbol = table.lookup(PROGRAM_SCOPE, "parts").unwrap();
        let SymbolValue::Array(elements) = &symbol.value else {
            panic!("expected array");
        };
        assert_eq!(elements.len(), 2);
    }
}
