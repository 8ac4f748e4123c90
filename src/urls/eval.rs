//! Abstract evaluation of expressions into candidate string sets (pass 2).
//!
//! An expression reduces to every concrete string it could produce, plus
//! one template rendering where variables appear as `{name}` tokens.
//! Evaluation is bounded: recursion depth and result-set cardinality both
//! cap out, degrading to the placeholder rather than diverging.

use regex::{NoExpand, Regex};
use tree_sitter::Node;

use super::literal;
use super::symbols::{ArrayElement, ScopeId, ShapeValue, SymbolTable, SymbolValue};
use crate::parser::{node_text, raw_text};

pub(crate) const MAX_EVAL_DEPTH: usize = 32;
pub(crate) const MAX_FAN_OUT: usize = 64;

/// The result of evaluating one expression: all concrete combinations
/// (unresolved slots already carry the placeholder), the `{name}`-token
/// rendering, and whether any variable part was involved.
#[derive(Debug, Clone)]
pub struct EvalOutput {
    pub combos: Vec<String>,
    pub template: String,
    pub templated: bool,
}

impl EvalOutput {
    fn literal(text: String) -> Self {
        Self {
            combos: vec![text.clone()],
            template: text,
            templated: false,
        }
    }
}

pub struct Evaluator<'a> {
    source: &'a str,
    table: &'a SymbolTable,
    placeholder: &'a str,
    skip_aliases: bool,
    degraded: bool,
}

#[derive(Default)]
struct Guard {
    depth: usize,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        source: &'a str,
        table: &'a SymbolTable,
        placeholder: &'a str,
        skip_aliases: bool,
        degraded: bool,
    ) -> Self {
        Self {
            source,
            table,
            placeholder,
            skip_aliases,
            degraded,
        }
    }

    pub fn eval(&self, node: Node<'a>, scope: ScopeId) -> EvalOutput {
        let mut guard = Guard::default();
        self.eval_inner(node, scope, &mut guard)
    }

    fn eval_inner(&self, node: Node<'a>, scope: ScopeId, guard: &mut Guard) -> EvalOutput {
        if guard.depth >= MAX_EVAL_DEPTH {
            return self.token(node);
        }
        guard.depth += 1;
        let out = self.dispatch(node, scope, guard);
        guard.depth -= 1;
        out
    }

    fn dispatch(&self, node: Node<'a>, scope: ScopeId, guard: &mut Guard) -> EvalOutput {
        match node.kind() {
            "string" => EvalOutput::literal(literal::decode_string_literal(raw_text(
                node,
                self.source,
            ))),
            "template_string" => self.eval_template(node, scope, guard),
            "number" | "true" | "false" | "null" | "undefined" => {
                EvalOutput::literal(node_text(node, self.source))
            }
            "identifier" | "shorthand_property_identifier" => {
                self.eval_identifier(node, scope)
            }
            "member_expression" => self.eval_member(node, scope, guard),
            "subscript_expression" => self.eval_subscript(node, scope, guard),
            "binary_expression" => self.eval_binary(node, scope, guard),
            "call_expression" => self.eval_call(node, scope, guard),
            "ternary_expression" => self.eval_ternary(node, scope, guard),
            "parenthesized_expression" => match node.named_child(0) {
                Some(inner) => self.eval_inner(inner, scope, guard),
                None => self.token(node),
            },
            "assignment_expression" => match node.child_by_field_name("right") {
                Some(right) => self.eval_inner(right, scope, guard),
                None => self.token(node),
            },
            "sequence_expression" => match node.child_by_field_name("right") {
                Some(right) => self.eval_inner(right, scope, guard),
                None => self.token(node),
            },
            "await_expression" | "unary_expression" => {
                let inner = node
                    .child_by_field_name("argument")
                    .or_else(|| node.named_child(0));
                match inner {
                    Some(inner) => self.eval_inner(inner, scope, guard),
                    None => self.token(node),
                }
            }
            _ => self.token(node),
        }
    }

    fn eval_identifier(&self, node: Node<'a>, scope: ScopeId) -> EvalOutput {
        let name = node_text(node, self.source);
        if name.is_empty() {
            return self.token(node);
        }
        if !self.degraded {
            if let Some(symbol) = self.table.lookup(scope, &name) {
                if let SymbolValue::Strings(values) = &symbol.value {
                    if !values.is_empty() {
                        return EvalOutput {
                            combos: self.capped(values.clone()),
                            template: format!("{{{}}}", self.alias_for(&name)),
                            templated: true,
                        };
                    }
                }
                return self.named_token(&name);
            }
        }
        if name == "location" {
            return EvalOutput {
                combos: self.location_default(None),
                template: format!("{{{name}}}"),
                templated: true,
            };
        }
        self.named_token(&name)
    }

    fn eval_member(&self, node: Node<'a>, scope: ScopeId, guard: &mut Guard) -> EvalOutput {
        if let Some(out) = self.location_member(node) {
            return out;
        }
        if self.degraded {
            return self.member_token(node);
        }
        match self.member_values(node, scope, guard) {
            Some(values) if !values.is_empty() => EvalOutput {
                combos: self.capped(values),
                template: self.member_token(node).template,
                templated: true,
            },
            _ => self.member_token(node),
        }
    }

    fn eval_subscript(&self, node: Node<'a>, scope: ScopeId, guard: &mut Guard) -> EvalOutput {
        if self.degraded {
            return self.member_token(node);
        }
        match self.member_values(node, scope, guard) {
            Some(values) if !values.is_empty() => EvalOutput {
                combos: self.capped(values),
                template: self.member_token(node).template,
                templated: true,
            },
            _ => self.member_token(node),
        }
    }

    fn eval_binary(&self, node: Node<'a>, scope: ScopeId, guard: &mut Guard) -> EvalOutput {
        let Some(operator) = node.child_by_field_name("operator") else {
            return self.token(node);
        };
        let Some(left) = node.child_by_field_name("left") else {
            return self.token(node);
        };
        let Some(right) = node.child_by_field_name("right") else {
            return self.token(node);
        };
        match raw_text(operator, self.source) {
            "+" => {
                let l = self.eval_inner(left, scope, guard);
                let r = self.eval_inner(right, scope, guard);
                self.concat(l, r)
            }
            // statically, the interesting value of a guard expression is
            // its right-hand side
            "||" | "&&" | "??" => self.eval_inner(right, scope, guard),
            _ => self.token(node),
        }
    }

    fn eval_ternary(&self, node: Node<'a>, scope: ScopeId, guard: &mut Guard) -> EvalOutput {
        let (Some(consequence), Some(alternative)) = (
            node.child_by_field_name("consequence"),
            node.child_by_field_name("alternative"),
        ) else {
            return self.token(node);
        };
        let l = self.eval_inner(consequence, scope, guard);
        let r = self.eval_inner(alternative, scope, guard);
        let mut combos = l.combos;
        for combo in r.combos {
            if !combos.contains(&combo) {
                combos.push(combo);
            }
        }
        let templated = l.templated || r.templated || combos.len() > 1;
        EvalOutput {
            combos: self.capped(combos),
            template: l.template,
            templated,
        }
    }

    fn eval_template(&self, node: Node<'a>, scope: ScopeId, guard: &mut Guard) -> EvalOutput {
        let mut out = EvalOutput::literal(String::new());
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "string_fragment" => {
                    let text = raw_text(child, self.source);
                    out = self.concat(out, EvalOutput::literal(text.to_string()));
                }
                "escape_sequence" => {
                    let text = literal::decode_escapes(raw_text(child, self.source));
                    out = self.concat(out, EvalOutput::literal(text));
                }
                "template_substitution" => {
                    let Some(expr) = child.named_child(0) else {
                        continue;
                    };
                    let sub = self.eval_inner(expr, scope, guard);
                    out = self.concat(out, sub);
                    out.templated = true;
                }
                _ => {}
            }
        }
        out
    }

    fn eval_call(&self, node: Node<'a>, scope: ScopeId, guard: &mut Guard) -> EvalOutput {
        let Some(callee) = node.child_by_field_name("function") else {
            return self.token(node);
        };
        if callee.kind() != "member_expression" {
            return self.token(node);
        }
        let (Some(receiver), Some(property)) = (
            callee.child_by_field_name("object"),
            callee.child_by_field_name("property"),
        ) else {
            return self.token(node);
        };
        let args = call_arguments(node);
        match node_text(property, self.source).as_str() {
            "concat" => self.eval_concat(receiver, &args, scope, guard),
            "join" => self.eval_join(node, receiver, &args, scope, guard),
            "replace" => self.eval_replace(node, receiver, &args, scope, guard, false),
            "replaceAll" => self.eval_replace(node, receiver, &args, scope, guard, true),
            _ => self.token(node),
        }
    }

    fn eval_concat(
        &self,
        receiver: Node<'a>,
        args: &[Node<'a>],
        scope: ScopeId,
        guard: &mut Guard,
    ) -> EvalOutput {
        let mut out = self.eval_inner(receiver, scope, guard);
        for arg in args {
            let part = self.eval_inner(*arg, scope, guard);
            out = self.concat(out, part);
        }
        out
    }

    fn eval_join(
        &self,
        node: Node<'a>,
        receiver: Node<'a>,
        args: &[Node<'a>],
        scope: ScopeId,
        guard: &mut Guard,
    ) -> EvalOutput {
        let separators = match args.first() {
            None => vec![String::new()],
            Some(arg) => {
                let out = self.eval_inner(*arg, scope, guard);
                if out.templated {
                    vec![self.placeholder.to_string()]
                } else {
                    out.combos
                }
            }
        };
        let elements: Option<Vec<ArrayElement>> = match receiver.kind() {
            "array" => {
                let mut elements = Vec::new();
                let mut cursor = receiver.walk();
                for child in receiver.named_children(&mut cursor) {
                    let out = self.eval_inner(child, scope, guard);
                    if out.templated && out.combos.iter().all(|c| c == self.placeholder) {
                        elements.push(ArrayElement::Token(out.template));
                    } else {
                        elements.push(ArrayElement::Strings(out.combos));
                    }
                }
                Some(elements)
            }
            "identifier" => {
                let name = node_text(receiver, self.source);
                match self.table.lookup(scope, &name).map(|symbol| &symbol.value) {
                    Some(SymbolValue::Array(elements)) => Some(elements.clone()),
                    _ => None,
                }
            }
            _ => None,
        };
        let Some(elements) = elements else {
            return self.token(node);
        };
        let parts: Vec<Vec<String>> = elements
            .iter()
            .map(|element| match element {
                ArrayElement::Strings(values) => values.clone(),
                ArrayElement::Token(_) => vec![self.placeholder.to_string()],
            })
            .collect();
        let mut combos = Vec::new();
        for separator in &separators {
            match joined_product(&parts, separator) {
                Some(joined) => {
                    for value in joined {
                        if !combos.contains(&value) {
                            combos.push(value);
                        }
                    }
                }
                None => combos.push(self.placeholder.to_string()),
            }
        }
        EvalOutput {
            combos: self.capped(combos),
            template: format!("{{{}}}", node_text(node, self.source)),
            templated: true,
        }
    }

    fn eval_replace(
        &self,
        node: Node<'a>,
        receiver: Node<'a>,
        args: &[Node<'a>],
        scope: ScopeId,
        guard: &mut Guard,
        replace_all: bool,
    ) -> EvalOutput {
        let base = self.eval_inner(receiver, scope, guard);
        let template = format!("{{{}}}", node_text(node, self.source));
        let unchanged = |combos: Vec<String>| EvalOutput {
            combos,
            template: template.clone(),
            templated: true,
        };
        let (Some(pattern_node), Some(replacement_node)) = (args.first(), args.get(1)) else {
            return unchanged(base.combos);
        };

        enum Pattern {
            Literal(String),
            Matcher(Regex, bool),
        }
        let pattern = match pattern_node.kind() {
            "string" => Pattern::Literal(literal::decode_string_literal(raw_text(
                *pattern_node,
                self.source,
            ))),
            "regex" => {
                let Some(body) = pattern_node.child_by_field_name("pattern") else {
                    return unchanged(base.combos);
                };
                let global = pattern_node
                    .child_by_field_name("flags")
                    .map(|flags| raw_text(flags, self.source).contains('g'))
                    .unwrap_or(false);
                match Regex::new(raw_text(body, self.source)) {
                    Ok(re) => Pattern::Matcher(re, global),
                    Err(_) => return unchanged(base.combos),
                }
            }
            _ => {
                let out = self.eval_inner(*pattern_node, scope, guard);
                if out.templated || out.combos.len() != 1 {
                    return unchanged(base.combos);
                }
                Pattern::Literal(out.combos.into_iter().next().unwrap_or_default())
            }
        };
        let replacement = self.eval_inner(*replacement_node, scope, guard);
        if replacement.templated {
            return unchanged(base.combos);
        }

        let mut combos = Vec::new();
        for value in &base.combos {
            for rep in &replacement.combos {
                let replaced = match &pattern {
                    Pattern::Literal(find) if replace_all => value.replace(find.as_str(), rep),
                    Pattern::Literal(find) => value.replacen(find.as_str(), rep, 1),
                    // replacement strings are literal text, no $1 expansion
                    Pattern::Matcher(re, true) => {
                        re.replace_all(value, NoExpand(rep)).into_owned()
                    }
                    Pattern::Matcher(re, false) => re.replace(value, NoExpand(rep)).into_owned(),
                };
                if !combos.contains(&replaced) {
                    combos.push(replaced);
                }
            }
        }
        EvalOutput {
            combos: self.capped(combos),
            template,
            templated: true,
        }
    }

    /// Cartesian concatenation of two outputs, collapsing to the
    /// placeholder when the fan-out cap is exceeded.
    fn concat(&self, left: EvalOutput, right: EvalOutput) -> EvalOutput {
        let templated = left.templated || right.templated;
        let template = format!("{}{}", left.template, right.template);
        if left.combos.len().saturating_mul(right.combos.len()) > MAX_FAN_OUT {
            return EvalOutput {
                combos: vec![self.placeholder.to_string()],
                template,
                templated: true,
            };
        }
        let mut combos = Vec::new();
        for l in &left.combos {
            for r in &right.combos {
                let combined = format!("{l}{r}");
                if !combos.contains(&combined) {
                    combos.push(combined);
                }
            }
        }
        if combos.is_empty() {
            combos.push(String::new());
        }
        EvalOutput {
            combos,
            template,
            templated,
        }
    }

    /// Resolved values for a member or subscript chain, navigated through
    /// object shapes recorded in pass 1.
    fn member_values(
        &self,
        node: Node<'a>,
        scope: ScopeId,
        guard: &mut Guard,
    ) -> Option<Vec<String>> {
        let keys = self.access_keys(node, scope, guard)?;
        let mut values = Vec::new();
        for shape in self.object_shapes(node, scope, guard) {
            for key in &keys {
                if let Some(ShapeValue::Strings(found)) = shape.get(key) {
                    for value in found {
                        if !values.contains(value) {
                            values.push(value.clone());
                        }
                    }
                }
            }
        }
        if values.is_empty() { None } else { Some(values) }
    }

    /// The candidate shapes an access expression's object can denote.
    fn object_shapes(
        &self,
        node: Node<'a>,
        scope: ScopeId,
        guard: &mut Guard,
    ) -> Vec<&super::symbols::ObjectShape> {
        let Some(object) = node.child_by_field_name("object") else {
            return Vec::new();
        };
        match object.kind() {
            "identifier" => {
                let name = node_text(object, self.source);
                match self.table.lookup(scope, &name).map(|symbol| &symbol.value) {
                    Some(SymbolValue::Shape(shape)) => vec![shape],
                    _ => Vec::new(),
                }
            }
            "member_expression" | "subscript_expression" => {
                let Some(keys) = self.access_keys(object, scope, guard) else {
                    return Vec::new();
                };
                let mut shapes = Vec::new();
                for shape in self.object_shapes(object, scope, guard) {
                    for key in &keys {
                        if let Some(ShapeValue::Shape(nested)) = shape.get(key) {
                            shapes.push(nested);
                        }
                    }
                }
                shapes
            }
            _ => Vec::new(),
        }
    }

    /// The static key choices of a member or subscript access.
    fn access_keys(
        &self,
        node: Node<'a>,
        scope: ScopeId,
        guard: &mut Guard,
    ) -> Option<Vec<String>> {
        match node.kind() {
            "member_expression" => {
                let property = node.child_by_field_name("property")?;
                Some(vec![node_text(property, self.source)])
            }
            "subscript_expression" => {
                let index = node.child_by_field_name("index")?;
                let out = self.eval_inner(index, scope, guard);
                if out.templated {
                    return None;
                }
                Some(out.combos)
            }
            _ => None,
        }
    }

    /// The `window.location` resolver: well-known defaults per property,
    /// overridable from injected context.
    fn location_member(&self, node: Node<'a>) -> Option<EvalOutput> {
        let path = self.simple_path(node)?;
        let prop_index = if path.first().map(String::as_str) == Some("window")
            && path.get(1).map(String::as_str) == Some("location")
        {
            2
        } else if path.first().map(String::as_str) == Some("location") {
            1
        } else {
            return None;
        };
        if path.len() > prop_index + 1 {
            return None;
        }
        let values = self.location_default(path.get(prop_index).map(String::as_str));
        Some(EvalOutput {
            combos: values,
            template: format!("{{{}}}", path.join(".")),
            templated: true,
        })
    }

    fn location_default(&self, prop: Option<&str>) -> Vec<String> {
        let ph = self.placeholder;
        let over = |name: &str| self.table.location_override(name).map(str::to_string);
        let host = over("host").or_else(|| over("hostname"));
        let value = match prop {
            None | Some("href") => over("href").unwrap_or_else(|| match &host {
                Some(host) => format!("https://{host}/"),
                None => format!("https://{ph}/"),
            }),
            Some("origin") => over("origin").unwrap_or_else(|| match &host {
                Some(host) => format!("https://{host}"),
                None => format!("https://{ph}"),
            }),
            Some("host") | Some("hostname") => host.unwrap_or_else(|| ph.to_string()),
            Some("protocol") => over("protocol").unwrap_or_else(|| "https:".to_string()),
            Some("pathname") => over("pathname").unwrap_or_else(|| format!("/{ph}")),
            Some("search") | Some("hash") | Some("port") => {
                prop.and_then(over).unwrap_or_default()
            }
            Some(other) => over(other).unwrap_or_else(|| ph.to_string()),
        };
        vec![value]
    }

    /// A purely dotted member chain (`a.b.c`), or None when any link is
    /// computed or call-shaped.
    fn simple_path(&self, node: Node<'a>) -> Option<Vec<String>> {
        let mut path = Vec::new();
        let mut current = node;
        loop {
            match current.kind() {
                "member_expression" => {
                    let property = current.child_by_field_name("property")?;
                    if property.kind() != "property_identifier" {
                        return None;
                    }
                    path.push(node_text(property, self.source));
                    current = current.child_by_field_name("object")?;
                }
                "identifier" => {
                    path.push(node_text(current, self.source));
                    path.reverse();
                    return Some(path);
                }
                _ => return None,
            }
        }
    }

    fn capped(&self, combos: Vec<String>) -> Vec<String> {
        if combos.len() > MAX_FAN_OUT {
            vec![self.placeholder.to_string()]
        } else if combos.is_empty() {
            vec![self.placeholder.to_string()]
        } else {
            combos
        }
    }

    fn token(&self, node: Node<'a>) -> EvalOutput {
        let display = node_text(node, self.source);
        self.named_token(&display)
    }

    fn named_token(&self, display: &str) -> EvalOutput {
        EvalOutput {
            combos: vec![self.placeholder.to_string()],
            template: format!("{{{}}}", self.alias_for(display)),
            templated: true,
        }
    }

    /// Template tokens render the most informative name known for a
    /// variable; `--skip-aliases` keeps the declared name.
    fn alias_for<'n>(&'n self, name: &'n str) -> &'n str {
        if self.skip_aliases {
            return name;
        }
        self.table.aliases.best(name)
    }

    fn member_token(&self, node: Node<'a>) -> EvalOutput {
        let text = node_text(node, self.source);
        let display = match self.simple_path(node) {
            Some(path) if !self.skip_aliases => {
                let base = &path[0];
                let alias = self.table.aliases.best(base);
                if alias != base {
                    text.replacen(base.as_str(), alias, 1)
                } else {
                    text
                }
            }
            _ => text,
        };
        EvalOutput {
            combos: vec![self.placeholder.to_string()],
            template: format!("{{{display}}}"),
            templated: true,
        }
    }
}

fn call_arguments<'a>(node: Node<'a>) -> Vec<Node<'a>> {
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

pub(crate) fn joined_product(parts: &[Vec<String>], separator: &str) -> Option<Vec<String>> {
    let mut total = 1usize;
    for part in parts {
        total = total.saturating_mul(part.len().max(1));
        if total > MAX_FAN_OUT {
            return None;
        }
    }
    let mut joined = vec![String::new()];
    for (index, part) in parts.iter().enumerate() {
        let choices: &[String] = if part.is_empty() {
            &[]
        } else {
            part.as_slice()
        };
        let mut next = Vec::new();
        for prefix in &joined {
            if choices.is_empty() {
                next.push(prefix.clone());
                continue;
            }
            for choice in choices {
                let mut value = prefix.clone();
                if index > 0 {
                    value.push_str(separator);
                }
                value.push_str(choice);
                next.push(value);
            }
        }
        joined = next;
    }
    Some(joined)
}
