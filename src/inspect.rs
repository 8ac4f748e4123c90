//! The `inspect` mode: node texts filtered by syntax kind, and the
//! grammar's node-kind inventory.

use std::collections::HashSet;
use tree_sitter::Node;

use crate::parser::{SourceUnit, language, raw_text};

/// Every named node kind the JavaScript grammar can produce.
pub fn node_kinds() -> Vec<String> {
    let language = language();
    let mut kinds: Vec<String> = (0..language.node_kind_count() as u16)
        .filter(|id| language.node_kind_is_named(*id))
        .filter_map(|id| language.node_kind_for_id(id))
        .map(str::to_string)
        .collect();
    kinds.sort();
    kinds.dedup();
    kinds
}

pub fn inspect_nodes(unit: &SourceUnit, types: &[String]) -> Vec<String> {
    let filter: Option<HashSet<&str>> = if types.is_empty() {
        None
    } else {
        Some(types.iter().map(String::as_str).collect())
    };
    let mut texts = Vec::new();
    let mut seen = HashSet::new();
    let mut stack: Vec<Node<'_>> = vec![unit.root()];
    while let Some(node) = stack.pop() {
        let matches = filter
            .as_ref()
            .map(|kinds| kinds.contains(node.kind()))
            .unwrap_or(true);
        if matches {
            let text = raw_text(node, unit.source())
                .trim()
                .trim_matches(['"', '\''])
                .to_string();
            if seen.insert(text.clone()) {
                texts.push(text);
            }
        }
        let mut cursor = node.walk();
        let mut children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        children.reverse();
        stack.extend(children);
    }
    texts
}

#[cfg(test)]
mod tests {
    use super::{inspect_nodes, node_kinds};
    use crate::parser::SourceUnit;

    #[test]
    fn kind_inventory_contains_core_kinds() {
        let kinds = node_kinds();
        for expected in ["program", "string", "template_string", "call_expression"] {
            assert!(kinds.iter().any(|kind| kind == expected), "{expected}");
        }
    }

    #[test]
    fn filters_by_kind() {
        let unit = SourceUnit::parse(r#"const a = "text"; const b = 42;"#.to_string()).unwrap();
        let texts = inspect_nodes(&unit, &["number".to_string()]);
        assert_eq!(texts, vec!["42".to_string()]);
    }
}
