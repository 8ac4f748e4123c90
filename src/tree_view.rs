//! The `tree` mode: an indented dump of the syntax tree.

use tree_sitter::Node;

use crate::parser::{SourceUnit, raw_text};

pub struct TreeOptions {
    pub indent: usize,
    pub only_named: bool,
    pub include_text: bool,
    pub parse_comments: bool,
}

pub fn get_syntax_tree(unit: &SourceUnit, options: &TreeOptions) -> Vec<String> {
    let mut lines = Vec::new();
    render(unit.root(), unit.source(), options, 0, &mut lines);
    lines
}

fn render(
    node: Node<'_>,
    source: &str,
    options: &TreeOptions,
    level: usize,
    lines: &mut Vec<String>,
) {
    let start = node.start_position();
    let end = node.end_position();
    let mut line = format!(
        "{:width$}{} ({}, {}) - ({}, {})",
        "",
        node.kind(),
        start.row,
        start.column,
        end.row,
        end.column,
        width = options.indent * level,
    );
    if options.include_text {
        line.push_str(" - ");
        line.push_str(raw_text(node, source));
    }
    lines.push(line);

    if node.kind() == "comment" && options.parse_comments {
        let stripped = strip_markers(raw_text(node, source));
        if !stripped.trim().is_empty() {
            if let Ok(inner) = SourceUnit::parse(stripped) {
                render(inner.root(), inner.source(), options, level + 1, lines);
            }
        }
    }

    let mut cursor = node.walk();
    if options.only_named {
        for child in node.named_children(&mut cursor) {
            render(child, source, options, level + 1, lines);
        }
    } else {
        for child in node.children(&mut cursor) {
            render(child, source, options, level + 1, lines);
        }
    }
}

fn strip_markers(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(inner) = trimmed.strip_prefix("/*") {
        return inner.strip_suffix("*/").unwrap_or(inner).to_string();
    }
    let mut text = trimmed;
    while let Some(inner) = text.strip_prefix("//") {
        text = inner.trim_start();
    }
    text.to_string()
}
