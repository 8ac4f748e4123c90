//! The `strings` mode: every string and template literal in the source,
//! length-filtered and deduplicated in discovery order.

use tree_sitter::Node;

use crate::parser::{SourceUnit, raw_text};
use crate::urls::literal;
use std::collections::HashSet;

pub struct StringOptions {
    pub min: Option<usize>,
    pub max: Option<usize>,
    pub include_error: bool,
}

pub fn get_strings(unit: &SourceUnit, options: &StringOptions) -> Vec<String> {
    let mut collector = Collector {
        options,
        texts: Vec::new(),
        seen: HashSet::new(),
    };
    collector.walk(unit.root(), unit.source());
    collector.texts
}

struct Collector<'a> {
    options: &'a StringOptions,
    texts: Vec<String>,
    seen: HashSet<String>,
}

impl Collector<'_> {
    fn walk(&mut self, root: Node<'_>, source: &str) {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            match node.kind() {
                "string" | "template_string" | "string_fragment" => {
                    let text = literal::unquote(raw_text(node, source).trim()).to_string();
                    if self.seen.contains(&text) {
                        continue;
                    }
                    self.collect(text);
                }
                "ERROR" if self.options.include_error => {
                    let text = raw_text(node, source).trim().to_string();
                    self.collect(text);
                }
                "comment" => {
                    self.process_comment(node, source);
                }
                _ => {}
            }
            let mut cursor = node.walk();
            let mut children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
            children.reverse();
            stack.extend(children);
        }
    }

    fn collect(&mut self, text: String) {
        if self.seen.contains(&text) {
            return;
        }
        let length = text.chars().count();
        let min_ok = self.options.min.map(|min| length >= min).unwrap_or(true);
        let max_ok = self.options.max.map(|max| length <= max).unwrap_or(true);
        if min_ok && max_ok {
            self.seen.insert(text.clone());
            self.texts.push(text);
        }
    }

    fn process_comment(&mut self, node: Node<'_>, source: &str) {
        let raw = raw_text(node, source);
        let stripped = strip_markers(raw);
        if stripped.trim().is_empty() {
            return;
        }
        if let Ok(unit) = SourceUnit::parse(stripped) {
            self.walk(unit.root(), unit.source());
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

#[cfg(test)]
mod tests {
    use super::{StringOptions, get_strings};
    use crate::parser::SourceUnit;

    fn run(source: &str, min: Option<usize>, max: Option<usize>) -> Vec<String> {
        let unit = SourceUnit::parse(source.to_string()).unwrap();
        get_strings(
            &unit,
            &StringOptions {
                min,
                max,
                include_error: false,
            },
        )
    }

    #[test]
    fn collects_strings_in_order() {
        let strings = run(r#"const a = "first"; const b = 'second';"#, None, None);
        assert_eq!(strings, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn length_bounds_apply() {
        let strings = run(r#"const a = "ab"; const b = "abcdef";"#, Some(3), None);
        assert_eq!(strings, vec!["abcdef".to_string()]);
        let strings = run(r#"const a = "ab"; const b = "abcdef";"#, None, Some(3));
        assert_eq!(strings, vec!["ab".to_string()]);
    }

    #[test]
    fn deduplicates() {
        let strings = run(r#"const a = "same"; const b = "same";"#, None, None);
        assert_eq!(strings, vec!["same".to_string()]);
    }

    #[test]
    fn finds_strings_in_comments() {
        let strings = run("// const hidden = \"/from/comment\";", None, None);
        assert_eq!(strings, vec!["/from/comment".to_string()]);
    }
}
