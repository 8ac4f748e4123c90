use anyhow::{Context, Result};
use tree_sitter::{Language, Node, Parser, Tree};

/// One parsed input: the raw source text plus its syntax tree.
pub struct SourceUnit {
    source: String,
    tree: Tree,
}

impl SourceUnit {
    pub fn parse(source: String) -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_javascript::LANGUAGE;
        parser.set_language(&language.into())?;
        let tree = parser
            .parse(&source, None)
            .context("parse JavaScript source")?;
        Ok(Self { source, tree })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn byte_len(&self) -> usize {
        self.source.len()
    }
}

pub fn language() -> Language {
    tree_sitter_javascript::LANGUAGE.into()
}

/// Trimmed node text, for identifiers and other names.
pub fn node_text(node: Node<'_>, source: &str) -> String {
    let start = node.start_byte();
    let end = node.end_byte();
    source.get(start..end).unwrap_or("").trim().to_string()
}

/// Untrimmed node text, for literal content where whitespace matters.
pub fn raw_text<'a>(node: Node<'a>, source: &'a str) -> &'a str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}
