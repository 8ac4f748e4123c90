//! The `query` mode: run a tree-sitter query and print capture texts.

use anyhow::{Context, Result};
use streaming_iterator::StreamingIterator;
use tree_sitter::{Query, QueryCursor};

use crate::parser::{SourceUnit, language, raw_text};

pub struct QueryOptions {
    pub query: String,
    pub unique: bool,
    pub trim: bool,
}

pub fn query_nodes(unit: &SourceUnit, options: &QueryOptions) -> Result<Vec<String>> {
    let query = Query::new(&language(), &options.query).context("compile tree-sitter query")?;
    let mut cursor = QueryCursor::new();
    let mut texts = Vec::new();
    let mut seen = std::collections::HashSet::new();

    let mut captures = cursor.captures(&query, unit.root(), unit.source().as_bytes());
    while let Some((matched, capture_index)) = captures.next() {
        let capture = matched.captures[*capture_index];
        let mut text = raw_text(capture.node, unit.source()).to_string();
        if options.trim {
            text = text.trim_matches(['\'', '"', '\n', ' ']).to_string();
        }
        if options.unique && !seen.insert(text.clone()) {
            continue;
        }
        texts.push(text);
    }
    Ok(texts)
}
