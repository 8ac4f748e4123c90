use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::html::HtmlBackend;
use crate::urls::context::ContextPolicy;

#[derive(Parser)]
#[command(
    name = "urx",
    version,
    about = "Extract URLs, endpoints, and strings from JavaScript source",
    after_help = r#"Examples:
  urx urls main.js
  urx urls main.js --include-templates
  urx urls main.js --context BASE=https://api.example.com --context-policy override
  urx tree main.js --only-named
  urx strings main.js --min 3
  urx inspect main.js --types string template_string
  urx query --input main.js --query '(string) @str' --trim
  cat main.js | urx urls --include-templates
"#
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Args)]
pub struct InputArgs {
    /// JavaScript file; reads stdin when omitted.
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,
    /// JavaScript file; alternative to the positional argument.
    #[arg(long, value_name = "FILE", conflicts_with = "file")]
    pub input: Option<PathBuf>,
    /// Output file name (default: stdout).
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Extract URLs, API endpoints, and paths.
    Urls {
        #[command(flatten)]
        input: InputArgs,
        /// Placeholder for expressions, templates, or variables.
        #[arg(long, default_value = "FUZZ", value_name = "STR")]
        placeholder: String,
        /// Include URLs containing a template or variable.
        #[arg(long)]
        include_templates: bool,
        /// Print URLs as soon as they are discovered.
        #[arg(long)]
        verbose: bool,
        /// Maximum number of AST nodes to visit.
        #[arg(long, default_value_t = 1_000_000, value_name = "N")]
        max_nodes: usize,
        /// Max file size in MB for symbol resolution.
        #[arg(long, default_value_t = 1.0, value_name = "MB")]
        max_file_size: f64,
        /// HTML parser backend for markup embedded in strings.
        #[arg(long, default_value = "scraper")]
        html_parser: HtmlBackend,
        /// Skip symbol resolution entirely.
        #[arg(long)]
        skip_symbols: bool,
        /// Render raw variable names instead of semantic aliases.
        #[arg(long)]
        skip_aliases: bool,
        /// Additional URL path extensions to retain, comma-separated.
        #[arg(long, value_delimiter = ',', value_name = "EXT")]
        extensions: Vec<String>,
        /// External variable definitions: JSON, JSON file, or KEY=VALUE pairs.
        #[arg(long, value_name = "CTX")]
        context: Vec<String>,
        /// How context variables combine with file-derived values.
        #[arg(long, default_value = "merge")]
        context_policy: ContextPolicy,
    },
    /// Print string literals found in the source.
    Strings {
        #[command(flatten)]
        input: InputArgs,
        /// Minimum length of a string.
        #[arg(long, value_name = "N")]
        min: Option<usize>,
        /// Maximum length of a string.
        #[arg(long, value_name = "N")]
        max: Option<usize>,
        /// Include strings inside ERROR nodes.
        #[arg(long)]
        include_error: bool,
    },
    /// Print the JavaScript syntax tree.
    Tree {
        #[command(flatten)]
        input: InputArgs,
        /// Number of spaces used for indentation.
        #[arg(long, default_value_t = 2, value_name = "N")]
        indent: usize,
        /// Print only named nodes.
        #[arg(long)]
        only_named: bool,
        /// Print the node text alongside the syntax tree.
        #[arg(long)]
        include_text: bool,
        /// Parse comments and comment blocks as JavaScript.
        #[arg(long)]
        parse_comments: bool,
    },
    /// Inspect node texts by syntax kind.
    Inspect {
        #[command(flatten)]
        input: InputArgs,
        /// Print all JavaScript node kinds and exit.
        #[arg(long)]
        get_types: bool,
        /// Filter list of node kinds to inspect.
        #[arg(long, num_args = 0.., value_name = "STR")]
        types: Vec<String>,
    },
    /// Run a tree-sitter query against the syntax tree.
    Query {
        #[command(flatten)]
        input: InputArgs,
        /// Tree-sitter query source.
        #[arg(long, value_name = "STR")]
        query: String,
        /// Keep only unique captures.
        #[arg(long)]
        unique: bool,
        /// Strip quotes and surrounding whitespace from capture texts.
        #[arg(long)]
        trim: bool,
    },
}
