use anyhow::Result;
use clap::Parser;
use urx::{cli, inspect, parser, query, strings, tree_view, urls, util};

fn main() -> Result<()> {
    let args = cli::Args::parse();

    match args.command {
        cli::Command::Urls {
            input,
            placeholder,
            include_templates,
            verbose,
            max_nodes,
            max_file_size,
            html_parser,
            skip_symbols,
            skip_aliases,
            extensions,
            context,
            context_policy,
        } => {
            // malformed context aborts before any traversal
            let context = urls::context::parse_context_args(&context)?;
            let source = util::read_input(input.file.as_ref(), input.input.as_ref())?;
            let unit = parser::SourceUnit::parse(source)?;
            let config = urls::UrlConfig {
                placeholder,
                include_templates,
                verbose,
                max_nodes,
                max_file_size_mb: max_file_size,
                html_parser,
                skip_symbols,
                skip_aliases,
                extensions: extensions
                    .into_iter()
                    .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
                    .filter(|ext| !ext.is_empty())
                    .collect(),
                context,
                context_policy,
            };
            let results = urls::extract_urls(&unit, &config)?;
            // verbose already streamed each candidate to stdout
            if !(verbose && input.output.is_none()) {
                util::write_output(input.output.as_ref(), &results)?;
            }
            Ok(())
        }
        cli::Command::Strings {
            input,
            min,
            max,
            include_error,
        } => {
            let source = util::read_input(input.file.as_ref(), input.input.as_ref())?;
            let unit = parser::SourceUnit::parse(source)?;
            let results = strings::get_strings(
                &unit,
                &strings::StringOptions {
                    min,
                    max,
                    include_error,
                },
            );
            util::write_output(input.output.as_ref(), &results)
        }
        cli::Command::Tree {
            input,
            indent,
            only_named,
            include_text,
            parse_comments,
        } => {
            let source = util::read_input(input.file.as_ref(), input.input.as_ref())?;
            let unit = parser::SourceUnit::parse(source)?;
            let results = tree_view::get_syntax_tree(
                &unit,
                &tree_view::TreeOptions {
                    indent,
                    only_named,
                    include_text,
                    parse_comments,
                },
            );
            util::write_output(input.output.as_ref(), &results)
        }
        cli::Command::Inspect {
            input,
            get_types,
            types,
        } => {
            if get_types {
                return util::write_output(input.output.as_ref(), &inspect::node_kinds());
            }
            let source = util::read_input(input.file.as_ref(), input.input.as_ref())?;
            let unit = parser::SourceUnit::parse(source)?;
            let results = inspect::inspect_nodes(&unit, &types);
            util::write_output(input.output.as_ref(), &results)
        }
        cli::Command::Query {
            input,
            query,
            unique,
            trim,
        } => {
            let source = util::read_input(input.file.as_ref(), input.input.as_ref())?;
            let unit = parser::SourceUnit::parse(source)?;
            let results = query::query_nodes(
                &unit,
                &query::QueryOptions {
                    query,
                    unique,
                    trim,
                },
            )?;
            util::write_output(input.output.as_ref(), &results)
        }
    }
}
