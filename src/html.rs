//! URL extraction from HTML fragments found inside string literals.
//!
//! Two backends: `scraper` builds a real DOM through html5ever, while
//! `builtin` scans attributes with regular expressions and needs no DOM.
//! Both feed the same attribute catalogue.

use clap::ValueEnum;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;

use crate::urls::filters;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum HtmlBackend {
    /// Full html5ever DOM parsing.
    #[default]
    Scraper,
    /// Lightweight regex attribute scanning.
    Builtin,
}

const URL_ATTRIBUTES: &[&str] = &[
    "href",
    "src",
    "action",
    "formaction",
    "poster",
    "background",
    "cite",
    "xlink:href",
];

fn attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)\b(href|src|action|formaction|poster|background|cite|data|data-src|data-url|data-href)\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
        )
        .unwrap()
    })
}

fn srcset_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\bsrcset\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
    })
}

fn script_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script>").unwrap())
}

/// A candidate string is treated as markup when it opens with a tag or
/// declares a doctype.
pub fn looks_like_html(text: &str) -> bool {
    let trimmed = text.trim_start();
    (trimmed.starts_with('<') && trimmed.contains('>')) || text.contains("<!DOCTYPE")
}

/// Attribute values that can carry URLs, in document order. Values are
/// raw: route normalization and junk filtering happen downstream.
pub fn extract_attribute_urls(html: &str, backend: HtmlBackend) -> Vec<String> {
    match backend {
        HtmlBackend::Scraper => scraper_attribute_urls(html),
        HtmlBackend::Builtin => builtin_attribute_urls(html),
    }
}

/// Bodies of `<script>` tags without a `src` attribute, for re-parsing
/// as JavaScript.
pub fn extract_inline_scripts(html: &str, backend: HtmlBackend) -> Vec<String> {
    match backend {
        HtmlBackend::Scraper => scraper_inline_scripts(html),
        HtmlBackend::Builtin => builtin_inline_scripts(html),
    }
}

fn parse(html: &str) -> Html {
    if html.contains("<!DOCTYPE") || html.contains("<html") {
        Html::parse_document(html)
    } else {
        Html::parse_fragment(html)
    }
}

fn scraper_attribute_urls(html: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse("*") else {
        return Vec::new();
    };
    let document = parse(html);
    let mut urls = Vec::new();
    for element in document.select(&selector) {
        let tag = element.value().name();
        for (name, value) in element.value().attrs() {
            if name == "srcset" {
                for descriptor in split_srcset(value) {
                    push_url(&mut urls, descriptor);
                }
                continue;
            }
            let value = value.trim();
            if URL_ATTRIBUTES.contains(&name) || (name == "data" && tag == "object") {
                push_url(&mut urls, value.to_string());
            } else if name.starts_with("data-") && url_like(value) {
                push_url(&mut urls, value.to_string());
            }
        }
    }
    urls
}

fn scraper_inline_scripts(html: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse("script") else {
        return Vec::new();
    };
    let document = parse(html);
    let mut scripts = Vec::new();
    for element in document.select(&selector) {
        if element.value().attr("src").is_some() {
            continue;
        }
        let code: String = element.text().collect();
        if !code.trim().is_empty() {
            scripts.push(code);
        }
    }
    scripts
}

fn builtin_attribute_urls(html: &str) -> Vec<String> {
    let mut urls = Vec::new();
    for capture in attr_re().captures_iter(html) {
        let value = capture
            .get(2)
            .or_else(|| capture.get(3))
            .map(|m| m.as_str().trim())
            .unwrap_or("");
        let name = capture.get(1).map(|m| m.as_str()).unwrap_or("");
        if name.eq_ignore_ascii_case("data") || name.to_ascii_lowercase().starts_with("data-") {
            if url_like(value) {
                push_url(&mut urls, value.to_string());
            }
        } else {
            push_url(&mut urls, value.to_string());
        }
    }
    for capture in srcset_re().captures_iter(html) {
        let value = capture
            .get(1)
            .or_else(|| capture.get(2))
            .map(|m| m.as_str())
            .unwrap_or("");
        for descriptor in split_srcset(value) {
            push_url(&mut urls, descriptor);
        }
    }
    urls
}

fn builtin_inline_scripts(html: &str) -> Vec<String> {
    let mut scripts = Vec::new();
    for capture in script_re().captures_iter(html) {
        let attrs = capture.get(1).map(|m| m.as_str()).unwrap_or("");
        if attrs.to_ascii_lowercase().contains("src") {
            continue;
        }
        let body = capture.get(2).map(|m| m.as_str()).unwrap_or("");
        if !body.trim().is_empty() {
            scripts.push(body.to_string());
        }
    }
    scripts
}

/// `srcset` holds comma-separated descriptors of the form `url 2x`.
fn split_srcset(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter_map(|descriptor| descriptor.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

fn url_like(value: &str) -> bool {
    filters::is_url_pattern(value) || filters::is_path_pattern(value)
}

fn push_url(urls: &mut Vec<String>, value: String) {
    let value = value.trim().to_string();
    if value.is_empty()
        || value.starts_with('#')
        || value.starts_with("javascript:")
        || value.starts_with("data:")
    {
        return;
    }
    urls.push(value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_common_attributes() {
        let html = r#"<a href="/login"><img src="https://cdn.example.com/logo.png"><form action="/submit"></form></a>"#;
        for backend in [HtmlBackend::Scraper, HtmlBackend::Builtin] {
            let urls = extract_attribute_urls(html, backend);
            assert!(urls.contains(&"/login".to_string()), "{backend:?}");
            assert!(
                urls.contains(&"https://cdn.example.com/logo.png".to_string()),
                "{backend:?}"
            );
            assert!(urls.contains(&"/submit".to_string()), "{backend:?}");
        }
    }

    #[test]
    fn splits_srcset_descriptors() {
        let html = r#"<img srcset="/img/small.png 1x, /img/large.png 2x">"#;
        for backend in [HtmlBackend::Scraper, HtmlBackend::Builtin] {
            let urls = extract_attribute_urls(html, backend);
            assert!(urls.contains(&"/img/small.png".to_string()), "{backend:?}");
            assert!(urls.contains(&"/img/large.png".to_string()), "{backend:?}");
        }
    }

    #[test]
    fn skips_fragment_and_pseudo_urls() {
        let html = r##"<a href="#top"></a><a href="javascript:void(0)"></a><img src="data:image/png;base64,xyz">"##;
        for backend in [HtmlBackend::Scraper, HtmlBackend::Builtin] {
            assert!(extract_attribute_urls(html, backend).is_empty(), "{backend:?}");
        }
    }

    #[test]
    fn collects_inline_scripts_only() {
        let html = r#"<script src="/app.js"></script><script>fetch("/api/inline");</script>"#;
        for backend in [HtmlBackend::Scraper, HtmlBackend::Builtin] {
            let scripts = extract_inline_scripts(html, backend);
            assert_eq!(scripts.len(), 1, "{backend:?}");
            assert!(scripts[0].contains("/api/inline"), "{backend:?}");
        }
    }

    #[test]
    fn detects_markup() {
        assert!(looks_like_html("<div><a href='/x'>go</a></div>"));
        assert!(looks_like_html("  <!DOCTYPE html><html></html>"));
        assert!(!looks_like_html("/api/users"));
        assert!(!looks_like_html("a < b"));
    }
}
