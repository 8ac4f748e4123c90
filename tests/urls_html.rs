use urx::html::HtmlBackend;
use urx::parser::SourceUnit;
use urx::urls::{UrlConfig, extract_urls};

fn run(source: &str, backend: HtmlBackend) -> Vec<String> {
    let unit = SourceUnit::parse(source.to_string()).unwrap();
    let config = UrlConfig {
        html_parser: backend,
        ..UrlConfig::default()
    };
    extract_urls(&unit, &config).unwrap()
}

#[test]
fn html_attributes_become_candidates() {
    let source = r#"document.body.innerHTML = '<a href="/login"><img src="https://cdn.example.com/logo.png"></a>';"#;
    for backend in [HtmlBackend::Scraper, HtmlBackend::Builtin] {
        let urls = run(source, backend);
        assert!(urls.contains(&"/login".to_string()), "{backend:?}: {urls:?}");
        assert!(
            urls.contains(&"https://cdn.example.com/logo.png".to_string()),
            "{backend:?}: {urls:?}"
        );
    }
}

#[test]
fn the_html_string_itself_is_not_emitted() {
    let source = r#"render('<form action="/submit"></form>');"#;
    for backend in [HtmlBackend::Scraper, HtmlBackend::Builtin] {
        let urls = run(source, backend);
        assert_eq!(urls, vec!["/submit".to_string()], "{backend:?}");
    }
}

#[test]
fn srcset_descriptors_are_split() {
    let source = r#"el.innerHTML = '<img srcset="/img/small.png 1x, /img/large.png 2x">';"#;
    for backend in [HtmlBackend::Scraper, HtmlBackend::Builtin] {
        let urls = run(source, backend);
        assert!(urls.contains(&"/img/small.png".to_string()), "{backend:?}");
        assert!(urls.contains(&"/img/large.png".to_string()), "{backend:?}");
    }
}

#[test]
fn inline_scripts_are_traversed() {
    let source = r#"const page = '<div><script>fetch("/api/from-inline-script");</script></div>';"#;
    for backend in [HtmlBackend::Scraper, HtmlBackend::Builtin] {
        let urls = run(source, backend);
        assert!(
            urls.contains(&"/api/from-inline-script".to_string()),
            "{backend:?}: {urls:?}"
        );
    }
}

#[test]
fn html_in_recorded_bindings_is_still_scanned() {
    let source = r#"const tpl = '<a href="/docs/start">docs</a>'; el.innerHTML = tpl;"#;
    for backend in [HtmlBackend::Scraper, HtmlBackend::Builtin] {
        let urls = run(source, backend);
        assert!(urls.contains(&"/docs/start".to_string()), "{backend:?}");
    }
}

#[test]
fn fragment_and_pseudo_urls_are_skipped() {
    let source = r##"render('<a href="#top">x</a><a href="javascript:void(0)">y</a>');"##;
    for backend in [HtmlBackend::Scraper, HtmlBackend::Builtin] {
        assert!(run(source, backend).is_empty(), "{backend:?}");
    }
}
