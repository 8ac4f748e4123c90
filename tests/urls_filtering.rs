use urx::parser::SourceUnit;
use urx::urls::{UrlConfig, extract_urls};

fn run(source: &str) -> Vec<String> {
    let unit = SourceUnit::parse(source.to_string()).unwrap();
    extract_urls(&unit, &UrlConfig::default()).unwrap()
}

#[test]
fn mime_types_are_rejected() {
    let urls = run(r#""application/json"; "text/html; charset=utf-8"; "image/svg+xml";"#);
    assert!(urls.is_empty(), "{urls:?}");
}

#[test]
fn incomplete_protocols_are_rejected() {
    let urls = run(r#""http://"; "https://"; "//"; "http:"; "https:"; "ftp://";"#);
    assert!(urls.is_empty(), "{urls:?}");
}

#[test]
fn property_paths_are_rejected_but_hostnames_pass() {
    let urls = run(r#""util.promisify.custom"; "user.profile.name"; "api.example.com";"#);
    assert_eq!(urls, vec!["api.example.com".to_string()]);
}

#[test]
fn namespace_uris_are_rejected() {
    let urls = run(
        r#""http://www.w3.org/2000/svg"; "http://www.w3.org/1999/xhtml"; "http://schemas.xmlsoap.org/soap/envelope/";"#,
    );
    assert!(urls.is_empty(), "{urls:?}");
}

#[test]
fn generic_test_urls_are_rejected() {
    let urls = run(r#""http://localhost"; "http://a"; "http://b"; "http://localhost:3000/api";"#);
    assert_eq!(urls, vec!["http://localhost:3000/api".to_string()]);
}

#[test]
fn timezone_identifiers_are_rejected() {
    let urls = run(r#""America/New_York"; "Europe/Bucharest"; "Asia/Tokyo"; "/api/timezones";"#);
    assert_eq!(urls, vec!["/api/timezones".to_string()]);
}

#[test]
fn date_placeholders_are_rejected() {
    let urls = run(r#""/yyyy/mm/dd/"; "/YYYY-MM-DD"; "MM/DD/YYYY"; "/api/2024/01/15";"#);
    assert_eq!(urls, vec!["/api/2024/01/15".to_string()]);
}

#[test]
fn placeholder_only_candidates_are_rejected() {
    let urls = run(r#"fetch(`${a}/${b}`); fetch(`/api/${a}/${b}`);"#);
    assert_eq!(urls, vec!["/api/FUZZ/FUZZ".to_string()]);
}

#[test]
fn trailing_unbalanced_brackets_are_trimmed() {
    let urls = run(r#""see https://github.com/user/repo) for the code";"#);
    assert_eq!(urls, vec!["https://github.com/user/repo".to_string()]);
}

#[test]
fn balanced_brackets_survive() {
    let urls = run(r#""https://example.com/path(v2)/data";"#);
    assert_eq!(urls, vec!["https://example.com/path(v2)/data".to_string()]);
}

#[test]
fn filenames_with_custom_extensions_are_kept() {
    let unit = SourceUnit::parse(r#""vendor.chunk"; "app.tsx";"#.to_string()).unwrap();
    let config = UrlConfig {
        extensions: ["chunk".to_string(), "tsx".to_string()].into_iter().collect(),
        ..UrlConfig::default()
    };
    let urls = extract_urls(&unit, &config).unwrap();
    assert!(urls.contains(&"vendor.chunk".to_string()), "{urls:?}");
    assert!(urls.contains(&"app.tsx".to_string()), "{urls:?}");
}

#[test]
fn filenames_without_known_extensions_are_rejected() {
    let urls = run(r#""vendor.chunk"; "app.unknownext";"#);
    assert!(urls.is_empty(), "{urls:?}");
}

#[test]
fn bare_relative_segments_are_rejected() {
    let urls = run(r#""api/users"; "FUZZ/users"; "./local/config.json";"#);
    assert_eq!(urls, vec!["./local/config.json".to_string()]);
}

#[test]
fn protocol_relative_urls_pass() {
    let urls = run(r#""//cdn.example.com/app.js";"#);
    assert_eq!(urls, vec!["//cdn.example.com/app.js".to_string()]);
}

#[test]
fn ip_addresses_pass() {
    let urls = run(r#""192.168.1.100"; "10.0.0.50:8080"; "http://192.168.1.100/admin";"#);
    assert_eq!(
        urls,
        vec![
            "192.168.1.100".to_string(),
            "10.0.0.50:8080".to_string(),
            "http://192.168.1.100/admin".to_string(),
        ]
    );
}
