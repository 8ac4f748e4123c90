use urx::parser::SourceUnit;
use urx::urls::context::{ContextPolicy, parse_context_args};
use urx::urls::{UrlConfig, extract_urls};

fn run(source: &str, config: &UrlConfig) -> Vec<String> {
    let unit = SourceUnit::parse(source.to_string()).unwrap();
    extract_urls(&unit, config).unwrap()
}

fn run_default(source: &str) -> Vec<String> {
    run(source, &UrlConfig::default())
}

fn with_templates() -> UrlConfig {
    UrlConfig {
        include_templates: true,
        ..UrlConfig::default()
    }
}

#[test]
fn binary_concatenation_resolves() {
    let urls = run_default(r#"const base="/api"; const url=base+"/users";"#);
    assert_eq!(urls, vec!["/api/users".to_string()]);
}

#[test]
fn template_substitution_emits_all_forms() {
    let urls = run(
        r#"const id="123"; const u=`/users/${id}/profile`;"#,
        &with_templates(),
    );
    assert_eq!(
        urls,
        vec![
            "/users/123/profile".to_string(),
            "/users/{id}/profile".to_string(),
            "/users/FUZZ/profile".to_string(),
        ]
    );
}

#[test]
fn template_substitution_default_emits_resolved_only() {
    let urls = run_default(r#"const id="123"; const u=`/users/${id}/profile`;"#);
    assert_eq!(urls, vec!["/users/123/profile".to_string()]);
}

#[test]
fn window_location_origin_uses_default() {
    let urls = run_default(r#"const u = window.location.origin + "/api/users";"#);
    assert_eq!(urls, vec!["https://FUZZ/api/users".to_string()]);
}

#[test]
fn array_join_resolves() {
    let urls = run_default(r#"const p=["/api","/v2","/users"]; const u=p.join("");"#);
    assert_eq!(urls, vec!["/api/v2/users".to_string()]);
}

#[test]
fn array_join_with_separator() {
    let urls = run_default(r#"const p=["api","v2","users"]; const u="/" + p.join("/");"#);
    assert_eq!(urls, vec!["/api/v2/users".to_string()]);
}

#[test]
fn replace_chain_resolves() {
    let urls = run_default(
        r#"const t="/api/{env}/{r}"; const u=t.replace("{env}","prod").replace("{r}","users");"#,
    );
    assert_eq!(urls, vec!["/api/prod/users".to_string()]);
}

#[test]
fn replace_with_regex_literal() {
    let urls = run_default(r#"const u = "/api/v1/users".replace(/v1/, "v2");"#);
    assert_eq!(urls, vec!["/api/v2/users".to_string()]);
}

#[test]
fn replace_global_regex_replaces_all() {
    let urls = run_default(r#"const u = "/a-b/c-d".replace(/-/g, "_");"#);
    assert_eq!(urls, vec!["/a_b/c_d".to_string()]);
}

#[test]
fn replace_string_pattern_replaces_first_occurrence_only() {
    let urls = run_default(r#"const u = "/api/api/users".replace("/api", "/v2");"#);
    assert_eq!(urls, vec!["/v2/api/users".to_string()]);
}

#[test]
fn concat_method_resolves() {
    let urls = run_default(r#"const base = "/api"; const u = base.concat("/v2", "/users");"#);
    assert_eq!(urls, vec!["/api/v2/users".to_string()]);
}

#[test]
fn junk_is_filtered() {
    let urls = run_default(
        r#""application/json"; "https://"; "user.profile.name"; "http://www.w3.org/2000/svg"; "/api/v2/users";"#,
    );
    assert_eq!(urls, vec!["/api/v2/users".to_string()]);
}

#[test]
fn context_override_wins() {
    let context = parse_context_args(&["t=/api".to_string()]).unwrap();
    let config = UrlConfig {
        include_templates: true,
        context,
        context_policy: ContextPolicy::Override,
        ..UrlConfig::default()
    };
    let urls = run(r#"const t="/v2"; const u=`${t}/users`;"#, &config);
    assert_eq!(urls, vec!["/api/users".to_string()]);
}

#[test]
fn output_is_deterministic() {
    let source = r#"
const base = "/api";
const versions = ["/v1", "/v2"];
const u = base + versions.join("|");
fetch(`/users/${base}/x`);
"#;
    let first = run_default(source);
    let second = run_default(source);
    assert_eq!(first, second);
}

#[test]
fn duplicates_collapse_to_first_discovery() {
    let urls = run_default(r#"fetch("/api/users"); fetch("/api/users"); fetch("/api/other");"#);
    assert_eq!(
        urls,
        vec!["/api/users".to_string(), "/api/other".to_string()]
    );
}

#[test]
fn node_budget_terminates_traversal() {
    let source = r#""/api/first"; "/api/second"; "/api/third";"#.repeat(50);
    let config = UrlConfig {
        max_nodes: 10,
        ..UrlConfig::default()
    };
    let unit = SourceUnit::parse(source).unwrap();
    let urls = extract_urls(&unit, &config).unwrap();
    // partial results, never more than the budget allowed to discover
    assert!(urls.len() <= 10);
}

#[test]
fn route_params_are_normalized() {
    let urls = run(r#"fetch("/users/:id/posts/:postId");"#, &with_templates());
    assert!(urls.contains(&"/users/{id}/posts/{postId}".to_string()));
    assert!(urls.contains(&"/users/FUZZ/posts/FUZZ".to_string()));
    for url in &urls {
        assert!(!url.contains("/:"), "{url}");
    }
}

#[test]
fn bracket_route_params_are_normalized() {
    let urls = run(
        r#"fetch("/archives/vendor-list-v[VERSION].json");"#,
        &with_templates(),
    );
    assert!(urls.contains(&"/archives/vendor-list-v{VERSION}.json".to_string()));
    assert!(!urls.iter().any(|url| url.contains('[')));
}

#[test]
fn unresolved_template_variable_becomes_placeholder() {
    let urls = run_default(r#"fetch(`/users/${whoKnows}/profile`);"#);
    assert_eq!(urls, vec!["/users/FUZZ/profile".to_string()]);
}

#[test]
fn custom_placeholder_is_honored() {
    let config = UrlConfig {
        placeholder: "INJECT".to_string(),
        ..UrlConfig::default()
    };
    let urls = run(r#"fetch(`/users/${whoKnows}/profile`);"#, &config);
    assert_eq!(urls, vec!["/users/INJECT/profile".to_string()]);
}

#[test]
fn fetch_identifier_argument_is_evaluated() {
    let urls = run_default(r#"const target = "/api/feed"; fetch(target);"#);
    assert_eq!(urls, vec!["/api/feed".to_string()]);
}

#[test]
fn location_assignment_forces_evaluation() {
    let urls = run_default(r#"const next = "/after/login"; window.location = next;"#);
    assert_eq!(urls, vec!["/after/login".to_string()]);
}

#[test]
fn set_attribute_href_is_a_sink() {
    let urls = run_default(r#"const page = "/docs/intro"; anchor.setAttribute("href", page);"#);
    assert_eq!(urls, vec!["/docs/intro".to_string()]);
}

#[test]
fn ternary_unions_both_branches() {
    let urls = run_default(r#"fetch(dev ? "/api/staging/users" : "/api/prod/users");"#);
    assert!(urls.contains(&"/api/staging/users".to_string()));
    assert!(urls.contains(&"/api/prod/users".to_string()));
}

#[test]
fn logical_or_takes_fallback() {
    let urls = run_default(r#"const base = window.API_BASE || "/api/v3"; fetch(base + "/users");"#);
    assert!(urls.contains(&"/api/v3/users".to_string()));
}

#[test]
fn escaped_literals_are_decoded() {
    let urls = run_default(r#"fetch("\x2fapi\x2fusers?id\u{3D}1");"#);
    assert_eq!(urls, vec!["/api/users?id=1".to_string()]);
}

#[test]
fn commented_out_code_is_scanned() {
    let urls = run_default("// fetch(\"/api/legacy/endpoint\");\nfetch(\"/api/current\");");
    assert!(urls.contains(&"/api/legacy/endpoint".to_string()));
    assert!(urls.contains(&"/api/current".to_string()));
}

#[test]
fn urls_inside_prose_strings_are_found() {
    let urls = run_default(r#"const msg = "see https://docs.example.com/guide for details"; log(msg);"#);
    assert_eq!(urls, vec!["https://docs.example.com/guide".to_string()]);
}

#[test]
fn aliases_prefer_informative_names() {
    let source = r#"
const t = "space-1";
const params = { spaceKey: t };
const u = `/spaces/${t}/pages`;
"#;
    let urls = run(source, &with_templates());
    assert!(urls.contains(&"/spaces/{spaceKey}/pages".to_string()), "{urls:?}");
    assert!(urls.contains(&"/spaces/space-1/pages".to_string()));
}

#[test]
fn skip_aliases_uses_raw_names() {
    let source = r#"
const t = "space-1";
const params = { spaceKey: t };
const u = `/spaces/${t}/pages`;
"#;
    let config = UrlConfig {
        include_templates: true,
        skip_aliases: true,
        ..UrlConfig::default()
    };
    let urls = run(source, &config);
    assert!(urls.contains(&"/spaces/{t}/pages".to_string()), "{urls:?}");
}

#[test]
fn skip_symbols_degrades_identifiers() {
    let config = UrlConfig {
        skip_symbols: true,
        ..UrlConfig::default()
    };
    // the literal surfaces on its own, the concatenation cannot resolve
    // and its placeholder form has no structural signal
    let urls = run(r#"const base="/api"; fetch(base + "/users");"#, &config);
    assert_eq!(urls, vec!["/api".to_string()]);
}
