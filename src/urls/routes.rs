//! Route-parameter normalization: `:id` and `[VERSION]` become `{id}` and
//! `{VERSION}` so every parameter renders in one syntax.

use regex::Regex;
use std::sync::OnceLock;

fn colon_param_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(^|/):([A-Za-z_][A-Za-z0-9_]*)").unwrap())
}

fn bracket_param_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([A-Za-z_][A-Za-z0-9_]*)\]").unwrap())
}

/// Rewrites route parameters into `{name}` form. Returns the converted
/// text and whether any parameter was found.
pub fn convert_route_params(text: &str) -> (String, bool) {
    let mut converted = text.to_string();
    let mut has_params = false;
    if colon_param_re().is_match(&converted) {
        converted = colon_param_re()
            .replace_all(&converted, "$1{$2}")
            .into_owned();
        has_params = true;
    }
    if bracket_param_re().is_match(&converted) {
        converted = bracket_param_re()
            .replace_all(&converted, "{$1}")
            .into_owned();
        has_params = true;
    }
    (converted, has_params)
}

#[cfg(test)]
mod tests {
    use super::convert_route_params;

    #[test]
    fn converts_colon_params() {
        let (converted, found) = convert_route_params("/users/:id/posts/:postId");
        assert!(found);
        assert_eq!(converted, "/users/{id}/posts/{postId}");
    }

    #[test]
    fn converts_colon_param_at_start() {
        let (converted, found) = convert_route_params(":slug/comments");
        assert!(found);
        assert_eq!(converted, "{slug}/comments");
    }

    #[test]
    fn leaves_mid_segment_colons_alone() {
        let (converted, found) = convert_route_params("http://example.com:8080/x");
        assert!(!found);
        assert_eq!(converted, "http://example.com:8080/x");
    }

    #[test]
    fn converts_bracket_params() {
        let (converted, found) = convert_route_params("archives/vendor-list-v[VERSION].json");
        assert!(found);
        assert_eq!(converted, "archives/vendor-list-v{VERSION}.json");
    }

    #[test]
    fn static_paths_pass_through() {
        let (converted, found) = convert_route_params("/static/path");
        assert!(!found);
        assert_eq!(converted, "/static/path");
    }
}
