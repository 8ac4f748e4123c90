//! Candidate filtering: URL/path shape detection, junk rejection, and
//! cleanup of concatenation artifacts.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

const DEFAULT_EXTENSIONS: &[&str] = &[
    "avif", "css", "csv", "eot", "gif", "gz", "htm", "html", "ico", "jpeg", "jpg", "js", "json",
    "map", "md", "mjs", "mp3", "mp4", "ogg", "otf", "pdf", "png", "svg", "tar", "ttf", "txt",
    "wasm", "webm", "webp", "woff", "woff2", "xml", "yaml", "yml", "zip",
];

const MIME_CLASSES: &[&str] = &[
    "application",
    "audio",
    "chemical",
    "font",
    "image",
    "message",
    "model",
    "multipart",
    "text",
    "video",
];

const NAMESPACE_PREFIXES: &[&str] = &[
    "http://www.w3.org/",
    "http://schemas.xmlsoap.org/",
    "http://schemas.microsoft.com/",
    "http://xmlns.com/",
];

const GENERIC_TEST_URLS: &[&str] = &["http://localhost", "http://a", "http://b", "http://test/path"];

fn protocol_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://").unwrap())
}

fn bare_protocol_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://?$").unwrap())
}

fn common_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(www|api|cdn)\.").unwrap())
}

fn ip_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}(:\d+)?(/|$)").unwrap())
}

fn domain_tld_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9-]+\.[a-zA-Z0-9-]+\.[a-zA-Z]{2,}").unwrap())
}

fn domain_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9-]+\.[a-zA-Z0-9-]+/").unwrap())
}

fn abs_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^/[a-zA-Z0-9_-]{2,}").unwrap())
}

fn api_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_-]*/[a-zA-Z0-9]").unwrap())
}

fn dotted_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)+$").unwrap()
    })
}

fn mime_shape_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z]+/[a-z0-9.+-]+(;.*)?$").unwrap())
}

fn single_param_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^/\{[^}]+\}$").unwrap())
}

fn timezone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(Africa|America|Antarctica|Arctic|Asia|Atlantic|Australia|Europe|Indian|Pacific|Etc|US|Canada|Mexico|Brazil|Chile)/[A-Za-z0-9_+-]+(/[A-Za-z0-9_+-]+)?(\|.+)?$",
        )
        .unwrap()
    })
}

fn date_format_res() -> &'static Vec<Regex> {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            r"(?i)^/+(\{?y{2,4}\}?)[/-](\{?m{1,2}\}?)[/-](\{?d{1,2}\}?)/?$",
            r"(?i)^/+(\{?d{1,2}\}?)[/-](\{?m{1,2}\}?)[/-](\{?y{2,4}\}?)/?$",
            r"(?i)^/+(\{?m{1,2}\}?)[/-](\{?d{1,2}\}?)[/-](\{?y{2,4}\}?)/?$",
            r"(?i)^/+(\{?h{1,2}\}?):(\{?m{1,2}\}?)(:(\{?s{1,2}\}?))?/?$",
            r"(?i)^(y{2,4}|m{1,2}|d{1,2})[/-](y{2,4}|m{1,2}|d{1,2})[/-](y{2,4}|m{1,2}|d{1,2})$",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).unwrap())
        .collect()
    })
}

fn js_api_res() -> &'static Vec<Regex> {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            r"^(Function|Object|Array|String|Number|Boolean|Symbol|Map|Set|WeakMap|WeakSet|Promise|Proxy|Reflect)\.",
            r"\.prototype\.",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).unwrap())
        .collect()
    })
}

fn backref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\d").unwrap())
}

fn template_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{[^{}]*\}").unwrap())
}

fn embedded_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"https?://[^\s<>"{}|\\^`\[\]]+"#).unwrap())
}

const KNOWN_TLDS: &[&str] = &[
    "ai", "app", "au", "biz", "br", "ca", "cloud", "cn", "co", "com", "de", "dev", "edu", "fr",
    "gov", "in", "info", "int", "io", "jp", "me", "mil", "net", "org", "ru", "tv", "uk", "us",
    "xyz",
];

fn has_known_tld(text: &str) -> bool {
    let last = text.rsplit('.').next().unwrap_or("");
    KNOWN_TLDS.contains(&last.to_ascii_lowercase().as_str())
}

const CSS_UNITS: &[&str] = &[
    "px", "em", "rem", "%", "vh", "vw", "vmin", "vmax", "ch", "ex", "pt", "pc", "in", "cm", "mm",
    "deg", "rad", "turn", "s", "ms",
];

/// Detects text that is a URL with a protocol, a protocol-relative
/// reference, a known hostname prefix, an IP address, or a domain with a
/// TLD-like structure.
pub fn is_url_pattern(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    if protocol_re().is_match(text) || text.starts_with("//") {
        return true;
    }
    if common_prefix_re().is_match(text) || ip_re().is_match(text) {
        return true;
    }
    domain_tld_re().is_match(text) || domain_path_re().is_match(text)
}

/// Detects absolute paths, relative paths, and `api/users`-shaped
/// endpoint fragments.
pub fn is_path_pattern(text: &str) -> bool {
    if text.is_empty() || text.starts_with("//") {
        return false;
    }
    abs_path_re().is_match(text) || text.starts_with("./") || text.starts_with("../")
        || api_path_re().is_match(text)
}

/// Detects bare filenames whose extension belongs to the built-in set or
/// the user-supplied additions.
pub fn is_filename_pattern(text: &str, extra_extensions: &HashSet<String>) -> bool {
    let segment = text.rsplit('/').next().unwrap_or(text);
    let Some((stem, ext)) = segment.rsplit_once('.') else {
        return false;
    };
    if stem.is_empty() || ext.is_empty() {
        return false;
    }
    let ext = ext.to_ascii_lowercase();
    DEFAULT_EXTENSIONS.binary_search(&ext.as_str()).is_ok() || extra_extensions.contains(&ext)
}

/// Removes trailing unbalanced brackets and parentheses, as left behind
/// when a URL is pasted inside prose or a regex artifact.
pub fn clean_unbalanced_brackets(text: &str) -> &str {
    let mut stack: Vec<u8> = Vec::new();
    for (idx, byte) in text.bytes().enumerate() {
        match byte {
            b'(' | b'[' | b'{' => stack.push(byte),
            b')' | b']' | b'}' => {
                let opener = match byte {
                    b')' => b'(',
                    b']' => b'[',
                    _ => b'{',
                };
                if stack.last() == Some(&opener) {
                    stack.pop();
                } else {
                    return &text[..idx];
                }
            }
            _ => {}
        }
    }
    text
}

/// Collapses runs of adjacent placeholders produced by neighboring
/// template substitutions (`{t}{i}` becomes one placeholder, not two).
pub fn consolidate_adjacent_placeholders(text: &str, placeholder: &str) -> String {
    if placeholder.is_empty() || !text.contains(placeholder) {
        return text.to_string();
    }
    let pattern = format!("({}){{2,}}", regex::escape(placeholder));
    let re = Regex::new(&pattern).unwrap();
    re.replace_all(text, placeholder).into_owned()
}

/// Substitutes every `{name}` token with the placeholder and collapses
/// adjacent repeats.
pub fn fill_placeholders(template: &str, placeholder: &str) -> String {
    let filled = template_token_re().replace_all(template, placeholder);
    consolidate_adjacent_placeholders(&filled, placeholder)
}

/// Extracts full `http(s)://` URLs embedded inside longer free text.
pub fn embedded_urls(text: &str) -> Vec<String> {
    embedded_url_re()
        .find_iter(text)
        .map(|found| found.as_str().to_string())
        .collect()
}

/// Rejects candidates that match a known non-URL shape.
pub fn is_junk(text: &str, placeholder: &str, extra_extensions: &HashSet<String>) -> bool {
    if text.is_empty() {
        return true;
    }

    // MIME types, with or without parameters
    let base = text.split(';').next().unwrap_or(text).trim();
    if mime_shape_re().is_match(base) {
        let class = base.split('/').next().unwrap_or("");
        if MIME_CLASSES.contains(&class) {
            return true;
        }
    }

    // incomplete protocols
    if matches!(text, "http://" | "https://" | "//" | "https:" | "http:")
        || bare_protocol_re().is_match(text)
    {
        return true;
    }

    // protocol plus bare placeholder carries no information
    if text == format!("https://{placeholder}")
        || text == format!("https://{placeholder}/")
        || text == format!("http://{placeholder}")
        || text == format!("http://{placeholder}/")
    {
        return true;
    }

    // dotted identifier paths, unless they name a real file or read as a
    // hostname with a recognizable TLD
    if !text.contains('/')
        && dotted_path_re().is_match(text)
        && !is_filename_pattern(text, extra_extensions)
        && !has_known_tld(text)
    {
        return true;
    }

    // XML namespace URIs
    if NAMESPACE_PREFIXES
        .iter()
        .any(|prefix| text.starts_with(prefix))
    {
        return true;
    }

    if single_param_re().is_match(text) {
        return true;
    }

    if GENERIC_TEST_URLS.contains(&text) {
        return true;
    }

    if text == "./"
        || text == "/?"
        || text == format!("/{placeholder}")
        || text == format!("//{placeholder}")
    {
        return true;
    }

    // placeholder-only paths: FUZZ/FUZZ, FUZZ/FUZZ/FUZZ, ...
    if text
        .split('/')
        .all(|segment| segment.is_empty() || segment == placeholder)
        && text.contains(placeholder)
    {
        return true;
    }

    if date_format_res().iter().any(|re| re.is_match(text)) {
        return true;
    }

    if timezone_re().is_match(text) {
        return true;
    }

    // CSS unit artifacts from template strings like `${value}px`
    if let Some(rest) = text.strip_prefix(placeholder) {
        if CSS_UNITS.contains(&rest) {
            return true;
        }
    }

    // regex replacement artifacts: $1/$2, (/$1)?$2
    if backref_re().is_match(text) {
        return true;
    }

    // after stripping placeholders and tokens, something real must remain
    let stripped = template_token_re()
        .replace_all(text, "")
        .replace(placeholder, "");
    if !stripped.is_empty() && !stripped.bytes().any(|b| b.is_ascii_alphanumeric()) {
        return true;
    }

    if js_api_res().iter().any(|re| re.is_match(text)) {
        return true;
    }

    // concatenation artifacts ending mid-string
    if text.ends_with('\'') || text.ends_with('"') || text.ends_with('(') {
        return true;
    }

    false
}

/// Structural URL signal: a scheme, a rooted path, or a dotted host or
/// filename. `api/users` alone does not qualify; `api.example.com` does.
fn has_structural_signal(text: &str, extra_extensions: &HashSet<String>) -> bool {
    if is_url_pattern(text) {
        return true;
    }
    if abs_path_re().is_match(text) || text.starts_with("./") || text.starts_with("../") {
        return true;
    }
    is_filename_pattern(text, extra_extensions)
}

/// The full gate a candidate must pass to be emitted: a structural URL
/// signal, and not junk.
pub fn keeps(text: &str, placeholder: &str, extra_extensions: &HashSet<String>) -> bool {
    has_structural_signal(text, extra_extensions) && !is_junk(text, placeholder, extra_extensions)
}
