//! Sanitization policy: which tags, attributes, and URL schemes survive.
//!
//! A policy is an allow-list. Anything absent is rejected by the sanitizers,
//! and a handful of constructs are rejected unconditionally no matter what
//! the policy says: `script`/`iframe` elements, `on*` event-handler
//! attributes, and `javascript:`/`data:` URL schemes.

use serde::{Deserialize, Serialize};

/// Attribute names a policy is allowed to grant. Per-tag allowances are
/// intersected with this set when the policy is normalized; anything outside
/// it is dropped with a warning.
pub const SAFE_ATTRIBUTES: &[&str] = &[
    "abbr", "align", "alt", "cite", "class", "colspan", "datetime", "dir", "height", "href",
    "hreflang", "id", "lang", "name", "rel", "rowspan", "scope", "span", "src", "start", "target",
    "title", "type", "width",
];

/// Schemes that are never allowed on `href`/`src`, policy or not.
pub const BLOCKED_SCHEMES: &[&str] = &["javascript", "data", "vbscript"];

/// Replacement value for a neutralized `href`/`src`.
pub const NEUTRALIZED_URL: &str = "#";

/// One allow-list entry: a tag and the attributes permitted on it.
///
/// An empty `attributes` list keeps the tag but strips every attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRule {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<String>,
}

impl TagRule {
    pub fn new(name: &str, attributes: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            attributes: attributes.iter().map(|a| (*a).to_owned()).collect(),
        }
    }
}

/// Allow-list of tags, per-tag attributes, and URL schemes.
///
/// An empty policy means "no restriction beyond the unconditional
/// blocklist": every tag except `script`/`iframe` survives, every attribute
/// except event handlers survives, and every scheme except
/// [`BLOCKED_SCHEMES`] passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SanitizePolicy {
    pub tags: Vec<TagRule>,
    pub schemes: Vec<String>,
}

impl SanitizePolicy {
    /// Empty policy: unconditional blocklist only.
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// The baseline allow-list shipped with the CMS. Covers everything the
    /// markdown converter emits plus the inline formatting vocabulary.
    pub fn baseline() -> Self {
        let tags = vec![
            TagRule::new("p", &[]),
            TagRule::new("br", &[]),
            TagRule::new("hr", &[]),
            TagRule::new("h1", &["id"]),
            TagRule::new("h2", &["id"]),
            TagRule::new("h3", &["id"]),
            TagRule::new("h4", &["id"]),
            TagRule::new("h5", &["id"]),
            TagRule::new("h6", &["id"]),
            TagRule::new("a", &["href", "title", "rel", "hreflang"]),
            TagRule::new("strong", &[]),
            TagRule::new("em", &[]),
            TagRule::new("b", &[]),
            TagRule::new("i", &[]),
            TagRule::new("u", &[]),
            TagRule::new("s", &[]),
            TagRule::new("del", &["cite", "datetime"]),
            TagRule::new("ins", &["cite", "datetime"]),
            TagRule::new("mark", &[]),
            TagRule::new("sub", &[]),
            TagRule::new("sup", &["class"]),
            TagRule::new("span", &["class", "id", "lang", "dir"]),
            TagRule::new("div", &["class", "id"]),
            TagRule::new("ul", &[]),
            TagRule::new("ol", &["start"]),
            TagRule::new("li", &[]),
            TagRule::new("dl", &[]),
            TagRule::new("dt", &[]),
            TagRule::new("dd", &[]),
            TagRule::new("blockquote", &["cite", "class"]),
            TagRule::new("pre", &[]),
            TagRule::new("code", &["class"]),
            TagRule::new("img", &["src", "alt", "title", "width", "height"]),
            TagRule::new("figure", &[]),
            TagRule::new("figcaption", &[]),
            TagRule::new("table", &[]),
            TagRule::new("thead", &[]),
            TagRule::new("tbody", &[]),
            TagRule::new("tr", &[]),
            TagRule::new("th", &["colspan", "rowspan", "scope", "align"]),
            TagRule::new("td", &["colspan", "rowspan", "align"]),
            TagRule::new("input", &["type"]),
            TagRule::new("abbr", &["title"]),
        ];
        let schemes = vec![
            "http".to_owned(),
            "https".to_owned(),
            "mailto".to_owned(),
            "tel".to_owned(),
        ];
        Self { tags, schemes }.normalized()
    }

    /// Clamp per-tag attribute allowances to [`SAFE_ATTRIBUTES`] and
    /// lower-case every name. Entries outside the universe are dropped.
    pub fn normalized(mut self) -> Self {
        for rule in &mut self.tags {
            rule.name = rule.name.to_ascii_lowercase();
            let tag = rule.name.clone();
            rule.attributes.retain_mut(|attr| {
                *attr = attr.to_ascii_lowercase();
                if SAFE_ATTRIBUTES.contains(&attr.as_str()) {
                    true
                } else {
                    tracing::warn!(tag = %tag, attribute = %attr, "dropping attribute outside the safe universe");
                    false
                }
            });
        }
        for scheme in &mut self.schemes {
            *scheme = scheme.to_ascii_lowercase();
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Is `tag` on the allow-list? An empty policy allows everything; the
    /// unconditional element blocklist is enforced by the sanitizers, not
    /// here.
    pub fn allows_tag(&self, tag: &str) -> bool {
        if self.tags.is_empty() {
            return true;
        }
        self.tags.iter().any(|rule| rule.name == tag)
    }

    /// Is `attr` permitted on `tag`? Event handlers are never permitted.
    pub fn allows_attribute(&self, tag: &str, attr: &str) -> bool {
        if is_event_handler(attr) {
            return false;
        }
        if self.tags.is_empty() {
            return true;
        }
        self.tags
            .iter()
            .find(|rule| rule.name == tag)
            .is_some_and(|rule| rule.attributes.iter().any(|a| a == attr))
    }

    /// Scheme check for `href`/`src` values. Relative URLs always pass.
    /// With a non-empty scheme list the scheme must be listed; the hard
    /// blocklist wins either way.
    pub fn is_safe_url(&self, url: &str) -> bool {
        match url_scheme(url) {
            None => true,
            Some(scheme) => {
                if BLOCKED_SCHEMES.contains(&scheme.as_str()) {
                    return false;
                }
                self.schemes.is_empty() || self.schemes.iter().any(|s| *s == scheme)
            }
        }
    }
}

/// `on*` attribute names are event handlers, matched case-insensitively.
pub fn is_event_handler(attr: &str) -> bool {
    let mut chars = attr.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some('o' | 'O'), Some('n' | 'N'))
    )
}

/// Extract the scheme of a URL, lower-cased, or `None` for relative URLs.
///
/// ASCII whitespace and control characters are ignored so that obfuscated
/// values like `" java\tscript:..."` still resolve to their real scheme. The
/// scheme is only ever inspected, never executed or resolved.
pub fn url_scheme(url: &str) -> Option<String> {
    let mut scheme = String::new();
    for c in url.chars() {
        if c.is_ascii_whitespace() || c.is_ascii_control() {
            continue;
        }
        match c {
            ':' => return (!scheme.is_empty()).then_some(scheme),
            '/' | '?' | '#' => return None,
            _ => {
                if scheme.len() >= 64 {
                    return None;
                }
                scheme.push(c.to_ascii_lowercase());
            }
        }
    }
    None
}

/// Does the URL carry a scheme from the hard blocklist?
pub fn has_blocked_scheme(url: &str) -> bool {
    url_scheme(url).is_some_and(|s| BLOCKED_SCHEMES.contains(&s.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_scheme_plain() {
        assert_eq!(url_scheme("https://example.com"), Some("https".to_owned()));
        assert_eq!(url_scheme("MAILTO:a@b.c"), Some("mailto".to_owned()));
    }

    #[test]
    fn test_url_scheme_relative() {
        assert_eq!(url_scheme("/path/to/page"), None);
        assert_eq!(url_scheme("page.html"), None);
        assert_eq!(url_scheme("#fragment"), None);
        assert_eq!(url_scheme("?query=1"), None);
        assert_eq!(url_scheme(""), None);
    }

    #[test]
    fn test_url_scheme_obfuscated() {
        assert_eq!(
            url_scheme("  \tjavascript:alert(1)"),
            Some("javascript".to_owned())
        );
        assert_eq!(
            url_scheme("java\nscript:alert(1)"),
            Some("javascript".to_owned())
        );
        assert_eq!(url_scheme("JaVaScRiPt:alert(1)"), Some("javascript".to_owned()));
    }

    #[test]
    fn test_blocked_schemes() {
        assert!(has_blocked_scheme("javascript:alert(1)"));
        assert!(has_blocked_scheme("data:text/html,<script>"));
        assert!(!has_blocked_scheme("https://example.com"));
        assert!(!has_blocked_scheme("/relative"));
    }

    #[test]
    fn test_event_handler_names() {
        assert!(is_event_handler("onclick"));
        assert!(is_event_handler("ONERROR"));
        assert!(is_event_handler("onmouseover"));
        assert!(!is_event_handler("href"));
        assert!(!is_event_handler("name"));
        assert!(!is_event_handler("o"));
    }

    #[test]
    fn test_empty_policy_allows_everything_except_handlers() {
        let policy = SanitizePolicy::unrestricted();
        assert!(policy.allows_tag("marquee"));
        assert!(policy.allows_attribute("p", "class"));
        assert!(!policy.allows_attribute("p", "onclick"));
        assert!(policy.is_safe_url("ftp://example.com"));
        assert!(!policy.is_safe_url("javascript:alert(1)"));
    }

    #[test]
    fn test_baseline_policy_lookups() {
        let policy = SanitizePolicy::baseline();
        assert!(policy.allows_tag("a"));
        assert!(policy.allows_attribute("a", "href"));
        assert!(!policy.allows_attribute("a", "onclick"));
        assert!(!policy.allows_tag("script"));
        assert!(!policy.allows_tag("iframe"));
        // p is allowed with zero attributes
        assert!(policy.allows_tag("p"));
        assert!(!policy.allows_attribute("p", "class"));
    }

    #[test]
    fn test_scheme_allow_list() {
        let policy = SanitizePolicy::baseline();
        assert!(policy.is_safe_url("https://example.com/x"));
        assert!(policy.is_safe_url("mailto:care@example.com"));
        assert!(policy.is_safe_url("/relative/link"));
        assert!(!policy.is_safe_url("ftp://example.com"));
        assert!(!policy.is_safe_url("javascript:alert(1)"));
        assert!(!policy.is_safe_url("  data:text/html,x"));
    }

    #[test]
    fn test_normalization_drops_unsafe_attribute_grants() {
        let policy = SanitizePolicy {
            tags: vec![TagRule::new("A", &["HREF", "style", "onclick"])],
            schemes: vec!["HTTPS".to_owned()],
        }
        .normalized();
        assert_eq!(policy.tags[0].name, "a");
        assert_eq!(policy.tags[0].attributes, vec!["href".to_owned()]);
        assert_eq!(policy.schemes, vec!["https".to_owned()]);
    }

    #[test]
    fn test_policy_deserializes_from_json() {
        let json = r#"{
            "tags": [
                {"name": "p"},
                {"name": "a", "attributes": ["href", "title"]}
            ],
            "schemes": ["https"]
        }"#;
        let policy: SanitizePolicy = serde_json::from_str(json).unwrap();
        assert_eq!(policy.tags.len(), 2);
        assert!(policy.tags[0].attributes.is_empty());
        assert_eq!(policy.tags[1].attributes.len(), 2);
    }
}
