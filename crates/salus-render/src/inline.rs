//! Restricted single-pass inline formatter for live-preview editing.
//!
//! This is not a markdown parser. It recognizes links, bold, strikethrough,
//! italic, and literal newlines, and nothing else; any tag outside the
//! permitted inline set makes it bail out and hand the input, unmodified,
//! to the host's sanitizer. The renderer proposes structure only; every
//! return path runs the caller-supplied sanitize step last.

use std::sync::LazyLock;

use pulldown_cmark_escape::{escape_html, escape_html_body_text};
use regex::{Captures, Regex};
use salus_common::policy::{has_blocked_scheme, NEUTRALIZED_URL};

use crate::sanitize::Sanitizer;

/// The host environment seam: the canonical sanitizer and escape helpers
/// are injected rather than owned, so trust logic lives in one place.
pub trait InlineHost {
    fn sanitize(&self, html: &str) -> String;
    fn escape_text(&self, text: &str) -> String;
    fn escape_attr(&self, text: &str) -> String;
}

/// Production host: the configured sanitizer plus the shared HTML escapes.
pub struct PolicyHost<'a> {
    sanitizer: &'a dyn Sanitizer,
}

impl<'a> PolicyHost<'a> {
    pub fn new(sanitizer: &'a dyn Sanitizer) -> Self {
        Self { sanitizer }
    }
}

impl InlineHost for PolicyHost<'_> {
    fn sanitize(&self, html: &str) -> String {
        self.sanitizer.sanitize(html)
    }

    fn escape_text(&self, text: &str) -> String {
        let mut out = String::new();
        let _ = escape_html_body_text(&mut out, text);
        out
    }

    fn escape_attr(&self, text: &str) -> String {
        let mut out = String::new();
        let _ = escape_html(&mut out, text);
        out
    }
}

/// Tags the formatter tolerates in its input. Anything else is a bail-out.
const ALLOWED_INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "br", "code", "del", "em", "i", "ins", "mark", "s", "small", "span",
    "strong", "sub", "sup", "u",
];

static TAG_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</?([A-Za-z][A-Za-z0-9-]*)").expect("TAG_NAME_RE: hardcoded regex is valid")
});

// Bounded quantifiers keep adversarial input from backtracking.
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[([^\]]{0,500})\]\(\s*([^)\s"]{1,2000})(?:\s+"([^"]{0,500})")?\s*\)"#)
        .expect("LINK_RE: hardcoded regex is valid")
});

static BOLD_AST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("BOLD_AST_RE: hardcoded regex is valid"));

static BOLD_US_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__([^_]+)__").expect("BOLD_US_RE: hardcoded regex is valid"));

static STRIKE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"~~([^~]+)~~").expect("STRIKE_RE: hardcoded regex is valid"));

static EM_AST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]+)\*").expect("EM_AST_RE: hardcoded regex is valid"));

static EM_US_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_([^_]+)_").expect("EM_US_RE: hardcoded regex is valid"));

static BR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("BR_RE: hardcoded regex is valid"));

static BLANK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n").expect("BLANK_RE: hardcoded regex is valid"));

/// Render a single editable field's markdown to HTML.
///
/// `inline = true` is for single-line fields: no `<p>` wrapper, newlines
/// become `<br>`. `inline = false` splits on blank lines into `<p>`
/// elements, with explicit `<br>` in the source treated as a paragraph
/// break.
pub fn render_inline(markdown: &str, host: &impl InlineHost, inline: bool) -> String {
    // Anything but plain inline markup means this is legacy rich content;
    // pass it through untouched and let the sanitizer decide.
    for caps in TAG_NAME_RE.captures_iter(markdown) {
        let name = caps[1].to_ascii_lowercase();
        if !ALLOWED_INLINE_TAGS.contains(&name.as_str()) {
            return host.sanitize(markdown);
        }
    }

    let text = unescape_metachars(markdown);

    let text = LINK_RE.replace_all(&text, |caps: &Captures| {
        let label = host.escape_text(&caps[1]);
        let url = if has_blocked_scheme(&caps[2]) {
            NEUTRALIZED_URL
        } else {
            &caps[2]
        };
        match caps.get(3) {
            Some(title) => format!(
                "<a href=\"{}\" title=\"{}\">{}</a>",
                host.escape_attr(url),
                host.escape_attr(title.as_str()),
                label
            ),
            None => format!("<a href=\"{}\">{}</a>", host.escape_attr(url), label),
        }
    });
    let text = BOLD_AST_RE.replace_all(&text, "<strong>$1</strong>");
    let text = BOLD_US_RE.replace_all(&text, "<strong>$1</strong>");
    let text = STRIKE_RE.replace_all(&text, "<s>$1</s>");
    let text = EM_AST_RE.replace_all(&text, "<em>$1</em>");
    let text = EM_US_RE.replace_all(&text, "<em>$1</em>");

    let html = if inline {
        text.replace('\n', "<br>")
    } else {
        let text = BR_RE.replace_all(&text, "\n\n");
        let mut html = String::new();
        for paragraph in BLANK_RE.split(&text) {
            if paragraph.trim().is_empty() {
                continue;
            }
            html.push_str("<p>");
            html.push_str(&paragraph.trim().replace('\n', "<br>"));
            html.push_str("</p>");
        }
        html
    };

    host.sanitize(&html)
}

/// Backslash-escaped metacharacters become numeric character references so
/// the user can type a literal `*` without triggering emphasis.
fn unescape_metachars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('*') => {
                chars.next();
                out.push_str("&#42;");
            }
            Some('_') => {
                chars.next();
                out.push_str("&#95;");
            }
            Some('~') => {
                chars.next();
                out.push_str("&#126;");
            }
            Some('`') => {
                chars.next();
                out.push_str("&#96;");
            }
            Some('[') => {
                chars.next();
                out.push_str("&#91;");
            }
            Some(']') => {
                chars.next();
                out.push_str("&#93;");
            }
            _ => out.push('\\'),
        }
    }
    out
}
