//! Pulls usable HTML out of reader output, which may be a full page, a
//! markdown rendition with a fenced html block, or plain markdown.

use regex::Regex;
use std::sync::OnceLock;

fn body_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<body[^>]*>(.*)</body>").expect("static regex"))
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```html\n(.*?)\n```").expect("static regex"))
}

fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!?\[[^\]\n]*\]\([^)\n]*\)").expect("static regex"))
}

/// Inner content of the outermost `<body>` element, trimmed.
pub fn extract_body(text: &str) -> Option<String> {
    body_re()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Content of the first ```` ```html ```` fence, trimmed.
pub fn extract_html_fence(text: &str) -> Option<String> {
    fence_re()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Drops markdown heading markers and inline links/images.
pub fn strip_markdown_noise(text: &str) -> String {
    let no_headings = text.replace("##", "");
    link_re().replace_all(&no_headings, "").into_owned()
}

/// Body first, then an html fence, then the de-noised text.
pub fn extract_main_html(text: &str) -> String {
    extract_body(text)
        .or_else(|| extract_html_fence(text))
        .unwrap_or_else(|| strip_markdown_noise(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_is_case_insensitive_and_greedy() {
        let page = "<html><BODY class=\"x\">\n <main>hi</main>\n<body>inner</body> tail</Body></html>";
        assert_eq!(
            extract_body(page).unwrap(),
            "<main>hi</main>\n<body>inner</body> tail"
        );
    }

    #[test]
    fn empty_body_falls_through() {
        assert_eq!(extract_body("<body>   </body>"), None);
        let text = "<body></body>\n```html\n<p>x</p>\n```";
        assert_eq!(extract_main_html(text), "<p>x</p>");
    }

    #[test]
    fn fence_is_lazy() {
        let md = "intro\n```html\n<h1>a</h1>\n```\nmore\n```html\n<h1>b</h1>\n```";
        assert_eq!(extract_html_fence(md).unwrap(), "<h1>a</h1>");
    }

    #[test]
    fn plain_markdown_is_cleaned() {
        let md = "## Title\nSee [docs](https://x.dev) and ![logo](a.png) now";
        assert_eq!(extract_main_html(md), " Title\nSee  and  now");
    }
}
