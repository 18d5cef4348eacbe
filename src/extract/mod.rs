//! Content Extractor (spec §4.B): turns raw HTML into a [`ContentRecord`].
//!
//! Malformed HTML never errors here — `scraper`/`html5ever` already tolerate it, and any
//! field we can't find just comes back empty, matching the source's BeautifulSoup fallbacks.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::core::types::{ContentRecord, Heading, Image, Link};

const HEADING_TAGS: [(&str, u8); 6] = [
    ("h1", 1),
    ("h2", 2),
    ("h3", 3),
    ("h4", 4),
    ("h5", 5),
    ("h6", 6),
];

const NON_CONTENT_TAGS: [&str; 4] = ["script", "style", "nav", "footer"];

fn non_content_patterns() -> &'static Vec<Regex> {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        NON_CONTENT_TAGS
            .iter()
            .map(|tag| {
                Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).expect("static pattern")
            })
            .collect()
    })
}

/// Strips `script`, `style`, `nav` and `footer` subtrees before parsing (spec §4.B): a
/// textual pre-filter rather than a DOM-tree removal, since `scraper`'s parsed tree is
/// read-only.
fn strip_non_content(html: &str) -> String {
    let mut stripped = html.to_string();
    for pattern in non_content_patterns() {
        stripped = pattern.replace_all(&stripped, " ").into_owned();
    }
    stripped
}

fn selector(selectors: &str) -> Selector {
    Selector::parse(selectors).expect("static selector")
}

fn text_of(el: &scraper::ElementRef) -> String {
    el.text().collect::<Vec<_>>().join(" ").trim().to_string()
}

/// Extracts structured content from a page's HTML body. `page_url` is the already-fetched
/// page's own URL, used to resolve relative `href`/`src` attributes to absolute ones.
pub fn extract(html: &str, page_url: &str) -> ContentRecord {
    let document = Html::parse_document(&strip_non_content(html));
    let base = Url::parse(page_url).ok();

    ContentRecord {
        title: extract_title(&document),
        meta_description: extract_meta_description(&document),
        headings: extract_headings(&document),
        body_text: extract_body_text(&document),
        links_text: extract_links_text(&document),
        images: extract_images(&document, base.as_ref()),
        links: extract_links(&document, base.as_ref()),
        word_count: count_words(&document),
        language: detect_language(&document),
    }
}

fn extract_title(document: &Html) -> String {
    if let Some(el) = document.select(&selector("title")).next() {
        let text = text_of(&el);
        if !text.is_empty() {
            return text;
        }
    }
    document
        .select(&selector("h1"))
        .next()
        .map(|el| text_of(&el))
        .unwrap_or_default()
}

fn extract_meta_description(document: &Html) -> String {
    document
        .select(&selector(r#"meta[name="description"]"#))
        .next()
        .and_then(|el| el.value().attr("content"))
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn extract_headings(document: &Html) -> Vec<Heading> {
    let mut headings = Vec::new();
    for (tag, level) in HEADING_TAGS {
        for el in document.select(&selector(tag)) {
            let text = text_of(&el);
            if !text.is_empty() {
                headings.push(Heading { level, text });
            }
        }
    }
    headings
}

fn extract_body_text(document: &Html) -> String {
    let main = document
        .select(&selector("main"))
        .next()
        .or_else(|| document.select(&selector("article")).next())
        .or_else(|| document.select(&selector("body")).next());

    let text = match main {
        Some(root) => root
            .text()
            .collect::<Vec<_>>()
            .join(" "),
        None => document.root_element().text().collect::<Vec<_>>().join(" "),
    };
    collapse_whitespace(&text)
}

fn extract_links_text(document: &Html) -> String {
    document
        .select(&selector("a[href]"))
        .map(|el| text_of(&el))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_links(document: &Html, base: Option<&Url>) -> Vec<Link> {
    document
        .select(&selector("a[href]"))
        .filter_map(|el| {
            let href = el.value().attr("href")?;
            let resolved = resolve(base, href)?;
            Some(Link {
                url: resolved,
                anchor_text: text_of(&el),
                title: el.value().attr("title").unwrap_or_default().to_string(),
            })
        })
        .collect()
}

fn extract_images(document: &Html, base: Option<&Url>) -> Vec<Image> {
    document
        .select(&selector("img"))
        .filter_map(|el| {
            let src = el.value().attr("src")?;
            let resolved = resolve(base, src)?;
            Some(Image {
                src: resolved,
                alt: el.value().attr("alt").unwrap_or_default().to_string(),
                title: el.value().attr("title").unwrap_or_default().to_string(),
            })
        })
        .collect()
}

fn resolve(base: Option<&Url>, href: &str) -> Option<String> {
    match base {
        Some(base) => base.join(href).ok().map(|u| u.to_string()),
        None => Url::parse(href).ok().map(|u| u.to_string()),
    }
}

fn count_words(document: &Html) -> usize {
    document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .count()
}

fn detect_language(document: &Html) -> String {
    document
        .select(&selector("html"))
        .next()
        .and_then(|el| el.value().attr("lang"))
        .filter(|lang| !lang.is_empty())
        .unwrap_or("en")
        .to_string()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html lang="en">
        <head>
            <title>Example Page</title>
            <meta name="description" content="An example page for testing.">
        </head>
        <body>
            <nav><a href="/nav-link">Nav</a></nav>
            <main>
                <h1>Welcome</h1>
                <h2>Section One</h2>
                <p>This is the body text.</p>
                <a href="/relative">Relative link</a>
                <img src="/logo.png" alt="logo">
            </main>
            <footer><a href="/footer-link">Footer</a></footer>
            <script>var x = 1;</script>
        </body>
        </html>
    "#;

    #[test]
    fn extracts_title_and_meta() {
        let record = extract(PAGE, "https://example.test/page");
        assert_eq!(record.title, "Example Page");
        assert_eq!(record.meta_description, "An example page for testing.");
        assert_eq!(record.language, "en");
    }

    #[test]
    fn extracts_headings_in_order() {
        let record = extract(PAGE, "https://example.test/page");
        assert_eq!(record.headings.len(), 2);
        assert_eq!(record.headings[0].level, 1);
        assert_eq!(record.headings[1].level, 2);
    }

    #[test]
    fn resolves_relative_links_and_images() {
        let record = extract(PAGE, "https://example.test/page");
        assert!(record
            .links
            .iter()
            .any(|l| l.url == "https://example.test/relative"));
        assert_eq!(record.images[0].src, "https://example.test/logo.png");
    }

    #[test]
    fn body_text_excludes_script() {
        let record = extract(PAGE, "https://example.test/page");
        assert!(!record.body_text.contains("var x"));
        assert!(record.body_text.contains("Welcome"));
    }

    #[test]
    fn nav_and_footer_subtrees_are_stripped_entirely() {
        let record = extract(PAGE, "https://example.test/page");
        assert!(!record.links.iter().any(|l| l.url.ends_with("/nav-link")));
        assert!(!record.links.iter().any(|l| l.url.ends_with("/footer-link")));
        assert!(!record.links_text.contains("Nav"));
        assert!(!record.links_text.contains("Footer"));
    }

    #[test]
    fn falls_back_to_h1_when_title_missing() {
        let html = r#"<html><body><h1>Fallback Title</h1></body></html>"#;
        let record = extract(html, "https://example.test/");
        assert_eq!(record.title, "Fallback Title");
    }
}
