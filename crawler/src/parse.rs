use grawler_core::text::{truncate_chars, DESCRIPTION_LEN, TITLE_LEN};
use grawler_core::Metadata;
use scraper::{ElementRef, Html, Node, Selector};

/// Everything one parse pass extracts from a fetched document.
#[derive(Debug)]
pub struct ParsedDocument {
    pub text: String,
    pub links: Vec<String>,
    pub metadata: Metadata,
}

/// Subtrees whose text never reaches the corpus.
const SKIPPED_TAGS: [&str; 5] = ["script", "style", "noscript", "svg", "iframe"];

/// Parse an HTML body: outbound links in document order, visible body text,
/// and head metadata.
pub fn parse_html(body: &str) -> ParsedDocument {
    let document = Html::parse_document(body);
    ParsedDocument {
        text: extract_text(&document),
        links: extract_links(&document),
        metadata: extract_metadata(&document),
    }
}

/// A plain-text body carries no links and no metadata of its own.
pub fn parse_plain(body: &str) -> ParsedDocument {
    ParsedDocument {
        text: body.to_string(),
        links: Vec::new(),
        metadata: Metadata::default(),
    }
}

/// Fill empty metadata fields from the page text and host, and resolve a
/// root-relative icon link. Idempotent.
pub fn finalize_metadata(metadata: &mut Metadata, text: &str, host: &str, base_url: &str) {
    if metadata.title.is_empty() {
        metadata.title = truncate_chars(text, TITLE_LEN);
    }
    if metadata.description.is_empty() {
        metadata.description = truncate_chars(text, DESCRIPTION_LEN);
    }
    if metadata.site_name.is_empty() {
        metadata.site_name = host.to_string();
    }
    if metadata.icon_link.starts_with('/') {
        metadata.icon_link = format!("{base_url}{}", metadata.icon_link);
    }
}

fn extract_links(document: &Html) -> Vec<String> {
    let anchor = Selector::parse("a").unwrap();
    document
        .select(&anchor)
        .filter_map(|element| element.value().attr("href").map(str::to_string))
        .collect()
}

fn extract_text(document: &Html) -> String {
    let body = Selector::parse("body").unwrap();
    let root = document
        .select(&body)
        .next()
        .unwrap_or_else(|| document.root_element());
    let mut chunks = Vec::new();
    collect_text(root, &mut chunks);
    chunks.join(" ")
}

fn collect_text(element: ElementRef<'_>, chunks: &mut Vec<String>) {
    if SKIPPED_TAGS.contains(&element.value().name()) {
        return;
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.text.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, chunks);
                }
            }
            _ => {}
        }
    }
}

fn extract_metadata(document: &Html) -> Metadata {
    let mut metadata = Metadata::default();

    let title = Selector::parse("title").unwrap();
    if let Some(element) = document.select(&title).next() {
        metadata.title = element.text().next().unwrap_or("").to_string();
    }

    let icon = Selector::parse("link[rel][href]").unwrap();
    for element in document.select(&icon) {
        let rel = element.value().attr("rel").unwrap_or("");
        if matches!(rel, "icon" | "shortcut icon" | "icon shortcut") {
            metadata.icon_link = element.value().attr("href").unwrap_or("").to_string();
            break;
        }
    }

    let meta = Selector::parse("meta[content]").unwrap();
    for element in document.select(&meta) {
        let name = element.value().attr("name").unwrap_or("");
        let property = element.value().attr("property").unwrap_or("");
        let content = element.value().attr("content").unwrap_or("");
        if metadata.description.is_empty() && (name == "description" || property == "og:description")
        {
            metadata.description = content.to_string();
        }
        if metadata.site_name.is_empty() && property == "og:site_name" {
            metadata.site_name = content.to_string();
        }
    }

    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = concat!(
        "<html><head><title>T</title>",
        "<link rel=\"icon\" href=\"/favicon.ico\">",
        "<meta name=\"description\" content=\"a page\">",
        "<meta property=\"og:site_name\" content=\"Example\">",
        "</head><body>hi <a href=\"/next\">n</a></body></html>",
    );

    #[test]
    fn extracts_body_text_joined_by_spaces() {
        let parsed = parse_html(PAGE);
        assert_eq!(parsed.text, "hi n");
    }

    #[test]
    fn collects_hrefs_in_document_order_with_duplicates() {
        let parsed = parse_html(
            "<body><a href=\"/a\">1</a><a href=\"/b\">2</a><a href=\"/a\">3</a><a>no href</a></body>",
        );
        assert_eq!(parsed.links, vec!["/a", "/b", "/a"]);
    }

    #[test]
    fn skips_script_style_and_friends() {
        let parsed = parse_html(
            "<body>keep<script>drop()</script><style>.x{}</style>\
             <noscript>drop</noscript><svg><text>drop</text></svg>\
             <iframe>drop</iframe> this</body>",
        );
        assert_eq!(parsed.text, "keep this");
    }

    #[test]
    fn reads_head_metadata_first_write_wins() {
        let parsed = parse_html(PAGE);
        assert_eq!(parsed.metadata.title, "T");
        assert_eq!(parsed.metadata.icon_link, "/favicon.ico");
        assert_eq!(parsed.metadata.description, "a page");
        assert_eq!(parsed.metadata.site_name, "Example");

        let twice = parse_html(
            "<head><title>first</title><title>second</title>\
             <meta name=\"description\" content=\"one\">\
             <meta property=\"og:description\" content=\"two\"></head>",
        );
        assert_eq!(twice.metadata.title, "first");
        assert_eq!(twice.metadata.description, "one");
    }

    #[test]
    fn plain_text_has_no_links_or_metadata() {
        let parsed = parse_plain("just text");
        assert_eq!(parsed.text, "just text");
        assert!(parsed.links.is_empty());
        assert_eq!(parsed.metadata, Metadata::default());
    }

    #[test]
    fn finalize_fills_gaps_and_is_idempotent() {
        let mut metadata = Metadata {
            icon_link: "/favicon.ico".to_string(),
            ..Metadata::default()
        };
        let text = "hi n";
        finalize_metadata(&mut metadata, text, "a.example", "https://a.example");
        assert_eq!(metadata.title, "hi n");
        assert_eq!(metadata.description, "hi n");
        assert_eq!(metadata.site_name, "a.example");
        assert_eq!(metadata.icon_link, "https://a.example/favicon.ico");

        let once = metadata.clone();
        finalize_metadata(&mut metadata, text, "a.example", "https://a.example");
        assert_eq!(metadata, once);
    }

    #[test]
    fn finalize_truncates_long_text() {
        let mut metadata = Metadata::default();
        let text = "x".repeat(500);
        finalize_metadata(&mut metadata, &text, "h", "https://h");
        assert_eq!(metadata.title.chars().count(), 35);
        assert_eq!(metadata.description.chars().count(), 160);
    }

    #[test]
    fn empty_body_does_not_panic() {
        let parsed = parse_html("");
        assert_eq!(parsed.text, "");
        let mut metadata = parsed.metadata;
        finalize_metadata(&mut metadata, "", "h", "https://h");
        assert_eq!(metadata.title, "");
        assert_eq!(metadata.description, "");
        assert_eq!(metadata.site_name, "h");
    }
}
