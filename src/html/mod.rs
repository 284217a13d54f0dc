//! Low-level HTML string helpers.
//!
//! Tag slicing works on raw markup case-insensitively. Text that ends up in
//! result fields is read through `scraper` so character references decode
//! the way a browser would.

mod sanitize;

use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;

pub use sanitize::{decode_entities, fold_typography, normalize_ws, trim_punctuation};

static PRE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("pre").expect("valid pre selector"));

/// Fast ASCII-only lowercasing; byte offsets stay valid against the input.
pub fn to_lower(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}

/// Find the next complete tag block from `from` onwards, case-insensitive.
/// Returns byte offsets from the start of the opening tag to the end of the closing tag.
pub fn next_tag_block_ci(s: &str, open_tag: &str, close_tag: &str, from: usize) -> Option<(usize, usize)> {
    let lc = to_lower(s);
    next_tag_block_lc(s, &lc, open_tag, close_tag, from)
}

fn next_tag_block_lc(s: &str, lc: &str, open_tag: &str, close_tag: &str, from: usize) -> Option<(usize, usize)> {
    let open_lc = to_lower(open_tag);
    let close_lc = to_lower(close_tag);

    let mut search = from;
    loop {
        let start = lc.get(search..)?.find(&open_lc)? + search;
        // Require a real tag boundary so `<pre` does not match `<prefix>`
        let boundary = lc[start + open_lc.len()..].chars().next();
        if !matches!(boundary, Some(c) if c == '>' || c == '/' || c.is_whitespace()) {
            search = start + open_lc.len();
            continue;
        }
        let open_end = s[start..].find('>')? + start + 1;
        let end_rel = lc[open_end..].find(&close_lc)?;
        return Some((start, open_end + end_rel + close_lc.len()));
    }
}

/// Every block between `open_tag` and `close_tag`, in document order.
pub fn tag_blocks<'a>(s: &'a str, open_tag: &str, close_tag: &str) -> Vec<&'a str> {
    let lc = to_lower(s);
    let mut out = Vec::new();
    let mut pos = 0usize;
    while let Some((start, end)) = next_tag_block_lc(s, &lc, open_tag, close_tag, pos) {
        out.push(&s[start..end]);
        pos = end;
    }
    out
}

/// Given a complete tag block like `<td ...>INNER</td>`, return INNER
/// (which may still contain nested tags).
pub fn inner_after_open_tag(block: &str) -> &str {
    if let Some(open_end) = block.find('>') {
        if let Some(close_start) = block.rfind('<') {
            if close_start > open_end {
                return &block[open_end + 1..close_start];
            }
        }
    }
    ""
}

/// Remove all `<...>` tags, keeping the text and its whitespace as-is.
pub fn strip_tags_raw(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Remove tags, decode entities and collapse whitespace.
pub fn clean_text(s: &str) -> String {
    normalize_ws(&decode_entities(&strip_tags_raw(s)))
}

/// Text of an element with `<br>` kept as a line break
fn element_text(element: ElementRef) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            _ => {}
        }
    }
    fold_typography(&out)
}

/// Decoded text of every `<pre>` block, whitespace preserved.
pub fn pre_texts(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document.select(&PRE).map(element_text).collect()
}

/// Text of the first element with the given tag name, cleaned.
pub fn first_tag_text(html: &str, tag: &str) -> Option<String> {
    let selector = Selector::parse(tag).ok()?;
    let document = Html::parse_document(html);
    let element = document.select(&selector).next()?;
    let text = normalize_ws(&element_text(element));
    (!text.is_empty()).then_some(text)
}

/// Visible document text with block-level tags turned into line breaks.
/// Script and style bodies are dropped.
pub fn visible_text(html: &str) -> String {
    let mut doc = html.to_string();
    for tag in ["script", "style"] {
        let open = format!("<{tag}");
        let close = format!("</{tag}>");
        while let Some((start, end)) = next_tag_block_ci(&doc, &open, &close, 0) {
            doc.replace_range(start..end, "");
        }
    }

    let lc = to_lower(&doc);
    let mut out = String::with_capacity(doc.len());
    let mut i = 0usize;
    while let Some(rel) = lc[i..].find('<') {
        let at = i + rel;
        out.push_str(&doc[i..at]);
        let close = match lc[at..].find('>') {
            Some(c) => at + c,
            None => {
                i = doc.len();
                break;
            }
        };
        let name: String = lc[at + 1..close]
            .trim_start_matches('/')
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect();
        if is_block_tag(&name) {
            out.push('\n');
        }
        i = close + 1;
    }
    if i < doc.len() {
        out.push_str(&doc[i..]);
    }
    decode_entities(&out)
}

fn is_block_tag(name: &str) -> bool {
    matches!(
        name,
        "br" | "p" | "div" | "tr" | "table" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
            | "li" | "ul" | "ol" | "pre" | "title" | "center" | "hr" | "blockquote"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_blocks_respect_boundaries() {
        let html = "<prefix>x</prefix><PRE>one</PRE><pre class=a>two</pre>";
        let blocks = tag_blocks(html, "<pre", "</pre>");
        assert_eq!(blocks.len(), 2);
        assert_eq!(inner_after_open_tag(blocks[0]), "one");
        assert_eq!(inner_after_open_tag(blocks[1]), "two");
    }

    #[test]
    fn test_pre_texts_decode_and_keep_spacing() {
        let html = "<pre>  1. Jo&amp;Ann   <b>17:02</b></pre>";
        assert_eq!(pre_texts(html), vec!["  1. Jo&Ann   17:02".to_string()]);
    }

    #[test]
    fn test_pre_texts_decode_named_entities() {
        let html = "<pre>  1. J&oslash;rgen M&uuml;ller   123  17:02<br>  2. &Aacute;lvaro Ruiz</pre>";
        assert_eq!(
            pre_texts(html),
            vec!["  1. Jørgen Müller   123  17:02\n  2. Álvaro Ruiz".to_string()]
        );
    }

    #[test]
    fn test_first_tag_text() {
        let html = "<html><TITLE> Spring  5K &amp; Fun Run </TITLE></html>";
        assert_eq!(first_tag_text(html, "title").as_deref(), Some("Spring 5K & Fun Run"));
        assert_eq!(first_tag_text(html, "h1"), None);
        assert_eq!(
            first_tag_text("<h1>Z&uuml;rich &Aring;rsl&oslash;p 10K</h1>", "h1").as_deref(),
            Some("Zürich Årsløp 10K")
        );
    }

    #[test]
    fn test_visible_text_breaks_blocks_and_drops_style() {
        let html = "<style>p{}</style><h1>Title</h1><p>Line&nbsp;two</p>";
        let text = visible_text(html);
        let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        assert_eq!(lines, vec!["Title", "Line two"]);
    }
}
