use scraper::Html;

/// Decode every HTML5 character reference in a run of text.
///
/// The text is parsed as a fragment, so it must already be free of tags.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return fold_typography(s);
    }
    let fragment = Html::parse_fragment(s);
    fold_typography(&fragment.root_element().text().collect::<String>())
}

/// Fold the typographic characters Word and hand-edited pages emit into the
/// plain ASCII the field patterns expect.
pub fn fold_typography(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{a0}' => ' ',
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201c}' | '\u{201d}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            _ => c,
        })
        .collect()
}

/// Collapse sequences of whitespace into a single space and trim.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

/// Trim and drop trailing punctuation left over from column bleed.
pub fn trim_punctuation(s: &str) -> &str {
    s.trim()
        .trim_end_matches(|c: char| matches!(c, ',' | ';' | ':' | '*' | '-'))
        .trim_end()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_named_and_numeric() {
        assert_eq!(decode_entities("A&amp;B&nbsp;C"), "A&B C");
        assert_eq!(decode_entities("&#233;&#x41;"), "éA");
        assert_eq!(decode_entities("O&#146;Brien"), "O'Brien");
    }

    #[test]
    fn test_decode_full_entity_set() {
        assert_eq!(decode_entities("J&oslash;rgen M&uuml;ller"), "Jørgen Müller");
        assert_eq!(decode_entities("Fran&ccedil;ois &Aacute;lvarez"), "François Álvarez");
        assert_eq!(decode_entities("Ren&eacute;e &mdash; &ldquo;Ace&rdquo;"), "Renée - \"Ace\"");
    }

    #[test]
    fn test_decode_leaves_stray_ampersand() {
        assert_eq!(decode_entities("Smith & Sons"), "Smith & Sons");
        assert_eq!(decode_entities("&bogus;"), "&bogus;");
    }

    #[test]
    fn test_normalize_ws() {
        assert_eq!(normalize_ws("  a \n\t b  "), "a b");
    }

    #[test]
    fn test_trim_punctuation() {
        assert_eq!(trim_punctuation("Jane Doe, "), "Jane Doe");
        assert_eq!(trim_punctuation("Bob*"), "Bob");
    }
}
