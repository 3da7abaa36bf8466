//! Visible text extraction and word counting.
//!
//! The same policy is used everywhere a length is measured: comments and
//! `<script>`/`<style>` bodies are dropped, every tag becomes a space,
//! entities are decoded, whitespace is collapsed and a token counts as a
//! word when it contains at least one alphanumeric character.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::html::{RAW_TEXT_RE, TAG_RE};

static ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,9});").unwrap());

/// Count words in an HTML fragment.
pub fn count_words(html: &str) -> usize {
    visible_text(html)
        .split_whitespace()
        .filter(|token| token.chars().any(char::is_alphanumeric))
        .count()
}

/// Text a reader would see, with whitespace collapsed to single spaces.
pub fn visible_text(html: &str) -> String {
    let without_raw = RAW_TEXT_RE.replace_all(html, " ");
    let without_tags = TAG_RE.replace_all(&without_raw, " ");
    let decoded = decode_entities(&without_tags);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode named and numeric character references. Unknown names are kept
/// verbatim; non-breaking spaces become plain spaces.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    ENTITY_RE.replace_all(text, |caps: &Captures<'_>| {
        let body = &caps[1];
        let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
        } else if let Some(dec) = body.strip_prefix('#') {
            dec.parse::<u32>().ok().and_then(char::from_u32)
        } else {
            named_entity(body)
        };

        match decoded {
            Some('\u{a0}') => " ".to_string(),
            Some(ch) => ch.to_string(),
            None => caps[0].to_string(),
        }
    })
}

fn named_entity(name: &str) -> Option<char> {
    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "ndash" => '–',
        "mdash" => '—',
        "hellip" => '…',
        "laquo" => '«',
        "raquo" => '»',
        "lsquo" => '‘',
        "rsquo" => '’',
        "ldquo" => '“',
        "rdquo" => '”',
        "iexcl" => '¡',
        "iquest" => '¿',
        "euro" => '€',
        "copy" => '©',
        "reg" => '®',
        "trade" => '™',
        "deg" => '°',
        "middot" => '·',
        "times" => '×',
        "aacute" => 'á',
        "eacute" => 'é',
        "iacute" => 'í',
        "oacute" => 'ó',
        "uacute" => 'ú',
        "Aacute" => 'Á',
        "Eacute" => 'É',
        "Iacute" => 'Í',
        "Oacute" => 'Ó',
        "Uacute" => 'Ú',
        "ntilde" => 'ñ',
        "Ntilde" => 'Ñ',
        "uuml" => 'ü',
        "Uuml" => 'Ü',
        "ccedil" => 'ç',
        _ => return None,
    };
    Some(ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_separate_words() {
        assert_eq!(count_words("<p>one</p><p>two</p>"), 2);
        assert_eq!(count_words("<li>a</li><li>b</li><li>c</li>"), 3);
    }

    #[test]
    fn test_punctuation_only_tokens_are_not_words() {
        assert_eq!(count_words("<p>Fast — and cheap &ndash; really !</p>"), 4);
    }

    #[test]
    fn test_scripts_styles_and_comments_ignored() {
        let html = "<style>p { color: red }</style><!-- hidden words here --><p>visible text</p>\
                    <script>let a = 1;</script>";
        assert_eq!(count_words(html), 2);
        assert_eq!(visible_text(html), "visible text");
    }

    #[test]
    fn test_entities_decoded() {
        assert_eq!(decode_entities("R&amp;D &lt;3 &#241; &#xF1;"), "R&D <3 ñ ñ");
        assert_eq!(decode_entities("&unknown; stays"), "&unknown; stays");
        assert_eq!(count_words("word&nbsp;word"), 2);
    }

    #[test]
    fn test_plain_text_counts_like_split() {
        assert_eq!(count_words("  the quick\n brown\tfox "), 4);
    }
}
