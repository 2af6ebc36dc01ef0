//! HTML to plain text.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_CONTENT_BLOCKS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?is)<script\b[^>]*>.*?</script\s*>",
        r"(?is)<style\b[^>]*>.*?</style\s*>",
        r"(?is)<noscript\b[^>]*>.*?</noscript\s*>",
        r"(?s)<!--.*?-->",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("block regex is hardcoded and valid"))
    .collect()
});

static BLOCK_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)</?(?:p|div|br|li|ul|ol|tr|td|th|table|h[1-6]|section|article|header|footer|blockquote|pre|dd|dt|dl)\b[^>]*>",
    )
    .expect("block tag regex is hardcoded and valid")
});

static ANY_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag regex is hardcoded and valid"));

static NUMERIC_ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&#(?:(\d{1,7})|[xX]([0-9a-fA-F]{1,6}));")
        .expect("entity regex is hardcoded and valid")
});

static UNDEFINED_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bundefined\b").expect("undefined regex is hardcoded and valid"));

static VAR_DECLARATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bvar\s+").expect("var regex is hardcoded and valid"));

static SMALL_BRACE_FRAGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{[^{}\n]{0,50}\}").expect("brace fragment regex is hardcoded and valid")
});

static HORIZONTAL_SPACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[ \t\r\u{a0}\u{200b}]+").expect("whitespace regex is hardcoded and valid")
});

const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&#39;", "'"),
    ("&ndash;", "-"),
    ("&mdash;", "-"),
    ("&hellip;", "..."),
    ("&copy;", "(c)"),
    ("&reg;", "(R)"),
    ("&trade;", "(TM)"),
    ("&rsquo;", "'"),
    ("&lsquo;", "'"),
    ("&rdquo;", "\""),
    ("&ldquo;", "\""),
    // Must stay last so "&amp;lt;" decodes to "&lt;" rather than "<"
    ("&amp;", "&"),
];

/// Convert an HTML document into readable plain text.
///
/// Script, style and noscript blocks and comments are dropped, block-level
/// tags become line breaks, remaining tags are removed, entities are
/// decoded, leftover script artifacts are stripped and whitespace is
/// normalized. Empty lines are removed.
pub fn clean_html(html: &str) -> String {
    let mut text = html.to_string();
    for pattern in NON_CONTENT_BLOCKS.iter() {
        text = pattern.replace_all(&text, " ").into_owned();
    }

    let text = BLOCK_TAG.replace_all(&text, "\n");
    let text = ANY_TAG.replace_all(&text, "");
    let text = decode_entities(&text);

    let text = UNDEFINED_TOKEN.replace_all(&text, "");
    let text = VAR_DECLARATION.replace_all(&text, "");
    let text = SMALL_BRACE_FRAGMENT.replace_all(&text, "");

    text.lines()
        .map(|line| HORIZONTAL_SPACE.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decode the common named entities and every numeric entity.
pub fn decode_entities(text: &str) -> String {
    let decoded = NUMERIC_ENTITY.replace_all(text, |caps: &regex::Captures<'_>| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(dec), _) => dec.as_str().parse::<u32>().ok(),
            (None, Some(hex)) => u32::from_str_radix(hex.as_str(), 16).ok(),
            _ => None,
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });

    let mut out = decoded.into_owned();
    for (entity, replacement) in NAMED_ENTITIES {
        if out.contains(entity) {
            out = out.replace(entity, replacement);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_script_and_style() {
        let html = r#"<html><head><style>body { color: red; }</style>
            <script type="text/javascript">var x = 1; alert("hi");</script></head>
            <body><p>Apply the update.</p></body></html>"#;

        let text = clean_html(html);
        assert_eq!(text, "Apply the update.");
    }

    #[test]
    fn test_block_tags_become_lines() {
        let html = "<div>First</div><div>Second<br>Third</div><ul><li>Fourth</li></ul>";
        let text = clean_html(html);
        assert_eq!(text, "First\nSecond\nThird\nFourth");
    }

    #[test]
    fn test_entities_decoded() {
        let html = "<p>Fixed in 2.4&nbsp;&amp;&nbsp;later &lt;3.0&gt; &#169; &#x41;</p>";
        assert_eq!(clean_html(html), "Fixed in 2.4 & later <3.0> \u{a9} A");
    }

    #[test]
    fn test_double_encoded_amp() {
        assert_eq!(decode_entities("a &amp;lt; b"), "a &lt; b");
    }

    #[test]
    fn test_strips_script_artifacts() {
        let html = "<p>Version undefined is affected</p><p>var config {a:1}</p><p>Patch now</p>";
        assert_eq!(clean_html(html), "Version is affected\nconfig\nPatch now");
    }

    #[test]
    fn test_comments_removed() {
        let html = "<p>Visible<!-- hidden --> text</p>";
        assert_eq!(clean_html(html), "Visible text");
    }

    #[test]
    fn test_plain_text_passthrough() {
        assert_eq!(clean_html("  no   markup  here "), "no markup here");
        assert_eq!(clean_html(""), "");
    }
}
