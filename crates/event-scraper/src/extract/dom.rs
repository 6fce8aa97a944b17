//! Small selector helpers shared by the heuristic extractor and site adapters.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Text content of an element with whitespace runs collapsed.
pub fn element_text(el: &ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trimmed, non-empty value or `None`.
pub fn non_empty(s: &str) -> Option<String> {
    let collapsed = collapse_whitespace(s);
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// First element matching a CSS selector.
pub fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let sel = Selector::parse(css).ok()?;
    document.select(&sel).next()
}

/// All elements matching a CSS selector.
pub fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(sel) => document.select(&sel).collect(),
        Err(_) => Vec::new(),
    }
}

/// Non-empty text of the first element matching `css`.
pub fn first_text(document: &Html, css: &str) -> Option<String> {
    select_all(document, css)
        .iter()
        .find_map(|el| non_empty(&element_text(el)))
}

/// `content` of `<meta property="...">` (OpenGraph style).
pub fn meta_property(document: &Html, property: &str) -> Option<String> {
    select_all(document, &format!(r#"meta[property="{property}"]"#))
        .iter()
        .find_map(|el| el.value().attr("content").and_then(non_empty))
}

/// `content` of every `<meta property="...">`, in document order.
pub fn meta_property_all(document: &Html, property: &str) -> Vec<String> {
    select_all(document, &format!(r#"meta[property="{property}"]"#))
        .iter()
        .filter_map(|el| el.value().attr("content").and_then(non_empty))
        .collect()
}

/// `content` of `<meta name="...">`.
pub fn meta_name(document: &Html, name: &str) -> Option<String> {
    select_all(document, &format!(r#"meta[name="{name}"]"#))
        .iter()
        .find_map(|el| el.value().attr("content").and_then(non_empty))
}

/// `datetime` attributes of all `<time>` elements, in document order.
pub fn time_datetimes(document: &Html) -> Vec<String> {
    select_all(document, "time[datetime]")
        .iter()
        .filter_map(|el| el.value().attr("datetime").and_then(non_empty))
        .collect()
}

/// Text of the first `tag` element whose class attribute matches `pattern`.
pub fn text_by_class_pattern(document: &Html, tag: &str, pattern: &Regex) -> Option<String> {
    select_all(document, &format!("{tag}[class]"))
        .iter()
        .filter(|el| {
            el.value()
                .attr("class")
                .is_some_and(|class| pattern.is_match(class))
        })
        .find_map(|el| non_empty(&element_text(el)))
}

/// Text of the first element whose class or id contains one of `needles`
/// (case-insensitive) and whose text is longer than `min_len` characters.
pub fn text_by_class_or_id(document: &Html, needles: &[&str], min_len: usize) -> Option<String> {
    select_all(document, "[class], [id]")
        .iter()
        .filter(|el| {
            let value = el.value();
            let class_hit = value
                .classes()
                .any(|c| contains_any(&c.to_lowercase(), needles));
            let id_hit = value
                .id()
                .is_some_and(|id| contains_any(&id.to_lowercase(), needles));
            class_hit || id_hit
        })
        .find_map(|el| {
            let text = element_text(el);
            (text.chars().count() > min_len).then_some(text)
        })
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_helpers() {
        let doc = Html::parse_document(
            r#"<html><head>
            <meta property="og:title" content="  Summer   Fest " />
            <meta property="og:image" content="https://cdn.example.com/1.jpg" />
            <meta property="og:image" content="https://cdn.example.com/2.jpg" />
            <meta name="description" content="" />
            </head><body></body></html>"#,
        );
        assert_eq!(meta_property(&doc, "og:title").as_deref(), Some("Summer Fest"));
        assert_eq!(meta_property_all(&doc, "og:image").len(), 2);
        assert_eq!(meta_name(&doc, "description"), None);
    }

    #[test]
    fn test_class_pattern() {
        let doc = Html::parse_document(
            r#"<body><h1 class="page-heading">Tickets</h1>
            <h1 class="EventDetails__Title">Rock Show</h1></body>"#,
        );
        let re = Regex::new("(?i)event.*title").unwrap();
        assert_eq!(
            text_by_class_pattern(&doc, "h1", &re).as_deref(),
            Some("Rock Show")
        );
    }

    #[test]
    fn test_class_or_id_min_length() {
        let doc = Html::parse_document(
            r#"<body><span class="venue-icon">@</span>
            <div id="event-Location">The Fillmore, San Francisco</div></body>"#,
        );
        assert_eq!(
            text_by_class_or_id(&doc, &["location", "venue"], 3).as_deref(),
            Some("The Fillmore, San Francisco")
        );
    }
}
