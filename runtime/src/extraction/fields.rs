// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-field value extraction.
//!
//! A field never fails: every miss, invalid selector, or empty value becomes
//! `None`.

use crate::selectors::{element_text, first_match_in};
use crate::types::{Field, FieldKind};
use scraper::{ElementRef, Html};
use std::collections::BTreeMap;
use url::Url;

/// Read one field from within `root`.
///
/// Alternatives are tried left to right against the descendants of `root`.
/// A text field with no selector reads `root` itself.
pub fn extract_field(root: ElementRef<'_>, field: &Field, base: Option<&Url>) -> Option<String> {
    let alternatives = field.alternatives();
    let target = if alternatives.is_empty() {
        match field.kind {
            FieldKind::Text => Some(root),
            FieldKind::Attr => None,
        }
    } else {
        first_match_in(root, &alternatives)
    }?;
    read_value(target, field, base)
}

/// Read a field from a whole document, for single-page extraction.
pub fn extract_from_document(doc: &Html, field: &Field, base: Option<&Url>) -> Option<String> {
    let alternatives = field.alternatives();
    if alternatives.is_empty() {
        return None;
    }
    let target = alternatives.iter().find_map(|alt| {
        let sel = crate::selectors::parse(alt)?;
        doc.select(&sel).next()
    })?;
    read_value(target, field, base)
}

fn read_value(target: ElementRef<'_>, field: &Field, base: Option<&Url>) -> Option<String> {
    match field.kind {
        FieldKind::Text => Some(element_text(&target)).filter(|t| !t.is_empty()),
        FieldKind::Attr => {
            let attr = field.attr.as_deref()?;
            let raw = target.value().attr(attr).filter(|v| !v.is_empty())?;
            if attr == "href" {
                Some(resolve_href(raw, base))
            } else {
                Some(raw.to_string())
            }
        }
    }
}

/// Absolute form of an `href`. Values already starting with `http` and
/// values that cannot be joined are returned verbatim.
pub fn resolve_href(raw: &str, base: Option<&Url>) -> String {
    if raw.starts_with("http") {
        return raw.to_string();
    }
    base.and_then(|b| b.join(raw).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Read every field from within `root`.
pub fn extract_record(
    root: ElementRef<'_>,
    fields: &[Field],
    base: Option<&Url>,
) -> BTreeMap<String, Option<String>> {
    fields
        .iter()
        .map(|f| (f.name.clone(), extract_field(root, f, base)))
        .collect()
}

/// Read every field from a whole document.
pub fn extract_single(
    doc: &Html,
    fields: &[Field],
    base: Option<&Url>,
) -> BTreeMap<String, Option<String>> {
    fields
        .iter()
        .map(|f| (f.name.clone(), extract_from_document(doc, f, base)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors;

    fn item(html: &str) -> Html {
        Html::parse_fragment(html)
    }

    fn root(doc: &Html) -> ElementRef<'_> {
        let sel = selectors::parse(".card").unwrap();
        doc.select(&sel).next().unwrap()
    }

    #[test]
    fn test_first_matching_alternative_wins() {
        let doc = item(r#"<div class="card"><h3>  Widget </h3><h2>Other</h2></div>"#);
        let f = Field::text("title", "h1, [[bad, h3, h2");
        assert_eq!(extract_field(root(&doc), &f, None).as_deref(), Some("Widget"));
    }

    #[test]
    fn test_empty_and_missing_are_none() {
        let doc = item(r#"<div class="card"><span class="p">   </span><a href="">x</a></div>"#);
        let r = root(&doc);
        assert_eq!(extract_field(r, &Field::text("p", ".p"), None), None);
        assert_eq!(extract_field(r, &Field::text("q", ".q"), None), None);
        assert_eq!(extract_field(r, &Field::attr("l", "a", "href"), None), None);
        assert_eq!(extract_field(r, &Field::attr("l", "a", "title"), None), None);
    }

    #[test]
    fn test_empty_selector_reads_item_text() {
        let doc = item(r#"<div class="card"> Whole  card </div>"#);
        assert_eq!(
            extract_field(root(&doc), &Field::text("all", ""), None).as_deref(),
            Some("Whole  card")
        );
        assert_eq!(extract_field(root(&doc), &Field::attr("a", "", "id"), None), None);
    }

    #[test]
    fn test_href_resolution() {
        let base = Url::parse("https://shop.example/search?q=x").unwrap();
        let doc = item(
            r#"<div class="card"><a class="r" href="/p/1">r</a>
               <a class="a" href="https://cdn.example/p">a</a>
               <img src="/i.png"></div>"#,
        );
        let r = root(&doc);
        assert_eq!(
            extract_field(r, &Field::attr("l", ".r", "href"), Some(&base)).as_deref(),
            Some("https://shop.example/p/1")
        );
        assert_eq!(
            extract_field(r, &Field::attr("l", ".a", "href"), Some(&base)).as_deref(),
            Some("https://cdn.example/p")
        );
        // Only hrefs are resolved.
        assert_eq!(
            extract_field(r, &Field::attr("i", "img", "src"), Some(&base)).as_deref(),
            Some("/i.png")
        );
    }

    #[test]
    fn test_single_document_extraction() {
        let doc = Html::parse_document(
            r#"<html><head><meta property="og:title" content="OG"></head>
               <body><h1>Headline</h1></body></html>"#,
        );
        let fields = vec![
            Field::text("title", "h1"),
            Field::attr("og", r#"meta[property="og:title"]"#, "content"),
            Field::text("missing", ".nope"),
        ];
        let data = extract_single(&doc, &fields, None);
        assert_eq!(data["title"].as_deref(), Some("Headline"));
        assert_eq!(data["og"].as_deref(), Some("OG"));
        assert_eq!(data["missing"], None);
    }
}
