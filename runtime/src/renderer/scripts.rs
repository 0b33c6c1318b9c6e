// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! JavaScript snippets evaluated in live pages.
//!
//! ## Security: JS encoding
//!
//! Every caller-supplied value (selectors, phrases) is escaped for a JS
//! string literal and injected only into string positions, never into code.

use super::{ClickTarget, PhraseMatch, Scroll};

/// Count elements matching a selector. Invalid selectors count as zero.
pub fn count_script(selector: &str) -> String {
    format!(
        r#"(() => {{
            try {{ return document.querySelectorAll('{}').length; }}
            catch (e) {{ return 0; }}
        }})()"#,
        sanitize_js_string(selector)
    )
}

/// Shared helper that clicks an element, following `<link>` targets.
const ACTIVATE_FN: &str = r#"
    const activate = (el) => {
        if (!el || el.hasAttribute('disabled') || el.getAttribute('aria-disabled') === 'true') return false;
        if (el.tagName === 'LINK') {
            if (!el.href) return false;
            location.href = el.href;
            return true;
        }
        el.scrollIntoView({ behavior: 'auto', block: 'center' });
        el.click();
        return true;
    };
"#;

/// Build the script for a click target. The script evaluates to a boolean.
pub fn click_script(target: &ClickTarget) -> String {
    match target {
        ClickTarget::Selector(selector) => format!(
            r#"(() => {{
                {ACTIVATE_FN}
                let el = null;
                try {{ el = document.querySelector('{}'); }} catch (e) {{ return false; }}
                return activate(el);
            }})()"#,
            sanitize_js_string(selector)
        ),
        ClickTarget::Text {
            scope,
            phrases,
            matching,
        } => {
            let list = phrases
                .iter()
                .map(|p| format!("'{}'", sanitize_js_string(&p.to_lowercase())))
                .collect::<Vec<_>>()
                .join(", ");
            let test = match matching {
                PhraseMatch::Contains => "txt.includes(p)",
                PhraseMatch::Leading => "(txt === p || txt.startsWith(p + ' '))",
            };
            format!(
                r#"(() => {{
                    {ACTIVATE_FN}
                    const phrases = [{list}];
                    let nodes = [];
                    try {{ nodes = Array.from(document.querySelectorAll('{scope}')); }} catch (e) {{ return false; }}
                    for (const el of nodes) {{
                        const txt = (el.innerText || el.textContent || '').replace(/\s+/g, ' ').trim().toLowerCase();
                        if (!txt || !phrases.some(p => {test})) continue;
                        const rect = el.getBoundingClientRect();
                        if (!rect || rect.width <= 0 || rect.height <= 0) continue;
                        return activate(el);
                    }}
                    return false;
                }})()"#,
                scope = sanitize_js_string(scope),
            )
        }
        ClickTarget::PageNumber { selector, number } => format!(
            r#"(() => {{
                {ACTIVATE_FN}
                let nodes = [];
                try {{ nodes = Array.from(document.querySelectorAll('{}')); }} catch (e) {{ return false; }}
                const el = nodes.find(n => (n.textContent || '').trim() === '{}');
                return el ? activate(el) : false;
            }})()"#,
            sanitize_js_string(selector),
            number
        ),
    }
}

/// Build the script for a scroll gesture.
pub fn scroll_script(scroll: Scroll) -> String {
    match scroll {
        Scroll::ToBottom { step_px, tick_ms } => format!(
            r#"new Promise((resolve) => {{
                let total = 0;
                const timer = setInterval(() => {{
                    const {{ scrollHeight }} = document.body;
                    window.scrollBy(0, {step_px});
                    total += {step_px};
                    if (total >= scrollHeight - window.innerHeight - 200) {{
                        clearInterval(timer);
                        resolve(true);
                    }}
                }}, {tick_ms});
            }})"#
        ),
        Scroll::By(dy) => format!("(() => {{ window.scrollBy(0, {dy}); return true; }})()"),
        Scroll::ToEnd => {
            "(() => { window.scrollBy(0, document.body.scrollHeight); return true; })()".to_string()
        }
    }
}

/// Escape a string for safe injection into a single-quoted JS literal.
///
/// Handles backslashes, quotes, backticks, line breaks, and null bytes, and
/// encodes `<`/`>` so a value can never close a surrounding script tag.
pub fn sanitize_js_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '\\' => result.push_str("\\\\"),
            '\'' => result.push_str("\\'"),
            '"' => result.push_str("\\\""),
            '`' => result.push_str("\\`"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\0' => {}
            '<' => result.push_str("\\x3c"),
            '>' => result.push_str("\\x3e"),
            _ => result.push(ch),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_quotes_and_tags() {
        assert_eq!(sanitize_js_string("it's"), "it\\'s");
        assert_eq!(sanitize_js_string(r#"a[href="x"]"#), r#"a[href=\"x\"]"#);
        let s = sanitize_js_string("</script>");
        assert!(!s.contains("</script>"));
        assert_eq!(sanitize_js_string("a\0b"), "ab");
    }

    #[test]
    fn test_selector_is_injected_as_literal() {
        let js = click_script(&ClickTarget::Selector("a'); alert(1); ('".into()));
        assert!(js.contains(r"document.querySelector('a\'); alert(1); (\'')"));
    }

    #[test]
    fn test_text_click_uses_matching_mode() {
        let contains = click_script(&ClickTarget::Text {
            scope: "button".into(),
            phrases: vec!["Load More".into()],
            matching: PhraseMatch::Contains,
        });
        assert!(contains.contains("'load more'"));
        assert!(contains.contains("txt.includes(p)"));

        let leading = click_script(&ClickTarget::Text {
            scope: "button".into(),
            phrases: vec!["ok".into()],
            matching: PhraseMatch::Leading,
        });
        assert!(leading.contains("txt.startsWith(p + ' ')"));
    }

    #[test]
    fn test_scroll_scripts() {
        let js = scroll_script(Scroll::ToBottom {
            step_px: 600,
            tick_ms: 120,
        });
        assert!(js.contains("window.scrollBy(0, 600)"));
        assert!(js.contains("}, 120)"));
        assert!(scroll_script(Scroll::By(-400)).contains("scrollBy(0, -400)"));
    }

    #[test]
    fn test_page_number_script() {
        let js = click_script(&ClickTarget::PageNumber {
            selector: ".pagination a".into(),
            number: 3,
        });
        assert!(js.contains("=== '3'"));
    }
}
