// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! Best-effort cookie/consent banner dismissal.
//!
//! Runs once after the first load. Every failure is swallowed: a banner that
//! stays up only hides content, it never fails a request.

use crate::renderer::{pause, ClickTarget, PhraseMatch, RenderContext};
use tracing::debug;

/// Known accept controls, tried in order.
pub const CONSENT_SELECTORS: &[&str] = &[
    "button#onetrust-accept-btn-handler",
    "button[aria-label='Accept']",
    "button[data-testid='accept-cookies-button']",
    "button[aria-label='Accept all']",
    "button[aria-label='I agree']",
    "button[id*='accept']",
    "button[class*='accept']",
    "button[class*='consent']",
    "a[class*='accept']",
    ".cookie-accept",
    "[data-role='accept']",
];

/// Phrases accepted as the leading text of a consent control.
pub const CONSENT_PHRASES: &[&str] = &[
    "accept",
    "i agree",
    "got it",
    "agree & close",
    "ok",
    "allow",
    "同意",
    "确定",
];

const PHRASE_SCOPE: &str = "button, a[role=\"button\"]";

/// Click the first consent control found. Returns whether anything was clicked.
pub async fn dismiss(ctx: &mut dyn RenderContext, pause_ms: u64) -> bool {
    for sel in CONSENT_SELECTORS {
        if let Ok(true) = ctx.click(&ClickTarget::Selector(sel.to_string())).await {
            debug!(selector = sel, "consent dismissed");
            pause(pause_ms).await;
            return true;
        }
    }

    let by_text = ClickTarget::Text {
        scope: PHRASE_SCOPE.to_string(),
        phrases: CONSENT_PHRASES.iter().map(|p| p.to_string()).collect(),
        matching: PhraseMatch::Leading,
    };
    match ctx.click(&by_text).await {
        Ok(true) => {
            debug!("consent dismissed by phrase");
            pause(pause_ms).await;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::fixture::{FixtureRenderer, FixtureSite};
    use crate::renderer::{Renderer, WaitUntil};

    const URL: &str = "https://news.example/";

    async fn run(html: &str) -> (bool, String) {
        let r = FixtureRenderer::new(
            FixtureSite::new()
                .page(URL, html)
                .on_click(URL, "<p id=\"clicked\"></p>"),
        );
        let mut ctx = r.new_context().await.unwrap();
        ctx.navigate(URL, WaitUntil::Load, 1000).await.unwrap();
        let clicked = dismiss(ctx.as_mut(), 0).await;
        let html = ctx.get_html().await.unwrap();
        ctx.close().await.unwrap();
        (clicked, html)
    }

    #[tokio::test]
    async fn test_known_selector_wins() {
        let (clicked, html) =
            run(r#"<button id="onetrust-accept-btn-handler">Accept All</button>"#).await;
        assert!(clicked);
        assert!(html.contains("clicked"));
    }

    #[tokio::test]
    async fn test_leading_phrase_only() {
        let (clicked, _) = run(r#"<button>Book now</button><button>Okay then</button>"#).await;
        assert!(!clicked);

        let (clicked, _) = run(r#"<button>Book now</button><button> OK </button>"#).await;
        assert!(clicked);
    }
}
