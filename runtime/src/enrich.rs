// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! Detail-page enrichment.
//!
//! For each item with a detail URL, visit the page and overlay the values
//! the request's fields yield there. Failures are scoped to the item: it is
//! kept with its list-page values.

use crate::config::EngineConfig;
use crate::extraction::fields::extract_single;
use crate::renderer::{RenderContext, WaitUntil};
use crate::types::{Field, Item};
use scraper::Html;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

/// Why one item could not be enriched.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("detail url {0:?} cannot be resolved")]
    BadUrl(String),

    #[error("detail page {url} failed to load twice: {reason}")]
    Navigation { url: String, reason: String },

    #[error("detail page {url} snapshot failed: {reason}")]
    Snapshot { url: String, reason: String },
}

/// Counts reported after an enrichment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    pub enriched: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// The Deep Enricher.
pub struct Enricher<'a> {
    pub config: &'a EngineConfig,
    pub fields: &'a [Field],
    pub detail_field: &'a str,
    pub wait_for_selector: Option<&'a str>,
    pub nav_timeout_ms: u64,
}

impl Enricher<'_> {
    /// Enrich items in place, in order, until done or `deadline` passes.
    pub async fn run(
        &self,
        ctx: &mut dyn RenderContext,
        base: &Url,
        items: &mut [Item],
        deadline: Instant,
    ) -> EnrichmentReport {
        let mut report = EnrichmentReport::default();
        for item in items.iter_mut() {
            if Instant::now() >= deadline {
                warn!("deadline reached, remaining items keep list values");
                break;
            }
            let Some(raw) = item.get(self.detail_field).map(str::to_string) else {
                report.skipped += 1;
                continue;
            };
            match self.enrich_one(ctx, base, &raw).await {
                Ok((url, values)) => {
                    let overlaid = overlay(item, values);
                    item.detail_url = Some(url);
                    debug!(index = item.index, overlaid, "item enriched");
                    report.enriched += 1;
                }
                Err(e) => {
                    warn!(index = item.index, error = %e, "enrichment failed");
                    report.failed += 1;
                }
            }
        }
        info!(
            enriched = report.enriched,
            skipped = report.skipped,
            failed = report.failed,
            "enrichment finished"
        );
        report
    }

    async fn enrich_one(
        &self,
        ctx: &mut dyn RenderContext,
        base: &Url,
        raw: &str,
    ) -> Result<(String, Vec<(String, String)>), EnrichmentError> {
        let url = base
            .join(raw.trim())
            .map_err(|_| EnrichmentError::BadUrl(raw.to_string()))?
            .to_string();

        if let Err(first) = ctx
            .navigate(&url, WaitUntil::DomContentLoaded, self.nav_timeout_ms)
            .await
        {
            debug!(url = %url, error = %first, "detail navigation failed, retrying");
            ctx.navigate(&url, WaitUntil::DomContentLoaded, self.nav_timeout_ms)
                .await
                .map_err(|e| EnrichmentError::Navigation {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;
        }

        if let Some(sel) = self.wait_for_selector {
            let _ = ctx.wait_for(sel, self.config.timings.selector_wait_ms).await;
        }

        let html = ctx.get_html().await.map_err(|e| EnrichmentError::Snapshot {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        let page_url = Url::parse(&url).ok();
        let values = detail_values(&html, self.fields, page_url.as_ref());
        Ok((url, values))
    }
}

/// Values the fields yield on a detail page. Misses are left out.
fn detail_values(html: &str, fields: &[Field], base: Option<&Url>) -> Vec<(String, String)> {
    let doc = Html::parse_document(html);
    extract_single(&doc, fields, base)
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect()
}

/// Overlay detail values onto an item. Returns how many fields changed.
pub fn overlay(item: &mut Item, values: Vec<(String, String)>) -> usize {
    let mut changed = 0;
    for (name, value) in values {
        let slot = item.values.entry(name).or_insert(None);
        if slot.as_deref() != Some(value.as_str()) {
            changed += 1;
        }
        *slot = Some(value);
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::fixture::{FixtureRenderer, FixtureSite};
    use crate::renderer::Renderer;
    use std::time::Duration;

    const LIST: &str = "https://shop.example/list";

    fn item(i: usize, title: &str, link: Option<&str>) -> Item {
        let mut it = Item::new(i);
        it.values.insert("title".into(), Some(title.into()));
        it.values.insert("link".into(), link.map(str::to_string));
        it.values.insert("price".into(), Some("list price".into()));
        it
    }

    fn fields() -> Vec<Field> {
        vec![
            Field::text("title", "h1"),
            Field::attr("link", "a.self", "href"),
            Field::text("price", ".price"),
        ]
    }

    #[test]
    fn test_overlay_keeps_unmatched_values() {
        let mut it = item(0, "Old", Some("/p/1"));
        let n = overlay(&mut it, vec![("title".into(), "New".into())]);
        assert_eq!(n, 1);
        assert_eq!(it.get("title"), Some("New"));
        assert_eq!(it.get("price"), Some("list price"));
    }

    #[tokio::test]
    async fn test_enrich_merges_and_isolates_failures() {
        let site = FixtureSite::new()
            .page("https://shop.example/p/1", r#"<h1>Lamp One</h1><p class="price">$10</p>"#)
            .page("https://shop.example/p/2", r#"<h1>Lamp Two</h1>"#)
            .page("https://shop.example/p/3", r#"<h1>Lamp Three</h1>"#)
            .fail_navigation("https://shop.example/p/2", 1)
            .fail_navigation("https://shop.example/p/3", 2);
        let r = FixtureRenderer::new(site);
        let mut ctx = r.new_context().await.unwrap();

        let mut items = vec![
            item(0, "one", Some("/p/1")),
            item(1, "two", Some("p/2")),
            item(2, "three", Some("https://shop.example/p/3")),
            item(3, "four", None),
        ];
        let config = EngineConfig::instant();
        let f = fields();
        let enricher = Enricher {
            config: &config,
            fields: &f,
            detail_field: "link",
            wait_for_selector: None,
            nav_timeout_ms: 1000,
        };
        let base = Url::parse(LIST).unwrap();
        let deadline = Instant::now() + Duration::from_secs(30);
        let report = enricher.run(ctx.as_mut(), &base, &mut items, deadline).await;

        assert_eq!(report, EnrichmentReport { enriched: 2, skipped: 1, failed: 1 });

        assert_eq!(items[0].get("title"), Some("Lamp One"));
        assert_eq!(items[0].get("price"), Some("$10"));
        assert_eq!(items[0].detail_url.as_deref(), Some("https://shop.example/p/1"));

        // Retried once, then succeeded; price missing on the detail page.
        assert_eq!(items[1].get("title"), Some("Lamp Two"));
        assert_eq!(items[1].get("price"), Some("list price"));

        // Failed twice: untouched.
        assert_eq!(items[2].get("title"), Some("three"));
        assert_eq!(items[2].detail_url, None);
        assert_eq!(items[3].detail_url, None);
    }
}
