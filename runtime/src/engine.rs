// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! Request orchestration.
//!
//! One [`Engine`] serves every request. Each request gets its own page
//! context, used sequentially from first navigation to enrichment and closed
//! on every exit path.

use crate::config::EngineConfig;
use crate::consent;
use crate::discovery::{self, pagination as detect};
use crate::enrich::Enricher;
use crate::errors::{TrawlError, ValidationError};
use crate::extraction::fields::extract_single;
use crate::pagination::controller::Controller;
use crate::pagination::resolver::{resolve, Overrides};
use crate::renderer::{pause, NavigationResult, RenderContext, Renderer, WaitUntil};
use crate::types::{
    DiscoveryRequest, DiscoveryResult, ExtractionOutput, ExtractionRequest, FieldKind, Mode,
    PaginationDescriptor, PaginationStrategy,
};
use scraper::Html;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn, Instrument};
use url::Url;
use uuid::Uuid;

/// Structural selectors waited on when the list selector never appears.
pub const ALT_WAIT_SELECTORS: &[&str] = &[
    r#"[class*="product"]"#,
    r#"[class*="item"]"#,
    r#"[class*="card"]"#,
    r#"[class*="result"]"#,
    r#"[data-testid*="product"]"#,
    r#"[data-testid*="item"]"#,
    "article",
    ".search-result",
    ".listing",
];

fn parse_http_url(raw: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(raw.trim()).map_err(|_| ValidationError::InvalidUrl)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ValidationError::InvalidUrl),
    }
}

fn is_blank(s: &Option<String>) -> bool {
    s.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Check a request before any page access.
pub fn validate(req: &ExtractionRequest) -> Result<(), ValidationError> {
    parse_http_url(&req.url)?;
    if req.mode == Mode::Unknown {
        return Err(ValidationError::UnsupportedMode);
    }
    if req.fields.is_empty() {
        return Err(ValidationError::NoFields);
    }

    let mut names = HashSet::new();
    for field in &req.fields {
        if !names.insert(field.name.as_str()) {
            return Err(ValidationError::DuplicateField(field.name.clone()));
        }
        if field.kind == FieldKind::Attr && is_blank(&field.attr) {
            return Err(ValidationError::MissingAttr(field.name.clone()));
        }
    }

    if req.mode == Mode::List && is_blank(&req.list_item_selector) {
        return Err(ValidationError::MissingListSelector);
    }
    if req.deep_search && is_blank(&req.detail_url_field_name) {
        return Err(ValidationError::MissingDetailField);
    }
    if let (Some(min), Some(limit)) = (req.effective_min(), req.effective_limit()) {
        if min > limit {
            return Err(ValidationError::MinExceedsLimit { min, limit });
        }
    }
    Ok(())
}

fn detect_pagination(html: &str) -> PaginationDescriptor {
    let doc = Html::parse_document(html);
    detect::detect(&doc)
}

fn single_record(
    html: &str,
    req: &ExtractionRequest,
    base: Option<&Url>,
) -> BTreeMap<String, Option<String>> {
    let doc = Html::parse_document(html);
    extract_single(&doc, &req.fields, base)
}

fn browser_error(e: anyhow::Error) -> TrawlError {
    TrawlError::Browser(e.to_string())
}

/// The extraction engine.
pub struct Engine {
    renderer: Arc<dyn Renderer>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(renderer: Arc<dyn Renderer>, config: EngineConfig) -> Self {
        Self { renderer, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }

    /// Load a page and propose an extraction configuration for it.
    pub async fn discover(&self, req: DiscoveryRequest) -> Result<DiscoveryResult, TrawlError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("discover", %request_id, url = %req.url);
        async move {
            parse_http_url(&req.url)?;
            let mut ctx = self.renderer.new_context().await.map_err(browser_error)?;
            let result = self.run_discovery(ctx.as_mut(), &req).await;
            if let Err(e) = ctx.close().await {
                warn!(error = %e, "failed to close page context");
            }
            if let Ok(found) = &result {
                info!(
                    mode = ?found.mode,
                    list = ?found.list_item_selector,
                    suggestions = found.suggestions.len(),
                    pagination = ?found.pagination.kind,
                    "discovery finished"
                );
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Run an extraction request.
    pub async fn extract(&self, req: ExtractionRequest) -> Result<ExtractionOutput, TrawlError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("extract", %request_id, url = %req.url, mode = ?req.mode);
        async move {
            if let Err(e) = validate(&req) {
                warn!(error = %e, "request rejected");
                return Err(e.into());
            }
            let started = Instant::now();
            let deadline = started + Duration::from_millis(self.config.timings.max_duration_ms);

            let mut ctx = self.renderer.new_context().await.map_err(browser_error)?;
            let result = self.run_extraction(ctx.as_mut(), &req, deadline).await;
            if let Err(e) = ctx.close().await {
                warn!(error = %e, "failed to close page context");
            }

            match &result {
                Ok(ExtractionOutput::List { count, .. }) => {
                    info!(count, elapsed_ms = started.elapsed().as_millis() as u64, "extraction finished");
                }
                Ok(ExtractionOutput::Single { data }) => {
                    let filled = data.values().filter(|v| v.is_some()).count();
                    info!(filled, fields = data.len(), "single extraction finished");
                }
                Err(e) => warn!(error = %e, "extraction failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_discovery(
        &self,
        ctx: &mut dyn RenderContext,
        req: &DiscoveryRequest,
    ) -> Result<DiscoveryResult, TrawlError> {
        let timeout = self.config.timings.nav_timeout(req.timeout_ms);
        self.open(ctx, &req.url, timeout).await?;
        let html = ctx.get_html().await.map_err(browser_error)?;
        Ok(discovery::discover(&html))
    }

    async fn run_extraction(
        &self,
        ctx: &mut dyn RenderContext,
        req: &ExtractionRequest,
        deadline: Instant,
    ) -> Result<ExtractionOutput, TrawlError> {
        let timeout = self.config.timings.nav_timeout(req.timeout_ms);
        let landed = self.open(ctx, &req.url, timeout).await?;
        self.wait_for_content(&*ctx, req).await;

        match req.mode {
            Mode::Single => {
                let html = ctx.get_html().await.map_err(browser_error)?;
                let base = Url::parse(&landed.final_url).ok();
                let data = single_record(&html, req, base.as_ref());
                Ok(ExtractionOutput::Single { data })
            }
            Mode::List => self.run_list(ctx, req, deadline).await,
            Mode::Unknown => Err(ValidationError::UnsupportedMode.into()),
        }
    }

    async fn run_list(
        &self,
        ctx: &mut dyn RenderContext,
        req: &ExtractionRequest,
        deadline: Instant,
    ) -> Result<ExtractionOutput, TrawlError> {
        let descriptor = if req.pagination_strategy == PaginationStrategy::None {
            PaginationDescriptor::default()
        } else {
            match ctx.get_html().await {
                Ok(html) => detect_pagination(&html),
                Err(e) => {
                    debug!(error = %e, "pagination detection skipped");
                    PaginationDescriptor::default()
                }
            }
        };
        let plan = resolve(
            req.pagination_strategy,
            &descriptor,
            &Overrides::from_request(req),
        );
        info!(
            requested = ?req.pagination_strategy,
            detected = ?descriptor.kind,
            strategy = ?plan.strategy,
            "pagination resolved"
        );

        let outcome = Controller::new(&self.config, req, &plan, deadline)
            .run(ctx)
            .await;
        info!(
            pages = outcome.pages_visited,
            stop = ?outcome.stop,
            items = outcome.items.len(),
            "list collected"
        );
        let mut items = outcome.items;

        if req.deep_search {
            if let Some(detail_field) = req.detail_url_field_name.as_deref() {
                let base = parse_http_url(&req.url)?;
                let enricher = Enricher {
                    config: &self.config,
                    fields: &req.fields,
                    detail_field,
                    wait_for_selector: req.wait_for_selector.as_deref(),
                    nav_timeout_ms: self.config.timings.nav_timeout(req.timeout_ms),
                };
                enricher.run(ctx, &base, &mut items, deadline).await;
            }
        }

        Ok(ExtractionOutput::List {
            count: items.len(),
            data: items,
        })
    }

    /// Top-level navigation: network idle first, then one retry on
    /// DOM-content-loaded. Settles and dismisses consent banners after load.
    async fn open(
        &self,
        ctx: &mut dyn RenderContext,
        url: &str,
        timeout_ms: u64,
    ) -> Result<NavigationResult, TrawlError> {
        let landed = match ctx.navigate(url, WaitUntil::NetworkIdle, timeout_ms).await {
            Ok(r) => r,
            Err(first) => {
                warn!(error = %first, "network-idle navigation failed, retrying on DOM content loaded");
                ctx.navigate(url, WaitUntil::DomContentLoaded, timeout_ms)
                    .await
                    .map_err(|e| TrawlError::Navigation {
                        url: url.to_string(),
                        reason: e.to_string(),
                    })?
            }
        };
        info!(final_url = %landed.final_url, load_time_ms = landed.load_time_ms, "page loaded");

        let t = &self.config.timings;
        pause(t.settle_ms).await;
        if consent::dismiss(ctx, t.consent_pause_ms).await {
            info!("consent banner dismissed");
        }
        Ok(landed)
    }

    /// Wait for the requested selector. In list mode, fall back to common
    /// structural selectors, then proceed regardless.
    async fn wait_for_content(&self, ctx: &dyn RenderContext, req: &ExtractionRequest) {
        let t = &self.config.timings;
        let primary = req
            .wait_for_selector
            .as_deref()
            .or(req.list_item_selector.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty());

        if let Some(sel) = primary {
            match ctx.wait_for(sel, t.selector_wait_ms).await {
                Ok(()) => return,
                Err(e) => debug!(selector = sel, error = %e, "wait selector did not appear"),
            }
        }
        if req.mode != Mode::List {
            return;
        }
        for alt in ALT_WAIT_SELECTORS {
            if ctx.wait_for(alt, t.alt_selector_wait_ms).await.is_ok() {
                info!(selector = alt, "alternative selector appeared");
                return;
            }
        }
        warn!("no list content appeared, proceeding anyway");
        pause(t.missing_selector_pause_ms).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Field;

    fn list_req() -> ExtractionRequest {
        ExtractionRequest::list(
            "https://shop.example/list",
            ".card",
            vec![Field::text("title", "h2")],
        )
    }

    #[test]
    fn test_valid_request_passes() {
        assert_eq!(validate(&list_req()), Ok(()));
        let single = ExtractionRequest::single("http://a.example", vec![Field::text("t", "h1")]);
        assert_eq!(validate(&single), Ok(()));
    }

    #[test]
    fn test_url_rules() {
        for bad in ["", "not a url", "ftp://a.example/x", "file:///etc/passwd"] {
            let mut r = list_req();
            r.url = bad.into();
            assert_eq!(validate(&r), Err(ValidationError::InvalidUrl), "{bad}");
        }
    }

    #[test]
    fn test_field_rules() {
        let mut r = list_req();
        r.fields.clear();
        assert_eq!(validate(&r), Err(ValidationError::NoFields));

        let mut r = list_req();
        r.fields.push(Field::text("title", ".other"));
        assert_eq!(validate(&r), Err(ValidationError::DuplicateField("title".into())));

        let mut r = list_req();
        let mut link = Field::attr("link", "a", "href");
        link.attr = Some(" ".into());
        r.fields.push(link);
        assert_eq!(validate(&r), Err(ValidationError::MissingAttr("link".into())));
    }

    #[test]
    fn test_mode_rules() {
        let mut r = list_req();
        r.list_item_selector = Some("  ".into());
        assert_eq!(validate(&r), Err(ValidationError::MissingListSelector));

        let mut r = list_req();
        r.mode = Mode::Unknown;
        assert_eq!(validate(&r), Err(ValidationError::UnsupportedMode));

        let mut r = list_req();
        r.deep_search = true;
        assert_eq!(validate(&r), Err(ValidationError::MissingDetailField));
        r.detail_url_field_name = Some("link".into());
        assert_eq!(validate(&r), Ok(()));
    }

    #[test]
    fn test_min_limit_rule() {
        let mut r = list_req();
        r.min = Some(20);
        r.limit = Some(10);
        assert_eq!(
            validate(&r),
            Err(ValidationError::MinExceedsLimit { min: 20, limit: 10 })
        );
        // A zero limit is unset, so min alone is fine.
        r.limit = Some(0);
        assert_eq!(validate(&r), Ok(()));
    }
}
