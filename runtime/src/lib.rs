// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! Trawl runtime library: heuristic discovery, list extraction, and
//! multi-page traversal for arbitrary web pages.
//!
//! [`engine::Engine`] is the entry point. It drives a
//! [`renderer::RenderContext`] through navigation, [`discovery`],
//! [`extraction`], [`pagination`], and [`enrich`].

pub mod cli;
pub mod config;
pub mod consent;
pub mod discovery;
pub mod engine;
pub mod enrich;
pub mod errors;
pub mod extraction;
pub mod pagination;
pub mod renderer;
pub mod rest;
pub mod selectors;
pub mod types;
