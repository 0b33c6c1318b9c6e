// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! Record extraction: field reads, list pages, dedup, and exclusion.

pub mod dedup;
pub mod exclusion;
pub mod fields;
pub mod list;

pub use dedup::SeenSet;
pub use list::{ListExtractor, PageExtraction};
