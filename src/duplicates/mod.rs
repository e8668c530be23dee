//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Collecting `Item` elements keyed by `id` (see [`groups`])
//! - Resolving each duplicate group to a single keeper
//! - Detaching the discarded elements from the tree (see [`engine`])

pub mod engine;
pub mod groups;

pub use engine::{deduplicate, DedupReport, GroupOutcome, ItemRecord};
pub use groups::{
    collect_items, describe_text, group_by_id, DuplicateGroup, Resolution, ResourceItem,
};
