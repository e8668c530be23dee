//! Deduplication engine: applies the keep policy to a document tree.
//!
//! The engine is pure: it mutates the tree it is given and returns a
//! [`DedupReport`] describing what was removed and kept. Reporting the
//! outcome is the caller's job.
//!
//! # Example
//!
//! ```
//! use itemdedup::document::Document;
//! use itemdedup::duplicates::deduplicate;
//!
//! let mut doc = Document::parse(
//!     r#"<Root><Item id="a" text="1"/><Item id="b"/><Item id="a" text="2"/></Root>"#,
//!     false,
//! )
//! .unwrap();
//!
//! let report = deduplicate(&mut doc);
//! assert_eq!(report.groups_processed(), 1);
//! assert_eq!(report.items_removed(), 1);
//! assert_eq!(
//!     doc.to_xml(false),
//!     r#"<?xml version="1.0" encoding="utf-8"?><Root><Item id="b"/><Item id="a" text="2"/></Root>"#
//! );
//! ```

use crate::document::{Document, NodePath};

use super::groups::{collect_items, describe_text, group_by_id, Resolution};

/// What happened to one duplicate group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupOutcome {
    /// The shared `id`.
    pub id: String,
    /// Text of each removed item, in record order.
    pub removed: Vec<Option<String>>,
    /// Text of the kept item.
    pub kept: Option<String>,
    /// The kept item sat inside a removed element and went with it.
    pub keeper_lost: bool,
}

/// A single removal or keep record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRecord<'a> {
    Removed { id: &'a str, text: Option<&'a str> },
    Reserved { id: &'a str, text: Option<&'a str> },
}

impl ItemRecord<'_> {
    /// Format the record for an input named `name`.
    #[must_use]
    pub fn render(&self, name: &str) -> String {
        match *self {
            Self::Removed { id, text } => {
                format!("{name} -  Removed Item: id: {id} {}", describe_text(text))
            }
            Self::Reserved { id, text } => {
                format!("{name} - Reserved Item: id: {id} {}", describe_text(text))
            }
        }
    }
}

impl GroupOutcome {
    /// Records for this group: every removal, then the keeper unless it was
    /// lost with a removed ancestor.
    pub fn records(&self) -> impl Iterator<Item = ItemRecord<'_>> {
        let id = self.id.as_str();
        let kept = (!self.keeper_lost).then_some(ItemRecord::Reserved {
            id,
            text: self.kept.as_deref(),
        });
        self.removed
            .iter()
            .map(move |text| ItemRecord::Removed {
                id,
                text: text.as_deref(),
            })
            .chain(kept)
    }
}

/// Summary of one deduplication pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupReport {
    /// Per-group outcomes in order of first occurrence.
    pub groups: Vec<GroupOutcome>,
}

impl DedupReport {
    /// Number of duplicate groups found.
    #[must_use]
    pub fn groups_processed(&self) -> usize {
        self.groups.len()
    }

    /// Number of elements detached.
    #[must_use]
    pub fn items_removed(&self) -> usize {
        self.groups.iter().map(|g| g.removed.len()).sum()
    }

    /// Check if the document had no duplicates.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.groups.is_empty()
    }

    /// All records, group by group.
    pub fn records(&self) -> impl Iterator<Item = ItemRecord<'_>> {
        self.groups.iter().flat_map(GroupOutcome::records)
    }
}

/// Remove duplicate `Item` elements from `doc`, keeping one per `id`.
///
/// Elements without an `id` and all non-duplicated elements are left in
/// place and in order.
pub fn deduplicate(doc: &mut Document) -> DedupReport {
    let groups = group_by_id(collect_items(doc.root()));
    if groups.is_empty() {
        return DedupReport::default();
    }

    let resolutions: Vec<Resolution> = groups.into_iter().map(|g| g.resolve()).collect();

    let mut doomed: Vec<NodePath> = resolutions
        .iter()
        .flat_map(|r| r.discards.iter().map(|d| d.path.clone()))
        .collect();
    // Detach back to front so the remaining paths stay valid.
    doomed.sort_unstable_by(|a, b| b.cmp(a));
    for path in &doomed {
        if doc.detach(path).is_none() {
            log::warn!("Item at {:?} was already detached", path);
        }
    }

    let groups: Vec<GroupOutcome> = resolutions
        .into_iter()
        .map(|r| {
            let keeper_lost = has_detached_ancestor(&r.keeper.path, &doomed);
            if keeper_lost {
                log::warn!(
                    "Kept item {} was nested in a removed item and is gone",
                    r.id
                );
            }
            GroupOutcome {
                id: r.id,
                removed: r.discards.into_iter().map(|d| d.text).collect(),
                kept: r.keeper.text,
                keeper_lost,
            }
        })
        .collect();

    log::debug!(
        "Removed {} duplicate item(s) across {} group(s)",
        doomed.len(),
        groups.len()
    );

    DedupReport { groups }
}

fn has_detached_ancestor(path: &[usize], detached: &[NodePath]) -> bool {
    detached
        .iter()
        .any(|d| d.len() < path.len() && path.starts_with(d))
}
