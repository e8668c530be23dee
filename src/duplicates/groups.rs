//! Resource item grouping and the keep policy.
//!
//! # Overview
//!
//! Resource items are `Item` elements carrying an `id` attribute. Items that
//! share an `id` form a [`DuplicateGroup`]; only groups with two or more
//! members are duplicates. Each group is resolved to a single keeper:
//!
//! 1. The last member in document order is the tentative keeper.
//! 2. If its `text` is null, the nearest earlier member with a non-null
//!    `text` takes its place and the last member becomes a discard.
//! 3. If no member has text, the last member is kept anyway.
//!
//! # Example
//!
//! ```
//! use itemdedup::document::Document;
//! use itemdedup::duplicates::{collect_items, group_by_id};
//!
//! let doc = Document::parse(
//!     r#"<Root><Item id="x"/><Item id="x" text="A"/><Item id="x"/><Item id="y"/></Root>"#,
//!     false,
//! )
//! .unwrap();
//!
//! let groups = group_by_id(collect_items(doc.root()));
//! assert_eq!(groups.len(), 1);
//!
//! let resolution = groups.into_iter().next().unwrap().resolve();
//! assert_eq!(resolution.keeper.text.as_deref(), Some("A"));
//! assert_eq!(resolution.discards.len(), 2);
//! ```

use std::collections::HashMap;

use crate::document::{Element, NodePath};

/// Element name of a resource item.
pub const ITEM_ELEMENT: &str = "Item";
/// Attribute holding the item key.
pub const ID_ATTRIBUTE: &str = "id";
/// Attribute holding the item value.
pub const TEXT_ATTRIBUTE: &str = "text";

/// A resource item located in a document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceItem {
    /// Path of the element from the root.
    pub path: NodePath,
    /// Value of the `id` attribute.
    pub id: String,
    /// Value of the `text` attribute, `None` when the attribute is absent.
    pub text: Option<String>,
}

/// Describe an item's text: `text: <value>` or `the text is null`.
#[must_use]
pub fn describe_text(text: Option<&str>) -> String {
    match text {
        Some(text) => format!("text: {text}"),
        None => "the text is null".to_string(),
    }
}

/// All resource items sharing one `id`, in document order.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    /// The shared `id`.
    pub id: String,
    /// Members in document order.
    pub members: Vec<ResourceItem>,
}

/// Outcome of applying the keep policy to a group.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The shared `id`.
    pub id: String,
    /// The surviving item.
    pub keeper: ResourceItem,
    /// Items to detach, in record order.
    pub discards: Vec<ResourceItem>,
}

impl DuplicateGroup {
    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Apply the keep policy.
    ///
    /// When an earlier member is promoted, it swaps slots with the last
    /// member, so the displaced last member is reported in the promoted
    /// member's original position.
    ///
    /// # Panics
    ///
    /// Panics if the group is empty.
    #[must_use]
    pub fn resolve(self) -> Resolution {
        let mut members = self.members;
        let last = members.len() - 1;

        if members[last].text.is_none() {
            if let Some(idx) = members[..last].iter().rposition(|m| m.text.is_some()) {
                members.swap(idx, last);
            }
        }

        let keeper = members.pop().expect("duplicate group has members");
        Resolution {
            id: self.id,
            keeper,
            discards: members,
        }
    }
}

/// Collect every descendant `Item` element that has an `id` attribute.
///
/// The root element itself is not considered. Items without `id` are skipped.
#[must_use]
pub fn collect_items(root: &Element) -> Vec<ResourceItem> {
    let mut items = Vec::new();
    root.walk_descendants(|path, el| {
        if el.name() != ITEM_ELEMENT {
            return;
        }
        if let Some(id) = el.attribute(ID_ATTRIBUTE) {
            items.push(ResourceItem {
                path: path.clone(),
                id: id.to_string(),
                text: el.attribute(TEXT_ATTRIBUTE).map(str::to_string),
            });
        }
    });
    items
}

/// Group items by exact `id`, keeping only groups with 2+ members.
///
/// Groups are ordered by first occurrence; members keep document order.
#[must_use]
pub fn group_by_id(items: Vec<ResourceItem>) -> Vec<DuplicateGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<DuplicateGroup> = Vec::new();

    for item in items {
        match index.get(&item.id) {
            Some(&slot) => groups[slot].members.push(item),
            None => {
                index.insert(item.id.clone(), groups.len());
                groups.push(DuplicateGroup {
                    id: item.id.clone(),
                    members: vec![item],
                });
            }
        }
    }

    groups.retain(|g| g.len() > 1);
    groups
}
