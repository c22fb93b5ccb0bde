//! Pure operations over an ordered install queue.
//!
//! The queue itself is owned by the caller; every operation here takes the
//! current queue by value and returns a new one. Nothing in this module
//! spawns processes or touches the filesystem.

use std::collections::VecDeque;

use chrono::Utc;

use crate::types::ItemStatus;

use super::item::{InstallItem, ItemKind};

/// Parameters for creating a queue item.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub kind: ItemKind,
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub required: bool,
    pub post_install: Vec<String>,
    /// Caller asserts the package is already present on the system.
    pub already_installed: bool,
}

impl NewItem {
    pub fn new(kind: ItemKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            description: None,
            version: None,
            required: false,
            post_install: Vec::new(),
            already_installed: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_post_install<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.post_install = commands.into_iter().map(Into::into).collect();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn installed(mut self) -> Self {
        self.already_installed = true;
        self
    }
}

/// Result of an add operation: the new queue plus which ids were appended
/// and which incoming entries were rejected as duplicates.
#[derive(Debug)]
pub struct AddOutcome {
    pub queue: Vec<InstallItem>,
    pub added: Vec<String>,
    pub duplicates: Vec<String>,
}

fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Build a queue id for an item.
///
/// Package ids are `kind:normalized-name` so the same package cannot be
/// queued twice. Script ids also carry a millisecond timestamp and a random
/// suffix: a user may legitimately queue the same script more than once,
/// even within the same millisecond.
pub fn generate_id(kind: &ItemKind, name: &str) -> String {
    let slug = slugify(name);
    if kind.is_script() {
        let millis = Utc::now().timestamp_millis();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("script:{}-{}-{}", slug, millis, &suffix[..8])
    } else {
        format!("{}:{}", kind.tag(), slug)
    }
}

/// Create an item from `params`, assigning the kind's default description
/// when none is given. No position is assigned; `add` and `reindex` own
/// ordering.
pub fn create_item(params: NewItem) -> InstallItem {
    let id = generate_id(&params.kind, &params.name);
    let description = params
        .description
        .unwrap_or_else(|| params.kind.default_description().to_string());
    let status = if params.already_installed {
        ItemStatus::AlreadyInstalled
    } else {
        ItemStatus::Pending
    };

    InstallItem {
        id,
        name: params.name.trim().to_string(),
        kind: params.kind,
        position: None,
        status,
        description,
        version: params.version,
        required: params.required,
        post_install: params.post_install,
        logs: VecDeque::new(),
    }
}

/// Exact-id membership check.
pub fn is_duplicate(queue: &[InstallItem], id: &str) -> bool {
    queue.iter().any(|item| item.id == id)
}

/// Case-insensitive, trimmed `(kind, name)` match - the semantic "is this
/// really the same package" check used when adding.
pub fn is_duplicate_by_kind_and_name(queue: &[InstallItem], kind: &ItemKind, name: &str) -> bool {
    let needle = name.trim().to_lowercase();
    queue
        .iter()
        .any(|item| item.kind.tag() == kind.tag() && item.normalized_name() == needle)
}

/// Normalize positions to a contiguous `1..=N` run matching array order.
///
/// If any item carries a position, items are stable-sorted by it first
/// (missing positions sort last), so "insert at an intended slot" and
/// "append to the end" both converge. If no item has a position, the
/// current array order is kept.
pub fn reindex(mut queue: Vec<InstallItem>) -> Vec<InstallItem> {
    if queue.iter().any(|item| item.position.is_some()) {
        queue.sort_by_key(|item| item.position.unwrap_or(i64::MAX));
    }
    for (index, item) in queue.iter_mut().enumerate() {
        item.position = Some(index as i64 + 1);
    }
    queue
}

/// Append one item, rejecting package duplicates. Scripts are never
/// rejected.
pub fn add(queue: Vec<InstallItem>, params: NewItem) -> AddOutcome {
    add_multiple(queue, vec![params])
}

/// Append a batch, de-duplicating against the queue and within the batch
/// itself (first occurrence wins). Positions continue from the existing
/// queue length.
pub fn add_multiple(queue: Vec<InstallItem>, batch: Vec<NewItem>) -> AddOutcome {
    let mut queue = queue;
    let mut added = Vec::new();
    let mut duplicates = Vec::new();

    for params in batch {
        let mut item = create_item(params);
        // Accepted items are pushed before the next batch entry is checked,
        // so the in-queue check also covers intra-batch duplicates.
        if !item.kind.is_script() && is_duplicate_by_kind_and_name(&queue, &item.kind, &item.name)
        {
            duplicates.push(item.id);
            continue;
        }
        item.position = Some(queue.len() as i64 + 1);
        added.push(item.id.clone());
        queue.push(item);
    }

    AddOutcome {
        queue,
        added,
        duplicates,
    }
}

/// Remove the item with `id` and close the position gap.
pub fn remove(queue: Vec<InstallItem>, id: &str) -> Vec<InstallItem> {
    let filtered: Vec<InstallItem> = queue.into_iter().filter(|item| item.id != id).collect();
    reindex(filtered)
}

/// Move the item with `id` to a 1-based `new_position`, clamped into the
/// queue bounds. Unknown ids and no-op moves return the queue unchanged.
pub fn move_item(queue: Vec<InstallItem>, id: &str, new_position: i64) -> Vec<InstallItem> {
    if queue.is_empty() {
        return queue;
    }
    let clamped = new_position.clamp(1, queue.len() as i64);
    let Some(current) = queue.iter().position(|item| item.id == id) else {
        return queue;
    };
    let target = (clamped - 1) as usize;
    if current == target {
        return queue;
    }

    let mut queue = queue;
    let item = queue.remove(current);
    queue.insert(target, item);
    // Array order is the only source of truth from here; stored positions
    // would be stale after the reinsert.
    for item in &mut queue {
        item.position = None;
    }
    reindex(queue)
}

/// Merge `incoming` into `existing`, dropping incoming items whose id is
/// already present. When nothing survives, `existing` is returned untouched
/// so callers can compare against their previous queue and skip re-renders.
pub fn merge(existing: Vec<InstallItem>, incoming: Vec<InstallItem>) -> Vec<InstallItem> {
    let surviving: Vec<InstallItem> = incoming
        .into_iter()
        .filter(|item| !is_duplicate(&existing, &item.id))
        .collect();
    if surviving.is_empty() {
        return existing;
    }

    let offset = existing
        .iter()
        .filter_map(|item| item.position)
        .max()
        .unwrap_or(0);
    let mut merged = existing;
    for (index, mut item) in surviving.into_iter().enumerate() {
        item.position = Some(match item.position {
            Some(position) => position + offset,
            None => offset + index as i64 + 1,
        });
        merged.push(item);
    }
    merged
}
