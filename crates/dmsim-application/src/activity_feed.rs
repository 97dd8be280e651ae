use crate::presets::default_activities;
use dmsim_core::Result;
use dmsim_core::activity::{ActivityDraft, ActivityItem};

/// Owns the list of pending social notifications.
///
/// Items are kept most recent first. Confirming, deleting and dismissing an
/// item are all the same operation: [`remove`](Self::remove).
#[derive(Debug, Clone)]
pub struct ActivityFeedManager {
    items: Vec<ActivityItem>,
    seed_len: usize,
}

impl ActivityFeedManager {
    /// Creates a feed starting with `seed` (already most recent first).
    pub fn new(seed: Vec<ActivityItem>) -> Self {
        Self {
            seed_len: seed.len(),
            items: seed,
        }
    }

    pub fn list(&self) -> &[ActivityItem] {
        &self.items
    }

    /// Prepends `item`. Duplicates are kept.
    pub fn add(&mut self, item: ActivityItem) {
        tracing::debug!(id = %item.id, kind = %item.kind, "activity added");
        self.items.insert(0, item);
    }

    /// Builds an item from the composer and prepends it.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the draft has no name; the feed is unchanged.
    pub fn add_from_draft(&mut self, draft: ActivityDraft) -> Result<ActivityItem> {
        let item = draft.into_item()?;
        self.add(item.clone());
        Ok(item)
    }

    /// Removes the first item with `id`; does nothing if there is none.
    pub fn remove(&mut self, id: &str) -> Option<ActivityItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    /// How many more items the feed holds than it was seeded with.
    pub fn added_since_seed(&self) -> usize {
        self.items.len().saturating_sub(self.seed_len)
    }
}

impl Default for ActivityFeedManager {
    fn default() -> Self {
        Self::new(default_activities())
    }
}
