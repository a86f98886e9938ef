//! Memoization of rendered part groups.
//!
//! Keys carry everything a group's appearance depends on, so a hit is always
//! safe to reuse. The actor-owned [`PartCache`] is shared with render passes
//! as an immutable snapshot; each pass collects what it rendered in a
//! [`PassCache`] and the actor merges that back afterwards, unless the cache
//! was cleared in the meantime.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use threadline_core::{MessagePart, Permission};
use tracing::debug;

use crate::render::{PartGroup, RenderFlags, RenderedBlock};

pub type CacheMap = HashMap<CacheKey, Arc<RenderedBlock>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub message_id: String,
    /// Text part anchoring the group; `None` for a group without text.
    pub part_id: Option<String>,
    /// Fingerprint of the text part's content.
    pub fingerprint: u64,
    pub flags: RenderFlags,
    /// `(part id, state hash)` for every attached part.
    pub dependents: Vec<(String, u64)>,
}

fn fingerprint<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

impl CacheKey {
    pub fn for_group(
        message_id: &str,
        group: &PartGroup<'_>,
        flags: RenderFlags,
        pending: &HashMap<String, Permission>,
    ) -> Self {
        let dependents = group
            .attached
            .iter()
            .filter_map(|part| match part {
                MessagePart::Tool(tool) => {
                    let gated = pending.get(&tool.call_id).map(|p| p.title.as_str());
                    Some((tool.id.clone(), fingerprint(&(tool, gated))))
                }
                MessagePart::Reasoning(reasoning) => {
                    Some((reasoning.id.clone(), fingerprint(reasoning)))
                }
                _ => None,
            })
            .collect();
        Self {
            message_id: message_id.to_string(),
            part_id: group.part_id().map(str::to_string),
            fingerprint: group.text.map(fingerprint).unwrap_or_default(),
            flags,
            dependents,
        }
    }
}

/// Something that can hand out rendered blocks by key.
pub trait BlockCache {
    /// Return the cached block for `key`, rendering and remembering it on a miss.
    fn get_or_render<F>(&mut self, key: CacheKey, render: F) -> Arc<RenderedBlock>
    where
        F: FnOnce() -> RenderedBlock;

    /// Render a block that must not be cached.
    fn bypass<F>(&mut self, render: F) -> Arc<RenderedBlock>
    where
        F: FnOnce() -> RenderedBlock,
    {
        Arc::new(render())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Long-lived cache owned by the engine.
#[derive(Debug, Clone, Default)]
pub struct PartCache {
    entries: Arc<CacheMap>,
    generation: u64,
    stats: CacheStats,
}

impl PartCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bumped on every clear; passes started before it are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Shared read-only view for a render pass.
    pub fn snapshot(&self) -> Arc<CacheMap> {
        Arc::clone(&self.entries)
    }

    pub fn clear(&mut self, reason: &str) {
        debug!(reason, entries = self.entries.len(), "Clearing part cache");
        self.entries = Arc::new(HashMap::new());
        self.generation += 1;
    }

    /// Fold a pass's fresh entries in. Returns `false` when the pass was
    /// started against an older generation and its entries were dropped.
    pub fn merge(&mut self, generation: u64, fresh: Vec<(CacheKey, Arc<RenderedBlock>)>) -> bool {
        if generation != self.generation {
            debug!(
                pass = generation,
                current = self.generation,
                "Discarding entries from stale render pass"
            );
            return false;
        }
        if !fresh.is_empty() {
            self.stats.misses += fresh.len() as u64;
            Arc::make_mut(&mut self.entries).extend(fresh);
        }
        true
    }

    pub(crate) fn record_hits(&mut self, hits: usize) {
        self.stats.hits += hits as u64;
    }
}

impl BlockCache for PartCache {
    fn get_or_render<F>(&mut self, key: CacheKey, render: F) -> Arc<RenderedBlock>
    where
        F: FnOnce() -> RenderedBlock,
    {
        if let Some(block) = self.entries.get(&key) {
            self.stats.hits += 1;
            return Arc::clone(block);
        }
        self.stats.misses += 1;
        let block = Arc::new(render());
        Arc::make_mut(&mut self.entries).insert(key, Arc::clone(&block));
        block
    }
}

/// Per-pass view: reads the shared snapshot, collects new entries.
pub struct PassCache<'a> {
    base: &'a CacheMap,
    fresh: CacheMap,
    hits: usize,
    computed: usize,
}

impl<'a> PassCache<'a> {
    pub fn new(base: &'a CacheMap) -> Self {
        Self {
            base,
            fresh: HashMap::new(),
            hits: 0,
            computed: 0,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn computed(&self) -> usize {
        self.computed
    }

    pub fn into_fresh(self) -> Vec<(CacheKey, Arc<RenderedBlock>)> {
        self.fresh.into_iter().collect()
    }
}

impl BlockCache for PassCache<'_> {
    fn get_or_render<F>(&mut self, key: CacheKey, render: F) -> Arc<RenderedBlock>
    where
        F: FnOnce() -> RenderedBlock,
    {
        let found = self.base.get(&key).or_else(|| self.fresh.get(&key)).cloned();
        if let Some(block) = found {
            self.hits += 1;
            return block;
        }
        self.computed += 1;
        let block = Arc::new(render());
        self.fresh.insert(key, Arc::clone(&block));
        block
    }

    fn bypass<F>(&mut self, render: F) -> Arc<RenderedBlock>
    where
        F: FnOnce() -> RenderedBlock,
    {
        self.computed += 1;
        Arc::new(render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::text::Line;
    use std::cell::Cell;

    fn key(id: &str, width: u16) -> CacheKey {
        CacheKey {
            message_id: "msg_1".to_string(),
            part_id: Some(id.to_string()),
            fingerprint: 7,
            flags: RenderFlags {
                width,
                show_tool_details: false,
                show_thinking: false,
            },
            dependents: Vec::new(),
        }
    }

    fn block(text: &str) -> RenderedBlock {
        RenderedBlock::new(vec![Line::from(text.to_string())])
    }

    #[test]
    fn test_second_lookup_skips_render() {
        let mut cache = PartCache::new();
        let calls = Cell::new(0);
        let render = || {
            calls.set(calls.get() + 1);
            block("hello")
        };
        let first = cache.get_or_render(key("p1", 80), render);
        let second = cache.get_or_render(key("p1", 80), || {
            calls.set(calls.get() + 1);
            block("different")
        });
        assert_eq!(calls.get(), 1);
        assert_eq!(first, second);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn test_width_is_part_of_key() {
        let mut cache = PartCache::new();
        cache.get_or_render(key("p1", 80), || block("wide"));
        let narrow = cache.get_or_render(key("p1", 40), || block("narrow"));
        assert_eq!(narrow.plain_text(), "narrow");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_stale_merge_is_dropped() {
        let mut cache = PartCache::new();
        let generation = cache.generation();
        cache.clear("test");
        assert!(!cache.merge(generation, vec![(key("p1", 80), Arc::new(block("x")))]));
        assert!(cache.is_empty());

        assert!(cache.merge(cache.generation(), vec![(key("p1", 80), Arc::new(block("x")))]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_pass_cache_reads_base_and_collects_fresh() {
        let mut base = CacheMap::new();
        base.insert(key("p1", 80), Arc::new(block("cached")));
        let mut pass = PassCache::new(&base);

        let hit = pass.get_or_render(key("p1", 80), || block("recomputed"));
        assert_eq!(hit.plain_text(), "cached");
        pass.get_or_render(key("p2", 80), || block("new"));
        pass.bypass(|| block("streaming"));

        assert_eq!(pass.hits(), 1);
        assert_eq!(pass.computed(), 2);
        let fresh = pass.into_fresh();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].0, key("p2", 80));
    }

    #[test]
    fn test_snapshot_is_not_affected_by_later_inserts() {
        let mut cache = PartCache::new();
        cache.get_or_render(key("p1", 80), || block("a"));
        let snapshot = cache.snapshot();
        cache.get_or_render(key("p2", 80), || block("b"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(cache.len(), 2);
    }
}
