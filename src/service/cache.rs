use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;

/**
 * The entity families the list cache tracks. Each kind carries its own
 * generation counter.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Category,
    SubCategory,
    State,
    Member,
    ChapterMeeting,
    Training,
    Package,
    PowerTeam,
    Reference,
    ThankYouSlip,
    Requirement,
}

impl EntityKind {
    /**
     * Kinds whose cached lists embed data from this kind and must be
     * invalidated together with it. Sub category lists show category names,
     * power team lists link both taxonomies, member-derived lists show
     * member names.
     */
    fn related(&self) -> &'static [EntityKind] {
        match self {
            EntityKind::Category => &[EntityKind::SubCategory, EntityKind::PowerTeam],
            EntityKind::SubCategory => &[EntityKind::PowerTeam],
            EntityKind::State => &[EntityKind::Member],
            EntityKind::Member => &[EntityKind::Reference, EntityKind::ThankYouSlip, EntityKind::Requirement],
            _ => &[],
        }
    }
}

/**
 * Cache for list responses. Every kind has a generation; mutations bump the
 * generation for the kind and its related kinds, which orphans all entries
 * written under older generations. A page fetched under an old generation is
 * never written back over fresher data.
 */
pub struct ListCache {
    generations: RwLock<HashMap<EntityKind, u64>>,
    entries: RwLock<HashMap<(EntityKind, String), (u64, Value)>>,
}

impl ListCache {
    /**
     * Creates an empty cache with all generations at zero.
     */
    pub fn new() -> Self {
        ListCache { generations: RwLock::new(HashMap::new()), entries: RwLock::new(HashMap::new()) }
    }

    /**
     * Current generation for a kind.
     */
    pub fn generation(&self, kind: EntityKind) -> u64 {
        match self.generations.read() {
            Ok(generations) => generations.get(&kind).copied().unwrap_or(0),
            Err(_) => 0,
        }
    }

    /**
     * Returns the cached page for the key if it was stored under the current
     * generation.
     */
    pub fn get(&self, kind: EntityKind, key: &str) -> Option<Value> {
        let generation = self.generation(kind);
        let entries = self.entries.read().ok()?;
        match entries.get(&(kind, key.to_string())) {
            Some((entry_generation, value)) if *entry_generation == generation => Some(value.clone()),
            _ => None,
        }
    }

    /**
     * Stores a page that was fetched under `generation`. Dropped silently if
     * the kind has been invalidated since the fetch started.
     */
    pub fn put(&self, kind: EntityKind, key: String, generation: u64, value: Value) {
        if generation != self.generation(kind) {
            return;
        }
        if let Ok(mut entries) = self.entries.write() {
            entries.insert((kind, key), (generation, value));
        }
    }

    /**
     * Invalidates all cached lists for the kind and its related kinds by
     * bumping their generations.
     */
    pub fn invalidate(&self, kind: EntityKind) {
        if let Ok(mut generations) = self.generations.write() {
            *generations.entry(kind).or_insert(0) += 1;
            for related in kind.related() {
                *generations.entry(*related).or_insert(0) += 1;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hit_within_generation() {
        let cache = ListCache::new();
        let generation = cache.generation(EntityKind::Category);
        cache.put(EntityKind::Category, "page=1".to_string(), generation, json!({"items": [1]}));
        assert_eq!(cache.get(EntityKind::Category, "page=1"), Some(json!({"items": [1]})));
    }

    #[test]
    fn test_invalidate_drops_entries() {
        let cache = ListCache::new();
        let generation = cache.generation(EntityKind::Package);
        cache.put(EntityKind::Package, "page=1".to_string(), generation, json!({"items": []}));
        cache.invalidate(EntityKind::Package);
        assert_eq!(cache.get(EntityKind::Package, "page=1"), None);
    }

    #[test]
    fn test_stale_put_is_dropped() {
        let cache = ListCache::new();
        let stale_generation = cache.generation(EntityKind::Member);
        cache.invalidate(EntityKind::Member);
        cache.put(EntityKind::Member, "page=1".to_string(), stale_generation, json!({"items": []}));
        assert_eq!(cache.get(EntityKind::Member, "page=1"), None);
    }

    #[test]
    fn test_related_kinds_invalidated() {
        let cache = ListCache::new();
        let subcategory_generation = cache.generation(EntityKind::SubCategory);
        let powerteam_generation = cache.generation(EntityKind::PowerTeam);
        let state_generation = cache.generation(EntityKind::State);
        cache.invalidate(EntityKind::Category);
        assert_eq!(cache.generation(EntityKind::SubCategory), subcategory_generation + 1);
        assert_eq!(cache.generation(EntityKind::PowerTeam), powerteam_generation + 1);
        assert_eq!(cache.generation(EntityKind::State), state_generation);
    }

    #[test]
    fn test_member_invalidates_derived_lists() {
        let cache = ListCache::new();
        let reference_generation = cache.generation(EntityKind::Reference);
        let slip_generation = cache.generation(EntityKind::ThankYouSlip);
        let requirement_generation = cache.generation(EntityKind::Requirement);
        cache.invalidate(EntityKind::Member);
        assert_eq!(cache.generation(EntityKind::Reference), reference_generation + 1);
        assert_eq!(cache.generation(EntityKind::ThankYouSlip), slip_generation + 1);
        assert_eq!(cache.generation(EntityKind::Requirement), requirement_generation + 1);
    }

    #[test]
    fn test_kinds_are_independent() {
        let cache = ListCache::new();
        let generation = cache.generation(EntityKind::Training);
        cache.put(EntityKind::Training, "page=1".to_string(), generation, json!({"items": [2]}));
        cache.invalidate(EntityKind::ChapterMeeting);
        assert_eq!(cache.get(EntityKind::Training, "page=1"), Some(json!({"items": [2]})));
    }
}
