//! Id-set helpers shared by the listing and artwork phases.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;

use marquee_model::{MetadataType, UnifiedVideoRow};

/// Groups `items` by key, keeping each group in input order.
pub fn group_by_key<K, V, I, F>(items: I, key: F) -> HashMap<K, Vec<V>>
where
    K: Eq + Hash,
    I: IntoIterator<Item = V>,
    F: Fn(&V) -> K,
{
    let mut groups: HashMap<K, Vec<V>> = HashMap::new();
    for item in items {
        groups.entry(key(&item)).or_default().push(item);
    }
    groups
}

/// Distinct ids in first-seen order.
pub fn distinct_ids(ids: impl IntoIterator<Item = i64>) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Buckets row ids by entity type, deduplicated, in row order.
pub fn ids_by_type<'a>(
    rows: impl IntoIterator<Item = &'a UnifiedVideoRow>,
) -> BTreeMap<MetadataType, Vec<i64>> {
    let mut buckets: BTreeMap<MetadataType, Vec<i64>> = BTreeMap::new();
    for row in rows {
        buckets.entry(row.metadata_type).or_default().push(row.id);
    }
    for ids in buckets.values_mut() {
        let unique = distinct_ids(ids.iter().copied());
        *ids = unique;
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_model::{ExtraValues, Hierarchy};

    fn row(metadata_type: MetadataType, id: i64) -> UnifiedVideoRow {
        UnifiedVideoRow {
            id,
            metadata_type,
            title: None,
            original_title: None,
            sort_title: None,
            year: None,
            release_date: None,
            hierarchy: Hierarchy::Standalone,
            watched: None,
            newest: None,
            extras: ExtraValues::default(),
        }
    }

    #[test]
    fn buckets_rows_by_type_without_duplicates() {
        let rows = vec![
            row(MetadataType::Series, 4),
            row(MetadataType::Movie, 2),
            row(MetadataType::Movie, 1),
            row(MetadataType::Movie, 2),
        ];
        let buckets = ids_by_type(&rows);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[&MetadataType::Movie], vec![2, 1]);
        assert_eq!(buckets[&MetadataType::Series], vec![4]);
    }

    #[test]
    fn groups_keep_input_order() {
        let pairs = vec![(1, 'a'), (2, 'b'), (1, 'c')];
        let groups = group_by_key(pairs, |(k, _)| *k);
        assert_eq!(groups[&1], vec![(1, 'a'), (1, 'c')]);
        assert_eq!(groups[&2], vec![(2, 'b')]);
    }
}
