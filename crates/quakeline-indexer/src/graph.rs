//! Association-graph connectivity.
//!
//! Nodes are event keys; the latest revision of each series contributes its
//! own key plus an edge to every key it associates with. A withdrawn series
//! still contributes (its tombstone defines its edges), so a bare DELETE
//! drops the series' earlier associations while a DELETE that carries links
//! keeps bridging.

use std::collections::HashMap;

use quakeline_types::{cmp_preference, Event, EventKey, ProductSummary};

/// Partitions an event's summaries by association-graph connectivity.
///
/// Returns one group of summary index ids per connected component, the
/// group that keeps the event id first. Every revision of a series travels
/// with its series. A single-element result means the event is intact.
pub fn partition_components(event: &Event) -> Vec<Vec<i64>> {
    let latest = event.latest_summaries();
    if latest.is_empty() {
        return Vec::new();
    }

    let mut nodes = UnionFind::default();
    for summary in &latest {
        let keys = summary.connected_keys();
        let first = nodes.index(&keys[0]);
        for key in &keys[1..] {
            let other = nodes.index(key);
            nodes.union(first, other);
        }
    }

    // Group series (and their full revision history) by component root.
    let mut components: HashMap<usize, Vec<i64>> = HashMap::new();
    let mut best: HashMap<usize, &ProductSummary> = HashMap::new();
    for summary in &event.summaries {
        let root = {
            let idx = nodes.index(&summary.event_key());
            nodes.find(idx)
        };
        components
            .entry(root)
            .or_default()
            .extend(summary.index_id);
    }
    for &summary in &latest {
        let idx = nodes.index(&summary.event_key());
        let root = nodes.find(idx);
        best.entry(root)
            .and_modify(|current| {
                if cmp_preference(summary, *current).is_gt() {
                    *current = summary;
                }
            })
            .or_insert(summary);
    }

    // The component holding the most preferred summary keeps the event id;
    // remaining components order by their best summary so the output is
    // deterministic.
    let mut ordered: Vec<(&ProductSummary, Vec<i64>)> = components
        .into_iter()
        .filter_map(|(root, ids)| best.get(&root).map(|&summary| (summary, ids)))
        .collect();
    ordered.sort_by(|(a, _), (b, _)| cmp_preference(*b, *a));
    ordered.into_iter().map(|(_, ids)| ids).collect()
}

#[derive(Default)]
struct UnionFind {
    ids: HashMap<EventKey, usize>,
    parent: Vec<usize>,
}

impl UnionFind {
    fn index(&mut self, key: &EventKey) -> usize {
        if let Some(&idx) = self.ids.get(key) {
            return idx;
        }
        let idx = self.parent.len();
        self.ids.insert(key.clone(), idx);
        self.parent.push(idx);
        idx
    }

    fn find(&mut self, mut idx: usize) -> usize {
        while self.parent[idx] != idx {
            // Path halving keeps lookups near-constant.
            self.parent[idx] = self.parent[self.parent[idx]];
            idx = self.parent[idx];
        }
        idx
    }

    fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            self.parent[root_b] = root_a;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quakeline_types::{ProductId, ProductStatus};
    use std::collections::BTreeMap;

    fn summary(
        index_id: i64,
        source: &str,
        product_type: &str,
        code: &str,
        update_time: i64,
        status: ProductStatus,
        associated: Vec<EventKey>,
    ) -> ProductSummary {
        ProductSummary {
            index_id: Some(index_id),
            id: ProductId::new(source, product_type, code, update_time),
            status,
            preferred_weight: 100,
            properties: BTreeMap::new(),
            associated,
            latitude: None,
            longitude: None,
            depth: None,
            magnitude: None,
            event_time: None,
            version: None,
        }
    }

    #[test]
    fn bridged_event_is_one_component() {
        let mut event = Event::new(1);
        event.summaries.push(summary(
            1,
            "us",
            "origin",
            "usaaa",
            1_000,
            ProductStatus::Update,
            vec![],
        ));
        event.summaries.push(summary(
            2,
            "ci",
            "origin",
            "cibbb",
            1_000,
            ProductStatus::Update,
            vec![],
        ));
        event.summaries.push(summary(
            3,
            "atlas",
            "shakemap",
            "atlasccc",
            1_000,
            ProductStatus::Update,
            vec![EventKey::new("us", "usaaa"), EventKey::new("ci", "cibbb")],
        ));

        assert_eq!(partition_components(&event).len(), 1);
    }

    #[test]
    fn superseding_the_bridge_disconnects() {
        let mut event = Event::new(1);
        event.summaries.push(summary(
            1,
            "us",
            "origin",
            "usaaa",
            1_000,
            ProductStatus::Update,
            vec![],
        ));
        event.summaries.push(summary(
            2,
            "ci",
            "origin",
            "cibbb",
            2_000,
            ProductStatus::Update,
            vec![],
        ));
        event.summaries.push(summary(
            3,
            "atlas",
            "shakemap",
            "atlasccc",
            1_000,
            ProductStatus::Update,
            vec![EventKey::new("us", "usaaa"), EventKey::new("ci", "cibbb")],
        ));
        // Newer revision keeps only one association: the bridge is gone.
        event.summaries.push(summary(
            4,
            "atlas",
            "shakemap",
            "atlasccc",
            1_500,
            ProductStatus::Update,
            vec![EventKey::new("us", "usaaa")],
        ));

        let components = partition_components(&event);
        assert_eq!(components.len(), 2);
        // Equal weights: the ci origin is most recent, so its component
        // keeps the event id; both shakemap revisions stay with usaaa.
        assert_eq!(components[0], vec![2]);
        let mut survivors = components[1].clone();
        survivors.sort();
        assert_eq!(survivors, vec![1, 3, 4]);
    }

    #[test]
    fn delete_tombstone_edges_still_bridge() {
        let mut event = Event::new(1);
        event.summaries.push(summary(
            1,
            "us",
            "origin",
            "usaaa",
            1_000,
            ProductStatus::Update,
            vec![],
        ));
        event.summaries.push(summary(
            2,
            "ci",
            "origin",
            "cibbb",
            1_000,
            ProductStatus::Update,
            vec![],
        ));
        // The withdrawal itself names cibbb, so the graph stays connected.
        event.summaries.push(summary(
            3,
            "us",
            "origin",
            "usaaa",
            2_000,
            ProductStatus::Delete,
            vec![EventKey::new("ci", "cibbb")],
        ));

        assert_eq!(partition_components(&event).len(), 1);
    }
}
