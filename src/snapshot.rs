//! Serializable edge records.
//!
//! External readers/writers exchange a record-oriented form of the lattice:
//! per edge, its begin anchor, length, tag list, category, text, attribute
//! pairs, and partitions referencing other edges by ordinal. Ordinals do
//! not exist inside the lattice; [`edge_records`] assigns them in
//! deterministic source order so a writer can re-emit the structure
//! losslessly and a reader can rebuild it through the ordinary graph
//! operations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::lattice::{EdgeRef, Lattice, VertexId};
use crate::tags::TagMask;

/// A vertex as seen by serialized forms: a byte offset or a loose index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Anchor {
    Offset(usize),
    Loose(usize),
}

impl Anchor {
    fn of(vertex: VertexId) -> Anchor {
        match vertex.position() {
            Some(position) => Anchor::Offset(position),
            None => Anchor::Loose(vertex.loose_index().unwrap_or(0)),
        }
    }
}

/// One partition of an edge, members given as ordinals of previously
/// listed edges. Members outside the enumerated set are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionRecord {
    pub tags: Vec<String>,
    pub score: f64,
    pub rule_id: Option<u32>,
    pub tree_choice: Option<u32>,
    pub members: Vec<usize>,
}

/// One edge in serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub ordinal: usize,
    pub begin: Anchor,
    pub end: Anchor,
    /// Byte length when both endpoints are real.
    pub length: Option<usize>,
    pub tags: Vec<String>,
    pub category: String,
    pub text: String,
    pub attributes: Vec<(String, String)>,
    pub score: f64,
    pub hidden: bool,
    pub partitions: Vec<PartitionRecord>,
}

/// Enumerates the edges admitted by `mask` in source order, assigning
/// ordinals, and renders each as a record.
pub fn edge_records(lattice: &Lattice<'_>, mask: &TagMask) -> Vec<EdgeRecord> {
    let edges: Vec<EdgeRef> = lattice.edges_by_source(mask).collect();
    let ordinals: HashMap<EdgeRef, usize> = edges
        .iter()
        .copied()
        .enumerate()
        .map(|(ordinal, edge)| (edge, ordinal))
        .collect();

    edges
        .iter()
        .copied()
        .enumerate()
        .map(|(ordinal, edge)| {
            let item = lattice.edge_item(edge);
            EdgeRecord {
                ordinal,
                begin: Anchor::of(lattice.edge_source(edge)),
                end: Anchor::of(lattice.edge_target(edge)),
                length: lattice.edge_length(edge).ok(),
                tags: lattice.tag_manager().tag_names(&lattice.edge_tags(edge)),
                category: item.category().to_string(),
                text: item.text().to_string(),
                attributes: lattice.item_manager().values(&item),
                score: lattice.edge_score(edge),
                hidden: lattice.is_edge_hidden(edge),
                partitions: lattice
                    .edge_partitions(edge)
                    .iter()
                    .map(|partition| PartitionRecord {
                        tags: lattice.tag_manager().tag_names(partition.tags()),
                        score: partition.score(),
                        rule_id: partition.rule_id(),
                        tree_choice: partition.tree_choice(),
                        members: partition
                            .sequence()
                            .edges()
                            .filter_map(|member| ordinals.get(&member).copied())
                            .collect(),
                    })
                    .collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{AnnotationItem, AnnotationItemManager};
    use crate::sequence::EdgeSequence;

    #[test]
    fn records_cover_tokens_over_symbols() {
        let items = AnnotationItemManager::new();
        let mut lattice = Lattice::with_text(&items, "ma");
        lattice
            .add_symbols(lattice.first_vertex(), lattice.last_vertex())
            .unwrap();
        let manager = *lattice.tag_manager();
        let symbol_mask = manager.mask_named("symbol");
        let sequence: EdgeSequence = lattice.edges_by_source(&symbol_mask).collect();
        let mut word = AnnotationItem::with_text("word", "ma");
        items.set_value(&mut word, "base", "mieć");
        lattice
            .add_edge(
                lattice.first_vertex(),
                lattice.last_vertex(),
                word,
                manager.singleton("token"),
                sequence,
            )
            .unwrap();

        let records = edge_records(&lattice, &manager.any());
        assert_eq!(records.len(), 3);

        // Source order, explicit before implicit at a shared vertex.
        assert_eq!(records[0].category, "word");
        assert_eq!(records[1].category, "'m");
        assert_eq!(records[1].begin, Anchor::Offset(0));
        assert_eq!(records[1].length, Some(1));
        assert!(records[1].hidden);
        assert_eq!(records[2].category, "'a");

        let token = records
            .iter()
            .find(|record| record.category == "word")
            .expect("token record");
        assert_eq!(token.text, "ma");
        assert_eq!(token.length, Some(2));
        assert_eq!(
            token.attributes,
            vec![("base".to_string(), "mieć".to_string())]
        );
        assert_eq!(token.partitions.len(), 1);
        // The token's partition references the two symbol records.
        let symbol_ordinals: Vec<usize> = records
            .iter()
            .filter(|record| record.category.starts_with('\''))
            .map(|record| record.ordinal)
            .collect();
        assert_eq!(token.partitions[0].members, symbol_ordinals);

        let json = serde_json::to_string(&records).unwrap();
        let back: Vec<EdgeRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, records);
    }
}
