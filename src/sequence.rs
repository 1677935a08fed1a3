//! Edge sequences and partitions.
//!
//! An [`EdgeSequence`] is one decomposition of a span into sub-edges, each
//! optionally carrying a role (a syntactic function label in parser output,
//! usually absent). A [`Partition`] bundles a sequence with the tag
//! collection, score, and provenance of the derivation that produced it; an
//! edge holds one partition per competing derivation.

use crate::lattice::{EdgeRef, Lattice};
use crate::tags::{LayerTagManager, LayerTags};
use crate::Score;

/// An edge used as a constituent of a larger edge, with an optional role.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeUsage {
    edge: EdgeRef,
    role: Option<String>,
}

impl EdgeUsage {
    pub fn new(edge: EdgeRef) -> Self {
        EdgeUsage { edge, role: None }
    }

    pub fn with_role(edge: EdgeRef, role: impl Into<String>) -> Self {
        EdgeUsage {
            edge,
            role: Some(role.into()),
        }
    }

    pub fn edge(&self) -> EdgeRef {
        self.edge
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }
}

/// An ordered, possibly empty list of edge usages whose concatenated text
/// is the span of the owning edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeSequence {
    links: Vec<EdgeUsage>,
}

impl EdgeSequence {
    /// The empty sequence.
    pub fn new() -> Self {
        EdgeSequence::default()
    }

    /// Starts building a sequence edge by edge.
    pub fn builder() -> EdgeSequenceBuilder {
        EdgeSequenceBuilder { links: Vec::new() }
    }

    pub fn push(&mut self, edge: EdgeRef) {
        self.links.push(EdgeUsage::new(edge));
    }

    pub fn push_usage(&mut self, usage: EdgeUsage) {
        self.links.push(usage);
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn first_edge(&self) -> Option<EdgeRef> {
        self.links.first().map(EdgeUsage::edge)
    }

    pub fn last_edge(&self) -> Option<EdgeRef> {
        self.links.last().map(EdgeUsage::edge)
    }

    pub fn nth_edge(&self, n: usize) -> Option<EdgeRef> {
        self.links.get(n).map(EdgeUsage::edge)
    }

    pub fn nth_role(&self, n: usize) -> Option<&str> {
        self.links.get(n).and_then(EdgeUsage::role)
    }

    /// Iterates the usages in order.
    pub fn iter(&self) -> std::slice::Iter<'_, EdgeUsage> {
        self.links.iter()
    }

    /// Iterates the member edges in order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeRef> + '_ {
        self.links.iter().map(EdgeUsage::edge)
    }

    /// Union of the plane tags carried by the member edges.
    pub fn plane_tags(&self, lattice: &Lattice<'_>) -> LayerTags {
        let manager = LayerTagManager;
        let mut planes = LayerTags::new();
        for edge in self.edges() {
            planes.union_with(&manager.plane_tags(&lattice.edge_tags(edge)));
        }
        planes
    }
}

impl<'a> IntoIterator for &'a EdgeSequence {
    type Item = &'a EdgeUsage;
    type IntoIter = std::slice::Iter<'a, EdgeUsage>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<EdgeRef> for EdgeSequence {
    fn from_iter<I: IntoIterator<Item = EdgeRef>>(iter: I) -> Self {
        EdgeSequence {
            links: iter.into_iter().map(EdgeUsage::new).collect(),
        }
    }
}

/// Builds an [`EdgeSequence`] edge by edge.
#[derive(Debug, Default)]
pub struct EdgeSequenceBuilder {
    links: Vec<EdgeUsage>,
}

impl EdgeSequenceBuilder {
    pub fn edge(mut self, edge: EdgeRef) -> Self {
        self.links.push(EdgeUsage::new(edge));
        self
    }

    pub fn edge_with_role(mut self, edge: EdgeRef, role: impl Into<String>) -> Self {
        self.links.push(EdgeUsage::with_role(edge, role));
        self
    }

    pub fn build(self) -> EdgeSequence {
        EdgeSequence { links: self.links }
    }
}

/// The sequence, score, and provenance of one edge insertion.
///
/// Bundles the optional arguments of
/// [`Lattice::add_edge_full`](crate::Lattice::add_edge_full) and
/// [`Lattice::add_partition`](crate::Lattice::add_partition).
#[derive(Debug, Clone, Default)]
pub struct Derivation {
    pub sequence: EdgeSequence,
    pub score: Score,
    pub rule_id: Option<u32>,
    pub tree_choice: Option<u32>,
}

impl Derivation {
    pub fn new(sequence: EdgeSequence) -> Self {
        Derivation {
            sequence,
            ..Derivation::default()
        }
    }

    pub fn scored(sequence: EdgeSequence, score: Score) -> Self {
        Derivation {
            sequence,
            score,
            ..Derivation::default()
        }
    }

    pub fn with_rule(mut self, rule_id: u32) -> Self {
        self.rule_id = Some(rule_id);
        self
    }

    pub fn with_tree_choice(mut self, tree_choice: u32) -> Self {
        self.tree_choice = Some(tree_choice);
        self
    }
}

/// One derivation of an edge: a tag collection, the decomposition into
/// sub-edges, a score, and provenance identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    tags: LayerTags,
    sequence: EdgeSequence,
    score: Score,
    rule_id: Option<u32>,
    tree_choice: Option<u32>,
}

impl Partition {
    pub(crate) fn new(tags: LayerTags, derivation: Derivation) -> Self {
        Partition {
            tags,
            sequence: derivation.sequence,
            score: derivation.score,
            rule_id: derivation.rule_id,
            tree_choice: derivation.tree_choice,
        }
    }

    pub(crate) fn replace_derivation(&mut self, derivation: Derivation) {
        self.sequence = derivation.sequence;
        self.score = derivation.score;
        self.rule_id = derivation.rule_id;
        self.tree_choice = derivation.tree_choice;
    }

    pub fn tags(&self) -> &LayerTags {
        &self.tags
    }

    pub fn sequence(&self) -> &EdgeSequence {
        &self.sequence
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn rule_id(&self) -> Option<u32> {
        self.rule_id
    }

    pub fn tree_choice(&self) -> Option<u32> {
        self.tree_choice
    }

    pub fn first_edge(&self) -> Option<EdgeRef> {
        self.sequence.first_edge()
    }

    pub fn last_edge(&self) -> Option<EdgeRef> {
        self.sequence.last_edge()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn implicit(pos: usize) -> EdgeRef {
        EdgeRef::Implicit(pos)
    }

    #[test]
    fn builder_preserves_order_and_roles() {
        let sequence = EdgeSequence::builder()
            .edge(implicit(0))
            .edge_with_role(implicit(1), "subject")
            .edge(implicit(2))
            .build();

        assert_eq!(sequence.len(), 3);
        assert_eq!(sequence.first_edge(), Some(implicit(0)));
        assert_eq!(sequence.last_edge(), Some(implicit(2)));
        assert_eq!(sequence.nth_edge(1), Some(implicit(1)));
        assert_eq!(sequence.nth_role(0), None);
        assert_eq!(sequence.nth_role(1), Some("subject"));
    }

    #[test]
    fn empty_sequence() {
        let sequence = EdgeSequence::new();
        assert!(sequence.is_empty());
        assert_eq!(sequence.first_edge(), None);
        assert_eq!(sequence.nth_edge(0), None);
    }

    #[test]
    fn partition_carries_derivation() {
        let tags = LayerTags::new();
        let sequence: EdgeSequence = [implicit(0), implicit(1)].into_iter().collect();
        let partition = Partition::new(
            tags.clone(),
            Derivation::scored(sequence, -2.5).with_rule(7).with_tree_choice(1),
        );
        assert_eq!(partition.score(), -2.5);
        assert_eq!(partition.rule_id(), Some(7));
        assert_eq!(partition.tree_choice(), Some(1));
        assert_eq!(partition.first_edge(), Some(implicit(0)));
        assert_eq!(partition.last_edge(), Some(implicit(1)));
        assert_eq!(partition.tags(), &tags);
    }
}
