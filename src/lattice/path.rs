//! Best-path extraction.

use super::{EdgeRef, Lattice, VertexId};
use crate::sequence::EdgeSequence;
use crate::tags::TagMask;
use crate::Score;

impl<'a> Lattice<'a> {
    /// Follows the best outgoing edge admitted by `mask` from `vertex`
    /// until none matches, returning the traversed edges. `vertex` is left
    /// at the final reached position.
    ///
    /// The best edge has the highest score; among equal top scores the edge
    /// encountered later in incident order wins.
    pub fn follow_path(&self, vertex: &mut VertexId, mask: &TagMask) -> EdgeSequence {
        self.follow_path_where(vertex, mask, |_, _| false)
    }

    /// Like [`follow_path`](Self::follow_path), but where no edge matches
    /// `mask`, continues through the best of all outgoing edges for which
    /// `skip` holds; the walk ends when neither exists.
    pub fn follow_path_where<P>(
        &self,
        vertex: &mut VertexId,
        mask: &TagMask,
        skip: P,
    ) -> EdgeSequence
    where
        P: Fn(&Lattice<'_>, EdgeRef) -> bool,
    {
        let mut sequence = EdgeSequence::new();
        loop {
            let step = self
                .best_edge(self.out_edges(*vertex, mask))
                .or_else(|| {
                    self.best_edge(
                        self.all_out_edges(*vertex)
                            .filter(|&edge| skip(self, edge)),
                    )
                });
            match step {
                Some(edge) => {
                    sequence.push(edge);
                    *vertex = self.edge_target(edge);
                }
                None => break,
            }
        }
        sequence
    }

    /// [`follow_path_where`](Self::follow_path_where) instantiated with the
    /// blank-annotation predicate, for crossing markup and whitespace
    /// edges the mask does not cover.
    pub fn follow_path_skipping_blanks(
        &self,
        vertex: &mut VertexId,
        mask: &TagMask,
    ) -> EdgeSequence {
        self.follow_path_where(vertex, mask, |lattice, edge| lattice.is_blank(edge))
    }

    fn best_edge(&self, edges: impl Iterator<Item = EdgeRef>) -> Option<EdgeRef> {
        let mut best: Option<(Score, EdgeRef)> = None;
        for edge in edges {
            let score = self.edge_score(edge);
            match best {
                Some((top, _)) if score < top => {}
                _ => best = Some((score, edge)),
            }
        }
        best.map(|(_, edge)| edge)
    }
}
