//! Iterators over vertices and edges.
//!
//! All iterators are pull-based, lazy, and finite. They snapshot nothing
//! beyond what ordering requires, so a fresh iterator always reflects
//! current lattice state; the borrow checker rules out mutation while one
//! is alive.

use std::collections::HashSet;

use super::{EdgeRef, Lattice, VertexId};
use crate::error::{LatticeError, LatticeResult};
use crate::tags::TagMask;

impl<'a> Lattice<'a> {
    /// Outgoing edges of `vertex` admitted by `mask`: explicit edges in
    /// insertion order, then the implicit symbol edge.
    pub fn out_edges(&self, vertex: VertexId, mask: &TagMask) -> IncidentEdges<'_> {
        let explicit = self
            .vertex_record(vertex)
            .map(|record| record.out.as_slice())
            .unwrap_or(&[]);
        let mut implicit = Vec::new();
        if let Some(position) = vertex.position() {
            if self.implicit_at(position) {
                implicit.push(position);
            }
        }
        IncidentEdges {
            lattice: self,
            mask: mask.clone(),
            explicit: explicit.iter(),
            implicit,
            implicit_next: 0,
        }
    }

    /// Incoming edges of `vertex` admitted by `mask`.
    pub fn in_edges(&self, vertex: VertexId, mask: &TagMask) -> IncidentEdges<'_> {
        let explicit = self
            .vertex_record(vertex)
            .map(|record| record.inc.as_slice())
            .unwrap_or(&[]);
        let mut implicit = Vec::new();
        if let Some(position) = vertex.position() {
            if let Some(p) = self.prev_char_start(position) {
                if self.implicit_at(p) && !self.retargeted.contains_key(&p) {
                    implicit.push(p);
                }
            }
        }
        if let Some(sources) = self.retarget_sources.get(&vertex) {
            for &p in sources {
                if self.implicit_at(p) {
                    implicit.push(p);
                }
            }
        }
        IncidentEdges {
            lattice: self,
            mask: mask.clone(),
            explicit: explicit.iter(),
            implicit,
            implicit_next: 0,
        }
    }

    /// Outgoing edges under the universal mask.
    pub fn all_out_edges(&self, vertex: VertexId) -> IncidentEdges<'_> {
        self.out_edges(vertex, &TagMask::Any)
    }

    /// Incoming edges under the universal mask.
    pub fn all_in_edges(&self, vertex: VertexId) -> IncidentEdges<'_> {
        self.in_edges(vertex, &TagMask::Any)
    }

    /// First outgoing edge admitted by `mask`.
    pub fn first_out_edge(&self, vertex: VertexId, mask: &TagMask) -> LatticeResult<EdgeRef> {
        self.out_edges(vertex, mask)
            .next()
            .ok_or(LatticeError::NoEdge {
                context: "no outgoing edge matches the mask",
            })
    }

    /// First incoming edge admitted by `mask`.
    pub fn first_in_edge(&self, vertex: VertexId, mask: &TagMask) -> LatticeResult<EdgeRef> {
        self.in_edges(vertex, mask)
            .next()
            .ok_or(LatticeError::NoEdge {
                context: "no incoming edge matches the mask",
            })
    }

    /// Vertices in ascending order, loose vertices interleaved where their
    /// wiring anchors them. With `skip_useless`, real vertices with no
    /// incident edges at all (explicit or implicit) are omitted; loose
    /// vertices are always yielded.
    pub fn vertices(&self, skip_useless: bool) -> Vertices {
        let mut implicit_targets = HashSet::new();
        for position in self.implicit.ones() {
            implicit_targets.insert(self.effective_target(position));
        }

        // (key, rank, tiebreak, vertex): loose vertices sort just before
        // the real vertex sharing their anchor position.
        let mut entries: Vec<(usize, u8, usize, VertexId)> = Vec::new();

        let mut boundaries: Vec<usize> = self.text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(self.text.len());
        for position in boundaries {
            let vertex = VertexId::real(position);
            if skip_useless {
                let record = &self.real[position];
                let useless = record.out.is_empty()
                    && record.inc.is_empty()
                    && !self.implicit_at(position)
                    && !implicit_targets.contains(&vertex);
                if useless {
                    continue;
                }
            }
            entries.push((position, 1, position, vertex));
        }

        for (index, record) in self.loose.iter().enumerate() {
            let anchor = record
                .out
                .iter()
                .filter_map(|&e| self.edges[e as usize].to.position())
                .min()
                .or_else(|| {
                    record
                        .inc
                        .iter()
                        .filter_map(|&e| self.edges[e as usize].from.position())
                        .map(|p| p + 1)
                        .max()
                });
            entries.push((
                anchor.unwrap_or(usize::MAX),
                0,
                index,
                VertexId::loose_id(index),
            ));
        }

        entries.sort_unstable();
        let order: Vec<VertexId> = entries.into_iter().map(|(_, _, _, v)| v).collect();
        Vertices {
            order: order.into_iter(),
        }
    }

    /// All edges admitted by `mask`, ordered by source vertex, then by
    /// incident order at each source.
    pub fn edges_by_source(&self, mask: &TagMask) -> SortedEdges<'_> {
        SortedEdges {
            lattice: self,
            mask: mask.clone(),
            vertices: self.vertices(true),
            current: None,
            by_source: true,
        }
    }

    /// All edges admitted by `mask`, ordered by target vertex.
    pub fn edges_by_target(&self, mask: &TagMask) -> SortedEdges<'_> {
        SortedEdges {
            lattice: self,
            mask: mask.clone(),
            vertices: self.vertices(true),
            current: None,
            by_source: false,
        }
    }

    /// Every edge, ordered by source vertex.
    pub fn all_edges_by_source(&self) -> SortedEdges<'_> {
        self.edges_by_source(&TagMask::Any)
    }

    /// Every edge, ordered by target vertex.
    pub fn all_edges_by_target(&self) -> SortedEdges<'_> {
        self.edges_by_target(&TagMask::Any)
    }
}

/// Lazy sequence of the edges incident to one vertex that a mask admits.
pub struct IncidentEdges<'l> {
    lattice: &'l Lattice<'l>,
    mask: TagMask,
    explicit: std::slice::Iter<'l, u32>,
    implicit: Vec<usize>,
    implicit_next: usize,
}

impl<'l> Iterator for IncidentEdges<'l> {
    type Item = EdgeRef;

    fn next(&mut self) -> Option<EdgeRef> {
        for &index in self.explicit.by_ref() {
            let edge = EdgeRef::Explicit(index);
            if self.lattice.edge_admitted(edge, &self.mask) {
                return Some(edge);
            }
        }
        while self.implicit_next < self.implicit.len() {
            let edge = EdgeRef::Implicit(self.implicit[self.implicit_next]);
            self.implicit_next += 1;
            if self.lattice.edge_admitted(edge, &self.mask) {
                return Some(edge);
            }
        }
        None
    }
}

/// Vertices in ascending order (see [`Lattice::vertices`]).
pub struct Vertices {
    order: std::vec::IntoIter<VertexId>,
}

impl Iterator for Vertices {
    type Item = VertexId;

    fn next(&mut self) -> Option<VertexId> {
        self.order.next()
    }
}

/// Deterministic traversal of all admitted edges, ordered by one endpoint.
pub struct SortedEdges<'l> {
    lattice: &'l Lattice<'l>,
    mask: TagMask,
    vertices: Vertices,
    current: Option<IncidentEdges<'l>>,
    by_source: bool,
}

impl<'l> Iterator for SortedEdges<'l> {
    type Item = EdgeRef;

    fn next(&mut self) -> Option<EdgeRef> {
        loop {
            if let Some(edges) = &mut self.current {
                if let Some(edge) = edges.next() {
                    return Some(edge);
                }
            }
            let vertex = self.vertices.next()?;
            self.current = Some(if self.by_source {
                self.lattice.out_edges(vertex, &self.mask)
            } else {
                self.lattice.in_edges(vertex, &self.mask)
            });
        }
    }
}
