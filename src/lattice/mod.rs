//! The lattice: a mutable, multi-layer annotation graph over text positions.
//!
//! Vertices are points between characters. A *real* vertex is identified by
//! its byte offset into the accumulated text and is created only by
//! appending text; a *loose* vertex is a synthetic anchor with no text
//! position. Edges annotate the span between two vertices with an
//! [`AnnotationItem`], a [`LayerTags`] collection, a score, and one
//! [`Partition`] per derivation.
//!
//! Single-character "symbol" edges are *implicit*: they live in per-position
//! bit vectors instead of the edge arena until something references them
//! explicitly. Annotators mutate the lattice exclusively through this
//! module's operations; every operation either completes fully or fails
//! with a [`LatticeError`](crate::LatticeError) before touching any state.

mod iter;
mod path;

use std::collections::{HashMap, HashSet};
use std::fmt;

use fixedbitset::FixedBitSet;

use crate::error::{LatticeError, LatticeResult};
use crate::item::{AnnotationItem, AnnotationItemManager};
use crate::sequence::{Derivation, EdgeSequence, Partition};
use crate::tags::{LayerTagManager, LayerTags, TagMask, DISCARDED_TAG, SYMBOL_TAG};
use crate::text::TextFrag;
use crate::Score;

pub use iter::{IncidentEdges, SortedEdges, Vertices};

/// Identifies a vertex: a non-negative byte offset for real vertices, a
/// negative id for loose ones.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(i64);

impl VertexId {
    pub(crate) fn real(position: usize) -> Self {
        VertexId(position as i64)
    }

    pub(crate) fn loose_id(index: usize) -> Self {
        VertexId(-(index as i64) - 1)
    }

    /// True for loose vertices.
    pub fn is_loose(self) -> bool {
        self.0 < 0
    }

    /// Byte offset for real vertices.
    pub(crate) fn position(self) -> Option<usize> {
        if self.0 >= 0 {
            Some(self.0 as usize)
        } else {
            None
        }
    }

    pub(crate) fn loose_index(self) -> Option<usize> {
        if self.0 < 0 {
            Some((-self.0 - 1) as usize)
        } else {
            None
        }
    }
}

impl fmt::Debug for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position() {
            Some(position) => write!(f, "v{}", position),
            None => write!(f, "loose{}", -self.0 - 1),
        }
    }
}

/// Identifies an edge: either a handle into the explicit edge arena or the
/// source position of an implicit single-character symbol edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeRef {
    /// An edge stored in the lattice's edge arena.
    Explicit(u32),
    /// The implicit symbol edge starting at this byte position.
    Implicit(usize),
}

impl EdgeRef {
    pub fn is_explicit(self) -> bool {
        matches!(self, EdgeRef::Explicit(_))
    }
}

/// How an insertion's score combines with an existing edge's score on
/// merge. `Max` reproduces the usual best-of policy; ties keep the
/// existing score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreMerge {
    #[default]
    Max,
    Sum,
    Keep,
    Replace,
}

impl ScoreMerge {
    fn combine(self, existing: Score, incoming: Score) -> Score {
        match self {
            ScoreMerge::Max => {
                if incoming > existing {
                    incoming
                } else {
                    existing
                }
            }
            ScoreMerge::Sum => existing + incoming,
            ScoreMerge::Keep => existing,
            ScoreMerge::Replace => incoming,
        }
    }
}

#[derive(Debug, Default)]
struct VertexRecord {
    out: Vec<u32>,
    inc: Vec<u32>,
}

#[derive(Debug)]
struct EdgeRecord {
    from: VertexId,
    to: VertexId,
    item: AnnotationItem,
    tags: LayerTags,
    score: Score,
    partitions: Vec<Partition>,
}

/// The annotation graph. See the [module documentation](self).
#[derive(Debug)]
pub struct Lattice<'a> {
    item_manager: &'a AnnotationItemManager,
    tag_manager: LayerTagManager,
    text: String,
    /// Indexed by byte position; only character boundaries are vertices.
    real: Vec<VertexRecord>,
    loose: Vec<VertexRecord>,
    edges: Vec<EdgeRecord>,
    /// Position has an implicit symbol out-edge.
    implicit: FixedBitSet,
    /// Implicit edge is dominated by a covering edge (a writer hint).
    implicit_hidden: FixedBitSet,
    /// Implicit edge is forced visible and immune to hiding.
    implicit_visible: FixedBitSet,
    /// Correction overrides: implicit edge at position points here instead
    /// of the next character boundary.
    retargeted: HashMap<usize, VertexId>,
    retarget_sources: HashMap<VertexId, Vec<usize>>,
    dedup: HashMap<(VertexId, VertexId, AnnotationItem), Vec<u32>>,
    pair_count: HashMap<(VertexId, VertexId), usize>,
    symbol_tags: LayerTags,
    discarded_tags: LayerTags,
    score_merge: ScoreMerge,
}

impl<'a> Lattice<'a> {
    /// An empty lattice: no text, one real vertex at offset 0.
    pub fn new(item_manager: &'a AnnotationItemManager) -> Self {
        let tag_manager = LayerTagManager;
        let symbol_tags = tag_manager.singleton(SYMBOL_TAG);
        let discarded_tags = tag_manager.singleton(DISCARDED_TAG);
        let mut real = Vec::new();
        real.push(VertexRecord::default());
        Lattice {
            item_manager,
            tag_manager,
            text: String::new(),
            real,
            loose: Vec::new(),
            edges: Vec::new(),
            implicit: FixedBitSet::with_capacity(1),
            implicit_hidden: FixedBitSet::with_capacity(1),
            implicit_visible: FixedBitSet::with_capacity(1),
            retargeted: HashMap::new(),
            retarget_sources: HashMap::new(),
            dedup: HashMap::new(),
            pair_count: HashMap::new(),
            symbol_tags,
            discarded_tags,
            score_merge: ScoreMerge::default(),
        }
    }

    /// A lattice over `text`, with vertices at every character boundary and
    /// no edges.
    pub fn with_text(item_manager: &'a AnnotationItemManager, text: &str) -> Self {
        let mut lattice = Lattice::new(item_manager);
        lattice.append_text(text);
        lattice
    }

    /// Appends `text`, adding the corresponding real vertices without any
    /// edges.
    pub fn append_text(&mut self, text: &str) {
        self.text.push_str(text);
        self.real
            .resize_with(self.text.len() + 1, VertexRecord::default);
        self.implicit.grow(self.text.len() + 1);
        self.implicit_hidden.grow(self.text.len() + 1);
        self.implicit_visible.grow(self.text.len() + 1);
    }

    /// Appends `text` and adds symbol edges over the appended range.
    pub fn append_text_with_symbols(&mut self, text: &str) {
        let start = self.last_vertex();
        self.append_text(text);
        let end = self.last_vertex();
        // Both endpoints are real by construction.
        let _ = self.add_symbols(start, end);
    }

    /// Marks an implicit symbol edge for every character between `start`
    /// and `end`. Each edge's category is `'c` for character `c`.
    pub fn add_symbols(&mut self, start: VertexId, end: VertexId) -> LatticeResult<()> {
        let start_pos = self.require_real(start, "add_symbols")?;
        let end_pos = self.require_real(end, "add_symbols")?;
        for (offset, _) in self.text[start_pos..end_pos.max(start_pos)].char_indices() {
            self.implicit.insert(start_pos + offset);
        }
        Ok(())
    }

    /// Allocates a loose vertex with the next unused loose index.
    pub fn add_loose_vertex(&mut self) -> VertexId {
        let index = self.loose.len();
        self.loose.push(VertexRecord::default());
        VertexId::loose_id(index)
    }

    /// The vertex at byte `index`. Out-of-range indices and offsets inside
    /// a multi-byte character are not vertices.
    pub fn vertex_at(&self, index: usize) -> LatticeResult<VertexId> {
        if index <= self.text.len() && self.text.is_char_boundary(index) {
            Ok(VertexId::real(index))
        } else {
            Err(LatticeError::NoVertex { index })
        }
    }

    /// The vertex at offset 0.
    pub fn first_vertex(&self) -> VertexId {
        VertexId::real(0)
    }

    /// The vertex after the last character.
    pub fn last_vertex(&self) -> VertexId {
        VertexId::real(self.text.len())
    }

    /// A real vertex's byte offset.
    pub fn vertex_index(&self, vertex: VertexId) -> LatticeResult<usize> {
        vertex.position().ok_or(LatticeError::WrongVertex {
            operation: "vertex_index",
            vertex,
        })
    }

    /// True for loose vertices.
    pub fn is_loose_vertex(&self, vertex: VertexId) -> bool {
        vertex.is_loose()
    }

    /// A loose vertex's unique index.
    pub fn loose_vertex_index(&self, vertex: VertexId) -> LatticeResult<usize> {
        vertex.loose_index().ok_or(LatticeError::WrongVertex {
            operation: "loose_vertex_index",
            vertex,
        })
    }

    /// Number of vertices: one per character boundary plus the loose ones.
    pub fn count_vertices(&self) -> usize {
        self.text.chars().count() + 1 + self.loose.len()
    }

    /// Number of explicit edges from `from` to `to`.
    pub fn count_edges(&self, from: VertexId, to: VertexId) -> usize {
        self.pair_count.get(&(from, to)).copied().unwrap_or(0)
    }

    /// The accumulated text.
    pub fn all_text(&self) -> &str {
        &self.text
    }

    /// Handle to the layer-tag registry.
    pub fn tag_manager(&self) -> &LayerTagManager {
        &self.tag_manager
    }

    /// The shared annotation item manager.
    pub fn item_manager(&self) -> &'a AnnotationItemManager {
        self.item_manager
    }

    /// The score-merge policy applied when insertions merge.
    pub fn score_merge(&self) -> ScoreMerge {
        self.score_merge
    }

    pub fn set_score_merge(&mut self, score_merge: ScoreMerge) {
        self.score_merge = score_merge;
    }

    /// Adds an edge from `from` to `to`, or merges into an existing edge
    /// with the same endpoints and item whose tags lie in the same plane.
    ///
    /// On merge the edge's tags become the union, its score combines per
    /// the [`ScoreMerge`] policy, and the insertion becomes a new partition
    /// (replacing an existing partition with an identical tag collection).
    /// Returns the (possibly pre-existing) edge.
    pub fn add_edge(
        &mut self,
        from: VertexId,
        to: VertexId,
        item: AnnotationItem,
        tags: LayerTags,
        sequence: EdgeSequence,
    ) -> LatticeResult<EdgeRef> {
        self.add_edge_full(from, to, item, tags, Derivation::new(sequence))
    }

    /// [`add_edge`](Self::add_edge) with a scored, provenance-carrying
    /// derivation.
    pub fn add_edge_full(
        &mut self,
        from: VertexId,
        to: VertexId,
        item: AnnotationItem,
        tags: LayerTags,
        derivation: Derivation,
    ) -> LatticeResult<EdgeRef> {
        if from == to {
            return Err(LatticeError::LoopEdge { vertex: from });
        }
        self.require_vertex(from, "add_edge")?;
        self.require_vertex(to, "add_edge")?;
        if let (Some(f), Some(t)) = (from.position(), to.position()) {
            if t < f {
                return Err(LatticeError::ReversedEdge { from, to });
            }
        }

        let key = (from, to, item);
        let merge_into = self.dedup.get(&key).and_then(|candidates| {
            candidates
                .iter()
                .copied()
                .find(|&index| {
                    self.tag_manager
                        .in_same_plane(&self.edges[index as usize].tags, &tags)
                })
        });
        if let Some(index) = merge_into {
            let target = EdgeRef::Explicit(index);
            if self.sequence_reaches(&derivation.sequence, target) {
                return Err(LatticeError::SelfReference);
            }
            let score_merge = self.score_merge;
            let record = &mut self.edges[index as usize];
            record.tags.union_with(&tags);
            record.score = score_merge.combine(record.score, derivation.score);
            match record.partitions.iter_mut().find(|p| p.tags() == &tags) {
                Some(partition) => partition.replace_derivation(derivation),
                None => record.partitions.push(Partition::new(tags, derivation)),
            }
            return Ok(target);
        }

        let (from, to, item) = (key.0, key.1, key.2);
        let index = self.edges.len() as u32;
        if tags.intersects(&self.symbol_tags) {
            if let Some(position) = from.position() {
                if self.implicit_at(position) {
                    self.implicit_visible.insert(position);
                }
            }
        }
        if let (Some(f), Some(t)) = (from.position(), to.position()) {
            self.hide_span(f, t);
        }
        let score = derivation.score;
        self.edges.push(EdgeRecord {
            from,
            to,
            item: item.clone(),
            tags: tags.clone(),
            score,
            partitions: vec![Partition::new(tags, derivation)],
        });
        self.vertex_record_mut(from).out.push(index);
        self.vertex_record_mut(to).inc.push(index);
        self.dedup.entry((from, to, item)).or_default().push(index);
        *self.pair_count.entry((from, to)).or_insert(0) += 1;
        Ok(EdgeRef::Explicit(index))
    }

    /// Adds a derivation to an existing edge, merging by identical tag
    /// collection like [`add_edge`](Self::add_edge) does.
    pub fn add_partition(
        &mut self,
        edge: EdgeRef,
        tags: LayerTags,
        derivation: Derivation,
    ) -> LatticeResult<EdgeRef> {
        let index = match edge {
            EdgeRef::Explicit(index) => index as usize,
            EdgeRef::Implicit(_) => {
                return Err(LatticeError::NoEdge {
                    context: "partitions cannot be added to implicit symbol edges",
                })
            }
        };
        if self.sequence_reaches(&derivation.sequence, edge) {
            return Err(LatticeError::SelfReference);
        }
        let score_merge = self.score_merge;
        let record = &mut self.edges[index];
        record.tags.union_with(&tags);
        record.score = score_merge.combine(record.score, derivation.score);
        match record.partitions.iter_mut().find(|p| p.tags() == &tags) {
            Some(partition) => partition.replace_derivation(derivation),
            None => record.partitions.push(Partition::new(tags, derivation)),
        }
        Ok(edge)
    }

    /// Tags an edge `discarded`. The edge is retained, but masked queries
    /// skip it unless the mask requests the `discarded` tag.
    pub fn discard(&mut self, edge: EdgeRef) -> LatticeResult<()> {
        let index = match edge {
            EdgeRef::Explicit(index) => index as usize,
            EdgeRef::Implicit(_) => {
                return Err(LatticeError::NoEdge {
                    context: "implicit symbol edges cannot be discarded",
                })
            }
        };
        let discarded = self.discarded_tags.clone();
        self.edges[index].tags.union_with(&discarded);
        Ok(())
    }

    /// Edge source vertex.
    pub fn edge_source(&self, edge: EdgeRef) -> VertexId {
        match edge {
            EdgeRef::Explicit(index) => self.edges[index as usize].from,
            EdgeRef::Implicit(position) => VertexId::real(position),
        }
    }

    /// Edge target vertex.
    pub fn edge_target(&self, edge: EdgeRef) -> VertexId {
        match edge {
            EdgeRef::Explicit(index) => self.edges[index as usize].to,
            EdgeRef::Implicit(position) => self.effective_target(position),
        }
    }

    /// Byte offset of the edge's source; the source must be real.
    pub fn edge_begin(&self, edge: EdgeRef) -> LatticeResult<usize> {
        let vertex = self.edge_source(edge);
        vertex.position().ok_or(LatticeError::WrongVertex {
            operation: "edge_begin",
            vertex,
        })
    }

    /// Byte offset of the edge's target; the target must be real.
    pub fn edge_end(&self, edge: EdgeRef) -> LatticeResult<usize> {
        let vertex = self.edge_target(edge);
        vertex.position().ok_or(LatticeError::WrongVertex {
            operation: "edge_end",
            vertex,
        })
    }

    /// Byte length of the spanned text; both endpoints must be real.
    pub fn edge_length(&self, edge: EdgeRef) -> LatticeResult<usize> {
        Ok(self.edge_end(edge)? - self.edge_begin(edge)?)
    }

    /// The edge's annotation item.
    pub fn edge_item(&self, edge: EdgeRef) -> AnnotationItem {
        match edge {
            EdgeRef::Explicit(index) => self.edges[index as usize].item.clone(),
            EdgeRef::Implicit(position) => self.symbol_item(position),
        }
    }

    /// The annotation item's category.
    pub fn annotation_category(&self, edge: EdgeRef) -> String {
        match edge {
            EdgeRef::Explicit(index) => self.edges[index as usize].item.category().to_string(),
            EdgeRef::Implicit(position) => self.symbol_item(position).category().to_string(),
        }
    }

    /// The annotation item's display text (not the spanned substring).
    pub fn annotation_text(&self, edge: EdgeRef) -> String {
        match edge {
            EdgeRef::Explicit(index) => self.edges[index as usize].item.text().to_string(),
            EdgeRef::Implicit(position) => self.symbol_item(position).text().to_string(),
        }
    }

    /// The edge's layer tags.
    pub fn edge_tags(&self, edge: EdgeRef) -> LayerTags {
        match edge {
            EdgeRef::Explicit(index) => self.edges[index as usize].tags.clone(),
            EdgeRef::Implicit(_) => self.symbol_tags.clone(),
        }
    }

    /// The edge's score.
    pub fn edge_score(&self, edge: EdgeRef) -> Score {
        match edge {
            EdgeRef::Explicit(index) => self.edges[index as usize].score,
            EdgeRef::Implicit(_) => 0.0,
        }
    }

    /// The edge's partitions, in insertion order.
    pub fn edge_partitions(&self, edge: EdgeRef) -> &[Partition] {
        match edge {
            EdgeRef::Explicit(index) => &self.edges[index as usize].partitions,
            EdgeRef::Implicit(_) => &[],
        }
    }

    /// Direct sub-edges: members of the edge's partitions whose tags the
    /// mask admits, deduplicated, in sequence order.
    pub fn children(&self, edge: EdgeRef, mask: &TagMask) -> Vec<EdgeRef> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for partition in self.edge_partitions(edge) {
            for child in partition.sequence().edges() {
                if mask.admits(&self.edge_tags(child)) && seen.insert(child) {
                    result.push(child);
                }
            }
        }
        result
    }

    /// True for an implicit symbol edge currently suppressed by a covering
    /// edge and not forced visible. Writers use this to omit dominated
    /// symbol edges.
    pub fn is_edge_hidden(&self, edge: EdgeRef) -> bool {
        match edge {
            EdgeRef::Explicit(_) => false,
            EdgeRef::Implicit(position) => {
                self.implicit_hidden.contains(position) && !self.implicit_visible.contains(position)
            }
        }
    }

    /// True when the edge's annotation text is empty or all-whitespace.
    pub fn is_blank(&self, edge: EdgeRef) -> bool {
        self.annotation_text(edge).chars().all(char::is_whitespace)
    }

    /// The substring the edge spans; both endpoints must be real.
    pub fn edge_text(&self, edge: EdgeRef) -> LatticeResult<String> {
        Ok(self.edge_text_frag(edge)?.resolve(&self.text)?.to_string())
    }

    /// Fragment form of [`edge_text`](Self::edge_text). An implicit edge's
    /// text is always its own character, even when a correction retargets
    /// it past a gap.
    pub fn edge_text_frag(&self, edge: EdgeRef) -> LatticeResult<TextFrag> {
        match edge {
            EdgeRef::Implicit(position) => Ok(TextFrag::from_range(
                &self.text,
                position,
                self.symbol_len(position),
            )),
            EdgeRef::Explicit(_) => {
                let begin = self.edge_begin(edge)?;
                let end = self.edge_end(edge)?;
                Ok(TextFrag::from_range(&self.text, begin, end - begin))
            }
        }
    }

    /// Concatenated text of a sequence's members.
    pub fn sequence_text(&self, sequence: &EdgeSequence) -> LatticeResult<String> {
        Ok(self
            .sequence_text_frag(sequence)?
            .resolve(&self.text)?
            .to_string())
    }

    /// Fragment form of [`sequence_text`](Self::sequence_text); adjacent
    /// member slices coalesce without copying.
    pub fn sequence_text_frag(&self, sequence: &EdgeSequence) -> LatticeResult<TextFrag> {
        let mut edges = sequence.edges();
        let mut frag = match edges.next() {
            Some(edge) => self.edge_text_frag(edge)?,
            None => return Ok(TextFrag::empty()),
        };
        for edge in edges {
            frag.append(&self.edge_text_frag(edge)?, &self.text)?;
        }
        Ok(frag)
    }

    /// Text of a partition's sequence.
    pub fn partition_text(&self, partition: &Partition) -> LatticeResult<String> {
        self.sequence_text(partition.sequence())
    }

    /// Rewires symbol-level connectivity so default traversal skips the
    /// text strictly between two real vertices: the symbol edge of the
    /// character ending at `from` is retargeted to `to`, and the bypassed
    /// symbol edges are marked hidden. No vertex or edge is removed.
    pub fn correction_erase(&mut self, from: VertexId, to: VertexId) -> LatticeResult<()> {
        let f = self.require_real(from, "correction_erase")?;
        let t = self.require_real(to, "correction_erase")?;
        if t <= f {
            return Err(LatticeError::WrongVertex {
                operation: "correction_erase",
                vertex: to,
            });
        }
        let anchor = self
            .prev_char_start(f)
            .ok_or(LatticeError::WrongVertex {
                operation: "correction_erase",
                vertex: from,
            })?;
        self.set_retarget(anchor, to);
        self.hide_span(f, t);
        Ok(())
    }

    /// Inserts symbol edges spelling `text` at a real vertex: a chain
    /// through fresh loose vertices, rejoined by duplicating the symbol
    /// edge of the character at `at` (when one follows).
    pub fn correction_insert(&mut self, at: VertexId, text: &str) -> LatticeResult<()> {
        let position = self.require_real(at, "correction_insert")?;
        if text.is_empty() {
            return Ok(());
        }
        let rejoin = if position < self.text.len() {
            Some((self.symbol_item(position), self.effective_target(position)))
        } else {
            None
        };
        let symbol_tags = self.symbol_tags.clone();
        let mut prev = at;
        for ch in text.chars() {
            let next = self.add_loose_vertex();
            self.add_edge(
                prev,
                next,
                symbol_item_for(ch),
                symbol_tags.clone(),
                EdgeSequence::new(),
            )?;
            prev = next;
        }
        if let Some((item, target)) = rejoin {
            self.add_edge(prev, target, item, symbol_tags, EdgeSequence::new())?;
        }
        Ok(())
    }

    /// Replaces the text strictly between two real vertices with `text`:
    /// a chain of symbol edges spelling `text` from `from` to `to` through
    /// fresh loose vertices, with the bypassed symbol edges marked hidden.
    /// An empty `text` behaves like [`correction_erase`](Self::correction_erase).
    pub fn correction_replace(
        &mut self,
        from: VertexId,
        to: VertexId,
        text: &str,
    ) -> LatticeResult<()> {
        let f = self.require_real(from, "correction_replace")?;
        let t = self.require_real(to, "correction_replace")?;
        if t <= f {
            return Err(LatticeError::WrongVertex {
                operation: "correction_replace",
                vertex: to,
            });
        }
        if text.is_empty() {
            return self.correction_erase(from, to);
        }
        let symbol_tags = self.symbol_tags.clone();
        let chars: Vec<char> = text.chars().collect();
        let last = chars.len() - 1;
        let mut prev = from;
        for (i, &ch) in chars.iter().enumerate() {
            let next = if i == last { to } else { self.add_loose_vertex() };
            self.add_edge(
                prev,
                next,
                symbol_item_for(ch),
                symbol_tags.clone(),
                EdgeSequence::new(),
            )?;
            prev = next;
        }
        self.hide_span(f, t);
        Ok(())
    }

    // ---- internals ----------------------------------------------------

    fn require_real(&self, vertex: VertexId, operation: &'static str) -> LatticeResult<usize> {
        let position = vertex
            .position()
            .ok_or(LatticeError::WrongVertex { operation, vertex })?;
        if position > self.text.len() || !self.text.is_char_boundary(position) {
            return Err(LatticeError::NoVertex { index: position });
        }
        Ok(position)
    }

    fn require_vertex(&self, vertex: VertexId, operation: &'static str) -> LatticeResult<()> {
        match vertex.loose_index() {
            Some(index) => {
                if index < self.loose.len() {
                    Ok(())
                } else {
                    Err(LatticeError::NoVertex { index })
                }
            }
            None => self.require_real(vertex, operation).map(|_| ()),
        }
    }

    fn vertex_record(&self, vertex: VertexId) -> Option<&VertexRecord> {
        match vertex.position() {
            Some(position) => self.real.get(position),
            None => self.loose.get(vertex.loose_index()?),
        }
    }

    fn vertex_record_mut(&mut self, vertex: VertexId) -> &mut VertexRecord {
        match vertex.position() {
            Some(position) => &mut self.real[position],
            None => &mut self.loose[vertex.loose_index().expect("loose vertex")],
        }
    }

    pub(crate) fn implicit_at(&self, position: usize) -> bool {
        position < self.implicit.len() && self.implicit.contains(position)
    }

    fn symbol_len(&self, position: usize) -> usize {
        self.text[position..]
            .chars()
            .next()
            .map(char::len_utf8)
            .unwrap_or(0)
    }

    pub(crate) fn effective_target(&self, position: usize) -> VertexId {
        self.retargeted
            .get(&position)
            .copied()
            .unwrap_or_else(|| VertexId::real(position + self.symbol_len(position)))
    }

    fn symbol_item(&self, position: usize) -> AnnotationItem {
        let ch = self.text[position..]
            .chars()
            .next()
            .expect("symbol position at a character start");
        symbol_item_for(ch)
    }

    fn prev_char_start(&self, position: usize) -> Option<usize> {
        if position == 0 {
            return None;
        }
        let mut p = position - 1;
        while !self.text.is_char_boundary(p) {
            p -= 1;
        }
        Some(p)
    }

    fn set_retarget(&mut self, position: usize, target: VertexId) {
        if let Some(old) = self.retargeted.insert(position, target) {
            if let Some(sources) = self.retarget_sources.get_mut(&old) {
                sources.retain(|&p| p != position);
            }
        }
        self.retarget_sources.entry(target).or_default().push(position);
    }

    /// Marks the implicit edges whose characters lie within `[from, to)`
    /// hidden, honoring forced visibility.
    fn hide_span(&mut self, from: usize, to: usize) {
        for (offset, _) in self.text[from..to.max(from)].char_indices() {
            let position = from + offset;
            if self.implicit_at(position) && !self.implicit_visible.contains(position) {
                self.implicit_hidden.insert(position);
            }
        }
    }

    fn sequence_reaches(&self, sequence: &EdgeSequence, target: EdgeRef) -> bool {
        let mut stack: Vec<EdgeRef> = sequence.edges().collect();
        let mut seen = HashSet::new();
        while let Some(edge) = stack.pop() {
            if edge == target {
                return true;
            }
            if !seen.insert(edge) {
                continue;
            }
            if let EdgeRef::Explicit(index) = edge {
                for partition in &self.edges[index as usize].partitions {
                    stack.extend(partition.sequence().edges());
                }
            }
        }
        false
    }

    pub(crate) fn edge_admitted(&self, edge: EdgeRef, mask: &TagMask) -> bool {
        match edge {
            EdgeRef::Explicit(index) => mask.admits(&self.edges[index as usize].tags),
            EdgeRef::Implicit(_) => mask.admits(&self.symbol_tags),
        }
    }
}

fn symbol_item_for(ch: char) -> AnnotationItem {
    AnnotationItem::with_text(format!("'{}", ch), ch.to_string())
}
