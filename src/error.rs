//! Error taxonomy for lattice operations.
//!
//! Every failure represents caller misuse of a graph invariant, never a
//! transient condition: operations either complete fully or fail with one of
//! these kinds before touching any state.

use thiserror::Error;

use crate::lattice::VertexId;

/// Errors produced by lattice operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LatticeError {
    /// An out-of-range (or mid-character) byte index was used as a vertex.
    #[error("no vertex at byte index {index}")]
    NoVertex { index: usize },

    /// An edge lookup found nothing matching.
    #[error("no edge: {context}")]
    NoEdge { context: &'static str },

    /// An operation requiring a real vertex was given a loose one, or
    /// vice versa.
    #[error("wrong vertex kind for {operation}: {vertex:?}")]
    WrongVertex {
        operation: &'static str,
        vertex: VertexId,
    },

    /// A sequence attached to an edge contains that edge, directly or
    /// through nested partitions.
    #[error("edge sequence refers to the edge being defined")]
    SelfReference,

    /// Both endpoints are real and the target precedes the source.
    #[error("edge target {to:?} precedes source {from:?}")]
    ReversedEdge { from: VertexId, to: VertexId },

    /// Source and target are the same vertex.
    #[error("loop edge at {vertex:?}")]
    LoopEdge { vertex: VertexId },

    /// A lazily-sliced text fragment no longer matches the buffer it was
    /// cut from.
    #[error("text fragment invalidated ({probe:?}...)")]
    FragmentInvalidated { probe: String },
}

/// Result alias used throughout the crate.
pub type LatticeResult<T> = Result<T, LatticeError>;
