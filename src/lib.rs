//! Annotation lattice for incremental NLP pipelines.
//!
//! A [`Lattice`] keeps everything a pipeline of annotators extracts from a
//! text: tokens, words, phrases, lemmas, and parse derivations are edges
//! over vertices that sit between characters. Competing tokenizations and
//! analyses coexist as parallel edges; every edge carries an
//! [`AnnotationItem`] (category, text, attribute-value pairs), a set of
//! [`LayerTags`] for selecting annotation layers, a [`Score`], and one
//! [`Partition`] per derivation of the span into sub-edges.
//!
//! Single-character "symbol" edges are implicit: they are tracked in
//! per-position bit vectors rather than materialized, since every character
//! would otherwise need an always-present edge. Tag masks, sorted-edge
//! iterators, and best-path extraction work uniformly over both kinds.
//!
//! # Example
//!
//! ```
//! use text_lattice::{AnnotationItem, AnnotationItemManager, Lattice};
//!
//! let items = AnnotationItemManager::new();
//! let mut lattice = Lattice::with_text(&items, "Ala ma kota");
//! let (first, last) = (lattice.first_vertex(), lattice.last_vertex());
//! lattice.add_symbols(first, last)?;
//!
//! // Annotate "Ala" as a token over the first three symbol edges.
//! let tokens = lattice.tag_manager().singleton("token");
//! let word = AnnotationItem::with_text("word", "Ala");
//! let edge = lattice.add_edge(first, lattice.vertex_at(3)?, word, tokens, Default::default())?;
//! assert_eq!(lattice.edge_text(edge)?, "Ala");
//!
//! // The best symbol-level path reconstructs the text.
//! let symbols = lattice.tag_manager().mask_named("symbol");
//! let mut vertex = lattice.first_vertex();
//! let path = lattice.follow_path(&mut vertex, &symbols);
//! assert_eq!(lattice.sequence_text(&path)?, "Ala ma kota");
//! # Ok::<(), text_lattice::LatticeError>(())
//! ```
//!
//! The lattice is a plain mutable structure owned by one pipeline at a
//! time; iterators are pull-based and finite, and the borrow checker rules
//! out mutation while one is alive. The [`AnnotationItemManager`] is shared
//! by reference across the pipeline.

mod display;
mod error;
mod item;
mod lattice;
mod sequence;
mod snapshot;
mod tags;
mod text;

pub use display::LatticeDisplay;
pub use error::{LatticeError, LatticeResult};
pub use item::{AnnotationItem, AnnotationItemManager, AttrKey};
pub use lattice::{EdgeRef, IncidentEdges, Lattice, ScoreMerge, SortedEdges, VertexId, Vertices};
pub use sequence::{Derivation, EdgeSequence, EdgeSequenceBuilder, EdgeUsage, Partition};
pub use snapshot::{edge_records, Anchor, EdgeRecord, PartitionRecord};
pub use tags::{LayerTagManager, LayerTags, TagMask, DISCARDED_TAG, SYMBOL_TAG};
pub use text::TextFrag;

/// Edge ranking score; higher is better.
pub type Score = f64;
