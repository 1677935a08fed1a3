//! Human-readable lattice rendering.
//!
//! Prints the text on one line and one `╰──╯ category` row per admitted
//! edge below it, one block per included mask. Useful in tests and when
//! debugging annotator output:
//!
//! ```text
//! Ala ma kota
//! ╰─╯ word
//!    ╰ blank
//!     ╰╯ word
//! ```

use std::fmt::{self, Write};

use unicode_width::UnicodeWidthStr;

use crate::lattice::Lattice;
use crate::tags::TagMask;

/// Renders a lattice's text with span rows for selected masks.
pub struct LatticeDisplay<'l> {
    lattice: &'l Lattice<'l>,
    masks: Vec<TagMask>,
    include_hidden: bool,
}

impl<'l> LatticeDisplay<'l> {
    pub fn new(lattice: &'l Lattice<'l>) -> Self {
        LatticeDisplay {
            lattice,
            masks: Vec::new(),
            include_hidden: false,
        }
    }

    /// Adds a span row block for every edge admitted by `mask`.
    pub fn with(mut self, mask: TagMask) -> Self {
        self.masks.push(mask);
        self
    }

    /// Also renders hidden symbol edges.
    pub fn with_hidden(mut self) -> Self {
        self.include_hidden = true;
        self
    }
}

impl fmt::Display for LatticeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.lattice.all_text();
        f.write_str(text)?;
        for mask in &self.masks {
            for edge in self.lattice.edges_by_source(mask) {
                if !self.include_hidden && self.lattice.is_edge_hidden(edge) {
                    continue;
                }
                // Edges anchored on loose vertices have no column to draw at.
                let (begin, end) = match (self.lattice.edge_begin(edge), self.lattice.edge_end(edge))
                {
                    (Ok(begin), Ok(end)) => (begin, end),
                    _ => continue,
                };
                let start_col = UnicodeWidthStr::width(&text[..begin]);
                let end_col = UnicodeWidthStr::width(&text[..end]);
                f.write_char('\n')?;
                for _ in 0..start_col {
                    f.write_char(' ')?;
                }
                f.write_char('╰')?;
                if end_col > start_col + 1 {
                    for _ in (start_col + 1)..(end_col - 1) {
                        f.write_char('─')?;
                    }
                    f.write_char('╯')?;
                }
                write!(f, " {}", self.lattice.annotation_category(edge))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{AnnotationItem, AnnotationItemManager};
    use crate::sequence::EdgeSequence;

    #[test]
    fn renders_token_spans() {
        let items = AnnotationItemManager::new();
        let mut lattice = Lattice::with_text(&items, "Ala ma kota");
        let tokens = lattice.tag_manager().singleton("token");
        let spans = [
            (0usize, 3usize, "word"),
            (3, 4, "blank"),
            (4, 6, "word"),
            (6, 7, "blank"),
            (7, 11, "word"),
        ];
        for (begin, end, category) in spans {
            lattice
                .add_edge(
                    lattice.vertex_at(begin).unwrap(),
                    lattice.vertex_at(end).unwrap(),
                    AnnotationItem::new(category),
                    tokens.clone(),
                    EdgeSequence::new(),
                )
                .unwrap();
        }

        let mask = lattice.tag_manager().mask_named("token");
        let rendered = LatticeDisplay::new(&lattice).with(mask).to_string();
        insta::assert_snapshot!(rendered, @r###"
Ala ma kota
╰─╯ word
   ╰ blank
    ╰╯ word
      ╰ blank
       ╰──╯ word
"###);
    }

    #[test]
    fn skips_loose_anchored_edges() {
        let items = AnnotationItemManager::new();
        let mut lattice = Lattice::with_text(&items, "ab");
        let tokens = lattice.tag_manager().singleton("token");
        let loose = lattice.add_loose_vertex();
        lattice
            .add_edge(
                lattice.first_vertex(),
                loose,
                AnnotationItem::new("x"),
                tokens.clone(),
                EdgeSequence::new(),
            )
            .unwrap();
        lattice
            .add_edge(
                lattice.first_vertex(),
                lattice.last_vertex(),
                AnnotationItem::new("pair"),
                tokens,
                EdgeSequence::new(),
            )
            .unwrap();

        let mask = lattice.tag_manager().mask_named("token");
        let rendered = LatticeDisplay::new(&lattice).with(mask).to_string();
        assert_eq!(rendered, "ab\n╰╯ pair");
    }
}
