//! Layer tags: named classifications attached to edges.
//!
//! Tag names are assigned bit positions lazily, in a process-lifetime
//! registry shared by every lattice. A [`LayerTags`] value is a growable
//! bitset of such positions; a [`TagMask`] selects edges whose tag sets
//! intersect it.
//!
//! A tag whose name starts with `!` declares a *plane*. Edges whose tag
//! sets lie in different planes are never merged into one edge, which is
//! how parallel, non-interfering annotation layers coexist over the same
//! span. Ordinary tags all live in the default (empty) plane.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use once_cell::sync::Lazy;

/// Reserved tag carried by implicit single-character edges.
pub const SYMBOL_TAG: &str = "symbol";

/// Reserved tag added by [`Lattice::discard`](crate::Lattice::discard).
pub const DISCARDED_TAG: &str = "discarded";

const PLANE_MARKER: char = '!';

struct TagRegistry {
    names: Vec<String>,
    index: HashMap<String, usize>,
    planes: LayerTags,
}

impl TagRegistry {
    fn new() -> Self {
        let mut registry = TagRegistry {
            names: Vec::new(),
            index: HashMap::new(),
            planes: LayerTags::new(),
        };
        // Reserved names occupy the first two bits in every process.
        registry.intern(SYMBOL_TAG);
        registry.intern(DISCARDED_TAG);
        registry
    }

    fn intern(&mut self, name: &str) -> usize {
        if let Some(&bit) = self.index.get(name) {
            return bit;
        }
        let bit = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), bit);
        if name.starts_with(PLANE_MARKER) {
            self.planes.insert(bit);
        }
        bit
    }
}

static REGISTRY: Lazy<Mutex<TagRegistry>> = Lazy::new(|| Mutex::new(TagRegistry::new()));

fn registry() -> std::sync::MutexGuard<'static, TagRegistry> {
    REGISTRY.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn discarded_bit() -> usize {
    1
}

/// A growable bitset of layer tags attached to one edge or partition.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct LayerTags {
    // Invariant: no trailing zero words, so equality and hashing are
    // independent of how the set grew.
    bits: Vec<u64>,
}

impl LayerTags {
    /// Creates an empty tag collection.
    pub fn new() -> Self {
        LayerTags { bits: Vec::new() }
    }

    pub(crate) fn insert(&mut self, bit: usize) {
        let word = bit / 64;
        if word >= self.bits.len() {
            self.bits.resize(word + 1, 0);
        }
        self.bits[word] |= 1 << (bit % 64);
    }

    pub(crate) fn contains(&self, bit: usize) -> bool {
        self.bits
            .get(bit / 64)
            .map_or(false, |word| word & (1 << (bit % 64)) != 0)
    }

    /// True if no tag is set.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Number of tags set.
    pub fn len(&self) -> usize {
        self.bits.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Adds every tag of `other` to `self`.
    pub fn union_with(&mut self, other: &LayerTags) {
        if other.bits.len() > self.bits.len() {
            self.bits.resize(other.bits.len(), 0);
        }
        for (word, &extra) in self.bits.iter_mut().zip(other.bits.iter()) {
            *word |= extra;
        }
    }

    /// Returns the union of two collections.
    pub fn union(&self, other: &LayerTags) -> LayerTags {
        let mut result = self.clone();
        result.union_with(other);
        result
    }

    /// Returns the intersection of two collections.
    pub fn intersection(&self, other: &LayerTags) -> LayerTags {
        let bits = self
            .bits
            .iter()
            .zip(other.bits.iter())
            .map(|(a, b)| a & b)
            .collect();
        let mut result = LayerTags { bits };
        result.normalize();
        result
    }

    /// True if the two collections share at least one tag.
    pub fn intersects(&self, other: &LayerTags) -> bool {
        self.bits
            .iter()
            .zip(other.bits.iter())
            .any(|(a, b)| a & b != 0)
    }

    /// True if every tag of `self` is also in `other`.
    pub fn is_subset_of(&self, other: &LayerTags) -> bool {
        self.bits.iter().enumerate().all(|(i, &word)| {
            word & !other.bits.get(i).copied().unwrap_or(0) == 0
        })
    }

    /// Iterates the set bit positions in ascending order.
    pub(crate) fn iter_bits(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter().enumerate().flat_map(|(i, &word)| {
            (0..64usize)
                .filter(move |&offset| word & (1u64 << offset) != 0)
                .map(move |offset| i * 64 + offset)
        })
    }

    fn normalize(&mut self) {
        while self.bits.last() == Some(&0) {
            self.bits.pop();
        }
    }
}

impl fmt::Debug for LayerTags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let manager = LayerTagManager;
        f.debug_set().entries(manager.tag_names(self)).finish()
    }
}

/// A query filter over edge tag collections.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagMask {
    /// Matches every edge, including discarded ones.
    Any,
    /// Matches edges whose tag collection intersects the given tags.
    Match(LayerTags),
}

impl TagMask {
    /// Raw intersection test, ignoring the discard rule.
    pub fn matches(&self, tags: &LayerTags) -> bool {
        match self {
            TagMask::Any => true,
            TagMask::Match(mask) => mask.intersects(tags),
        }
    }

    /// The test used by lattice queries: discarded edges are only admitted
    /// when the mask requests the `discarded` tag (the universal mask
    /// requests everything).
    pub(crate) fn admits(&self, tags: &LayerTags) -> bool {
        match self {
            TagMask::Any => true,
            TagMask::Match(mask) => {
                mask.intersects(tags)
                    && (!tags.contains(discarded_bit()) || mask.contains(discarded_bit()))
            }
        }
    }
}

/// Handle to the process-lifetime tag registry.
///
/// Obtained from [`Lattice::tag_manager`](crate::Lattice::tag_manager);
/// creates tag collections and masks from names, and answers plane
/// membership questions.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayerTagManager;

impl LayerTagManager {
    /// Returns a collection holding the single tag `name`.
    pub fn singleton(&self, name: &str) -> LayerTags {
        let mut tags = LayerTags::new();
        tags.insert(registry().intern(name));
        tags
    }

    /// Returns a collection holding `name` plus the language tag for
    /// `lang` (e.g. `lang:pl`).
    pub fn singleton_with_lang(&self, name: &str, lang: &str) -> LayerTags {
        let mut tags = LayerTags::new();
        tags.insert(registry().intern(&Self::language_tag(lang)));
        tags.insert(registry().intern(name));
        tags
    }

    /// Builds a collection from several tag names.
    pub fn collection<I, S>(&self, names: I) -> LayerTags
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tags = LayerTags::new();
        let mut reg = registry();
        for name in names {
            tags.insert(reg.intern(name.as_ref()));
        }
        tags
    }

    /// Wraps a collection as a mask.
    pub fn mask(&self, tags: LayerTags) -> TagMask {
        TagMask::Match(tags)
    }

    /// Mask matching the single tag `name`.
    pub fn mask_named(&self, name: &str) -> TagMask {
        TagMask::Match(self.singleton(name))
    }

    /// Mask matching `name` or its language qualification.
    pub fn mask_with_lang(&self, name: &str, lang: &str) -> TagMask {
        TagMask::Match(self.singleton_with_lang(name, lang))
    }

    /// The universal mask.
    pub fn any(&self) -> TagMask {
        TagMask::Any
    }

    /// Names of all tags in `tags`, alphabetically.
    pub fn tag_names(&self, tags: &LayerTags) -> Vec<String> {
        let reg = registry();
        let mut names: Vec<String> = tags
            .iter_bits()
            .filter_map(|bit| reg.names.get(bit).cloned())
            .collect();
        names.sort();
        names
    }

    /// True if the two collections lie in the same plane, i.e. carry
    /// identical sets of plane tags.
    pub fn in_same_plane(&self, a: &LayerTags, b: &LayerTags) -> bool {
        let reg = registry();
        a.intersection(&reg.planes) == b.intersection(&reg.planes)
    }

    /// The plane tags of a collection.
    pub fn plane_tags(&self, tags: &LayerTags) -> LayerTags {
        tags.intersection(&registry().planes)
    }

    /// The language tag name for a language code.
    pub fn language_tag(lang: &str) -> String {
        format!("lang:{}", lang)
    }

    /// True if `name` declares a plane.
    pub fn is_plane_tag(name: &str) -> bool {
        name.starts_with(PLANE_MARKER)
    }
}
