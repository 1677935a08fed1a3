//! Lazily-sliced text fragments.
//!
//! A [`TextFrag`] either owns its characters or records a byte range into a
//! backing buffer together with a short probe of the bytes it expects
//! there. Resolving a sliced fragment re-checks the probe, so a fragment
//! used against a buffer that no longer carries the original text fails
//! with a fragment-invalidated error instead of yielding garbage.

use crate::error::{LatticeError, LatticeResult};

const PROBE_LEN: usize = 4;

/// A piece of text, owned or cut lazily from a backing buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextFrag {
    /// Self-contained text.
    Owned(String),
    /// A byte range into a backing buffer, with a probe of its first bytes.
    Slice {
        start: usize,
        len: usize,
        probe: String,
    },
}

impl TextFrag {
    /// An empty owned fragment.
    pub fn empty() -> Self {
        TextFrag::Owned(String::new())
    }

    /// An owned fragment.
    pub fn owned(text: impl Into<String>) -> Self {
        TextFrag::Owned(text.into())
    }

    /// A fragment slicing `source[start..start + len]`, capturing a probe.
    pub fn from_range(source: &str, start: usize, len: usize) -> Self {
        let slice = &source[start..start + len];
        let mut probe_len = PROBE_LEN.min(slice.len());
        while !slice.is_char_boundary(probe_len) {
            probe_len -= 1;
        }
        TextFrag::Slice {
            start,
            len,
            probe: slice[..probe_len].to_string(),
        }
    }

    /// True when the fragment denotes no text at all.
    pub fn is_empty(&self) -> bool {
        match self {
            TextFrag::Owned(text) => text.is_empty(),
            TextFrag::Slice { len, .. } => *len == 0,
        }
    }

    /// Resolves the fragment against its backing buffer.
    pub fn resolve<'a>(&'a self, source: &'a str) -> LatticeResult<&'a str> {
        match self {
            TextFrag::Owned(text) => Ok(text),
            TextFrag::Slice { start, len, probe } => {
                let end = start + len;
                let valid = end <= source.len()
                    && source.is_char_boundary(*start)
                    && source.is_char_boundary(end)
                    && source.as_bytes()[*start..].starts_with(probe.as_bytes());
                if !valid {
                    return Err(LatticeError::FragmentInvalidated {
                        probe: probe.clone(),
                    });
                }
                Ok(&source[*start..end])
            }
        }
    }

    /// Appends another fragment. Adjacent slices of the same buffer merge
    /// without copying; anything else resolves both sides and owns the
    /// concatenation.
    pub fn append(&mut self, other: &TextFrag, source: &str) -> LatticeResult<()> {
        if let (
            TextFrag::Slice { start, len, .. },
            TextFrag::Slice {
                start: other_start,
                len: other_len,
                ..
            },
        ) = (&mut *self, other)
        {
            if *start + *len == *other_start {
                *len += other_len;
                return Ok(());
            }
        }
        let joined = format!("{}{}", self.resolve(source)?, other.resolve(source)?);
        *self = TextFrag::Owned(joined);
        Ok(())
    }
}

impl Default for TextFrag {
    fn default() -> Self {
        TextFrag::empty()
    }
}
