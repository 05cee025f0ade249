//! Shared read-only byte views.

use std::io::Write;
use std::ops::Range;
use std::sync::Arc;

/// A read-only view over a contiguous range of a shared byte buffer.
///
/// Cloning and sub-slicing share the underlying storage; nothing ever
/// mutates it. Equality and hashing compare the viewed bytes only.
#[derive(Clone)]
pub struct Slice {
    buf: Arc<[u8]>,
    range: Range<usize>,
}

impl Slice {
    /// Takes ownership of `buf` and views all of it.
    pub fn new(buf: impl Into<Arc<[u8]>>) -> Self {
        let buf = buf.into();
        let range = 0..buf.len();
        Self { buf, range }
    }

    /// A zero-length view.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Number of viewed bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Whether the view covers no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// The viewed bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[self.range.clone()]
    }

    /// Returns a view of `len` bytes starting at `offset`, relative to this view.
    ///
    /// # Panics
    ///
    /// Panics if the requested range extends past the end of this view.
    pub fn slice(&self, offset: usize, len: usize) -> Slice {
        assert!(
            offset.checked_add(len).is_some_and(|end| end <= self.len()),
            "slice {offset}+{len} out of bounds for length {}",
            self.len()
        );
        let start = self.range.start + offset;
        Slice {
            buf: Arc::clone(&self.buf),
            range: start..start + len,
        }
    }

    /// Streams the viewed bytes into `out`.
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> std::io::Result<()> {
        out.write_all(self.as_bytes())
    }

    /// Copies the viewed bytes out.
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl AsRef<[u8]> for Slice {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Vec<u8>> for Slice {
    fn from(v: Vec<u8>) -> Self {
        Self::new(v)
    }
}

impl From<&[u8]> for Slice {
    fn from(v: &[u8]) -> Self {
        Self::new(v)
    }
}

impl PartialEq for Slice {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Slice {}

impl std::hash::Hash for Slice {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl std::fmt::Debug for Slice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slice").field("len", &self.len()).finish()
    }
}
