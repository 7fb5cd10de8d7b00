//! 1-based OBJ indices.

/// A raw index as written in a face record (1-based, unchecked).
///
/// The only way to turn it into a table offset is [`ObjIndex::resolve`], which
/// checks it against the table it points into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjIndex(i64);

impl ObjIndex {
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// The value as written in the file.
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Zero-based offset into a table of `len` rows, or `None` when the index is
    /// zero, negative, or past the end.
    pub fn resolve(self, len: usize) -> Option<usize> {
        let offset = usize::try_from(self.0).ok()?.checked_sub(1)?;
        (offset < len).then_some(offset)
    }
}
