//! File-loading collaborator interface.

/// Caching hint passed through to the loader; this crate never interprets
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// The bytes are consumed immediately and may be discarded.
    Temporary,
    /// The bytes are retained for the document's lifetime.
    Permanent,
}

/// Byte loader callback: maps a logical path to file bytes, `None` when
/// the file cannot be provided.
pub type FileLoader<'a> = dyn FnMut(&str, CachePolicy) -> Option<Vec<u8>> + 'a;
