//! In-flight LSP requests and the per-document location cache.

use std::fmt;
use std::time::Instant;

use core_lsp::{Location, LspQueryKind, LspResponse};
use core_selection::Movement;
use core_text::{BufferId, Version};
use smallvec::SmallVec;
use tokio::sync::oneshot;

use crate::cursor::CursorId;

/// Generation number of an issued query; strictly increasing per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryToken(pub u64);

impl fmt::Display for QueryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

/// State a response must still match to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryKey {
    pub buffer: BufferId,
    pub version: Version,
    pub kind: LspQueryKind,
    pub cursors: SmallVec<[CursorId; 4]>,
}

pub(crate) struct PendingQuery {
    pub(crate) token: QueryToken,
    pub(crate) key: QueryKey,
    /// Movement to replay once locations are known.
    pub(crate) movement: Movement,
    pub(crate) issued_at: Instant,
    pub(crate) receiver: oneshot::Receiver<LspResponse>,
}

impl fmt::Debug for PendingQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingQuery")
            .field("token", &self.token)
            .field("key", &self.key)
            .field("movement", &self.movement)
            .finish_non_exhaustive()
    }
}

/// Locations answered for one (version, kind); reused until the buffer changes.
#[derive(Debug, Clone)]
pub(crate) struct LspCache {
    pub(crate) version: Version,
    pub(crate) kind: LspQueryKind,
    pub(crate) locations: Vec<Location>,
}

impl LspCache {
    pub(crate) fn matches(&self, version: Version, kind: &LspQueryKind) -> bool {
        self.version == version && self.kind == *kind
    }
}
