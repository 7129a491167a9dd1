//! Session state for the selection engine.
//!
//! A [`Session`] is the explicit context value every action runs against: the
//! open documents (each with its cursor set, jump list, undo history, syntax
//! tree and cached LSP locations), the one current [`SelectionMode`], the
//! extend and swap flags, in-flight LSP queries and the quickfix list.
//!
//! Operations never fail for user-level reasons. A movement that finds
//! nothing, a rejected swap or an unavailable mode comes back as an
//! [`Outcome`] carrying a [`Notice`] and leaves state untouched. Only a
//! collaborator breaking its contract surfaces as [`EngineError`].

mod cursor;
mod document;
mod history;
mod notice;
mod query;
mod quickfix;
mod swap;
pub mod undo;

pub use cursor::{Cursor, CursorId, CursorSet, CursorSnapshot};
pub use document::Document;
pub use history::{HISTORY_DEPTH_DEFAULT, SelectionHistory};
pub use notice::Notice;
pub use query::{QueryKey, QueryToken};
pub use quickfix::{QuickfixEntry, QuickfixList};
pub use swap::SwapPair;
pub use undo::{SnapshotKind, UNDO_DEPTH_DEFAULT, UndoEngine};

use std::path::Path;
use std::time::{Duration, Instant};

use core_config::{Config, WrapConfig, WrapSetting};
use core_lsp::{
    Location, LspClient, LspError, LspQueryKind, LspRequest, LspResponse, filter_for_kind,
    normalize_locations,
};
use core_selection::{
    EngineError, ModeKind, ModeSpec, Movement, Resolution, ResolveContext, SearchPattern,
    SearchScope, Selection, SelectionInfo, SelectionMode, WrapPolicy, all_candidates, resolve,
};
use core_syntax::SyntaxProvider;
use core_text::{Buffer, BufferId, Edit, EditSet};
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{debug, info, trace, warn};

use query::{LspCache, PendingQuery};

/// How long a status message stays visible.
pub const STATUS_TTL: Duration = Duration::from_secs(3);

/// Session tunables, usually derived from the loaded configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub wrap: WrapConfig,
    pub history_depth: usize,
    pub undo_depth: usize,
    pub lsp_timeout: Duration,
    pub case_insensitive: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            wrap: WrapConfig::default(),
            history_depth: HISTORY_DEPTH_DEFAULT,
            undo_depth: UNDO_DEPTH_DEFAULT,
            lsp_timeout: Duration::from_millis(2000),
            case_insensitive: false,
        }
    }
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            wrap: config.file.wrap.clone(),
            history_depth: config.history_depth(),
            undo_depth: config.undo_depth(),
            lsp_timeout: config.lsp_timeout(),
            case_insensitive: config.file.search.case_insensitive,
        }
    }

    /// Configured wrap policy for a mode, falling back to the mode's default.
    pub fn wrap_for(&self, kind: &ModeKind) -> WrapPolicy {
        let w = &self.wrap;
        let setting = match kind {
            ModeKind::Character => w.character,
            ModeKind::WordShort => w.word_short,
            ModeKind::WordLong => w.word_long,
            ModeKind::LineTrimmed => w.line_trimmed,
            ModeKind::LineFull => w.line_full,
            ModeKind::Column => w.column,
            ModeKind::Token => w.token,
            ModeKind::SyntaxNode { .. } => w.syntax_node,
            ModeKind::RegexMatch(_) => w.regex,
            ModeKind::TextSearch { .. } => w.search,
            ModeKind::LspQuery(_) => w.lsp,
            ModeKind::NamingAgnostic(_) => w.search,
            ModeKind::Mark => w.mark,
        };
        match setting {
            Some(WrapSetting::Wrap) => WrapPolicy::Wrap,
            Some(WrapSetting::Stay) => WrapPolicy::Stay,
            None => kind.default_wrap(),
        }
    }
}

/// Net effect of one session operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Outcome {
    pub selection_changed: bool,
    pub buffer_changed: bool,
    /// Set when the result will arrive with an LSP response.
    pub pending: Option<QueryToken>,
    pub notice: Option<Notice>,
}

impl Outcome {
    pub fn unchanged() -> Self {
        Self::default()
    }

    fn moved() -> Self {
        Self {
            selection_changed: true,
            ..Self::default()
        }
    }

    fn edited() -> Self {
        Self {
            selection_changed: true,
            buffer_changed: true,
            ..Self::default()
        }
    }

    fn noticed(notice: Notice) -> Self {
        Self {
            notice: Some(notice),
            ..Self::default()
        }
    }

    fn waiting(token: QueryToken) -> Self {
        Self {
            pending: Some(token),
            ..Self::default()
        }
    }
}

/// Ephemeral status message container.
#[derive(Debug, Clone)]
pub struct EphemeralMessage {
    pub text: String,
    pub expires_at: Instant,
}

pub struct Session {
    documents: Vec<Document>,
    active: BufferId,
    mode: SelectionMode,
    extending: bool,
    swap_armed: bool,
    lsp: Option<Box<dyn LspClient>>,
    pending: Vec<PendingQuery>,
    next_token: u64,
    quickfix: QuickfixList,
    ephemeral_status: Option<EphemeralMessage>,
    settings: Settings,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("active", &self.active)
            .field("mode", &self.mode.kind.name())
            .field("extending", &self.extending)
            .field("swap_armed", &self.swap_armed)
            .field("documents", &self.documents.len())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

/// Resolution context for a document under `mode`; cached locations are only
/// offered when they belong to the current version and query kind.
fn context<'a>(doc: &'a Document, mode: &SelectionMode) -> ResolveContext<'a> {
    let locations: &[Location] = match (&doc.lsp_cache, mode.kind.lsp_kind()) {
        (Some(cache), Some(kind)) if cache.matches(doc.buffer.version(), &kind) => {
            &cache.locations
        }
        _ => &[],
    };
    ResolveContext::new(&doc.buffer)
        .with_syntax(doc.syntax.as_deref())
        .with_locations(locations)
        .with_marks(&doc.marks)
}

impl Session {
    pub fn new(buffer: Buffer, settings: Settings) -> Self {
        let document = Document::new(buffer, settings.history_depth, settings.undo_depth);
        let kind = ModeKind::WordShort;
        let wrap = settings.wrap_for(&kind);
        Self {
            documents: vec![document],
            active: BufferId(0),
            mode: SelectionMode::new(kind).with_wrap(wrap),
            extending: false,
            swap_armed: false,
            lsp: None,
            pending: Vec::new(),
            next_token: 1,
            quickfix: QuickfixList::default(),
            ephemeral_status: None,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn mode(&self) -> &SelectionMode {
        &self.mode
    }

    pub fn is_extending(&self) -> bool {
        self.extending
    }

    pub fn is_swap_armed(&self) -> bool {
        self.swap_armed
    }

    pub fn active(&self) -> BufferId {
        self.active
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn document(&self, id: BufferId) -> Option<&Document> {
        self.documents.get(id.0)
    }

    pub fn active_document(&self) -> &Document {
        // `active` always names an open document.
        &self.documents[self.active.0]
    }

    pub fn buffer(&self) -> &Buffer {
        &self.active_document().buffer
    }

    pub fn cursors(&self) -> &CursorSet {
        &self.active_document().cursors
    }

    pub fn quickfix(&self) -> &QuickfixList {
        &self.quickfix
    }

    pub fn has_pending(&self, id: BufferId) -> bool {
        self.pending.iter().any(|q| q.key.buffer == id)
    }

    pub fn pending_tokens(&self) -> Vec<QueryToken> {
        self.pending.iter().map(|q| q.token).collect()
    }

    pub fn status(&self) -> Option<&str> {
        self.ephemeral_status.as_ref().map(|m| m.text.as_str())
    }

    /// Set an ephemeral status message with a fixed timeout duration.
    pub fn set_ephemeral<S: Into<String>>(&mut self, msg: S, ttl: Duration) {
        self.ephemeral_status = Some(EphemeralMessage {
            text: msg.into(),
            expires_at: Instant::now() + ttl,
        });
    }

    /// Tick ephemeral status; returns true if message expired and was cleared.
    pub fn tick_ephemeral(&mut self, now: Instant) -> bool {
        if let Some(m) = &self.ephemeral_status
            && now >= m.expires_at
        {
            self.ephemeral_status = None;
            return true;
        }
        false
    }

    fn report(&mut self, outcome: Outcome) -> Outcome {
        if let Some(notice) = &outcome.notice {
            debug!(target: "state.cursors", notice = %notice, "status_notice");
            self.set_ephemeral(notice.to_string(), STATUS_TTL);
        }
        outcome
    }

    /// Open another buffer. A syntax tree is attached when the path's language is bundled.
    pub fn open(&mut self, buffer: Buffer) -> BufferId {
        let id = BufferId(self.documents.len());
        info!(target: "state.cursors", buffer = %id, name = buffer.name(), "document_opened");
        self.documents.push(Document::new(
            buffer,
            self.settings.history_depth,
            self.settings.undo_depth,
        ));
        id
    }

    /// Open a file, reusing the document when it is already open.
    pub fn open_path(&mut self, path: &Path) -> anyhow::Result<BufferId> {
        if let Some(id) = self.find_document(path) {
            return Ok(id);
        }
        let buffer = Buffer::from_path(path)?;
        Ok(self.open(buffer))
    }

    pub fn find_document(&self, path: &Path) -> Option<BufferId> {
        self.documents
            .iter()
            .position(|d| d.buffer.display_path() == path)
            .map(BufferId)
    }

    /// Replace (or remove) the syntax provider of a document.
    pub fn set_syntax(&mut self, id: BufferId, provider: Option<Box<dyn SyntaxProvider>>) {
        if let Some(doc) = self.documents.get_mut(id.0) {
            doc.syntax = provider;
        }
    }

    pub fn set_lsp_client(&mut self, client: Box<dyn LspClient>) {
        self.lsp = Some(client);
    }

    pub fn switch_buffer(&mut self, id: BufferId) -> Outcome {
        if self.documents.get(id.0).is_none() {
            return self.report(Outcome::noticed(Notice::UnknownBuffer(id)));
        }
        if id == self.active {
            return Outcome::unchanged();
        }
        debug!(target: "state.cursors", from = %self.active, to = %id, "buffer_switched");
        self.active = id;
        Outcome::moved()
    }

    pub fn switch_mode(&mut self, spec: &ModeSpec) -> Result<Outcome, EngineError> {
        match spec.compile(self.settings.case_insensitive) {
            Ok(kind) => self.set_mode(kind),
            Err(e) => Ok(self.report(Outcome::noticed(Notice::InvalidPattern(e)))),
        }
    }

    /// Make `kind` the current mode and re-snap every cursor through `Current`.
    /// An unavailable mode is rejected and the previous one kept.
    pub fn set_mode(&mut self, kind: ModeKind) -> Result<Outcome, EngineError> {
        if let Some(reason) = self.unavailable_reason(&kind) {
            info!(target: "state.cursors", mode = kind.name(), reason = %reason, "mode_unavailable");
            return Ok(self.report(Outcome::noticed(Notice::ModeUnavailable {
                mode: kind.to_string(),
                reason,
            })));
        }
        self.cancel_all_queries();
        self.extending = false;
        self.swap_armed = false;
        let wrap = self.settings.wrap_for(&kind);
        debug!(target: "state.cursors", mode = kind.name(), wrap = ?wrap, "mode_switched");
        self.mode = SelectionMode::new(kind).with_wrap(wrap);
        if let ModeKind::TextSearch {
            pattern,
            scope: SearchScope::Global,
        } = &self.mode.kind
        {
            let pattern = pattern.clone();
            self.fill_quickfix_from_search(&pattern);
        }
        let id = self.active;
        let mut outcome = match self.mode.kind.lsp_kind() {
            Some(kind) if !self.has_fresh_cache(id, &kind) => self.issue_query(id, kind, Movement::Current)?,
            _ => self.run_movement(id, Movement::Current)?,
        };
        // Nothing to snap to is not a failure of the switch itself.
        if matches!(outcome.notice, Some(Notice::NoMatch | Notice::Unsupported { .. })) {
            outcome.notice = None;
        }
        Ok(self.report(outcome))
    }

    fn unavailable_reason(&self, kind: &ModeKind) -> Option<String> {
        match kind {
            ModeKind::SyntaxNode { .. } if !self.active_document().has_syntax() => {
                Some("no syntax tree for this buffer".into())
            }
            ModeKind::LspQuery(query) => match &self.lsp {
                None => Some("no language server".into()),
                Some(client) if !client.supports(query.family()) => {
                    Some(format!("language server does not support {query}"))
                }
                Some(_) => None,
            },
            _ => None,
        }
    }

    pub fn toggle_extend(&mut self) -> Outcome {
        self.extending = !self.extending;
        debug!(target: "state.cursors", extending = self.extending, "extend_toggled");
        Outcome::unchanged()
    }

    /// Arm (or disarm) swap for the next resolved movement.
    pub fn toggle_swap(&mut self) -> Outcome {
        self.swap_armed = !self.swap_armed;
        debug!(target: "state.cursors", armed = self.swap_armed, "swap_toggled");
        Outcome::unchanged()
    }

    /// Disarm swap, drop the active buffer's query and collapse an extension.
    pub fn escape(&mut self) -> Outcome {
        self.swap_armed = false;
        let id = self.active;
        self.cancel_queries_for(id);
        if !self.extending {
            return Outcome::unchanged();
        }
        self.collapse(id)
    }

    fn collapse(&mut self, id: BufferId) -> Outcome {
        self.extending = false;
        let Some(doc) = self.documents.get(id.0) else {
            return Outcome::noticed(Notice::UnknownBuffer(id));
        };
        let updates: Vec<_> = doc
            .cursors
            .iter()
            .map(|c| (c.id, c.selection.collapse_to_active()))
            .collect();
        self.mutate_cursors(id, |cursors| {
            cursors.apply(updates);
            true
        })
    }

    /// Resolve `movement` for every cursor of the active buffer and commit the batch.
    pub fn apply_movement(&mut self, movement: Movement) -> Result<Outcome, EngineError> {
        let id = self.active;
        let outcome = if movement.is_history() {
            self.travel(id, movement)
        } else if self.has_pending(id) {
            Outcome::noticed(Notice::Busy)
        } else if self.extending && !self.swap_armed && movement == Movement::Current {
            self.collapse(id)
        } else if let Some(kind) = self.mode.kind.lsp_kind()
            && !self.has_fresh_cache(id, &kind)
        {
            self.issue_query(id, kind, movement)?
        } else {
            self.run_movement(id, movement)?
        };
        Ok(self.report(outcome))
    }

    fn travel(&mut self, id: BufferId, movement: Movement) -> Outcome {
        let Some(doc) = self.documents.get_mut(id.0) else {
            return Outcome::noticed(Notice::UnknownBuffer(id));
        };
        let current = doc.cursors.snapshot();
        let target = match movement {
            Movement::GoBack => doc.history.go_back(current),
            _ => doc.history.go_forward(current),
        };
        let Some(snapshot) = target else {
            return Outcome::noticed(Notice::NoMatch);
        };
        let len = doc.buffer.len_bytes();
        doc.cursors.restore(&snapshot);
        doc.cursors.clamp(len);
        Outcome::moved()
    }

    /// Batch resolution: every cursor is resolved read-only first, then the
    /// found targets are committed together. Cursors with no match stay put.
    fn run_movement(&mut self, id: BufferId, movement: Movement) -> Result<Outcome, EngineError> {
        let swap = self.swap_armed;
        let extending = self.extending && !swap;
        let Some(doc) = self.documents.get(id.0) else {
            return Ok(Outcome::noticed(Notice::UnknownBuffer(id)));
        };
        let ctx = context(doc, &self.mode);
        let backward = movement.is_backward();
        let reach = |target: &Selection| if backward { target.start() } else { target.end() };
        let mut found = Vec::with_capacity(doc.cursors.len());
        let mut unsupported = 0;
        for cursor in doc.cursors.iter() {
            let reference = if extending {
                Selection::point(cursor.selection.active)
            } else {
                cursor.selection.clone()
            };
            let mut resolution = resolve(&self.mode, &ctx, &reference, movement)?;
            // A unit ending (or starting) at the anchor would collapse the
            // extension; step past it instead.
            if extending
                && !cursor.selection.is_point()
                && let Resolution::Found(target) = &resolution
                && reach(target) == cursor.selection.anchor
            {
                let past = Selection::point(reach(target));
                resolution = resolve(&self.mode, &ctx, &past, movement)?;
            }
            match resolution {
                Resolution::Found(target) => found.push((cursor.id, cursor.selection.clone(), target)),
                Resolution::Unsupported => unsupported += 1,
                Resolution::NoMatch => {}
            }
        }
        let total = doc.cursors.len();
        trace!(
            target: "state.cursors",
            buffer = %id,
            movement = movement.name(),
            cursors = total,
            found = found.len(),
            "batch_resolved"
        );
        if swap {
            self.swap_armed = false;
        }
        if found.is_empty() {
            let notice = if unsupported == total {
                Notice::Unsupported {
                    mode: self.mode.kind.name().to_string(),
                }
            } else {
                Notice::NoMatch
            };
            return Ok(Outcome::noticed(notice));
        }
        if swap {
            let pairs = found
                .into_iter()
                .filter(|(_, source, target)| !source.is_empty() && !target.is_empty())
                .map(|(cursor, source, target)| SwapPair {
                    cursor,
                    source: source.range(),
                    target: target.range(),
                })
                .collect::<Vec<_>>();
            return self.swap(id, pairs);
        }
        let updates: Vec<_> = found
            .into_iter()
            .map(|(cursor, current, target)| {
                let next = if extending {
                    current.extend_to(reach(&target))
                } else {
                    target
                };
                (cursor, next)
            })
            .collect();
        Ok(self.mutate_cursors(id, |cursors| {
            cursors.apply(updates);
            true
        }))
    }

    /// Run `f` on a document's cursors; a changed set records the old one in
    /// the jump list. `f` returns false when it refused to act.
    fn mutate_cursors(&mut self, id: BufferId, f: impl FnOnce(&mut CursorSet) -> bool) -> Outcome {
        let Some(doc) = self.documents.get_mut(id.0) else {
            return Outcome::noticed(Notice::UnknownBuffer(id));
        };
        let before = doc.cursors.snapshot();
        if !f(&mut doc.cursors) {
            return Outcome::unchanged();
        }
        doc.cursors.clamp(doc.buffer.len_bytes());
        if doc.cursors.snapshot() == before {
            return Outcome::unchanged();
        }
        doc.history.push(before);
        trace!(target: "state.cursors", buffer = %id, cursors = doc.cursors.len(), "cursors_committed");
        Outcome::moved()
    }

    /// Add a cursor at the primary's resolved target; it becomes primary.
    pub fn add_cursor(&mut self, movement: Movement) -> Result<Outcome, EngineError> {
        let id = self.active;
        if self.has_pending(id) {
            return Ok(self.report(Outcome::noticed(Notice::Busy)));
        }
        let doc = self.active_document();
        let primary = doc.cursors.primary().selection.clone();
        let resolution = resolve(&self.mode, &context(doc, &self.mode), &primary, movement)?;
        let outcome = match resolution {
            Resolution::Found(target) => self.mutate_cursors(id, |cursors| {
                cursors.add(target);
                true
            }),
            Resolution::NoMatch => Outcome::noticed(Notice::NoMatch),
            Resolution::Unsupported => Outcome::noticed(Notice::Unsupported {
                mode: self.mode.kind.name().to_string(),
            }),
        };
        Ok(self.report(outcome))
    }

    /// One cursor per candidate of the current mode.
    pub fn select_all(&mut self) -> Result<Outcome, EngineError> {
        let id = self.active;
        if self.has_pending(id) {
            return Ok(self.report(Outcome::noticed(Notice::Busy)));
        }
        let doc = self.active_document();
        let primary = doc.cursors.primary().selection.clone();
        let selections = all_candidates(&self.mode, &context(doc, &self.mode), &primary)?;
        let outcome = if selections.is_empty() {
            Outcome::noticed(Notice::NoMatch)
        } else {
            self.mutate_cursors(id, |cursors| cursors.replace_all(selections))
        };
        Ok(self.report(outcome))
    }

    /// Replace the active buffer's cursors; the first selection is primary.
    pub fn set_selections(&mut self, selections: Vec<Selection>) -> Outcome {
        let id = self.active;
        self.mutate_cursors(id, |cursors| cursors.replace_all(selections))
    }

    pub fn keep_primary_only(&mut self) -> Outcome {
        let id = self.active;
        self.mutate_cursors(id, CursorSet::keep_primary_only)
    }

    /// Mark every non-empty selection of the active buffer, or unmark it when
    /// it is already marked. Cursors stay where they are.
    pub fn toggle_marks(&mut self) -> Outcome {
        let id = self.active;
        let doc = &mut self.documents[id.0];
        let ranges: Vec<_> = doc
            .cursors
            .iter()
            .map(|c| c.selection.range())
            .filter(|r| !r.is_empty())
            .collect();
        if ranges.is_empty() {
            return self.report(Outcome::noticed(Notice::NoMatch));
        }
        doc.toggle_marks(ranges);
        Outcome::unchanged()
    }

    pub fn remove_primary(&mut self) -> Outcome {
        let id = self.active;
        if self.active_document().cursors.len() == 1 {
            return self.report(Outcome::noticed(Notice::OnlyCursor));
        }
        self.mutate_cursors(id, CursorSet::remove_primary)
    }

    fn swap(&mut self, id: BufferId, pairs: Vec<SwapPair>) -> Result<Outcome, EngineError> {
        if pairs.is_empty() {
            return Ok(Outcome::noticed(Notice::NoMatch));
        }
        let Some(doc) = self.documents.get_mut(id.0) else {
            return Ok(Outcome::noticed(Notice::UnknownBuffer(id)));
        };
        let edits = match swap::plan(&doc.buffer, &pairs) {
            Ok(edits) => edits,
            Err(notice) => {
                debug!(target: "state.undo", buffer = %id, pairs = pairs.len(), "swap_rejected");
                return Ok(Outcome::noticed(notice));
            }
        };
        let before = doc.buffer.clone();
        let cursors_before = doc.cursors.snapshot();
        let changes = doc.buffer.apply(&edits)?;
        doc.undo.push_snapshot(SnapshotKind::Swap, &before, cursors_before);
        // Each cursor follows its own content to where the target was.
        let moved: Vec<_> = pairs
            .iter()
            .filter_map(|p| {
                changes
                    .new_range_of(&p.target)
                    .map(|range| (p.cursor, Selection::new(range)))
            })
            .collect();
        doc.cursors.remap(&changes);
        doc.cursors.apply(moved);
        doc.after_edit(&changes);
        debug!(target: "state.undo", buffer = %id, pairs = pairs.len(), version = doc.buffer.version().0, "swap_applied");
        self.cancel_queries_for(id);
        Ok(Outcome::edited())
    }

    /// Replace every selection of the active buffer with `text` as one edit.
    /// Each cursor then selects its inserted text.
    pub fn replace_selections(&mut self, text: &str) -> Result<Outcome, EngineError> {
        let id = self.active;
        let doc = &mut self.documents[id.0];
        let edits: Vec<Edit> = doc
            .cursors
            .iter()
            .map(|c| Edit::replace(c.selection.range(), text))
            .collect();
        if edits.iter().all(|e| e.range.is_empty() && e.text.is_empty()) {
            return Ok(Outcome::unchanged());
        }
        let Ok(edits) = EditSet::new(edits) else {
            return Ok(self.report(Outcome::noticed(Notice::ConflictingEdit)));
        };
        let before = doc.buffer.clone();
        let cursors_before = doc.cursors.snapshot();
        let changes = doc.buffer.apply(&edits)?;
        doc.undo.push_snapshot(SnapshotKind::Edit, &before, cursors_before);
        let updates: Vec<_> = doc
            .cursors
            .iter()
            .filter_map(|c| {
                changes
                    .new_range_of(&c.selection.range())
                    .map(|range| (c.id, Selection::new(range)))
            })
            .collect();
        doc.cursors.apply(updates);
        doc.after_edit(&changes);
        debug!(target: "state.undo", buffer = %id, edits = edits.len(), version = doc.buffer.version().0, "selections_replaced");
        self.cancel_queries_for(id);
        Ok(Outcome::edited())
    }

    pub fn delete_selections(&mut self) -> Result<Outcome, EngineError> {
        self.replace_selections("")
    }

    pub fn undo(&mut self) -> Outcome {
        self.step_undo(true)
    }

    pub fn redo(&mut self) -> Outcome {
        self.step_undo(false)
    }

    fn step_undo(&mut self, backwards: bool) -> Outcome {
        let id = self.active;
        let doc = &mut self.documents[id.0];
        let current = doc.cursors.snapshot();
        let restore = if backwards {
            doc.undo.undo(&doc.buffer, current)
        } else {
            doc.undo.redo(&doc.buffer, current)
        };
        let Some(restore) = restore else {
            let notice = if backwards {
                Notice::NothingToUndo
            } else {
                Notice::NothingToRedo
            };
            return self.report(Outcome::noticed(notice));
        };
        let changes = doc.buffer.restore(restore.text);
        doc.cursors.restore(&restore.cursors);
        doc.cursors.clamp(doc.buffer.len_bytes());
        doc.after_edit(&changes);
        self.cancel_queries_for(id);
        Outcome::edited()
    }

    fn has_fresh_cache(&self, id: BufferId, kind: &LspQueryKind) -> bool {
        self.documents.get(id.0).is_some_and(|doc| {
            doc.lsp_cache
                .as_ref()
                .is_some_and(|c| c.matches(doc.buffer.version(), kind))
        })
    }

    fn cancel_queries_for(&mut self, id: BufferId) {
        self.pending.retain(|q| {
            let keep = q.key.buffer != id;
            if !keep {
                debug!(target: "state.query", token = %q.token, buffer = %id, "query_cancelled");
            }
            keep
        });
    }

    fn cancel_all_queries(&mut self) {
        for q in self.pending.drain(..) {
            debug!(target: "state.query", token = %q.token, buffer = %q.key.buffer, "query_cancelled");
        }
    }

    /// Ask the language server for `kind` and park `movement` until it answers.
    fn issue_query(
        &mut self,
        id: BufferId,
        kind: LspQueryKind,
        movement: Movement,
    ) -> Result<Outcome, EngineError> {
        let Some(client) = self.lsp.as_ref() else {
            return Ok(Outcome::noticed(Notice::ModeUnavailable {
                mode: kind.to_string(),
                reason: "no language server".into(),
            }));
        };
        let Some(doc) = self.documents.get(id.0) else {
            return Ok(Outcome::noticed(Notice::UnknownBuffer(id)));
        };
        let version = doc.buffer.version();
        let request = LspRequest {
            kind,
            path: doc.buffer.display_path(),
            position: doc
                .buffer
                .offset_to_line_col(doc.cursors.primary().selection.start()),
            version,
        };
        let receiver = client.request(request);
        let key = QueryKey {
            buffer: id,
            version,
            kind,
            cursors: doc.cursors.ids().into_iter().collect(),
        };
        let token = QueryToken(self.next_token);
        self.next_token += 1;
        debug!(target: "state.query", token = %token, buffer = %id, kind = %kind, movement = movement.name(), "query_issued");
        self.cancel_queries_for(id);
        self.pending.push(PendingQuery {
            token,
            key,
            movement,
            issued_at: Instant::now(),
            receiver,
        });
        match self.take_ready(token) {
            Some((query, response)) => self.complete(query, response),
            None => Ok(Outcome::waiting(token)),
        }
    }

    /// Remove a query whose answer is already available.
    fn take_ready(&mut self, token: QueryToken) -> Option<(PendingQuery, LspResponse)> {
        let idx = self.pending.iter().position(|q| q.token == token)?;
        let response = match self.pending[idx].receiver.try_recv() {
            Ok(response) => response,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => Err(LspError::Unavailable("request dropped".into())),
        };
        Some((self.pending.remove(idx), response))
    }

    /// Collect every answered or timed-out query without blocking.
    pub fn poll_queries(&mut self, now: Instant) -> Result<Vec<Outcome>, EngineError> {
        let timeout = self.settings.lsp_timeout;
        let mut ready = Vec::new();
        let mut idx = 0;
        while idx < self.pending.len() {
            let query = &mut self.pending[idx];
            let response = match query.receiver.try_recv() {
                Ok(response) => Some(response),
                Err(TryRecvError::Closed) => {
                    Some(Err(LspError::Unavailable("request dropped".into())))
                }
                Err(TryRecvError::Empty)
                    if now.saturating_duration_since(query.issued_at) >= timeout =>
                {
                    Some(Err(LspError::Timeout))
                }
                Err(TryRecvError::Empty) => None,
            };
            match response {
                Some(response) => ready.push((self.pending.remove(idx), response)),
                None => idx += 1,
            }
        }
        let mut outcomes = Vec::with_capacity(ready.len());
        for (query, response) in ready {
            let outcome = self.complete(query, response)?;
            outcomes.push(self.report(outcome));
        }
        Ok(outcomes)
    }

    /// Hand a response to the query identified by `token`. Unknown tokens
    /// (cancelled or already answered) are ignored.
    pub fn deliver(&mut self, token: QueryToken, response: LspResponse) -> Result<Outcome, EngineError> {
        let Some(idx) = self.pending.iter().position(|q| q.token == token) else {
            trace!(target: "state.query", token = %token, "query_unknown_token");
            return Ok(Outcome::unchanged());
        };
        let query = self.pending.remove(idx);
        let outcome = self.complete(query, response)?;
        Ok(self.report(outcome))
    }

    fn key_is_current(&self, key: &QueryKey) -> bool {
        let Some(doc) = self.documents.get(key.buffer.0) else {
            return false;
        };
        doc.buffer.version() == key.version
            && self.mode.kind.lsp_kind() == Some(key.kind)
            && doc.cursors.ids().as_slice() == key.cursors.as_slice()
    }

    fn complete(&mut self, query: PendingQuery, response: LspResponse) -> Result<Outcome, EngineError> {
        let PendingQuery {
            token,
            key,
            movement,
            ..
        } = query;
        // Staleness is decided before the answer is looked at.
        if !self.key_is_current(&key) {
            debug!(
                target: "state.query",
                token = %token,
                buffer = %key.buffer,
                failed = response.is_err(),
                "query_stale_discarded"
            );
            if self.mode.kind.lsp_kind() == Some(key.kind) && self.documents.get(key.buffer.0).is_some() {
                return self.issue_query(key.buffer, key.kind, movement);
            }
            return Ok(Outcome::unchanged());
        }
        let locations = match response {
            Ok(locations) => locations,
            Err(e) => {
                warn!(target: "state.query", token = %token, error = %e, "query_failed");
                return Ok(Outcome::noticed(Notice::QueryFailed(e)));
            }
        };
        let locations = filter_for_kind(&key.kind, normalize_locations(locations));
        debug!(target: "state.query", token = %token, locations = locations.len(), "query_answered");
        let here = self.documents[key.buffer.0].buffer.display_path();
        let elsewhere = matches!(key.kind, LspQueryKind::Goto(_)) && locations.iter().any(|l| l.path != here);
        if elsewhere {
            let title = key.kind.to_string();
            let entries = locations
                .iter()
                .map(|l| QuickfixEntry {
                    path: l.path.clone(),
                    start: l.start,
                    end: l.end,
                    info: Some(SelectionInfo {
                        title: Some(title.clone()),
                        message: l.message.clone(),
                    }),
                })
                .collect();
            self.quickfix.set(title, entries);
        }
        let has_local = locations.iter().any(|l| l.path == here);
        let doc = &mut self.documents[key.buffer.0];
        doc.lsp_cache = Some(LspCache {
            version: key.version,
            kind: key.kind,
            locations,
        });
        if elsewhere && !has_local {
            // Every target lives in another file: follow the quickfix list.
            return self.quickfix_step(true);
        }
        self.run_movement(key.buffer, movement)
    }

    fn fill_quickfix_from_search(&mut self, pattern: &SearchPattern) {
        let mut entries = Vec::new();
        for doc in &self.documents {
            let text = doc.buffer.text();
            let path = doc.buffer.display_path();
            for range in pattern.matches(&text) {
                entries.push(QuickfixEntry {
                    path: path.clone(),
                    start: doc.buffer.offset_to_line_col(range.start),
                    end: doc.buffer.offset_to_line_col(range.end),
                    info: Some(SelectionInfo::titled("search")),
                });
            }
        }
        debug!(target: "state.query", entries = entries.len(), "quickfix_filled_from_search");
        self.quickfix
            .set(format!("search \"{}\"", pattern.source()), entries);
    }

    pub fn quickfix_next(&mut self) -> Result<Outcome, EngineError> {
        let outcome = self.quickfix_step(true)?;
        Ok(self.report(outcome))
    }

    pub fn quickfix_previous(&mut self) -> Result<Outcome, EngineError> {
        let outcome = self.quickfix_step(false)?;
        Ok(self.report(outcome))
    }

    /// Move to the next or previous quickfix entry, opening its file if needed.
    fn quickfix_step(&mut self, forward: bool) -> Result<Outcome, EngineError> {
        let entry = if forward {
            self.quickfix.next()
        } else {
            self.quickfix.previous()
        }
        .cloned();
        let Some(entry) = entry else {
            return Ok(Outcome::noticed(Notice::QuickfixExhausted));
        };
        let id = match self.open_path(&entry.path) {
            Ok(id) => id,
            Err(e) => {
                warn!(target: "state.query", path = %entry.path.display(), error = %e, "quickfix_open_failed");
                return Ok(Outcome::noticed(Notice::OpenFailed {
                    path: entry.path.display().to_string(),
                    reason: format!("{e:#}"),
                }));
            }
        };
        self.active = id;
        let buffer = &self.documents[id.0].buffer;
        let start = buffer.line_col_to_offset(entry.start);
        let end = buffer.line_col_to_offset(entry.end).max(start);
        let selection = Selection::new(start..end).with_info(entry.info);
        let mut outcome = self.mutate_cursors(id, |cursors| cursors.replace_all(vec![selection]));
        outcome.selection_changed = true;
        Ok(outcome)
    }
}
