use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::debug;

use crate::{LspClient, LspError, LspRequest, LspResponse, Location, QueryFamily};

#[derive(Default)]
struct Script {
    supported: HashSet<QueryFamily>,
    answers: HashMap<QueryFamily, LspResponse>,
    manual: bool,
    waiting: VecDeque<(LspRequest, oneshot::Sender<LspResponse>)>,
    log: Vec<LspRequest>,
}

/// In-memory client answering from canned results.
///
/// In immediate mode every request is answered as soon as it is made; in
/// manual mode requests queue up until [`ScriptedLspClient::respond_next`].
/// Clones share one script, so a test can keep a handle after giving the
/// client to a session.
#[derive(Clone, Default)]
pub struct ScriptedLspClient {
    script: Arc<Mutex<Script>>,
}

impl std::fmt::Debug for ScriptedLspClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let script = self.script();
        f.debug_struct("ScriptedLspClient")
            .field("supported", &script.supported)
            .field("manual", &script.manual)
            .field("waiting", &script.waiting.len())
            .field("requests", &script.log.len())
            .finish()
    }
}

impl ScriptedLspClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn support(self, family: QueryFamily) -> Self {
        self.script().supported.insert(family);
        self
    }

    pub fn answer(&self, family: QueryFamily, locations: Vec<Location>) {
        let mut script = self.script();
        script.supported.insert(family);
        script.answers.insert(family, Ok(locations));
    }

    pub fn fail(&self, family: QueryFamily, error: LspError) {
        let mut script = self.script();
        script.supported.insert(family);
        script.answers.insert(family, Err(error));
    }

    pub fn set_manual(&self, manual: bool) {
        self.script().manual = manual;
    }

    /// Answer the oldest queued request. Returns false when nothing was waiting
    /// or the requester already went away.
    pub fn respond_next(&self) -> bool {
        let mut script = self.script();
        let Some((request, tx)) = script.waiting.pop_front() else {
            return false;
        };
        let response = answer_for(&script, &request);
        tx.send(response).is_ok()
    }

    pub fn pending(&self) -> usize {
        self.script().waiting.len()
    }

    pub fn requests(&self) -> Vec<LspRequest> {
        self.script().log.clone()
    }
}

fn answer_for(script: &Script, request: &LspRequest) -> LspResponse {
    script
        .answers
        .get(&request.kind.family())
        .cloned()
        .unwrap_or_else(|| Ok(Vec::new()))
}

impl LspClient for ScriptedLspClient {
    fn supports(&self, family: QueryFamily) -> bool {
        self.script().supported.contains(&family)
    }

    fn request(&self, request: LspRequest) -> oneshot::Receiver<LspResponse> {
        let (tx, rx) = oneshot::channel();
        let mut script = self.script();
        script.log.push(request.clone());
        debug!(target: "state.query", kind = %request.kind, manual = script.manual, "scripted_request");
        if script.manual {
            script.waiting.push_back((request, tx));
        } else {
            // The receiver is still alive here; a send failure is impossible.
            let _ = tx.send(answer_for(&script, &request));
        }
        rx
    }
}
