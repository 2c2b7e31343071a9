//! Sequential script activation.
//!
//! Markup written into a container in bulk does not run its scripts. The
//! pipeline runs them the way a parser would: one at a time, in document
//! order, waiting for each remote script to load before moving on.

use super::{
    ActivationQueue, ActivationReport, ScriptContext, ScriptEvaluator, ScriptLoader, ScriptNode,
    ScriptOutcome, ScriptRequest,
};
use crate::config::RenderConfig;
use crate::dom::{Document, NodeId, SharedDocument};
use crate::errors::{DomError, LoadError, ScriptError};
use crate::events::{names, noop_sink, EventSink};
use crate::gate::RunTicket;
use serde_json::json;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Runs the scripts of one output, in order, one at a time.
#[derive(Clone)]
pub struct ScriptActivationPipeline {
    loader: Arc<dyn ScriptLoader>,
    evaluator: Arc<dyn ScriptEvaluator>,
    events: Arc<dyn EventSink>,
    load_timeout: Option<Duration>,
}

impl fmt::Debug for ScriptActivationPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptActivationPipeline")
            .field("load_timeout", &self.load_timeout)
            .finish_non_exhaustive()
    }
}

impl ScriptActivationPipeline {
    /// Creates a pipeline with no load timeout and no event sink.
    pub fn new(loader: Arc<dyn ScriptLoader>, evaluator: Arc<dyn ScriptEvaluator>) -> Self {
        Self {
            loader,
            evaluator,
            events: noop_sink(),
            load_timeout: None,
        }
    }

    /// Creates a pipeline configured from `config`.
    pub fn from_config(
        loader: Arc<dyn ScriptLoader>,
        evaluator: Arc<dyn ScriptEvaluator>,
        config: &RenderConfig,
    ) -> Self {
        Self::new(loader, evaluator).with_load_timeout(config.activation.load_timeout())
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Sets the remote load timeout.
    #[must_use]
    pub fn with_load_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.load_timeout = timeout;
        self
    }

    /// Runs every node of `queue` against `root`.
    ///
    /// Resolves exactly once, after every node has loaded, run or failed.
    /// An empty queue resolves immediately. Never fails.
    pub async fn activate(
        &self,
        document: &SharedDocument,
        root: NodeId,
        queue: ActivationQueue,
    ) -> ActivationReport {
        self.activate_guarded(document, root, queue, &RunTicket::detached())
            .await
    }

    /// Like [`activate`](Self::activate), but stops touching the document
    /// once `ticket` is superseded. Remaining nodes are reported as
    /// [`ScriptOutcome::Abandoned`].
    pub async fn activate_guarded(
        &self,
        document: &SharedDocument,
        root: NodeId,
        queue: ActivationQueue,
        ticket: &RunTicket,
    ) -> ActivationReport {
        let run = self.start(&mut document.lock(), root, queue, ticket);
        self.resume(document, root, run, ticket).await
    }

    /// Runs the synchronous prefix of `queue`.
    ///
    /// Inline scripts and remote scripts already in the head are handled
    /// right away. The first remote script that needs fetching is inserted
    /// into the head and left pending; nothing after it runs until
    /// [`resume`](Self::resume) awaits its load.
    pub fn start(
        &self,
        document: &mut Document,
        root: NodeId,
        mut queue: ActivationQueue,
        ticket: &RunTicket,
    ) -> ActivationRun {
        let mut report = ActivationReport::begin(queue.len());
        let pending = self.run_ready(document, root, &mut queue, &mut report, ticket);
        ActivationRun {
            queue,
            report,
            pending,
        }
    }

    /// Drives a started run to completion.
    pub async fn resume(
        &self,
        document: &SharedDocument,
        root: NodeId,
        run: ActivationRun,
        ticket: &RunTicket,
    ) -> ActivationReport {
        let ActivationRun {
            mut queue,
            mut report,
            mut pending,
        } = run;

        while let Some(request) = pending.take() {
            report.record(self.load(&request).await);
            pending = self.run_ready(&mut document.lock(), root, &mut queue, &mut report, ticket);
        }

        let report = report.finish(ticket.is_superseded());
        self.events.try_emit(
            names::ACTIVATION_COMPLETED,
            Some(json!({
                "scripts": report.len(),
                "failures": report.failures().len(),
                "superseded": report.superseded,
                "duration_ms": report.duration_ms(),
            })),
        );
        report
    }

    // Consumes nodes until one needs a network load or the queue runs dry.
    // The caller holds the document for the whole call, so the supersession
    // check cannot race a newer update's content replacement.
    fn run_ready(
        &self,
        document: &mut Document,
        root: NodeId,
        queue: &mut ActivationQueue,
        report: &mut ActivationReport,
        ticket: &RunTicket,
    ) -> Option<ScriptRequest> {
        while let Some(node) = queue.pop_front() {
            if ticket.is_superseded() {
                let abandoned = 1 + queue.len();
                debug!(
                    generation = ticket.generation(),
                    abandoned, "Activation run superseded, abandoning remaining scripts"
                );
                report.record(ScriptOutcome::Abandoned);
                for _ in queue.drain() {
                    report.record(ScriptOutcome::Abandoned);
                }
                return None;
            }

            document.set_current_script(root, node.element);
            let Some(request) = node.request() else {
                report.record(self.evaluate_inline(document, root, &node));
                continue;
            };

            if document.head_has_script(&request.src) {
                debug!(src = %request.src, "Script already present in document head, not fetching again");
                self.events
                    .try_emit(names::SCRIPT_ALREADY_LOADED, Some(json!({ "src": request.src })));
                report.record(ScriptOutcome::AlreadyLoaded { src: request.src });
                continue;
            }

            match insert_loadable_script(document, &request) {
                Ok(()) => return Some(request),
                Err(e) => {
                    warn!(src = %request.src, error = %e, "Could not insert script element");
                    let error = LoadError::network(&request.src, e.to_string());
                    report.record(self.load_failed(&request.src, &error));
                }
            }
        }
        None
    }

    async fn load(&self, request: &ScriptRequest) -> ScriptOutcome {
        let src = request.src.as_str();
        let loaded = match self.load_timeout {
            Some(limit) => tokio::time::timeout(limit, self.loader.load(request))
                .await
                .unwrap_or_else(|_| {
                    Err(LoadError::Timeout {
                        src: src.to_string(),
                        millis: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                    })
                }),
            None => self.loader.load(request).await,
        };

        match loaded {
            Ok(()) => {
                debug!(src, kind = %request.kind, "Loaded script");
                self.events.try_emit(names::SCRIPT_LOADED, Some(json!({ "src": src })));
                ScriptOutcome::Loaded { src: src.to_string() }
            }
            Err(e) => self.load_failed(src, &e),
        }
    }

    fn load_failed(&self, src: &str, error: &LoadError) -> ScriptOutcome {
        warn!(src, error = %error, "Script failed to load, continuing with the next one");
        self.events.try_emit(
            names::SCRIPT_LOAD_FAILED,
            Some(json!({ "src": src, "error": error.to_string() })),
        );
        ScriptOutcome::LoadFailed {
            src: src.to_string(),
            error: error.to_string(),
        }
    }

    fn evaluate_inline(&self, doc: &mut Document, root: NodeId, node: &ScriptNode) -> ScriptOutcome {
        let result = {
            let mut ctx = ScriptContext::new(doc, root, node.element, &node.source_text);
            panic::catch_unwind(AssertUnwindSafe(|| self.evaluator.evaluate(&mut ctx)))
                .unwrap_or_else(|payload| Err(ScriptError::Panicked(panic_message(payload.as_ref()))))
        };

        let result = result.and_then(|produced| match produced {
            Some(el) if doc.is_element(el) => doc
                .insert_after(node.element, el)
                .map(|()| Some(el))
                .map_err(|e| ScriptError::Insertion(e.to_string())),
            Some(other) => {
                debug!(node = %other, "Script returned a non-element node, not inserting it");
                Ok(None)
            }
            None => Ok(None),
        });

        match result {
            Ok(inserted) => {
                self.events.try_emit(
                    names::SCRIPT_EVALUATED,
                    Some(json!({ "element": node.element, "inserted": inserted })),
                );
                ScriptOutcome::Evaluated { inserted }
            }
            Err(e) => {
                warn!(element = %node.element, error = %e, "Couldn't execute script");
                self.events.try_emit(
                    names::SCRIPT_EVAL_FAILED,
                    Some(json!({ "element": node.element, "error": e.to_string() })),
                );
                ScriptOutcome::EvaluationFailed { error: e.to_string() }
            }
        }
    }
}

/// An activation run whose synchronous prefix has executed.
///
/// Produced by [`ScriptActivationPipeline::start`] and finished by
/// [`ScriptActivationPipeline::resume`].
#[derive(Debug)]
pub struct ActivationRun {
    queue: ActivationQueue,
    report: ActivationReport,
    pending: Option<ScriptRequest>,
}

impl ActivationRun {
    /// Returns the outcomes recorded so far.
    #[must_use]
    pub fn outcomes(&self) -> &[ScriptOutcome] {
        &self.report.outcomes
    }

    /// Returns the remote script the run is waiting on, if any.
    #[must_use]
    pub const fn pending(&self) -> Option<&ScriptRequest> {
        self.pending.as_ref()
    }

    /// Returns the number of nodes not yet reached.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

fn insert_loadable_script(doc: &mut Document, request: &ScriptRequest) -> Result<(), DomError> {
    let script = doc.create_element("script");
    doc.set_attr(script, "src", request.src.as_str())?;
    doc.set_attr(script, "type", request.kind.type_attribute())?;
    let head = doc.head();
    doc.append_child(head, script)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
