//! The output widget: one cell's output container and its update lifecycle.
//!
//! An update goes through these steps:
//!
//! 1. The staleness gate admits or drops it
//! 2. A new generation starts and the container height is captured
//! 3. The container content is replaced according to the mime type
//! 4. For markup, scripts run in order up to the first remote load
//! 5. The viewport is compensated for the height change so far
//! 6. The rest of the scripts run, loads awaited one at a time
//! 7. If the run is still current, bonds are connected and math typeset

mod outcome;
#[cfg(test)]
mod widget_tests;

pub use outcome::{AppliedUpdate, HookStatus, UpdateOutcome};

use crate::activation::{ActivationQueue, ActivationRun, ScriptActivationPipeline};
use crate::collaborators::{Collaborators, RequestHandle};
use crate::config::RenderConfig;
use crate::core::{CellId, CellOutput, CompletionSignal, UpdateEnvelope};
use crate::dispatch::{materialize, render, DisplayStrategy, RenderTarget};
use crate::dom::{Document, NodeId, SharedDocument};
use crate::errors::DomError;
use crate::events::{names, noop_sink, EventSink};
use crate::gate::{GenerationCounter, RunTicket, StalenessGate};
use crate::scroll::{BlockLayout, Layout, ScrollCompensator, ScrollDecision, TrackedViewport, Viewport};
use parking_lot::Mutex;
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Displays one cell's output and keeps it in sync with its updates.
///
/// The widget owns a `<celloutput>` element inside its cell:
/// `<celloutput><assignee>name</assignee><div>body</div></celloutput>`.
/// `update` takes `&self`, so a newer update may start while an older
/// activation run is still waiting on a remote script.
pub struct OutputWidget {
    cell_id: CellId,
    document: SharedDocument,
    container: NodeId,
    gate: Mutex<StalenessGate>,
    generations: GenerationCounter,
    pipeline: ScriptActivationPipeline,
    collaborators: Collaborators,
    layout: Arc<dyn Layout>,
    viewport: Arc<dyn Viewport>,
    events: Arc<dyn EventSink>,
}

impl fmt::Debug for OutputWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputWidget")
            .field("cell_id", &self.cell_id)
            .field("container", &self.container)
            .field("displayed", &self.displayed_timestamp())
            .field("generation", &self.generations.current())
            .finish_non_exhaustive()
    }
}

struct PreparedRun {
    ticket: RunTicket,
    body: NodeId,
    activation: Option<ActivationRun>,
    scroll: ScrollDecision,
}

impl OutputWidget {
    /// Creates the output container inside `cell` and returns its widget.
    pub fn mount(
        document: SharedDocument,
        cell: NodeId,
        cell_id: CellId,
        pipeline: ScriptActivationPipeline,
    ) -> Result<Self, DomError> {
        let container = {
            let mut doc = document.lock();
            let container = doc.create_element("celloutput");
            doc.append_child(cell, container)?;
            let assignee = doc.create_element("assignee");
            let body = doc.create_element("div");
            doc.append_child(container, assignee)?;
            doc.append_child(container, body)?;
            container
        };
        debug!(cell_id = %cell_id, container = %container, "Mounted output widget");

        Ok(Self {
            cell_id,
            document,
            container,
            gate: Mutex::new(StalenessGate::new()),
            generations: GenerationCounter::new(),
            pipeline,
            collaborators: Collaborators::default(),
            layout: Arc::new(BlockLayout::default()),
            viewport: Arc::new(TrackedViewport::new()),
            events: noop_sink(),
        })
    }

    /// Applies layout metrics from `config`.
    #[must_use]
    pub fn with_config(mut self, config: &RenderConfig) -> Self {
        self.layout = Arc::new(BlockLayout::new(config.layout.clone()));
        self
    }

    /// Sets the collaborators.
    #[must_use]
    pub fn with_collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self
    }

    /// Sets the layout used to measure heights.
    #[must_use]
    pub fn with_layout(mut self, layout: Arc<dyn Layout>) -> Self {
        self.layout = layout;
        self
    }

    /// Sets the viewport that is scrolled to compensate height changes.
    #[must_use]
    pub fn with_viewport(mut self, viewport: Arc<dyn Viewport>) -> Self {
        self.viewport = viewport;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Returns the cell this widget displays.
    #[must_use]
    pub const fn cell_id(&self) -> CellId {
        self.cell_id
    }

    /// Returns the `<celloutput>` container.
    #[must_use]
    pub const fn container(&self) -> NodeId {
        self.container
    }

    /// Returns the shared document.
    #[must_use]
    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    /// Returns the timestamp of the last applied update.
    #[must_use]
    pub fn displayed_timestamp(&self) -> f64 {
        self.gate.lock().displayed()
    }

    /// Returns the current generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generations.current()
    }

    /// Applies one update.
    ///
    /// Never fails: rejected updates, script failures and collaborator
    /// failures are all reported through the outcome and logs.
    pub async fn update(&self, envelope: UpdateEnvelope) -> UpdateOutcome {
        let UpdateEnvelope {
            output,
            all_completed,
            requests,
        } = envelope;
        let timestamp = output.timestamp;
        let strategy = render(&output);
        let kind = strategy.kind();

        let prepared = match self.prepare(&output, &strategy, &requests) {
            Ok(prepared) => prepared,
            Err(outcome) => return outcome,
        };

        ScrollCompensator::apply(prepared.scroll, self.viewport.as_ref());
        if let ScrollDecision::Scroll { delta } = prepared.scroll {
            self.events
                .try_emit(names::SCROLL_COMPENSATED, Some(json!({ "delta": delta })));
        }
        self.events.try_emit(
            names::UPDATE_APPLIED,
            Some(json!({
                "cell_id": self.cell_id,
                "timestamp": timestamp,
                "generation": prepared.ticket.generation(),
                "strategy": kind,
            })),
        );

        let mut applied = AppliedUpdate {
            generation: prepared.ticket.generation(),
            strategy: kind,
            scroll: prepared.scroll,
            activation: None,
            hooks: HookStatus::NotApplicable,
        };

        let Some(run) = prepared.activation else {
            return UpdateOutcome::Applied(applied);
        };

        let report = self
            .pipeline
            .resume(&self.document, prepared.body, run, &prepared.ticket)
            .await;
        applied.activation = Some(report);

        if prepared.ticket.is_superseded() {
            debug!(
                cell_id = %self.cell_id,
                generation = prepared.ticket.generation(),
                current = self.generations.current(),
                "Ignoring completion of superseded activation run"
            );
            self.events.try_emit(
                names::UPDATE_SUPERSEDED,
                Some(json!({
                    "cell_id": self.cell_id,
                    "generation": prepared.ticket.generation(),
                })),
            );
            applied.hooks = HookStatus::Superseded;
            return UpdateOutcome::Applied(applied);
        }

        applied.hooks = self
            .run_completion_hooks(prepared.body, &all_completed, &requests)
            .await;
        UpdateOutcome::Applied(applied)
    }

    /// Everything up to the first point where the update has to wait.
    ///
    /// Holds the gate and document locks for the whole step, so admission,
    /// replacement, the scripts that run without a network load and the
    /// displayed-timestamp bump cannot interleave with another update. The
    /// new height is measured after those scripts, so content they insert
    /// is compensated too.
    fn prepare(
        &self,
        output: &CellOutput,
        strategy: &DisplayStrategy,
        requests: &RequestHandle,
    ) -> Result<PreparedRun, UpdateOutcome> {
        let timestamp = output.timestamp;
        let mut gate = self.gate.lock();
        if !gate.admit(timestamp) {
            let displayed = gate.displayed();
            debug!(cell_id = %self.cell_id, timestamp, displayed, "Dropping stale update");
            self.events.try_emit(
                names::UPDATE_REJECTED,
                Some(json!({
                    "cell_id": self.cell_id,
                    "timestamp": timestamp,
                    "displayed": displayed,
                })),
            );
            return Err(UpdateOutcome::Rejected {
                timestamp,
                displayed,
            });
        }

        let ticket = self.generations.advance();
        let mut doc = self.document.lock();
        let before = ScrollCompensator::capture(self.layout.as_ref(), &doc, self.container);

        let body = self
            .replace_content(&mut doc, output, strategy, requests)
            .map_err(|e| {
                warn!(cell_id = %self.cell_id, error = %e, "Could not write output");
                UpdateOutcome::Failed {
                    timestamp,
                    error: e.to_string(),
                }
            })?;

        let activation = matches!(strategy, DisplayStrategy::Markup { .. }).then(|| {
            let queue = ActivationQueue::collect(&doc, body);
            self.pipeline.start(&mut doc, body, queue, &ticket)
        });
        let after = self.layout.scroll_height(&doc, self.container);
        let scroll = ScrollCompensator::decide(&doc, self.container, before, after);
        gate.mark_displayed(timestamp);

        Ok(PreparedRun {
            ticket,
            body,
            activation,
            scroll,
        })
    }

    fn replace_content(
        &self,
        doc: &mut Document,
        output: &CellOutput,
        strategy: &DisplayStrategy,
        requests: &RequestHandle,
    ) -> Result<NodeId, DomError> {
        doc.remove_children(self.container)?;

        let assignee = doc.create_element("assignee");
        if let Some(name) = &output.root_assignee {
            let text = doc.create_text(name.as_str());
            doc.append_child(assignee, text)?;
        }
        doc.append_child(self.container, assignee)?;

        let target = RenderTarget {
            cell_id: self.cell_id,
            requests,
            error_renderer: self.collaborators.errors.as_ref(),
        };
        materialize(doc, self.container, strategy, &target)
    }

    async fn run_completion_hooks(
        &self,
        body: NodeId,
        all_completed: &CompletionSignal,
        requests: &RequestHandle,
    ) -> HookStatus {
        let bonds_connected = match self
            .collaborators
            .bonds
            .connect(&self.document, body, all_completed, requests)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(cell_id = %self.cell_id, error = %e, "Failed to connect bonds");
                false
            }
        };

        let typeset = {
            let mut doc = self.document.lock();
            match self.collaborators.math.typeset(&mut doc, body) {
                Ok(()) => true,
                Err(e) => {
                    info!(cell_id = %self.cell_id, error = %e, "Failed to typeset TeX");
                    false
                }
            }
        };

        HookStatus::Completed {
            bonds_connected,
            typeset,
        }
    }
}
