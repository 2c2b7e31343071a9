use super::*;
use crate::activation::{ActivationReport, HandlerRegistry, NoOpScriptLoader};
use crate::core::{completion_pair, OutputBody};
use crate::dispatch::StrategyKind;
use crate::events::CollectingEventSink;
use crate::scroll::MockViewport;
use crate::testing::{
    assert_applied, assert_hooks_completed, assert_rejected, assert_superseded, log_registry,
    FixedLayout, NotebookFixture, RecordingBondConnector, RecordingLoader, RecordingTypesetter,
    ScriptLog,
};
use mockall::predicate::eq;
use pretty_assertions::assert_eq;
use std::time::Duration;

fn plain_pipeline(log: &ScriptLog) -> ScriptActivationPipeline {
    ScriptActivationPipeline::new(Arc::new(NoOpScriptLoader), Arc::new(log_registry(log)))
}

struct Harness {
    notebook: NotebookFixture,
    log: ScriptLog,
    bonds: Arc<RecordingBondConnector>,
    math: Arc<RecordingTypesetter>,
}

impl Harness {
    fn new(cells: usize) -> Self {
        let log = ScriptLog::new();
        Self {
            notebook: NotebookFixture::new(cells),
            bonds: Arc::new(RecordingBondConnector::new(log.clone())),
            math: Arc::new(RecordingTypesetter::new(log.clone())),
            log,
        }
    }

    fn collaborators(&self) -> Collaborators {
        Collaborators::new()
            .with_bonds(self.bonds.clone())
            .with_math(self.math.clone())
    }

    fn widget(&self, index: usize, pipeline: ScriptActivationPipeline) -> OutputWidget {
        self.notebook
            .mount(index, pipeline)
            .unwrap()
            .with_collaborators(self.collaborators())
    }
}

#[test]
fn test_mount_creates_empty_container() {
    let h = Harness::new(1);
    let widget = h.widget(0, plain_pipeline(&h.log));

    let doc = h.notebook.document();
    let doc = doc.lock();
    assert_eq!(doc.tag_name(widget.container()), Some("celloutput"));
    assert_eq!(doc.parent(widget.container()), Some(h.notebook.cell(0)));
    assert_eq!(doc.inner_html(widget.container()), "<assignee></assignee><div></div>");
    assert_eq!(widget.displayed_timestamp(), 0.0);
    assert_eq!(widget.generation(), 0);
}

#[tokio::test]
async fn test_staleness_gate_drops_older_updates() {
    let h = Harness::new(1);
    let events = Arc::new(CollectingEventSink::new());
    let widget = h.widget(0, plain_pipeline(&h.log)).with_events(events.clone());

    let second = widget.update(h.notebook.plain(0, "two", 2.0)).await;
    let first = widget.update(h.notebook.plain(0, "one", 1.0)).await;
    let after_rejection = h.notebook.output_html(&widget);
    let third = widget.update(h.notebook.plain(0, "three", 3.0)).await;

    assert_eq!(assert_applied(&second).generation, 1);
    assert_eq!(
        first,
        UpdateOutcome::Rejected {
            timestamp: 1.0,
            displayed: 2.0
        }
    );
    assert_eq!(
        after_rejection,
        "<assignee></assignee><div><pre><code>two</code></pre></div>"
    );
    assert_eq!(assert_applied(&third).generation, 2);
    assert_eq!(widget.displayed_timestamp(), 3.0);
    assert_eq!(
        events.event_types(),
        vec![names::UPDATE_APPLIED, names::UPDATE_REJECTED, names::UPDATE_APPLIED]
    );
}

#[tokio::test]
async fn test_equal_timestamp_is_rejected() {
    let h = Harness::new(1);
    let widget = h.widget(0, plain_pipeline(&h.log));

    widget.update(h.notebook.html(0, "<script>log once</script>", 5.0)).await;
    let repeat = widget.update(h.notebook.html(0, "<script>log twice</script>", 5.0)).await;

    assert_rejected(&repeat);
    assert_eq!(widget.generation(), 1);
    assert_eq!(h.log.entries(), vec!["inline:once", "bonds:0", "typeset"]);
}

#[tokio::test]
async fn test_markup_runs_scripts_then_bonds_then_typeset() {
    let h = Harness::new(1);
    let widget = h.widget(0, plain_pipeline(&h.log));

    let outcome = widget
        .update(h.notebook.html(
            0,
            "<script>log first</script><bond><input></bond><script>log second</script>",
            1.0,
        ))
        .await;

    assert_hooks_completed(&outcome);
    let applied = assert_applied(&outcome);
    assert_eq!(applied.strategy, StrategyKind::Markup);
    assert_eq!(applied.activation.as_ref().map(ActivationReport::len), Some(2));
    assert_eq!(
        applied.hooks,
        HookStatus::Completed {
            bonds_connected: true,
            typeset: true
        }
    );
    assert_eq!(h.log.entries(), vec!["inline:first", "inline:second", "bonds:1", "typeset"]);
    assert_eq!(h.bonds.call_count(), 1);
    assert_eq!(h.math.call_count(), 1);
}

#[tokio::test]
async fn test_bond_failure_still_typesets() {
    let h = Harness::new(1);
    let bonds = Arc::new(RecordingBondConnector::failing(h.log.clone()));
    let widget = h
        .notebook
        .mount(0, plain_pipeline(&h.log))
        .unwrap()
        .with_collaborators(h.collaborators().with_bonds(bonds.clone()));

    let outcome = widget.update(h.notebook.html(0, "<p>$x^2$</p>", 1.0)).await;

    assert_eq!(
        assert_applied(&outcome).hooks,
        HookStatus::Completed {
            bonds_connected: false,
            typeset: true
        }
    );
    assert_eq!(bonds.call_count(), 1);
    assert_eq!(h.math.call_count(), 1);
}

#[tokio::test]
async fn test_typeset_failure_is_absorbed() {
    let h = Harness::new(1);
    let math = Arc::new(RecordingTypesetter::failing(h.log.clone()));
    let widget = h
        .notebook
        .mount(0, plain_pipeline(&h.log))
        .unwrap()
        .with_collaborators(h.collaborators().with_math(math.clone()));

    let outcome = widget.update(h.notebook.html(0, "<p>$\\bad$</p>", 1.0)).await;

    assert_eq!(
        assert_applied(&outcome).hooks,
        HookStatus::Completed {
            bonds_connected: true,
            typeset: false
        }
    );
    assert_eq!(widget.displayed_timestamp(), 1.0);
}

#[tokio::test]
async fn test_non_markup_outputs_skip_activation() {
    let h = Harness::new(1);
    let widget = h.widget(0, plain_pipeline(&h.log));

    let outcome = widget
        .update(h.notebook.plain(0, "<script>log never</script>", 1.0))
        .await;

    let applied = assert_applied(&outcome);
    assert_eq!(applied.strategy, StrategyKind::Preformatted);
    assert_eq!(applied.activation, None);
    assert_eq!(applied.hooks, HookStatus::NotApplicable);
    assert!(h.log.is_empty());
    assert_eq!(
        h.notebook.output_html(&widget),
        "<assignee></assignee><div><pre><code>&lt;script&gt;log never&lt;/script&gt;</code></pre></div>"
    );
}

#[tokio::test]
async fn test_image_and_empty_outputs() {
    let h = Harness::new(1);
    let widget = h.widget(0, plain_pipeline(&h.log));

    widget
        .update(h.notebook.envelope(0, "image/png", "data:image/png;base64,iVBOR", 1.0))
        .await;
    assert_eq!(
        h.notebook.output_html(&widget),
        "<assignee></assignee><div><img src=\"data:image/png;base64,iVBOR\"></div>"
    );

    let outcome = widget.update(h.notebook.plain(0, "", 2.0)).await;
    assert_eq!(assert_applied(&outcome).strategy, StrategyKind::Empty);
    assert_eq!(h.notebook.output_html(&widget), "<assignee></assignee><div></div>");
}

#[tokio::test]
async fn test_stacktrace_output_uses_error_renderer() {
    let h = Harness::new(1);
    let widget = h.widget(0, plain_pipeline(&h.log));
    let body = OutputBody::Structured(serde_json::json!({
        "msg": "DomainError: sqrt(-1)",
        "stacktrace": [{ "call": "sqrt(x)", "file": "math.jl", "line": 33 }]
    }));
    let output = CellOutput::new(
        h.notebook.cell_id(0),
        "application/vnd.pluto.stacktrace+json",
        body,
        1.0,
    );

    let outcome = widget.update(UpdateEnvelope::new(output)).await;

    assert_eq!(assert_applied(&outcome).strategy, StrategyKind::Error);
    let html = h.notebook.output_html(&widget);
    assert!(html.contains("<header>DomainError: sqrt(-1)</header>"), "{html}");
    assert!(html.contains("<a>math.jl:33</a>"), "{html}");
}

#[tokio::test]
async fn test_root_assignee_is_shown() {
    let h = Harness::new(1);
    let widget = h.widget(0, plain_pipeline(&h.log));
    let output = CellOutput::new(h.notebook.cell_id(0), "text/plain", "42", 1.0).with_root_assignee("answer");

    widget.update(UpdateEnvelope::new(output)).await;

    assert_eq!(
        h.notebook.output_html(&widget),
        "<assignee>answer</assignee><div><pre><code>42</code></pre></div>"
    );
}

#[tokio::test]
async fn test_scrolls_when_output_above_focused_cell_grows() {
    let h = Harness::new(3);
    let viewport = Arc::new(TrackedViewport::at(500.0));
    let events = Arc::new(CollectingEventSink::new());
    let widget = h
        .widget(0, plain_pipeline(&h.log))
        .with_layout(Arc::new(FixedLayout::new([100.0, 160.0])))
        .with_viewport(viewport.clone())
        .with_events(events.clone());
    h.notebook.focus(2).unwrap();

    let outcome = widget.update(h.notebook.plain(0, "taller", 1.0)).await;

    assert_eq!(assert_applied(&outcome).scroll, ScrollDecision::Scroll { delta: 60.0 });
    assert_eq!(viewport.scroll_offset(), 560.0);
    assert_eq!(events.events_of_type(names::SCROLL_COMPENSATED).len(), 1);
}

#[tokio::test]
async fn test_scrolls_when_focused_cell_own_output_shrinks() {
    let h = Harness::new(2);
    let mut viewport = MockViewport::new();
    viewport.expect_scroll_by().with(eq(-40.0)).times(1).return_const(());
    let widget = h
        .widget(1, plain_pipeline(&h.log))
        .with_layout(Arc::new(FixedLayout::new([140.0, 100.0])))
        .with_viewport(Arc::new(viewport));
    h.notebook.focus(1).unwrap();

    let outcome = widget.update(h.notebook.plain(1, "shorter", 1.0)).await;

    assert_eq!(assert_applied(&outcome).scroll, ScrollDecision::Scroll { delta: -40.0 });
}

#[tokio::test]
async fn test_no_scroll_below_focus_or_without_focus() {
    let h = Harness::new(3);
    let mut viewport = MockViewport::new();
    viewport.expect_scroll_by().never();
    let widget = h
        .widget(2, plain_pipeline(&h.log))
        .with_layout(Arc::new(FixedLayout::new([0.0, 80.0, 80.0, 200.0])))
        .with_viewport(Arc::new(viewport));

    let unfocused = widget.update(h.notebook.plain(2, "a", 1.0)).await;
    h.notebook.focus(0).unwrap();
    let below = widget.update(h.notebook.plain(2, "b\nc", 2.0)).await;

    assert_eq!(assert_applied(&unfocused).scroll, ScrollDecision::NoFocus);
    assert_eq!(assert_applied(&below).scroll, ScrollDecision::BelowFocus);
}

#[tokio::test]
async fn test_scroll_includes_content_from_inline_scripts() {
    let h = Harness::new(3);
    let viewport = Arc::new(TrackedViewport::new());
    let widget = h.widget(0, plain_pipeline(&h.log)).with_viewport(viewport.clone());
    h.notebook.focus(2).unwrap();

    let outcome = widget
        .update(h.notebook.html(0, "<script>emit p hello</script>", 1.0))
        .await;

    assert_eq!(assert_applied(&outcome).scroll, ScrollDecision::Scroll { delta: 20.0 });
    assert_eq!(viewport.scroll_offset(), 20.0);
    assert_eq!(
        h.notebook.output_html(&widget),
        "<assignee></assignee><div><script>emit p hello</script><p>hello</p></div>"
    );
}

#[tokio::test]
async fn test_scroll_is_measured_before_first_remote_load() {
    let h = Harness::new(3);
    let loader = Arc::new(RecordingLoader::new(h.log.clone()));
    let pipeline = ScriptActivationPipeline::new(loader, Arc::new(log_registry(&h.log)));
    let viewport = Arc::new(TrackedViewport::new());
    let widget = h.widget(0, pipeline).with_viewport(viewport.clone());
    h.notebook.focus(2).unwrap();

    let outcome = widget
        .update(h.notebook.html(
            0,
            r#"<script>emit p before</script><script src="lib.js"></script><script>emit p after</script>"#,
            1.0,
        ))
        .await;

    assert_eq!(assert_applied(&outcome).scroll, ScrollDecision::Scroll { delta: 20.0 });
    assert_eq!(h.log.entries(), vec!["remote:lib.js", "bonds:0", "typeset"]);
}

#[tokio::test]
async fn test_repeated_updates_reuse_document_nodes() {
    let h = Harness::new(1);
    let widget = h.widget(0, plain_pipeline(&h.log));
    let markup = "<p>one</p><p>two</p><p>three</p>";

    widget.update(h.notebook.html(0, markup, 1.0)).await;
    let baseline = h.notebook.document().lock().node_count();
    for i in 2..1_000 {
        widget.update(h.notebook.html(0, markup, f64::from(i))).await;
    }

    assert_eq!(h.notebook.document().lock().node_count(), baseline);
}

#[tokio::test]
async fn test_deeply_nested_markup_is_applied() {
    let h = Harness::new(1);
    let widget = h.widget(0, plain_pipeline(&h.log));
    let depth = 50_000;
    let markup = format!("{}x{}", "<div>".repeat(depth), "</div>".repeat(depth));

    let outcome = widget.update(h.notebook.html(0, &markup, 1.0)).await;

    assert_hooks_completed(&outcome);
    let html = h.notebook.output_html(&widget);
    assert!(html.ends_with(&format!("x{}</div>", "</div>".repeat(depth))));
    let doc = h.notebook.document();
    let doc = doc.lock();
    assert_eq!(doc.text_content(widget.container()), "x");
}

#[tokio::test]
async fn test_newer_update_supersedes_pending_activation() {
    let h = Harness::new(1);
    let loader = Arc::new(RecordingLoader::new(h.log.clone()).with_delay_ms("slow.js", 150));
    let pipeline = ScriptActivationPipeline::new(loader.clone(), Arc::new(log_registry(&h.log)));
    let events = Arc::new(CollectingEventSink::new());
    let widget = h.widget(0, pipeline).with_events(events.clone());

    let old = widget.update(h.notebook.html(
        0,
        r#"<script src="slow.js"></script><script>log old</script>"#,
        1.0,
    ));
    let new = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        widget
            .update(h.notebook.html(0, "<script>log new</script>", 2.0))
            .await
    };
    let (old, new) = futures::future::join(old, new).await;

    assert_superseded(&old);
    let old_report = assert_applied(&old).activation.as_ref().unwrap();
    assert!(old_report.superseded);
    assert_eq!(old_report.abandoned(), 1);
    assert_hooks_completed(&new);

    assert_eq!(
        h.log.entries(),
        vec!["inline:new", "bonds:0", "typeset", "remote:slow.js"]
    );
    assert_eq!(h.bonds.call_count(), 1);
    assert_eq!(h.math.call_count(), 1);
    assert_eq!(events.events_of_type(names::UPDATE_SUPERSEDED).len(), 1);
    assert_eq!(
        h.notebook.output_html(&widget),
        "<assignee></assignee><div><script>log new</script></div>"
    );
}

#[tokio::test]
async fn test_completion_signal_reaches_bond_connector() {
    let h = Harness::new(1);
    let bonds = Arc::new(RecordingBondConnector::new(h.log.clone()).waiting_for_completion());
    let widget = h
        .notebook
        .mount(0, plain_pipeline(&h.log))
        .unwrap()
        .with_collaborators(h.collaborators().with_bonds(bonds.clone()));
    let (trigger, signal) = completion_pair();
    let envelope = h
        .notebook
        .html(0, "<script>log ran</script>", 1.0)
        .with_all_completed(signal);

    let update = widget.update(envelope);
    let complete = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        h.log.push("all-completed");
        trigger.complete();
    };
    let (outcome, ()) = futures::future::join(update, complete).await;

    assert_hooks_completed(&outcome);
    assert_eq!(
        h.log.entries(),
        vec!["inline:ran", "all-completed", "bonds:0", "typeset"]
    );
}

#[tokio::test]
async fn test_with_config_uses_layout_metrics() {
    let h = Harness::new(2);
    let config = RenderConfig::default();
    let viewport = Arc::new(TrackedViewport::new());
    let widget = h
        .widget(0, plain_pipeline(&h.log))
        .with_config(&config)
        .with_viewport(viewport.clone());
    h.notebook.focus(1).unwrap();

    widget.update(h.notebook.plain(0, "one\ntwo\nthree", 1.0)).await;

    assert_eq!(viewport.scroll_offset(), 3.0 * config.layout.line_height_px);
}

#[tokio::test]
async fn test_applied_outcome_serializes() {
    let h = Harness::new(1);
    let widget = h.widget(0, plain_pipeline(&h.log));

    let outcome = widget.update(h.notebook.plain(0, "x", 1.0)).await;
    let value = serde_json::to_value(&outcome).unwrap();

    assert_eq!(value["status"], "applied");
    assert_eq!(value["strategy"], "preformatted");
    assert_eq!(value["scroll"]["decision"], "no_focus");
    assert_eq!(value["hooks"]["hooks"], "not_applicable");
}

#[test]
fn test_widget_debug_is_compact() {
    let h = Harness::new(1);
    let widget = h
        .notebook
        .mount(0, ScriptActivationPipeline::new(Arc::new(NoOpScriptLoader), Arc::new(HandlerRegistry::new())))
        .unwrap();
    let debug = format!("{widget:?}");
    assert!(debug.starts_with("OutputWidget"));
    assert!(debug.contains("generation: 0"));
}
