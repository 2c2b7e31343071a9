use super::*;
use crate::dom::{Document, NodeId, SharedDocument};
use crate::events::{names, CollectingEventSink};
use crate::gate::GenerationCounter;
use crate::testing::{assert_no_failures, assert_outcome_kinds, log_registry, RecordingLoader, ScriptLog};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn output(markup: &str) -> (SharedDocument, NodeId) {
    let mut doc = Document::new();
    let root = doc.create_element("div");
    doc.append_child(doc.body(), root).unwrap();
    doc.set_inner_html(root, markup).unwrap();
    (doc.into_shared(), root)
}

fn pipeline(loader: &Arc<RecordingLoader>, log: &ScriptLog) -> ScriptActivationPipeline {
    ScriptActivationPipeline::new(loader.clone(), Arc::new(log_registry(log)))
}

async fn run(pipeline: &ScriptActivationPipeline, document: &SharedDocument, root: NodeId) -> ActivationReport {
    let queue = ActivationQueue::collect(&document.lock(), root);
    pipeline.activate(document, root, queue).await
}

#[tokio::test]
async fn test_scripts_run_in_document_order() {
    let log = ScriptLog::new();
    let loader = Arc::new(
        RecordingLoader::new(log.clone())
            .with_delay_ms("slow.js", 40)
            .with_delay_ms("fast.js", 1),
    );
    let (doc, root) = output(
        r#"<script src="slow.js"></script>
           <script>log a</script>
           <div><script src="fast.js"></script></div>
           <script>log b</script>"#,
    );

    let report = run(&pipeline(&loader, &log), &doc, root).await;

    assert_eq!(
        log.entries(),
        vec!["remote:slow.js", "inline:a", "remote:fast.js", "inline:b"]
    );
    assert_outcome_kinds(&report, &["loaded", "evaluated", "loaded", "evaluated"]);
    assert_eq!(loader.max_in_flight(), 1);
    assert!(!report.superseded);
}

#[tokio::test]
async fn test_empty_queue_completes_once() {
    let log = ScriptLog::new();
    let loader = Arc::new(RecordingLoader::new(log.clone()));
    let events = Arc::new(CollectingEventSink::new());
    let pipeline = pipeline(&loader, &log).with_events(events.clone());
    let (doc, root) = output("<p>no scripts here</p>");

    let report = run(&pipeline, &doc, root).await;

    assert!(report.is_empty());
    assert!(log.is_empty());
    assert_eq!(events.event_types(), vec![names::ACTIVATION_COMPLETED]);
}

#[tokio::test]
async fn test_all_failing_queue_completes_once() {
    let log = ScriptLog::new();
    let loader = Arc::new(RecordingLoader::new(log.clone()).failing("gone.js"));
    let events = Arc::new(CollectingEventSink::new());
    let pipeline = pipeline(&loader, &log).with_events(events.clone());
    let (doc, root) = output(
        r#"<script>fail first</script><script src="gone.js"></script><script>panic second</script>"#,
    );

    let report = run(&pipeline, &doc, root).await;

    assert_eq!(report.len(), 3);
    assert_eq!(report.failures().len(), 3);
    assert_eq!(events.events_of_type(names::ACTIVATION_COMPLETED).len(), 1);
}

#[tokio::test]
async fn test_failures_do_not_stop_the_run() {
    let log = ScriptLog::new();
    let loader = Arc::new(RecordingLoader::new(log.clone()).failing("broken.js"));
    let (doc, root) = output(
        r#"<script>log a</script>
           <script>fail oops</script>
           <script src="broken.js"></script>
           <script>panic boom</script>
           <script>nonsense</script>
           <script>log b</script>"#,
    );

    let report = run(&pipeline(&loader, &log), &doc, root).await;

    assert_eq!(
        log.entries(),
        vec!["inline:a", "inline-failed:oops", "remote-failed:broken.js", "inline:b"]
    );
    assert_outcome_kinds(
        &report,
        &[
            "evaluated",
            "evaluation_failed",
            "load_failed",
            "evaluation_failed",
            "evaluation_failed",
            "evaluated",
        ],
    );
    assert_eq!(
        report.outcomes[3],
        ScriptOutcome::EvaluationFailed {
            error: "Script panicked: boom".to_string()
        }
    );
}

#[tokio::test]
async fn test_remote_script_already_in_head_is_not_fetched() {
    let log = ScriptLog::new();
    let loader = Arc::new(RecordingLoader::new(log.clone()));
    let (doc, root) = output(r#"<script src="https://cdn.example/plot.js"></script><script>log after</script>"#);
    {
        let mut d = doc.lock();
        let existing = d.create_element("script");
        d.set_attr(existing, "src", "https://cdn.example/plot.js").unwrap();
        let head = d.head();
        d.append_child(head, existing).unwrap();
    }

    let report = run(&pipeline(&loader, &log), &doc, root).await;

    assert_eq!(loader.request_count(), 0);
    assert_eq!(
        report.outcomes[0],
        ScriptOutcome::AlreadyLoaded {
            src: "https://cdn.example/plot.js".to_string()
        }
    );
    assert_eq!(log.entries(), vec!["inline:after"]);
    let d = doc.lock();
    assert_eq!(d.elements_by_tag(d.head(), "script").len(), 1);
}

#[tokio::test]
async fn test_second_render_reuses_loaded_script() {
    let log = ScriptLog::new();
    let loader = Arc::new(RecordingLoader::new(log.clone()));
    let pipeline = pipeline(&loader, &log);
    let markup = r#"<script src="lib.js"></script><script src="lib.js"></script>"#;
    let (doc, root) = output(markup);

    let first = run(&pipeline, &doc, root).await;
    doc.lock().set_inner_html(root, markup).unwrap();
    let second = run(&pipeline, &doc, root).await;

    assert_eq!(loader.requested_sources(), vec!["lib.js"]);
    assert_outcome_kinds(&first, &["loaded", "already_loaded"]);
    assert_outcome_kinds(&second, &["already_loaded", "already_loaded"]);
}

#[tokio::test]
async fn test_remote_script_is_added_to_head() {
    let log = ScriptLog::new();
    let loader = Arc::new(RecordingLoader::new(log.clone()));
    let (doc, root) = output(r#"<script type="module" src="widget.mjs"></script><script src="classic.js"></script>"#);

    run(&pipeline(&loader, &log), &doc, root).await;

    let d = doc.lock();
    assert_eq!(
        d.inner_html(d.head()),
        r#"<script src="widget.mjs" type="module"></script><script src="classic.js" type="text/javascript"></script>"#
    );
    let kinds: Vec<ScriptKind> = loader.requests().into_iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![ScriptKind::Module, ScriptKind::Classic]);
}

#[tokio::test]
async fn test_returned_element_is_inserted_after_script() {
    let log = ScriptLog::new();
    let loader = Arc::new(RecordingLoader::new(log.clone()));
    let (doc, root) = output("<script>emit span hi</script><p>tail</p>");

    let report = run(&pipeline(&loader, &log), &doc, root).await;

    assert_no_failures(&report);
    assert_eq!(
        doc.lock().inner_html(root),
        "<script>emit span hi</script><span>hi</span><p>tail</p>"
    );
}

#[tokio::test]
async fn test_returned_text_node_is_not_inserted() {
    let log = ScriptLog::new();
    let loader = Arc::new(RecordingLoader::new(log.clone()));
    let (doc, root) = output("<script>text loose</script>");

    let report = run(&pipeline(&loader, &log), &doc, root).await;

    assert_eq!(report.outcomes, vec![ScriptOutcome::Evaluated { inserted: None }]);
    assert_eq!(doc.lock().inner_html(root), "<script>text loose</script>");
}

#[tokio::test]
async fn test_current_script_tracks_running_node() {
    let log = ScriptLog::new();
    let loader = Arc::new(RecordingLoader::new(log.clone()));
    let (doc, root) = output(r#"<script>whoami</script><script src="x.js"></script><script>whoami</script>"#);
    let scripts = doc.lock().elements_by_tag(root, "script");

    run(&pipeline(&loader, &log), &doc, root).await;

    assert_eq!(
        log.entries(),
        vec![
            format!("current:{}", scripts[0].index()),
            "remote:x.js".to_string(),
            format!("current:{}", scripts[2].index()),
        ]
    );
    assert_eq!(doc.lock().current_script(root), Some(scripts[2]));
}

#[tokio::test]
async fn test_empty_src_runs_inline() {
    let log = ScriptLog::new();
    let loader = Arc::new(RecordingLoader::new(log.clone()));
    let (doc, root) = output(r#"<script src="  ">log inline</script>"#);

    run(&pipeline(&loader, &log), &doc, root).await;

    assert_eq!(loader.request_count(), 0);
    assert_eq!(log.entries(), vec!["inline:inline"]);
}

#[tokio::test]
async fn test_load_timeout_counts_as_failure() {
    let log = ScriptLog::new();
    let loader = Arc::new(RecordingLoader::new(log.clone()).with_delay_ms("hang.js", 2_000));
    let pipeline = pipeline(&loader, &log).with_load_timeout(Some(Duration::from_millis(20)));
    let (doc, root) = output(r#"<script src="hang.js"></script><script>log next</script>"#);

    let report = run(&pipeline, &doc, root).await;

    assert_eq!(
        report.outcomes[0],
        ScriptOutcome::LoadFailed {
            src: "hang.js".to_string(),
            error: "Timed out loading script 'hang.js' after 20ms".to_string(),
        }
    );
    assert_eq!(log.entries(), vec!["inline:next"]);
}

#[tokio::test]
async fn test_superseded_run_abandons_remaining_nodes() {
    let log = ScriptLog::new();
    let loader = Arc::new(RecordingLoader::new(log.clone()));
    let generations = GenerationCounter::new();
    let ticket = generations.advance();
    let registry = {
        let generations = generations.clone();
        log_registry(&log).with_handler("supersede", move |_, _| {
            generations.advance();
            Ok(None)
        })
    };
    let pipeline = ScriptActivationPipeline::new(loader.clone(), Arc::new(registry));
    let (doc, root) = output(
        r#"<script>log a</script><script>supersede</script><script src="late.js"></script><script>log b</script>"#,
    );

    let queue = ActivationQueue::collect(&doc.lock(), root);
    let report = pipeline.activate_guarded(&doc, root, queue, &ticket).await;

    assert!(report.superseded);
    assert_eq!(report.abandoned(), 2);
    assert_outcome_kinds(&report, &["evaluated", "evaluated", "abandoned", "abandoned"]);
    assert_eq!(log.entries(), vec!["inline:a"]);
    assert_eq!(loader.request_count(), 0);
}

#[tokio::test]
async fn test_events_follow_each_node() {
    let log = ScriptLog::new();
    let loader = Arc::new(RecordingLoader::new(log.clone()).failing("bad.js"));
    let events = Arc::new(CollectingEventSink::new());
    let pipeline = pipeline(&loader, &log).with_events(events.clone());
    let (doc, root) = output(
        r#"<script src="ok.js"></script><script src="bad.js"></script><script>log x</script><script>fail y</script>"#,
    );

    run(&pipeline, &doc, root).await;

    assert_eq!(
        events.event_types(),
        vec![
            names::SCRIPT_LOADED,
            names::SCRIPT_LOAD_FAILED,
            names::SCRIPT_EVALUATED,
            names::SCRIPT_EVAL_FAILED,
            names::ACTIVATION_COMPLETED,
        ]
    );
    let (_, completed) = &events.events_of_type(names::ACTIVATION_COMPLETED)[0];
    let completed = completed.as_ref().unwrap();
    assert_eq!(completed["scripts"], 4);
    assert_eq!(completed["failures"], 2);
}

#[tokio::test]
async fn test_start_runs_until_first_remote_load() {
    let log = ScriptLog::new();
    let loader = Arc::new(RecordingLoader::new(log.clone()));
    let pipeline = pipeline(&loader, &log);
    let (doc, root) = output(
        r#"<script>log a</script><script src="net.js"></script><script>log b</script>"#,
    );
    let ticket = GenerationCounter::new().advance();

    let run = {
        let mut d = doc.lock();
        let queue = ActivationQueue::collect(&d, root);
        pipeline.start(&mut d, root, queue, &ticket)
    };

    assert_eq!(log.entries(), vec!["inline:a"]);
    assert_eq!(run.pending().map(|r| r.src.as_str()), Some("net.js"));
    assert_eq!(run.remaining(), 1);
    assert_eq!(loader.request_count(), 0);
    assert!(doc.lock().head_has_script("net.js"));

    let report = pipeline.resume(&doc, root, run, &ticket).await;

    assert_eq!(log.entries(), vec!["inline:a", "remote:net.js", "inline:b"]);
    assert_outcome_kinds(&report, &["evaluated", "loaded", "evaluated"]);
}

#[tokio::test]
async fn test_start_skips_scripts_already_in_head() {
    let log = ScriptLog::new();
    let loader = Arc::new(RecordingLoader::new(log.clone()));
    let pipeline = pipeline(&loader, &log);
    let (doc, root) = output(r#"<script src="lib.js"></script><script>log after</script>"#);
    {
        let mut d = doc.lock();
        let existing = d.create_element("script");
        d.set_attr(existing, "src", "lib.js").unwrap();
        let head = d.head();
        d.append_child(head, existing).unwrap();
    }
    let ticket = GenerationCounter::new().advance();

    let run = {
        let mut d = doc.lock();
        let queue = ActivationQueue::collect(&d, root);
        pipeline.start(&mut d, root, queue, &ticket)
    };

    assert!(run.pending().is_none());
    assert_eq!(run.remaining(), 0);
    assert_eq!(run.outcomes().len(), 2);
    assert_eq!(log.entries(), vec!["inline:after"]);
}
