//! Recording test doubles for loaders, evaluators and collaborators.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::activation::{HandlerRegistry, ScriptLoader, ScriptRequest};
use crate::collaborators::{BondConnector, MathTypesetter, RequestHandle};
use crate::core::CompletionSignal;
use crate::dom::{Document, NodeId, SharedDocument};
use crate::errors::{LoadError, ScriptError, TypesetError};

/// A shared, ordered log of what ran.
///
/// Loaders, handlers and collaborators from this module push entries like
/// `remote:a.js`, `inline:hello`, `bonds:<n>` and `typeset`, so a test can
/// assert on the interleaving of all of them at once.
#[derive(Debug, Clone, Default)]
pub struct ScriptLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl ScriptLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// Returns all entries in order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing was logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Clears the log.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// A loader that records requests, with per-source delays and failures.
///
/// Logs `remote:<src>` on success and `remote-failed:<src>` on failure,
/// after the delay has elapsed. Also tracks how many loads overlapped.
#[derive(Debug, Default)]
pub struct RecordingLoader {
    log: ScriptLog,
    delays: HashMap<String, Duration>,
    failing: HashSet<String>,
    requests: Mutex<Vec<ScriptRequest>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: AtomicUsize,
}

struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RecordingLoader {
    /// Creates a loader that writes to `log`.
    #[must_use]
    pub fn new(log: ScriptLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    /// Delays loads of `src`.
    #[must_use]
    pub fn with_delay(mut self, src: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(src.into(), delay);
        self
    }

    /// Delays loads of `src` by `ms` milliseconds.
    #[must_use]
    pub fn with_delay_ms(self, src: impl Into<String>, ms: u64) -> Self {
        self.with_delay(src, Duration::from_millis(ms))
    }

    /// Makes loads of `src` fail.
    #[must_use]
    pub fn failing(mut self, src: impl Into<String>) -> Self {
        self.failing.insert(src.into());
        self
    }

    /// Returns every request received, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<ScriptRequest> {
        self.requests.lock().clone()
    }

    /// Returns the sources requested, in order.
    #[must_use]
    pub fn requested_sources(&self) -> Vec<String> {
        self.requests.lock().iter().map(|r| r.src.clone()).collect()
    }

    /// Returns the number of requests received.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Returns the largest number of loads that were in flight together.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScriptLoader for RecordingLoader {
    async fn load(&self, request: &ScriptRequest) -> Result<(), LoadError> {
        self.requests.lock().push(request.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(Arc::clone(&self.in_flight));

        if let Some(delay) = self.delays.get(&request.src) {
            tokio::time::sleep(*delay).await;
        }

        if self.failing.contains(&request.src) {
            self.log.push(format!("remote-failed:{}", request.src));
            return Err(LoadError::network(&request.src, "connection refused"));
        }
        self.log.push(format!("remote:{}", request.src));
        Ok(())
    }
}

/// Builds a handler registry whose handlers write to `log`.
///
/// | Script text     | Effect                                             |
/// |-----------------|----------------------------------------------------|
/// | `log <msg>`     | logs `inline:<msg>`                                |
/// | `fail <msg>`    | logs `inline-failed:<msg>` and returns an error    |
/// | `panic <msg>`   | panics with `<msg>`                                |
/// | `emit <tag> <text>` | returns a new `<tag>` element containing `<text>` |
/// | `text <text>`   | returns a bare text node                           |
/// | `whoami`        | logs `current:<index>` of the running script       |
#[must_use]
pub fn log_registry(log: &ScriptLog) -> HandlerRegistry {
    let on_log = log.clone();
    let on_fail = log.clone();
    let on_whoami = log.clone();

    HandlerRegistry::new()
        .with_handler("log", move |_, msg| {
            on_log.push(format!("inline:{msg}"));
            Ok(None)
        })
        .with_handler("fail", move |_, msg| {
            on_fail.push(format!("inline-failed:{msg}"));
            Err(ScriptError::raised(msg))
        })
        .with_handler("panic", |_, msg| panic!("{msg}"))
        .with_handler("emit", |ctx, arg| {
            let (tag, text) = arg.split_once(char::is_whitespace).unwrap_or((arg, ""));
            let doc = ctx.document_mut();
            let element = doc.create_element(tag);
            let content = doc.create_text(text.trim());
            doc.append_child(element, content)
                .map_err(|e| ScriptError::raised(e.to_string()))?;
            Ok(Some(element))
        })
        .with_handler("text", |ctx, arg| {
            Ok(Some(ctx.document_mut().create_text(arg)))
        })
        .with_handler("whoami", move |ctx, _| {
            on_whoami.push(format!("current:{}", ctx.current_script().index()));
            Ok(None)
        })
}

/// A bond connector that records its calls.
#[derive(Debug, Default)]
pub struct RecordingBondConnector {
    log: ScriptLog,
    roots: Mutex<Vec<NodeId>>,
    fail: bool,
    wait_for_completion: bool,
}

impl RecordingBondConnector {
    /// Creates a connector that logs `bonds:<bond count>` to `log`.
    #[must_use]
    pub fn new(log: ScriptLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    /// Creates a connector whose every call fails.
    #[must_use]
    pub fn failing(log: ScriptLog) -> Self {
        Self {
            fail: true,
            ..Self::new(log)
        }
    }

    /// Makes the connector wait for the "all completed" signal first.
    #[must_use]
    pub fn waiting_for_completion(mut self) -> Self {
        self.wait_for_completion = true;
        self
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.roots.lock().len()
    }

    /// Returns the roots passed to each call.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        self.roots.lock().clone()
    }
}

#[async_trait]
impl BondConnector for RecordingBondConnector {
    async fn connect(
        &self,
        document: &SharedDocument,
        root: NodeId,
        all_completed: &CompletionSignal,
        _requests: &RequestHandle,
    ) -> anyhow::Result<()> {
        if self.wait_for_completion {
            all_completed.wait().await;
        }
        self.roots.lock().push(root);
        let inputs = document.lock().elements_by_tag(root, "bond").len();
        self.log.push(format!("bonds:{inputs}"));
        if self.fail {
            anyhow::bail!("bond connection refused");
        }
        Ok(())
    }
}

/// A typesetter that records its calls.
#[derive(Debug, Default)]
pub struct RecordingTypesetter {
    log: ScriptLog,
    calls: AtomicUsize,
    fail: bool,
}

impl RecordingTypesetter {
    /// Creates a typesetter that logs `typeset` to `log`.
    #[must_use]
    pub fn new(log: ScriptLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    /// Creates a typesetter whose every call fails.
    #[must_use]
    pub fn failing(log: ScriptLog) -> Self {
        Self {
            fail: true,
            ..Self::new(log)
        }
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MathTypesetter for RecordingTypesetter {
    fn typeset(&self, _document: &mut Document, _root: NodeId) -> Result<(), TypesetError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.push("typeset");
        if self.fail {
            return Err(TypesetError::new("undefined control sequence"));
        }
        Ok(())
    }
}
