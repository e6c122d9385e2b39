//! Scripted graph store for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::client::GraphError;
use crate::record::RawRecord;
use crate::session::{AccessMode, GraphStore, SessionExecutor, StoreSession};
use crate::statement::Statement;

type Response = Result<Vec<RawRecord>, GraphError>;

/// Log sink for asserting on emitted events.
#[derive(Clone, Default)]
pub(crate) struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Route events on the current thread here until the guard drops.
    pub(crate) fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Replays queued responses, one per statement, and counts sessions.
///
/// Like the real store, a session keeps its transaction open while a run is
/// in flight, and `close` rolls back one left behind by a dropped run.
#[derive(Clone, Default)]
pub(crate) struct ScriptedStore {
    shared: Arc<Shared>,
    fail_close: bool,
    delay: Option<Duration>,
    txn_open: bool,
}

#[derive(Default)]
struct Shared {
    responses: Mutex<VecDeque<Response>>,
    modes: Mutex<Vec<AccessMode>>,
    statements: Mutex<Vec<Statement>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    rolled_back_on_close: AtomicUsize,
}

impl ScriptedStore {
    pub(crate) fn new(responses: Vec<Response>) -> Self {
        let store = Self::default();
        *store.shared.responses.lock().unwrap() = responses.into();
        store
    }

    pub(crate) fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn executor(&self) -> SessionExecutor {
        SessionExecutor::new(Arc::new(self.clone()))
    }

    pub(crate) fn modes(&self) -> Vec<AccessMode> {
        self.shared.modes.lock().unwrap().clone()
    }

    pub(crate) fn statements(&self) -> Vec<Statement> {
        self.shared.statements.lock().unwrap().clone()
    }

    pub(crate) fn opened(&self) -> usize {
        self.shared.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn closed(&self) -> usize {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Transactions still open when their session was closed.
    pub(crate) fn rolled_back_on_close(&self) -> usize {
        self.shared.rolled_back_on_close.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GraphStore for ScriptedStore {
    async fn open_session(&self, mode: AccessMode) -> Result<Box<dyn StoreSession>, GraphError> {
        self.shared.opened.fetch_add(1, Ordering::SeqCst);
        self.shared.modes.lock().unwrap().push(mode);
        Ok(Box::new(Self {
            txn_open: false,
            ..self.clone()
        }))
    }
}

#[async_trait]
impl StoreSession for ScriptedStore {
    async fn run(&mut self, statement: &Statement) -> Result<Vec<RawRecord>, GraphError> {
        self.shared.statements.lock().unwrap().push(statement.clone());
        self.txn_open = true;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.shared.responses.lock().unwrap().pop_front();
        self.txn_open = false;
        next.unwrap_or_else(|| Err(GraphError::Connection("no scripted response".to_string())))
    }

    async fn close(self: Box<Self>) -> Result<(), GraphError> {
        self.shared.closed.fetch_add(1, Ordering::SeqCst);
        if self.txn_open {
            self.shared.rolled_back_on_close.fetch_add(1, Ordering::SeqCst);
        }
        if self.fail_close {
            return Err(GraphError::Connection("close failed".to_string()));
        }
        Ok(())
    }
}
