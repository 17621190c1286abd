//! Background metadata lookup.
//!
//! Searching an online movie database blocks, so [`LookupWorker`] runs the
//! searches on a small pool of named threads. The owning thread submits
//! queries and drains outcomes with [`LookupWorker::poll`] or
//! [`LookupWorker::tick`], once per turn of its event loop. Nothing on the
//! owning thread blocks for longer than the configured poll interval: a full
//! queue makes [`LookupWorker::submit`] fail with
//! [`ReelError::LookupBusy`]. Forms and neurons stay on the owning thread;
//! only queries and outcomes cross the channels.
//!
//! ```
//! use std::time::Duration;
//! use reel::lookup::{LookupQuery, LookupWorker, MetadataSource, MovieMetadata};
//!
//! struct Echo;
//!
//! impl MetadataSource for Echo {
//!     fn search(&self, query: &LookupQuery) -> Result<Vec<MovieMetadata>, String> {
//!         Ok(vec![MovieMetadata::new(query.title.clone(), 1972)])
//!     }
//! }
//!
//! let worker = LookupWorker::start(Echo, 1).unwrap();
//! let id = worker.submit(LookupQuery::new("Solaris")).unwrap();
//! let outcome = worker.wait(Duration::from_secs(5)).unwrap();
//! assert_eq!(outcome.id, id);
//! worker.shutdown();
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{AppContext, DEFAULT_POLL_INTERVAL_MS};
use crate::error::{ReelError, Result};

/// Bound on queued queries; `submit` reports busy beyond it.
pub const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupQuery {
    pub title: String,
    pub year: Option<i64>,
}

impl LookupQuery {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            year: None,
        }
    }

    #[must_use]
    pub fn with_year(mut self, year: i64) -> Self {
        self.year = Some(year);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieMetadata {
    pub title: String,
    pub year: i64,
    #[serde(default)]
    pub directors: Vec<String>,
    #[serde(default)]
    pub minutes: Option<u32>,
    #[serde(default)]
    pub overview: String,
}

impl MovieMetadata {
    pub fn new(title: impl Into<String>, year: i64) -> Self {
        Self {
            title: title.into(),
            year,
            directors: Vec::new(),
            minutes: None,
            overview: String::new(),
        }
    }
}

/// A blocking search against some movie database.
pub trait MetadataSource: Send + Sync {
    fn search(&self, query: &LookupQuery) -> std::result::Result<Vec<MovieMetadata>, String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
pub struct LookupOutcome {
    pub id: RequestId,
    pub query: LookupQuery,
    pub result: Result<Vec<MovieMetadata>>,
}

enum LookupMsg {
    Search { id: RequestId, query: LookupQuery },
    Shutdown,
}

/// Handle to a running pool of lookup threads.
pub struct LookupWorker {
    sender: mpsc::SyncSender<LookupMsg>,
    outcomes: mpsc::Receiver<LookupOutcome>,
    handles: Vec<JoinHandle<()>>,
    next_id: AtomicU64,
    poll_interval: Duration,
}

impl std::fmt::Debug for LookupWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupWorker")
            .field("workers", &self.handles.len())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl LookupWorker {
    /// Spawn `workers` threads (at least one) searching `source`.
    ///
    /// # Errors
    ///
    /// [`ReelError::Io`] if a thread cannot be spawned. Threads already
    /// started are shut down first.
    pub fn start<S: MetadataSource + 'static>(source: S, workers: usize) -> Result<Self> {
        Self::spawn(source, workers, Duration::from_millis(DEFAULT_POLL_INTERVAL_MS))
    }

    /// Spawn a pool sized and paced by the `[lookup]` section of `context`.
    pub fn from_context<S: MetadataSource + 'static>(source: S, context: &AppContext) -> Result<Self> {
        Self::spawn(source, context.lookup.workers, context.poll_interval())
    }

    fn spawn<S: MetadataSource + 'static>(
        source: S,
        workers: usize,
        poll_interval: Duration,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::sync_channel::<LookupMsg>(CHANNEL_CAPACITY);
        let (out_tx, out_rx) = mpsc::channel::<LookupOutcome>();
        let source = Arc::new(source);
        let rx = Arc::new(Mutex::new(rx));

        let mut pool = Self {
            sender: tx,
            outcomes: out_rx,
            handles: Vec::new(),
            next_id: AtomicU64::new(1),
            poll_interval,
        };
        for index in 0..workers.max(1) {
            let source = Arc::clone(&source);
            let rx = Arc::clone(&rx);
            let out_tx = out_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("reel-lookup-{index}"))
                .spawn(move || lookup_loop(source.as_ref(), &rx, &out_tx))?;
            pool.handles.push(handle);
        }
        tracing::debug!(message = "lookup.start", workers = pool.handles.len());
        Ok(pool)
    }

    /// Queue a search without blocking.
    ///
    /// # Errors
    ///
    /// [`ReelError::LookupBusy`] if [`CHANNEL_CAPACITY`] searches are already
    /// waiting; [`ReelError::LookupWorkerGone`] if every worker has exited.
    pub fn submit(&self, query: LookupQuery) -> Result<RequestId> {
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        match self.sender.try_send(LookupMsg::Search { id, query }) {
            Ok(()) => Ok(id),
            Err(mpsc::TrySendError::Full(_)) => {
                tracing::warn!(message = "lookup.busy", id = id.raw());
                Err(ReelError::LookupBusy)
            }
            Err(mpsc::TrySendError::Disconnected(_)) => Err(ReelError::LookupWorkerGone),
        }
    }

    /// Every outcome that has arrived, without blocking.
    pub fn poll(&self) -> Vec<LookupOutcome> {
        self.outcomes.try_iter().collect()
    }

    /// Block until one outcome arrives or `timeout` passes.
    pub fn wait(&self, timeout: Duration) -> Option<LookupOutcome> {
        self.outcomes.recv_timeout(timeout).ok()
    }

    /// One event-loop turn: wait at most the poll interval for an outcome,
    /// then take everything else that has arrived.
    pub fn tick(&self) -> Vec<LookupOutcome> {
        let mut outcomes: Vec<LookupOutcome> = self.wait(self.poll_interval).into_iter().collect();
        outcomes.extend(self.poll());
        outcomes
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// Stop the workers once queued searches are done, and join them.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        for _ in 0..self.handles.len() {
            let _ = self.sender.send(LookupMsg::Shutdown);
        }
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for LookupWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lookup_loop(
    source: &dyn MetadataSource,
    rx: &Mutex<mpsc::Receiver<LookupMsg>>,
    out_tx: &mpsc::Sender<LookupOutcome>,
) {
    loop {
        let msg = {
            let Ok(guard) = rx.lock() else { return };
            match guard.recv() {
                Ok(msg) => msg,
                Err(_) => return,
            }
        };
        let (id, query) = match msg {
            LookupMsg::Search { id, query } => (id, query),
            LookupMsg::Shutdown => return,
        };

        let result = source.search(&query).map_err(|message| {
            tracing::warn!(message = "lookup.failed", id = id.raw(), error = %message);
            ReelError::Lookup { message }
        });
        if out_tx.send(LookupOutcome { id, query, result }).is_err() {
            return;
        }
    }
}
