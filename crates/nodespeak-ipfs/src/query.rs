//! Query layer
//!
//! Declarative data-fetching over the resolver: per-key UI state
//! (`is_loading`/`is_error`), request deduplication, and a staleness policy.
//! Requests are keyed by `["ipfs", cid]` (single file) or
//! `["ipfs", "batch", cid...]` (one logical unit of several files); at most
//! one resolution is in flight per key, and concurrent requests for the same
//! key share the single result.
//!
//! Per-key lifecycle: `Idle` (no CID) -> `Loading` -> `Success | Error`,
//! re-entered per key. An `Unavailable` resolution is a *success* carrying
//! no data (`blob: None`, `is_error: false`); `is_error` is reserved for
//! fetcher-level faults. Callers detect missing content by checking for
//! `None` data, not the error flag.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use nodespeak_core::Cid;
use tokio::sync::{Mutex, watch};
use tracing::{debug, trace};

use crate::cache::Content;
use crate::error::IpfsError;

/// Identifier under which the query layer indexes cached and in-flight
/// requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    /// Key for a single file: `["ipfs", cid]`.
    pub fn file(cid: &Cid) -> Self {
        Self(vec!["ipfs".to_string(), cid.as_str().to_string()])
    }

    /// Key for a batch fetched as one logical unit:
    /// `["ipfs", "batch", cid1, cid2, ...]`.
    ///
    /// The `batch` segment keeps composite keys from colliding with
    /// single-file keys.
    pub fn files(cids: &[Cid]) -> Self {
        let mut segments = vec!["ipfs".to_string(), "batch".to_string()];
        segments.extend(cids.iter().map(|cid| cid.as_str().to_string()));
        Self(segments)
    }

    /// The key segments, in order.
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Fetch seam the query layer runs on.
///
/// [`crate::resolve::ContentResolver`] is the production implementation.
/// `Ok(None)` means the content resolved as unavailable — reported as data,
/// not through the error channel. `Err` is the fault channel surfaced as
/// `is_error`.
#[async_trait]
pub trait QueryFetcher: Send + Sync {
    /// Resolve a CID to content.
    async fn fetch(&self, cid: &Cid) -> Result<Option<Content>, IpfsError>;

    /// Resolve a CID bypassing any lower-level caching.
    ///
    /// Defaults to a plain fetch; cache-aware fetchers override this so an
    /// explicit refetch actually reaches the network.
    async fn refetch(&self, cid: &Cid) -> Result<Option<Content>, IpfsError> {
        self.fetch(cid).await
    }
}

/// Query-layer configuration.
#[derive(Debug, Clone, Default)]
pub struct QueryConfig {
    /// How long a completed result stays fresh. `None` means forever —
    /// the default, since content addressing makes entries permanently
    /// valid.
    pub stale_time: Option<Duration>,
}

impl QueryConfig {
    /// Set a finite staleness window.
    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = Some(stale_time);
        self
    }
}

/// UI-facing state of a single-file query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileQuery {
    /// Resolved content; `None` both before resolution and when the content
    /// is unavailable.
    pub blob: Option<Content>,
    /// True while the first resolution for this key is in flight.
    pub is_loading: bool,
    /// True while any resolution for this key is in flight.
    pub is_fetching: bool,
    /// True when the fetcher itself failed — NOT set by an unavailable
    /// resolution.
    pub is_error: bool,
}

/// UI-facing state of a batch query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchQuery {
    /// Per-CID resolved content, in request order.
    pub blobs: Vec<Option<Content>>,
    /// True while the first resolution for this key is in flight.
    pub is_loading: bool,
    /// True while any resolution for this key is in flight.
    pub is_fetching: bool,
    /// True when the fetcher failed for any member of the batch.
    pub is_error: bool,
}

#[derive(Debug, Clone)]
enum QueryResult {
    Single(Option<Content>),
    Batch(Vec<Option<Content>>),
    Failed(String),
}

#[derive(Default)]
struct QuerySlot {
    result: Option<QueryResult>,
    fetched_at: Option<Instant>,
    /// Present while a resolution is in flight; waiters subscribe to it.
    inflight: Option<watch::Receiver<bool>>,
}

#[derive(Clone)]
enum QueryWork {
    Single(Cid),
    Batch(Vec<Cid>),
}

enum Step {
    Done(Option<QueryResult>, bool),
    Join(watch::Receiver<bool>),
    Start(watch::Sender<bool>),
}

/// Deduplicating query client.
///
/// One instance per session; holds per-key state and guarantees at most one
/// in-flight resolution per key, so sibling consumers asking for the same
/// CID concurrently share a single network request.
pub struct QueryClient<F: QueryFetcher> {
    fetcher: Arc<F>,
    config: QueryConfig,
    slots: Mutex<HashMap<QueryKey, QuerySlot>>,
}

impl<F: QueryFetcher> QueryClient<F> {
    /// Create a client with the default (never-stale) configuration.
    pub fn new(fetcher: Arc<F>) -> Self {
        Self::with_config(fetcher, QueryConfig::default())
    }

    /// Create a client with an explicit configuration.
    pub fn with_config(fetcher: Arc<F>, config: QueryConfig) -> Self {
        Self {
            fetcher,
            config,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Query a single file.
    ///
    /// A `None` CID is the idle state: returns
    /// `{blob: None, is_loading: false, is_error: false}` immediately and
    /// issues no fetch at all. Otherwise resolves (or reuses) the result
    /// under `["ipfs", cid]` and returns the settled state.
    pub async fn file_query(&self, cid: Option<&Cid>) -> FileQuery {
        let Some(cid) = cid else {
            return FileQuery::default();
        };
        if cid.is_empty() {
            return FileQuery::default();
        }

        let key = QueryKey::file(cid);
        let (result, is_fetching) = self
            .run(key, QueryWork::Single(cid.clone()), false)
            .await;
        Self::to_file_query(result, is_fetching)
    }

    /// Explicit manual re-fetch, bypassing both slot freshness and the
    /// content cache underneath.
    pub async fn refetch_file(&self, cid: &Cid) -> FileQuery {
        if cid.is_empty() {
            return FileQuery::default();
        }

        let key = QueryKey::file(cid);
        let (result, is_fetching) = self
            .run(key, QueryWork::Single(cid.clone()), true)
            .await;
        Self::to_file_query(result, is_fetching)
    }

    /// Query several files as one logical unit under
    /// `["ipfs", "batch", ...]`.
    pub async fn batch_query(&self, cids: &[Cid]) -> BatchQuery {
        if cids.is_empty() {
            return BatchQuery::default();
        }

        let key = QueryKey::files(cids);
        let (result, is_fetching) = self
            .run(key, QueryWork::Batch(cids.to_vec()), false)
            .await;
        Self::to_batch_query(result, is_fetching)
    }

    /// Current state for a key without triggering any fetch.
    ///
    /// Reports `is_loading: true` while the first resolution is in flight.
    pub async fn snapshot(&self, key: &QueryKey) -> FileQuery {
        let slots = self.slots.lock().await;
        match slots.get(key) {
            Some(slot) => Self::to_file_query(slot.result.clone(), slot.inflight.is_some()),
            None => FileQuery::default(),
        }
    }

    /// Drop all per-key state — the query-layer analogue of a page reload.
    pub async fn clear(&self) {
        self.slots.lock().await.clear();
    }

    fn is_fresh(&self, slot: &QuerySlot) -> bool {
        match (self.config.stale_time, slot.fetched_at) {
            (Some(stale_time), Some(at)) => at.elapsed() <= stale_time,
            // No stale time configured: results stay fresh forever.
            (None, Some(_)) => true,
            _ => false,
        }
    }

    async fn run(&self, key: QueryKey, work: QueryWork, force: bool) -> (Option<QueryResult>, bool) {
        let mut force = force;
        loop {
            let step = {
                let mut slots = self.slots.lock().await;
                let slot = slots.entry(key.clone()).or_default();

                // A dead sender with the marker still set means the flight
                // owner was cancelled before settling; clear it so the next
                // caller can take over instead of waiting forever.
                if let Some(rx) = &slot.inflight
                    && rx.has_changed().is_err()
                {
                    slot.inflight = None;
                }

                if let Some(rx) = &slot.inflight {
                    Step::Join(rx.clone())
                } else if !force && slot.result.is_some() && self.is_fresh(slot) {
                    trace!(key = %key, "Query served from settled state");
                    Step::Done(slot.result.clone(), false)
                } else {
                    let (tx, rx) = watch::channel(false);
                    slot.inflight = Some(rx);
                    Step::Start(tx)
                }
            };

            match step {
                Step::Done(result, is_fetching) => return (result, is_fetching),
                Step::Join(mut rx) => {
                    // Another caller owns the flight; any outcome of
                    // changed() means it settled (or was dropped), so loop
                    // and read the slot again. Joining an in-flight fetch
                    // satisfies a refetch: it IS a fresh network call.
                    let _ = rx.changed().await;
                    force = false;
                }
                Step::Start(tx) => {
                    debug!(key = %key, "Query fetch started");
                    let result = self.execute(&work, force).await;

                    let settled = {
                        let mut slots = self.slots.lock().await;
                        let slot = slots.entry(key.clone()).or_default();
                        slot.result = Some(result);
                        slot.fetched_at = Some(Instant::now());
                        slot.inflight = None;
                        slot.result.clone()
                    };

                    // Wake joined waiters after the slot is settled.
                    let _ = tx.send(true);
                    return (settled, false);
                }
            }
        }
    }

    async fn execute(&self, work: &QueryWork, force: bool) -> QueryResult {
        match work {
            QueryWork::Single(cid) => {
                let outcome = if force {
                    self.fetcher.refetch(cid).await
                } else {
                    self.fetcher.fetch(cid).await
                };
                match outcome {
                    Ok(data) => QueryResult::Single(data),
                    Err(e) => QueryResult::Failed(e.to_string()),
                }
            }
            QueryWork::Batch(cids) => {
                let mut blobs = Vec::with_capacity(cids.len());
                for cid in cids {
                    match self.fetcher.fetch(cid).await {
                        Ok(data) => blobs.push(data),
                        Err(e) => return QueryResult::Failed(e.to_string()),
                    }
                }
                QueryResult::Batch(blobs)
            }
        }
    }

    fn to_file_query(result: Option<QueryResult>, is_fetching: bool) -> FileQuery {
        match result {
            Some(QueryResult::Single(blob)) => FileQuery {
                blob,
                is_loading: false,
                is_fetching,
                is_error: false,
            },
            Some(QueryResult::Failed(_)) => FileQuery {
                blob: None,
                is_loading: false,
                is_fetching,
                is_error: true,
            },
            // A batch result under a file key cannot happen through the
            // public API; report it as a fault rather than fake data.
            Some(QueryResult::Batch(_)) => FileQuery {
                blob: None,
                is_loading: false,
                is_fetching,
                is_error: true,
            },
            None => FileQuery {
                blob: None,
                is_loading: is_fetching,
                is_fetching,
                is_error: false,
            },
        }
    }

    fn to_batch_query(result: Option<QueryResult>, is_fetching: bool) -> BatchQuery {
        match result {
            Some(QueryResult::Batch(blobs)) => BatchQuery {
                blobs,
                is_loading: false,
                is_fetching,
                is_error: false,
            },
            Some(QueryResult::Failed(_)) | Some(QueryResult::Single(_)) => BatchQuery {
                blobs: Vec::new(),
                is_loading: false,
                is_fetching,
                is_error: true,
            },
            None => BatchQuery {
                blobs: Vec::new(),
                is_loading: is_fetching,
                is_fetching,
                is_error: false,
            },
        }
    }
}
