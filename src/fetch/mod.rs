pub mod client;

use crate::config::FetchConfig;
use crate::model::election::ConstituencyResult;
use crate::model::ModelError;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error requesting {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("Unexpected response from {url}: {reason}")]
    Schema { url: String, reason: String },
    #[error("Giving up on {target} after {attempts} attempts: {last}")]
    Exhausted {
        target: String,
        attempts: u32,
        last: Box<FetchError>,
    },
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("Fetch task ended abnormally: {0}")]
    Producer(String),
}

impl FetchError {
    /// Transport failures and server-side statuses are worth another try;
    /// a response that parses wrongly will parse wrongly again.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Http { .. } => true,
            FetchError::Status { status, .. } => *status >= 500 || *status == 429,
            FetchError::Schema { .. }
            | FetchError::Exhausted { .. }
            | FetchError::Model(_)
            | FetchError::Producer(_) => false,
        }
    }
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Somewhere constituency results can be fetched from.
#[async_trait]
pub trait ConstituencySource: Send + Sync {
    /// Ballot paper ids for every constituency contested in `election`.
    async fn ballot_ids(&self, election: &str) -> FetchResult<Vec<String>>;

    async fn constituency(&self, ballot_paper_id: &str) -> FetchResult<ConstituencyResult>;
}

/// Run `op`, retrying retryable failures up to `max_retries` more times.
pub async fn with_retries<T, F, Fut>(
    target: &str,
    max_retries: u32,
    backoff: Duration,
    mut op: F,
) -> FetchResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = FetchResult<T>>,
{
    let mut attempt: u32 = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) if attempt > max_retries => {
                return Err(FetchError::Exhausted {
                    target: target.to_string(),
                    attempts: attempt,
                    last: Box::new(e),
                })
            }
            Err(e) => {
                warn!(request = %target, attempt, error = %e, "request failed, retrying");
                tokio::time::sleep(backoff * attempt).await;
                attempt += 1;
            }
        }
    }
}

/// Receiving end of a running fetch: results in completion order, plus the
/// task producing them.
pub struct FetchHandle {
    pub results: mpsc::Receiver<FetchResult<ConstituencyResult>>,
    pub task: JoinHandle<()>,
}

impl FetchHandle {
    /// Drain every result, stopping at the first error.
    ///
    /// A closed channel only counts as complete if the producing task also
    /// finished normally.
    pub async fn collect(mut self) -> FetchResult<Vec<ConstituencyResult>> {
        let mut records = Vec::new();
        while let Some(result) = self.results.recv().await {
            match result {
                Ok(record) => records.push(record),
                Err(e) => {
                    self.task.abort();
                    return Err(e);
                }
            }
        }
        self.task
            .await
            .map_err(|e| FetchError::Producer(e.to_string()))?;
        Ok(records)
    }
}

/// Fetch every ballot in `ballot_ids` on a background task.
///
/// At most `config.concurrency` requests are in flight at once. The first
/// request to exhaust its retries is forwarded as an `Err` and ends the task.
/// Dropping the receiver also ends it.
pub fn spawn_fetch<S>(source: Arc<S>, ballot_ids: Vec<String>, config: &FetchConfig) -> FetchHandle
where
    S: ConstituencySource + 'static,
{
    let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
    let concurrency = config.concurrency.max(1);
    let max_retries = config.max_retries;
    let backoff = config.retry_backoff;

    let task = tokio::spawn(async move {
        let mut results = stream::iter(ballot_ids)
            .map(move |id| {
                let source = Arc::clone(&source);
                async move {
                    with_retries(&id, max_retries, backoff, || source.constituency(&id)).await
                }
            })
            .buffer_unordered(concurrency);

        while let Some(result) = results.next().await {
            let failed = result.is_err();
            if tx.send(result).await.is_err() {
                debug!("result receiver dropped, stopping fetch");
                return;
            }
            if failed {
                return;
            }
        }
    });

    FetchHandle { results: rx, task }
}

/// Feed already-fetched records through the same channel interface.
///
/// Each record is re-validated, so a hand-edited dump fails the same way a
/// malformed API response would.
pub fn replay(records: Vec<ConstituencyResult>, capacity: usize) -> FetchHandle {
    let (tx, rx) = mpsc::channel(capacity.max(1));

    let task = tokio::spawn(async move {
        for record in records {
            let result = record.validate().map(|_| record).map_err(FetchError::from);
            let failed = result.is_err();
            if tx.send(result).await.is_err() || failed {
                return;
            }
        }
    });

    FetchHandle { results: rx, task }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::aggregate::tests::record;
    use crate::model::region::Region;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// In-memory source that fails each ballot a configured number of times.
    pub(crate) struct ScriptedSource {
        records: HashMap<String, ConstituencyResult>,
        failures: Mutex<HashMap<String, u32>>,
        pub(crate) calls: AtomicU32,
    }

    impl ScriptedSource {
        pub(crate) fn new(records: Vec<(&str, ConstituencyResult)>) -> Self {
            Self {
                records: records
                    .into_iter()
                    .map(|(id, r)| (id.to_string(), r))
                    .collect(),
                failures: Mutex::new(HashMap::new()),
                calls: AtomicU32::new(0),
            }
        }

        pub(crate) fn failing(self, id: &str, times: u32) -> Self {
            self.failures.lock().unwrap().insert(id.to_string(), times);
            self
        }
    }

    #[async_trait]
    impl ConstituencySource for ScriptedSource {
        async fn ballot_ids(&self, _election: &str) -> FetchResult<Vec<String>> {
            let mut ids: Vec<_> = self.records.keys().cloned().collect();
            ids.sort();
            Ok(ids)
        }

        async fn constituency(&self, ballot_paper_id: &str) -> FetchResult<ConstituencyResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            {
                let mut failures = self.failures.lock().unwrap();
                if let Some(remaining) = failures.get_mut(ballot_paper_id) {
                    if *remaining > 0 {
                        *remaining -= 1;
                        return Err(FetchError::Status {
                            url: ballot_paper_id.to_string(),
                            status: 503,
                        });
                    }
                }
            }
            self.records
                .get(ballot_paper_id)
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    url: ballot_paper_id.to_string(),
                    status: 404,
                })
        }
    }

    fn quick_config() -> FetchConfig {
        FetchConfig {
            retry_backoff: Duration::from_millis(1),
            ..FetchConfig::default()
        }
    }

    #[tokio::test]
    async fn retries_until_success() {
        let attempts = AtomicU32::new(0);

        let value = with_retries("ballot", 3, Duration::from_millis(1), || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(FetchError::Status {
                        url: "ballot".to_string(),
                        status: 502,
                    })
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausting_retries_reports_attempt_count() {
        let attempts = AtomicU32::new(0);

        let err = with_retries::<(), _, _>("ballot", 3, Duration::from_millis(1), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async {
                Err(FetchError::Status {
                    url: "ballot".to_string(),
                    status: 500,
                })
            }
        })
        .await
        .unwrap_err();

        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        match err {
            FetchError::Exhausted { attempts, .. } => assert_eq!(attempts, 4),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn schema_errors_are_not_retried() {
        let attempts = AtomicU32::new(0);

        let err = with_retries::<(), _, _>("ballot", 3, Duration::from_millis(1), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async {
                Err(FetchError::Schema {
                    url: "ballot".to_string(),
                    reason: "missing field `post`".to_string(),
                })
            }
        })
        .await
        .unwrap_err();

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(matches!(err, FetchError::Schema { .. }));
    }

    #[tokio::test]
    async fn spawn_fetch_delivers_every_record() {
        let source = Arc::new(
            ScriptedSource::new(vec![
                ("a", record(Region::England, &[("A", 1)], &[("A", 1)])),
                ("b", record(Region::Wales, &[("B", 2)], &[("B", 1)])),
                ("c", record(Region::Scotland, &[("C", 3)], &[("C", 1)])),
            ])
            .failing("b", 2),
        );
        let ids = source.ballot_ids("any").await.unwrap();

        let records = spawn_fetch(Arc::clone(&source), ids, &quick_config())
            .collect()
            .await
            .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(source.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn spawn_fetch_stops_on_exhausted_request() {
        let source = Arc::new(
            ScriptedSource::new(vec![
                ("a", record(Region::England, &[("A", 1)], &[("A", 1)])),
                ("b", record(Region::Wales, &[("B", 2)], &[("B", 1)])),
            ])
            .failing("b", 10),
        );
        let ids = source.ballot_ids("any").await.unwrap();

        let err = spawn_fetch(source, ids, &quick_config())
            .collect()
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Exhausted { ref target, .. } if target == "b"));
    }

    #[tokio::test]
    async fn collect_rejects_records_from_a_panicked_producer() {
        let (tx, rx) = mpsc::channel(4);
        let task = tokio::spawn(async move {
            tx.send(Ok(record(Region::England, &[("A", 1)], &[("A", 1)])))
                .await
                .ok();
            panic!("fetch task blew up");
        });

        let err = FetchHandle { results: rx, task }
            .collect()
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Producer(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn collect_rejects_a_cancelled_producer() {
        let (tx, rx) = mpsc::channel::<FetchResult<ConstituencyResult>>(4);
        let task = tokio::spawn(async move {
            let _tx = tx;
            std::future::pending::<()>().await;
        });
        task.abort();

        let err = FetchHandle { results: rx, task }
            .collect()
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Producer(_)));
    }

    #[tokio::test]
    async fn replay_rejects_invalid_records() {
        let mut broken = record(Region::England, &[("A", 1)], &[("A", 1)]);
        broken.parties.clear();

        let err = replay(vec![broken], 4).collect().await.unwrap_err();
        assert!(matches!(err, FetchError::Model(_)));
    }
}
