//! Watch job registry.
//!
//! Owns the background tasks watching payment confirmations, keyed by
//! job id. A lost payment is rebuilt through the wallet seam and the
//! replacement transaction gets a fresh watch, so a single `start_watch`
//! follows the payment chain until something confirms or a rebuild
//! fails. Remaining tasks are aborted when the manager drops.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use permaflow_protocol::messages::WatchTxRequest;

use crate::confirm::{self, ChainQuery, WatchConfig, WatchOutcome};
use crate::retry::{self, TxPoster};

/// Buffered job events before watchers start back-pressuring.
const EVENT_BUFFER: usize = 64;

/// Outcome notifications for watch jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    Confirmed {
        job_id: Uuid,
        tx_id: String,
        payment_tx: String,
    },
    Lost {
        job_id: Uuid,
        tx_id: String,
    },
    /// A lost payment was reposted; a new watch for `new_tx_id` is
    /// already running.
    Retried {
        job_id: Uuid,
        tx_id: String,
        new_tx_id: String,
    },
    RetryFailed {
        job_id: Uuid,
        tx_id: String,
        error: String,
    },
    WatchFailed {
        job_id: Uuid,
        tx_id: String,
        error: String,
    },
}

struct RunningJob {
    tx_id: String,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

type JobMap = Arc<Mutex<HashMap<Uuid, RunningJob>>>;

/// Everything a watch task needs, shareable across tasks so a lost
/// payment's replacement can be watched without going back through the
/// manager.
struct WatchContext<Q, P> {
    query: Arc<Q>,
    poster: Arc<P>,
    config: WatchConfig,
    jobs: JobMap,
    events_tx: mpsc::Sender<JobEvent>,
}

impl<Q, P> Clone for WatchContext<Q, P> {
    fn clone(&self) -> Self {
        Self {
            query: Arc::clone(&self.query),
            poster: Arc::clone(&self.poster),
            config: self.config.clone(),
            jobs: Arc::clone(&self.jobs),
            events_tx: self.events_tx.clone(),
        }
    }
}

/// Registry of payment watch jobs.
pub struct JobManager<Q, P> {
    ctx: WatchContext<Q, P>,
    events_rx: Mutex<Option<mpsc::Receiver<JobEvent>>>,
}

impl<Q, P> JobManager<Q, P>
where
    Q: ChainQuery + 'static,
    P: TxPoster + 'static,
{
    pub fn new(query: Arc<Q>, poster: Arc<P>, config: WatchConfig) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        Self {
            ctx: WatchContext {
                query,
                poster,
                config,
                jobs: Arc::new(Mutex::new(HashMap::new())),
                events_tx,
            },
            events_rx: Mutex::new(Some(events_rx)),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&self) -> Option<mpsc::Receiver<JobEvent>> {
        self.events_rx.lock().unwrap().take()
    }

    /// Starts watching the payment for `request` and returns the job id.
    pub fn start_watch(&self, request: WatchTxRequest) -> Uuid {
        spawn_watch(self.ctx.clone(), request)
    }

    /// Stops a job, abandoning its watch.
    pub fn stop(&self, job_id: Uuid) {
        if let Some(job) = self.ctx.jobs.lock().unwrap().remove(&job_id) {
            debug!(%job_id, tx = %job.tx_id, "watch stopped");
            job.cancel.cancel();
            job.task.abort();
        }
    }

    /// Number of live jobs.
    pub fn len(&self) -> usize {
        self.ctx.jobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ctx.jobs.lock().unwrap().is_empty()
    }
}

impl<Q, P> Drop for JobManager<Q, P> {
    fn drop(&mut self) {
        for (job_id, job) in self.ctx.jobs.lock().unwrap().drain() {
            debug!(%job_id, "aborting watch on shutdown");
            job.cancel.cancel();
            job.task.abort();
        }
    }
}

fn spawn_watch<Q, P>(ctx: WatchContext<Q, P>, request: WatchTxRequest) -> Uuid
where
    Q: ChainQuery + 'static,
    P: TxPoster + 'static,
{
    let job_id = Uuid::new_v4();
    let cancel = CancellationToken::new();
    let tx_id = request.tx_id.clone();

    // Register under the lock so the task cannot deregister itself
    // before the entry exists.
    let jobs = Arc::clone(&ctx.jobs);
    let mut registry = jobs.lock().unwrap();
    let task_cancel = cancel.clone();
    let task_ctx = ctx.clone();
    let task = tokio::spawn(async move {
        run_watch(&task_ctx, job_id, request, task_cancel).await;
        task_ctx.jobs.lock().unwrap().remove(&job_id);
    });

    debug!(%job_id, tx = %tx_id, "watch started");
    registry.insert(
        job_id,
        RunningJob {
            tx_id,
            cancel,
            task,
        },
    );
    job_id
}

async fn run_watch<Q, P>(
    ctx: &WatchContext<Q, P>,
    job_id: Uuid,
    request: WatchTxRequest,
    cancel: CancellationToken,
) where
    Q: ChainQuery + 'static,
    P: TxPoster + 'static,
{
    let outcome = tokio::select! {
        _ = cancel.cancelled() => return,
        outcome = confirm::watch(ctx.query.as_ref(), &request, &ctx.config) => outcome,
    };

    match outcome {
        Ok(WatchOutcome::Confirmed { payment_tx }) => {
            info!(%job_id, tx = %request.tx_id, payment = %payment_tx, "payment confirmed");
            let _ = ctx
                .events_tx
                .send(JobEvent::Confirmed {
                    job_id,
                    tx_id: request.tx_id,
                    payment_tx,
                })
                .await;
        }
        Ok(WatchOutcome::Lost) => {
            warn!(%job_id, tx = %request.tx_id, "payment lost");
            let _ = ctx
                .events_tx
                .send(JobEvent::Lost {
                    job_id,
                    tx_id: request.tx_id.clone(),
                })
                .await;
            handle_lost(ctx, job_id, request).await;
        }
        Err(e) => {
            warn!(%job_id, tx = %request.tx_id, error = %e, "watch failed");
            let _ = ctx
                .events_tx
                .send(JobEvent::WatchFailed {
                    job_id,
                    tx_id: request.tx_id,
                    error: e.to_string(),
                })
                .await;
        }
    }
}

async fn handle_lost<Q, P>(ctx: &WatchContext<Q, P>, job_id: Uuid, request: WatchTxRequest)
where
    Q: ChainQuery + 'static,
    P: TxPoster + 'static,
{
    match retry::retry_payment(ctx.poster.as_ref(), &request).await {
        Ok(posted) => {
            let _ = ctx
                .events_tx
                .send(JobEvent::Retried {
                    job_id,
                    tx_id: request.tx_id.clone(),
                    new_tx_id: posted.tx_id.clone(),
                })
                .await;
            // Follow the replacement transaction with a fresh watch.
            spawn_watch(
                ctx.clone(),
                WatchTxRequest {
                    tx_id: posted.tx_id,
                    operation: request.operation,
                    address: request.address,
                    tags: posted.tags,
                },
            );
        }
        Err(e) => {
            warn!(%job_id, tx = %request.tx_id, error = %e, "payment retry failed");
            let _ = ctx
                .events_tx
                .send(JobEvent::RetryFailed {
                    job_id,
                    tx_id: request.tx_id,
                    error: e.to_string(),
                })
                .await;
        }
    }
}
