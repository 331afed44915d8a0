//! `SandboxManager` & `LoopPool` — per-sandbox single-worker affinity (§4.5).
//!
//! MCP clients use async generators and scoped cancellation; entering and
//! exiting them on different tasks/loops is undefined behavior. The fix:
//! a fixed pool of dedicated worker threads, each running its own
//! single-threaded Tokio runtime, with every sandbox id pinned to exactly
//! one worker by a stable hash. Every operation submitted for a given
//! sandbox (`connect`, `list_tools`, `call_tool`, `cleanup`) runs on that
//! worker's runtime, on the same task, for the lifetime of the process.

use crate::error::SandboxError;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

/// Stable identity of a worker's dedicated runtime. Workers never die
/// mid-process, so this is also a stable identity for the worker's single
/// event loop and the one task that drains its queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerId(pub usize);

tokio::task_local! {
    static CURRENT: (WorkerId, String);
}

type Job = Box<dyn FnOnce(WorkerId) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

struct Submission {
    sandbox_id: String,
    job: Job,
}

struct Worker {
    tx: Option<mpsc::UnboundedSender<Submission>>,
    handle: Option<std::thread::JoinHandle<()>>,
}

/// A pool of `N` dedicated worker-loop threads, each owning single-threaded
/// affinity for the sandboxes hashed onto it.
pub struct SandboxManager {
    workers: Vec<Worker>,
    live: Mutex<HashSet<String>>,
}

impl SandboxManager {
    /// Start a pool of `worker_count` dedicated worker threads (default
    /// small, e.g. 4, per §4.5). Each gets its own current-thread Tokio
    /// runtime and a FIFO mailbox.
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let mut workers = Vec::with_capacity(worker_count);
        for idx in 0..worker_count {
            let (tx, mut rx) = mpsc::unbounded_channel::<Submission>();
            let worker_id = WorkerId(idx);
            let handle = std::thread::Builder::new()
                .name(format!("neuron-sandbox-worker-{idx}"))
                .spawn(move || {
                    let rt = tokio::runtime::Builder::new_current_thread()
                        .enable_all()
                        .build()
                        .expect("failed to build sandbox worker runtime");
                    rt.block_on(async move {
                        while let Some(submission) = rx.recv().await {
                            let sandbox_id = submission.sandbox_id.clone();
                            CURRENT
                                .scope((worker_id, sandbox_id), (submission.job)(worker_id))
                                .await;
                        }
                    });
                })
                .expect("failed to spawn sandbox worker thread");
            workers.push(Worker {
                tx: Some(tx),
                handle: Some(handle),
            });
        }
        Self {
            workers,
            live: Mutex::new(HashSet::new()),
        }
    }

    fn worker_index_for(&self, sandbox_id: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        sandbox_id.hash(&mut hasher);
        (hasher.finish() as usize) % self.workers.len()
    }

    /// Mark a sandbox as live, tracked for orderly shutdown.
    pub fn register_sandbox(&self, sandbox_id: impl Into<String>) {
        self.live.lock().unwrap().insert(sandbox_id.into());
    }

    /// Remove a sandbox from the live set (normally called after `cleanup`
    /// completes).
    pub fn unregister_sandbox(&self, sandbox_id: &str) {
        self.live.lock().unwrap().remove(sandbox_id);
    }

    /// Currently-registered sandbox ids.
    pub fn live_sandboxes(&self) -> Vec<String> {
        self.live.lock().unwrap().iter().cloned().collect()
    }

    /// Run `f` on the single worker pinned to `sandbox_id`. The closure
    /// receives the [`WorkerId`] it actually ran on, for tests/telemetry to
    /// assert affinity.
    ///
    /// If called from inside a job already running for this exact
    /// `sandbox_id` (re-entrant call, e.g. a tool calling back into its own
    /// sandbox), `f` runs inline on the current task instead of being
    /// submitted — submitting would deadlock, since the one task that would
    /// drain the queue is the task awaiting this call.
    pub async fn run_on_sandbox<F, Fut, T>(
        &self,
        sandbox_id: &str,
        f: F,
    ) -> Result<T, SandboxError>
    where
        F: FnOnce(WorkerId) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        if let Ok((worker_id, current_sandbox)) = CURRENT.try_with(|v| v.clone()) {
            if current_sandbox == sandbox_id {
                return Ok(f(worker_id).await);
            }
        }

        let idx = self.worker_index_for(sandbox_id);
        let (reply_tx, reply_rx) = oneshot::channel::<T>();
        let job: Job = Box::new(move |worker_id| {
            Box::pin(async move {
                let result = f(worker_id).await;
                let _ = reply_tx.send(result);
            })
        });

        self.workers[idx]
            .tx
            .as_ref()
            .ok_or_else(|| SandboxError::WorkerGone(sandbox_id.to_string()))?
            .send(Submission {
                sandbox_id: sandbox_id.to_string(),
                job,
            })
            .map_err(|_| SandboxError::WorkerGone(sandbox_id.to_string()))?;

        reply_rx
            .await
            .map_err(|_| SandboxError::WorkerGone(sandbox_id.to_string()))
    }

    /// Shut down every worker. Submits no further jobs will be accepted;
    /// callers should run each live sandbox's `cleanup` via
    /// `run_on_sandbox` before calling this (§4.5 orderly shutdown).
    pub fn shutdown(mut self) {
        for worker in &mut self.workers {
            // Dropping the sender closes the channel; the worker's
            // `rx.recv()` returns `None` and the runtime loop exits.
            worker.tx.take();
            if let Some(handle) = worker.handle.take() {
                let _ = handle.join();
            }
        }
    }
}
