//! The topic-routed `EventBus` (§4.1).

use crate::error::BusError;
use crate::message::{Message, MessageCategory, Topic};
use layer0::id::TaskId;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::{mpsc, Mutex};

/// Depth of each subscriber's private mailbox and each task's streaming
/// queue. Beyond this, the bus drops newest and counts the overflow (§4.1).
const QUEUE_CAPACITY: usize = 1024;

/// A handler attached via [`EventBus::subscribe`].
struct Subscription {
    predicate: Box<dyn Fn(&Message) -> bool + Send + Sync>,
    tx: mpsc::Sender<Message>,
}

/// A transformer attached via [`EventBus::register_transformer`].
struct Transformer {
    category: MessageCategory,
    /// `None` matches every topic within `category`.
    topic: Option<String>,
    order: i32,
    apply: Box<dyn Fn(Message) -> Option<Message> + Send + Sync>,
}

struct TaskQueue {
    tx: mpsc::Sender<Message>,
    rx: Option<mpsc::Receiver<Message>>,
    overflow: Arc<AtomicU64>,
    terminated: bool,
}

/// Typed message bus with topic routing, transformers, per-subscriber
/// mailboxes, and a per-task streaming queue terminated by `TaskResponse`.
///
/// Cheap to clone (`Arc` inside); clones share the same subscriber list,
/// transformer chain, and task queues.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<RwLock<Vec<Subscription>>>,
    transformers: Arc<RwLock<Vec<Transformer>>>,
    tasks: Arc<Mutex<HashMap<TaskId, TaskQueue>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(Vec::new())),
            transformers: Arc::new(RwLock::new(Vec::new())),
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register a handler that fires for every message matching `predicate`.
    ///
    /// The handler runs on a dedicated background task so a slow or failing
    /// handler only delays itself, never other subscribers or `publish`
    /// callers (§4.1: "must never block the bus"). Messages for one
    /// subscriber are delivered in publish order (FIFO).
    pub fn subscribe<P, H, Fut>(&self, predicate: P, handler: H)
    where
        P: Fn(&Message) -> bool + Send + Sync + 'static,
        H: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<Message>(QUEUE_CAPACITY);
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                handler(message).await;
            }
        });
        self.subscribers.write().unwrap().push(Subscription {
            predicate: Box::new(predicate),
            tx,
        });
    }

    /// Register a transformer for `(category, topic)`. `topic = None` matches
    /// every topic in the category. Transformers at the same point run in
    /// ascending `order`; a transformer may return a replacement message or
    /// `None` to drop the message before it reaches subscribers/task queues.
    pub fn register_transformer<F>(
        &self,
        category: MessageCategory,
        topic: Option<Topic>,
        order: i32,
        transform: F,
    ) where
        F: Fn(Message) -> Option<Message> + Send + Sync + 'static,
    {
        let mut transformers = self.transformers.write().unwrap();
        transformers.push(Transformer {
            category,
            topic: topic.map(|t| t.as_str().to_string()),
            order,
            apply: Box::new(transform),
        });
        transformers.sort_by_key(|t| t.order);
    }

    /// Explicitly open a task's streaming queue before the first message is
    /// published for it. Idempotent — calling twice is a no-op.
    pub async fn register_task(&self, task_id: TaskId) {
        let mut tasks = self.tasks.lock().await;
        tasks.entry(task_id).or_insert_with(|| {
            let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
            TaskQueue {
                tx,
                rx: Some(rx),
                overflow: Arc::new(AtomicU64::new(0)),
                terminated: false,
            }
        });
    }

    /// Publish a message. Non-blocking: delivery to subscribers and the
    /// per-task queue happens without the caller awaiting downstream work.
    ///
    /// Returns [`BusError::TaskAlreadyTerminated`] if a `TaskResponse` was
    /// already published for this task (§3/§8 single-terminator invariant).
    pub async fn publish(&self, message: Message) -> Result<(), BusError> {
        let task_id = message.task_id.clone();

        {
            let mut tasks = self.tasks.lock().await;
            let queue = tasks.entry(task_id.clone()).or_insert_with(|| {
                let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
                TaskQueue {
                    tx,
                    rx: Some(rx),
                    overflow: Arc::new(AtomicU64::new(0)),
                    terminated: false,
                }
            });
            if queue.terminated {
                return Err(BusError::TaskAlreadyTerminated(task_id.to_string()));
            }
        }

        let message = match self.apply_transformers(message) {
            Some(m) => m,
            None => return Ok(()), // dropped by a transformer
        };

        // Per-task streaming queue.
        {
            let mut tasks = self.tasks.lock().await;
            if let Some(queue) = tasks.get_mut(&task_id) {
                if queue.tx.try_send(message.clone()).is_err() {
                    queue.overflow.fetch_add(1, Ordering::Relaxed);
                }
                if message.is_task_response() {
                    queue.terminated = true;
                }
            }
        }

        // Subscribers: non-blocking hand-off to each matching mailbox.
        let subscribers = self.subscribers.read().unwrap();
        for sub in subscribers.iter() {
            if (sub.predicate)(&message) {
                let _ = sub.tx.try_send(message.clone());
            }
        }

        Ok(())
    }

    fn apply_transformers(&self, mut message: Message) -> Option<Message> {
        let transformers = self.transformers.read().unwrap();
        for t in transformers.iter() {
            if t.category != message.category {
                continue;
            }
            if let Some(topic) = &t.topic {
                if topic != message.topic.as_str() {
                    continue;
                }
            }
            match (t.apply)(message) {
                Some(m) => message = m,
                None => return None,
            }
        }
        Some(message)
    }

    /// Take ownership of a task's streaming queue receiver. Yields messages
    /// in publish order until the `TaskResponse` for `task_id` is observed;
    /// `done` then drains and closes it. Returns `None` if the receiver was
    /// already taken (a task may only be streamed by one consumer).
    pub async fn get(&self, task_id: &TaskId) -> Option<TaskStream> {
        let mut tasks = self.tasks.lock().await;
        let queue = tasks.entry(task_id.clone()).or_insert_with(|| {
            let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
            TaskQueue {
                tx,
                rx: Some(rx),
                overflow: Arc::new(AtomicU64::new(0)),
                terminated: false,
            }
        });
        let rx = queue.rx.take()?;
        Some(TaskStream {
            rx,
            overflow: Arc::clone(&queue.overflow),
            done: false,
        })
    }

    /// Drain and close a task's streaming queue, dropping any buffered
    /// messages. Safe to call whether or not `get` was ever called.
    pub async fn done(&self, task_id: &TaskId) {
        self.tasks.lock().await.remove(task_id);
    }

    /// Number of messages dropped for `task_id` due to backpressure.
    pub async fn overflow_count(&self, task_id: &TaskId) -> u64 {
        self.tasks
            .lock()
            .await
            .get(task_id)
            .map(|q| q.overflow.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Whether a `TaskResponse` has already been published for `task_id`.
    pub async fn is_terminated(&self, task_id: &TaskId) -> bool {
        self.tasks
            .lock()
            .await
            .get(task_id)
            .map(|q| q.terminated)
            .unwrap_or(false)
    }
}

/// A consumer handle over one task's ordered message stream.
pub struct TaskStream {
    rx: mpsc::Receiver<Message>,
    overflow: Arc<AtomicU64>,
    done: bool,
}

impl TaskStream {
    /// Await the next message. Returns `None` once the stream has yielded
    /// its `TaskResponse` and been marked done, or the bus side was dropped.
    pub async fn recv(&mut self) -> Option<Message> {
        if self.done {
            return None;
        }
        let message = self.rx.recv().await?;
        if message.is_task_response() {
            self.done = true;
        }
        Some(message)
    }

    /// Messages dropped for this task due to backpressure so far.
    pub fn overflow_count(&self) -> u64 {
        self.overflow.load(Ordering::Relaxed)
    }
}
