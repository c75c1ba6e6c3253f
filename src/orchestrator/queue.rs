//! Bounded FIFO of pending tasks
//!
//! Wraps a `tokio::sync::mpsc` channel. Enqueue uses `try_send` and dequeue
//! uses `try_recv`, so neither side ever waits. The receiver half is kept
//! behind a short-lived internal mutex so any number of poll handlers can
//! dequeue concurrently without callers taking a lock themselves.

use crate::protocol::Task;
use std::sync::Mutex;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};

/// Why a task could not be enqueued
#[derive(Debug, PartialEq)]
pub enum EnqueueError {
    /// Queue is at capacity; the task is handed back
    Full(Task),
    /// Receiver half is gone
    Closed(Task),
}

pub struct TaskQueue {
    sender: mpsc::Sender<Task>,
    receiver: Mutex<mpsc::Receiver<Task>>,
    capacity: usize,
}

impl TaskQueue {
    /// Create a queue holding at most `capacity` tasks (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            sender,
            receiver: Mutex::new(receiver),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of queued tasks
    pub fn len(&self) -> usize {
        self.capacity - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.sender.capacity() == 0
    }

    /// Enqueue without waiting
    pub fn try_enqueue(&self, task: Task) -> Result<(), EnqueueError> {
        self.sender.try_send(task).map_err(|e| match e {
            TrySendError::Full(task) => EnqueueError::Full(task),
            TrySendError::Closed(task) => EnqueueError::Closed(task),
        })
    }

    /// Single non-blocking dequeue attempt; `None` when empty
    pub fn try_dequeue(&self) -> Option<Task> {
        let mut receiver = match self.receiver.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match receiver.try_recv() {
            Ok(task) => Some(task),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}
