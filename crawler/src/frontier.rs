use grawler_core::Task;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Notify;
use tokio::time::{sleep, timeout, Duration};

/// Bounded multi-producer multi-consumer FIFO of crawl tasks.
///
/// `pop` doubles as the drain detector: it resolves to `None` once the
/// queue is empty and no popped task is still being processed, or once the
/// frontier was closed and what remained has been drained. Workers must
/// pair every successful `pop` with a `complete` call.
pub struct Frontier {
    queue: Mutex<VecDeque<Task>>,
    notify: Notify,
    capacity: usize,
    in_flight: AtomicUsize,
    closed: AtomicBool,
}

impl Frontier {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            capacity,
            in_flight: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    fn enqueue(&self, task: Task) -> Result<(), Task> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(task);
        }
        let mut queue = self.queue.lock();
        if queue.len() >= self.capacity {
            return Err(task);
        }
        queue.push_back(task);
        drop(queue);
        self.notify.notify_waiters();
        Ok(())
    }

    /// Best-effort enqueue for discovered child links. Fails when the
    /// frontier is full or closed; the caller drops the task.
    pub fn try_push(&self, task: Task) -> bool {
        self.enqueue(task).is_ok()
    }

    /// Enqueue that must land, used by the politeness requeue. Naps and
    /// retries on a full queue instead of blocking the worker thread.
    pub async fn push(&self, task: Task) {
        let mut pending = task;
        loop {
            match self.enqueue(pending) {
                Ok(()) => return,
                Err(_) if self.closed.load(Ordering::SeqCst) => return,
                Err(task) => pending = task,
            }
            sleep(Duration::from_millis(10)).await;
        }
    }

    /// Next task in FIFO order, or `None` once the crawl is drained.
    pub async fn pop(&self) -> Option<Task> {
        loop {
            let popped = self.queue.lock().pop_front();
            if let Some(task) = popped {
                self.in_flight.fetch_add(1, Ordering::SeqCst);
                return Some(task);
            }
            if self.closed.load(Ordering::SeqCst) || self.in_flight.load(Ordering::SeqCst) == 0 {
                return None;
            }
            // Wake on new work or the last in-flight task finishing; the
            // timeout covers wakeups lost between the check and the wait.
            let _ = timeout(Duration::from_millis(50), self.notify.notified()).await;
        }
    }

    /// Mark a previously popped task as fully processed.
    pub fn complete(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Stop accepting tasks; `pop` hands out what is already queued.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(url: &str) -> Task {
        Task::seed(url)
    }

    #[tokio::test]
    async fn pops_in_fifo_order() {
        let frontier = Frontier::new(10);
        assert!(frontier.try_push(task("https://a.example/1")));
        assert!(frontier.try_push(task("https://a.example/2")));

        let first = frontier.pop().await.unwrap();
        assert_eq!(first.url, "https://a.example/1");
        let second = frontier.pop().await.unwrap();
        assert_eq!(second.url, "https://a.example/2");
    }

    #[tokio::test]
    async fn rejects_pushes_beyond_capacity() {
        let frontier = Frontier::new(2);
        assert!(frontier.try_push(task("https://a.example/1")));
        assert!(frontier.try_push(task("https://a.example/2")));
        assert!(!frontier.try_push(task("https://a.example/3")));
        assert_eq!(frontier.len(), 2);
    }

    #[tokio::test]
    async fn pop_drains_once_all_tasks_complete() {
        let frontier = Frontier::new(10);
        frontier.try_push(task("https://a.example/"));

        let popped = frontier.pop().await;
        assert!(popped.is_some());
        frontier.complete();

        assert_eq!(frontier.pop().await, None);
    }

    #[tokio::test]
    async fn close_refuses_new_tasks_but_drains_queued_ones() {
        let frontier = Frontier::new(10);
        frontier.try_push(task("https://a.example/"));
        frontier.close();

        assert!(!frontier.try_push(task("https://a.example/late")));
        assert!(frontier.pop().await.is_some());
        frontier.complete();
        assert_eq!(frontier.pop().await, None);
    }

    #[tokio::test]
    async fn requeue_lands_at_the_tail() {
        let frontier = Frontier::new(10);
        frontier.try_push(task("https://a.example/1"));
        frontier.try_push(task("https://a.example/2"));

        let deferred = frontier.pop().await.unwrap();
        frontier.push(deferred).await;
        frontier.complete();

        assert_eq!(frontier.pop().await.unwrap().url, "https://a.example/2");
        assert_eq!(frontier.pop().await.unwrap().url, "https://a.example/1");
    }
}
