use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

/// Cooperative cancellation signal handed to every task. A task that
/// enumerates work in a loop (the AI's child generator, chiefly) should
/// check `is_cancelled()` at well-defined yield points and stop early if it
/// is set, rather than running to completion.
#[derive(Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
  pub fn is_cancelled(&self) -> bool {
    self.0.load(Ordering::Acquire)
  }

  /// A token that never reports cancellation, for callers exercising
  /// cancellable code outside of a real `Worker` (tests, mainly).
  pub fn never() -> Self {
    Self(Arc::new(AtomicBool::new(false)))
  }
}

/// A nullary work item submitted to a `Worker`.
pub type Task = Box<dyn FnOnce(&CancelToken) + Send + 'static>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
  Idle,
  Scheduled,
  Working,
  FinishedOne,
}

struct Shared {
  queue: Mutex<VecDeque<Task>>,
  queue_cv: Condvar,
  status: Mutex<Status>,
  status_cv: Condvar,
  quit: AtomicBool,
  cancel: Arc<AtomicBool>,
}

impl Shared {
  fn set_status(&self, status: Status) {
    let mut guard = self.status.lock().unwrap();
    *guard = status;
    self.status_cv.notify_all();
  }

  fn status(&self) -> Status {
    *self.status.lock().unwrap()
  }
}

/// A single background thread with an MPSC task queue.
///
/// Grounded directly on `original_source/TetrisCore/src/Worker.cpp`: the
/// `mQueueMutex`/`mQueueCondition` pair there is this module's
/// `queue`/`queue_cv`; `mStatusMutex`/`mStatusCondition` is `status`/
/// `status_cv`; the C++ `thread::interrupt()` exception is replaced here by
/// the cooperative `CancelToken`, per the "Exceptions for cancellation"
/// design note.
pub struct Worker {
  shared: Arc<Shared>,
  thread: Option<JoinHandle<()>>,
}

impl Worker {
  pub fn new() -> Self {
    let shared = Arc::new(Shared {
      queue: Mutex::new(VecDeque::new()),
      queue_cv: Condvar::new(),
      status: Mutex::new(Status::Idle),
      status_cv: Condvar::new(),
      quit: AtomicBool::new(false),
      cancel: Arc::new(AtomicBool::new(false)),
    });

    let worker_shared = Arc::clone(&shared);
    let thread = std::thread::Builder::new()
      .name("tetris-worker".to_string())
      .spawn(move || Self::run(worker_shared))
      .expect("failed to spawn worker thread");

    Self {
      shared,
      thread: Some(thread),
    }
  }

  fn run(shared: Arc<Shared>) {
    loop {
      let task = {
        let mut queue = shared.queue.lock().unwrap();
        loop {
          if let Some(task) = queue.pop_front() {
            break Some(task);
          }
          if shared.quit.load(Ordering::Acquire) {
            break None;
          }
          shared.set_status(Status::Idle);
          queue = shared.queue_cv.wait(queue).unwrap();
        }
      };

      let Some(task) = task else { break };

      shared.cancel.store(false, Ordering::Release);
      shared.set_status(Status::Working);

      let token = CancelToken(Arc::clone(&shared.cancel));
      if let Err(payload) = catch_unwind(AssertUnwindSafe(|| task(&token))) {
        let message = payload
          .downcast_ref::<&str>()
          .map(|s| s.to_string())
          .or_else(|| payload.downcast_ref::<String>().cloned())
          .unwrap_or_else(|| "unknown panic".to_string());
        log::error!("worker task panicked: {message}");
      }

      if shared.cancel.load(Ordering::Acquire) {
        shared.set_status(Status::FinishedOne);
      }
    }
    shared.set_status(Status::Idle);
  }

  pub fn schedule(&self, task: Task) {
    let mut queue = self.shared.queue.lock().unwrap();
    queue.push_back(task);
    if self.shared.status() == Status::Idle {
      self.shared.set_status(Status::Scheduled);
    }
    self.shared.queue_cv.notify_all();
  }

  pub fn size(&self) -> usize {
    self.shared.queue.lock().unwrap().len()
  }

  pub fn is_empty(&self) -> bool {
    self.size() == 0
  }

  pub fn status(&self) -> Status {
    self.shared.status()
  }

  pub fn wait_for_status(&self, target: Status) {
    let guard = self.shared.status.lock().unwrap();
    let _guard = self
      .shared
      .status_cv
      .wait_while(guard, |status| *status != target)
      .unwrap();
  }

  /// Signals the currently-running task to abort at its next yield point.
  /// Does not clear pending work. If `join`, blocks until the worker
  /// returns to `Idle`.
  pub fn interrupt(&self, join: bool) {
    self.shared.cancel.store(true, Ordering::Release);
    // Wake a worker that is blocked waiting for a task so it observes the
    // cancellation promptly even with nothing queued.
    self.shared.queue_cv.notify_all();
    if join {
      self.wait_for_status(Status::Idle);
    }
  }

  /// As `interrupt`, but also drops every pending task from the queue.
  pub fn interrupt_and_clear_queue(&self, join: bool) {
    self.shared.queue.lock().unwrap().clear();
    self.interrupt(join);
  }

  /// Blocks until the queue empties and the worker is `Idle`.
  pub fn wait(&self) {
    self.wait_for_status(Status::Idle);
  }
}

impl Default for Worker {
  fn default() -> Self {
    Self::new()
  }
}

impl Drop for Worker {
  fn drop(&mut self) {
    self.shared.quit.store(true, Ordering::Release);
    self.shared.queue_cv.notify_all();
    if let Some(thread) = self.thread.take() {
      let _ = thread.join();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::mpsc;
  use std::time::Duration;

  #[test]
  fn schedule_runs_tasks_in_submission_order() {
    let worker = Worker::new();
    let (tx, rx) = mpsc::channel();
    for i in 0..5 {
      let tx = tx.clone();
      worker.schedule(Box::new(move |_| {
        tx.send(i).unwrap();
      }));
    }
    worker.wait();
    let received: Vec<_> = rx.try_iter().collect();
    assert_eq!(received, vec![0, 1, 2, 3, 4]);
  }

  #[test]
  fn a_panicking_task_does_not_kill_the_worker() {
    let worker = Worker::new();
    worker.schedule(Box::new(|_| panic!("boom")));
    worker.wait();
    let (tx, rx) = mpsc::channel();
    worker.schedule(Box::new(move |_| tx.send(()).unwrap()));
    rx.recv_timeout(Duration::from_secs(5)).unwrap();
  }

  #[test]
  fn interrupt_and_clear_queue_empties_pending_work() {
    let worker = Worker::new();
    let (tx, rx) = mpsc::channel();
    let tx2 = tx.clone();
    worker.schedule(Box::new(move |cancel| {
      while !cancel.is_cancelled() {
        std::thread::sleep(Duration::from_millis(1));
      }
      tx2.send(()).unwrap();
    }));
    for _ in 0..10 {
      worker.schedule(Box::new(|_| {}));
    }
    worker.interrupt_and_clear_queue(true);
    rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(worker.size(), 0);
  }
}
