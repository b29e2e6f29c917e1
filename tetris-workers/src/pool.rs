use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::worker::{Status, Task, Worker};

/// A fixed-or-resizable set of `Worker`s, dispatching submitted tasks round
/// robin. Grounded on `original_source/TetrisCore/src/WorkerPool.cpp`:
/// `mWorkers`/`mRotation` there map directly onto `workers`/`rotation`, and
/// `interruptAll` onto `interrupt_and_clear_queue`. Workers are kept behind
/// `Arc` so a quiesce can clone handles out and release `workers` before
/// blocking on them.
pub struct WorkerPool {
  workers: Mutex<Vec<Arc<Worker>>>,
  rotation: AtomicUsize,
}

impl WorkerPool {
  pub fn new(size: usize) -> Self {
    let workers = (0..size).map(|_| Arc::new(Worker::new())).collect();
    Self {
      workers: Mutex::new(workers),
      rotation: AtomicUsize::new(0),
    }
  }

  pub fn size(&self) -> usize {
    self.workers.lock().unwrap().len()
  }

  pub fn resize(&self, size: usize) {
    let mut workers = self.workers.lock().unwrap();
    if size < workers.len() {
      for worker in &workers[size..] {
        worker.interrupt_and_clear_queue(true);
      }
      workers.truncate(size);
    } else {
      while workers.len() < size {
        workers.push(Arc::new(Worker::new()));
      }
    }
    self.rotation.store(0, Ordering::Relaxed);
  }

  /// Dispatches `task` to the next worker in round-robin order.
  pub fn schedule(&self, task: Task) {
    let workers = self.workers.lock().unwrap();
    assert!(!workers.is_empty(), "cannot schedule on an empty pool");
    let index = self.rotation.fetch_add(1, Ordering::Relaxed) % workers.len();
    workers[index].schedule(task);
  }

  /// Blocks until every worker's queue has drained and it has returned to
  /// `Idle`.
  pub fn wait(&self) {
    let workers = self.workers.lock().unwrap();
    for worker in workers.iter() {
      worker.wait();
    }
  }

  pub fn active_worker_count(&self) -> usize {
    let workers = self.workers.lock().unwrap();
    workers
      .iter()
      .filter(|w| w.status() == Status::Working)
      .count()
  }

  /// Quiesces the whole pool: signals every worker to abort its current
  /// task and drops all pending work, then waits for every worker to settle
  /// at `Idle`. The `workers` lock is released as soon as the handles are
  /// cloned out, before any signalling or waiting happens, so a concurrent
  /// `schedule`/`resize` never stalls behind this call.
  pub fn interrupt_and_clear_queue(&self) {
    let workers: Vec<Arc<Worker>> = self.workers.lock().unwrap().clone();
    for worker in &workers {
      worker.interrupt_and_clear_queue(false);
    }
    for worker in &workers {
      worker.wait_for_status(Status::Idle);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::AtomicUsize as Counter;
  use std::time::Duration;

  #[test]
  fn schedule_round_robins_across_workers_via_thread_local_markers() {
    let pool = WorkerPool::new(3);
    let seen = Arc::new(Mutex::new(Vec::new()));
    for i in 0..6 {
      let seen = Arc::clone(&seen);
      pool.schedule(Box::new(move |_| {
        seen.lock().unwrap().push(i);
      }));
    }
    pool.wait();
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 6);
  }

  #[test]
  fn resize_grows_and_shrinks_worker_count() {
    let pool = WorkerPool::new(2);
    assert_eq!(pool.size(), 2);
    pool.resize(5);
    assert_eq!(pool.size(), 5);
    pool.resize(1);
    assert_eq!(pool.size(), 1);
  }

  #[test]
  fn interrupt_and_clear_queue_stops_every_worker() {
    let pool = WorkerPool::new(4);
    let running = Arc::new(Counter::new(0));
    for _ in 0..4 {
      let running = Arc::clone(&running);
      pool.schedule(Box::new(move |cancel| {
        running.fetch_add(1, Ordering::SeqCst);
        while !cancel.is_cancelled() {
          std::thread::sleep(Duration::from_millis(1));
        }
      }));
    }
    while running.load(Ordering::SeqCst) < 4 {
      std::thread::sleep(Duration::from_millis(1));
    }
    pool.interrupt_and_clear_queue();
    assert_eq!(pool.active_worker_count(), 0);
  }
}
