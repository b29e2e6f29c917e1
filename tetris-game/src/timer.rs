use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

struct State {
  interval: Duration,
  quit: bool,
}

/// A background thread that calls `tick` once per `interval`, where
/// `interval` can be changed at runtime and takes effect on the timer's
/// next wakeup rather than waiting out whatever sleep is already in
/// progress.
///
/// Grounded on `original_source/TetrisCore/src/Gravity.cpp`'s
/// self-rescheduling `Timer`: a thread blocked in a condition-variable wait
/// with a timeout, woken early by `set_interval` the same way `Gravity`
/// wakes its timer when the level changes mid-wait.
pub struct Timer {
  state: Arc<Mutex<State>>,
  cv: Arc<Condvar>,
  thread: Option<JoinHandle<()>>,
}

impl Timer {
  pub fn start(interval: Duration, mut tick: impl FnMut() + Send + 'static) -> Self {
    let state = Arc::new(Mutex::new(State {
      interval,
      quit: false,
    }));
    let cv = Arc::new(Condvar::new());

    let thread_state = Arc::clone(&state);
    let thread_cv = Arc::clone(&cv);
    let thread = std::thread::Builder::new()
      .name("tetris-timer".to_string())
      .spawn(move || loop {
        let wait = {
          let guard = thread_state.lock().unwrap();
          if guard.quit {
            return;
          }
          guard.interval
        };
        let guard = thread_state.lock().unwrap();
        let (guard, _timeout) = thread_cv.wait_timeout(guard, wait).unwrap();
        if guard.quit {
          return;
        }
        drop(guard);
        tick();
      })
      .expect("failed to spawn timer thread");

    Self {
      state,
      cv,
      thread: Some(thread),
    }
  }

  pub fn set_interval(&self, interval: Duration) {
    self.state.lock().unwrap().interval = interval;
    self.cv.notify_all();
  }

  pub fn stop(&mut self) {
    self.state.lock().unwrap().quit = true;
    self.cv.notify_all();
    if let Some(thread) = self.thread.take() {
      let _ = thread.join();
    }
  }
}

impl Drop for Timer {
  fn drop(&mut self) {
    self.stop();
  }
}
