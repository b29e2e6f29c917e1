//! A small thread pool with cooperative cancellation, used to run the AI's
//! per-depth child-generation tasks off the calling thread.

mod pool;
mod worker;

pub use pool::WorkerPool;
pub use worker::{CancelToken, Status, Task, Worker};
