use std::fmt;
use std::sync::{mpsc, Arc};

use tetris_eval::Evaluator;
use tetris_grid::PieceKind;
use tetris_state::GameState;
use tetris_sync::SharedCell;
use tetris_workers::{CancelToken, Worker, WorkerPool};

use crate::node::{Arena, NodeId, SearchNode};
use crate::offspring;

const ROOT_ID: NodeId = 0;

/// Rejected at construction, before any worker is touched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CalculatorError {
  EmptyPieceList,
  LengthMismatch { pieces: usize, widths: usize },
  ZeroWidth { depth: usize },
}

impl fmt::Display for CalculatorError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CalculatorError::EmptyPieceList => write!(f, "piece list is empty"),
      CalculatorError::LengthMismatch { pieces, widths } => write!(
        f,
        "pieces ({pieces}) and widths ({widths}) have different lengths"
      ),
      CalculatorError::ZeroWidth { depth } => write!(f, "width at depth {depth} is zero"),
    }
  }
}

impl std::error::Error for CalculatorError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
  Initial,
  Started,
  Working,
  Stopped,
  Finished,
  Error,
}

struct LevelRecord {
  best_node: Option<NodeId>,
  best_score: i32,
  node_count: u32,
  finished: bool,
}

impl Default for LevelRecord {
  fn default() -> Self {
    Self {
      best_node: None,
      best_score: i32::MIN,
      node_count: 0,
      finished: false,
    }
  }
}

struct Tree {
  arena: Arena,
  levels: Vec<LevelRecord>,
}

impl Tree {
  fn ensure_level(&mut self, depth: usize) {
    if self.levels.len() <= depth {
      self.levels.resize_with(depth + 1, LevelRecord::default);
    }
  }

  fn register(&mut self, depth: u32, id: NodeId, score: i32) {
    self.ensure_level(depth as usize);
    let level = &mut self.levels[depth as usize];
    if level.best_node.is_none() || score > level.best_score {
      level.best_node = Some(id);
      level.best_score = score;
    }
    level.node_count += 1;
  }

  fn finish(&mut self, depth: u32) {
    self.ensure_level(depth as usize);
    self.levels[depth as usize].finished = true;
  }

  fn best_node(&self, depth: u32) -> Option<NodeId> {
    self.levels.get(depth as usize).and_then(|l| l.best_node)
  }
}

struct RunState {
  status: Status,
  current_depth: u32,
  result: Vec<GameState>,
  error: Option<String>,
}

struct CalculatorShared {
  pieces: Vec<PieceKind>,
  widths: Vec<u32>,
  evaluator: Evaluator,
  pool: Arc<WorkerPool>,
  main_worker: Arc<Worker>,
  tree: SharedCell<Tree>,
  state: SharedCell<RunState>,
}

/// Bounded, iterative-deepening, multi-worker search over the tree of
/// future game states reachable from a root state given a known sequence
/// of upcoming pieces.
///
/// `start()` schedules the search on `main_worker` and returns immediately;
/// the search itself dispatches one child-generation task per current
/// frontier leaf to `pool` at every depth and waits for them inline, so the
/// caller only ever blocks inside `start()`'s caller if it chooses to poll
/// `status()`/`result()` itself.
pub struct NodeCalculator {
  shared: Arc<CalculatorShared>,
}

impl NodeCalculator {
  pub fn new(
    root_state: GameState,
    pieces: Vec<PieceKind>,
    widths: Vec<u32>,
    evaluator: Evaluator,
    main_worker: Arc<Worker>,
    pool: Arc<WorkerPool>,
  ) -> Result<Self, CalculatorError> {
    if pieces.is_empty() {
      return Err(CalculatorError::EmptyPieceList);
    }
    if pieces.len() != widths.len() {
      return Err(CalculatorError::LengthMismatch {
        pieces: pieces.len(),
        widths: widths.len(),
      });
    }
    if let Some(depth) = widths.iter().position(|&w| w == 0) {
      return Err(CalculatorError::ZeroWidth { depth });
    }

    let mut arena = Arena::new();
    let root_id = arena.insert(SearchNode {
      state: root_state,
      parent: None,
      children: Vec::new(),
      depth: 0,
      score: 0,
    });
    debug_assert_eq!(root_id, ROOT_ID);

    let shared = Arc::new(CalculatorShared {
      pieces,
      widths,
      evaluator,
      pool,
      main_worker,
      tree: SharedCell::new(Tree {
        arena,
        levels: Vec::new(),
      }),
      state: SharedCell::new(RunState {
        status: Status::Initial,
        current_depth: 0,
        result: Vec::new(),
        error: None,
      }),
    });

    Ok(Self { shared })
  }

  pub fn start(&self) {
    self.shared.state.mutate(|s| s.status = Status::Started);
    let shared = Arc::clone(&self.shared);
    self.shared.main_worker.schedule(Box::new(move |cancel| {
      shared.state.mutate(|s| s.status = Status::Working);
      Self::run(&shared, cancel);
    }));
  }

  /// Requests cancellation. The main worker's orchestration task and every
  /// currently-running pool task observe this at their next yield point;
  /// `status()` settles at `Stopped` once they do.
  pub fn stop(&self) {
    self.shared.main_worker.interrupt(false);
    self.shared.pool.interrupt_and_clear_queue();
  }

  pub fn status(&self) -> Status {
    self.shared.state.read(|s| s.status)
  }

  pub fn result(&self) -> Vec<GameState> {
    self.shared.state.read(|s| s.result.clone())
  }

  pub fn error_message(&self) -> Option<String> {
    self.shared.state.read(|s| s.error.clone())
  }

  pub fn current_search_depth(&self) -> u32 {
    self.shared.state.read(|s| s.current_depth)
  }

  pub fn max_search_depth(&self) -> u32 {
    self.shared.pieces.len() as u32
  }

  fn run(shared: &Arc<CalculatorShared>, cancel: &CancelToken) {
    let max_depth = shared.pieces.len() as u32;
    let mut frontier = vec![ROOT_ID];

    for d in 1..=max_depth {
      if cancel.is_cancelled() {
        Self::mark_stopped(shared);
        return;
      }

      let kind = shared.pieces[(d - 1) as usize];
      let width = shared.widths[(d - 1) as usize];

      let live_parents: Vec<NodeId> = frontier
        .iter()
        .copied()
        .filter(|&id| !shared.tree.read(|t| t.arena.get(id).state.is_game_over()))
        .collect();

      let mut new_frontier = Vec::new();

      if !live_parents.is_empty() {
        let (tx, rx) = mpsc::channel();
        for &parent_id in &live_parents {
          let parent_state = shared.tree.read(|t| t.arena.get(parent_id).state.clone());
          let evaluator = shared.evaluator.clone();
          let tx = tx.clone();
          shared.pool.schedule(Box::new(move |task_cancel| {
            let candidates = offspring::generate(&parent_state, kind, &evaluator, width as usize, task_cancel);
            let _ = tx.send((parent_id, candidates));
          }));
        }
        drop(tx);

        let mut failed = false;
        for _ in 0..live_parents.len() {
          match rx.recv() {
            Ok((parent_id, candidates)) => {
              for candidate in candidates {
                let node = SearchNode {
                  state: candidate.state,
                  parent: Some(parent_id),
                  children: Vec::new(),
                  depth: d,
                  score: candidate.score,
                };
                let id = shared.tree.mutate(|t| {
                  let id = t.arena.insert(node);
                  t.arena.get_mut(parent_id).children.push(id);
                  t.register(d, id, candidate.score);
                  id
                });
                new_frontier.push(id);
              }
            }
            // The channel disconnects early either because a task panicked
            // (a real failure) or because `stop()` cleared still-queued
            // tasks out from under us (expected, not an error).
            Err(_) if cancel.is_cancelled() => break,
            Err(_) => {
              failed = true;
              break;
            }
          }
        }

        if failed {
          shared.state.mutate(|s| {
            s.status = Status::Error;
            s.error = Some("a search task failed".to_string());
          });
          return;
        }
      }

      shared.tree.mutate(|t| t.finish(d));

      let best_leaf = shared.tree.read(|t| t.best_node(d));
      match best_leaf {
        Some(leaf) => {
          let mut path = shared.tree.read(|t| t.arena.path_states(leaf));
          path.remove(0);
          shared.state.mutate(|s| {
            s.result = path;
            s.current_depth = d;
          });
        }
        None => shared.state.mutate(|s| s.current_depth = d),
      }

      if new_frontier.is_empty() {
        // Every live parent dead-ended (game over); nothing left to grow.
        frontier = live_parents;
      } else {
        shared.tree.mutate(|t| t.arena.prune(&new_frontier));
        frontier = new_frontier;
      }

      if cancel.is_cancelled() {
        Self::mark_stopped(shared);
        return;
      }
    }

    shared.state.mutate(|s| s.status = Status::Finished);
  }

  fn mark_stopped(shared: &CalculatorShared) {
    shared.state.mutate(|s| s.status = Status::Stopped);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::{Duration, Instant};
  use tetris_grid::PieceKind::*;

  fn wait_for<F: Fn() -> bool>(predicate: F) {
    let start = Instant::now();
    while !predicate() {
      assert!(start.elapsed() < Duration::from_secs(5), "timed out waiting");
      std::thread::sleep(Duration::from_millis(1));
    }
  }

  #[test]
  fn construction_rejects_empty_piece_list() {
    let main_worker = Arc::new(Worker::new());
    let pool = Arc::new(WorkerPool::new(1));
    let err = NodeCalculator::new(GameState::new(20, 10), vec![], vec![], Evaluator::Balanced, main_worker, pool)
      .unwrap_err();
    assert_eq!(err, CalculatorError::EmptyPieceList);
  }

  #[test]
  fn construction_rejects_mismatched_lengths() {
    let main_worker = Arc::new(Worker::new());
    let pool = Arc::new(WorkerPool::new(1));
    let err = NodeCalculator::new(
      GameState::new(20, 10),
      vec![I, I],
      vec![1],
      Evaluator::Balanced,
      main_worker,
      pool,
    )
    .unwrap_err();
    assert!(matches!(err, CalculatorError::LengthMismatch { .. }));
  }

  #[test]
  fn construction_rejects_a_zero_width() {
    let main_worker = Arc::new(Worker::new());
    let pool = Arc::new(WorkerPool::new(1));
    let err = NodeCalculator::new(
      GameState::new(20, 10),
      vec![I, I],
      vec![2, 0],
      Evaluator::Balanced,
      main_worker,
      pool,
    )
    .unwrap_err();
    assert_eq!(err, CalculatorError::ZeroWidth { depth: 1 });
  }

  #[test]
  fn one_deep_search_on_an_empty_board_finds_a_flat_placement() {
    let main_worker = Arc::new(Worker::new());
    let pool = Arc::new(WorkerPool::new(2));
    let calc = NodeCalculator::new(
      GameState::new(20, 10),
      vec![I],
      vec![1],
      Evaluator::Balanced,
      main_worker,
      pool,
    )
    .unwrap();

    calc.start();
    wait_for(|| calc.status() == Status::Finished);

    let result = calc.result();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].score(), 0);
    assert_eq!(result[0].first_occupied_row(), 19);
  }

  #[test]
  fn stop_after_one_depth_yields_stopped_with_a_non_empty_result() {
    let main_worker = Arc::new(Worker::new());
    let pool = Arc::new(WorkerPool::new(4));
    let calc = NodeCalculator::new(
      GameState::new(20, 10),
      vec![I, O, T, S, Z, J],
      vec![4, 4, 4, 4, 4, 4],
      Evaluator::Balanced,
      main_worker,
      pool,
    )
    .unwrap();

    calc.start();
    wait_for(|| calc.current_search_depth() >= 1);
    calc.stop();
    wait_for(|| matches!(calc.status(), Status::Stopped | Status::Finished));

    assert!(!calc.result().is_empty());
  }
}
