use crate::heuristics::Heuristic;
use crate::pathing_grid::PathingGrid;
use crate::search_context::{Progress, SearchContext, Step};
use crate::{path_cost, Cell, Error, InvalidInput, Result, N_SMALLVEC_SIZE};
use core::fmt;
use grid_util::grid::ValueGrid;
use log::{debug, info, warn};
use ordered_float::OrderedFloat;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::str::FromStr;
use std::time::{Duration, Instant};

pub mod astar;
pub mod ucs;

pub use astar::AstarSolver;
pub use ucs::UcsSolver;

type Cost = OrderedFloat<f64>;

/// A path from start to goal, both included.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    pub cells: Vec<Cell>,
    /// Sum of the step costs along `cells`.
    pub cost: f64,
    /// Number of cells expanded by the search that produced the path.
    pub expanded: usize,
    /// Wall-clock time the search took.
    pub elapsed: Duration,
}

impl Path {
    pub fn start(&self) -> Option<Cell> {
        self.cells.first().copied()
    }
    pub fn goal(&self) -> Option<Cell> {
        self.cells.last().copied()
    }
    /// Number of moves, one less than the number of cells.
    pub fn steps(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }
    /// The same path walked from goal to start.
    pub fn reversed(&self) -> Path {
        let mut cells = self.cells.clone();
        cells.reverse();
        Path { cells, ..*self }
    }
}

/// Observable progress of a search, in the order it happens.
#[derive(Clone, Debug)]
pub enum SearchEvent {
    /// The cell entered the frontier, or re-entered it with a lower cost.
    Discovered { cell: Cell, cost: f64 },
    /// The cell left the frontier and joined the explored set.
    Expanded { cell: Cell, cost: f64 },
    /// Always the last event.
    Finished(Result<Path>),
}

pub trait GridSolver {
    /// Estimated remaining cost from `p1` to `p2`.
    fn heuristic(&self, grid: &PathingGrid, p1: &Cell, p2: &Cell) -> f64;

    fn successors(
        &self,
        grid: &PathingGrid,
        node: &Cell,
    ) -> SmallVec<[(Cell, f64); N_SMALLVEC_SIZE]> {
        grid.neighbours(node)
    }

    /// Whether paths found by this solver are guaranteed to be shortest on `grid`.
    fn is_admissible(&self, _grid: &PathingGrid) -> bool {
        true
    }

    fn get_path_cost(&self, path: &[Cell]) -> f64 {
        path_cost(path)
    }

    /// Prepares a search that can be stepped through one expansion at a time.
    fn search<'a>(
        &'a self,
        grid: &'a PathingGrid,
        start: Cell,
        goal: Cell,
    ) -> Result<SearchSteps<'a>>
    where
        Self: Sized,
    {
        SearchSteps::new(self, grid, start, goal)
    }

    /// Computes a minimum-cost path from start to goal.
    fn find_path(&self, grid: &PathingGrid, start: Cell, goal: Cell) -> Result<Path>
    where
        Self: Sized,
    {
        self.search(grid, start, goal)?.run()
    }
}

/// A search in progress. Iterating yields [SearchEvent]s lazily, one expansion at a time, and
/// ends right after [SearchEvent::Finished]. The grid stays borrowed for the whole search, so it
/// cannot change underneath it.
pub struct SearchSteps<'a> {
    solver: &'a dyn GridSolver,
    grid: &'a PathingGrid,
    start: Cell,
    goal: Cell,
    context: SearchContext<Cell, Cost>,
    pending: VecDeque<SearchEvent>,
    started: Instant,
    finished: bool,
}

impl<'a> SearchSteps<'a> {
    pub fn new(
        solver: &'a dyn GridSolver,
        grid: &'a PathingGrid,
        start: Cell,
        goal: Cell,
    ) -> Result<SearchSteps<'a>> {
        for cell in [start, goal] {
            if !grid.in_bounds(&cell) {
                return Err(InvalidInput::OutOfBounds {
                    cell,
                    width: grid.width(),
                    height: grid.height(),
                }
                .into());
            }
        }
        if grid.is_blocked(&start) {
            return Err(InvalidInput::BlockedStart(start).into());
        }
        if !solver.is_admissible(grid) {
            warn!(
                "Heuristic may overestimate on this grid, the path from {} to {} may not be shortest",
                start, goal
            );
        }
        let mut steps = SearchSteps {
            solver,
            grid,
            start,
            goal,
            context: SearchContext::new(),
            pending: VecDeque::new(),
            started: Instant::now(),
            finished: false,
        };
        steps.restart();
        Ok(steps)
    }

    /// Rewinds the search to its initial state.
    pub fn restart(&mut self) {
        self.pending.clear();
        self.finished = false;
        self.started = Instant::now();
        let estimate = OrderedFloat(self.solver.heuristic(self.grid, &self.start, &self.goal));
        self.context.reset(&self.start, estimate);
        if self.grid.components_fresh() && self.grid.unreachable(&self.start, &self.goal) {
            info!("{} is not reachable from {}", self.goal, self.start);
            self.finish(Err(self.unreachable()));
        }
    }

    pub fn start(&self) -> Cell {
        self.start
    }

    pub fn goal(&self) -> Cell {
        self.goal
    }

    /// Size of the explored set so far.
    pub fn expanded(&self) -> usize {
        self.context.expanded()
    }

    /// Entries waiting on the frontier, including ones superseded by a cheaper route.
    pub fn frontier_len(&self) -> usize {
        self.context.frontier_len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Runs the remaining search and returns its outcome.
    pub fn run(mut self) -> Result<Path> {
        loop {
            match self.next() {
                Some(SearchEvent::Finished(result)) => return result,
                Some(_) => {}
                None => return Err(self.unreachable()),
            }
        }
    }

    fn unreachable(&self) -> Error {
        Error::Unreachable {
            start: self.start,
            goal: self.goal,
        }
    }

    fn finish(&mut self, result: Result<Path>) {
        self.finished = true;
        self.pending.push_back(SearchEvent::Finished(result));
    }

    fn advance(&mut self) {
        let solver = self.solver;
        let grid = self.grid;
        let goal = self.goal;
        let pending = &mut self.pending;
        let step = self.context.step(
            |node| {
                solver
                    .successors(grid, node)
                    .into_iter()
                    .map(|(cell, cost)| (cell, OrderedFloat(cost)))
            },
            |node| OrderedFloat(solver.heuristic(grid, node, &goal)),
            |node| *node == goal,
            |progress| {
                pending.push_back(match progress {
                    Progress::Discovered { node, cost } => SearchEvent::Discovered {
                        cell: *node,
                        cost: cost.0,
                    },
                    Progress::Expanded { node, cost } => SearchEvent::Expanded {
                        cell: *node,
                        cost: cost.0,
                    },
                })
            },
        );
        match step {
            Step::Expanded => {}
            Step::Found { path, .. } => {
                let path = Path {
                    cost: path_cost(&path),
                    cells: path,
                    expanded: self.context.expanded(),
                    elapsed: self.started.elapsed(),
                };
                debug!(
                    "Found path {} -> {} of cost {:.3} after {} expansions",
                    self.start, self.goal, path.cost, path.expanded
                );
                self.finish(Ok(path));
            }
            Step::Exhausted => {
                debug!(
                    "Frontier exhausted after {} expansions, {} is not reachable from {}",
                    self.context.expanded(),
                    self.goal,
                    self.start
                );
                self.finish(Err(self.unreachable()));
            }
        }
    }
}

impl Iterator for SearchSteps<'_> {
    type Item = SearchEvent;

    fn next(&mut self) -> Option<SearchEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if self.finished {
                return None;
            }
            self.advance();
        }
    }
}

/// Selects the search used for a path: A* guided by a heuristic, or Uniform Cost Search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Algorithm {
    AStar(Heuristic),
    Ucs,
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::AStar(Heuristic::Manhattan)
    }
}

impl Algorithm {
    /// A* with the tightest admissible heuristic for the movement model of `grid`.
    pub fn recommended(grid: &PathingGrid) -> Algorithm {
        Algorithm::AStar(Heuristic::recommended(grid.allow_diagonal_move))
    }
}

impl GridSolver for Algorithm {
    fn heuristic(&self, grid: &PathingGrid, p1: &Cell, p2: &Cell) -> f64 {
        match self {
            Algorithm::AStar(h) => AstarSolver::new(*h).heuristic(grid, p1, p2),
            Algorithm::Ucs => UcsSolver.heuristic(grid, p1, p2),
        }
    }

    fn is_admissible(&self, grid: &PathingGrid) -> bool {
        match self {
            Algorithm::AStar(h) => AstarSolver::new(*h).is_admissible(grid),
            Algorithm::Ucs => true,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Algorithm::AStar(h) => write!(f, "astar:{}", h),
            Algorithm::Ucs => f.write_str("ucs"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = InvalidInput;

    /// Accepts `ucs`, `astar` (Manhattan) and `astar:<heuristic>`; `a*` and `dijkstra` are
    /// accepted as aliases.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let (name, heuristic) = match lower.split_once(':') {
            Some((name, h)) => (name, Some(h)),
            None => (lower.as_str(), None),
        };
        match (name, heuristic) {
            ("ucs" | "dijkstra", None) => Ok(Algorithm::Ucs),
            ("astar" | "a*", None) => Ok(Algorithm::default()),
            ("astar" | "a*", Some(h)) => Ok(Algorithm::AStar(h.parse()?)),
            _ => Err(InvalidInput::UnknownAlgorithm(s.to_owned())),
        }
    }
}

/// Computes a minimum-cost path from `start` to `goal` with the selected algorithm.
pub fn find_path(grid: &PathingGrid, start: Cell, goal: Cell, algorithm: Algorithm) -> Result<Path> {
    algorithm.find_path(grid, start, goal)
}
