//! A headless agent that collects every target on a grid. Each run plans a visiting order on a
//! snapshot of the grid, walks it one cell per [tick](Collector::tick) and replans at the end of
//! a leg when targets appeared that the plan did not know about.
use crate::pathing_grid::{GridPreset, PathingGrid, TargetKind};
use crate::route::RoutePlanner;
use crate::solver::{find_path, Algorithm};
use crate::{Cell, Error, Result};
use grid_util::grid::ValueGrid;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeSet, VecDeque};

/// Random picks tried before falling back to a scan of the grid.
const RANDOM_ATTEMPTS: usize = 64;

#[derive(Clone, Debug, PartialEq)]
pub struct CollectorConfig {
    pub size: GridPreset,
    /// Green targets placed on every new grid and on reset.
    pub green_count: usize,
    /// Red targets spawned over the course of a run.
    pub red_spawn_total: usize,
    /// Ticks between two red spawns; the first one spawns on the first tick.
    pub red_spawn_period: u64,
    /// Probability for each cell but home to be an obstacle.
    pub obstacle_density: f64,
    pub allow_diagonal_move: bool,
    /// Search used for planning and legs; `None` picks [Algorithm::recommended] for the grid.
    pub algorithm: Option<Algorithm>,
    /// Walk back home once every target is collected.
    pub return_home: bool,
    pub seed: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        CollectorConfig {
            size: GridPreset::default(),
            green_count: 4,
            red_spawn_total: 4,
            red_spawn_period: 10,
            obstacle_density: 0.0,
            allow_diagonal_move: false,
            algorithm: None,
            return_home: true,
            seed: 2025,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RunStatus {
    Idle,
    Running,
    Paused,
    /// Every target was collected, no more will spawn and the agent is back home if asked to.
    Finished,
    /// Planning failed; the run cannot go on.
    Failed(Error),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub collected: usize,
    pub green_left: usize,
    pub red_left: usize,
    /// Cells expanded by route planning and leg searches.
    pub expanded: usize,
    pub ticks: u64,
    /// Plans made after the first one of the run.
    pub replans: usize,
}

#[derive(Clone, Debug)]
pub struct Collector {
    config: CollectorConfig,
    grid: PathingGrid,
    rng: StdRng,
    home: Cell,
    agent: Cell,
    status: RunStatus,
    /// Waypoints of the current plan still ahead of the agent.
    route: VecDeque<Cell>,
    /// Targets the current plan covers, minus the ones collected since.
    planned: Option<BTreeSet<Cell>>,
    /// Cells left to walk on the current leg.
    leg: VecDeque<Cell>,
    red_spawned: usize,
    trail: Vec<Cell>,
    collected: usize,
    expanded: usize,
    ticks: u64,
    replans: usize,
}

impl Collector {
    pub fn new(config: CollectorConfig) -> Collector {
        let rng = StdRng::seed_from_u64(config.seed);
        let home = Cell::new(0, 0);
        let mut collector = Collector {
            grid: PathingGrid::with_preset(config.size),
            config,
            rng,
            home,
            agent: home,
            status: RunStatus::Idle,
            route: VecDeque::new(),
            planned: None,
            leg: VecDeque::new(),
            red_spawned: 0,
            trail: vec![home],
            collected: 0,
            expanded: 0,
            ticks: 0,
            replans: 0,
        };
        collector.build_grid();
        collector
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn grid(&self) -> &PathingGrid {
        &self.grid
    }

    /// Direct access to the grid, e.g. to draw obstacles before a run.
    pub fn grid_mut(&mut self) -> &mut PathingGrid {
        &mut self.grid
    }

    pub fn agent(&self) -> Cell {
        self.agent
    }

    pub fn home(&self) -> Cell {
        self.home
    }

    /// The search used for route planning and legs on the current grid.
    pub fn algorithm(&self) -> Algorithm {
        self.config
            .algorithm
            .unwrap_or_else(|| Algorithm::recommended(&self.grid))
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    /// Every cell the agent has stood on, in order, starting at home.
    pub fn trail(&self) -> &[Cell] {
        &self.trail
    }

    /// Waypoints of the current plan the agent has not reached yet.
    pub fn planned_route(&self) -> impl Iterator<Item = &Cell> {
        self.route.iter()
    }

    pub fn stats(&self) -> RunStats {
        RunStats {
            collected: self.collected,
            green_left: self.grid.targets_of(TargetKind::Green).len(),
            red_left: self.grid.targets_of(TargetKind::Red).len(),
            expanded: self.expanded,
            ticks: self.ticks,
            replans: self.replans,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.status, RunStatus::Running | RunStatus::Paused)
    }

    pub fn start(&mut self) {
        if self.status == RunStatus::Idle {
            info!("Starting run with {} targets", self.grid.target_count());
            self.status = RunStatus::Running;
        } else {
            debug!("Ignoring start while {:?}", self.status);
        }
    }

    pub fn pause(&mut self) {
        if self.status == RunStatus::Running {
            self.status = RunStatus::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.status == RunStatus::Paused {
            self.status = RunStatus::Running;
        }
    }

    /// Stops any run, sends the agent home and places fresh green targets. Obstacles stay.
    pub fn reset(&mut self) {
        self.grid.clear_targets();
        self.clear_run();
        self.place_greens();
    }

    /// Replaces obstacles and targets. Refused while a run is in progress.
    pub fn new_grid(&mut self) -> bool {
        if self.is_running() {
            debug!("Not replacing the grid during a run");
            return false;
        }
        self.build_grid();
        true
    }

    /// Ticks until the run finishes, fails or `max_ticks` have passed in total. Starts the run
    /// first if it is idle.
    pub fn run_until_done(&mut self, max_ticks: u64) -> &RunStatus {
        self.start();
        while self.status == RunStatus::Running && self.ticks < max_ticks {
            self.tick();
        }
        &self.status
    }

    /// Advances a running collector by one step: spawns a red target when one is due, plans when
    /// the agent is between legs and moves the agent one cell.
    pub fn tick(&mut self) {
        if self.status != RunStatus::Running {
            return;
        }
        self.ticks += 1;
        let period = self.config.red_spawn_period.max(1);
        if self.red_spawned < self.config.red_spawn_total && (self.ticks - 1) % period == 0 {
            self.spawn_red();
        }
        if self.leg.is_empty() {
            if let Err(e) = self.next_leg() {
                warn!("Run failed at {}: {}", self.agent, e);
                self.status = RunStatus::Failed(e);
                return;
            }
        }
        if let Some(cell) = self.leg.pop_front() {
            self.agent = cell;
            self.trail.push(cell);
            if let Some(kind) = self.grid.clear_target(cell) {
                debug!("Collected {:?} target at {}", kind, cell);
                self.collected += 1;
                if let Some(planned) = self.planned.as_mut() {
                    planned.remove(&cell);
                }
            }
        }
        let at_rest = self.leg.is_empty() && (!self.config.return_home || self.agent == self.home);
        if self.grid.target_count() == 0 && self.spawns_done() && at_rest {
            info!(
                "Run finished after {} ticks, {} targets collected",
                self.ticks, self.collected
            );
            self.status = RunStatus::Finished;
        }
    }

    fn spawns_done(&self) -> bool {
        self.red_spawned >= self.config.red_spawn_total
    }

    fn live_targets(&self) -> BTreeSet<Cell> {
        self.grid.targets().map(|(cell, _)| cell).collect()
    }

    /// Computes the path to the next waypoint, replanning first if the targets changed. With
    /// nothing left to collect or spawn, the last leg leads home.
    fn next_leg(&mut self) -> Result<()> {
        let live = self.live_targets();
        if live.is_empty() {
            if self.config.return_home && self.spawns_done() && self.agent != self.home {
                debug!("Heading home from {}", self.agent);
                self.walk_to(self.home)?;
            }
            return Ok(());
        }
        if self.route.is_empty() || self.planned.as_ref() != Some(&live) {
            self.plan(live)?;
        }
        // Targets picked up on an earlier leg are skipped.
        while let Some(waypoint) = self.route.pop_front() {
            if self.grid.target(&waypoint).is_none() {
                continue;
            }
            return self.walk_to(waypoint);
        }
        Ok(())
    }

    fn walk_to(&mut self, goal: Cell) -> Result<()> {
        let path = find_path(&self.grid, self.agent, goal, self.algorithm())?;
        self.expanded += path.expanded;
        self.leg = path.cells.into_iter().skip(1).collect();
        Ok(())
    }

    fn plan(&mut self, targets: BTreeSet<Cell>) -> Result<()> {
        let snapshot = self.grid.snapshot();
        let cells: Vec<Cell> = targets.iter().copied().collect();
        let route = RoutePlanner::new(self.algorithm()).plan(&snapshot, self.agent, &cells)?;
        if self.planned.is_some() {
            self.replans += 1;
            debug!("Replanning from {} over {} targets", self.agent, cells.len());
        }
        self.expanded += route.expanded;
        self.route = route.order.into();
        self.planned = Some(targets);
        Ok(())
    }

    fn clear_run(&mut self) {
        self.agent = self.home;
        self.status = RunStatus::Idle;
        self.route.clear();
        self.planned = None;
        self.leg.clear();
        self.red_spawned = 0;
        self.trail = vec![self.home];
        self.collected = 0;
        self.expanded = 0;
        self.ticks = 0;
        self.replans = 0;
    }

    fn build_grid(&mut self) {
        let mut grid = PathingGrid::with_preset(self.config.size);
        grid.allow_diagonal_move = self.config.allow_diagonal_move;
        let density = self.config.obstacle_density.clamp(0.0, 1.0);
        if density > 0.0 {
            let cells: Vec<Cell> = grid.cells().filter(|c| *c != self.home).collect();
            for cell in cells {
                if self.rng.gen_bool(density) {
                    grid.mark_obstacle(cell);
                }
            }
        }
        grid.generate_components();
        self.grid = grid;
        self.clear_run();
        self.place_greens();
    }

    fn place_greens(&mut self) {
        for _ in 0..self.config.green_count {
            match self.random_free_cell() {
                Some(cell) => self.grid.set_target(cell, TargetKind::Green),
                None => {
                    warn!("No free cell left for a green target");
                    break;
                }
            }
        }
    }

    fn spawn_red(&mut self) {
        match self.random_free_cell() {
            Some(cell) => {
                debug!("Spawned red target at {}", cell);
                self.grid.set_target(cell, TargetKind::Red);
                self.red_spawned += 1;
            }
            None => {
                warn!("No free cell left for a red target, stopping spawns");
                self.red_spawned = self.config.red_spawn_total;
            }
        }
    }

    /// A free cell holding neither a target nor the agent, away from home.
    fn is_spawnable(&self, cell: &Cell) -> bool {
        !self.grid.is_blocked(cell)
            && self.grid.target(cell).is_none()
            && *cell != self.home
            && *cell != self.agent
    }

    fn random_free_cell(&mut self) -> Option<Cell> {
        let (w, h) = (self.grid.width() as i32, self.grid.height() as i32);
        if w == 0 || h == 0 {
            return None;
        }
        for _ in 0..RANDOM_ATTEMPTS {
            let cell = Cell::new(self.rng.gen_range(0..h), self.rng.gen_range(0..w));
            if self.is_spawnable(&cell) {
                return Some(cell);
            }
        }
        let start = self.red_spawned + self.grid.target_count();
        stride_scan(w as usize, h as usize, start, |cell| self.is_spawnable(cell))
    }
}

/// Visits every cell of a `width` x `height` grid exactly once, starting at linear index `start`
/// and stepping by a stride coprime with the cell count, and returns the first accepted cell.
pub fn stride_scan<F>(width: usize, height: usize, start: usize, mut accept: F) -> Option<Cell>
where
    F: FnMut(&Cell) -> bool,
{
    let total = width * height;
    if total == 0 {
        return None;
    }
    let stride = [7, 5, 3, 11, 13]
        .into_iter()
        .find(|s| gcd(*s, total) == 1)
        .unwrap_or(1);
    let mut idx = start % total;
    for _ in 0..total {
        let cell = Cell::new((idx / width) as i32, (idx % width) as i32);
        if accept(&cell) {
            return Some(cell);
        }
        idx = (idx + stride) % total;
    }
    None
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::Heuristic;

    fn small(green_count: usize, red_spawn_total: usize) -> CollectorConfig {
        CollectorConfig {
            size: GridPreset::Small,
            green_count,
            red_spawn_total,
            ..Default::default()
        }
    }

    #[test]
    fn new_collector_is_idle_at_home() {
        let collector = Collector::new(CollectorConfig::default());
        assert_eq!(collector.grid().width(), 20);
        assert_eq!(collector.status(), &RunStatus::Idle);
        assert_eq!(collector.agent(), Cell::new(0, 0));
        let stats = collector.stats();
        assert_eq!(stats.green_left, 4);
        assert_eq!(stats.red_left, 0);
        assert_eq!(collector.grid().target(&collector.home()), None);
    }

    #[test]
    fn collects_everything_on_open_grid() {
        let mut collector = Collector::new(CollectorConfig::default());
        assert_eq!(collector.run_until_done(10_000), &RunStatus::Finished);
        let stats = collector.stats();
        assert_eq!(stats.collected, 8);
        assert_eq!((stats.green_left, stats.red_left), (0, 0));
        assert!(stats.expanded > 0);
        // The agent idles while waiting for the next red to spawn.
        assert!(collector.trail().len() as u64 <= stats.ticks + 1);
        assert!(collector
            .trail()
            .windows(2)
            .all(|w| w[0].is_adjacent(&w[1])));
        assert_eq!(collector.trail().last(), Some(&collector.home()));
        assert_eq!(collector.agent(), collector.home());
    }

    #[test]
    fn run_ends_on_last_target_without_return_home() {
        let config = CollectorConfig {
            return_home: false,
            ..small(1, 0)
        };
        let mut collector = Collector::new(config);
        let green = collector.grid().targets_of(TargetKind::Green)[0];
        assert_eq!(collector.run_until_done(1_000), &RunStatus::Finished);
        assert_eq!(collector.trail().last(), Some(&green));
        assert_ne!(collector.agent(), collector.home());
    }

    #[test]
    fn diagonal_runs_plan_with_octile() {
        let config = CollectorConfig {
            allow_diagonal_move: true,
            ..small(2, 1)
        };
        let mut collector = Collector::new(config);
        assert_eq!(collector.algorithm(), Algorithm::AStar(Heuristic::Octile));
        assert_eq!(collector.run_until_done(1_000), &RunStatus::Finished);
        assert!(collector.trail().windows(2).any(|w| w[0].is_diagonal_to(&w[1])));
    }

    #[test]
    fn late_reds_trigger_replans() {
        let mut config = small(1, 3);
        config.red_spawn_period = 3;
        let mut collector = Collector::new(config);
        assert_eq!(collector.run_until_done(10_000), &RunStatus::Finished);
        assert_eq!(collector.stats().collected, 4);
        assert!(collector.stats().replans >= 1);
    }

    #[test]
    fn runs_are_reproducible() {
        let config = CollectorConfig {
            obstacle_density: 0.1,
            allow_diagonal_move: true,
            algorithm: Some(Algorithm::Ucs),
            ..small(3, 2)
        };
        let mut a = Collector::new(config.clone());
        let mut b = Collector::new(config);
        assert_eq!(a.grid().to_string(), b.grid().to_string());
        let status = a.run_until_done(1_000).clone();
        assert_eq!(b.run_until_done(1_000), &status);
        assert_eq!(a.trail(), b.trail());
        assert_eq!(a.stats(), b.stats());
    }

    #[test]
    fn pause_holds_the_agent() {
        let mut collector = Collector::new(small(2, 0));
        collector.start();
        collector.tick();
        collector.pause();
        let at = collector.agent();
        collector.tick();
        assert_eq!(collector.agent(), at);
        assert_eq!(collector.stats().ticks, 1);
        assert!(!collector.new_grid());
        collector.resume();
        collector.tick();
        assert_eq!(collector.stats().ticks, 2);
    }

    #[test]
    fn enclosed_target_fails_the_run() {
        let mut collector = Collector::new(small(1, 0));
        let green = collector.grid().targets_of(TargetKind::Green)[0];
        for (dr, dc) in [(-1, 0), (0, 1), (1, 0), (0, -1)] {
            collector.grid_mut().mark_obstacle(green.offset(dr, dc));
        }
        let status = collector.run_until_done(100).clone();
        assert!(matches!(status, RunStatus::Failed(_)), "{:?}", status);
        assert!(!collector.is_running());
    }

    #[test]
    fn reset_places_fresh_greens_and_clears_stats() {
        let mut collector = Collector::new(small(2, 1));
        collector.run_until_done(5);
        collector.reset();
        assert_eq!(collector.status(), &RunStatus::Idle);
        assert_eq!(collector.stats(), RunStats {
            green_left: 2,
            ..Default::default()
        });
        assert_eq!(collector.trail(), &[Cell::new(0, 0)]);
    }

    #[test]
    fn nothing_to_collect_finishes_at_once() {
        let mut collector = Collector::new(small(0, 0));
        assert_eq!(collector.run_until_done(10), &RunStatus::Finished);
        assert_eq!(collector.stats().ticks, 1);
    }

    #[test]
    fn stride_scan_reaches_every_cell() {
        let mut seen = BTreeSet::new();
        assert_eq!(
            stride_scan(10, 10, 3, |c| {
                seen.insert(*c);
                false
            }),
            None
        );
        assert_eq!(seen.len(), 100);
        let last = Cell::new(9, 9);
        assert_eq!(stride_scan(10, 10, 0, |c| *c == last), Some(last));
    }
}
