//! Visiting order for a set of targets: pairwise shortest paths between the start and every
//! target, then a greedy nearest-neighbour tour over them.
use crate::pathing_grid::PathingGrid;
use crate::solver::{Algorithm, GridSolver, Path, SearchEvent};
use crate::{fmt_cells, Cell, Error, InvalidInput, Result};
use grid_util::grid::ValueGrid;
use itertools::Itertools;
use log::{debug, warn};
use ordered_float::OrderedFloat;

/// Shortest path costs between every pair of a list of points, `f64::INFINITY` where no path
/// exists. Moves are symmetric, so each unordered pair is searched once and the path stored in
/// both directions.
#[derive(Clone, Debug)]
pub struct DistanceMatrix {
    points: Vec<Cell>,
    costs: Vec<f64>,
    paths: Vec<Option<Path>>,
    expanded: usize,
}

impl DistanceMatrix {
    /// Runs one search per unordered pair of `points`. All points have to lie on the grid and
    /// the first one, the start, has to be free; blocked points are simply unreachable.
    pub fn build(grid: &PathingGrid, points: Vec<Cell>, algorithm: Algorithm) -> Result<DistanceMatrix> {
        for cell in &points {
            if !grid.in_bounds(cell) {
                return Err(InvalidInput::OutOfBounds {
                    cell: *cell,
                    width: grid.width(),
                    height: grid.height(),
                }
                .into());
            }
        }
        if let Some(start) = points.first() {
            if grid.is_blocked(start) {
                return Err(InvalidInput::BlockedStart(*start).into());
            }
        }
        let n = points.len();
        let mut matrix = DistanceMatrix {
            costs: vec![f64::INFINITY; n * n],
            paths: vec![None; n * n],
            points,
            expanded: 0,
        };
        for i in 0..n {
            if !grid.is_blocked(&matrix.points[i]) {
                matrix.costs[i * n + i] = 0.0;
            }
        }
        for (i, j) in (0..n).tuple_combinations() {
            let (a, b) = (matrix.points[i], matrix.points[j]);
            if grid.is_blocked(&a) || grid.is_blocked(&b) {
                continue;
            }
            let mut steps = algorithm.search(grid, a, b)?;
            let outcome = steps.by_ref().find_map(|event| match event {
                SearchEvent::Finished(result) => Some(result),
                _ => None,
            });
            matrix.expanded += steps.expanded();
            match outcome {
                Some(Ok(path)) => {
                    matrix.costs[i * n + j] = path.cost;
                    matrix.costs[j * n + i] = path.cost;
                    matrix.paths[j * n + i] = Some(path.reversed());
                    matrix.paths[i * n + j] = Some(path);
                }
                Some(Err(Error::Unreachable { .. })) | None => {}
                Some(Err(e)) => return Err(e),
            }
        }
        debug!(
            "Distance matrix over {} points built with {} expansions",
            n, matrix.expanded
        );
        Ok(matrix)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Cell] {
        &self.points
    }

    /// Total number of cells expanded by the pairwise searches.
    pub fn expanded(&self) -> usize {
        self.expanded
    }

    pub fn cost(&self, i: usize, j: usize) -> f64 {
        self.costs[i * self.len() + j]
    }

    /// Looks up the cost between two of the points by their cells.
    pub fn cost_between(&self, a: &Cell, b: &Cell) -> Option<f64> {
        Some(self.cost(self.index_of(a)?, self.index_of(b)?))
    }

    /// The shortest path from point `i` to point `j`, `None` if unreachable or `i == j`.
    pub fn path(&self, i: usize, j: usize) -> Option<&Path> {
        self.paths[i * self.len() + j].as_ref()
    }

    pub fn index_of(&self, cell: &Cell) -> Option<usize> {
        self.points.iter().position(|p| p == cell)
    }

    pub fn is_symmetric(&self) -> bool {
        let n = self.len();
        (0..n)
            .tuple_combinations()
            .all(|(i, j)| self.cost(i, j) == self.cost(j, i))
    }

    /// Pairs of distinct points without a path between them.
    pub fn unreachable_pairs(&self) -> Vec<(Cell, Cell)> {
        (0..self.len())
            .tuple_combinations()
            .filter(|&(i, j)| self.cost(i, j).is_infinite())
            .map(|(i, j)| (self.points[i], self.points[j]))
            .collect()
    }
}

/// A planned visiting order.
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    pub start: Cell,
    /// Targets in the order they are visited, the start excluded.
    pub order: Vec<Cell>,
    /// Sum of the shortest path costs between consecutive waypoints.
    pub cost: f64,
    /// Cells expanded while building the distance matrix.
    pub expanded: usize,
    /// Whether the route ends with the leg back to the start.
    pub returns_to_start: bool,
}

impl Route {
    /// The start, the targets in visiting order and, when the route closes, the start again.
    pub fn waypoints(&self) -> Vec<Cell> {
        let mut waypoints = Vec::with_capacity(self.order.len() + 2);
        waypoints.push(self.start);
        waypoints.extend_from_slice(&self.order);
        if self.returns_to_start {
            waypoints.push(self.start);
        }
        waypoints
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RoutePlanner {
    /// Search used for every pairwise distance. `None` picks [Algorithm::recommended] for the
    /// grid being planned on, so costs stay shortest whether or not diagonals are allowed.
    pub algorithm: Option<Algorithm>,
    /// Adds the leg from the last target back to the start.
    pub return_to_start: bool,
}

impl RoutePlanner {
    pub fn new(algorithm: Algorithm) -> RoutePlanner {
        RoutePlanner {
            algorithm: Some(algorithm),
            ..Default::default()
        }
    }

    /// The search used on `grid`.
    pub fn algorithm_for(&self, grid: &PathingGrid) -> Algorithm {
        self.algorithm.unwrap_or_else(|| Algorithm::recommended(grid))
    }

    /// Orders `targets` greedily: from the current position, always move on to the nearest
    /// unvisited target, ties going to the lowest cell. Duplicate targets are visited once.
    /// Fails with [Error::RouteInfeasible] as soon as no remaining target can be reached.
    pub fn plan(&self, grid: &PathingGrid, start: Cell, targets: &[Cell]) -> Result<Route> {
        let targets: Vec<Cell> = targets.iter().copied().sorted().dedup().collect();
        let mut points = Vec::with_capacity(targets.len() + 1);
        points.push(start);
        points.extend(targets);
        let matrix = DistanceMatrix::build(grid, points, self.algorithm_for(grid))?;

        // Indices into the matrix; targets are sorted, so the lowest index is the lowest cell.
        let mut unvisited: Vec<usize> = (1..matrix.len()).collect();
        let mut order = Vec::with_capacity(unvisited.len());
        let mut current = 0;
        let mut cost = 0.0;
        while !unvisited.is_empty() {
            let nearest = (0..unvisited.len())
                .filter(|&pos| matrix.cost(current, unvisited[pos]).is_finite())
                .min_by_key(|&pos| {
                    let j = unvisited[pos];
                    (OrderedFloat(matrix.cost(current, j)), j)
                });
            let Some(pos) = nearest else {
                let unreachable: Vec<Cell> = unvisited.iter().map(|&j| matrix.points()[j]).collect();
                warn!(
                    "Route from {} is infeasible, unreachable targets: {}",
                    start,
                    fmt_cells(&unreachable)
                );
                return Err(Error::RouteInfeasible { unreachable });
            };
            let next = unvisited.remove(pos);
            cost += matrix.cost(current, next);
            order.push(matrix.points()[next]);
            current = next;
        }
        if self.return_to_start {
            let back = matrix.cost(current, 0);
            // Every visited target was reached from the start and moves are symmetric.
            debug_assert!(back.is_finite());
            cost += back;
        }
        debug!(
            "Planned route from {} through {} targets, cost {:.3}",
            start,
            order.len(),
            cost
        );
        Ok(Route {
            start,
            order,
            cost,
            expanded: matrix.expanded(),
            returns_to_start: self.return_to_start,
        })
    }
}

/// Plans a route over `targets` with the default [RoutePlanner].
pub fn plan_route(grid: &PathingGrid, start: Cell, targets: &[Cell]) -> Result<Route> {
    RoutePlanner::default().plan(grid, start, targets)
}
