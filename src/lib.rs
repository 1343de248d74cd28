//! # grid_collector
//!
//! Route planning for an agent collecting targets on a 2D grid. Two layers:
//!
//! - single-pair shortest paths with [A*](https://en.wikipedia.org/wiki/A*_search_algorithm)
//!   or Uniform Cost Search on a mutable obstacle grid ([solver]), and
//! - a visiting order for many targets built from pairwise shortest-path costs
//!   with a greedy nearest-neighbour tour ([route]).
//!
//! Like the connected-component trick used for pathfinding on large maps, the grid keeps a
//! [UnionFind](petgraph::unionfind::UnionFind) of its free cells so that a search towards an
//! unreachable goal fails without flood-filling the whole grid.
//!
//! ```
//! use grid_collector::{pathing_grid::PathingGrid, solver::Algorithm, Cell};
//!
//! let mut grid = PathingGrid::new(5, 5);
//! grid.mark_obstacle(Cell::new(1, 1));
//! let path = grid_collector::find_path(&grid, Cell::new(0, 0), Cell::new(4, 4), Algorithm::default()).unwrap();
//! assert_eq!(path.cost, 8.0);
//! ```
pub mod error;
pub mod heuristics;
pub mod pathing_grid;
pub mod route;
pub mod search_context;
pub mod simulation;
pub mod solver;

use core::fmt;
use grid_util::point::Point;
use itertools::Itertools;

pub use error::{Error, InvalidInput, Result};
pub use route::plan_route;
pub use solver::find_path;

/// Cost of a cardinal (straight) move.
pub const C: f64 = 1.0;
/// Cost of a diagonal move.
pub const D: f64 = std::f64::consts::SQRT_2;
/// Inline capacity used for successor lists, enough for a full Moore neighbourhood.
pub const N_SMALLVEC_SIZE: usize = 8;

/// A grid coordinate. Ordered row-first, which is the order used to break ties between
/// equally distant targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub const fn new(row: i32, col: i32) -> Cell {
        Cell { row, col }
    }
    pub fn offset(&self, d_row: i32, d_col: i32) -> Cell {
        Cell::new(self.row + d_row, self.col + d_col)
    }
    /// True if `other` is one of the 8 cells around `self`.
    pub fn is_adjacent(&self, other: &Cell) -> bool {
        self != other && (self.row - other.row).abs() <= 1 && (self.col - other.col).abs() <= 1
    }
    /// True if the move from `self` to the adjacent cell `other` changes both coordinates.
    pub fn is_diagonal_to(&self, other: &Cell) -> bool {
        self.row != other.row && self.col != other.col
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl From<Point> for Cell {
    fn from(p: Point) -> Cell {
        Cell::new(p.y, p.x)
    }
}

impl From<Cell> for Point {
    fn from(c: Cell) -> Point {
        Point::new(c.col, c.row)
    }
}

impl From<(i32, i32)> for Cell {
    fn from((row, col): (i32, i32)) -> Cell {
        Cell::new(row, col)
    }
}

/// Cost of following `path` step by step. Cardinal and diagonal steps are counted separately
/// and combined once, so two paths with the same step mix always report the same cost.
pub fn path_cost(path: &[Cell]) -> f64 {
    let (cardinal, diagonal) =
        path.iter()
            .tuple_windows()
            .fold((0u32, 0u32), |(c, d), (from, to)| {
                if from.is_diagonal_to(to) {
                    (c, d + 1)
                } else {
                    (c + 1, d)
                }
            });
    cardinal as f64 * C + diagonal as f64 * D
}

/// Formats a list of cells as `(r, c), (r, c), ...`.
pub fn fmt_cells(cells: &[Cell]) -> String {
    cells.iter().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_order_row_first() {
        let mut cells = vec![Cell::new(4, 0), Cell::new(0, 4), Cell::new(0, 1)];
        cells.sort();
        assert_eq!(cells, vec![Cell::new(0, 1), Cell::new(0, 4), Cell::new(4, 0)]);
    }

    #[test]
    fn point_conversion_swaps_axes() {
        let p: Point = Cell::new(2, 5).into();
        assert_eq!((p.x, p.y), (5, 2));
        assert_eq!(Cell::from(p), Cell::new(2, 5));
    }

    #[test]
    fn path_cost_mixes_step_kinds() {
        let path = [Cell::new(0, 0), Cell::new(1, 1), Cell::new(1, 2), Cell::new(2, 3)];
        assert!((path_cost(&path) - (1.0 + 2.0 * D)).abs() < 1e-12);
        assert_eq!(path_cost(&[Cell::new(3, 3)]), 0.0);
    }
}
