use crate::heuristics::Heuristic;
use crate::{pathing_grid::PathingGrid, solver::GridSolver, Cell};

#[derive(Clone, Debug)]
pub struct AstarSolver {
    pub heuristic: Heuristic,
    /// Values above 1 trade optimality for fewer expansions (weighted A*).
    pub heuristic_factor: f64,
}

impl AstarSolver {
    pub fn new(heuristic: Heuristic) -> AstarSolver {
        AstarSolver {
            heuristic,
            heuristic_factor: 1.0,
        }
    }

    pub fn weighted(heuristic: Heuristic, heuristic_factor: f64) -> AstarSolver {
        AstarSolver {
            heuristic,
            heuristic_factor,
        }
    }
}

impl Default for AstarSolver {
    fn default() -> Self {
        AstarSolver::new(Heuristic::Manhattan)
    }
}

impl GridSolver for AstarSolver {
    /// Just the heuristic distance times a heuristic factor.
    fn heuristic(&self, _grid: &PathingGrid, p1: &Cell, p2: &Cell) -> f64 {
        self.heuristic.distance(p1, p2) * self.heuristic_factor
    }

    fn is_admissible(&self, grid: &PathingGrid) -> bool {
        self.heuristic_factor <= 1.0 && self.heuristic.is_admissible(grid.allow_diagonal_move)
    }
}
