use crate::{pathing_grid::PathingGrid, solver::GridSolver, Cell};

/// Uniform Cost Search: expands cells purely by their cost from the start.
#[derive(Clone, Copy, Debug, Default)]
pub struct UcsSolver;

impl GridSolver for UcsSolver {
    fn heuristic(&self, _: &PathingGrid, _: &Cell, _: &Cell) -> f64 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::Heuristic;
    use crate::solver::AstarSolver;

    #[test]
    fn expands_in_cost_order() {
        let grid = PathingGrid::new(4, 4);
        let costs: Vec<f64> = UcsSolver
            .search(&grid, Cell::new(0, 0), Cell::new(3, 3))
            .unwrap()
            .filter_map(|e| match e {
                crate::solver::SearchEvent::Expanded { cost, .. } => Some(cost),
                _ => None,
            })
            .collect();
        assert!(costs.windows(2).all(|w| w[0] <= w[1]));
        // Every cell is at most 6 away, the goal is expanded last.
        assert_eq!(costs.len(), 16);
        assert_eq!(costs.last(), Some(&6.0));
    }

    #[test]
    fn matches_astar_with_diagonals() {
        let mut grid = PathingGrid::from_ascii(
            "
            ......
            .####.
            ....#.
            .##.#.
            ......
            ",
        );
        grid.allow_diagonal_move = true;
        grid.generate_components();
        let start = Cell::new(2, 0);
        let goal = Cell::new(2, 5);
        let ucs = UcsSolver.find_path(&grid, start, goal).unwrap();
        let astar = AstarSolver::new(Heuristic::Octile)
            .find_path(&grid, start, goal)
            .unwrap();
        assert!((ucs.cost - astar.cost).abs() < 1e-9);
        assert!(ucs.expanded >= astar.expanded);
    }
}
