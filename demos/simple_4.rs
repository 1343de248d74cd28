use grid_collector::pathing_grid::PathingGrid;
use grid_collector::solver::{AstarSolver, GridSolver};
use grid_collector::Cell;

// In this example a path is found on a 3x3 grid with shape
//  ___
// |S  |
// | # |
// |  E|
//  ___
// where
// - # marks an obstacle
// - S marks the start
// - E marks the end
//
// Cells have a 4-neighbourhood

fn main() {
    env_logger::init();
    let mut pathing_grid = PathingGrid::new(3, 3);
    pathing_grid.mark_obstacle(Cell::new(1, 1));
    pathing_grid.generate_components();
    println!("{}", pathing_grid);
    let start = Cell::new(0, 0);
    let end = Cell::new(2, 2);
    match AstarSolver::default().find_path(&pathing_grid, start, end) {
        Ok(path) => {
            println!("Path of cost {} ({} expanded):", path.cost, path.expanded);
            for p in path.cells {
                println!("{}", p);
            }
        }
        Err(e) => println!("{}", e),
    }
}
