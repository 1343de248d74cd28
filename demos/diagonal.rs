use grid_collector::heuristics::Heuristic;
use grid_collector::pathing_grid::PathingGrid;
use grid_collector::solver::{Algorithm, GridSolver, SearchEvent};
use grid_collector::Cell;

// Compares the searches on a grid with diagonal moves, printing the order in which the first
// few cells are expanded.
//  _____
// |S....|
// |.###.|
// |...#.|
// |.#..E|
//  _____

fn main() {
    env_logger::init();
    let mut pathing_grid = PathingGrid::from_ascii(
        "
        .....
        .###.
        ...#.
        .#...
        ",
    );
    pathing_grid.allow_diagonal_move = true;
    pathing_grid.generate_components();
    println!("{}", pathing_grid);
    let start = Cell::new(0, 0);
    let end = Cell::new(3, 4);
    let algorithms = [
        Algorithm::Ucs,
        Algorithm::AStar(Heuristic::Octile),
        Algorithm::AStar(Heuristic::Chebyshev),
        Algorithm::AStar(Heuristic::Euclidean),
    ];
    for algorithm in algorithms {
        let Ok(steps) = algorithm.search(&pathing_grid, start, end) else {
            continue;
        };
        let mut expanded = Vec::new();
        for event in steps {
            match event {
                SearchEvent::Expanded { cell, .. } => expanded.push(cell),
                SearchEvent::Finished(Ok(path)) => {
                    println!(
                        "{}: cost {:.3}, {} cells, {} expanded, first: {}",
                        algorithm,
                        path.cost,
                        path.cells.len(),
                        path.expanded,
                        grid_collector::fmt_cells(&expanded[..expanded.len().min(5)])
                    );
                }
                SearchEvent::Finished(Err(e)) => println!("{}: {}", algorithm, e),
                SearchEvent::Discovered { .. } => {}
            }
        }
    }
}
