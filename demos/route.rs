use grid_collector::pathing_grid::{PathingGrid, TargetKind};
use grid_collector::route::RoutePlanner;
use grid_collector::{fmt_cells, Cell};

// Plans the order in which to visit the targets of a grid, first as an open route and then as
// a tour that returns to the start.

fn main() {
    env_logger::init();
    let pathing_grid = PathingGrid::from_ascii(
        "
        ....G.....
        .####.##..
        .#..R..#.G
        .#.....#..
        .###.###..
        G.........
        ",
    );
    println!("{}", pathing_grid);
    let start = Cell::new(0, 0);
    let mut targets = pathing_grid.targets_of(TargetKind::Green);
    targets.extend(pathing_grid.targets_of(TargetKind::Red));
    for return_to_start in [false, true] {
        let planner = RoutePlanner {
            return_to_start,
            ..Default::default()
        };
        match planner.plan(&pathing_grid, start, &targets) {
            Ok(route) => println!(
                "Waypoints: {}\nCost: {}, expanded: {}",
                fmt_cells(&route.waypoints()),
                route.cost,
                route.expanded
            ),
            Err(e) => println!("{}", e),
        }
    }
}
