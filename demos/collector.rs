use grid_collector::pathing_grid::GridPreset;
use grid_collector::simulation::{Collector, CollectorConfig};

// Runs the collecting agent on a small grid with some obstacles and prints the grid and the
// statistics of the run. Run with RUST_LOG=debug to follow spawns and replans.

fn main() {
    env_logger::init();
    let mut collector = Collector::new(CollectorConfig {
        size: GridPreset::Small,
        obstacle_density: 0.15,
        ..Default::default()
    });
    println!("{}", collector.grid());
    let status = collector.run_until_done(10_000).clone();
    println!("{:?}", status);
    println!("{:?}", collector.stats());
    println!("Trail of {} cells", collector.trail().len());
}
