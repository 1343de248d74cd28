use crate::search_context::FxIndexMap;
use crate::{Cell, C, D, N_SMALLVEC_SIZE};
use core::fmt;
use grid_util::grid::{BoolGrid, ValueGrid};
use log::{debug, info};
use petgraph::unionfind::UnionFind;
use smallvec::SmallVec;

/// Orthogonal offsets as `(d_row, d_col)`: up, right, down, left.
const CARDINAL: [(i32, i32); 4] = [(-1, 0), (0, 1), (1, 0), (0, -1)];
/// Diagonal offsets as `(d_row, d_col)`: up-right, down-right, down-left, up-left.
const DIAGONAL: [(i32, i32); 4] = [(-1, 1), (1, 1), (1, -1), (-1, -1)];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetKind {
    /// Placed when the grid is created.
    Green,
    /// Spawned while a run is in progress.
    Red,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellState {
    Free,
    Obstacle,
    Target(TargetKind),
}

/// Grid sizes offered to users.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GridPreset {
    Small,
    #[default]
    Medium,
    Large,
}

impl GridPreset {
    pub fn size(&self) -> usize {
        match self {
            GridPreset::Small => 10,
            GridPreset::Medium => 20,
            GridPreset::Large => 50,
        }
    }
    pub fn from_size(size: usize) -> Option<GridPreset> {
        [GridPreset::Small, GridPreset::Medium, GridPreset::Large]
            .into_iter()
            .find(|p| p.size() == size)
    }
}

/// [PathingGrid] holds the obstacle map in a [BoolGrid] (`true` is blocked) and the live targets,
/// and maintains connected components of the free cells using a [UnionFind] structure.
/// Components only ever merge while cells are freed; blocking a cell may split a component, in
/// which case they are flagged as dirty and regenerated by [update](Self::update) or
/// [snapshot](Self::snapshot).
#[derive(Clone, Debug)]
pub struct PathingGrid {
    pub grid: BoolGrid,
    targets: FxIndexMap<Cell, TargetKind>,
    pub components: UnionFind<usize>,
    pub components_dirty: bool,
    pub allow_diagonal_move: bool,
}

impl Default for PathingGrid {
    fn default() -> PathingGrid {
        PathingGrid::new(0, 0)
    }
}

impl PathingGrid {
    /// An obstacle-free grid with cardinal-only movement.
    pub fn new(width: usize, height: usize) -> PathingGrid {
        <PathingGrid as ValueGrid<bool>>::new(width, height, false)
    }

    pub fn with_preset(preset: GridPreset) -> PathingGrid {
        PathingGrid::new(preset.size(), preset.size())
    }

    /// Parses a grid drawn row by row: `.` free, `#` obstacle, `G` green target, `R` red target.
    /// Blank lines and surrounding whitespace are ignored; rows shorter than the widest one are
    /// padded with free cells.
    pub fn from_ascii(text: &str) -> PathingGrid {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut grid = PathingGrid::new(width, rows.len());
        for (r, line) in rows.iter().enumerate() {
            for (c, ch) in line.chars().enumerate() {
                let cell = Cell::new(r as i32, c as i32);
                match ch {
                    '#' => grid.mark_obstacle(cell),
                    'G' => grid.set_target(cell, TargetKind::Green),
                    'R' => grid.set_target(cell, TargetKind::Red),
                    _ => {}
                }
            }
        }
        grid.generate_components();
        grid
    }

    pub fn in_bounds(&self, cell: &Cell) -> bool {
        cell.row >= 0
            && cell.col >= 0
            && (cell.row as usize) < self.height()
            && (cell.col as usize) < self.width()
    }

    fn index(&self, cell: &Cell) -> usize {
        cell.row as usize * self.width() + cell.col as usize
    }

    /// Cells outside the grid count as blocked.
    pub fn is_blocked(&self, cell: &Cell) -> bool {
        !self.in_bounds(cell) || self.grid.get(cell.col, cell.row)
    }

    pub fn state(&self, cell: &Cell) -> Option<CellState> {
        if !self.in_bounds(cell) {
            None
        } else if self.grid.get(cell.col, cell.row) {
            Some(CellState::Obstacle)
        } else {
            Some(
                self.targets
                    .get(cell)
                    .map_or(CellState::Free, |kind| CellState::Target(*kind)),
            )
        }
    }

    /// Blocks `cell`, dropping any target on it. Does nothing outside the grid.
    pub fn mark_obstacle(&mut self, cell: Cell) {
        if !self.in_bounds(&cell) {
            debug!("Ignoring obstacle at {} outside the grid", cell);
            return;
        }
        self.set(cell.col, cell.row, true);
    }

    /// Frees `cell`. Does nothing outside the grid.
    pub fn clear_obstacle(&mut self, cell: Cell) {
        if !self.in_bounds(&cell) {
            debug!("Ignoring cleared obstacle at {} outside the grid", cell);
            return;
        }
        self.set(cell.col, cell.row, false);
    }

    /// Places a target. Does nothing outside the grid or on an obstacle.
    pub fn set_target(&mut self, cell: Cell, kind: TargetKind) {
        if self.is_blocked(&cell) {
            debug!("Ignoring {:?} target at blocked or outside cell {}", kind, cell);
            return;
        }
        self.targets.insert(cell, kind);
    }

    /// Removes the target on `cell` and returns its kind, if there was one.
    pub fn clear_target(&mut self, cell: Cell) -> Option<TargetKind> {
        self.targets.shift_remove(&cell)
    }

    pub fn target(&self, cell: &Cell) -> Option<TargetKind> {
        self.targets.get(cell).copied()
    }

    /// Live targets in the order they were placed.
    pub fn targets(&self) -> impl Iterator<Item = (Cell, TargetKind)> + '_ {
        self.targets.iter().map(|(c, k)| (*c, *k))
    }

    /// Sorted cells holding a target of the given kind.
    pub fn targets_of(&self, kind: TargetKind) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self
            .targets
            .iter()
            .filter(|(_, k)| **k == kind)
            .map(|(c, _)| *c)
            .collect();
        cells.sort();
        cells
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    pub fn clear_targets(&mut self) {
        self.targets.clear();
    }

    pub fn free_cell_count(&self) -> usize {
        self.cells().filter(|c| !self.is_blocked(c)).count()
    }

    /// All in-bounds cells, row by row.
    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        let (w, h) = (self.width() as i32, self.height() as i32);
        (0..h).flat_map(move |r| (0..w).map(move |c| Cell::new(r, c)))
    }

    /// Whether the agent may step from `start` to the adjacent cell `pos`. Diagonal steps may not
    /// cut corners: both orthogonal cells they pass must be free.
    pub fn can_move_to(&self, pos: Cell, start: Cell) -> bool {
        debug_assert!(start.is_adjacent(&pos));
        if self.is_blocked(&pos) {
            return false;
        }
        if start.is_diagonal_to(&pos) {
            self.allow_diagonal_move
                && !self.is_blocked(&Cell::new(start.row, pos.col))
                && !self.is_blocked(&Cell::new(pos.row, start.col))
        } else {
            true
        }
    }

    /// The cells reachable in one step from `pos` with their step cost: cardinal neighbours
    /// first (up, right, down, left), then diagonal ones when enabled.
    pub fn neighbours(&self, pos: &Cell) -> SmallVec<[(Cell, f64); N_SMALLVEC_SIZE]> {
        let mut result: SmallVec<[(Cell, f64); N_SMALLVEC_SIZE]> = CARDINAL
            .iter()
            .map(|&(dr, dc)| pos.offset(dr, dc))
            .filter(|p| self.can_move_to(*p, *pos))
            .map(|p| (p, C))
            .collect();
        if self.allow_diagonal_move {
            result.extend(
                DIAGONAL
                    .iter()
                    .map(|&(dr, dc)| pos.offset(dr, dc))
                    .filter(|p| self.can_move_to(*p, *pos))
                    .map(|p| (p, D)),
            );
        }
        result
    }

    /// Retrieves the component id a given [Cell] belongs to.
    pub fn get_component(&self, cell: &Cell) -> usize {
        self.components.find(self.index(cell))
    }

    /// Whether the components reflect the current obstacles.
    pub fn components_fresh(&self) -> bool {
        !self.components_dirty
    }

    /// Checks if start and goal are free and on the same component.
    pub fn reachable(&self, start: &Cell, goal: &Cell) -> bool {
        !self.unreachable(start, goal)
    }

    /// Checks if start and goal are not on the same component. Blocked and outside cells are
    /// unreachable from anywhere.
    pub fn unreachable(&self, start: &Cell, goal: &Cell) -> bool {
        if self.is_blocked(start) || self.is_blocked(goal) {
            return true;
        }
        !self
            .components
            .equiv(self.index(start), self.index(goal))
    }

    /// Regenerates the components if they are marked as dirty.
    pub fn update(&mut self) {
        if self.components_dirty {
            info!("Components are dirty: regenerating components");
            self.generate_components();
        }
    }

    /// A copy of the grid with up-to-date components, to be searched while the original keeps
    /// changing.
    pub fn snapshot(&self) -> PathingGrid {
        let mut snapshot = self.clone();
        snapshot.update();
        snapshot
    }

    /// Generates a new [UnionFind] structure and links up grid neighbours to the same components.
    pub fn generate_components(&mut self) {
        let mut components = UnionFind::new(self.width() * self.height());
        for cell in self.cells().filter(|c| !self.is_blocked(c)) {
            let ix = self.index(&cell);
            // Moves are symmetric, so looking forward (right, down and both lower diagonals)
            // covers every edge once.
            [(0, 1), (1, 0), (1, 1), (1, -1)]
                .iter()
                .map(|&(dr, dc)| cell.offset(dr, dc))
                .filter(|n| self.can_move_to(*n, cell))
                .for_each(|n| {
                    components.union(ix, self.index(&n));
                });
        }
        self.components = components;
        self.components_dirty = false;
    }
}

impl fmt::Display for PathingGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for r in 0..self.height() as i32 {
            let line: String = (0..self.width() as i32)
                .map(|c| match self.state(&Cell::new(r, c)) {
                    Some(CellState::Obstacle) => '#',
                    Some(CellState::Target(TargetKind::Green)) => 'G',
                    Some(CellState::Target(TargetKind::Red)) => 'R',
                    _ => '.',
                })
                .collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

impl ValueGrid<bool> for PathingGrid {
    fn new(width: usize, height: usize, default_value: bool) -> Self {
        let mut base_grid = PathingGrid {
            grid: BoolGrid::new(width, height, default_value),
            targets: FxIndexMap::default(),
            components: UnionFind::new(width * height),
            components_dirty: false,
            allow_diagonal_move: false,
        };
        base_grid.generate_components();
        base_grid
    }
    fn get(&self, x: i32, y: i32) -> bool {
        self.grid.get(x, y)
    }
    /// Updates a position on the grid. Joins newly connected components and flags the components
    /// as dirty if components are (potentially) broken apart into multiple.
    fn set(&mut self, x: i32, y: i32, blocked: bool) {
        let p = Cell::new(y, x);
        if self.grid.get(x, y) == blocked {
            return;
        }
        self.grid.set(x, y, blocked);
        if blocked {
            self.targets.shift_remove(&p);
            self.components_dirty = true;
        } else {
            let p_ix = self.index(&p);
            for (n, _) in self.neighbours(&p) {
                let n_ix = self.index(&n);
                self.components.union(p_ix, n_ix);
            }
        }
    }
    fn width(&self) -> usize {
        self.grid.width()
    }
    fn height(&self) -> usize {
        self.grid.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests whether cells are correctly mapped to different connected components
    #[test]
    fn test_component_generation() {
        // |.#.|
        // |.#.|
        let grid = PathingGrid::from_ascii(
            "
            .#.
            .#.
            ",
        );
        let comp = |r, c| grid.get_component(&Cell::new(r, c));
        assert_eq!(comp(0, 0), comp(1, 0));
        assert_eq!(comp(0, 2), comp(1, 2));
        assert_ne!(comp(0, 0), comp(0, 2));
        assert!(grid.unreachable(&Cell::new(0, 0), &Cell::new(0, 1)));
    }

    #[test]
    fn neighbours_respect_bounds_and_obstacles() {
        let mut grid = PathingGrid::new(3, 3);
        grid.mark_obstacle(Cell::new(0, 1));
        let n: Vec<Cell> = grid.neighbours(&Cell::new(0, 0)).iter().map(|(c, _)| *c).collect();
        assert_eq!(n, vec![Cell::new(1, 0)]);
        let centre = grid.neighbours(&Cell::new(1, 1));
        assert_eq!(centre.len(), 3);
        assert!(centre.iter().all(|(_, cost)| *cost == C));
    }

    #[test]
    fn diagonal_neighbours_do_not_cut_corners() {
        // |..|
        // |#.|
        let mut grid = PathingGrid::from_ascii(
            "
            ..
            #.
            ",
        );
        grid.allow_diagonal_move = true;
        let from_top_left = grid.neighbours(&Cell::new(0, 0));
        assert!(!from_top_left.iter().any(|(c, _)| *c == Cell::new(1, 1)));
        let from_bottom_right = grid.neighbours(&Cell::new(1, 1));
        assert!(from_bottom_right.iter().all(|(c, _)| *c != Cell::new(0, 0)));

        grid.clear_obstacle(Cell::new(1, 0));
        let diag: Vec<_> = grid
            .neighbours(&Cell::new(0, 0))
            .into_iter()
            .filter(|(c, _)| *c == Cell::new(1, 1))
            .collect();
        assert_eq!(diag, vec![(Cell::new(1, 1), D)]);
    }

    // Tests whether allowing diagonals has the expected effect on diagonal reachability in a minimal setting.
    #[test]
    fn test_diagonal_switch_reachable() {
        //  __
        // |.#|
        // |#.|
        //  __
        let mut pathing_grid = PathingGrid::from_ascii(".#\n#.");
        let start = Cell::new(0, 0);
        let end = Cell::new(1, 1);
        assert!(pathing_grid.unreachable(&start, &end));
        pathing_grid.allow_diagonal_move = true;
        pathing_grid.generate_components();
        // Squeezing between the two obstacles counts as cutting a corner.
        assert!(pathing_grid.unreachable(&start, &end));
    }

    #[test]
    fn mutators_ignore_cells_outside() {
        let mut grid = PathingGrid::new(2, 2);
        let before = grid.to_string();
        grid.mark_obstacle(Cell::new(-1, 0));
        grid.clear_obstacle(Cell::new(0, 5));
        grid.set_target(Cell::new(2, 2), TargetKind::Red);
        assert_eq!(grid.clear_target(Cell::new(9, 9)), None);
        assert_eq!(grid.to_string(), before);
        assert!(grid.is_blocked(&Cell::new(-1, 0)));
        assert_eq!(grid.state(&Cell::new(2, 0)), None);
    }

    #[test]
    fn targets_and_obstacles_interact() {
        let mut grid = PathingGrid::new(3, 1);
        grid.set_target(Cell::new(0, 1), TargetKind::Green);
        grid.set_target(Cell::new(0, 2), TargetKind::Red);
        assert_eq!(grid.state(&Cell::new(0, 1)), Some(CellState::Target(TargetKind::Green)));
        grid.mark_obstacle(Cell::new(0, 1));
        assert_eq!(grid.target(&Cell::new(0, 1)), None);
        grid.set_target(Cell::new(0, 1), TargetKind::Green);
        assert_eq!(grid.state(&Cell::new(0, 1)), Some(CellState::Obstacle));
        assert_eq!(grid.targets_of(TargetKind::Red), vec![Cell::new(0, 2)]);
        assert_eq!(grid.clear_target(Cell::new(0, 2)), Some(TargetKind::Red));
        assert_eq!(grid.target_count(), 0);
    }

    #[test]
    fn blocking_marks_components_dirty_and_freeing_joins() {
        let mut grid = PathingGrid::new(3, 1);
        let (a, b) = (Cell::new(0, 0), Cell::new(0, 2));
        assert!(grid.reachable(&a, &b));
        grid.mark_obstacle(Cell::new(0, 1));
        assert!(!grid.components_fresh());
        let snapshot = grid.snapshot();
        assert!(snapshot.components_fresh());
        assert!(snapshot.unreachable(&a, &b));
        grid.update();
        grid.clear_obstacle(Cell::new(0, 1));
        assert!(grid.components_fresh());
        assert!(grid.reachable(&a, &b));
    }

    #[test]
    fn ascii_round_trip() {
        let text = "..G\n#R.\n";
        let grid = PathingGrid::from_ascii(text);
        assert_eq!(grid.to_string(), text);
        assert_eq!((grid.width(), grid.height()), (3, 2));
        assert_eq!(grid.free_cell_count(), 5);
    }

    #[test]
    fn presets() {
        assert_eq!(PathingGrid::with_preset(GridPreset::Large).width(), 50);
        assert_eq!(GridPreset::from_size(10), Some(GridPreset::Small));
        assert_eq!(GridPreset::from_size(30), None);
    }
}
