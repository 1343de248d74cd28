//! Error types for searches and route planning.

use crate::{fmt_cells, Cell};
use thiserror::Error;

/// Inputs a search or planning call refuses outright.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum InvalidInput {
    #[error("cell {cell} lies outside the {width}x{height} grid")]
    OutOfBounds {
        cell: Cell,
        width: usize,
        height: usize,
    },

    #[error("start cell {0} is an obstacle")]
    BlockedStart(Cell),

    #[error("unknown heuristic '{0}' (expected manhattan, euclidean, chebyshev or octile)")]
    UnknownHeuristic(String),

    #[error("unknown algorithm '{0}' (expected ucs, astar or astar:<heuristic>)")]
    UnknownAlgorithm(String),
}

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),

    #[error("no path from {start} to {goal}")]
    Unreachable { start: Cell, goal: Cell },

    #[error("route infeasible, unreachable targets: {}", fmt_cells(.unreachable))]
    RouteInfeasible { unreachable: Vec<Cell> },
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_cells() {
        let err = Error::RouteInfeasible {
            unreachable: vec![Cell::new(1, 2), Cell::new(3, 4)],
        };
        assert_eq!(
            err.to_string(),
            "route infeasible, unreachable targets: (1, 2), (3, 4)"
        );
        let err: Error = InvalidInput::BlockedStart(Cell::new(0, 0)).into();
        assert_eq!(err.to_string(), "invalid input: start cell (0, 0) is an obstacle");
    }
}
