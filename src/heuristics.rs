//! Distance estimates used to guide A*.
//!
//! A heuristic keeps A* optimal only while it never overestimates the remaining cost under
//! the movement model it is paired with. [Heuristic::is_admissible] encodes which pairings are
//! safe; Uniform Cost Search uses no heuristic at all.

use crate::{Cell, InvalidInput, C, D};
use core::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Heuristic {
    /// `|dr| + |dc|`.
    #[default]
    Manhattan,
    /// `sqrt(dr² + dc²)`.
    Euclidean,
    /// `max(|dr|, |dc|)`.
    Chebyshev,
    /// Cost of taking as many diagonal steps as possible before going straight.
    Octile,
}

impl Heuristic {
    pub const ALL: [Heuristic; 4] = [
        Heuristic::Manhattan,
        Heuristic::Euclidean,
        Heuristic::Chebyshev,
        Heuristic::Octile,
    ];

    pub fn distance(&self, a: &Cell, b: &Cell) -> f64 {
        let dr = (a.row - b.row).abs() as f64;
        let dc = (a.col - b.col).abs() as f64;
        match self {
            Heuristic::Manhattan => (dr + dc) * C,
            Heuristic::Euclidean => (dr * dr + dc * dc).sqrt() * C,
            Heuristic::Chebyshev => dr.max(dc) * C,
            Heuristic::Octile => {
                let (long, short) = if dr > dc { (dr, dc) } else { (dc, dr) };
                (long - short) * C + short * D
            }
        }
    }

    /// Whether the heuristic never overestimates under the given movement model. Manhattan
    /// overestimates as soon as diagonal shortcuts exist.
    pub fn is_admissible(&self, allow_diagonal_move: bool) -> bool {
        match self {
            Heuristic::Manhattan => !allow_diagonal_move,
            Heuristic::Euclidean | Heuristic::Chebyshev | Heuristic::Octile => true,
        }
    }

    /// The tightest admissible heuristic for the movement model.
    pub fn recommended(allow_diagonal_move: bool) -> Heuristic {
        if allow_diagonal_move {
            Heuristic::Octile
        } else {
            Heuristic::Manhattan
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Heuristic::Manhattan => "manhattan",
            Heuristic::Euclidean => "euclidean",
            Heuristic::Chebyshev => "chebyshev",
            Heuristic::Octile => "octile",
        }
    }
}

impl fmt::Display for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Heuristic {
    type Err = InvalidInput;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Heuristic::ALL
            .into_iter()
            .find(|h| h.name() == name)
            .ok_or_else(|| InvalidInput::UnknownHeuristic(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distances_on_a_knight_move() {
        let a = Cell::new(0, 0);
        let b = Cell::new(1, 2);
        assert_eq!(Heuristic::Manhattan.distance(&a, &b), 3.0);
        assert_eq!(Heuristic::Chebyshev.distance(&a, &b), 2.0);
        assert!((Heuristic::Euclidean.distance(&a, &b) - 5f64.sqrt()).abs() < 1e-12);
        assert!((Heuristic::Octile.distance(&a, &b) - (1.0 + D)).abs() < 1e-12);
    }

    #[test]
    fn symmetric_and_zero_on_self() {
        let a = Cell::new(3, 7);
        let b = Cell::new(9, 1);
        for h in Heuristic::ALL {
            assert_eq!(h.distance(&a, &a), 0.0);
            assert_eq!(h.distance(&a, &b), h.distance(&b, &a));
        }
    }

    #[test]
    fn ordering_between_heuristics() {
        // Chebyshev <= Euclidean <= Octile <= Manhattan for any displacement.
        let origin = Cell::new(0, 0);
        for r in -6..=6 {
            for c in -6..=6 {
                let p = Cell::new(r, c);
                let cheb = Heuristic::Chebyshev.distance(&origin, &p);
                let eucl = Heuristic::Euclidean.distance(&origin, &p);
                let oct = Heuristic::Octile.distance(&origin, &p);
                let man = Heuristic::Manhattan.distance(&origin, &p);
                assert!(cheb <= eucl + 1e-12);
                assert!(eucl <= oct + 1e-12);
                assert!(oct <= man + 1e-12);
            }
        }
    }

    #[test]
    fn parses_names() {
        assert_eq!("Manhattan".parse::<Heuristic>(), Ok(Heuristic::Manhattan));
        assert_eq!(" octile ".parse::<Heuristic>(), Ok(Heuristic::Octile));
        assert_eq!(
            "taxicab".parse::<Heuristic>(),
            Err(InvalidInput::UnknownHeuristic("taxicab".to_owned()))
        );
    }

    #[test]
    fn admissibility_table() {
        assert!(Heuristic::Manhattan.is_admissible(false));
        assert!(!Heuristic::Manhattan.is_admissible(true));
        for h in [Heuristic::Euclidean, Heuristic::Chebyshev, Heuristic::Octile] {
            assert!(h.is_admissible(false) && h.is_admissible(true));
        }
        assert_eq!(Heuristic::recommended(true), Heuristic::Octile);
    }
}
