//! Adjacency of cells in 1D and 2D windows.
//!
//! A window one sample long along-scan connects each cell only to its AC
//! neighbours; a window one sample wide across-scan only to its AL
//! neighbours; anything else uses full 8-connectivity.

use crate::geometry::WindowGeometry;

/// Offsets as (dAL, dAC)
const AC_PAIR: [(isize, isize); 2] = [(0, 1), (0, -1)];
const AL_PAIR: [(isize, isize); 2] = [(1, 0), (-1, 0)];
const EIGHT: [(isize, isize); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// The set of neighbour offsets for one window geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbourhood {
    geometry: WindowGeometry,
    offsets: &'static [(isize, isize)],
}

impl Neighbourhood {
    /// Pick the connectivity appropriate to the window shape
    pub fn for_geometry(geometry: WindowGeometry) -> Self {
        let offsets: &'static [(isize, isize)] = if geometry.al_samples == 1 {
            &AC_PAIR
        } else if geometry.ac_samples == 1 {
            &AL_PAIR
        } else {
            &EIGHT
        };
        Self { geometry, offsets }
    }

    /// (dAL, dAC) offsets considered adjacent
    pub fn offsets(&self) -> &'static [(isize, isize)] {
        self.offsets
    }

    /// In-bounds neighbour coordinates of the cell at (al, ac)
    pub fn neighbours(&self, al: usize, ac: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.offsets.iter().filter_map(move |&(dal, dac)| {
            let nal = al as isize + dal;
            let nac = ac as isize + dac;
            self.geometry
                .contains(nal, nac)
                .then_some((nal as usize, nac as usize))
        })
    }
}
