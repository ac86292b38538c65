use libm::ceilf;

use crate::m_value::tolerated_ambient_pressure;
use crate::tissue::{Tissue, Tissues};

/// Ceiling of one compartment in meters below the surface, 0 when it may surface.
#[inline(never)]
pub fn ceiling(tissue: Tissue, tissue_index: usize, gf: f32, surface_pressure: f32) -> f32 {
    let result_bar = tolerated_ambient_pressure(tissue, tissue_index, gf);
    // the result is in bars, we need to convert it to meters
    ((result_bar - surface_pressure) * 10.0).max(0.0)
}

/// Deepest ceiling over all compartments and the index of the leading one.
#[inline(never)]
pub fn max_ceiling(tissues: &Tissues, gf: f32, surface_pressure: f32) -> (f32, usize) {
    let mut max_ceiling = 0.0;
    let mut tissue_index = 0;
    for (i, tissue) in tissues.iter().enumerate() {
        let tentative_max_ceiling = ceiling(*tissue, i, gf, surface_pressure);
        if tentative_max_ceiling > max_ceiling {
            max_ceiling = tentative_max_ceiling;
            tissue_index = i;
        }
    }
    (max_ceiling, tissue_index)
}

/// Gradient factor in force at `depth` when the first stop was at `first_stop`:
/// `gf_low` at the first stop, moving linearly to `gf_high` at the surface.
pub fn gradient_factor_at(depth: f32, first_stop: f32, gf_low: f32, gf_high: f32) -> f32 {
    if first_stop <= 0.0 {
        return gf_high;
    }
    let fraction = (depth / first_stop).clamp(0.0, 1.0);
    gf_high + (gf_low - gf_high) * fraction
}

/// The grid of possible stop depths: `last_stop`, `last_stop + increment`, ...
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopGrid {
    pub last_stop: f32,
    pub increment: f32,
}

impl StopGrid {
    pub fn new(last_stop: f32, increment: f32) -> Self {
        StopGrid {
            last_stop: last_stop.max(1.0),
            increment: increment.max(1.0),
        }
    }

    /// Stop at or below `depth`, 0 when no stop is needed.
    pub fn round_up(&self, depth: f32) -> f32 {
        if depth <= 0.0 {
            0.0
        } else if depth <= self.last_stop {
            self.last_stop
        } else {
            self.last_stop + ceilf((depth - self.last_stop) / self.increment - 1e-4) * self.increment
        }
    }

    /// The next stop above `stop`, 0 once the last stop is left.
    pub fn next_shallower(&self, stop: f32) -> f32 {
        if stop <= self.last_stop + 1e-3 {
            0.0
        } else {
            (stop - self.increment).max(self.last_stop)
        }
    }

    /// Index of `stop` in a stop list whose entry 0 is the last stop.
    pub fn index_of(&self, stop: f32) -> usize {
        if stop <= self.last_stop {
            return 0;
        }
        ((stop - self.last_stop) / self.increment + 0.5) as usize
    }

    pub fn depth_of(&self, index: usize) -> f32 {
        self.last_stop + index as f32 * self.increment
    }
}

#[test]
fn test_ceiling_with_zero_loads() {
    let tissue = Tissue {
        load_n2: 0.0,
        load_he: 0.0,
    };
    assert_eq!(ceiling(tissue, 0, 1.0, 1.0), 0.0);
}

#[test]
fn test_ceiling_deeper_with_lower_gf() {
    let tissue = Tissue {
        load_n2: 3.11,
        load_he: 0.0,
    };
    let relaxed = ceiling(tissue, 1, 1.0, 1.0);
    let conservative = ceiling(tissue, 1, 0.3, 1.0);
    assert!(relaxed > 0.0);
    assert!(conservative > relaxed);
}

#[test]
pub fn rounding_test() {
    let grid = StopGrid::new(3.0, 3.0);
    assert_eq!(grid.round_up(14.2412), 15.0);
    assert_eq!(grid.round_up(11.12), 12.0);
    assert_eq!(grid.round_up(12.0), 12.0);
    assert_eq!(grid.round_up(0.4), 3.0);
    assert_eq!(grid.round_up(0.0), 0.0);
}

#[test]
fn test_stop_grid_walk() {
    let grid = StopGrid::new(6.0, 3.0);
    assert_eq!(grid.round_up(4.0), 6.0);
    assert_eq!(grid.next_shallower(12.0), 9.0);
    assert_eq!(grid.next_shallower(6.0), 0.0);
    assert_eq!(grid.index_of(12.0), 2);
    assert_eq!(grid.depth_of(2), 12.0);
}

#[test]
fn test_gradient_factor_interpolation() {
    assert_eq!(gradient_factor_at(30.0, 30.0, 0.3, 0.85), 0.3);
    assert_eq!(gradient_factor_at(0.0, 30.0, 0.3, 0.85), 0.85);
    assert!((gradient_factor_at(15.0, 30.0, 0.3, 0.85) - 0.575).abs() < 1e-6);
}
