#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use libm::powf;

use crate::gas::{BreathingGas, InspiredGas};
use crate::zh16c::ZhL16cGf;
use crate::{COMPARTMENTS, FN2, water_vapor_pressure};

#[derive(Default, Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tissue {
    pub load_n2: f32,
    pub load_he: f32,
}

impl Tissue {
    pub fn total(&self) -> f32 {
        self.load_n2 + self.load_he
    }
}

pub type Tissues = [Tissue; COMPARTMENTS];

/// Tissues saturated with air at `surface_pressure`.
pub fn surface_equilibrium(surface_pressure: f32) -> Tissues {
    let load_n2 = (surface_pressure - water_vapor_pressure(37.0)) * FN2;
    [Tissue { load_n2, load_he: 0.0 }; COMPARTMENTS]
}

// Haldane equation for constant ambient pressure:
// pt(t) = pt0 + (palv - pt0) * (1 - 2^(-t / half_life))
// pt0 -> tissue tension at the start of the interval
// palv -> alveolar partial pressure of the inert gas
pub fn calculate_tissue(
    mut tissue: Tissue,
    tissue_index: usize,
    inspired: InspiredGas,
    minutes_since_last_check: f32,
) -> Tissue {
    let kn2 = ZhL16cGf::N2_HALF_LIFE[tissue_index];
    let khe = ZhL16cGf::HE_HALF_LIFE[tissue_index];

    let p0n2 = tissue.load_n2;
    let p0he = tissue.load_he;

    tissue.load_n2 =
        p0n2 + (inspired.n2 - p0n2) * (1.0 - (1.0 / powf(2.0, minutes_since_last_check / kn2)));
    tissue.load_he =
        p0he + (inspired.he - p0he) * (1.0 - (1.0 / powf(2.0, minutes_since_last_check / khe)));

    tissue
}

/// Expose all compartments to `gas` at a constant `amb_pressure` for `seconds`.
pub fn expose_tissues(
    tissues: &mut Tissues,
    amb_pressure: f32,
    gas: &BreathingGas,
    temperature: f32,
    seconds: f32,
) {
    if seconds <= 0.0 {
        return;
    }
    let inspired = gas.inspired(amb_pressure, temperature);
    let minutes = seconds / 60.0;
    for (i, tissue) in tissues.iter_mut().enumerate() {
        *tissue = calculate_tissue(*tissue, i, inspired, minutes);
    }
}

#[test]
fn test_calculate_tissues() {
    let amb_pressure = 5.0;
    let air = BreathingGas::air();
    let inspired = air.inspired(amb_pressure, 20.0);
    let tissue = Tissue {
        load_n2: inspired.n2,
        load_he: inspired.he,
    };
    // already saturated, nothing moves
    let result = calculate_tissue(tissue, 15, inspired, 1.0);
    assert!((result.load_n2 - tissue.load_n2).abs() < 1e-6);
}

#[test]
fn test_one_half_life() {
    let tissue = Tissue { load_n2: 1.0, load_he: 0.0 };
    let inspired = InspiredGas { n2: 3.0, he: 0.0 };
    let result = calculate_tissue(tissue, 0, inspired, ZhL16cGf::N2_HALF_LIFE[0]);
    assert!((result.load_n2 - 2.0).abs() < 1e-5);
}
