//! VPM-B: bubble-model stops with critical-volume relaxation.
//!
//! Gradients are kept in bar, the bubble mechanics are evaluated in pascal like the
//! published algorithm. Crushing pressures are recorded on [`LifeData`] every tick.

use libm::{expf, sqrtf};
use log::{debug, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::DiveSettings;
use crate::gas::{BreathingGas, GasChangeList};
use crate::ndl::ndl;
use crate::planner::DecoStrategy;
use crate::state::LifeData;
use crate::stops::{CeilingModel, DecoInfo, unwind};
use crate::tissue::Tissues;
use crate::zh16c::ZhL16cGf;
use crate::COMPARTMENTS;

const PASCAL_PER_BAR: f32 = 1.0e5;
/// Surface tension, N/m.
const GAMMA: f32 = 0.0179;
/// Skin compression, N/m.
const GAMMA_C: f32 = 0.257;
/// Critical radii in micrometres.
const CRITICAL_RADIUS_N2_UM: f32 = 0.55;
const CRITICAL_RADIUS_HE_UM: f32 = 0.45;
const CONSERVATISM_FACTORS: [f32; 5] = [1.0, 1.05, 1.12, 1.22, 1.35];
/// Critical volume parameter, 7500 fsw min.
const LAMBDA_BAR_MINUTES: f32 = 7500.0 / 33.0 * 1.01325;
const REGENERATION_MINUTES: f32 = 20160.0;
/// Partial pressure of O2, CO2 and water vapour in tissue.
const OTHER_GASES_BAR: f32 = 0.136;
const MAX_RELAXATION_ROUNDS: usize = 8;
// schedules this close in total ascent time are considered converged
const CONVERGENCE_SECONDS: u32 = 60;

/// Largest crushing pressure each compartment saw during the dive, bar.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VpmCrushState {
    pub max_crushing_pressure: [f32; COMPARTMENTS],
}

/// Record the crushing pressure of this tick: ambient minus total tissue tension.
pub fn update_crushing(life: &mut LifeData) {
    let amb = life.pressure_ambient_bar;
    for (tissue, max) in life.tissues.iter().zip(life.vpm.max_crushing_pressure.iter_mut()) {
        let crushing = (amb - (tissue.total() + OTHER_GASES_BAR)).max(0.0);
        if crushing > *max {
            *max = crushing;
        }
    }
}

fn time_constant(half_life: f32) -> f32 {
    core::f32::consts::LN_2 / half_life
}

/// Critical radius in metres after crushing and regeneration.
fn adjusted_radius(initial_um: f32, conservatism: u8, crushing_bar: f32, dive_minutes: f32) -> f32 {
    let factor = CONSERVATISM_FACTORS[(conservatism as usize).min(CONSERVATISM_FACTORS.len() - 1)];
    let r0 = initial_um * factor * 1.0e-6;
    let crushing_pa = crushing_bar * PASCAL_PER_BAR;
    let crushed = 1.0 / (crushing_pa / (2.0 * (GAMMA_C - GAMMA)) + 1.0 / r0);
    r0 + (crushed - r0) * expf(-dive_minutes / REGENERATION_MINUTES)
}

/// Allowable supersaturation for a bubble nucleus of radius `radius_m`, bar.
fn initial_gradient(radius_m: f32) -> f32 {
    2.0 * GAMMA * (GAMMA_C - GAMMA) / (radius_m * GAMMA_C) / PASCAL_PER_BAR
}

/// Relax one gradient for a total decompression volume time of `minutes`.
fn relaxed_gradient(initial_bar: f32, crushing_bar: f32, minutes: f32) -> f32 {
    if minutes <= 0.0 {
        return initial_bar;
    }
    let lambda = LAMBDA_BAR_MINUTES * PASCAL_PER_BAR;
    let initial = initial_bar * PASCAL_PER_BAR;
    let crushing = crushing_bar * PASCAL_PER_BAR;
    let b = initial + lambda * GAMMA / (GAMMA_C * minutes);
    let c = GAMMA * GAMMA * lambda * crushing / (GAMMA_C * GAMMA_C * minutes);
    let relaxed = (b + sqrtf((b * b - 4.0 * c).max(0.0))) / 2.0;
    (relaxed / PASCAL_PER_BAR).max(initial_bar)
}

/// Allowable gradients per compartment and inert gas, bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VpmGradients {
    pub n2: [f32; COMPARTMENTS],
    pub he: [f32; COMPARTMENTS],
}

impl VpmGradients {
    pub fn initial(life: &LifeData, conservatism: u8) -> Self {
        let dive_minutes = life.dive_time_seconds as f32 / 60.0;
        let mut gradients = VpmGradients {
            n2: [0.0; COMPARTMENTS],
            he: [0.0; COMPARTMENTS],
        };
        for (i, crushing) in life.vpm.max_crushing_pressure.iter().enumerate() {
            let r_n2 = adjusted_radius(CRITICAL_RADIUS_N2_UM, conservatism, *crushing, dive_minutes);
            let r_he = adjusted_radius(CRITICAL_RADIUS_HE_UM, conservatism, *crushing, dive_minutes);
            gradients.n2[i] = initial_gradient(r_n2);
            gradients.he[i] = initial_gradient(r_he);
        }
        gradients
    }

    fn relaxed(&self, crushing: &[f32; COMPARTMENTS], volume_minutes: &[f32; COMPARTMENTS]) -> Self {
        let mut gradients = *self;
        for i in 0..COMPARTMENTS {
            gradients.n2[i] = relaxed_gradient(self.n2[i], crushing[i], volume_minutes[i]);
            gradients.he[i] = relaxed_gradient(self.he[i], crushing[i], volume_minutes[i]);
        }
        gradients
    }

    /// Gradient for a compartment, weighted by its helium and nitrogen tensions.
    fn blended(&self, tissues: &Tissues, index: usize) -> f32 {
        let tissue = tissues[index];
        let total = tissue.total();
        if total <= 0.0 {
            return self.n2[index];
        }
        (self.he[index] * tissue.load_he + self.n2[index] * tissue.load_n2) / total
    }
}

impl CeilingModel for VpmGradients {
    fn ceiling(&self, tissues: &Tissues, surface_pressure: f32, _next_stop: f32, _first_stop: Option<f32>) -> f32 {
        let tolerated = tissues
            .iter()
            .enumerate()
            .map(|(i, tissue)| tissue.total() + OTHER_GASES_BAR - self.blended(tissues, i))
            .fold(0.0f32, f32::max);
        ((tolerated - surface_pressure) * 10.0).max(0.0)
    }
}

/// Minutes each compartment keeps releasing gas after surfacing.
fn surface_phase_minutes(tissues: &Tissues, surface_pressure: f32, temperature: f32) -> [f32; COMPARTMENTS] {
    let surface_n2 = BreathingGas::air().inspired(surface_pressure, temperature).n2;
    let mut minutes = [0.0; COMPARTMENTS];
    for (i, tissue) in tissues.iter().enumerate() {
        let k_n2 = time_constant(ZhL16cGf::N2_HALF_LIFE[i]);
        let k_he = time_constant(ZhL16cGf::HE_HALF_LIFE[i]);
        let excess_n2 = tissue.load_n2 - surface_n2;
        minutes[i] = if excess_n2 > 0.0 {
            (tissue.load_he / k_he + excess_n2 / k_n2) / (tissue.load_he + excess_n2)
        } else if tissue.load_he > 0.0 {
            1.0 / k_he
        } else {
            0.0
        };
    }
    minutes
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Vpm;

impl DecoStrategy for Vpm {
    fn compute_stops(&self, life: &LifeData, settings: &DiveSettings, gas_changes: &GasChangeList) -> DecoInfo {
        let initial = VpmGradients::initial(life, settings.vpm_conservatism);
        let mut schedule = unwind(life, settings, gas_changes, &initial);
        if !schedule.info.has_stops() && schedule.info.ceiling_meter <= 0.0 {
            schedule.info.ndl_seconds = ndl(
                &life.tissues,
                life.pressure_ambient_bar,
                &life.active_gas,
                life.temperature_celsius,
                |tissues| initial.ceiling(tissues, life.pressure_surface_bar, 0.0, None),
            ) * 60;
            return schedule.info;
        }

        let crushing = life.vpm.max_crushing_pressure;
        let mut converged = false;
        for round in 0..MAX_RELAXATION_ROUNDS {
            let deco_minutes = schedule.info.time_to_surface_seconds as f32 / 60.0;
            let surface = surface_phase_minutes(
                &schedule.surfacing_tissues,
                life.pressure_surface_bar,
                life.temperature_celsius,
            );
            let volume_minutes = surface.map(|minutes| minutes + deco_minutes);
            let relaxed = initial.relaxed(&crushing, &volume_minutes);
            let next = unwind(life, settings, gas_changes, &relaxed);
            let previous = schedule.info.time_to_surface_seconds;
            let current = next.info.time_to_surface_seconds;
            debug!("vpm relaxation round {}: tts {} s -> {} s", round, previous, current);
            schedule = next;
            if previous.abs_diff(current) <= CONVERGENCE_SECONDS {
                converged = true;
                break;
            }
        }
        if !converged {
            warn!("vpm schedule did not converge in {} rounds", MAX_RELAXATION_ROUNDS);
        }
        schedule.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nominal_gradients() {
        let life = LifeData::default();
        let gradients = VpmGradients::initial(&life, 0);
        // 0.55 um nitrogen nucleus allows about 0.6 bar
        assert!((gradients.n2[0] - 0.6056).abs() < 1e-3);
        assert!(gradients.he[0] > gradients.n2[0]);
    }

    #[test]
    fn test_conservatism_lowers_gradients() {
        let life = LifeData::default();
        let nominal = VpmGradients::initial(&life, 0);
        let conservative = VpmGradients::initial(&life, 4);
        assert!(conservative.n2[5] < nominal.n2[5]);
    }

    #[test]
    fn test_crushing_shrinks_nuclei() {
        let mut life = LifeData::default();
        let nominal = VpmGradients::initial(&life, 0);
        life.set_ambient_pressure(5.0);
        update_crushing(&mut life);
        assert!(life.vpm.max_crushing_pressure[0] > 3.0);
        let crushed = VpmGradients::initial(&life, 0);
        assert!(crushed.n2[0] > nominal.n2[0]);
    }

    #[test]
    fn test_relaxation_never_lowers_the_gradient() {
        let relaxed = relaxed_gradient(0.6, 3.0, 30.0);
        assert!(relaxed >= 0.6);
        assert_eq!(relaxed_gradient(0.6, 3.0, 0.0), 0.6);
    }

    #[test]
    fn test_surface_has_no_ceiling() {
        let life = LifeData::default();
        let gradients = VpmGradients::initial(&life, 0);
        assert_eq!(gradients.ceiling(&life.tissues, 1.0, 0.0, None), 0.0);
    }
}
