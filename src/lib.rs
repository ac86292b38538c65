#![no_std]

#[cfg(feature = "std")]
extern crate std;

use core::fmt;

pub mod buehlmann;
pub mod ceiling;
pub mod config;
pub mod consumption;
pub mod driver;
pub mod gas;
pub mod ids;
pub mod m_value;
pub mod ndl;
pub mod oxygen;
pub mod planner;
pub mod pressure;
pub mod simulate;
pub mod state;
pub mod stops;
pub mod summary;
pub mod tissue;
pub mod vpm;
pub mod zh16c;

pub use config::{DecoType, DiveMode, DiveSettings, ScrubberData, Settings};
pub use driver::SimulationDriver;
pub use gas::{BreathingGas, GasChangeList, GasSlot};
pub use ids::{GasId, ScrubberId, SensorId};
pub use planner::{DecoPlan, DecoStrategy, plan_deco};
pub use pressure::Replay;
pub use simulate::{Simulation, TickOutcome, TickSource};
pub use state::{DiveContext, DiveState, LifeData, StateSelector};
pub use stops::DecoInfo;

/// Number of tissue compartments in the ZH-L16 model.
pub const COMPARTMENTS: usize = 16;

pub const FN2: f32 = 0.79;

/// Default surface pressure used when no barometer reading is available.
pub const DEFAULT_SURFACE_PRESSURE_BAR: f32 = 1.0;

pub fn default_tissue_load(surface_pressure: f32) -> f32 {
    (surface_pressure - water_vapor_pressure(37.0)) * FN2
}

// at 37 deg celsius should return 0.0627 bar (47 mmHg)
pub fn water_vapor_pressure(_temperature: f32) -> f32 {
    // lung temperature is regulated, so the body value is used regardless of water temperature
    0.0627
}

/// Depth in meters for an ambient pressure on the simplified tick path (10 m per bar).
pub fn depth_from_pressure(ambient_bar: f32, surface_bar: f32) -> f32 {
    ((ambient_bar - surface_bar) * 10.0).max(0.0)
}

/// Ambient pressure on the simplified tick path (10 m per bar, salinity ignored).
pub fn pressure_from_depth(depth_meter: f32, surface_bar: f32) -> f32 {
    surface_bar + depth_meter / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecoError {
    InvalidGasMix,
    InvalidGradientFactors,
    InvalidStopGrid,
    InvalidConfig,
}

impl fmt::Display for DecoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecoError::InvalidGasMix => f.write_str("gas mix exceeds 100% or has no oxygen"),
            DecoError::InvalidGradientFactors => {
                f.write_str("gradient factors must satisfy 0 < low <= high <= 100")
            }
            DecoError::InvalidStopGrid => f.write_str("stop increment must be non-zero"),
            DecoError::InvalidConfig => f.write_str("configuration could not be parsed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecoError {}

#[test]
fn test_water_vapor_pressure() {
    assert_eq!(water_vapor_pressure(37.0), 0.0627);
}

#[test]
fn test_depth_pressure_conversion() {
    assert_eq!(pressure_from_depth(20.0, 1.0), 3.0);
    assert_eq!(depth_from_pressure(3.0, 1.0), 20.0);
    // never negative above the surface
    assert_eq!(depth_from_pressure(0.95, 1.0), 0.0);
}
