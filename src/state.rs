//! Dive state snapshots and the context that owns them.
//!
//! A [`DiveContext`] holds two snapshots, the real one fed by the sensor layer and a
//! simulated one driven by the simulation, plus a selector naming the one in use.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::{DecoType, DiveSettings, Settings};
use crate::gas::BreathingGas;
use crate::ids::{GasId, SensorId};
use crate::stops::DecoInfo;
use crate::tissue::{Tissues, surface_equilibrium};
use crate::vpm::VpmCrushState;
use crate::{DEFAULT_SURFACE_PRESSURE_BAR, depth_from_pressure};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DiveDate {
    pub year: u8,
    pub month: u8,
    pub day: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LifeData {
    pub depth_meter: f32,
    pub pressure_ambient_bar: f32,
    pub pressure_surface_bar: f32,
    pub dive_time_seconds: u32,
    pub dive_time_seconds_without_surface_time: u32,
    pub max_depth_meter: f32,
    pub average_depth_meter: f32,
    pub average_depth_samples: u32,
    pub reset_average_depth: bool,
    /// Positive while ascending.
    pub ascent_rate_meter_per_min: f32,
    pub tissues: Tissues,
    pub cns: f32,
    pub active_gas: BreathingGas,
    pub sensor_voltage_mv: [f32; SensorId::COUNT],
    pub ppo2_sensor_bar: [f32; SensorId::COUNT],
    pub temperature_celsius: f32,
    pub date: DiveDate,
    pub counter_seconds_shallow_depth: u16,
    pub apnea_last_dive_time_seconds: u32,
    pub apnea_last_max_depth_meter: f32,
    pub apnea_total_max_depth_meter: f32,
    pub vpm: VpmCrushState,
}

impl Default for LifeData {
    fn default() -> Self {
        LifeData::at_surface(DEFAULT_SURFACE_PRESSURE_BAR)
    }
}

impl LifeData {
    pub fn at_surface(surface_pressure: f32) -> Self {
        LifeData {
            depth_meter: 0.0,
            pressure_ambient_bar: surface_pressure,
            pressure_surface_bar: surface_pressure,
            dive_time_seconds: 0,
            dive_time_seconds_without_surface_time: 0,
            max_depth_meter: 0.0,
            average_depth_meter: 0.0,
            average_depth_samples: 0,
            reset_average_depth: false,
            ascent_rate_meter_per_min: 0.0,
            tissues: surface_equilibrium(surface_pressure),
            cns: 0.0,
            active_gas: BreathingGas::air(),
            sensor_voltage_mv: [0.0; SensorId::COUNT],
            ppo2_sensor_bar: [0.0; SensorId::COUNT],
            temperature_celsius: 20.0,
            date: DiveDate::default(),
            counter_seconds_shallow_depth: 0,
            apnea_last_dive_time_seconds: 0,
            apnea_last_max_depth_meter: 0.0,
            apnea_total_max_depth_meter: 0.0,
            vpm: VpmCrushState::default(),
        }
    }

    pub fn is_close_to_surface(&self, proximity_bar: f32) -> bool {
        self.pressure_ambient_bar < self.pressure_surface_bar + proximity_bar
    }

    /// Set ambient pressure and derive the depth from it.
    pub fn set_ambient_pressure(&mut self, pressure_bar: f32) {
        self.pressure_ambient_bar = pressure_bar.max(self.pressure_surface_bar);
        self.depth_meter = depth_from_pressure(self.pressure_ambient_bar, self.pressure_surface_bar);
    }

    /// Clear everything that belongs to a single dive, keep tissue, CNS and sensor state.
    pub fn reset_dive(&mut self) {
        let carried = *self;
        *self = LifeData {
            tissues: carried.tissues,
            cns: carried.cns,
            active_gas: carried.active_gas,
            sensor_voltage_mv: carried.sensor_voltage_mv,
            temperature_celsius: carried.temperature_celsius,
            date: carried.date,
            ..LifeData::at_surface(carried.pressure_surface_bar)
        };
    }

    pub(crate) fn update_average_depth(&mut self) {
        if self.reset_average_depth {
            self.average_depth_meter = 0.0;
            self.average_depth_samples = 0;
            self.reset_average_depth = false;
        }
        self.average_depth_samples += 1;
        let n = self.average_depth_samples as f32;
        self.average_depth_meter += (self.depth_meter - self.average_depth_meter) / n;
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DiveActivity {
    #[default]
    Surface,
    Dive,
}

/// Progress of the deco calculation feeding the stop countdown.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecoLock {
    #[default]
    Idle,
    Running,
    Finished,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Warnings {
    pub better_gas: Option<GasId>,
    pub ppo2_high: bool,
    pub ppo2_low: bool,
    pub ceiling_violated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiveState {
    pub life: LifeData,
    pub settings: DiveSettings,
    pub activity: DiveActivity,
    pub deco_buehlmann: DecoInfo,
    pub deco_vpm: DecoInfo,
    pub deco_lock: DecoLock,
    pub warnings: Warnings,
}

impl DiveState {
    pub fn new(settings: DiveSettings, surface_pressure: f32) -> Self {
        DiveState {
            life: LifeData::at_surface(surface_pressure),
            settings,
            activity: DiveActivity::Surface,
            deco_buehlmann: DecoInfo::default(),
            deco_vpm: DecoInfo::default(),
            deco_lock: DecoLock::Idle,
            warnings: Warnings::default(),
        }
    }

    /// The deco list selected by the dive settings.
    pub fn decoinfo(&self) -> &DecoInfo {
        match self.settings.deco_type {
            DecoType::Buehlmann => &self.deco_buehlmann,
            DecoType::Vpm => &self.deco_vpm,
        }
    }

    pub fn decoinfo_mut(&mut self) -> &mut DecoInfo {
        match self.settings.deco_type {
            DecoType::Buehlmann => &mut self.deco_buehlmann,
            DecoType::Vpm => &mut self.deco_vpm,
        }
    }

    /// Depth of the deepest stop still owed, 0 without obligation.
    pub fn actual_deco_stop(&self) -> f32 {
        self.decoinfo().actual_stop_depth(&self.settings)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StateSelector {
    #[default]
    Real,
    Simulated,
}

/// The pieces a tick needs at once: the snapshot being advanced, the real snapshot
/// when a simulation runs, and the settings (scrubber timers are written back).
pub(crate) struct TickParts<'a> {
    pub state: &'a mut DiveState,
    pub real: Option<&'a LifeData>,
    pub settings: &'a mut Settings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiveContext {
    real: DiveState,
    simulated: DiveState,
    used: StateSelector,
    settings: Settings,
}

impl DiveContext {
    pub fn new(settings: Settings) -> Self {
        DiveContext {
            real: DiveState::new(settings.dive, DEFAULT_SURFACE_PRESSURE_BAR),
            simulated: DiveState::new(settings.dive, DEFAULT_SURFACE_PRESSURE_BAR),
            used: StateSelector::Real,
            settings,
        }
    }

    pub fn used(&self) -> StateSelector {
        self.used
    }

    pub fn is_simulation(&self) -> bool {
        self.used == StateSelector::Simulated
    }

    pub fn select(&mut self, selector: StateSelector) {
        self.used = selector;
    }

    /// The snapshot in use.
    pub fn state(&self) -> &DiveState {
        match self.used {
            StateSelector::Real => &self.real,
            StateSelector::Simulated => &self.simulated,
        }
    }

    pub fn state_mut(&mut self) -> &mut DiveState {
        match self.used {
            StateSelector::Real => &mut self.real,
            StateSelector::Simulated => &mut self.simulated,
        }
    }

    pub fn real(&self) -> &DiveState {
        &self.real
    }

    pub fn real_mut(&mut self) -> &mut DiveState {
        &mut self.real
    }

    pub fn simulated(&self) -> &DiveState {
        &self.simulated
    }

    pub fn simulated_mut(&mut self) -> &mut DiveState {
        &mut self.simulated
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Seed the simulated snapshot from the real one: same tissues, CNS, surface
    /// pressure and sensors, fresh dive counters and the current dive settings.
    pub fn prepare_simulation(&mut self) {
        let mut life = self.real.life;
        life.reset_dive();
        self.simulated = DiveState::new(self.settings.dive, life.pressure_surface_bar);
        self.simulated.life = life;
    }

    pub(crate) fn tick_parts(&mut self) -> TickParts<'_> {
        match self.used {
            StateSelector::Real => TickParts {
                state: &mut self.real,
                real: None,
                settings: &mut self.settings,
            },
            StateSelector::Simulated => TickParts {
                state: &mut self.simulated,
                real: Some(&self.real.life),
                settings: &mut self.settings,
            },
        }
    }
}

#[test]
fn test_reset_dive_keeps_saturation() {
    let mut life = LifeData::at_surface(0.95);
    life.cns = 12.0;
    life.tissues[0].load_n2 = 2.0;
    life.dive_time_seconds = 600;
    life.max_depth_meter = 31.0;
    life.reset_dive();
    assert_eq!(life.cns, 12.0);
    assert_eq!(life.tissues[0].load_n2, 2.0);
    assert_eq!(life.dive_time_seconds, 0);
    assert_eq!(life.max_depth_meter, 0.0);
    assert_eq!(life.pressure_surface_bar, 0.95);
}

#[test]
fn test_average_depth() {
    let mut life = LifeData::default();
    for depth in [10.0, 20.0, 30.0] {
        life.depth_meter = depth;
        life.update_average_depth();
    }
    assert!((life.average_depth_meter - 20.0).abs() < 1e-5);
    life.reset_average_depth = true;
    life.depth_meter = 5.0;
    life.update_average_depth();
    assert_eq!(life.average_depth_meter, 5.0);
}
