#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::DecoError;
use crate::gas::{BreathingGas, GAS_SLOTS, GasSlot, first_gas_id};
use crate::ids::{GasId, ScrubberId, SensorId};
use crate::state::DiveDate;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecoType {
    /// Bühlmann ZH-L16C with gradient factors.
    #[default]
    Buehlmann,
    Vpm,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DiveMode {
    #[default]
    OpenCircuit,
    ClosedCircuit,
    SemiClosed,
    Gauge,
    Apnea,
}

impl DiveMode {
    pub fn is_loop(self) -> bool {
        matches!(self, DiveMode::ClosedCircuit | DiveMode::SemiClosed)
    }
}

/// Settings copied into a dive when it starts.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DiveSettings {
    pub deco_type: DecoType,
    pub dive_mode: DiveMode,
    pub gases: [GasSlot; GAS_SLOTS],
    pub setpoint_cbar: u8,
    pub ascent_rate_meter_per_minute: f32,
    pub last_stop_depth_meter: u8,
    pub stop_increment_meter: u8,
    pub gf_low: u8,
    pub gf_high: u8,
    /// VPM-B conservatism, 0 (nominal) to 4.
    pub vpm_conservatism: u8,
    /// Water density excess over fresh water in percent (0 fresh, ~3 sea water).
    pub salinity_percent: u8,
    pub ppo2_max_cbar: u8,
    pub ppo2_min_cbar: u8,
}

impl Default for DiveSettings {
    fn default() -> Self {
        let mut gases = [GasSlot::default(); GAS_SLOTS];
        gases[0] = GasSlot::air();
        gases[1] = GasSlot::air().as_first();
        DiveSettings {
            deco_type: DecoType::Buehlmann,
            dive_mode: DiveMode::OpenCircuit,
            gases,
            setpoint_cbar: 130,
            ascent_rate_meter_per_minute: 10.0,
            last_stop_depth_meter: 3,
            stop_increment_meter: 3,
            gf_low: 30,
            gf_high: 85,
            vpm_conservatism: 0,
            salinity_percent: 0,
            ppo2_max_cbar: 160,
            ppo2_min_cbar: 16,
        }
    }
}

impl DiveSettings {
    pub fn gas(&self, id: GasId) -> &GasSlot {
        &self.gases[id.index()]
    }

    /// The gas a dive starts on, with the loop setpoint in closed circuit modes.
    pub fn first_gas(&self) -> BreathingGas {
        BreathingGas::from_table(&self.gases, first_gas_id(&self.gases), self.setpoint_for_mode())
    }

    pub fn breathing_gas(&self, id: GasId, setpoint_cbar: u8) -> BreathingGas {
        BreathingGas::from_table(&self.gases, id, setpoint_cbar)
    }

    pub fn setpoint_for_mode(&self) -> u8 {
        if self.dive_mode.is_loop() { self.setpoint_cbar } else { 0 }
    }

    pub fn gradient_factors(&self) -> (f32, f32) {
        (self.gf_low as f32 / 100.0, self.gf_high as f32 / 100.0)
    }

    pub fn ascent_rate(&self) -> f32 {
        self.ascent_rate_meter_per_minute.max(1.0)
    }

    pub fn stop_increment(&self) -> f32 {
        self.stop_increment_meter.max(1) as f32
    }

    pub fn validate(&self) -> Result<(), DecoError> {
        if self.gases.iter().any(|slot| slot.active && !slot.is_valid()) {
            return Err(DecoError::InvalidGasMix);
        }
        if self.gf_low == 0 || self.gf_low > self.gf_high || self.gf_high > 100 {
            return Err(DecoError::InvalidGradientFactors);
        }
        if self.stop_increment_meter == 0 {
            return Err(DecoError::InvalidStopGrid);
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScrubberData {
    pub timer_max_minutes: u16,
    pub timer_current_minutes: i16,
    pub last_dive: DiveDate,
}

impl ScrubberData {
    pub fn new(timer_max_minutes: u16) -> Self {
        ScrubberData {
            timer_max_minutes,
            timer_current_minutes: timer_max_minutes.min(i16::MAX as u16) as i16,
            last_dive: DiveDate::default(),
        }
    }

    pub fn reset(&mut self) {
        *self = ScrubberData {
            last_dive: self.last_dive,
            ..ScrubberData::new(self.timer_max_minutes)
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SimulationConfig {
    pub descent_rate_meter_per_minute: f32,
    pub max_aim_depth_meter: u16,
    pub ppo2_offset_step_mv: f32,
    pub ppo2_offset_limit_mv: f32,
    /// Seconds between two refreshes of the deco plan while a dive runs.
    pub deco_refresh_seconds: u16,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            descent_rate_meter_per_minute: 20.0,
            max_aim_depth_meter: 200,
            ppo2_offset_step_mv: 1.1,
            ppo2_offset_limit_mv: 100.0,
            deco_refresh_seconds: 10,
        }
    }
}

impl SimulationConfig {
    pub fn descent_rate(&self) -> f32 {
        self.descent_rate_meter_per_minute.max(1.0)
    }
}

/// Surface consumption rates in litres per minute.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConsumptionRates {
    pub travel_liter_per_minute: u8,
    pub deco_liter_per_minute: u8,
}

impl Default for ConsumptionRates {
    fn default() -> Self {
        ConsumptionRates {
            travel_liter_per_minute: 20,
            deco_liter_per_minute: 15,
        }
    }
}

/// Everything the core reads from the settings store.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    pub dive: DiveSettings,
    pub timeout_dive_reached_zero_depth_seconds: u16,
    /// Ambient pressure above surface pressure still counted as being at the surface.
    pub surface_proximity_bar: f32,
    pub scrubber_timer_enabled: bool,
    pub scrubber_in_use: ScrubberId,
    pub scrubbers: [ScrubberData; ScrubberId::COUNT],
    pub scrubber_min_minutes: i16,
    pub sensor_calibration: [f32; SensorId::COUNT],
    /// Bit n set means sensor n is switched off.
    pub sensors_deactivated: u8,
    pub simulation: SimulationConfig,
    pub consumption: ConsumptionRates,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            dive: DiveSettings::default(),
            timeout_dive_reached_zero_depth_seconds: 300,
            surface_proximity_bar: 0.04,
            scrubber_timer_enabled: false,
            scrubber_in_use: ScrubberId::default(),
            scrubbers: [ScrubberData::new(180); ScrubberId::COUNT],
            scrubber_min_minutes: -99,
            sensor_calibration: [0.0; SensorId::COUNT],
            sensors_deactivated: 0,
            simulation: SimulationConfig::default(),
            consumption: ConsumptionRates::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), DecoError> {
        self.dive.validate()
    }

    pub fn sensor_active(&self, sensor: SensorId) -> bool {
        self.sensors_deactivated & (1 << sensor.raw()) == 0
    }

    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, DecoError> {
        let settings: Settings = serde_json::from_str(json).map_err(|e| {
            log::warn!("rejecting settings: {}", e);
            DecoError::InvalidConfig
        })?;
        settings.validate()?;
        Ok(settings)
    }
}

#[test]
fn test_default_settings_are_valid() {
    assert_eq!(Settings::default().validate(), Ok(()));
    assert_eq!(DiveSettings::default().first_gas().id.index(), 1);
}

#[test]
fn test_invalid_gradient_factors() {
    let settings = DiveSettings {
        gf_low: 90,
        gf_high: 80,
        ..DiveSettings::default()
    };
    assert_eq!(settings.validate(), Err(DecoError::InvalidGradientFactors));
}

#[cfg(feature = "serde")]
#[test]
fn test_settings_from_json() {
    let settings = Settings::from_json(
        r#"{ "dive": { "deco_type": "Vpm", "gf_low": 40, "gf_high": 70 }, "scrubber_timer_enabled": true }"#,
    )
    .unwrap();
    assert_eq!(settings.dive.deco_type, DecoType::Vpm);
    assert_eq!(settings.dive.gf_low, 40);
    assert_eq!(settings.dive.ascent_rate_meter_per_minute, 10.0);
    assert!(settings.scrubber_timer_enabled);

    assert_eq!(Settings::from_json("{ \"dive\": 3 }"), Err(DecoError::InvalidConfig));
}
