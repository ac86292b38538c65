//! Per-second progression of a dive, real or simulated.

use log::{debug, info};

use crate::config::{DiveMode, Settings};
use crate::gas::better_gas;
use crate::ids::SensorId;
use crate::oxygen::calculate_cns_exposure;
use crate::pressure::{AmbientPressureModel, Replay};
use crate::state::{DecoLock, DiveActivity, DiveContext, DiveState, LifeData, Warnings};
use crate::tissue::expose_tissues;
use crate::vpm::update_crushing;
use crate::pressure_from_depth;

/// Below this depth ascent-rate tracking is reset and a surfacing diver snaps to the surface.
const SURFACE_NOISE_DEPTH_METER: f32 = 1.5;
/// Grace period at the surface before a non-apnea dive ends.
const SURFACE_GRACE_SECONDS: u16 = 15;
const DEFAULT_SENSOR_COEFFICIENT: f32 = 0.02;
const MIN_SENSOR_COEFFICIENT: f32 = 0.01;
const STOP_TOLERANCE_METER: f32 = 0.001;
const CEILING_WARNING_MARGIN_METER: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickSource {
    /// Paced by the clock. A second already seen is skipped.
    RealTime { second: u32 },
    /// Planning and fast-forward, every call advances one second.
    Accelerated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    Skipped,
    Running,
    /// The diver stayed at the surface for the configured timeout.
    DiveEnded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Simulation<'a> {
    model: AmbientPressureModel<'a>,
    aim_time_seconds: Option<u32>,
    sensor_offset_mv: [f32; SensorId::COUNT],
    last_second: Option<u32>,
    sample_ascent_rate: bool,
    last_pressure: Option<f32>,
    scrubber_seconds: u8,
}

impl<'a> Simulation<'a> {
    pub fn new(aim_depth_meter: f32, aim_time_minutes: u32, descent_rate: f32) -> Self {
        Simulation::with_model(AmbientPressureModel::new(aim_depth_meter, descent_rate), aim_time_minutes)
    }

    pub fn replay(replay: Replay<'a>) -> Self {
        Simulation::with_model(AmbientPressureModel::with_replay(replay), 0)
    }

    fn with_model(model: AmbientPressureModel<'a>, aim_time_minutes: u32) -> Self {
        Simulation {
            model,
            aim_time_seconds: (aim_time_minutes > 0).then_some(aim_time_minutes * 60),
            sensor_offset_mv: [0.0; SensorId::COUNT],
            last_second: None,
            sample_ascent_rate: false,
            last_pressure: None,
            scrubber_seconds: 0,
        }
    }

    pub fn aim_depth(&self) -> f32 {
        self.model.aim_depth()
    }

    pub fn set_aim_depth(&mut self, depth_meter: f32) {
        self.model.set_aim_depth(depth_meter);
    }

    pub fn heed_decostops(&self) -> bool {
        self.model.heed_decostops()
    }

    pub fn set_heed_decostops(&mut self, heed: bool) {
        self.model.set_heed_decostops(heed);
    }

    pub fn model(&self) -> &AmbientPressureModel<'a> {
        &self.model
    }

    pub fn descend_one_meter(&mut self, settings: &Settings) {
        let max = settings.simulation.max_aim_depth_meter as f32;
        self.model.set_aim_depth((self.model.aim_depth() + 1.0).min(max));
    }

    pub fn ascend_one_meter(&mut self) {
        self.model.set_aim_depth((self.model.aim_depth() - 1.0).max(0.0));
    }

    pub fn sensor_offset_mv(&self, sensor: SensorId) -> f32 {
        self.sensor_offset_mv[sensor.index()]
    }

    pub fn increase_ppo2(&mut self, settings: &Settings, sensor: SensorId) {
        if !settings.sensor_active(sensor) {
            return;
        }
        let offset = &mut self.sensor_offset_mv[sensor.index()];
        *offset = (*offset + settings.simulation.ppo2_offset_step_mv).min(settings.simulation.ppo2_offset_limit_mv);
    }

    pub fn decrease_ppo2(&mut self, settings: &Settings, sensor: SensorId) {
        if !settings.sensor_active(sensor) {
            return;
        }
        let offset = &mut self.sensor_offset_mv[sensor.index()];
        *offset = (*offset - settings.simulation.ppo2_offset_step_mv).max(-settings.simulation.ppo2_offset_limit_mv);
    }

    /// Send the simulated diver to the surface.
    pub fn quit(&mut self) {
        self.aim_time_seconds = None;
        self.model.set_aim_depth(0.0);
    }

    /// Advance the snapshot in use by one second.
    pub fn tick(&mut self, ctx: &mut DiveContext, source: TickSource) -> TickOutcome {
        if let TickSource::RealTime { second } = source {
            if self.last_second == Some(second) {
                return TickOutcome::Skipped;
            }
            self.last_second = Some(second);
        }

        let simulated = ctx.is_simulation();
        let parts = ctx.tick_parts();
        let state = parts.state;
        let settings = parts.settings;

        if let Some(aim_time) = self.aim_time_seconds {
            if state.life.dive_time_seconds >= aim_time {
                info!("aim time reached after {} s, surfacing", state.life.dive_time_seconds);
                self.aim_time_seconds = None;
                self.model.set_aim_depth(0.0);
            }
        }

        self.update_ascent_rate(&mut state.life);

        let stop_depth = state.actual_deco_stop();
        if state.deco_lock == DecoLock::Finished && state.life.depth_meter <= stop_depth + STOP_TOLERANCE_METER {
            state.decoinfo_mut().countdown_one_second();
        }

        if let Some(real) = parts.real {
            state.life.temperature_celsius = real.temperature_celsius;
            state.life.sensor_voltage_mv = real.sensor_voltage_mv;
            state.life.date = real.date;
        }

        state.life.dive_time_seconds += 1;

        if simulated {
            let ascent_rate = state.settings.ascent_rate();
            let mut depth = self.model.next_depth(state.life.depth_meter, ascent_rate, stop_depth);
            if self.model.aim_depth() <= 0.0 && depth <= SURFACE_NOISE_DEPTH_METER {
                depth = 0.0;
            }
            let amb = pressure_from_depth(depth, state.life.pressure_surface_bar);
            state.life.set_ambient_pressure(amb);
        } else {
            let amb = state.life.pressure_ambient_bar;
            state.life.set_ambient_pressure(amb);
        }

        if state.life.depth_meter < SURFACE_NOISE_DEPTH_METER {
            self.last_pressure = None;
            self.sample_ascent_rate = false;
            state.life.ascent_rate_meter_per_min = 0.0;
        }

        let life = &mut state.life;
        let apnea = state.settings.dive_mode == DiveMode::Apnea;
        if life.depth_meter > life.max_depth_meter {
            life.max_depth_meter = life.depth_meter;
        }

        let timeout = settings.timeout_dive_reached_zero_depth_seconds;
        if life.is_close_to_surface(settings.surface_proximity_bar) {
            if life.counter_seconds_shallow_depth == 0 {
                if apnea {
                    life.counter_seconds_shallow_depth = 1;
                    life.apnea_last_dive_time_seconds = life.dive_time_seconds;
                    life.apnea_last_max_depth_meter = life.max_depth_meter;
                    life.apnea_total_max_depth_meter = life.apnea_total_max_depth_meter.max(life.max_depth_meter);
                } else {
                    life.counter_seconds_shallow_depth = timeout.saturating_sub(SURFACE_GRACE_SECONDS).max(1);
                }
            }
        } else {
            life.counter_seconds_shallow_depth = 0;
        }

        if life.counter_seconds_shallow_depth == 0 {
            life.dive_time_seconds_without_surface_time += 1;
        }

        if apnea && life.counter_seconds_shallow_depth > 0 {
            // a new breath hold starts from scratch
            life.dive_time_seconds = 0;
            life.max_depth_meter = 0.0;
            life.reset_average_depth = true;
        }

        life.update_average_depth();

        let gas = life.active_gas;
        let amb = life.pressure_ambient_bar;
        expose_tissues(&mut life.tissues, amb, &gas, life.temperature_celsius, 1.0);
        calculate_cns_exposure(1.0, &gas, amb, &mut life.cns);

        self.update_sensors(life, settings);
        update_crushing(life);

        let mut outcome = TickOutcome::Running;
        if life.counter_seconds_shallow_depth > 0 {
            life.counter_seconds_shallow_depth = life.counter_seconds_shallow_depth.saturating_add(1);
            if life.counter_seconds_shallow_depth >= timeout {
                info!("surface timeout after {} s of dive time", life.dive_time_seconds);
                outcome = TickOutcome::DiveEnded;
            }
        }

        self.update_scrubber(state, settings);
        state.warnings = evaluate_warnings(state);
        outcome
    }

    fn update_ascent_rate(&mut self, life: &mut LifeData) {
        self.sample_ascent_rate = !self.sample_ascent_rate;
        if !self.sample_ascent_rate {
            return;
        }
        let amb = life.pressure_ambient_bar;
        if let Some(last) = self.last_pressure {
            // two seconds between samples, 10 m per bar
            life.ascent_rate_meter_per_min = (last - amb) * 300.0;
        }
        self.last_pressure = Some(amb);
    }

    fn update_sensors(&self, life: &mut LifeData, settings: &Settings) {
        let calibration = settings.sensor_calibration;
        for sensor in SensorId::all() {
            let i = sensor.index();
            if !settings.sensor_active(sensor) {
                life.ppo2_sensor_bar[i] = 0.0;
                continue;
            }
            let mut coefficient = calibration[i];
            if coefficient < MIN_SENSOR_COEFFICIENT {
                coefficient = calibration
                    .iter()
                    .copied()
                    .find(|c| *c > MIN_SENSOR_COEFFICIENT)
                    .unwrap_or(DEFAULT_SENSOR_COEFFICIENT);
            }
            let mv = life.sensor_voltage_mv[i] + self.sensor_offset_mv[i];
            life.ppo2_sensor_bar[i] = mv * coefficient * life.pressure_ambient_bar;
        }
    }

    fn update_scrubber(&mut self, state: &DiveState, settings: &mut Settings) {
        if !state.settings.dive_mode.is_loop()
            || state.activity != DiveActivity::Dive
            || !settings.scrubber_timer_enabled
        {
            return;
        }
        self.scrubber_seconds += 1;
        if self.scrubber_seconds < 60 {
            return;
        }
        self.scrubber_seconds = 0;
        let minimum = settings.scrubber_min_minutes;
        let scrubber = &mut settings.scrubbers[settings.scrubber_in_use.index()];
        if scrubber.timer_current_minutes > minimum {
            scrubber.timer_current_minutes -= 1;
        }
        scrubber.last_dive = state.life.date;
        debug!(
            "scrubber {} at {} min",
            settings.scrubber_in_use.raw(),
            scrubber.timer_current_minutes
        );
    }
}

fn evaluate_warnings(state: &DiveState) -> Warnings {
    let life = &state.life;
    let settings = &state.settings;
    let tracks_gas = !matches!(settings.dive_mode, DiveMode::Gauge | DiveMode::Apnea);
    let ascending = life.ascent_rate_meter_per_min > 0.0;
    let ppo2 = life.active_gas.ppo2(life.pressure_ambient_bar);
    let ceiling = state.decoinfo().ceiling_meter;
    Warnings {
        better_gas: if tracks_gas {
            better_gas(&settings.gases, life.depth_meter, life.active_gas.id, ascending)
        } else {
            None
        },
        ppo2_high: tracks_gas && ppo2 > settings.ppo2_max_cbar as f32 / 100.0,
        ppo2_low: tracks_gas && ppo2 < settings.ppo2_min_cbar as f32 / 100.0,
        ceiling_violated: state.deco_lock == DecoLock::Finished
            && life.depth_meter + CEILING_WARNING_MARGIN_METER < ceiling,
    }
}
