//! Deco planning: the strategy seam, refreshing the live plan and what-if dives.

use log::info;

use crate::buehlmann::Buehlmann;
use crate::config::{DecoType, DiveMode, DiveSettings};
use crate::gas::{BreathingGas, GasChangeList};
use crate::oxygen::calculate_cns_degrade;
use crate::simulate::{Simulation, TickSource};
use crate::state::{DecoLock, DiveContext, DiveState, LifeData, StateSelector};
use crate::stops::DecoInfo;
use crate::tissue::expose_tissues;
use crate::vpm::Vpm;

/// A decompression algorithm turning the diver's state into a stop list.
pub trait DecoStrategy {
    /// Stops for an ascent from `life`, switching gas where `gas_changes` plans it.
    fn compute_stops(&self, life: &LifeData, settings: &DiveSettings, gas_changes: &GasChangeList) -> DecoInfo;
}

/// Ascent switches from the diver's current depth and gas. Loop modes keep the diluent.
pub fn ascent_gas_changes(life: &LifeData, settings: &DiveSettings) -> GasChangeList {
    let mut changes = GasChangeList::new(life.active_gas.id);
    if settings.dive_mode == DiveMode::OpenCircuit {
        changes.plan_ascent(&settings.gases, life.depth_meter);
    }
    changes
}

fn compute_with(life: &LifeData, settings: &DiveSettings, gas_changes: &GasChangeList) -> DecoInfo {
    match settings.deco_type {
        DecoType::Buehlmann => Buehlmann.compute_stops(life, settings, gas_changes),
        DecoType::Vpm => Vpm.compute_stops(life, settings, gas_changes),
    }
}

/// Run the strategy picked by `settings.deco_type` on the calling thread.
pub fn compute_stops(life: &LifeData, settings: &DiveSettings) -> DecoInfo {
    compute_with(life, settings, &ascent_gas_changes(life, settings))
}

/// VPM on a worker thread, polled until the result is handed back.
#[cfg(feature = "std")]
fn compute_vpm_in_background(life: &LifeData, settings: &DiveSettings, gas_changes: &GasChangeList) -> DecoInfo {
    use std::sync::mpsc::{self, RecvTimeoutError};
    use std::thread;
    use std::time::Duration;

    let (tx, rx) = mpsc::channel();
    let (life_copy, settings_copy, changes_copy) = (*life, *settings, gas_changes.clone());
    thread::spawn(move || {
        // the receiver only goes away after a result arrived
        let _ = tx.send(Vpm.compute_stops(&life_copy, &settings_copy, &changes_copy));
    });
    loop {
        match rx.recv_timeout(Duration::from_millis(2)) {
            Ok(info) => return info,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("vpm worker vanished, computing in place");
                return Vpm.compute_stops(life, settings, gas_changes);
            }
        }
    }
}

fn compute_for_plan(life: &LifeData, settings: &DiveSettings, gas_changes: &GasChangeList) -> DecoInfo {
    #[cfg(feature = "std")]
    if settings.deco_type == DecoType::Vpm {
        return compute_vpm_in_background(life, settings, gas_changes);
    }
    compute_with(life, settings, gas_changes)
}

fn store(state: &mut DiveState, info: DecoInfo) {
    state.deco_lock = DecoLock::Running;
    *state.decoinfo_mut() = info;
    state.deco_lock = DecoLock::Finished;
}

/// Recompute the selected stop list from the state's tissues. The countdown only
/// runs while the lock reads [`DecoLock::Finished`].
pub fn refresh_deco(state: &mut DiveState) {
    let info = compute_stops(&state.life, &state.settings);
    store(state, info);
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecoPlan {
    pub deco: DecoInfo,
    pub gas_changes: GasChangeList,
    /// The planned diver at the end of the bottom phase, holding `deco`.
    pub bottom: DiveState,
}

/// Plan a dive to `depth_meter` for `dive_time_minutes` after `interval_minutes` at the
/// surface, starting from the real diver's saturation. Runs on a copy of `ctx`, so a
/// simulated dive in progress is left untouched.
pub fn plan_deco(ctx: &DiveContext, depth_meter: f32, interval_minutes: u32, dive_time_minutes: u32) -> DecoPlan {
    let mut scratch = ctx.clone();
    scratch.prepare_simulation();
    scratch.select(StateSelector::Simulated);

    let state = scratch.simulated_mut();
    if interval_minutes > 0 {
        let seconds = (interval_minutes * 60) as f32;
        let surface = state.life.pressure_surface_bar;
        let temperature = state.life.temperature_celsius;
        expose_tissues(&mut state.life.tissues, surface, &BreathingGas::air(), temperature, seconds);
        calculate_cns_degrade(&mut state.life.cns, seconds);
    }
    state.life.active_gas = state.settings.first_gas();
    let mut gas_changes = GasChangeList::new(state.life.active_gas.id);

    let descent_rate = scratch.settings().simulation.descent_rate();
    let mut simulation = Simulation::new(depth_meter, dive_time_minutes, descent_rate);
    for _ in 0..dive_time_minutes * 60 {
        simulation.tick(&mut scratch, TickSource::Accelerated);
        let state = scratch.simulated_mut();
        if let Some(better) = state.warnings.better_gas {
            let setpoint = state.life.active_gas.setpoint_cbar;
            state.life.active_gas = state.settings.breathing_gas(better, setpoint);
            if state.settings.dive_mode == DiveMode::OpenCircuit {
                gas_changes.push_descent(state.life.depth_meter, better);
            }
        }
    }

    let state = scratch.simulated_mut();
    if state.settings.dive_mode == DiveMode::OpenCircuit {
        gas_changes.plan_ascent(&state.settings.gases, state.life.depth_meter);
    }
    let info = compute_for_plan(&state.life, &state.settings, &gas_changes);
    store(state, info);
    info!(
        "planned {} m for {} min after {} min: tts {} s",
        depth_meter, dive_time_minutes, interval_minutes, info.time_to_surface_seconds
    );

    DecoPlan {
        deco: info,
        gas_changes,
        bottom: scratch.simulated().clone(),
    }
}
