//! Stop list shared by the deco strategies and the loop that unwinds an ascent into it.

use log::{debug, warn};

use crate::ceiling::StopGrid;
use crate::config::DiveSettings;
use crate::gas::{BreathingGas, GAS_SLOTS, GasChange, GasChangeList, GasSlot};
use crate::oxygen::calculate_cns_exposure;
use crate::pressure_from_depth;
use crate::state::LifeData;
use crate::tissue::{Tissues, expose_tissues};

pub const DECOINFO_MAX_STOPS: usize = 50;
/// Longest single stop the planner will schedule.
pub const MAX_STOP_SECONDS: u32 = 999 * 60;

// a ceiling this close to the next stop counts as cleared
const CEILING_TOLERANCE: f32 = 1e-3;

/// Planner output. Entry 0 of `stop_length_seconds` is the last (shallowest) stop,
/// entry `i` the stop at `last_stop + i * increment`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecoInfo {
    pub stop_length_seconds: [u16; DECOINFO_MAX_STOPS],
    pub time_to_surface_seconds: u32,
    pub ndl_seconds: u32,
    pub ceiling_meter: f32,
    pub cns_at_surface: f32,
    /// A stop hit the length cap or fell outside the list.
    pub overflow: bool,
}

impl Default for DecoInfo {
    fn default() -> Self {
        DecoInfo {
            stop_length_seconds: [0; DECOINFO_MAX_STOPS],
            time_to_surface_seconds: 0,
            ndl_seconds: 0,
            ceiling_meter: 0.0,
            cns_at_surface: 0.0,
            overflow: false,
        }
    }
}

impl DecoInfo {
    pub fn has_stops(&self) -> bool {
        self.stop_length_seconds.iter().any(|&s| s > 0)
    }

    pub fn deepest_stop_index(&self) -> Option<usize> {
        self.stop_length_seconds.iter().rposition(|&s| s > 0)
    }

    pub fn total_stop_seconds(&self) -> u32 {
        self.stop_length_seconds.iter().map(|&s| s as u32).sum()
    }

    /// Depth of the deepest stop still owed, 0 without obligation.
    pub fn actual_stop_depth(&self, settings: &DiveSettings) -> f32 {
        match self.deepest_stop_index() {
            Some(index) => grid_for(settings).depth_of(index),
            None => 0.0,
        }
    }

    /// One second spent at the current stop.
    pub fn countdown_one_second(&mut self) {
        if let Some(index) = self.deepest_stop_index() {
            self.stop_length_seconds[index] -= 1;
        }
        self.time_to_surface_seconds = self.time_to_surface_seconds.saturating_sub(1);
    }

    fn add_stop(&mut self, grid: &StopGrid, depth: f32, seconds: u32) {
        let mut index = grid.index_of(depth);
        if index >= DECOINFO_MAX_STOPS {
            warn!("stop at {} m does not fit the stop list", depth);
            self.overflow = true;
            index = DECOINFO_MAX_STOPS - 1;
        }
        let slot = &mut self.stop_length_seconds[index];
        *slot = (*slot as u32 + seconds).min(u16::MAX as u32) as u16;
    }
}

pub fn grid_for(settings: &DiveSettings) -> StopGrid {
    StopGrid::new(settings.last_stop_depth_meter as f32, settings.stop_increment())
}

/// A decompression model seen by the stop loop.
pub trait CeilingModel {
    /// Shallowest depth in meters the tissues tolerate before moving up to `next_stop`.
    /// `first_stop` is `None` while the first stop is still being searched.
    fn ceiling(&self, tissues: &Tissues, surface_pressure: f32, next_stop: f32, first_stop: Option<f32>) -> f32;
}

/// Result of unwinding an ascent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unwound {
    pub info: DecoInfo,
    pub first_stop: f32,
    pub surfacing_tissues: Tissues,
}

struct Ascent<'a> {
    tissues: Tissues,
    depth: f32,
    gas: BreathingGas,
    cns: f32,
    elapsed_seconds: f32,
    surface: f32,
    temperature: f32,
    gases: &'a [GasSlot; GAS_SLOTS],
    changes: &'a [GasChange],
    next_change: usize,
}

impl Ascent<'_> {
    fn expose(&mut self, depth: f32, seconds: f32) {
        let amb = pressure_from_depth(depth, self.surface);
        expose_tissues(&mut self.tissues, amb, &self.gas, self.temperature, seconds);
        calculate_cns_exposure(seconds, &self.gas, amb, &mut self.cns);
        self.elapsed_seconds += seconds;
    }

    /// Take every planned switch at or below `depth`.
    fn switch_gas(&mut self, depth: f32) {
        while let Some(change) = self.changes.get(self.next_change) {
            if change.depth_meter < depth - CEILING_TOLERANCE {
                break;
            }
            self.next_change += 1;
            if self.gas.is_closed_circuit() || change.gas == self.gas.id {
                continue;
            }
            debug!("deco gas {} from {} m", change.gas.raw(), depth);
            self.gas = BreathingGas::from_table(self.gases, change.gas, 0);
        }
    }

    fn next_change_below(&self, depth: f32) -> Option<f32> {
        self.changes[self.next_change..]
            .iter()
            .map(|change| change.depth_meter)
            .find(|change| *change < depth - CEILING_TOLERANCE)
    }

    /// Ascend to `target` in segments no longer than one stop increment, changing gas
    /// at change depths on the way. Each segment is integrated at its mid depth.
    fn travel_to(&mut self, target: f32, rate: f32, grid: &StopGrid) {
        while self.depth > target + CEILING_TOLERANCE {
            self.switch_gas(self.depth);
            let mut end = target.max(self.depth - grid.increment);
            if let Some(change) = self.next_change_below(self.depth) {
                end = end.max(change);
            }
            let seconds = (self.depth - end) / rate * 60.0;
            self.expose((self.depth + end) / 2.0, seconds);
            self.depth = end;
        }
        self.switch_gas(self.depth);
    }
}

/// Walk the ascent from the diver's current state: travel to the first stop, hold each
/// stop in whole minutes until `model` clears the next one, then surface. Gas switches
/// are taken from the ascent part of `gas_changes`.
pub fn unwind<M: CeilingModel>(
    life: &LifeData,
    settings: &DiveSettings,
    gas_changes: &GasChangeList,
    model: &M,
) -> Unwound {
    let grid = grid_for(settings);
    let rate = settings.ascent_rate();
    let surface = life.pressure_surface_bar;
    let mut info = DecoInfo::default();
    let mut ascent = Ascent {
        tissues: life.tissues,
        depth: life.depth_meter,
        gas: life.active_gas,
        cns: life.cns,
        elapsed_seconds: 0.0,
        surface,
        temperature: life.temperature_celsius,
        gases: &settings.gases,
        changes: gas_changes.ascent(),
        next_change: 0,
    };

    info.ceiling_meter = model.ceiling(&ascent.tissues, surface, 0.0, None);
    if info.ceiling_meter <= 0.0 {
        info.cns_at_surface = life.cns;
        return Unwound {
            info,
            first_stop: 0.0,
            surfacing_tissues: life.tissues,
        };
    }

    let first_stop = grid.round_up(info.ceiling_meter);
    ascent.travel_to(first_stop, rate, &grid);
    let mut stop = first_stop;
    loop {
        let next = grid.next_shallower(stop);
        let mut waited = 0;
        while model.ceiling(&ascent.tissues, surface, next, Some(first_stop)) > next + CEILING_TOLERANCE {
            if waited >= MAX_STOP_SECONDS {
                warn!("stop at {} m exceeds {} s", stop, MAX_STOP_SECONDS);
                info.overflow = true;
                break;
            }
            ascent.expose(stop, 60.0);
            waited += 60;
        }
        if waited > 0 {
            info.add_stop(&grid, stop, waited);
        }
        ascent.depth = ascent.depth.min(stop);
        ascent.travel_to(next, rate, &grid);
        if next <= 0.0 {
            break;
        }
        stop = next;
    }

    info.time_to_surface_seconds = (ascent.elapsed_seconds + 0.5) as u32;
    info.cns_at_surface = ascent.cns;
    Unwound {
        info,
        first_stop,
        surfacing_tissues: ascent.tissues,
    }
}

#[test]
fn test_countdown_takes_the_deepest_stop_first() {
    let mut info = DecoInfo::default();
    info.stop_length_seconds[0] = 120;
    info.stop_length_seconds[2] = 2;
    info.time_to_surface_seconds = 1;
    info.countdown_one_second();
    info.countdown_one_second();
    assert_eq!(info.stop_length_seconds[2], 0);
    assert_eq!(info.time_to_surface_seconds, 0);
    info.countdown_one_second();
    assert_eq!(info.stop_length_seconds[0], 119);
    assert_eq!(info.time_to_surface_seconds, 0);
}

#[test]
fn test_actual_stop_depth() {
    let settings = DiveSettings::default();
    let mut info = DecoInfo::default();
    assert_eq!(info.actual_stop_depth(&settings), 0.0);
    info.stop_length_seconds[3] = 60;
    assert_eq!(info.actual_stop_depth(&settings), 12.0);
}
