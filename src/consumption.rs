//! Gas needed for a planned dive, per gas slot.

use log::debug;

use crate::config::Settings;
use crate::gas::{GAS_SLOTS, GasChangeList};
use crate::ids::GasId;
use crate::stops::{DecoInfo, grid_for};

/// Bar per metre of fresh water.
const BAR_PER_METER_FRESH: f32 = 0.09807;

/// Ambient pressure for gas planning, with the water density raised by `salinity_percent`.
pub fn salinity_corrected_pressure(depth_meter: f32, surface_bar: f32, salinity_percent: u8) -> f32 {
    surface_bar + depth_meter * BAR_PER_METER_FRESH * (100.0 + salinity_percent as f32) / 100.0
}

struct Tally<'a> {
    litres: [f32; GAS_SLOTS],
    gas: GasId,
    depth: f32,
    surface_bar: f32,
    salinity_percent: u8,
    ascent_changes: &'a GasChangeList,
    next_ascent_change: usize,
}

impl Tally<'_> {
    fn bar(&self, depth: f32) -> f32 {
        salinity_corrected_pressure(depth, self.surface_bar, self.salinity_percent)
    }

    fn breathe(&mut self, depth: f32, minutes: f32, litres_per_minute: f32) {
        let bar = self.bar(depth);
        self.litres[self.gas.index()] += bar * minutes * litres_per_minute;
    }

    /// Apply the ascent switches planned at or below the current depth.
    fn switch_on_ascent(&mut self) {
        while let Some(change) = self.ascent_changes.ascent().get(self.next_ascent_change) {
            if self.depth > change.depth_meter {
                break;
            }
            self.gas = change.gas;
            self.next_ascent_change += 1;
        }
    }

    /// Move up to `target`, splitting the transit at planned switch depths.
    fn ascend(&mut self, target: f32, rate: f32, litres_per_minute: f32) {
        self.switch_on_ascent();
        while self.depth > target {
            let end = match self.ascent_changes.ascent().get(self.next_ascent_change) {
                Some(change) if change.depth_meter > target => change.depth_meter,
                _ => target,
            };
            let minutes = (self.depth - end) / rate;
            self.breathe((self.depth + end) / 2.0, minutes, litres_per_minute);
            self.depth = end;
            self.switch_on_ascent();
        }
    }
}

/// Litres of each gas slot used by a dive to `depth_meter` with `dive_time_minutes`
/// of runtime before the ascent, followed by the stops in `deco`.
pub fn estimate_gas_consumption(
    settings: &Settings,
    surface_bar: f32,
    depth_meter: f32,
    dive_time_minutes: u32,
    deco: &DecoInfo,
    gas_changes: &GasChangeList,
) -> [u16; GAS_SLOTS] {
    let dive = &settings.dive;
    let travel = settings.consumption.travel_liter_per_minute as f32;
    let deco_rate = settings.consumption.deco_liter_per_minute as f32;
    let descent_rate = settings.simulation.descent_rate();
    let ascent_rate = dive.ascent_rate();
    let mut tally = Tally {
        litres: [0.0; GAS_SLOTS],
        gas: gas_changes.start(),
        depth: 0.0,
        surface_bar,
        salinity_percent: dive.salinity_percent,
        ascent_changes: gas_changes,
        next_ascent_change: 0,
    };

    let mut descent_minutes = 0.0;
    for change in gas_changes.descent() {
        let end = change.depth_meter.min(depth_meter);
        if end > tally.depth {
            let minutes = (end - tally.depth) / descent_rate;
            tally.breathe((tally.depth + end) / 2.0, minutes, travel);
            descent_minutes += minutes;
            tally.depth = end;
        }
        tally.gas = change.gas;
    }
    if depth_meter > tally.depth {
        let minutes = (depth_meter - tally.depth) / descent_rate;
        tally.breathe((tally.depth + depth_meter) / 2.0, minutes, travel);
        descent_minutes += minutes;
        tally.depth = depth_meter;
    }
    let bottom_minutes = (dive_time_minutes as f32 - descent_minutes).max(0.0);
    tally.breathe(depth_meter, bottom_minutes, travel);

    let grid = grid_for(dive);
    match deco.deepest_stop_index() {
        Some(deepest) => {
            tally.ascend(grid.depth_of(deepest), ascent_rate, travel);
            for index in (0..=deepest).rev() {
                let stop = grid.depth_of(index);
                tally.ascend(stop, ascent_rate, deco_rate);
                let minutes = deco.stop_length_seconds[index] as f32 / 60.0;
                tally.breathe(stop, minutes, deco_rate);
            }
            tally.ascend(0.0, ascent_rate, deco_rate);
        }
        None => tally.ascend(0.0, ascent_rate, travel),
    }

    debug!("consumption estimate {:?}", tally.litres);
    tally.litres.map(|litres| (litres + 0.5).min(u16::MAX as f32) as u16)
}
