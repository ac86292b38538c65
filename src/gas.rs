//! Gas table, inspired partial pressures and the better-gas evaluation.

use heapless::Vec;
use log::{debug, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::GasId;
use crate::water_vapor_pressure;

pub const GAS_SLOTS: usize = GasId::COUNT;
pub const GAS_CHANGE_CAPACITY: usize = 10;

// a gas is usable this much deeper than its change depth, rounding noise of the depth sensor
const CHANGE_DEPTH_TOLERANCE: f32 = 0.1;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GasSlot {
    pub oxygen_percentage: u8,
    pub helium_percentage: u8,
    pub active: bool,
    pub first: bool,
    /// Deco gases are only breathed on the ascent.
    pub deco: bool,
    /// Shallowest depth from which the gas may be switched to. 0 marks a bottom gas.
    pub change_depth_meter: u8,
}

impl GasSlot {
    pub const fn new(oxygen_percentage: u8, helium_percentage: u8) -> Self {
        GasSlot {
            oxygen_percentage,
            helium_percentage,
            active: true,
            first: false,
            deco: false,
            change_depth_meter: 0,
        }
    }

    pub const fn air() -> Self {
        GasSlot::new(21, 0)
    }

    pub const fn as_first(mut self) -> Self {
        self.first = true;
        self
    }

    pub const fn as_deco(mut self, change_depth_meter: u8) -> Self {
        self.deco = true;
        self.change_depth_meter = change_depth_meter;
        self
    }

    pub const fn as_travel(mut self, change_depth_meter: u8) -> Self {
        self.deco = false;
        self.change_depth_meter = change_depth_meter;
        self
    }

    pub fn is_valid(&self) -> bool {
        self.oxygen_percentage > 0
            && (self.oxygen_percentage as u16 + self.helium_percentage as u16) <= 100
    }
}

/// Inert gas partial pressures in the alveoli, bar.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct InspiredGas {
    pub n2: f32,
    pub he: f32,
}

/// The gas currently breathed: a slot of the table plus the loop setpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BreathingGas {
    pub id: GasId,
    pub oxygen_percentage: u8,
    pub helium_percentage: u8,
    /// Closed circuit setpoint in centibar, 0 while breathing open circuit.
    pub setpoint_cbar: u8,
}

impl Default for BreathingGas {
    fn default() -> Self {
        BreathingGas::air()
    }
}

impl BreathingGas {
    pub const fn air() -> Self {
        BreathingGas {
            id: GasId::clamped(0),
            oxygen_percentage: 21,
            helium_percentage: 0,
            setpoint_cbar: 0,
        }
    }

    pub fn from_table(gases: &[GasSlot; GAS_SLOTS], id: GasId, setpoint_cbar: u8) -> Self {
        let slot = gases[id.index()];
        BreathingGas {
            id,
            oxygen_percentage: slot.oxygen_percentage,
            helium_percentage: slot.helium_percentage,
            setpoint_cbar,
        }
    }

    pub fn nitrogen_percentage(&self) -> u8 {
        100u8
            .saturating_sub(self.oxygen_percentage)
            .saturating_sub(self.helium_percentage)
    }

    pub fn is_closed_circuit(&self) -> bool {
        self.setpoint_cbar > 0
    }

    /// Oxygen partial pressure at `amb_pressure`. On the loop the setpoint is held unless
    /// the ambient pressure is too low to reach it.
    pub fn ppo2(&self, amb_pressure: f32) -> f32 {
        if self.is_closed_circuit() {
            (self.setpoint_cbar as f32 / 100.0).min(amb_pressure)
        } else {
            amb_pressure * self.oxygen_percentage as f32 / 100.0
        }
    }

    pub fn inspired(&self, amb_pressure: f32, temperature: f32) -> InspiredGas {
        let alveolar = (amb_pressure - water_vapor_pressure(temperature)).max(0.0);
        let n2 = self.nitrogen_percentage() as f32;
        let he = self.helium_percentage as f32;
        if self.is_closed_circuit() {
            // the loop holds oxygen at the setpoint, the diluent inert fraction fills the rest
            let inert_total = (alveolar - self.ppo2(amb_pressure)).max(0.0);
            let inert_percentage = n2 + he;
            if inert_percentage <= 0.0 {
                return InspiredGas::default();
            }
            InspiredGas {
                n2: inert_total * n2 / inert_percentage,
                he: inert_total * he / inert_percentage,
            }
        } else {
            InspiredGas {
                n2: alveolar * n2 / 100.0,
                he: alveolar * he / 100.0,
            }
        }
    }
}

pub fn first_gas_id(gases: &[GasSlot; GAS_SLOTS]) -> GasId {
    let configured = move || GasId::all().skip(1).filter(move |id| gases[id.index()].active);
    configured()
        .find(|id| gases[id.index()].first)
        .or_else(|| configured().next())
        .unwrap_or_default()
}

/// Gas breathed at the bottom: the first gas unless it is a travel or deco mix.
pub fn bottom_gas_id(gases: &[GasSlot; GAS_SLOTS]) -> GasId {
    let first = first_gas_id(gases);
    let slot = gases[first.index()];
    if !slot.deco && slot.change_depth_meter == 0 {
        return first;
    }
    GasId::all()
        .skip(1)
        .find(|id| {
            let slot = gases[id.index()];
            slot.active && !slot.deco && slot.change_depth_meter == 0
        })
        .unwrap_or(first)
}

fn best_candidate(
    gases: &[GasSlot; GAS_SLOTS],
    depth_meter: f32,
    accept: impl Fn(&GasSlot) -> bool,
) -> Option<GasId> {
    let mut best: Option<GasId> = None;
    for id in GasId::all().skip(1) {
        let slot = gases[id.index()];
        if !slot.active || slot.change_depth_meter == 0 || !accept(&slot) {
            continue;
        }
        if (slot.change_depth_meter as f32) < depth_meter - CHANGE_DEPTH_TOLERANCE {
            continue;
        }
        best = match best {
            None => Some(id),
            Some(current) => {
                let held = gases[current.index()];
                let shallower = slot.change_depth_meter < held.change_depth_meter;
                let richer = slot.change_depth_meter == held.change_depth_meter
                    && slot.oxygen_percentage > held.oxygen_percentage;
                if shallower || richer { Some(id) } else { Some(current) }
            }
        };
    }
    best
}

/// Gas to breathe at `depth_meter` while descending or at the bottom: the travel mix
/// with the shallowest usable change depth, otherwise the bottom gas.
pub fn travel_gas_for_depth(gases: &[GasSlot; GAS_SLOTS], depth_meter: f32) -> GasId {
    best_candidate(gases, depth_meter, |slot| !slot.deco).unwrap_or_else(|| bottom_gas_id(gases))
}

/// Deco gas to breathe at `depth_meter` on the ascent. Travel mixes are left behind on the
/// way down; `current` is kept when no deco gas is usable yet.
pub fn deco_gas_for_depth(gases: &[GasSlot; GAS_SLOTS], depth_meter: f32, current: GasId) -> GasId {
    best_candidate(gases, depth_meter, |slot| slot.deco).unwrap_or(current)
}

pub fn better_gas(
    gases: &[GasSlot; GAS_SLOTS],
    depth_meter: f32,
    current: GasId,
    ascending: bool,
) -> Option<GasId> {
    let candidate = if ascending {
        deco_gas_for_depth(gases, depth_meter, current)
    } else {
        travel_gas_for_depth(gases, depth_meter)
    };
    (candidate != current).then_some(candidate)
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GasChange {
    pub depth_meter: f32,
    pub gas: GasId,
}

/// Where gas switches happen along a planned dive.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GasChangeList {
    start: GasId,
    descent: Vec<GasChange, GAS_CHANGE_CAPACITY>,
    ascent: Vec<GasChange, GAS_CHANGE_CAPACITY>,
}

impl GasChangeList {
    pub fn new(start: GasId) -> Self {
        GasChangeList {
            start,
            descent: Vec::new(),
            ascent: Vec::new(),
        }
    }

    pub fn start(&self) -> GasId {
        self.start
    }

    /// Switches made while descending or at the bottom, in the order they happened.
    pub fn descent(&self) -> &[GasChange] {
        &self.descent
    }

    /// Switches planned for the ascent, deepest first.
    pub fn ascent(&self) -> &[GasChange] {
        &self.ascent
    }

    pub fn bottom_gas(&self) -> GasId {
        self.descent.last().map(|change| change.gas).unwrap_or(self.start)
    }

    pub fn push_descent(&mut self, depth_meter: f32, gas: GasId) {
        if self.descent.push(GasChange { depth_meter, gas }).is_err() {
            warn!("gas change list full, dropping switch to gas {} at {} m", gas.raw(), depth_meter);
        }
    }

    pub fn push_ascent(&mut self, depth_meter: f32, gas: GasId) {
        if self.ascent.push(GasChange { depth_meter, gas }).is_err() {
            warn!("gas change list full, dropping switch to gas {} at {} m", gas.raw(), depth_meter);
        }
    }

    /// Plan the ascent switches from `from_depth` with the same rule the stop calculation uses.
    pub fn plan_ascent(&mut self, gases: &[GasSlot; GAS_SLOTS], from_depth: f32) {
        self.ascent.clear();
        let mut depths: Vec<u8, GAS_SLOTS> = Vec::new();
        for slot in gases.iter().skip(1) {
            if slot.active && slot.change_depth_meter > 0 && !depths.contains(&slot.change_depth_meter) {
                // capacity equals the number of slots
                let _ = depths.push(slot.change_depth_meter);
            }
        }
        depths.sort_unstable_by(|a, b| b.cmp(a));

        let mut current = self.bottom_gas();
        for change_depth in depths.iter() {
            let depth = (*change_depth as f32).min(from_depth);
            let next = deco_gas_for_depth(gases, depth, current);
            if next != current {
                debug!("ascent switch to gas {} at {} m", next.raw(), depth);
                self.push_ascent(depth, next);
                current = next;
            }
        }
    }
}
