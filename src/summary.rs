use libm::ceilf;

use crate::config::DiveSettings;
use crate::consumption::salinity_corrected_pressure;
use crate::gas::GasChangeList;
use crate::stops::{DecoInfo, grid_for};

/// Timeline of a planned dive, times in minutes of runtime.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DivePlanSummary {
    pub descent_rate_meter_per_minute: f32,
    pub ascent_rate_meter_per_minute: f32,
    pub time_to_bottom_minutes: u16,
    /// Runtime when the ascent starts.
    pub time_at_bottom_minutes: u16,
    pub time_to_first_stop_minutes: u16,
    /// 0 for a no-decompression dive.
    pub first_stop_depth_meter: f32,
    pub time_to_surface_minutes: u16,
    pub ppo2_at_bottom_bar: f32,
}

fn minutes(value: f32) -> u16 {
    ceilf(value.max(0.0)).min(u16::MAX as f32) as u16
}

pub fn build_plan_summary(
    settings: &DiveSettings,
    descent_rate: f32,
    surface_bar: f32,
    depth_meter: f32,
    dive_time_minutes: u32,
    deco: &DecoInfo,
    gas_changes: &GasChangeList,
) -> DivePlanSummary {
    let descent_rate = descent_rate.max(1.0);
    let ascent_rate = settings.ascent_rate();
    let time_at_bottom = dive_time_minutes.min(u16::MAX as u32) as u16;
    let first_stop = match deco.deepest_stop_index() {
        Some(index) => grid_for(settings).depth_of(index),
        None => 0.0,
    };
    let time_to_first_stop = time_at_bottom.saturating_add(minutes((depth_meter - first_stop) / ascent_rate));
    let time_to_surface = if deco.time_to_surface_seconds > 0 {
        time_at_bottom.saturating_add(minutes(deco.time_to_surface_seconds as f32 / 60.0))
    } else {
        time_to_first_stop
    };

    let bottom_gas = settings.breathing_gas(gas_changes.bottom_gas(), settings.setpoint_for_mode());
    let bottom_bar = salinity_corrected_pressure(depth_meter, surface_bar, settings.salinity_percent);

    DivePlanSummary {
        descent_rate_meter_per_minute: descent_rate,
        ascent_rate_meter_per_minute: ascent_rate,
        time_to_bottom_minutes: minutes(depth_meter / descent_rate),
        time_at_bottom_minutes: time_at_bottom,
        time_to_first_stop_minutes: time_to_first_stop,
        first_stop_depth_meter: first_stop,
        time_to_surface_minutes: time_to_surface,
        ppo2_at_bottom_bar: bottom_gas.ppo2(bottom_bar),
    }
}

#[test]
fn test_deco_dive_timeline() {
    use crate::ids::GasId;
    let settings = DiveSettings::default();
    let mut deco = DecoInfo::default();
    deco.stop_length_seconds[0] = 300;
    deco.stop_length_seconds[1] = 120;
    deco.time_to_surface_seconds = 840;
    let changes = GasChangeList::new(GasId::clamped(1));
    let summary = build_plan_summary(&settings, 20.0, 1.0, 40.0, 25, &deco, &changes);
    assert_eq!(summary.time_to_bottom_minutes, 2);
    assert_eq!(summary.first_stop_depth_meter, 6.0);
    // 34 m at 10 m/min
    assert_eq!(summary.time_to_first_stop_minutes, 29);
    assert_eq!(summary.time_to_surface_minutes, 39);
    assert!((summary.ppo2_at_bottom_bar - 0.21 * 4.9228).abs() < 1e-3);
}
