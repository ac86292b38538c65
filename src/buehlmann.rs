//! Bühlmann ZH-L16C stops with gradient factors.

use log::debug;

use crate::ceiling::{gradient_factor_at, max_ceiling};
use crate::config::DiveSettings;
use crate::gas::GasChangeList;
use crate::ndl::gf_ndl;
use crate::planner::DecoStrategy;
use crate::state::LifeData;
use crate::stops::{CeilingModel, DecoInfo, unwind};
use crate::tissue::Tissues;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Buehlmann;

struct GfCeiling {
    gf_low: f32,
    gf_high: f32,
}

impl CeilingModel for GfCeiling {
    fn ceiling(&self, tissues: &Tissues, surface_pressure: f32, next_stop: f32, first_stop: Option<f32>) -> f32 {
        let gf = match first_stop {
            // no obligation while the high gradient factor allows surfacing,
            // otherwise the low one places the first stop
            None if max_ceiling(tissues, self.gf_high, surface_pressure).0 <= 0.0 => return 0.0,
            None => self.gf_low,
            Some(first_stop) => gradient_factor_at(next_stop, first_stop, self.gf_low, self.gf_high),
        };
        max_ceiling(tissues, gf, surface_pressure).0
    }
}

impl DecoStrategy for Buehlmann {
    fn compute_stops(&self, life: &LifeData, settings: &DiveSettings, gas_changes: &GasChangeList) -> DecoInfo {
        let (gf_low, gf_high) = settings.gradient_factors();
        let model = GfCeiling { gf_low, gf_high };
        let mut info = unwind(life, settings, gas_changes, &model).info;
        if !info.has_stops() && info.ceiling_meter <= 0.0 {
            let minutes = gf_ndl(
                &life.tissues,
                life.pressure_ambient_bar,
                &life.active_gas,
                life.temperature_celsius,
                gf_high,
                life.pressure_surface_bar,
            );
            info.ndl_seconds = minutes * 60;
        }
        debug!(
            "buehlmann gf {}/{}: tts {} s, ndl {} s",
            settings.gf_low, settings.gf_high, info.time_to_surface_seconds, info.ndl_seconds
        );
        info
    }
}

#[test]
fn test_no_stops_at_the_surface() {
    let life = LifeData::default();
    let info = Buehlmann.compute_stops(&life, &DiveSettings::default(), &GasChangeList::new(life.active_gas.id));
    assert!(!info.has_stops());
    assert_eq!(info.time_to_surface_seconds, 0);
    assert_eq!(info.ndl_seconds, crate::ndl::NDL_MAX_MINUTES * 60);
}

#[test]
fn test_loaded_tissues_need_stops() {
    use crate::tissue::expose_tissues;
    let mut life = LifeData::default();
    life.set_ambient_pressure(5.0);
    let gas = life.active_gas;
    expose_tissues(&mut life.tissues, 5.0, &gas, 20.0, 40.0 * 60.0);
    let info = Buehlmann.compute_stops(&life, &DiveSettings::default(), &GasChangeList::new(life.active_gas.id));
    assert!(info.has_stops());
    assert!(info.time_to_surface_seconds > info.total_stop_seconds());
    assert_eq!(info.ndl_seconds, 0);
    // tts covers at least the travel from 40 m at 10 m/min
    assert!(info.time_to_surface_seconds >= 240);
}

#[test]
fn test_stops_follow_the_planned_switches() {
    use crate::gas::GasSlot;
    use crate::planner::ascent_gas_changes;
    use crate::tissue::expose_tissues;
    let mut settings = DiveSettings::default();
    settings.gases[2] = GasSlot::new(50, 0).as_deco(21);
    let mut life = LifeData::default();
    life.set_ambient_pressure(5.5);
    let gas = life.active_gas;
    expose_tissues(&mut life.tissues, 5.5, &gas, 20.0, 30.0 * 60.0);

    let planned = ascent_gas_changes(&life, &settings);
    assert_eq!(planned.ascent().len(), 1);
    let with_switch = Buehlmann.compute_stops(&life, &settings, &planned);
    // the table alone does not switch gas
    let air_only = Buehlmann.compute_stops(&life, &settings, &GasChangeList::new(gas.id));
    assert!(with_switch.time_to_surface_seconds < air_only.time_to_surface_seconds);
}
