use crate::ceiling::max_ceiling;
use crate::gas::BreathingGas;
use crate::tissue::{Tissues, expose_tissues};

/// Longest no-decompression time reported, in minutes.
pub const NDL_MAX_MINUTES: u32 = 240;

/// Minutes the diver may stay at `amb_pressure` before `ceiling` reports an obligation.
pub fn ndl(
    tissues: &Tissues,
    amb_pressure: f32,
    gas: &BreathingGas,
    temperature: f32,
    ceiling: impl Fn(&Tissues) -> f32,
) -> u32 {
    // while ceiling is 0 keep looping
    let mut tissues = *tissues;
    let mut bottom_time = 0;
    if ceiling(&tissues) > 0.0 {
        return 0;
    }
    loop {
        expose_tissues(&mut tissues, amb_pressure, gas, temperature, 60.0);
        if ceiling(&tissues) > 0.0 || bottom_time >= NDL_MAX_MINUTES {
            return bottom_time;
        }
        bottom_time += 1;
    }
}

/// NDL against the Bühlmann ceiling at `gf_high`.
pub fn gf_ndl(
    tissues: &Tissues,
    amb_pressure: f32,
    gas: &BreathingGas,
    temperature: f32,
    gf_high: f32,
    surface_pressure: f32,
) -> u32 {
    ndl(tissues, amb_pressure, gas, temperature, |t| {
        max_ceiling(t, gf_high, surface_pressure).0
    })
}

#[test]
fn test_ndl_is_capped_at_the_surface() {
    use crate::tissue::surface_equilibrium;
    let tissues = surface_equilibrium(1.0);
    let result = gf_ndl(&tissues, 1.0, &BreathingGas::air(), 20.0, 1.0, 1.0);
    assert_eq!(result, NDL_MAX_MINUTES);
}
