use libm::powf;

use crate::gas::BreathingGas;

// NOAA single exposure limits: (ppO2 bar, minutes)
const CNS_LIMITS: [(f32, f32); 11] = [
    (0.6, 720.0),
    (0.7, 570.0),
    (0.8, 450.0),
    (0.9, 360.0),
    (1.0, 300.0),
    (1.1, 240.0),
    (1.2, 210.0),
    (1.3, 180.0),
    (1.4, 150.0),
    (1.5, 120.0),
    (1.6, 45.0),
];

// below this ppO2 no CNS load accumulates
const CNS_THRESHOLD_PPO2: f32 = 0.5;
const CNS_HALF_TIME_MINUTES: f32 = 90.0;

/// Allowed minutes at `ppo2`, linearly interpolated in the NOAA table.
pub fn cns_limit_minutes(ppo2: f32) -> Option<f32> {
    if ppo2 <= CNS_THRESHOLD_PPO2 {
        return None;
    }
    let (first_ppo2, first_limit) = CNS_LIMITS[0];
    if ppo2 <= first_ppo2 {
        // ramp from "unlimited" at the threshold to the first table entry
        let fraction = (ppo2 - CNS_THRESHOLD_PPO2) / (first_ppo2 - CNS_THRESHOLD_PPO2);
        return Some(first_limit / fraction.max(f32::EPSILON));
    }
    for pair in CNS_LIMITS.windows(2) {
        let (low_ppo2, low_limit) = pair[0];
        let (high_ppo2, high_limit) = pair[1];
        if ppo2 <= high_ppo2 {
            let fraction = (ppo2 - low_ppo2) / (high_ppo2 - low_ppo2);
            return Some(low_limit + (high_limit - low_limit) * fraction);
        }
    }
    // beyond the table the last limit keeps applying
    Some(CNS_LIMITS[CNS_LIMITS.len() - 1].1)
}

/// Accumulate CNS percentage for `seconds` breathing `gas` at `amb_pressure`.
pub fn calculate_cns_exposure(seconds: f32, gas: &BreathingGas, amb_pressure: f32, cns: &mut f32) {
    if let Some(limit) = cns_limit_minutes(gas.ppo2(amb_pressure)) {
        *cns += seconds / 60.0 / limit * 100.0;
    }
}

/// Surface interval elimination.
pub fn calculate_cns_degrade(cns: &mut f32, seconds: f32) {
    let minutes = seconds / 60.0;
    *cns /= powf(2.0, minutes / CNS_HALF_TIME_MINUTES);
}

#[test]
fn test_cns_at_1_4_bar() {
    let mut cns = 0.0;
    let ean35 = BreathingGas {
        oxygen_percentage: 35,
        ..BreathingGas::air()
    };
    // 4 bar * 0.35 = 1.4 bar -> 150 minutes limit, 15 minutes = 10%
    calculate_cns_exposure(15.0 * 60.0, &ean35, 4.0, &mut cns);
    assert!((cns - 10.0).abs() < 1e-3);
}

#[test]
fn test_cns_degrade_half_time() {
    let mut cns = 40.0;
    calculate_cns_degrade(&mut cns, 90.0 * 60.0);
    assert!((cns - 20.0).abs() < 1e-3);
}

#[test]
fn test_no_cns_on_air_at_surface() {
    let mut cns = 0.0;
    calculate_cns_exposure(3600.0, &BreathingGas::air(), 1.0, &mut cns);
    assert_eq!(cns, 0.0);
}
