use dive_computer_sim::ceiling::{StopGrid, ceiling, gradient_factor_at, max_ceiling};
use dive_computer_sim::gas::BreathingGas;
use dive_computer_sim::tissue::{Tissue, Tissues, expose_tissues, surface_equilibrium};

fn square_profile(depth_meter: f32, bottom_minutes: f32) -> Tissues {
    let mut tissues = surface_equilibrium(1.0);
    let amb_pressure = depth_meter / 10.0 + 1.0;
    expose_tissues(&mut tissues, amb_pressure, &BreathingGas::air(), 20.0, bottom_minutes * 60.0);
    tissues
}

#[test]
fn test_ceiling_with_high_n2_load() {
    let tissue = Tissue {
        load_n2: 5.0,
        load_he: 0.0,
    };
    assert!(ceiling(tissue, 2, 1.0, 1.0) > 0.0, "Ceiling should be greater than 0 for high N2 load");
}

#[test]
fn test_ceiling_with_high_he_load() {
    let tissue = Tissue {
        load_n2: 0.0,
        load_he: 5.0,
    };
    assert!(ceiling(tissue, 3, 1.0, 1.0) > 0.0, "Ceiling should be greater than 0 for high He load");
}

#[test]
fn test_ceiling_with_zero_loads() {
    let tissue = Tissue {
        load_n2: 0.0,
        load_he: 0.0,
    };
    assert_eq!(ceiling(tissue, 0, 1.0, 1.0), 0.0, "Ceiling should be 0 for zero gas loads");
}

#[test]
fn test_known_ceiling_value() {
    let tissue = Tissue {
        load_n2: 3.11,
        load_he: 0.0,
    };
    let grid = StopGrid::new(3.0, 3.0);
    // gf 1.0 tolerates the tension minus a: 2.11 bar
    assert_eq!(grid.round_up(ceiling(tissue, 1, 1.0, 1.0)), 12.0);
    assert_eq!(grid.round_up(ceiling(tissue, 1, 0.3, 1.0)), 15.0);
}

#[test]
fn test_max_ceiling_picks_the_leading_tissue() {
    let mut tissues = surface_equilibrium(1.0);
    tissues[13] = Tissue {
        load_n2: 5.0,
        load_he: 0.0,
    };
    let (max, index) = max_ceiling(&tissues, 1.0, 1.0);
    assert!(max > 0.0);
    assert_eq!(index, 13);
}

#[test]
fn test_lower_surface_pressure_deepens_ceiling() {
    let tissues = square_profile(40.0, 25.0);
    let sea_level = max_ceiling(&tissues, 0.85, 1.0).0;
    let altitude = max_ceiling(&tissues, 0.85, 0.8).0;
    assert!(altitude > sea_level);
}

#[test]
fn test_gradient_factor_without_first_stop() {
    assert_eq!(gradient_factor_at(9.0, 0.0, 0.3, 0.85), 0.85);
}

#[cfg(feature = "std")]
#[test]
fn test_ceiling_generalized_dive_deco() {
    use dive_deco::{BuhlmannModel, DecoModel, Depth, Gas, Time};

    fn compare_ceilings(target_depth: f32, bottom_time: f32) {
        let tissues = square_profile(target_depth, bottom_time);
        let grid = StopGrid::new(3.0, 3.0);
        let ours = grid.round_up(max_ceiling(&tissues, 1.0, 1.0).0);

        let mut model = BuhlmannModel::default();
        let air = Gas::new(0.21, 0.);
        model.record(
            Depth::from_meters(f64::from(target_depth)),
            Time::from_minutes(f64::from(bottom_time)),
            &air,
        );
        let reference = grid.round_up(model.ceiling().as_meters() as f32);
        println!("{target_depth} m for {bottom_time} min: ceiling {ours} m, reference {reference} m");

        assert!(
            (ours - reference).abs() <= 3.0,
            "ceiling {ours} m too far from reference {reference} m"
        );
    }

    for (depth, time) in [(30.0, 30.0), (40.0, 20.0), (40.0, 30.0), (50.0, 20.0)] {
        compare_ceilings(depth, time);
    }
}
