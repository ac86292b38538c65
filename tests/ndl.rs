use dive_computer_sim::ceiling::max_ceiling;
use dive_computer_sim::gas::BreathingGas;
use dive_computer_sim::ndl::{NDL_MAX_MINUTES, gf_ndl, ndl};
use dive_computer_sim::tissue::{expose_tissues, surface_equilibrium};

fn ndl_at(depth_meter: f32, gf_high: f32) -> u32 {
    let tissues = surface_equilibrium(1.0);
    gf_ndl(&tissues, depth_meter / 10.0 + 1.0, &BreathingGas::air(), 20.0, gf_high, 1.0)
}

#[test]
fn test_ndl_air_30m() {
    let result = ndl_at(30.0, 1.0);
    #[cfg(feature = "std")]
    println!("NDL at 30 m: {} min", result);
    assert!((12..=25).contains(&result), "unexpected NDL {result}");
}

#[test]
fn test_ndl_shrinks_with_depth() {
    let mut previous = NDL_MAX_MINUTES;
    for depth in [12.0, 18.0, 24.0, 30.0, 40.0] {
        let result = ndl_at(depth, 0.85);
        assert!(result <= previous, "{depth} m: {result} > {previous}");
        previous = result;
    }
}

#[test]
fn test_conservative_gf_shortens_ndl() {
    assert!(ndl_at(30.0, 0.7) < ndl_at(30.0, 1.0));
}

#[test]
fn test_ndl_zero_with_existing_ceiling() {
    let mut tissues = surface_equilibrium(1.0);
    expose_tissues(&mut tissues, 5.0, &BreathingGas::air(), 20.0, 30.0 * 60.0);
    let result = ndl(&tissues, 5.0, &BreathingGas::air(), 20.0, |t| max_ceiling(t, 1.0, 1.0).0);
    assert_eq!(result, 0);
}

#[cfg(feature = "std")]
#[test]
fn test_ndl_against_dive_deco() {
    use dive_deco::{BuhlmannModel, DecoModel, Depth, Gas, Time};

    let mut model = BuhlmannModel::default();
    let air = Gas::new(0.21, 0.);
    model.record(Depth::from_meters(30.0), Time::from_seconds(1.0), &air);
    let reference = model.ndl().as_minutes() as f32;
    let result = ndl_at(30.0, 1.0) as f32;
    println!("NDL at 30 m: {result} min, reference {reference} min");
    assert!((result - reference).abs() <= 4.0);
}
