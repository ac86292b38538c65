use dive_computer_sim::pressure::{AmbientPressureModel, Replay};
use dive_computer_sim::{DiveContext, Settings, SimulationDriver};

// depth log in centimetres, one row every resolution step
const PROFILE: &str = "depth_cm
300
750
1200
1800
1800
1500
900
600
600
300
0
";

fn samples() -> Vec<u16> {
    let mut reader = csv::Reader::from_reader(PROFILE.as_bytes());
    reader
        .records()
        .map(|record| record.unwrap()[0].parse().unwrap())
        .collect()
}

#[test]
fn test_replay_hits_every_sample() {
    let samples = samples();
    let resolution = 10;
    let mut model = AmbientPressureModel::with_replay(Replay::new(&samples, resolution));
    let mut depth = 0.0;
    for (i, sample) in samples.iter().enumerate() {
        for _ in 0..resolution {
            depth = model.next_depth(depth, 10.0, 0.0);
        }
        let expected = *sample as f32 / 100.0;
        assert!((depth - expected).abs() < 0.01, "sample {i}: {depth} != {expected}");
    }
    assert!(!model.replay().unwrap().is_exhausted());
}

#[test]
fn test_exhausted_replay_holds_last_depth() {
    let samples = [500u16, 1000];
    let mut model = AmbientPressureModel::with_replay(Replay::new(&samples, 2));
    let mut depth = 0.0;
    for _ in 0..20 {
        depth = model.next_depth(depth, 10.0, 0.0);
    }
    assert!((depth - 10.0).abs() < 1e-4);
    assert!(model.replay().unwrap().is_exhausted());
}

#[test]
fn test_replay_ignores_deco_stops() {
    let samples = [600u16, 0];
    let mut model = AmbientPressureModel::with_replay(Replay::new(&samples, 5));
    let mut depth = 0.0;
    for _ in 0..10 {
        depth = model.next_depth(depth, 10.0, 3.0);
    }
    assert!(depth.abs() < 1e-4);
}

#[test]
fn test_driver_replays_profile() {
    let samples = samples();
    let mut ctx = DiveContext::new(Settings::default());
    let mut driver = SimulationDriver::new();
    driver.start_replay(&mut ctx, Replay::new(&samples, 10));

    driver.run_accelerated(&mut ctx, 40);
    let life = &ctx.state().life;
    assert!((life.depth_meter - 18.0).abs() < 0.01);
    assert!((life.pressure_ambient_bar - 2.8).abs() < 0.001);

    driver.run_accelerated(&mut ctx, 30);
    assert!((ctx.state().life.depth_meter - 9.0).abs() < 0.01);
    assert!((ctx.state().life.max_depth_meter - 18.0).abs() < 0.01);
}
