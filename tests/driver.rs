use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use dive_computer_sim::{DiveContext, Settings, SimulationDriver, TickOutcome, TickSource};

#[test]
fn test_accelerated_matches_real_time() {
    let mut fast_ctx = DiveContext::new(Settings::default());
    let mut fast = SimulationDriver::new();
    fast.start_dive(&mut fast_ctx, 30.0, 20);
    fast.run_accelerated(&mut fast_ctx, 900);

    let mut slow_ctx = DiveContext::new(Settings::default());
    let mut slow = SimulationDriver::new();
    slow.start_dive(&mut slow_ctx, 30.0, 20);
    for second in 0..900 {
        slow.tick(&mut slow_ctx, TickSource::RealTime { second });
        // a second tick within the same second does nothing
        assert_eq!(slow.tick(&mut slow_ctx, TickSource::RealTime { second }), TickOutcome::Skipped);
    }

    assert_eq!(fast_ctx.state().life, slow_ctx.state().life);
    assert_eq!(fast_ctx.state().decoinfo(), slow_ctx.state().decoinfo());
}

#[test]
fn test_add_five_minutes() {
    let mut ctx = DiveContext::new(Settings::default());
    let mut driver = SimulationDriver::new();
    driver.start_dive(&mut ctx, 20.0, 60);
    driver.add_five_minutes(&mut ctx);
    assert_eq!(ctx.state().life.dive_time_seconds, 300);
}

#[test]
fn test_tick_without_dive_is_skipped() {
    let mut ctx = DiveContext::new(Settings::default());
    let mut driver = SimulationDriver::new();
    assert_eq!(driver.tick(&mut ctx, TickSource::Accelerated), TickOutcome::Skipped);
    assert_eq!(ctx.real().life.dive_time_seconds, 0);
}

#[test]
fn test_exit_dive_restores_real_snapshot() {
    let mut ctx = DiveContext::new(Settings::default());
    let mut driver = SimulationDriver::new();
    driver.start_dive(&mut ctx, 20.0, 10);
    driver.run_accelerated(&mut ctx, 120);
    driver.exit_dive(&mut ctx);
    assert!(!ctx.is_simulation());
    assert_eq!(ctx.state().life.depth_meter, 0.0);
    assert_eq!(ctx.real().life.tissues, DiveContext::new(Settings::default()).real().life.tissues);
}

#[test]
fn test_aim_depth_controls() {
    let mut ctx = DiveContext::new(Settings::default());
    let mut driver = SimulationDriver::new();
    driver.start_dive(&mut ctx, 199.0, 10);
    let settings = *ctx.settings();
    driver.descend_one_meter(&settings);
    driver.descend_one_meter(&settings);
    assert_eq!(driver.aim_depth(), 200.0);
    driver.set_aim_depth(0.5);
    driver.ascend_one_meter();
    assert_eq!(driver.aim_depth(), 0.0);
    assert!(driver.heed_decostops());
    driver.set_heed_decostops(false);
    assert!(!driver.heed_decostops());
}

#[test]
fn test_ascent_is_held_by_stops() {
    let mut ctx = DiveContext::new(Settings::default());
    let mut driver = SimulationDriver::new();
    driver.start_dive(&mut ctx, 45.0, 25);
    // bottom phase plus four minutes of ascent, not enough to clear the stops
    driver.run_accelerated(&mut ctx, 25 * 60 + 240);

    assert!(driver.is_running());
    assert!(ctx.state().decoinfo().has_stops());
    assert!(ctx.state().actual_deco_stop() >= 3.0);
    assert!(ctx.state().life.depth_meter >= 3.0 - 0.01);
    assert!(ctx.state().life.depth_meter < 45.0);
}

#[test]
fn test_random_profiles_keep_invariants() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..5 {
        let mut ctx = DiveContext::new(Settings::default());
        let mut driver = SimulationDriver::new();
        driver.start_dive(&mut ctx, rng.random_range(5.0..40.0), 30);

        let mut max_depth = 0.0;
        let mut dive_time = 0;
        for _ in 0..600 {
            if rng.random_bool(0.05) {
                driver.set_aim_depth(rng.random_range(0.0..40.0));
            }
            if driver.tick(&mut ctx, TickSource::Accelerated) == TickOutcome::DiveEnded {
                break;
            }
            let life = &ctx.state().life;
            assert!(life.depth_meter >= 0.0);
            assert!(life.max_depth_meter >= max_depth);
            assert_eq!(life.dive_time_seconds, dive_time + 1);
            assert!((life.pressure_ambient_bar - (life.pressure_surface_bar + life.depth_meter / 10.0)).abs() < 1e-4);
            max_depth = life.max_depth_meter;
            dive_time = life.dive_time_seconds;
        }
    }
}

#[test]
fn test_quit_surfaces_then_ends() {
    let mut ctx = DiveContext::new(Settings::default());
    let mut driver = SimulationDriver::new();
    driver.start_dive(&mut ctx, 10.0, 30);
    driver.run_accelerated(&mut ctx, 60);

    driver.quit(&mut ctx);
    assert!(driver.is_running());
    assert_eq!(driver.aim_depth(), 0.0);

    // surfaced, still inside the grace period
    driver.run_accelerated(&mut ctx, 55);
    assert!(driver.is_running());
    assert!(ctx.state().life.depth_meter < 0.01);
    driver.quit(&mut ctx);
    assert!(!driver.is_running());
    assert!(!ctx.is_simulation());
}
