use dive_computer_sim::state::{DecoLock, DiveActivity, DiveDate};
use dive_computer_sim::{
    DiveContext, DiveMode, ScrubberId, SensorId, Settings, Simulation, SimulationDriver,
    StateSelector, TickOutcome, TickSource,
};

fn simulated_context(settings: Settings) -> DiveContext {
    let mut ctx = DiveContext::new(settings);
    ctx.prepare_simulation();
    ctx.select(StateSelector::Simulated);
    ctx
}

#[test]
fn test_descent_to_20m() {
    let mut ctx = DiveContext::new(Settings::default());
    let mut driver = SimulationDriver::new();
    driver.start_dive(&mut ctx, 20.0, 30);
    assert!(ctx.is_simulation());

    driver.run_accelerated(&mut ctx, 60);

    let life = &ctx.state().life;
    assert!((life.depth_meter - 20.0).abs() < 0.01, "depth {}", life.depth_meter);
    assert!((life.pressure_ambient_bar - 3.0).abs() < 0.001);
    assert_eq!(life.dive_time_seconds, 60);
    assert!((life.max_depth_meter - 20.0).abs() < 0.01);
}

#[test]
fn test_scrubber_counts_minutes_on_the_loop() {
    let mut settings = Settings::default();
    settings.dive.dive_mode = DiveMode::ClosedCircuit;
    settings.scrubber_timer_enabled = true;
    settings.scrubber_in_use = ScrubberId::clamped(1);
    let mut ctx = DiveContext::new(settings);
    let mut driver = SimulationDriver::new();
    driver.start_dive(&mut ctx, 10.0, 30);

    driver.run_accelerated(&mut ctx, 120);

    let scrubbers = ctx.settings().scrubbers;
    assert_eq!(scrubbers[1].timer_current_minutes, 178);
    assert_eq!(scrubbers[0].timer_current_minutes, 180);
}

#[test]
fn test_scrubber_reset_after_dive() {
    let mut settings = Settings::default();
    settings.dive.dive_mode = DiveMode::ClosedCircuit;
    settings.scrubber_timer_enabled = true;
    let mut ctx = DiveContext::new(settings);
    let date = DiveDate {
        year: 26,
        month: 10,
        day: 18,
    };
    ctx.real_mut().life.date = date;
    let mut driver = SimulationDriver::new();
    driver.start_dive(&mut ctx, 10.0, 30);
    driver.run_accelerated(&mut ctx, 180);

    let scrubber = &mut ctx.settings_mut().scrubbers[0];
    assert_eq!(scrubber.timer_current_minutes, 177);
    assert_eq!(scrubber.last_dive, date);

    scrubber.reset();
    assert_eq!(scrubber.timer_current_minutes, 180);
    assert_eq!(scrubber.timer_max_minutes, 180);
    assert_eq!(scrubber.last_dive, date);
}

#[test]
fn test_scrubber_stops_at_minimum() {
    let mut settings = Settings::default();
    settings.dive.dive_mode = DiveMode::ClosedCircuit;
    settings.scrubber_timer_enabled = true;
    settings.scrubbers[0].timer_current_minutes = -98;
    settings.scrubber_min_minutes = -99;
    let mut ctx = DiveContext::new(settings);
    let mut driver = SimulationDriver::new();
    driver.start_dive(&mut ctx, 10.0, 30);

    driver.run_accelerated(&mut ctx, 180);

    assert_eq!(ctx.settings().scrubbers[0].timer_current_minutes, -99);
}

#[test]
fn test_open_circuit_leaves_scrubber_alone() {
    let mut settings = Settings::default();
    settings.scrubber_timer_enabled = true;
    let mut ctx = DiveContext::new(settings);
    let mut driver = SimulationDriver::new();
    driver.start_dive(&mut ctx, 10.0, 30);
    driver.run_accelerated(&mut ctx, 120);
    assert_eq!(ctx.settings().scrubbers[0].timer_current_minutes, 180);
}

#[test]
fn test_sensor_offset_nudges() {
    let settings = Settings::default();
    let mut sim = Simulation::new(0.0, 0, 20.0);
    let sensor = SensorId::clamped(0);
    for _ in 0..10 {
        sim.increase_ppo2(&settings, sensor);
    }
    assert!((sim.sensor_offset_mv(sensor) - 11.0).abs() < 1e-4);

    for _ in 0..200 {
        sim.increase_ppo2(&settings, sensor);
    }
    assert_eq!(sim.sensor_offset_mv(sensor), 100.0);
    assert_eq!(sim.sensor_offset_mv(SensorId::clamped(1)), 0.0);
}

#[test]
fn test_deactivated_sensor_ignores_nudges() {
    let settings = Settings {
        sensors_deactivated: 0b010,
        ..Settings::default()
    };
    let mut sim = Simulation::new(0.0, 0, 20.0);
    sim.increase_ppo2(&settings, SensorId::clamped(1));
    assert_eq!(sim.sensor_offset_mv(SensorId::clamped(1)), 0.0);
}

#[test]
fn test_surfacing_ends_the_dive() {
    let mut ctx = DiveContext::new(Settings::default());
    let mut driver = SimulationDriver::new();
    driver.start_dive(&mut ctx, 5.0, 1);

    // one minute down, half a minute up, then the 15 s grace period
    let outcome = driver.run_accelerated(&mut ctx, 600);

    assert_eq!(outcome, TickOutcome::DiveEnded);
    assert!(!driver.is_running());
    assert_eq!(ctx.used(), StateSelector::Real);
    let sim = ctx.simulated();
    assert_eq!(sim.activity, DiveActivity::Surface);
    assert!(sim.life.dive_time_seconds > 60 && sim.life.dive_time_seconds < 120);
}

#[test]
fn test_surface_boundary_resets_ascent_rate() {
    let mut ctx = simulated_context(Settings::default());
    ctx.state_mut().life.set_ambient_pressure(1.14);
    let mut sim = Simulation::new(0.0, 0, 20.0);
    sim.tick(&mut ctx, TickSource::Accelerated);
    let life = &ctx.state().life;
    assert_eq!(life.ascent_rate_meter_per_min, 0.0);
    assert_eq!(life.pressure_ambient_bar, life.pressure_surface_bar);
    assert_eq!(life.depth_meter, 0.0);
}

#[test]
fn test_apnea_breath_holds() {
    let mut settings = Settings::default();
    settings.dive.dive_mode = DiveMode::Apnea;
    let mut ctx = DiveContext::new(settings);
    let mut driver = SimulationDriver::new();
    driver.start_dive(&mut ctx, 10.0, 0);

    driver.run_accelerated(&mut ctx, 90);
    assert!(ctx.state().life.max_depth_meter > 9.9);

    driver.set_aim_depth(0.0);
    driver.run_accelerated(&mut ctx, 90);

    let life = &ctx.state().life;
    assert!(life.apnea_last_dive_time_seconds > 90);
    assert!(life.apnea_last_max_depth_meter > 9.9);
    assert!(life.apnea_total_max_depth_meter > 9.9);
    // at the surface a fresh breath hold is waiting
    assert_eq!(life.dive_time_seconds, 0);
    assert_eq!(life.max_depth_meter, 0.0);
}

#[test]
fn test_dive_time_advances_each_tick() {
    let mut ctx = DiveContext::new(Settings::default());
    let mut driver = SimulationDriver::new();
    driver.start_dive(&mut ctx, 30.0, 20);
    let mut previous = ctx.state().life.dive_time_seconds;
    for _ in 0..300 {
        driver.tick(&mut ctx, TickSource::Accelerated);
        let now = ctx.state().life.dive_time_seconds;
        assert_eq!(now, previous + 1);
        previous = now;
    }
}

#[test]
fn test_countdown_at_stop() {
    let mut ctx = simulated_context(Settings::default());
    let state = ctx.state_mut();
    state.life.set_ambient_pressure(1.6);
    state.decoinfo_mut().stop_length_seconds[1] = 120;
    state.decoinfo_mut().time_to_surface_seconds = 300;
    state.deco_lock = DecoLock::Finished;
    let mut sim = Simulation::new(0.0, 0, 20.0);

    for _ in 0..10 {
        sim.tick(&mut ctx, TickSource::Accelerated);
    }

    let state = ctx.state();
    assert!((state.life.depth_meter - 6.0).abs() < 1e-4);
    assert_eq!(state.decoinfo().stop_length_seconds[1], 110);
    assert_eq!(state.decoinfo().time_to_surface_seconds, 290);
}

#[test]
fn test_no_countdown_while_deco_is_computing() {
    let mut ctx = simulated_context(Settings::default());
    let state = ctx.state_mut();
    state.life.set_ambient_pressure(1.6);
    state.decoinfo_mut().stop_length_seconds[1] = 120;
    state.deco_lock = DecoLock::Running;
    let mut sim = Simulation::new(0.0, 0, 20.0);
    sim.tick(&mut ctx, TickSource::Accelerated);
    assert_eq!(ctx.state().decoinfo().stop_length_seconds[1], 120);
}
