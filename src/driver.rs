//! Runs a simulated dive in real time or fast-forward.

use log::info;

use crate::config::Settings;
use crate::ids::SensorId;
use crate::planner::refresh_deco;
use crate::pressure::Replay;
use crate::simulate::{Simulation, TickOutcome, TickSource};
use crate::state::{DiveActivity, DiveContext, StateSelector};

const FIVE_MINUTES_SECONDS: u32 = 5 * 60;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SimulationDriver<'a> {
    simulation: Option<Simulation<'a>>,
    seconds_since_refresh: u16,
}

impl<'a> SimulationDriver<'a> {
    pub fn new() -> Self {
        SimulationDriver::default()
    }

    pub fn is_running(&self) -> bool {
        self.simulation.is_some()
    }

    pub fn simulation(&self) -> Option<&Simulation<'a>> {
        self.simulation.as_ref()
    }

    fn begin(&mut self, ctx: &mut DiveContext, simulation: Simulation<'a>) {
        ctx.prepare_simulation();
        let state = ctx.simulated_mut();
        state.activity = DiveActivity::Dive;
        state.life.active_gas = state.settings.first_gas();
        refresh_deco(state);
        ctx.select(StateSelector::Simulated);
        self.simulation = Some(simulation);
        self.seconds_since_refresh = 0;
    }

    /// Start a simulated dive from the real diver's saturation.
    pub fn start_dive(&mut self, ctx: &mut DiveContext, aim_depth_meter: f32, aim_time_minutes: u32) {
        info!("simulated dive to {} m for {} min", aim_depth_meter, aim_time_minutes);
        let descent_rate = ctx.settings().simulation.descent_rate();
        self.begin(ctx, Simulation::new(aim_depth_meter, aim_time_minutes, descent_rate));
    }

    pub fn start_replay(&mut self, ctx: &mut DiveContext, replay: Replay<'a>) {
        self.begin(ctx, Simulation::replay(replay));
    }

    /// Leave the simulation and go back to the real snapshot.
    pub fn exit_dive(&mut self, ctx: &mut DiveContext) {
        if self.simulation.take().is_some() {
            info!("simulation ended after {} s", ctx.simulated().life.dive_time_seconds);
        }
        ctx.simulated_mut().activity = DiveActivity::Surface;
        ctx.select(StateSelector::Real);
    }

    pub fn tick(&mut self, ctx: &mut DiveContext, source: TickSource) -> TickOutcome {
        let Some(simulation) = self.simulation.as_mut() else {
            return TickOutcome::Skipped;
        };
        let outcome = simulation.tick(ctx, source);
        match outcome {
            TickOutcome::Skipped => {}
            TickOutcome::Running => {
                self.seconds_since_refresh += 1;
                if self.seconds_since_refresh >= ctx.settings().simulation.deco_refresh_seconds.max(1) {
                    self.seconds_since_refresh = 0;
                    refresh_deco(ctx.state_mut());
                }
            }
            TickOutcome::DiveEnded => self.exit_dive(ctx),
        }
        outcome
    }

    /// Run `seconds` ticks without pacing, stopping early when the dive ends.
    pub fn run_accelerated(&mut self, ctx: &mut DiveContext, seconds: u32) -> TickOutcome {
        let mut outcome = TickOutcome::Skipped;
        for _ in 0..seconds {
            outcome = self.tick(ctx, TickSource::Accelerated);
            if outcome != TickOutcome::Running {
                break;
            }
        }
        outcome
    }

    pub fn add_five_minutes(&mut self, ctx: &mut DiveContext) -> TickOutcome {
        self.run_accelerated(ctx, FIVE_MINUTES_SECONDS)
    }

    pub fn set_aim_depth(&mut self, depth_meter: f32) {
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.set_aim_depth(depth_meter);
        }
    }

    pub fn aim_depth(&self) -> f32 {
        self.simulation.as_ref().map_or(0.0, |s| s.aim_depth())
    }

    pub fn set_heed_decostops(&mut self, heed: bool) {
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.set_heed_decostops(heed);
        }
    }

    pub fn heed_decostops(&self) -> bool {
        self.simulation.as_ref().is_none_or(|s| s.heed_decostops())
    }

    pub fn descend_one_meter(&mut self, settings: &Settings) {
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.descend_one_meter(settings);
        }
    }

    pub fn ascend_one_meter(&mut self) {
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.ascend_one_meter();
        }
    }

    pub fn increase_ppo2(&mut self, settings: &Settings, sensor: SensorId) {
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.increase_ppo2(settings, sensor);
        }
    }

    pub fn decrease_ppo2(&mut self, settings: &Settings, sensor: SensorId) {
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.decrease_ppo2(settings, sensor);
        }
    }

    /// Surface the diver, or end the dive when already at the surface.
    pub fn quit(&mut self, ctx: &mut DiveContext) {
        let Some(simulation) = self.simulation.as_mut() else {
            return;
        };
        let proximity = ctx.settings().surface_proximity_bar;
        if ctx.simulated().life.is_close_to_surface(proximity) {
            self.exit_dive(ctx);
        } else {
            simulation.quit();
        }
    }
}
