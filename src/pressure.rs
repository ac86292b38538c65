//! Depth for the next simulated second, from an aim depth or a recorded profile.

use log::{info, warn};

/// A recorded depth profile: one sample in centimetres every `resolution_seconds`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Replay<'a> {
    samples: &'a [u16],
    resolution_seconds: u16,
    next: usize,
    exhausted: bool,
}

impl<'a> Replay<'a> {
    pub fn new(samples: &'a [u16], resolution_seconds: u16) -> Self {
        Replay {
            samples,
            resolution_seconds: resolution_seconds.max(1),
            next: 0,
            exhausted: samples.is_empty(),
        }
    }

    pub fn resolution_seconds(&self) -> u16 {
        self.resolution_seconds
    }

    /// Past the last sample. The model keeps holding the last recorded depth.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn next_sample(&mut self) -> Option<f32> {
        match self.samples.get(self.next) {
            Some(sample) => {
                self.next += 1;
                Some(*sample as f32 / 100.0)
            }
            None => {
                if !self.exhausted {
                    warn!("replay exhausted after {} samples, holding last depth", self.samples.len());
                    self.exhausted = true;
                }
                None
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientPressureModel<'a> {
    aim_depth_meter: f32,
    descent_rate: f32,
    heed_decostops: bool,
    replay: Option<Replay<'a>>,
    replay_rate: f32,
    ticks_since_sample: u16,
}

impl<'a> AmbientPressureModel<'a> {
    pub fn new(aim_depth_meter: f32, descent_rate: f32) -> Self {
        AmbientPressureModel {
            aim_depth_meter: aim_depth_meter.max(0.0),
            descent_rate: descent_rate.max(1.0),
            heed_decostops: true,
            replay: None,
            replay_rate: 0.0,
            ticks_since_sample: 0,
        }
    }

    pub fn with_replay(replay: Replay<'a>) -> Self {
        info!("replaying {} samples every {} s", replay.samples.len(), replay.resolution_seconds);
        AmbientPressureModel {
            replay: Some(replay),
            ..AmbientPressureModel::new(0.0, 1.0)
        }
    }

    pub fn aim_depth(&self) -> f32 {
        self.aim_depth_meter
    }

    pub fn set_aim_depth(&mut self, depth_meter: f32) {
        self.aim_depth_meter = depth_meter.max(0.0);
    }

    pub fn heed_decostops(&self) -> bool {
        self.heed_decostops
    }

    pub fn set_heed_decostops(&mut self, heed: bool) {
        self.heed_decostops = heed;
    }

    pub fn replay(&self) -> Option<&Replay<'a>> {
        self.replay.as_ref()
    }

    fn pull_sample(&mut self, depth_meter: f32) {
        let Some(replay) = self.replay.as_mut() else {
            return;
        };
        if self.ticks_since_sample == 0 {
            if let Some(sample) = replay.next_sample() {
                let resolution = replay.resolution_seconds as f32;
                self.aim_depth_meter = sample;
                // reach the sample exactly when the next one is due
                self.replay_rate = (sample - depth_meter).abs() * 60.0 / resolution;
            }
        }
        self.ticks_since_sample = (self.ticks_since_sample + 1) % replay.resolution_seconds;
    }

    /// Depth after one second starting from `depth_meter`. Ascents use `ascent_rate`
    /// (m/min) and stop at `stop_depth_meter` while deco stops are heeded.
    pub fn next_depth(&mut self, depth_meter: f32, ascent_rate: f32, stop_depth_meter: f32) -> f32 {
        self.pull_sample(depth_meter);
        let replaying = self.replay.is_some();
        let (descent_rate, ascent_rate) = if replaying {
            (self.replay_rate, self.replay_rate)
        } else {
            (self.descent_rate, ascent_rate)
        };

        let aim = self.aim_depth_meter;
        if depth_meter < aim {
            (depth_meter + descent_rate / 60.0).min(aim)
        } else if depth_meter > aim {
            let next = (depth_meter - ascent_rate / 60.0).max(aim);
            if !replaying && self.heed_decostops && next < stop_depth_meter {
                stop_depth_meter.min(depth_meter)
            } else {
                next
            }
        } else {
            depth_meter
        }
    }
}

#[test]
fn test_descent_reaches_aim() {
    let mut model = AmbientPressureModel::new(20.0, 20.0);
    let mut depth = 0.0;
    for _ in 0..60 {
        depth = model.next_depth(depth, 10.0, 0.0);
    }
    assert!((depth - 20.0).abs() < 1e-3);
    // no overshoot
    assert_eq!(model.next_depth(depth, 10.0, 0.0), 20.0);
}

#[test]
fn test_ascent_pins_at_stop() {
    let mut model = AmbientPressureModel::new(0.0, 20.0);
    let depth = model.next_depth(6.1, 10.0, 6.0);
    assert_eq!(depth, 6.0);
    assert_eq!(model.next_depth(depth, 10.0, 6.0), 6.0);
    model.set_heed_decostops(false);
    assert!(model.next_depth(depth, 10.0, 6.0) < 6.0);
}

#[test]
fn test_zero_resolution_is_floored() {
    let replay = Replay::new(&[100, 200], 0);
    assert_eq!(replay.resolution_seconds(), 1);
}
