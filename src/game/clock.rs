// Decides how many constant-size physics ticks run in a presented frame.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TickMode {
    /// Exactly one tick per presented frame. Movement speed scales with refresh rate.
    #[default]
    PerFrame,
    /// Ticks at a fixed rate regardless of frame rate.
    FixedRate { hz: f32 },
}

pub struct SimClock {
    mode: TickMode,
    accumulator: f32,
}

impl SimClock {
    /// A long hitch never produces more than this many catch-up ticks.
    const MAX_TICKS_PER_FRAME: u32 = 8;

    pub fn new(mode: TickMode) -> Self {
        Self { mode, accumulator: 0.0 }
    }

    /// Number of ticks to run for a frame that took `frame_dt` seconds.
    pub fn ticks_for_frame(&mut self, frame_dt: f32) -> u32 {
        match self.mode {
            TickMode::PerFrame => 1,
            TickMode::FixedRate { hz } => {
                if hz <= 0.0 {
                    return 0;
                }
                let period = 1.0 / hz;
                self.accumulator += frame_dt.max(0.0);
                let ticks = (self.accumulator / period).floor() as u32;
                self.accumulator -= ticks as f32 * period;
                if ticks > Self::MAX_TICKS_PER_FRAME {
                    log::debug!("sim clock dropping {} ticks after a long frame", ticks - Self::MAX_TICKS_PER_FRAME);
                    self.accumulator = 0.0;
                    return Self::MAX_TICKS_PER_FRAME;
                }
                ticks
            }
        }
    }
}
