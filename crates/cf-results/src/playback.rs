//! Progressive reveal of a finished run.
//!
//! A run is never animated reading by reading when it is long; the cursor
//! advances by a fixed step chosen so playback takes at most [`MAX_FRAMES`]
//! ticks.

/// Upper bound on the number of ticks a playback takes.
pub const MAX_FRAMES: usize = 140;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Playback {
    state: PlaybackState,
    cursor: usize,
    total: usize,
    step: usize,
}

/// Readings revealed per tick: `max(1, ceil(total / max_frames))`.
pub fn step_for(total: usize, max_frames: usize) -> usize {
    total.div_ceil(max_frames.max(1)).max(1)
}

impl Playback {
    pub fn idle() -> Self {
        Self::default()
    }

    /// Begin revealing a run of `total` readings. The first reading is shown
    /// immediately; an empty run is done at once.
    pub fn start(total: usize, max_frames: usize) -> Self {
        let step = step_for(total, max_frames);
        if total == 0 {
            return Self {
                state: PlaybackState::Done,
                cursor: 0,
                total,
                step,
            };
        }
        let state = if total == 1 {
            PlaybackState::Done
        } else {
            PlaybackState::Playing
        };
        Self {
            state,
            cursor: 1,
            total,
            step,
        }
    }

    /// Advance by one step. Returns `false` when nothing moved.
    pub fn tick(&mut self) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }
        self.cursor = (self.cursor + self.step).min(self.total);
        if self.cursor >= self.total {
            self.state = PlaybackState::Done;
        }
        true
    }

    /// Jump straight to the end.
    pub fn finish(&mut self) {
        if self.state == PlaybackState::Playing {
            self.cursor = self.total;
            self.state = PlaybackState::Done;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::idle();
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_done(&self) -> bool {
        self.state == PlaybackState::Done
    }

    /// Revealed fraction as a percentage; 0 for an empty run.
    pub fn progress_pct(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.cursor as f64 / self.total as f64 * 100.0
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn cursor_is_monotone_and_bounded(total in 0_usize..5000, frames in 1_usize..300) {
            let mut playback = Playback::start(total, frames);
            let mut last = playback.cursor();
            let mut ticks = 0;
            while playback.tick() {
                prop_assert!(playback.cursor() >= last);
                prop_assert!(playback.cursor() <= total);
                last = playback.cursor();
                ticks += 1;
            }
            prop_assert!(playback.is_done());
            prop_assert_eq!(playback.cursor(), total);
            prop_assert!(ticks <= frames);
        }
    }
}
