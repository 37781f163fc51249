use crate::{config::ViewerConfig, enums::PlaybackStatus};

use std::time::Duration;
use web_time::Instant;

/// Cooperative recurring timer. Nothing fires on its own: the owner polls it
/// with the current time.
#[derive(Debug, Clone)]
pub struct AutoplayTimer {
    interval: Duration,
    next_tick: Option<Instant>,
}

impl AutoplayTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            next_tick: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn start(&mut self, now: Instant) {
        self.next_tick = Some(now + self.interval);
    }

    /// Cancel the pending tick. No-op when already stopped.
    pub fn stop(&mut self) {
        self.next_tick = None;
    }

    pub fn is_active(&self) -> bool {
        self.next_tick.is_some()
    }

    pub fn next_tick(&self) -> Option<Instant> {
        self.next_tick
    }

    /// Consume at most one due tick. Missed ticks are not replayed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_tick {
            Some(deadline) if deadline <= now => {
                let next = deadline + self.interval;
                self.next_tick = Some(if next <= now { now + self.interval } else { next });
                true
            }
            _ => false,
        }
    }
}

/// Which frame is visible, and how it changes: slider, buttons, wheel and
/// autoplay.
#[derive(Debug, Clone)]
pub struct PlaybackController {
    len: usize,
    current_index: usize,
    status: PlaybackStatus,
    scroll_accumulator: i32,
    scroll_threshold: i32,
    timer: AutoplayTimer,
}

impl PlaybackController {
    pub fn new(len: usize, config: &ViewerConfig) -> Self {
        Self {
            len,
            current_index: 0,
            status: PlaybackStatus::Stopped,
            scroll_accumulator: 0,
            scroll_threshold: config.scroll_threshold.max(1),
            timer: AutoplayTimer::new(config.autoplay_interval()),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn scroll_accumulator(&self) -> i32 {
        self.scroll_accumulator
    }

    pub fn next_tick(&self) -> Option<Instant> {
        self.timer.next_tick()
    }

    /// New sequence: back to the first frame, stopped.
    pub fn reset(&mut self, len: usize) {
        self.stop();
        self.len = len;
        self.current_index = 0;
        self.scroll_accumulator = 0;
    }

    pub fn toggle(&mut self) -> PlaybackStatus {
        self.toggle_at(Instant::now())
    }

    /// Start or stop autoplay. An empty sequence never starts.
    pub fn toggle_at(&mut self, now: Instant) -> PlaybackStatus {
        match self.status {
            PlaybackStatus::Playing => self.stop(),
            PlaybackStatus::Stopped => self.play_at(now),
        }
        self.status
    }

    pub fn play_at(&mut self, now: Instant) {
        if self.is_empty() || self.is_playing() {
            return;
        }
        self.timer.start(now);
        self.status = PlaybackStatus::Playing;
        log::debug!("Autoplay started at frame {}", self.current_index);
    }

    /// Stop autoplay and cancel the pending tick. Idempotent.
    pub fn stop(&mut self) {
        self.timer.stop();
        if self.is_playing() {
            self.status = PlaybackStatus::Stopped;
            log::debug!("Autoplay stopped at frame {}", self.current_index);
        }
    }

    /// Advance one frame; at the last frame, stop instead of looping.
    pub fn on_tick(&mut self) {
        if !self.is_playing() {
            return;
        }
        let next = self.current_index + 1;
        if next >= self.len {
            self.current_index = self.len.saturating_sub(1);
            self.stop();
        } else {
            self.current_index = next;
        }
    }

    /// Run a due tick, if any. Returns whether the visible frame changed.
    pub fn poll_at(&mut self, now: Instant) -> bool {
        if !self.is_playing() || !self.timer.poll(now) {
            return false;
        }
        let before = self.current_index;
        self.on_tick();
        before != self.current_index
    }

    /// Slider-style jump, clamped to the sequence. Play state is unchanged.
    pub fn set_index(&mut self, index: usize) {
        self.current_index = index.min(self.len.saturating_sub(1));
    }

    /// Previous/next button: move by `delta` only if the target exists.
    pub fn step(&mut self, delta: isize) -> bool {
        match self.current_index.checked_add_signed(delta) {
            Some(target) if target < self.len => {
                self.current_index = target;
                true
            }
            _ => false,
        }
    }

    /// Accumulate a wheel delta. Crossing the positive threshold steps back
    /// one frame, the negative threshold steps forward; either resets the
    /// accumulator. Returns whether the frame changed.
    pub fn on_scroll(&mut self, delta: i32) -> bool {
        self.scroll_accumulator = self.scroll_accumulator.saturating_add(delta);
        let before = self.current_index;
        if self.scroll_accumulator >= self.scroll_threshold {
            self.current_index = self.current_index.saturating_sub(1);
            self.scroll_accumulator = 0;
        } else if self.scroll_accumulator <= -self.scroll_threshold {
            if self.current_index + 1 < self.len {
                self.current_index += 1;
            }
            self.scroll_accumulator = 0;
        }
        before != self.current_index
    }
}
