/// Identifies one armed run of the countdown.
///
/// Every re-arm hands out a new epoch; ticks carrying an older epoch are
/// ignored, so a tick scheduled for a previous question can never touch the
/// current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerEpoch(u64);

impl TimerEpoch {
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Result of feeding one elapsed second to the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CountdownTick {
    /// Disarmed, or the tick belongs to an earlier epoch.
    Stale,
    Running(u32),
    Expired,
}

/// Per-question countdown for timed kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Countdown {
    initial: u32,
    remaining: u32,
    epoch: u64,
    armed: bool,
}

impl Countdown {
    pub(crate) fn new(initial: u32) -> Self {
        Self {
            initial,
            remaining: initial,
            epoch: 0,
            armed: false,
        }
    }

    /// Starts a fresh run at the full length.
    pub(crate) fn arm(&mut self) -> TimerEpoch {
        self.epoch += 1;
        self.remaining = self.initial;
        self.armed = true;
        TimerEpoch(self.epoch)
    }

    /// Stops the countdown. Outstanding ticks become stale.
    pub(crate) fn disarm(&mut self) {
        if self.armed {
            self.epoch += 1;
        }
        self.armed = false;
        self.remaining = self.initial;
    }

    /// Continues an armed run under a new epoch, keeping the time left.
    pub(crate) fn resume(&mut self) -> Option<TimerEpoch> {
        if !self.armed {
            return None;
        }
        self.epoch += 1;
        Some(TimerEpoch(self.epoch))
    }

    pub(crate) fn tick(&mut self, epoch: TimerEpoch) -> CountdownTick {
        if !self.armed || epoch.0 != self.epoch {
            return CountdownTick::Stale;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.armed = false;
            return CountdownTick::Expired;
        }
        CountdownTick::Running(self.remaining)
    }

    pub(crate) fn active_epoch(&self) -> Option<TimerEpoch> {
        self.armed.then_some(TimerEpoch(self.epoch))
    }

    pub(crate) fn remaining(&self) -> u32 {
        self.remaining
    }

    pub(crate) fn initial(&self) -> u32 {
        self.initial
    }
}
