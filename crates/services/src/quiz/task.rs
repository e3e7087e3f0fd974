use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use super::countdown::TimerEpoch;
use super::runner::QuizEvent;

/// Background ticker for one countdown epoch.
///
/// Sends `QuizEvent::Tick(epoch)` every `period` until dropped. Dropping
/// aborts the task, so replacing the handle is enough to cancel it.
pub(crate) struct CountdownTask {
    epoch: TimerEpoch,
    handle: JoinHandle<()>,
}

impl CountdownTask {
    pub(crate) fn spawn(
        epoch: TimerEpoch,
        period: Duration,
        events: UnboundedSender<QuizEvent>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if events.send(QuizEvent::Tick(epoch)).is_err() {
                    break;
                }
            }
        });
        Self { epoch, handle }
    }

    pub(crate) fn epoch(&self) -> TimerEpoch {
        self.epoch
    }
}

impl Drop for CountdownTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
