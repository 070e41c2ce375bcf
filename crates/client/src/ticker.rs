use hexline_engine::TurnClock;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

const TICK: Duration = Duration::from_secs(1);

/// Drives the turn clock once per second while it runs.
///
/// `start` always cancels any running ticker first, so repeated starts never
/// stack two counters.
pub struct TurnClockTicker {
    clock: Arc<Mutex<TurnClock>>,
    display: Arc<watch::Sender<Option<String>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TurnClockTicker {
    pub fn new() -> Self {
        let (display, _) = watch::channel(None);
        Self {
            clock: Arc::new(Mutex::new(TurnClock::default())),
            display: Arc::new(display),
            task: Mutex::new(None),
        }
    }

    /// `MM:SS` while running, `None` while stopped.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.display.subscribe()
    }

    pub fn current(&self) -> Option<String> {
        self.display.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.clock.lock().is_running()
    }

    pub fn start(&self) {
        self.cancel_task();
        let now = Instant::now().into_std();
        {
            let mut clock = self.clock.lock();
            clock.start(now);
            self.display.send_replace(clock.display(now));
        }

        let clock = self.clock.clone();
        let display = self.display.clone();
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + TICK, TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let text = clock.lock().display(Instant::now().into_std());
                display.send_replace(text);
            }
        });
        *self.task.lock() = Some(handle);
    }

    pub fn stop(&self) {
        self.cancel_task();
        self.clock.lock().stop();
        self.display.send_replace(None);
    }

    fn cancel_task(&self) {
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
    }
}

impl Default for TurnClockTicker {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TurnClockTicker {
    fn drop(&mut self) {
        self.cancel_task();
    }
}
