use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleState {
    Active,
    Saving,
}

/// Tracks time since the last button press and decides when the screen
/// saver engages. Time advances in whole ticks, never from a wall clock.
#[derive(Debug, Clone)]
pub struct IdleTimer {
    elapsed: Duration,
    timeout: Duration,
    tick: Duration,
    state: IdleState,
}

impl IdleTimer {
    pub fn new(timeout: Duration, tick: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            timeout,
            tick,
            state: IdleState::Active,
        }
    }

    pub fn state(&self) -> IdleState {
        self.state
    }

    pub fn is_saving(&self) -> bool {
        self.state == IdleState::Saving
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Input activity: restart the idle window.
    pub fn touch(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    /// Accounts one idle tick. Returns true exactly when this tick moves the
    /// timer from Active to Saving.
    pub fn tick(&mut self) -> bool {
        if self.state == IdleState::Saving {
            return false;
        }
        self.elapsed = self.elapsed.saturating_add(self.tick);
        if self.elapsed >= self.timeout {
            self.elapsed = Duration::ZERO;
            self.state = IdleState::Saving;
            return true;
        }
        false
    }

    /// Leaves the screen saver after a button press.
    pub fn wake(&mut self) {
        self.state = IdleState::Active;
        self.elapsed = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticks_until_fire(timer: &mut IdleTimer, limit: u32) -> Option<u32> {
        (1..=limit).find(|_| timer.tick())
    }

    #[test]
    fn fires_after_ceil_timeout_over_tick() {
        let mut timer = IdleTimer::new(Duration::from_secs(600), Duration::from_millis(100));
        assert_eq!(ticks_until_fire(&mut timer, 10_000), Some(6000));
        assert!(timer.is_saving());

        let mut timer = IdleTimer::new(Duration::from_millis(250), Duration::from_millis(100));
        assert_eq!(ticks_until_fire(&mut timer, 10), Some(3));
    }

    #[test]
    fn fires_only_once_while_saving() {
        let mut timer = IdleTimer::new(Duration::from_millis(300), Duration::from_millis(100));
        assert_eq!(ticks_until_fire(&mut timer, 10), Some(3));
        assert_eq!(ticks_until_fire(&mut timer, 100), None);
        assert_eq!(timer.state(), IdleState::Saving);
    }

    #[test]
    fn touch_within_window_prevents_firing() {
        let mut timer = IdleTimer::new(Duration::from_millis(500), Duration::from_millis(100));
        for _ in 0..50 {
            for _ in 0..4 {
                assert!(!timer.tick());
            }
            timer.touch();
        }
        assert_eq!(timer.state(), IdleState::Active);
    }

    #[test]
    fn wake_restarts_the_window() {
        let mut timer = IdleTimer::new(Duration::from_millis(200), Duration::from_millis(100));
        assert_eq!(ticks_until_fire(&mut timer, 10), Some(2));
        timer.wake();
        assert_eq!(timer.state(), IdleState::Active);
        assert_eq!(timer.elapsed(), Duration::ZERO);
        assert_eq!(ticks_until_fire(&mut timer, 10), Some(2));
    }
}
