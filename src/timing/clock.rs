use std::cell::Cell;
use std::time::{Duration, Instant};

/// Time source used by the frame pacer
///
/// `now` is monotonic and measured from an arbitrary origin. `cycles` is a
/// free-running counter used only for diagnostics.
pub trait Clock {
    fn now(&self) -> Duration;
    fn cycles(&self) -> u64;
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `Instant` and the CPU timestamp counter
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    #[cfg(target_arch = "x86_64")]
    fn cycles(&self) -> u64 {
        // SAFETY: RDTSC is available on every x86_64 CPU and has no
        // side effects.
        unsafe { std::arch::x86_64::_rdtsc() }
    }

    #[cfg(not(target_arch = "x86_64"))]
    fn cycles(&self) -> u64 {
        // No portable cycle counter; nanoseconds keep the diagnostics in
        // a comparable unit (1 "cycle" per ns, i.e. a 1 GHz clock).
        self.origin.elapsed().as_nanos() as u64
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Deterministic clock for tests
///
/// Time only moves when the pacer sleeps or polls. Every `now` call advances
/// the clock by `poll_step`, which stands in for the time a spin iteration
/// takes; `sleep` advances by the requested duration plus `sleep_overshoot`.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Duration>,
    poll_step: Duration,
    sleep_overshoot: Duration,
    cycles_per_second: u64,
    slept: Cell<Duration>,
}

impl ManualClock {
    pub fn new(poll_step: Duration) -> Self {
        Self {
            now: Cell::new(Duration::ZERO),
            poll_step,
            sleep_overshoot: Duration::ZERO,
            cycles_per_second: 3_000_000_000,
            slept: Cell::new(Duration::ZERO),
        }
    }

    /// Make every sleep last longer than asked, like a coarse OS timer
    pub fn with_sleep_overshoot(mut self, overshoot: Duration) -> Self {
        self.sleep_overshoot = overshoot;
        self
    }

    pub fn with_cycles_per_second(mut self, cycles_per_second: u64) -> Self {
        self.cycles_per_second = cycles_per_second;
        self
    }

    /// Simulate work taking `duration`
    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }

    /// Total time spent in `sleep`, including overshoot
    pub fn total_slept(&self) -> Duration {
        self.slept.get()
    }

    fn peek(&self) -> Duration {
        self.now.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        let now = self.peek();
        self.advance(self.poll_step);
        now
    }

    fn cycles(&self) -> u64 {
        (self.peek().as_nanos() * self.cycles_per_second as u128 / 1_000_000_000) as u64
    }

    fn sleep(&self, duration: Duration) {
        let actual = duration + self.sleep_overshoot;
        self.advance(actual);
        self.slept.set(self.slept.get() + actual);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn cycles(&self) -> u64 {
        (**self).cycles()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}
