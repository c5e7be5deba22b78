use std::time::Duration;

use rolling_stats::Stats;

use super::clock::Clock;
use crate::config::TimingConfig;

/// Pacer state within one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacerState {
    /// Simulating and rendering
    Running,
    /// Sleeping or spinning out the rest of the frame budget
    Waiting,
}

/// Timing diagnostics for a completed frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTiming {
    /// Time spent before the pacer started waiting
    pub work_ms: f64,
    /// Time handed to the coarse sleep, including any overshoot
    pub slept_ms: f64,
    /// Full frame duration including the wait
    pub ms_per_frame: f64,
    pub frames_per_second: f64,
    pub megacycles_per_frame: f64,
    /// The frame did not land on its budget: it worked too long, overslept,
    /// or the spin cap ended it early
    pub missed: bool,
}

/// Aggregate frame-time statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacerStats {
    pub frames: usize,
    pub missed: u64,
    pub mean_ms: f64,
    pub std_dev_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

/// Keeps the frame loop on its target cadence
///
/// Each frame is bracketed by `begin_frame` and `finish_frame`. When the work
/// finishes early the pacer sleeps for the remaining budget minus a safety
/// margin (OS sleeps overshoot), then spin-waits the last sub-millisecond.
/// The spin is capped at `max_spin` so a scheduler hiccup cannot stall the
/// loop indefinitely; a capped spin ends the frame early and counts it as
/// missed.
///
/// A frame that overruns its budget is reported and logged, never treated as
/// an error. The next frame starts late.
pub struct FramePacer<C: Clock> {
    clock: C,
    target: Duration,
    safety_margin: Duration,
    max_spin: Duration,
    state: PacerState,
    frame_start: Duration,
    frame_start_cycles: u64,
    stats: Stats<f64>,
    missed: u64,
}

impl<C: Clock> FramePacer<C> {
    pub fn new(config: &TimingConfig, clock: C) -> Self {
        Self::with_budget(
            clock,
            config.target_frame_rate.period(),
            config.sleep_safety_margin(),
            config.max_spin(),
        )
    }

    /// Create a pacer from explicit durations
    ///
    /// # Arguments
    /// * `target` - Frame budget
    /// * `safety_margin` - Part of the remaining budget never slept
    /// * `max_spin` - Upper bound on the busy-wait
    pub fn with_budget(clock: C, target: Duration, safety_margin: Duration, max_spin: Duration) -> Self {
        let frame_start = clock.now();
        let frame_start_cycles = clock.cycles();
        Self {
            clock,
            target,
            safety_margin,
            max_spin,
            state: PacerState::Running,
            frame_start,
            frame_start_cycles,
            stats: Stats::new(),
            missed: 0,
        }
    }

    /// Mark the start of a frame
    pub fn begin_frame(&mut self) {
        self.state = PacerState::Running;
        self.frame_start = self.clock.now();
        self.frame_start_cycles = self.clock.cycles();
    }

    /// Wait out the remainder of the frame budget and report timings
    pub fn finish_frame(&mut self) -> FrameTiming {
        let work = self.elapsed();
        let mut slept = Duration::ZERO;
        let mut overslept = false;
        let mut cut_short = false;

        if work < self.target {
            self.state = PacerState::Waiting;

            if let Some(duration) = sleep_duration(self.target, work, self.safety_margin) {
                let before = self.elapsed();
                self.clock.sleep(duration);
                let after = self.elapsed();
                slept = after.saturating_sub(before);
                overslept = after > self.target;
                if overslept {
                    log::warn!(
                        "Slept past frame target: {:.3}ms > {:.3}ms",
                        ms(after),
                        ms(self.target)
                    );
                }
            }

            let spin_start = self.clock.now();
            while self.elapsed() < self.target {
                if self.clock.now().saturating_sub(spin_start) >= self.max_spin {
                    cut_short = true;
                    break;
                }
                std::hint::spin_loop();
            }
            if cut_short {
                log::warn!(
                    "Spin-wait capped at {:.3}ms, frame ended {:.3}ms early",
                    ms(self.max_spin),
                    ms(self.target.saturating_sub(self.elapsed()))
                );
            }
        } else {
            log::warn!(
                "Missed frame: work took {:.3}ms of a {:.3}ms budget",
                ms(work),
                ms(self.target)
            );
        }

        let frame = self.elapsed();
        let cycles = self.clock.cycles().wrapping_sub(self.frame_start_cycles);
        let missed = work >= self.target || overslept || cut_short;
        if missed {
            self.missed += 1;
        }

        let ms_per_frame = ms(frame);
        self.stats.update(ms_per_frame);

        let timing = FrameTiming {
            work_ms: ms(work),
            slept_ms: ms(slept),
            ms_per_frame,
            frames_per_second: if ms_per_frame > 0.0 {
                1000.0 / ms_per_frame
            } else {
                0.0
            },
            megacycles_per_frame: cycles as f64 / 1_000_000.0,
            missed,
        };
        log::trace!(
            "{:.2}ms/f, {:.2}f/s, {:.2}mc/f",
            timing.ms_per_frame,
            timing.frames_per_second,
            timing.megacycles_per_frame
        );
        timing
    }

    /// Time since `begin_frame`
    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_sub(self.frame_start)
    }

    pub fn state(&self) -> PacerState {
        self.state
    }

    pub fn target(&self) -> Duration {
        self.target
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Statistics over every finished frame, `None` before the first one
    pub fn stats(&self) -> Option<PacerStats> {
        if self.stats.count == 0 {
            return None;
        }
        Some(PacerStats {
            frames: self.stats.count,
            missed: self.missed,
            mean_ms: self.stats.mean,
            std_dev_ms: self.stats.std_dev,
            min_ms: self.stats.min,
            max_ms: self.stats.max,
        })
    }
}

/// Coarse sleep for a frame that has used `elapsed` of its `target` budget
///
/// Leaves `safety_margin` unslept and truncates to whole milliseconds, the
/// granularity OS sleeps can be trusted with. `None` means go straight to
/// the spin-wait.
pub fn sleep_duration(target: Duration, elapsed: Duration, safety_margin: Duration) -> Option<Duration> {
    let remaining = target.checked_sub(elapsed)?;
    let sleep = remaining.checked_sub(safety_margin)?;
    let whole_ms = Duration::from_millis(sleep.as_millis() as u64);
    (!whole_ms.is_zero()).then_some(whole_ms)
}

fn ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::clock::ManualClock;
    use approx::assert_abs_diff_eq;

    fn pacer(clock: &ManualClock, target_ms: f64) -> FramePacer<&ManualClock> {
        FramePacer::with_budget(
            clock,
            Duration::from_secs_f64(target_ms / 1000.0),
            Duration::from_millis(1),
            Duration::from_millis(3),
        )
    }

    #[test]
    fn test_sleep_duration_truncates_to_milliseconds() {
        let sleep = sleep_duration(
            Duration::from_micros(33_333),
            Duration::from_millis(10),
            Duration::from_millis(1),
        );
        assert_eq!(sleep, Some(Duration::from_millis(22)));
    }

    #[test]
    fn test_sleep_duration_none_inside_margin() {
        let target = Duration::from_millis(10);
        assert_eq!(
            sleep_duration(target, Duration::from_micros(9_500), Duration::from_millis(1)),
            None
        );
        assert_eq!(
            sleep_duration(target, Duration::from_millis(12), Duration::from_millis(1)),
            None
        );
    }

    #[test]
    fn test_fast_frame_waits_out_budget() {
        let clock = ManualClock::new(Duration::from_micros(5));
        let mut pacer = pacer(&clock, 33.333);

        pacer.begin_frame();
        clock.advance(Duration::from_millis(10));
        let timing = pacer.finish_frame();

        assert!(!timing.missed);
        assert!(timing.slept_ms > 0.0);
        assert!(timing.ms_per_frame >= 33.333 - 0.01, "{}", timing.ms_per_frame);
        assert!(timing.ms_per_frame < 33.5, "{}", timing.ms_per_frame);
        assert_eq!(pacer.state(), PacerState::Waiting);
    }

    #[test]
    fn test_slow_frame_is_missed_without_waiting() {
        let clock = ManualClock::new(Duration::from_micros(5));
        let mut pacer = pacer(&clock, 10.0);

        pacer.begin_frame();
        clock.advance(Duration::from_millis(15));
        let timing = pacer.finish_frame();

        assert!(timing.missed);
        assert_eq!(timing.slept_ms, 0.0);
        assert_eq!(pacer.state(), PacerState::Running);
        assert_eq!(pacer.stats().unwrap().missed, 1);
    }

    #[test]
    fn test_oversleep_is_reported() {
        let clock = ManualClock::new(Duration::from_micros(5))
            .with_sleep_overshoot(Duration::from_millis(4));
        let mut pacer = pacer(&clock, 20.0);

        pacer.begin_frame();
        clock.advance(Duration::from_millis(2));
        let timing = pacer.finish_frame();

        assert!(timing.missed);
        assert!(timing.ms_per_frame > 20.0);
    }

    #[test]
    fn test_spin_is_capped() {
        // Every poll takes 1ms, so a 3ms cap ends the spin after a few polls
        // even though the sleep was skipped entirely.
        let clock = ManualClock::new(Duration::from_millis(1));
        let mut pacer = FramePacer::with_budget(
            &clock,
            Duration::from_millis(100),
            Duration::from_millis(200),
            Duration::from_millis(3),
        );

        pacer.begin_frame();
        let timing = pacer.finish_frame();
        assert!(timing.ms_per_frame < 20.0, "{}", timing.ms_per_frame);
        assert!(timing.missed);
    }

    #[test]
    fn test_margin_wider_than_spin_cap_reports_short_frame() {
        let clock = ManualClock::new(Duration::from_micros(100));
        let mut pacer = FramePacer::with_budget(
            &clock,
            Duration::from_micros(33_333),
            Duration::from_millis(5),
            Duration::from_millis(3),
        );

        pacer.begin_frame();
        clock.advance(Duration::from_millis(10));
        let timing = pacer.finish_frame();

        assert!(timing.ms_per_frame < 33.283, "{}", timing.ms_per_frame);
        assert!(timing.missed);
        assert_eq!(pacer.stats().unwrap().missed, 1);
    }

    #[test]
    fn test_megacycles_reported() {
        let clock = ManualClock::new(Duration::from_micros(1)).with_cycles_per_second(2_000_000_000);
        let mut pacer = pacer(&clock, 10.0);

        pacer.begin_frame();
        clock.advance(Duration::from_millis(12));
        let timing = pacer.finish_frame();
        assert!(timing.megacycles_per_frame >= 24.0);
        assert!(timing.megacycles_per_frame < 24.1);
    }

    #[test]
    fn test_stats_accumulate() {
        let clock = ManualClock::new(Duration::from_micros(2));
        let mut pacer = pacer(&clock, 20.0);
        assert!(pacer.stats().is_none());

        for _ in 0..5 {
            pacer.begin_frame();
            clock.advance(Duration::from_millis(4));
            pacer.finish_frame();
        }

        let stats = pacer.stats().unwrap();
        assert_eq!(stats.frames, 5);
        assert_eq!(stats.missed, 0);
        assert_abs_diff_eq!(stats.mean_ms, 20.0, epsilon = 0.05);
    }
}
