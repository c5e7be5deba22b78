use super::Formatter;
use crate::platform::FrameReport;

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, report: &FrameReport) -> String {
        let timing = &report.timing;
        let missed = if timing.missed { " MISSED" } else { "" };
        if self.verbose {
            let audio = &report.audio;
            format!(
                "Frame {:>6}: {:>6.2}ms/f {:>6.2}f/s {:>7.2}mc/f (work: {:.2}ms, slept: {:.2}ms) [PC: {}, WC: {}, lock: {}, target: {}, write: {}]{}",
                report.frame_index,
                timing.ms_per_frame,
                timing.frames_per_second,
                timing.megacycles_per_frame,
                timing.work_ms,
                timing.slept_ms,
                audio.cursors.play_cursor,
                audio.cursors.write_cursor,
                audio.plan.byte_to_lock,
                audio.plan.target_cursor,
                audio.plan.bytes_to_write,
                missed
            )
        } else {
            format!(
                "Frame {:>6}: {:>6.2}ms/f {:>6.2}f/s {:>7.2}mc/f{}",
                report.frame_index,
                timing.ms_per_frame,
                timing.frames_per_second,
                timing.megacycles_per_frame,
                missed
            )
        }
    }
}
