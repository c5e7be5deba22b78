use serde::Serialize;

use super::{Formatter, iso8601_timestamp};
use crate::platform::FrameReport;

pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonRecord {
    ts: String,
    frame: u64,
    ms_per_frame: f64,
    frames_per_second: f64,
    megacycles_per_frame: f64,
    work_ms: f64,
    slept_ms: f64,
    missed: bool,
    play_cursor: usize,
    write_cursor: usize,
    byte_to_lock: usize,
    target_cursor: usize,
    bytes_to_write: usize,
}

impl Formatter for JsonFormatter {
    fn format(&self, report: &FrameReport) -> String {
        let timing = &report.timing;
        let audio = &report.audio;
        let record = JsonRecord {
            ts: iso8601_timestamp(),
            frame: report.frame_index,
            ms_per_frame: timing.ms_per_frame,
            frames_per_second: timing.frames_per_second,
            megacycles_per_frame: timing.megacycles_per_frame,
            work_ms: timing.work_ms,
            slept_ms: timing.slept_ms,
            missed: timing.missed,
            play_cursor: audio.cursors.play_cursor,
            write_cursor: audio.cursors.write_cursor,
            byte_to_lock: audio.plan.byte_to_lock,
            target_cursor: audio.plan.target_cursor,
            bytes_to_write: audio.plan.bytes_to_write,
        };
        // Serializing plain numbers and strings cannot fail
        serde_json::to_string(&record).unwrap_or_default()
    }
}
