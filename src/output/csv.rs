use super::{Formatter, iso8601_timestamp};
use crate::platform::FrameReport;

pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format(&self, report: &FrameReport) -> String {
        let timing = &report.timing;
        let audio = &report.audio;
        format!(
            "{},{},{:.3},{:.2},{:.2},{:.3},{:.3},{},{},{},{},{},{}",
            iso8601_timestamp(),
            report.frame_index,
            timing.ms_per_frame,
            timing.frames_per_second,
            timing.megacycles_per_frame,
            timing.work_ms,
            timing.slept_ms,
            timing.missed,
            audio.cursors.play_cursor,
            audio.cursors.write_cursor,
            audio.plan.byte_to_lock,
            audio.plan.target_cursor,
            audio.plan.bytes_to_write
        )
    }

    fn header(&self) -> Option<&'static str> {
        Some(
            "ts,frame,ms_per_frame,frames_per_second,megacycles_per_frame,work_ms,slept_ms,missed,play_cursor,write_cursor,byte_to_lock,target_cursor,bytes_to_write",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::fixtures;

    #[test]
    fn test_csv_matches_header() {
        let formatter = CsvFormatter;
        let line = formatter.format(&fixtures::report());
        let header = formatter.header().unwrap();
        assert_eq!(line.split(',').count(), header.split(',').count());
        assert!(line.ends_with(",6400,6400,12800,19200,6400"));
    }
}
