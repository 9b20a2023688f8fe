//! Upload/download timing and throughput, reported at the end of a
//! run. Grounded on `hello-python`'s `performance.py`: two timers and
//! a derived report, not a protocol concern.

use std::time::{Duration, Instant};

/// Accumulates the four timestamps of one upload->download cycle and
/// derives durations/throughput from them on request.
#[derive(Debug, Clone, Copy)]
pub struct PerformanceMonitor {
    file_size: u64,
    upload_start: Option<Instant>,
    upload_end: Option<Instant>,
    download_start: Option<Instant>,
    download_end: Option<Instant>,
}

impl PerformanceMonitor {
    pub fn new(file_size: u64) -> Self {
        Self {
            file_size,
            upload_start: None,
            upload_end: None,
            download_start: None,
            download_end: None,
        }
    }

    pub fn start_upload(&mut self) {
        self.upload_start = Some(Instant::now());
    }

    pub fn end_upload(&mut self) {
        self.upload_end = Some(Instant::now());
    }

    pub fn start_download(&mut self) {
        self.download_start = Some(Instant::now());
    }

    pub fn end_download(&mut self) {
        self.download_end = Some(Instant::now());
    }

    pub fn report(&self) -> PerformanceReport {
        let upload_duration = elapsed(self.upload_start, self.upload_end);
        let download_duration = elapsed(self.download_start, self.download_end);
        let total_duration = upload_duration + download_duration;

        let file_size_mbit = (self.file_size as f64 * 8.0) / (1024.0 * 1024.0);
        let upload_throughput_mbps = throughput_mbps(file_size_mbit, upload_duration);
        let download_throughput_mbps = throughput_mbps(file_size_mbit, download_duration);
        let average_throughput_mbps = throughput_mbps(file_size_mbit * 2.0, total_duration);

        PerformanceReport {
            upload_duration,
            upload_throughput_mbps,
            download_duration,
            download_throughput_mbps,
            total_duration,
            average_throughput_mbps,
        }
    }
}

fn elapsed(start: Option<Instant>, end: Option<Instant>) -> Duration {
    match (start, end) {
        (Some(start), Some(end)) => end.saturating_duration_since(start),
        _ => Duration::ZERO,
    }
}

fn throughput_mbps(megabits: f64, duration: Duration) -> f64 {
    let secs = duration.as_secs_f64();
    if secs > 0.0 {
        megabits / secs
    } else {
        0.0
    }
}

/// A finished report, ready to log or print.
#[derive(Debug, Clone, Copy)]
pub struct PerformanceReport {
    pub upload_duration: Duration,
    pub upload_throughput_mbps: f64,
    pub download_duration: Duration,
    pub download_throughput_mbps: f64,
    pub total_duration: Duration,
    pub average_throughput_mbps: f64,
}

impl std::fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "upload {:.0}ms ({:.2} Mbps), download {:.0}ms ({:.2} Mbps), total {:.0}ms (avg {:.2} Mbps)",
            self.upload_duration.as_secs_f64() * 1000.0,
            self.upload_throughput_mbps,
            self.download_duration.as_secs_f64() * 1000.0,
            self.download_throughput_mbps,
            self.total_duration.as_secs_f64() * 1000.0,
            self.average_throughput_mbps,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn zero_duration_yields_zero_throughput() {
        let monitor = PerformanceMonitor::new(1024);
        let report = monitor.report();
        assert_eq!(report.upload_throughput_mbps, 0.0);
        assert_eq!(report.total_duration, Duration::ZERO);
    }

    #[test]
    fn report_reflects_elapsed_time() {
        let mut monitor = PerformanceMonitor::new(1024 * 1024);
        monitor.start_upload();
        sleep(Duration::from_millis(5));
        monitor.end_upload();
        monitor.start_download();
        sleep(Duration::from_millis(5));
        monitor.end_download();

        let report = monitor.report();
        assert!(report.upload_duration >= Duration::from_millis(5));
        assert!(report.download_duration >= Duration::from_millis(5));
        assert!(report.upload_throughput_mbps > 0.0);
        assert!(report.average_throughput_mbps > 0.0);
    }
}
