use std::time::{Duration, Instant};

use tracing::info;

/// Format a file size in human-readable form
pub fn format_size(size: u64) -> String {
    let units = ["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < units.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size as u64, units[unit_index])
    } else {
        format!("{:.2} {}", size, units[unit_index])
    }
}

/// Wall-clock timer that logs its label and elapsed milliseconds when
/// reported.
pub struct Stopwatch {
    label: &'static str,
    started: Instant,
}

impl Stopwatch {
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            started: Instant::now(),
        }
    }

    /// Log the elapsed time and return it.
    pub fn report(self) -> Duration {
        let elapsed = self.started.elapsed();
        info!("{} completed in {} ms", self.label, elapsed.as_millis());
        elapsed
    }
}
