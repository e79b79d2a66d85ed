//! Throttled one-line progress on stderr.

use std::io::Write;
use std::time::{Duration, Instant};

use modelrelay_core::download::Progress;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);
const MIB: f64 = 1_048_576.0;

pub struct ProgressPrinter {
    last_print: Option<Instant>,
    printed: bool,
}

impl ProgressPrinter {
    pub fn new() -> Self {
        Self {
            last_print: None,
            printed: false,
        }
    }

    pub fn update(&mut self, p: &Progress) {
        let now = Instant::now();
        let due = self
            .last_print
            .is_none_or(|t| now.duration_since(t) >= PROGRESS_INTERVAL);
        let done = p.total_bytes.is_some_and(|t| p.bytes_done >= t);
        if !due && !done {
            return;
        }
        eprint!("\r{}", render(p));
        let _ = std::io::stderr().flush();
        self.last_print = Some(now);
        self.printed = true;
    }

    /// Ends the progress line, if one was started.
    pub fn finish(&mut self) {
        if self.printed {
            eprintln!();
            self.printed = false;
        }
    }
}

impl Default for ProgressPrinter {
    fn default() -> Self {
        Self::new()
    }
}

fn render(p: &Progress) -> String {
    let done_mib = p.bytes_done as f64 / MIB;
    let rate_mib = p.bytes_per_sec() / MIB;
    match (p.total_bytes, p.fraction()) {
        (Some(total), Some(fraction)) => {
            let eta = p
                .eta_secs()
                .map(|s| format!("{:.0}s", s))
                .unwrap_or_else(|| "?".to_string());
            format!(
                "  {:.1} / {:.1} MiB ({:.1}%)  {:.2} MiB/s  ETA {}  ",
                done_mib,
                total as f64 / MIB,
                fraction * 100.0,
                rate_mib,
                eta
            )
        }
        _ => format!("  {:.1} MiB  {:.2} MiB/s  ", done_mib, rate_mib),
    }
}

/// Human-readable byte count for the summary line.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = "B";
    for u in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = u;
    }
    format!("{:.2} {}", value, unit)
}
