use std::io::Write;
use std::time::Duration;

use super::Status;

/// Clear the current terminal line (wipes progress indicator).
pub fn clear_line() {
    print!("\r\x1b[2K");
}

pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}

/// Print a single comparison result line.
pub fn print_line(name: &str, status: &Status) {
    clear_line();
    match status {
        Status::Same => {
            println!("  \x1b[32mSAME\x1b[0m  {name}");
        }
        Status::Diff {
            diff_pixels,
            score,
            dimensions,
        } => match dimensions {
            Some(dims) => println!(
                "  \x1b[31mDIFF\x1b[0m  {name}  ({diff_pixels} pixels, {score:.4}, dimensions changed: {dims})"
            ),
            None => println!("  \x1b[31mDIFF\x1b[0m  {name}  ({diff_pixels} pixels, {score:.4})"),
        },
        Status::NoPrevious => {
            println!("  \x1b[33mNONE\x1b[0m  {name}  (no previous version)");
        }
        Status::Skipped(reason) => {
            println!("  \x1b[2mSKIP\x1b[0m  {name}  ({reason})");
        }
    }
}

/// Print an error line for a file that could not be compared at all.
pub fn print_error_line(name: &str, msg: &str) {
    clear_line();
    println!("  \x1b[31m ERR\x1b[0m  {name}  ({msg})");
}

/// Show batch progress indicator.
pub fn show_progress(done: usize, total: usize) {
    if done < total {
        print!("  Comparing  [{done}/{total}]");
        let _ = std::io::stdout().flush();
    }
}

/// Per-status counts for a run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub same: usize,
    pub diff: usize,
    pub no_previous: usize,
    pub skipped: usize,
    pub errored: usize,
}

impl Tally {
    pub fn record(&mut self, status: &Status) {
        match status {
            Status::Same => self.same += 1,
            Status::Diff { .. } => self.diff += 1,
            Status::NoPrevious => self.no_previous += 1,
            Status::Skipped(_) => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.same + self.diff + self.no_previous + self.skipped + self.errored
    }

    /// 0 = nothing changed, 1 = any difference or error.
    pub fn exit_code(&self) -> i32 {
        if self.diff > 0 || self.errored > 0 { 1 } else { 0 }
    }
}

/// Print an actionable summary listing file names grouped by status.
/// Only prints sections with at least one entry.
pub fn print_actionable_summary(changed: &[String], errored: &[String]) {
    if changed.is_empty() && errored.is_empty() {
        return;
    }

    clear_line();
    println!();
    for (label, names) in [("Changed", changed), ("Errored", errored)] {
        if !names.is_empty() {
            println!("  {label} ({}):", names.len());
            for name in names {
                println!("    {name}");
            }
        }
    }
}

/// Print the final summary.
pub fn print_summary(tally: &Tally, elapsed: Duration) {
    clear_line();
    println!();
    print!(
        "Images:  {} total, \x1b[32m{} same\x1b[0m, \x1b[31m{} changed\x1b[0m",
        tally.total(),
        tally.same,
        tally.diff
    );
    if tally.no_previous > 0 {
        print!(", \x1b[33m{} without history\x1b[0m", tally.no_previous);
    }
    if tally.skipped > 0 {
        print!(", \x1b[2m{} skipped\x1b[0m", tally.skipped);
    }
    if tally.errored > 0 {
        print!(", \x1b[31m{} errored\x1b[0m", tally.errored);
    }
    println!();
    println!("Time:    {}", format_duration(elapsed));
}
