pub mod output;
pub mod terminal;

use pixdiff::compare::{Comparison, DiffUnavailable};

/// Outcome of one comparison, as shown to the user.
#[derive(Clone, Debug, PartialEq)]
pub enum Status {
    Same,
    Diff {
        diff_pixels: u64,
        score: f64,
        dimensions: Option<String>,
    },
    /// No previous version could be retrieved.
    NoPrevious,
    /// Both versions exist but at least one cannot be diffed.
    Skipped(String),
}

impl Status {
    pub fn of(c: &Comparison) -> Self {
        match (&c.diff_unavailable, c.diff_pixels) {
            (Some(DiffUnavailable::NoPreviousVersion), _) => Status::NoPrevious,
            (_, Some(n)) if n > 0 => Status::Diff {
                diff_pixels: n,
                score: c.score().unwrap_or(0.0),
                dimensions: c.dimension_change.map(|d| d.to_string()),
            },
            (_, Some(_)) => Status::Same,
            (Some(reason), None) => Status::Skipped(reason.to_string()),
            (None, None) => Status::Skipped("no diff computed".to_owned()),
        }
    }
}
