mod batch;
mod files;
mod history;
mod init;

use std::path::Path;

use anyhow::Result;
use pixdiff::compare::Comparison;

use crate::report::{Status, output, terminal};

pub use self::batch::batch;
pub use self::files::files;
pub use self::history::history;
pub use self::init::init;

/// Report a single comparison and return the exit code:
/// 0 = no pixels differ, 1 = differences.
fn finish(name: &str, c: &Comparison, out: Option<&Path>, json: bool) -> Result<i32> {
    if let Some(dir) = out {
        for path in output::write_artifacts(dir, c)? {
            tracing::info!("wrote {}", path.display());
        }
    }

    if json {
        println!("{}", output::to_json(c)?);
    } else {
        terminal::print_line(name, &Status::of(c));
    }
    Ok(if c.has_differences() { 1 } else { 0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::{comparison, png};
    use tempfile::TempDir;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    #[test]
    fn exit_code_follows_differences() {
        let same = comparison(png(3, 3, RED), Some(png(3, 3, RED)));
        assert_eq!(finish("same.png", &same, None, false).unwrap(), 0);

        let changed = comparison(png(3, 3, RED), Some(png(3, 3, BLUE)));
        assert_eq!(finish("changed.png", &changed, None, true).unwrap(), 1);

        let fresh = comparison(png(3, 3, RED), None);
        assert_eq!(finish("fresh.png", &fresh, None, false).unwrap(), 0);
    }

    #[test]
    fn out_dir_receives_artifacts() {
        let temp = TempDir::new().expect("tempdir");
        let out = temp.path().join("artifacts");
        let changed = comparison(png(3, 3, RED), Some(png(3, 3, BLUE)));

        assert_eq!(finish("changed.png", &changed, Some(&out), false).unwrap(), 1);
        for name in ["current.png", "previous.png", "diff.png"] {
            assert!(out.join(name).is_file(), "missing {name}");
        }
    }
}
