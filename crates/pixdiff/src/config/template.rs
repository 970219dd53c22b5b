use std::path::Path;

use anyhow::{Context, Result};

use super::{CONFIG_DIR, CONFIG_FILE};

/// Hand-crafted config template with commented-out keys.
/// Used by `pixdiff init` so that users can see the available knobs
/// without uncommenting section headers.
const CONFIG_TEMPLATE: &str = r#"# ─────────────────────────────────────────────────────────
# Pixel comparison: all fields optional.
# ─────────────────────────────────────────────────────────
[diff]
# threshold = 0.1                    # colour tolerance (0.0 = exact, 1.0 = anything)
# include_anti_aliasing = false      # count edge-smoothing changes as differences
# alpha = 0.1                        # opacity of unchanged pixels in the diff image
# diff_color = [255, 0, 0]           # highlight for changed pixels
# anti_alias_color = [255, 255, 0]   # marker for anti-aliased pixels (unset = none)

# ─────────────────────────────────────────────────────────
# Previous-version retrieval: all fields optional.
# ─────────────────────────────────────────────────────────
[history]
# revision = "HEAD~1"                # HEAD, HEAD~N, branch name or commit hash
# backend = "git-cli"                # "git-cli" | "libgit2"
# max_blob_bytes = 10485760          # refuse larger historical images
# parallel = 4                       # files compared concurrently by `batch`
"#;

pub fn config_file_exists(dir: &Path) -> bool {
    dir.join(CONFIG_DIR).join(CONFIG_FILE).exists()
}

/// Ignore the default output directory.
pub fn write_gitignore(dir: &Path, force: bool) -> Result<()> {
    let path = dir.join(CONFIG_DIR).join(".gitignore");
    if !force && path.exists() {
        return Ok(());
    }
    std::fs::write(&path, "out/\n").with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write the hand-crafted config template (with commented-out sections).
pub fn write_template(dir: &Path) -> Result<()> {
    let config_dir = dir.join(CONFIG_DIR);
    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create {}", config_dir.display()))?;
    let path = config_dir.join(CONFIG_FILE);
    std::fs::write(&path, CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
