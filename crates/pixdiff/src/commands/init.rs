use std::path::Path;

use anyhow::{Result, bail};
use pixdiff::config;

/// `pixdiff init`: create .pixdiff/config.toml.
pub fn init(force: bool) -> Result<()> {
    let dir = Path::new(".");
    if !force && config::config_file_exists(dir) {
        bail!(".pixdiff/config.toml already exists (use --force to overwrite)");
    }

    config::write_template(dir)?;
    config::write_gitignore(dir, force)?;

    let verb = if force { "Regenerated" } else { "Created" };
    println!("{verb} .pixdiff/config.toml");
    println!("  artifacts default to {}", config::DEFAULT_OUTPUT_DIR);
    Ok(())
}
