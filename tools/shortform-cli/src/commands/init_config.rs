//! Write the default configuration.

use std::path::PathBuf;

use shortform_common::config::AppConfig;

pub fn run(path: PathBuf, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    AppConfig::default()
        .save_to(&path)
        .map_err(|e| anyhow::anyhow!("Failed to write config: {e}"))?;

    println!("Default configuration written to {}", path.display());
    println!("  Stories:     ./cleaned_stories");
    println!("  Backgrounds: ./processed_videos");
    println!("  Output:      ./videos");
    Ok(())
}
