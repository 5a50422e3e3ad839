//! Check renderer availability, fonts and inputs.

use shortform_common::config::AppConfig;
use shortform_render_engine::fonts::{available_fonts, FontChoice, SystemFontLocator, DEFAULT_FONT};
use shortform_render_engine::pool::BackgroundPool;
use shortform_render_engine::renderer::command_exists;
use shortform_render_engine::sources::discover_pairs;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Shortform System Check");
    println!("{}", "=".repeat(50));

    let mut ready = true;
    for binary in ["ffmpeg", "ffprobe"] {
        if command_exists(binary) {
            println!("[OK] {binary} found");
        } else {
            println!("[MISSING] {binary} not found on PATH");
            ready = false;
        }
    }
    if command_exists("fc-match") {
        println!("[OK] fc-match found");
    } else {
        println!("[WARN] fc-match not found, only local font files will be used");
    }

    let locator = SystemFontLocator::new(config.paths.fonts_dir.clone());
    let fonts = available_fonts(&config.style, &locator);
    if fonts.is_empty() {
        println!("[WARN] No configured font available, captions will use {DEFAULT_FONT}");
    } else {
        println!("[OK] Fonts available: {}", fonts.len());
        for font in &fonts {
            match font {
                FontChoice::System { family } => println!("     {family} (system)"),
                FontChoice::Local { family, path } => {
                    println!("     {family} ({})", path.display())
                }
            }
        }
    }

    match BackgroundPool::from_dir(&config.paths.backgrounds_dir) {
        Ok(pool) => println!(
            "[OK] Background clips: {} in {}",
            pool.len(),
            pool.dir().display()
        ),
        Err(e) => {
            println!("[FAIL] {e}");
            ready = false;
        }
    }

    match discover_pairs(&config.paths.stories_dir) {
        Ok(pairs) => println!(
            "[OK] Narration/caption pairs: {} in {}",
            pairs.len(),
            config.paths.stories_dir.display()
        ),
        Err(e) => {
            println!("[FAIL] {e}");
            ready = false;
        }
    }

    println!();
    if ready {
        println!("Everything needed for a batch run is available.");
    } else {
        println!("Some requirements are missing. See above.");
    }
    Ok(())
}
