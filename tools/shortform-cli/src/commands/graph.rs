//! Print the filter graphs the renderer would receive.

use std::path::PathBuf;

use shortform_common::config::AppConfig;
use shortform_render_engine::filter_graph::{
    build_composition_graph, build_enhancement_graph, CaptionBurn,
};
use shortform_render_engine::fonts::{available_fonts, resolve_font, SystemFontLocator};

pub fn run(config: &AppConfig, captions: Option<PathBuf>) -> anyhow::Result<()> {
    let locator = SystemFontLocator::new(config.paths.fonts_dir.clone());
    let font = resolve_font(&available_fonts(&config.style, &locator)).into_choice();

    let graph = build_composition_graph(
        &config.style,
        &config.video,
        captions.as_deref().map(|path| CaptionBurn { path, font: &font }),
    );

    println!("Composition ({} stages):", graph.stages().len());
    for stage in graph.stages() {
        println!("  - {}", stage.kind.as_str());
    }
    println!("{graph}");

    if config.enhance.enabled {
        println!();
        println!("Enhancement:");
        println!("{}", build_enhancement_graph(&config.enhance));
    }
    Ok(())
}
