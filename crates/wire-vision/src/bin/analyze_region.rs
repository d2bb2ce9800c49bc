//! CLI tool to inspect how the extraction heuristics see one region of a screenshot.
//! Usage: cargo run -p wire-vision --features cli --bin analyze_region -- <image.png> [ymin xmin ymax xmax]

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use wire_data::Thresholds;
use wire_detect::{crop_box, PixelBox};
use wire_vision::{
    corner_majority, count_text_lines, crop_to_content, detect_border, dominant_color,
    locate_ink_bbox, sample_background, text_ink_color,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 && args.len() != 6 {
        bail!("Usage: {} <image.png> [ymin xmin ymax xmax]", args[0]);
    }

    let input_path = PathBuf::from(&args[1]);
    let img = image::open(&input_path)
        .with_context(|| format!("Failed to open {}", input_path.display()))?
        .to_rgba8();
    let (w, h) = img.dimensions();
    println!("Image size: {}x{}", w, h);

    let bbox = if args.len() == 6 {
        let coords: Vec<u32> = args[2..6]
            .iter()
            .map(|s| s.parse::<u32>().with_context(|| format!("Bad coordinate '{}'", s)))
            .collect::<Result<_>>()?;
        PixelBox::new(coords[0], coords[1], coords[2], coords[3]).clamp_to(w, h)
    } else {
        PixelBox::full(w, h)
    };
    let region = crop_box(&img, &bbox);
    let thresholds = Thresholds::default();

    println!("\n=== Region {:?} ===", bbox);
    let background = sample_background(&region);
    println!("Top-left background: {}", background);
    println!("Corner majority:     {}", corner_majority(&region));
    println!(
        "Dominant colors:     {} {} {}",
        dominant_color(&region, 0, &thresholds),
        dominant_color(&region, 1, &thresholds),
        dominant_color(&region, 2, &thresholds)
    );

    println!("\n=== Border ===");
    match detect_border(&region, thresholds.border_noise_floor) {
        Some(b) => println!("Content box: {:?} (absolute {:?})", b, bbox.absolute(b)),
        None => println!("Uniform region"),
    }

    println!("\n=== Text ===");
    println!("Lines: {}", count_text_lines(&region, &thresholds));
    println!("Ink color: {}", text_ink_color(&region));
    println!("Ink bbox (plain):    {:?}", locate_ink_bbox(&region, false));
    println!("Ink bbox (bordered): {:?}", locate_ink_bbox(&region, true));

    let content = crop_to_content(&region, background, bbox, &thresholds);
    println!(
        "Content: fill {} at {:?} ({}x{})",
        content.fill,
        content.bbox,
        content.image.width(),
        content.image.height()
    );

    Ok(())
}
