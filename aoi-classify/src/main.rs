use anyhow::{bail, Result};
use clap::Parser;
use image::Rgb;
use opencv::{
    core::{AlgorithmHint, Mat, Point, Scalar},
    imgcodecs, imgproc,
    prelude::*,
};
use std::path::PathBuf;

use aoi_common::{panel::PanelGrid, preprocess, ObjectClass};

mod classifier;
mod dataset;
mod features;
mod plot;

use classifier::FastenerClassifier;

/// Classify segmented fasteners (nuts, washers, screws) by shape
/// features with an SVM trained from per-class sample directories
#[derive(Parser, Debug)]
#[command(name = "aoi-classify")]
#[command(about = "Train an SVM on fastener samples and classify a new image", long_about = None)]
struct Args {
    /// Image to classify
    image: PathBuf,

    /// Directory holding nut/, washer/ and screw/ sample folders
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Light pattern image; defaults to <data-dir>/pattern.pgm
    #[arg(long)]
    pattern: Option<PathBuf>,

    /// Images per class reserved for evaluation
    #[arg(long, default_value_t = 20)]
    test_count: usize,

    /// Write the result panel to this file instead of opening a window
    #[arg(long)]
    save: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    println!("AOI fastener classifier");
    println!("=======================");
    println!("Input: {}", args.image.display());
    println!("Data directory: {}", args.data_dir.display());
    println!();

    let image = preprocess::load_grayscale(&args.image)?;
    let pattern = load_pattern(&args)?;

    println!("Step 1: Preprocessing input image...");
    let binary = dataset::preprocess_sample(&image, &pattern)?;

    println!("Step 2: Extracting features...");
    let (objects, objects_mask) = features::extract_objects(&binary)?;
    if objects.is_empty() {
        println!("No objects detected");
        return Ok(());
    }

    println!("Step 3: Loading training data...");
    let split = dataset::load_split(&args.data_dir, &pattern, args.test_count)?;
    println!("  {} training rows, {} test rows", split.train.len(), split.test.len());

    println!("Step 4: Training SVM...");
    let (classifier, error) = FastenerClassifier::train(&split)?;
    if let Some(error) = error {
        println!("  evaluation error: {:.2}%", error);
    }
    let training_plot = plot::plot_training_data(&split.train, error)?;

    println!("Step 5: Classifying {} object(s)...", objects.len());
    let mut annotated = Mat::default();
    imgproc::cvt_color(
        &image,
        &mut annotated,
        imgproc::COLOR_GRAY2BGR,
        0,
        AlgorithmHint::ALGO_HINT_DEFAULT,
    )?;

    for object in &objects {
        let class = classifier.predict(&object.features)?;
        println!(
            "  area: {:.0} px, aspect ratio: {:.2} -> {}",
            object.features.area, object.features.aspect_ratio, class
        );
        imgproc::put_text(
            &mut annotated,
            &class.to_string(),
            Point::new(object.center.0, object.center.1),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.4,
            class_color_bgr(class),
            1,
            imgproc::LINE_AA,
            false,
        )?;
    }

    let mut panel = PanelGrid::new("AOI fastener classifier", 2, 2);
    panel.add("Binary", &binary)?;
    panel.add("Objects", &objects_mask)?;
    panel.add("Training data", &training_plot)?;
    panel.add("Result", &annotated)?;

    match &args.save {
        Some(path) => panel.save(path)?,
        None => panel.show()?,
    }

    Ok(())
}

/// Load and lightly denoise the light pattern the samples were captured
/// with. Unlike the counter there is no estimation fallback: the trained
/// features depend on the same pattern the dataset used.
fn load_pattern(args: &Args) -> Result<Mat> {
    let path = args
        .pattern
        .clone()
        .unwrap_or_else(|| args.data_dir.join("pattern.pgm"));
    let pattern = imgcodecs::imread(&path.to_string_lossy(), imgcodecs::IMREAD_GRAYSCALE)?;
    if pattern.empty() {
        bail!(
            "light pattern {} is required for classification",
            path.display()
        );
    }
    preprocess::remove_noise(&pattern, 3)
}

fn class_color_bgr(class: ObjectClass) -> Scalar {
    let Rgb([r, g, b]) = plot::class_color_rgb(class);
    Scalar::new(b as f64, g as f64, r as f64, 0.0)
}
