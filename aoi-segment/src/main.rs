use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use aoi_common::{panel::PanelGrid, preprocess, LightMethod, SegMethod};

mod segment;

/// Count objects on a light table: remove the background illumination,
/// threshold and segment
#[derive(Parser, Debug)]
#[command(name = "aoi-segment")]
#[command(about = "Segment and count objects in a backlit image", long_about = None)]
struct Args {
    /// Input image file path
    image: PathBuf,

    /// Light pattern image; estimated from the input when omitted or unreadable
    light_pattern: Option<PathBuf>,

    /// Background removal method
    #[arg(short, long, value_enum, default_value = "division")]
    light_method: LightMethodArg,

    /// Segmentation method
    #[arg(short, long, value_enum, default_value = "connected")]
    seg_method: SegMethodArg,

    /// Write the result panel to this file instead of opening a window
    #[arg(long)]
    save: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum LightMethodArg {
    Difference,
    Division,
    None,
}

impl From<LightMethodArg> for LightMethod {
    fn from(arg: LightMethodArg) -> Self {
        match arg {
            LightMethodArg::Difference => LightMethod::Difference,
            LightMethodArg::Division => LightMethod::Division,
            LightMethodArg::None => LightMethod::None,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum SegMethodArg {
    Connected,
    Stats,
    Contours,
}

impl From<SegMethodArg> for SegMethod {
    fn from(arg: SegMethodArg) -> Self {
        match arg {
            SegMethodArg::Connected => SegMethod::Connected,
            SegMethodArg::Stats => SegMethod::Stats,
            SegMethodArg::Contours => SegMethod::Contours,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let light_method: LightMethod = args.light_method.into();
    let seg_method: SegMethod = args.seg_method.into();

    println!("AOI object counter");
    println!("==================");
    println!("Input: {}", args.image.display());
    println!("Light method: {}", light_method);
    println!("Segmentation: {}", seg_method);
    println!();

    let image = preprocess::load_grayscale(&args.image)?;

    println!("Step 1: Removing noise...");
    let denoised = preprocess::remove_noise(&image, 7)?;

    println!("Step 2: Removing background light...");
    let pattern = preprocess::load_light_pattern(args.light_pattern.as_deref(), &denoised, 7)?;
    let removed = preprocess::remove_light(&denoised, &pattern, light_method)?;

    println!("Step 3: Thresholding...");
    let binary = preprocess::threshold_segments(&removed, light_method)?;

    println!("Step 4: Segmenting...");
    let segmentation = match seg_method {
        SegMethod::Connected => segment::connected(&binary)?,
        SegMethod::Stats => segment::connected_stats(&binary)?,
        SegMethod::Contours => segment::contours(&binary)?,
    };

    let Some(segmentation) = segmentation else {
        println!("No objects detected");
        return Ok(());
    };
    println!("Number of objects detected: {}", segmentation.count);

    let mut panel = PanelGrid::new("AOI object counter", 3, 2);
    panel.add("Input", &image)?;
    panel.add("Denoised", &denoised)?;
    panel.add("Light pattern", &pattern)?;
    panel.add("Background removed", &removed)?;
    panel.add("Threshold", &binary)?;
    panel.add("Segments", &segmentation.image)?;

    match &args.save {
        Some(path) => panel.save(path)?,
        None => panel.show()?,
    }

    Ok(())
}
