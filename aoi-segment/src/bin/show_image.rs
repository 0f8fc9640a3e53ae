// Minimal viewer: load one image and display it until a key is pressed

use anyhow::{bail, Result};
use clap::Parser;
use opencv::{highgui, imgcodecs, prelude::*};
use std::path::PathBuf;

/// Display a single image in a window
#[derive(Parser, Debug)]
#[command(name = "show-image")]
#[command(about = "Load an image and display it", long_about = None)]
struct Args {
    /// Image file path
    image: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let image = imgcodecs::imread(&args.image.to_string_lossy(), imgcodecs::IMREAD_COLOR)?;
    if image.empty() {
        bail!("could not load image {}", args.image.display());
    }

    highgui::imshow("Image", &image)?;
    highgui::wait_key(0)?;
    Ok(())
}
