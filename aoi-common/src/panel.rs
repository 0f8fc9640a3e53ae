// Multi-panel result viewer
// Composes labeled images into a single grid canvas, shown in one window
// or written to disk for headless runs

use anyhow::{ensure, Result};
use opencv::{
    core::{AlgorithmHint, Mat, Point, Rect, Scalar, Size, Vector},
    highgui, imgcodecs, imgproc,
    prelude::*,
};
use std::path::Path;

/// Fixed size of one grid cell in pixels
pub const CELL_WIDTH: i32 = 320;
pub const CELL_HEIGHT: i32 = 240;

/// A grid of labeled image panels rendered into one canvas
pub struct PanelGrid {
    title: String,
    cols: i32,
    rows: i32,
    panels: Vec<(String, Mat)>,
}

impl PanelGrid {
    pub fn new(title: &str, cols: i32, rows: i32) -> Self {
        Self {
            title: title.to_string(),
            cols,
            rows,
            panels: Vec::new(),
        }
    }

    /// Append a panel. Grayscale images are converted to BGR so every
    /// cell renders in color.
    pub fn add(&mut self, label: &str, image: &Mat) -> Result<()> {
        ensure!(
            self.panels.len() < (self.cols * self.rows) as usize,
            "panel grid '{}' is full ({} cells)",
            self.title,
            self.cols * self.rows
        );

        let bgr = if image.channels() == 1 {
            let mut converted = Mat::default();
            imgproc::cvt_color(
                image,
                &mut converted,
                imgproc::COLOR_GRAY2BGR,
                0,
                AlgorithmHint::ALGO_HINT_DEFAULT,
            )?;
            converted
        } else {
            image.clone()
        };

        self.panels.push((label.to_string(), bgr));
        Ok(())
    }

    /// Compose the grid into a single BGR canvas
    pub fn render(&self) -> Result<Mat> {
        let mut canvas = Mat::zeros(
            self.rows * CELL_HEIGHT,
            self.cols * CELL_WIDTH,
            opencv::core::CV_8UC3,
        )?
        .to_mat()?;

        for (index, (label, image)) in self.panels.iter().enumerate() {
            let col = index as i32 % self.cols;
            let row = index as i32 / self.cols;

            let (width, height) =
                fit_into_cell(image.cols(), image.rows(), CELL_WIDTH, CELL_HEIGHT);
            let mut scaled = Mat::default();
            imgproc::resize(
                image,
                &mut scaled,
                Size::new(width, height),
                0.0,
                0.0,
                imgproc::INTER_LINEAR,
            )?;

            // Center the scaled image in its cell
            let x = col * CELL_WIDTH + (CELL_WIDTH - width) / 2;
            let y = row * CELL_HEIGHT + (CELL_HEIGHT - height) / 2;
            {
                let mut cell = Mat::roi_mut(&mut canvas, Rect::new(x, y, width, height))?;
                scaled.copy_to(&mut cell)?;
            }

            imgproc::put_text(
                &mut canvas,
                label,
                Point::new(col * CELL_WIDTH + 8, row * CELL_HEIGHT + 18),
                imgproc::FONT_HERSHEY_SIMPLEX,
                0.5,
                Scalar::new(0.0, 255.0, 0.0, 0.0),
                1,
                imgproc::LINE_AA,
                false,
            )?;
        }

        Ok(canvas)
    }

    /// Display the composed grid and block until a key is pressed
    pub fn show(&self) -> Result<()> {
        let canvas = self.render()?;
        highgui::named_window(&self.title, highgui::WINDOW_AUTOSIZE)?;
        highgui::imshow(&self.title, &canvas)?;
        highgui::wait_key(0)?;
        Ok(())
    }

    /// Write the composed grid to disk instead of opening a window
    pub fn save(&self, path: &Path) -> Result<()> {
        let canvas = self.render()?;
        let written = imgcodecs::imwrite(&path.to_string_lossy(), &canvas, &Vector::<i32>::new())?;
        ensure!(written, "failed to write panel image to {}", path.display());
        println!("Saved result panel to {}", path.display());
        Ok(())
    }
}

/// Scale image dimensions to fit a cell while preserving aspect ratio
fn fit_into_cell(width: i32, height: i32, cell_width: i32, cell_height: i32) -> (i32, i32) {
    let scale = f64::min(
        cell_width as f64 / width as f64,
        cell_height as f64 / height as f64,
    );
    let fitted_width = ((width as f64 * scale).round() as i32).clamp(1, cell_width);
    let fitted_height = ((height as f64 * scale).round() as i32).clamp(1, cell_height);
    (fitted_width, fitted_height)
}
