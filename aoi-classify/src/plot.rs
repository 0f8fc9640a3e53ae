// Training-data scatter plot
// Draws the (area, aspect ratio) samples on a square canvas, colored by
// class, with the evaluation error as a caption

use anyhow::Result;
use aoi_common::{ObjectClass, ObjectFeatures};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;
use opencv::{
    core::{AlgorithmHint, Mat, Point, Scalar},
    imgproc,
    prelude::*,
};

const PLOT_SIZE: u32 = 512;
const DOT_RADIUS: i32 = 3;

/// Marker color per class: nut green, washer blue, screw red
pub fn class_color_rgb(class: ObjectClass) -> Rgb<u8> {
    match class {
        ObjectClass::Nut => Rgb([0, 255, 0]),
        ObjectClass::Washer => Rgb([0, 0, 255]),
        ObjectClass::Screw => Rgb([255, 0, 0]),
    }
}

/// Render the labeled feature rows as a BGR plot panel.
/// x is the area, y the aspect ratio, both min-max normalized.
pub fn plot_training_data(rows: &[(ObjectFeatures, i32)], error: Option<f32>) -> Result<Mat> {
    let mut canvas = RgbImage::new(PLOT_SIZE, PLOT_SIZE);

    let (area_min, area_max) = feature_range(rows.iter().map(|(f, _)| f.area));
    let (aspect_min, aspect_max) = feature_range(rows.iter().map(|(f, _)| f.aspect_ratio));

    for (features, label) in rows {
        let x = (normalize(features.area, area_min, area_max) * (PLOT_SIZE - 1) as f32) as i32;
        let y = (normalize(features.aspect_ratio, aspect_min, aspect_max)
            * (PLOT_SIZE - 1) as f32) as i32;
        let color = ObjectClass::from_label(*label)
            .map(class_color_rgb)
            .unwrap_or(Rgb([128, 128, 128]));
        draw_filled_circle_mut(&mut canvas, (x, y), DOT_RADIUS, color);
    }

    let mut plot = rgb_to_bgr_mat(&canvas)?;
    if let Some(error) = error {
        imgproc::put_text(
            &mut plot,
            &format!("Error: {:.2}%", error),
            Point::new(20, PLOT_SIZE as i32 - 40),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.75,
            Scalar::new(200.0, 200.0, 200.0, 0.0),
            1,
            imgproc::LINE_AA,
            false,
        )?;
    }
    Ok(plot)
}

/// Min and max of a feature column
fn feature_range(values: impl Iterator<Item = f32>) -> (f32, f32) {
    values.fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), v| {
        (min.min(v), max.max(v))
    })
}

/// Map a value into [0, 1]; a degenerate range maps to the center
fn normalize(value: f32, min: f32, max: f32) -> f32 {
    let range = max - min;
    if range <= f32::EPSILON {
        0.5
    } else {
        (value - min) / range
    }
}

/// Convert an RGB raster buffer into a BGR Mat for the panel viewer
fn rgb_to_bgr_mat(canvas: &RgbImage) -> Result<Mat> {
    let data = canvas.as_raw();
    let flat = Mat::from_slice(data)?;
    let rgb = flat.reshape(3, canvas.height() as i32)?;
    let mut bgr = Mat::default();
    imgproc::cvt_color(
        &rgb,
        &mut bgr,
        imgproc::COLOR_RGB2BGR,
        0,
        AlgorithmHint::ALGO_HINT_DEFAULT,
    )?;
    Ok(bgr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_spans_unit_range() {
        assert_eq!(normalize(0.0, 0.0, 10.0), 0.0);
        assert_eq!(normalize(10.0, 0.0, 10.0), 1.0);
        assert_eq!(normalize(5.0, 0.0, 10.0), 0.5);
    }

    #[test]
    fn test_normalize_degenerate_range() {
        assert_eq!(normalize(7.0, 7.0, 7.0), 0.5);
    }

    #[test]
    fn test_feature_range() {
        let values = [3.0f32, 1.0, 2.5];
        let (min, max) = feature_range(values.into_iter());
        assert_eq!(min, 1.0);
        assert_eq!(max, 3.0);
    }

    #[test]
    fn test_class_colors_are_distinct() {
        let nut = class_color_rgb(ObjectClass::Nut);
        let washer = class_color_rgb(ObjectClass::Washer);
        let screw = class_color_rgb(ObjectClass::Screw);
        assert_ne!(nut, washer);
        assert_ne!(washer, screw);
        assert_ne!(nut, screw);
    }

    #[test]
    fn test_plot_dimensions() {
        let rows = vec![
            (ObjectFeatures::new(800.0, 1.0), 0),
            (ObjectFeatures::new(2000.0, 2.0), 2),
        ];
        let plot = plot_training_data(&rows, Some(12.5)).unwrap();
        assert_eq!(plot.rows(), PLOT_SIZE as i32);
        assert_eq!(plot.cols(), PLOT_SIZE as i32);
        assert_eq!(plot.channels(), 3);
    }
}
