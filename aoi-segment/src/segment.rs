// Object segmentation over the thresholded image
// Three strategies: connected components, connected components with
// per-object statistics, and external contours

use anyhow::Result;
use opencv::{
    core::{self, Mat, Point, Scalar, Vector},
    imgproc,
    prelude::*,
};

/// A colored segmentation result and the number of objects found
pub struct Segmentation {
    pub image: Mat,
    pub count: usize,
}

/// Deterministic palette color for object index, background excluded
fn palette_color(index: i32) -> Scalar {
    Scalar::new(
        ((index * 70) % 256) as f64,
        ((index * 150) % 256) as f64,
        ((index * 230) % 256) as f64,
        0.0,
    )
}

/// Segment with plain connected components, painting each object in its
/// palette color. Returns None when only the background is present.
pub fn connected(binary: &Mat) -> Result<Option<Segmentation>> {
    let mut labels = Mat::default();
    let num_labels = imgproc::connected_components(binary, &mut labels, 8, core::CV_32S)?;
    if num_labels < 2 {
        return Ok(None);
    }

    let mut output = Mat::zeros(binary.rows(), binary.cols(), core::CV_8UC3)?.to_mat()?;
    for label in 1..num_labels {
        let mut mask = Mat::default();
        core::compare(
            &labels,
            &Scalar::all(label as f64),
            &mut mask,
            core::CMP_EQ,
        )?;
        output.set_to(&palette_color(label), &mask)?;
    }

    Ok(Some(Segmentation {
        image: output,
        count: (num_labels - 1) as usize,
    }))
}

/// Segment with connected components, reporting position and extent of
/// every object and drawing its area next to the centroid.
pub fn connected_stats(binary: &Mat) -> Result<Option<Segmentation>> {
    let mut labels = Mat::default();
    let mut stats = Mat::default();
    let mut centroids = Mat::default();
    let num_labels = imgproc::connected_components_with_stats(
        binary,
        &mut labels,
        &mut stats,
        &mut centroids,
        8,
        core::CV_32S,
    )?;
    if num_labels < 2 {
        return Ok(None);
    }

    let mut output = Mat::zeros(binary.rows(), binary.cols(), core::CV_8UC3)?.to_mat()?;
    for label in 1..num_labels {
        let cx = *centroids.at_2d::<f64>(label, 0)?;
        let cy = *centroids.at_2d::<f64>(label, 1)?;
        let area = *stats.at_2d::<i32>(label, imgproc::CC_STAT_AREA)?;
        let width = *stats.at_2d::<i32>(label, imgproc::CC_STAT_WIDTH)?;
        let height = *stats.at_2d::<i32>(label, imgproc::CC_STAT_HEIGHT)?;
        println!(
            "Object {} at [{:.1}, {:.1}], area: {} px, width: {} px, height: {} px",
            label, cx, cy, area, width, height
        );

        let mut mask = Mat::default();
        core::compare(
            &labels,
            &Scalar::all(label as f64),
            &mut mask,
            core::CMP_EQ,
        )?;
        output.set_to(&palette_color(label), &mask)?;

        imgproc::put_text(
            &mut output,
            &format!("area: {}", area),
            Point::new(cx as i32 - 25, cy as i32 - 25),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.4,
            Scalar::all(255.0),
            1,
            imgproc::LINE_8,
            false,
        )?;
    }

    Ok(Some(Segmentation {
        image: output,
        count: (num_labels - 1) as usize,
    }))
}

/// Segment by drawing each external contour in its palette color.
pub fn contours(binary: &Mat) -> Result<Option<Segmentation>> {
    let mut found = Vector::<Vector<Point>>::new();
    imgproc::find_contours(
        binary,
        &mut found,
        imgproc::RETR_EXTERNAL,
        imgproc::CHAIN_APPROX_SIMPLE,
        Point::new(0, 0),
    )?;
    if found.is_empty() {
        return Ok(None);
    }

    let mut output = Mat::zeros(binary.rows(), binary.cols(), core::CV_8UC3)?.to_mat()?;
    for index in 0..found.len() {
        imgproc::draw_contours(
            &mut output,
            &found,
            index as i32,
            palette_color(index as i32 + 1),
            1,
            imgproc::LINE_8,
            &Mat::default(),
            i32::MAX,
            Point::new(0, 0),
        )?;
    }

    Ok(Some(Segmentation {
        image: output,
        count: found.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Rect, CV_8UC1};

    // Binary image with two well-separated square objects
    fn two_squares() -> Mat {
        let mut binary =
            Mat::new_rows_cols_with_default(64, 64, CV_8UC1, Scalar::all(0.0)).unwrap();
        imgproc::rectangle(
            &mut binary,
            Rect::new(4, 4, 12, 12),
            Scalar::all(255.0),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )
        .unwrap();
        imgproc::rectangle(
            &mut binary,
            Rect::new(40, 40, 16, 16),
            Scalar::all(255.0),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )
        .unwrap();
        binary
    }

    #[test]
    fn test_connected_counts_objects() {
        let seg = connected(&two_squares()).unwrap().unwrap();
        assert_eq!(seg.count, 2);
        assert_eq!(seg.image.channels(), 3);
    }

    #[test]
    fn test_connected_stats_counts_objects() {
        let seg = connected_stats(&two_squares()).unwrap().unwrap();
        assert_eq!(seg.count, 2);
    }

    #[test]
    fn test_contours_counts_objects() {
        let seg = contours(&two_squares()).unwrap().unwrap();
        assert_eq!(seg.count, 2);
    }

    #[test]
    fn test_empty_image_has_no_objects() {
        let binary =
            Mat::new_rows_cols_with_default(32, 32, CV_8UC1, Scalar::all(0.0)).unwrap();
        assert!(connected(&binary).unwrap().is_none());
        assert!(connected_stats(&binary).unwrap().is_none());
        assert!(contours(&binary).unwrap().is_none());
    }

    #[test]
    fn test_palette_is_deterministic() {
        assert_eq!(palette_color(1), palette_color(1));
        assert_ne!(palette_color(1), palette_color(2));
    }
}
