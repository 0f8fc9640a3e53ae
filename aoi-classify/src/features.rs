// Shape feature extraction
// Finds object contours in a binary image and reduces each object to an
// (area, aspect ratio) feature pair

use anyhow::Result;
use aoi_common::ObjectFeatures;
use opencv::{
    core::{self, Mat, Point, Scalar, Vec4i, Vector},
    imgproc,
    prelude::*,
};

/// Objects below this area are treated as noise
pub const MIN_OBJECT_AREA: f32 = 500.0;

/// One segmented object: its features plus the position used to
/// annotate the prediction on the output image
#[derive(Debug, Clone)]
pub struct DetectedObject {
    pub features: ObjectFeatures,
    pub center: (i32, i32),
}

/// Extract features for every object in a binary image.
/// Returns the accepted objects and the union mask of their pixels.
pub fn extract_objects(binary: &Mat) -> Result<(Vec<DetectedObject>, Mat)> {
    let mut contours = Vector::<Vector<Point>>::new();
    let mut hierarchy = Vector::<Vec4i>::new();
    imgproc::find_contours_with_hierarchy(
        binary,
        &mut contours,
        &mut hierarchy,
        imgproc::RETR_CCOMP,
        imgproc::CHAIN_APPROX_SIMPLE,
        Point::new(0, 0),
    )?;

    let mut objects = Vec::new();
    let mut union_mask = Mat::zeros(binary.rows(), binary.cols(), core::CV_8UC1)?.to_mat()?;

    for index in 0..contours.len() {
        // Rasterize this contour (holes included) to measure its area
        let mut mask = Mat::zeros(binary.rows(), binary.cols(), core::CV_8UC1)?.to_mat()?;
        imgproc::draw_contours(
            &mut mask,
            &contours,
            index as i32,
            Scalar::all(255.0),
            imgproc::FILLED,
            imgproc::LINE_8,
            &hierarchy,
            1,
            Point::new(0, 0),
        )?;
        let area = core::count_non_zero(&mask)? as f32;
        if area <= MIN_OBJECT_AREA {
            continue;
        }

        let contour = contours.get(index)?;
        let rect = imgproc::min_area_rect(&contour)?;
        let size = rect.size();
        let aspect_ratio = if size.width < size.height {
            size.height / size.width
        } else {
            size.width / size.height
        };
        let center = rect.center();

        objects.push(DetectedObject {
            features: ObjectFeatures::new(area, aspect_ratio),
            center: (center.x as i32, center.y as i32),
        });

        imgproc::draw_contours(
            &mut union_mask,
            &contours,
            index as i32,
            Scalar::all(255.0),
            imgproc::FILLED,
            imgproc::LINE_8,
            &hierarchy,
            1,
            Point::new(0, 0),
        )?;
    }

    Ok((objects, union_mask))
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Rect, CV_8UC1};

    fn blank(rows: i32, cols: i32) -> Mat {
        Mat::new_rows_cols_with_default(rows, cols, CV_8UC1, Scalar::all(0.0)).unwrap()
    }

    fn fill_rect(image: &mut Mat, rect: Rect) {
        imgproc::rectangle(
            image,
            rect,
            Scalar::all(255.0),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )
        .unwrap();
    }

    #[test]
    fn test_elongated_object_features() {
        let mut binary = blank(100, 100);
        fill_rect(&mut binary, Rect::new(10, 10, 60, 20));

        let (objects, mask) = extract_objects(&binary).unwrap();
        assert_eq!(objects.len(), 1);

        let object = &objects[0];
        // 60x20 rectangle: about 1200 px of area, aspect ratio near 3
        assert!(object.features.area > 1000.0 && object.features.area < 1400.0);
        assert!(object.features.aspect_ratio > 2.5 && object.features.aspect_ratio < 3.5);
        assert!(object.center.0 > 30 && object.center.0 < 50);
        assert!(object.center.1 > 15 && object.center.1 < 25);
        assert!(core::count_non_zero(&mask).unwrap() > 1000);
    }

    #[test]
    fn test_small_objects_are_filtered() {
        let mut binary = blank(100, 100);
        fill_rect(&mut binary, Rect::new(5, 5, 10, 10));
        fill_rect(&mut binary, Rect::new(40, 40, 40, 30));

        let (objects, _) = extract_objects(&binary).unwrap();
        assert_eq!(objects.len(), 1);
        assert!(objects[0].features.area > 1000.0);
    }

    #[test]
    fn test_empty_image_yields_nothing() {
        let binary = blank(50, 50);
        let (objects, mask) = extract_objects(&binary).unwrap();
        assert!(objects.is_empty());
        assert_eq!(core::count_non_zero(&mask).unwrap(), 0);
    }
}
