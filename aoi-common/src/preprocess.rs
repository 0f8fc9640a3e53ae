// Illumination preprocessing pipeline
// Median denoising, light-pattern estimation, background removal and
// thresholding, shared by the object counter and the classifier

use crate::LightMethod;
use anyhow::{bail, Context, Result};
use opencv::{
    core::{self, Mat, Point, Scalar, Size},
    imgcodecs, imgproc,
    prelude::*,
};
use std::path::Path;

/// Binary threshold applied after background removal
const SEGMENT_THRESHOLD: f64 = 30.0;
/// Inverse threshold used when the background is kept
const KEEP_BACKGROUND_THRESHOLD: f64 = 140.0;

/// Load an image as single-channel grayscale
pub fn load_grayscale(path: &Path) -> Result<Mat> {
    let image = imgcodecs::imread(&path.to_string_lossy(), imgcodecs::IMREAD_GRAYSCALE)
        .with_context(|| format!("reading {}", path.display()))?;
    if image.empty() {
        bail!("could not load image {}", path.display());
    }
    Ok(image)
}

/// Median blur denoising
pub fn remove_noise(image: &Mat, ksize: i32) -> Result<Mat> {
    let mut denoised = Mat::default();
    imgproc::median_blur(image, &mut denoised, ksize)?;
    Ok(denoised)
}

/// Estimate the light pattern from a single image with a large box blur.
/// Cheap, and effective when objects are small against the background.
pub fn estimate_light_pattern(image: &Mat) -> Result<Mat> {
    let ksize = (image.cols() / 3).max(3);
    let mut pattern = Mat::default();
    imgproc::blur(
        image,
        &mut pattern,
        Size::new(ksize, ksize),
        Point::new(-1, -1),
        core::BORDER_DEFAULT,
    )?;
    Ok(pattern)
}

/// Load the light pattern from disk, falling back to estimating it from
/// the input image. The result is median blurred before use.
pub fn load_light_pattern(path: Option<&Path>, image: &Mat, blur_ksize: i32) -> Result<Mat> {
    let pattern = match path {
        Some(p) => {
            let loaded = imgcodecs::imread(&p.to_string_lossy(), imgcodecs::IMREAD_GRAYSCALE)?;
            if loaded.empty() {
                log::warn!(
                    "light pattern {} could not be read, estimating one from the input image",
                    p.display()
                );
                estimate_light_pattern(image)?
            } else {
                loaded
            }
        }
        None => estimate_light_pattern(image)?,
    };
    remove_noise(&pattern, blur_ksize)
}

/// Remove the background light pattern from an image.
/// Both operands must have identical dimensions.
pub fn remove_light(image: &Mat, pattern: &Mat, method: LightMethod) -> Result<Mat> {
    if image.size()? != pattern.size()? {
        bail!(
            "image ({}x{}) and light pattern ({}x{}) dimensions must match",
            image.cols(),
            image.rows(),
            pattern.cols(),
            pattern.rows()
        );
    }

    match method {
        LightMethod::Difference => {
            let mut removed = Mat::default();
            core::subtract(pattern, image, &mut removed, &core::no_array(), -1)?;
            Ok(removed)
        }
        LightMethod::Division => {
            // The division needs 32-bit float precision
            let mut image32 = Mat::default();
            image.convert_to(&mut image32, core::CV_32F, 1.0, 0.0)?;
            let mut pattern32 = Mat::default();
            pattern.convert_to(&mut pattern32, core::CV_32F, 1.0, 0.0)?;

            let mut ratio = Mat::default();
            core::divide2(&image32, &pattern32, &mut ratio, 1.0, -1)?;
            let mut inverted = Mat::default();
            core::subtract(&Scalar::all(1.0), &ratio, &mut inverted, &core::no_array(), -1)?;

            // Rescale to the 8-bit range on the way back
            let mut removed = Mat::default();
            inverted.convert_to(&mut removed, core::CV_8U, 255.0, 0.0)?;
            Ok(removed)
        }
        LightMethod::None => Ok(image.clone()),
    }
}

/// Binarize for segmentation. With the background removed, objects are
/// bright on black; with the background kept they are dark on bright.
pub fn threshold_segments(image: &Mat, method: LightMethod) -> Result<Mat> {
    let mut binary = Mat::default();
    match method {
        LightMethod::None => {
            imgproc::threshold(
                image,
                &mut binary,
                KEEP_BACKGROUND_THRESHOLD,
                255.0,
                imgproc::THRESH_BINARY_INV,
            )?;
        }
        LightMethod::Difference | LightMethod::Division => {
            imgproc::threshold(
                image,
                &mut binary,
                SEGMENT_THRESHOLD,
                255.0,
                imgproc::THRESH_BINARY,
            )?;
        }
    }
    Ok(binary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::CV_8UC1;

    fn flat(rows: i32, cols: i32, value: f64) -> Mat {
        Mat::new_rows_cols_with_default(rows, cols, CV_8UC1, Scalar::all(value)).unwrap()
    }

    #[test]
    fn test_difference_subtracts_saturating() {
        let image = flat(8, 8, 50.0);
        let pattern = flat(8, 8, 200.0);
        let removed = remove_light(&image, &pattern, LightMethod::Difference).unwrap();
        assert_eq!(*removed.at_2d::<u8>(0, 0).unwrap(), 150);

        // Image brighter than the pattern saturates at zero
        let removed = remove_light(&pattern, &image, LightMethod::Difference).unwrap();
        assert_eq!(*removed.at_2d::<u8>(3, 3).unwrap(), 0);
    }

    #[test]
    fn test_division_of_identical_images_is_black() {
        let image = flat(8, 8, 120.0);
        let removed = remove_light(&image, &image, LightMethod::Division).unwrap();
        assert_eq!(*removed.at_2d::<u8>(4, 4).unwrap(), 0);
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let image = flat(8, 8, 100.0);
        let pattern = flat(8, 10, 100.0);
        assert!(remove_light(&image, &pattern, LightMethod::Division).is_err());
    }

    #[test]
    fn test_estimate_pattern_of_flat_image_is_flat() {
        let image = flat(9, 9, 77.0);
        let pattern = estimate_light_pattern(&image).unwrap();
        assert_eq!(*pattern.at_2d::<u8>(4, 4).unwrap(), 77);
    }

    #[test]
    fn test_threshold_after_removal() {
        let bright = flat(4, 4, 50.0);
        let binary = threshold_segments(&bright, LightMethod::Division).unwrap();
        assert_eq!(*binary.at_2d::<u8>(0, 0).unwrap(), 255);

        let dark = flat(4, 4, 10.0);
        let binary = threshold_segments(&dark, LightMethod::Division).unwrap();
        assert_eq!(*binary.at_2d::<u8>(0, 0).unwrap(), 0);
    }

    #[test]
    fn test_threshold_with_background_kept_is_inverted() {
        let bright = flat(4, 4, 200.0);
        let binary = threshold_segments(&bright, LightMethod::None).unwrap();
        assert_eq!(*binary.at_2d::<u8>(0, 0).unwrap(), 0);

        let dark = flat(4, 4, 100.0);
        let binary = threshold_segments(&dark, LightMethod::None).unwrap();
        assert_eq!(*binary.at_2d::<u8>(0, 0).unwrap(), 255);
    }
}
