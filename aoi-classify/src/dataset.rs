// Training data loading
// Reads per-class sample directories, runs each image through the
// preprocessing pipeline and collects feature rows, splitting the first
// images of every class into the test set

use anyhow::{ensure, Context, Result};
use aoi_common::{preprocess, LightMethod, ObjectClass, ObjectFeatures};
use opencv::{imgcodecs, prelude::*};
use opencv::core::Mat;
use std::fs;
use std::path::{Path, PathBuf};

use crate::features;

/// Feature rows labeled for training and evaluation
#[derive(Debug, Default)]
pub struct TrainTestSplit {
    pub train: Vec<(ObjectFeatures, i32)>,
    pub test: Vec<(ObjectFeatures, i32)>,
}

/// Preprocess one capture the same way the training data was captured:
/// light denoising, division-based background removal, thresholding.
pub fn preprocess_sample(image: &Mat, pattern: &Mat) -> Result<Mat> {
    let denoised = preprocess::remove_noise(image, 3)?;
    let removed = preprocess::remove_light(&denoised, pattern, LightMethod::Division)?;
    preprocess::threshold_segments(&removed, LightMethod::Division)
}

/// Load every class directory under `data_dir` and build the split.
/// The first `test_count` images of each class feed the test set.
pub fn load_split(data_dir: &Path, pattern: &Mat, test_count: usize) -> Result<TrainTestSplit> {
    let mut split = TrainTestSplit::default();

    for class in ObjectClass::ALL {
        let dir = data_dir.join(class.to_string());
        let files = image_files(&dir)?;
        ensure!(
            !files.is_empty(),
            "no sample images found in {}",
            dir.display()
        );

        let mut train_rows = 0;
        let mut test_rows = 0;
        for (index, path) in files.iter().enumerate() {
            let image = imgcodecs::imread(&path.to_string_lossy(), imgcodecs::IMREAD_GRAYSCALE)?;
            if image.empty() {
                log::warn!("skipping unreadable sample {}", path.display());
                continue;
            }

            let binary = preprocess_sample(&image, pattern)
                .with_context(|| format!("preprocessing {}", path.display()))?;
            let (objects, _) = features::extract_objects(&binary)?;

            for object in objects {
                let row = (object.features, class.label());
                if index < test_count {
                    split.test.push(row);
                    test_rows += 1;
                } else {
                    split.train.push(row);
                    train_rows += 1;
                }
            }
        }
        log::debug!(
            "{}: {} training rows, {} test rows from {} images",
            class,
            train_rows,
            test_rows,
            files.len()
        );
    }

    ensure!(
        !split.train.is_empty(),
        "training set is empty, check the data directory layout ({}/<nut|washer|screw>)",
        data_dir.display()
    );
    Ok(split)
}

/// Sorted raster files in a sample directory
pub fn image_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("reading sample directory {}", dir.display()))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && has_raster_extension(path))
        .collect();
    files.sort();
    Ok(files)
}

fn has_raster_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            matches!(
                ext.to_ascii_lowercase().as_str(),
                "pgm" | "png" | "jpg" | "jpeg" | "bmp"
            )
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_extensions() {
        assert!(has_raster_extension(Path::new("nut/tuerca_0001.pgm")));
        assert!(has_raster_extension(Path::new("capture.PNG")));
        assert!(has_raster_extension(Path::new("shot.jpeg")));
        assert!(!has_raster_extension(Path::new("notes.txt")));
        assert!(!has_raster_extension(Path::new("pattern")));
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        assert!(image_files(Path::new("/nonexistent/aoi-samples")).is_err());
    }
}
