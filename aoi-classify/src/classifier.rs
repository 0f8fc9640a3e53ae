// SVM fastener classifier
// Multi-class C-SVC with a chi-squared kernel over the two shape
// features, trained per run from the sample directories

use anyhow::{ensure, Context, Result};
use aoi_common::{ObjectClass, ObjectFeatures};
use opencv::{
    core::{self, Mat, Ptr, TermCriteria},
    ml::{self, SVM},
    prelude::*,
};

use crate::dataset::TrainTestSplit;

const MAX_TRAIN_ITERATIONS: i32 = 100;
const TRAIN_EPSILON: f64 = 1e-6;

pub struct FastenerClassifier {
    svm: Ptr<SVM>,
}

impl FastenerClassifier {
    /// Train on the split's training rows. When test rows are present,
    /// also evaluates and returns the misclassification percentage.
    pub fn train(split: &TrainTestSplit) -> Result<(Self, Option<f32>)> {
        ensure!(!split.train.is_empty(), "cannot train on an empty feature set");

        let samples = feature_matrix(&split.train)?;
        let responses = label_column(&split.train)?;

        let mut svm = SVM::create()?;
        svm.set_type(ml::SVM_Types::C_SVC as i32)?;
        svm.set_kernel(ml::SVM_KernelTypes::CHI2 as i32)?;
        svm.set_term_criteria(TermCriteria::new(
            core::TermCriteria_Type::COUNT as i32,
            MAX_TRAIN_ITERATIONS,
            TRAIN_EPSILON,
        )?)?;
        svm.train(&samples, ml::SampleTypes::ROW_SAMPLE as i32, &responses)?;

        let classifier = Self { svm };
        let error = if split.test.is_empty() {
            None
        } else {
            Some(classifier.evaluate(&split.test)?)
        };
        Ok((classifier, error))
    }

    /// Misclassification percentage over labeled rows
    fn evaluate(&self, rows: &[(ObjectFeatures, i32)]) -> Result<f32> {
        let samples = feature_matrix(rows)?;
        let mut predictions = Mat::default();
        self.svm.predict(&samples, &mut predictions, 0)?;

        let mut wrong = 0usize;
        for (index, (_, label)) in rows.iter().enumerate() {
            let predicted = *predictions.at_2d::<f32>(index as i32, 0)?;
            if predicted as i32 != *label {
                wrong += 1;
            }
        }
        Ok(100.0 * wrong as f32 / rows.len() as f32)
    }

    /// Classify one object
    pub fn predict(&self, features: &ObjectFeatures) -> Result<ObjectClass> {
        let row = [features.area, features.aspect_ratio];
        let sample = Mat::from_slice(&row)?;
        let response = self.svm.predict(&sample, &mut Mat::default(), 0)?;
        ObjectClass::from_label(response as i32)
            .with_context(|| format!("SVM returned unexpected label {response}"))
    }
}

/// Row-sample feature matrix, one 32-bit float row per object
fn feature_matrix(rows: &[(ObjectFeatures, i32)]) -> Result<Mat> {
    let mut data = Vec::with_capacity(rows.len() * 2);
    for (features, _) in rows {
        data.push(features.area);
        data.push(features.aspect_ratio);
    }
    let matrix = Mat::from_slice(&data)?;
    Ok(matrix.reshape(1, rows.len() as i32)?.try_clone()?)
}

/// Column of 32-bit integer class labels
fn label_column(rows: &[(ObjectFeatures, i32)]) -> Result<Mat> {
    let labels: Vec<i32> = rows.iter().map(|(_, label)| *label).collect();
    let column = Mat::from_slice(&labels)?;
    Ok(column.reshape(1, rows.len() as i32)?.try_clone()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Three clearly separated clusters in feature space
    fn synthetic_split() -> TrainTestSplit {
        let mut split = TrainTestSplit::default();
        let clusters: [(f32, f32, ObjectClass); 3] = [
            (800.0, 1.0, ObjectClass::Nut),
            (4000.0, 1.2, ObjectClass::Washer),
            (1500.0, 3.0, ObjectClass::Screw),
        ];
        for (area, aspect, class) in clusters {
            for jitter in 0..6 {
                let features =
                    ObjectFeatures::new(area + jitter as f32 * 5.0, aspect + jitter as f32 * 0.01);
                split.train.push((features, class.label()));
            }
        }
        split
    }

    #[test]
    fn test_train_without_test_rows() {
        let split = synthetic_split();
        let (_, error) = FastenerClassifier::train(&split).unwrap();
        assert!(error.is_none());
    }

    #[test]
    fn test_separated_clusters_classify_correctly() {
        let split = synthetic_split();
        let (classifier, _) = FastenerClassifier::train(&split).unwrap();

        for (features, label) in &split.train {
            let predicted = classifier.predict(features).unwrap();
            assert_eq!(predicted.label(), *label);
        }
    }

    #[test]
    fn test_evaluation_of_training_rows_is_clean() {
        let mut split = synthetic_split();
        split.test = split.train.clone();
        let (_, error) = FastenerClassifier::train(&split).unwrap();
        assert_eq!(error, Some(0.0));
    }

    #[test]
    fn test_empty_training_set_is_rejected() {
        let split = TrainTestSplit::default();
        assert!(FastenerClassifier::train(&split).is_err());
    }

    #[test]
    fn test_feature_matrix_shape() {
        let split = synthetic_split();
        let matrix = feature_matrix(&split.train).unwrap();
        assert_eq!(matrix.rows(), split.train.len() as i32);
        assert_eq!(matrix.cols(), 2);
    }
}
