use serde::{Deserialize, Serialize};
use std::fmt;

/// Fastener categories the classifier can distinguish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectClass {
    Nut,
    Washer,
    Screw,
}

impl ObjectClass {
    /// All classes, in label order
    pub const ALL: [ObjectClass; 3] = [ObjectClass::Nut, ObjectClass::Washer, ObjectClass::Screw];

    /// Integer response label used when training and predicting
    pub fn label(self) -> i32 {
        match self {
            ObjectClass::Nut => 0,
            ObjectClass::Washer => 1,
            ObjectClass::Screw => 2,
        }
    }

    /// Inverse of [`label`](Self::label)
    pub fn from_label(label: i32) -> Option<Self> {
        match label {
            0 => Some(ObjectClass::Nut),
            1 => Some(ObjectClass::Washer),
            2 => Some(ObjectClass::Screw),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectClass::Nut => write!(f, "nut"),
            ObjectClass::Washer => write!(f, "washer"),
            ObjectClass::Screw => write!(f, "screw"),
        }
    }
}

/// Per-object shape features fed to the classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectFeatures {
    /// Object area in pixels
    pub area: f32,
    /// Long side over short side of the minimum-area bounding rect, always >= 1
    pub aspect_ratio: f32,
}

impl ObjectFeatures {
    pub fn new(area: f32, aspect_ratio: f32) -> Self {
        Self { area, aspect_ratio }
    }
}

/// How the background light pattern is removed from the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightMethod {
    /// Saturating subtraction: pattern - image
    Difference,
    /// Normalized division: (1 - image/pattern) scaled back to 8 bit
    Division,
    /// Keep the background; thresholding compensates instead
    None,
}

impl fmt::Display for LightMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LightMethod::Difference => write!(f, "difference"),
            LightMethod::Division => write!(f, "division"),
            LightMethod::None => write!(f, "none"),
        }
    }
}

/// Segmentation strategy for the object counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegMethod {
    /// Plain connected components
    Connected,
    /// Connected components with per-object statistics
    Stats,
    /// External contour finding
    Contours,
}

impl fmt::Display for SegMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegMethod::Connected => write!(f, "connected components"),
            SegMethod::Stats => write!(f, "connected components with stats"),
            SegMethod::Contours => write!(f, "contours"),
        }
    }
}
