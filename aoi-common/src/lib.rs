// Shared support for the AOI demo tools: domain types, the multi-panel
// viewer and the illumination preprocessing pipeline.

pub mod panel;
pub mod preprocess;
mod types;

pub use types::{LightMethod, ObjectClass, ObjectFeatures, SegMethod};
