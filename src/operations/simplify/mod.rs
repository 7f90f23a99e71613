mod visvalingam;

pub use visvalingam::{Simplification, TriangleMetric, VisvalingamOptions, VisvalingamSimplify};
