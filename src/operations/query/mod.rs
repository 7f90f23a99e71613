mod area;
mod length;
mod residual;

pub use area::MapArea;
pub use length::MapLength;
pub use residual::{ray_residual, ResidualSummary, ScanResidual};
