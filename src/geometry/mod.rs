pub mod element;
pub mod map;

pub use element::{Element, Segment};
pub use map::LineMap;
