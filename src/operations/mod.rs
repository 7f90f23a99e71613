pub mod extraction;
pub mod intersect;
pub mod query;
pub mod simplify;
