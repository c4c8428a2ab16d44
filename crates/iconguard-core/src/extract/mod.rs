//! Primitive extraction from constrained vector markup.

pub mod document;
pub mod path_data;
pub mod shapes;

pub use shapes::extract;
