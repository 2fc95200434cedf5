mod ddf;
mod tree;

pub use ddf::{DdfError, DdfParser};
pub use tree::{AccessType, DdfNode, DdfTree};
