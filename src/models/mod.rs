pub mod download;
pub mod generation;
pub mod output;
pub mod prediction;

pub use download::*;
pub use generation::*;
pub use output::*;
pub use prediction::*;
