//! XML utilities for navigating LeyChile documents.

mod utils;

pub use utils::*;
