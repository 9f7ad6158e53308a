//! API 处理器

pub mod history;
pub mod lookup;
pub mod stats;

pub use history::*;
pub use lookup::*;
pub use stats::*;
