pub mod content;
pub mod file;

pub use content::*;
pub use file::*;
