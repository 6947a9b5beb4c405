pub mod config;
pub mod document;
pub mod host;
pub mod markdown;
pub mod memory;
pub mod reorder;

// Re-export key types for easier usage
pub use config::*;
pub use document::*;
pub use host::*;
pub use markdown::{block_to_markdown, parse_markdown, to_markdown};
pub use memory::MemoryEditor;
pub use reorder::*;
