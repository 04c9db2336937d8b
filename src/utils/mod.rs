//! Utility modules for common functionality
//!
//! Provides reusable utilities for file operations, process execution,
//! and clipboard access.

pub mod clipboard;
pub mod fs;
pub mod process;

pub use clipboard::Clipboard;
pub use fs::FileSystemUtils;
pub use process::ProcessRunner;
