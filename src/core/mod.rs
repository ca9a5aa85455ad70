pub mod annotator;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod popover;
pub mod scanner;
pub mod scheduler;
pub mod types;
pub mod vocabulary;
pub mod watcher;
