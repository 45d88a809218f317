pub mod debug;
pub mod error;
pub mod export;
pub mod extractor;
pub mod fetcher;
pub mod index_scanner;
pub mod models;
pub mod pipeline;
pub mod portal;
pub mod record_builder;
pub mod scheduler;
pub mod session;
pub mod stats;
pub mod tui;
