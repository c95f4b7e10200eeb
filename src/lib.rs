pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod scanner;
pub mod tables;
