//! Command-line interface of the demo host

pub mod args;

pub use args::Args;
