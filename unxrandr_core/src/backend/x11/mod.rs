// src/backend/x11/mod.rs
pub mod output_ops;

pub use output_ops::X11OutputSource;
