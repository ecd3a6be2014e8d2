//! Figura Server Library
//!
//! Turns uploaded PDFs into page images, cropped figures and redacted page
//! renders, and manages the lifetime of the files it writes.
//!
//! # Modules
//!
//! - `document`: engine-agnostic document traits
//! - `mupdf`: MuPDF implementation of those traits
//! - `geometry`: box validation and coordinate mapping
//! - `raster`: crop, pad and redact on RGB rasters
//! - `pipeline`: request-level convert and extract operations
//! - `artifacts`: atomic publishing and retention of output files
//! - `routes`: HTTP surface

pub mod artifacts;
pub mod config;
pub mod document;
pub mod error;
pub mod geometry;
pub mod mupdf;
pub mod pipeline;
pub mod raster;
pub mod routes;
pub mod state;

pub use config::Config;
pub use routes::app;
pub use state::AppState;
