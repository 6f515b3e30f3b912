//! Source extraction and classification for scanning-instrument sample windows.
//!
//! A window is a small grid of samples read out around an object as it
//! drifts across the focal plane. This crate finds the sources in each
//! window with a noise-tolerant watershed, measures their flux and shape,
//! and classifies them as stars, cosmic rays or diffraction spikes.
//!
//! # Module Organization
//!
//! - **geometry**, **sample**, **source**, **window**: Core data types
//! - **image_proc**: Background estimation and source detection
//! - **classify**: Empirical and neural-network classifiers
//! - **config**: Tunable thresholds, loadable from JSON
//! - **io**: Binary window and source records
//! - **report**: Per-type source counts

pub mod classify;
pub mod config;
pub mod geometry;
pub mod image_proc;
pub mod io;
pub mod report;
pub mod sample;
pub mod source;
pub mod window;

pub use classify::{ClassifierKind, EmpiricalClassifier, NetworkClassifier, SourceClassifier};
pub use config::{ConfigError, DetectionConfig, EmpiricalClassifierConfig, PipelineConfig};
pub use geometry::WindowGeometry;
pub use image_proc::{BackgroundEstimate, SegmentationMethod, SourceDetector};
pub use report::TypeCounts;
pub use sample::Sample;
pub use source::{Source, SourceType};
pub use window::Window;
