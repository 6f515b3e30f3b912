//! Batch source extraction over a directory of window files
//!
//! Every `Window_*` file found under the input directory is decoded, each
//! window is run through detection and (unless disabled) classification,
//! and the resulting sources are written as `Source_*` record files in the
//! output directory. Per-type counts are printed at the end.
//!
//! Output files mirror the input directory tree. With `--by-device` the
//! sources of all input files are instead regrouped into one file per
//! focal-plane device, e.g. `Source_FOV1_ROW3_AF2.dat`.
//!
//! Sample grids are dropped as soon as a file has been processed; only the
//! sources themselves are kept, and only in per-device mode.

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use window_sources::classify::{ClassifierKind, SourceClassifier};
use window_sources::config::PipelineConfig;
use window_sources::image_proc::detection::{SegmentationMethod, SourceDetector};
use window_sources::io::{self, SOURCE_FILE_PREFIX, WINDOW_FILE_PREFIX};
use window_sources::report::TypeCounts;
use window_sources::source::Source;
use window_sources::window::Window;

#[derive(Parser, Debug)]
#[command(
    name = "process_windows",
    about = "Extracts and classifies sources in sample windows"
)]
struct Args {
    /// Directory searched recursively for Window_* files
    input: PathBuf,

    /// Directory receiving Source_* files
    output: PathBuf,

    /// Pipeline configuration JSON (defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Classifier to use: empirical or network (overrides the config)
    #[arg(long)]
    classifier: Option<ClassifierKind>,

    /// Segmentation method: watershed or single-pass (overrides the config)
    #[arg(long)]
    segmentation: Option<SegmentationMethod>,

    /// Only detect; sources keep the UNKNOWN type
    #[arg(long)]
    no_classify: bool,

    /// Write one source file per device instead of one per input file
    #[arg(long)]
    by_device: bool,

    /// Write a JSON run summary to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Process files one at a time on the calling thread
    #[arg(long)]
    serial: bool,
}

/// Outcome of processing one window file
#[derive(Debug, Serialize)]
struct FileReport {
    input: PathBuf,
    windows: usize,
    counts: TypeCounts,
}

#[derive(Debug, Serialize)]
struct RunReport {
    config: PipelineConfig,
    classified: bool,
    files: Vec<FileReport>,
    totals: TypeCounts,
}

/// Sources of every processed window, keyed by device label
type DeviceSources = BTreeMap<String, Vec<Source>>;

/// Everything needed to turn one window file into sources
struct FileProcessor<'a> {
    detector: &'a SourceDetector,
    classifier: Option<&'a dyn SourceClassifier>,
    input_root: &'a Path,
    output_root: &'a Path,
    by_device: bool,
}

impl FileProcessor<'_> {
    /// Detect (and classify) the sources of one window file
    ///
    /// In per-file mode the sources are written immediately and nothing is
    /// returned besides the report. In per-device mode the sources are
    /// returned grouped by device; the windows are dropped either way.
    fn run(&self, path: &Path) -> Result<(FileReport, DeviceSources)> {
        let start = Instant::now();
        let mut windows = io::read_windows(path)?;

        let mut counts = TypeCounts::new();
        for window in &mut windows {
            match self.classifier {
                Some(classifier) => counts.merge(&self.detector.detect_and_classify(window, classifier)),
                None => {
                    window.sources = self.detector.detect(window);
                    counts.merge(&TypeCounts::from_sources(&window.sources));
                }
            }
        }

        debug!(
            "{}: {} windows, {} sources in {:?}",
            path.display(),
            windows.len(),
            counts.total(),
            start.elapsed()
        );

        let report = FileReport {
            input: path.to_path_buf(),
            windows: windows.len(),
            counts,
        };

        let mut devices = DeviceSources::new();
        if self.by_device {
            group_by_device(windows, &mut devices);
        } else {
            let output = io::source_file_path(self.input_root, self.output_root, path);
            write_per_file(&output, &windows)?;
        }
        Ok((report, devices))
    }
}

/// Move the sources of `windows` into `devices`, discarding the samples
fn group_by_device(windows: Vec<Window>, devices: &mut DeviceSources) {
    for window in windows {
        let label = window.device_label();
        devices.entry(label).or_default().extend(window.sources);
    }
}

fn write_per_file(path: &Path, windows: &[Window]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }
    let written = io::write_sources(path, windows.iter().flat_map(|w| w.sources.iter()))?;
    debug!("wrote {} sources to {}", written, path.display());
    Ok(())
}

fn write_per_device(output: &Path, devices: &DeviceSources) -> Result<()> {
    for (label, sources) in devices {
        let path = output.join(format!("{SOURCE_FILE_PREFIX}{label}.dat"));
        let written = io::write_sources(&path, sources)?;
        debug!("wrote {} sources to {}", written, path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::load_from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(kind) = args.classifier {
        config.classifier = kind;
    }
    if let Some(method) = args.segmentation {
        config.detection.segmentation = method;
    }

    let detector = SourceDetector::new(config.detection);
    let classifier = if args.no_classify {
        None
    } else {
        Some(config.classifier.build(&config.empirical)?)
    };

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create output directory {}", args.output.display()))?;

    let files = io::list_files(&args.input, WINDOW_FILE_PREFIX)?;
    info!(
        "Processing {} window files from {} ({} segmentation, {})",
        files.len(),
        args.input.display(),
        match config.detection.segmentation {
            SegmentationMethod::Watershed => "watershed",
            SegmentationMethod::SinglePass => "single-pass",
        },
        if args.no_classify {
            "no classification".to_string()
        } else {
            format!("{} classifier", config.classifier)
        }
    );

    let processor = FileProcessor {
        detector: &detector,
        classifier: classifier.as_deref(),
        input_root: &args.input,
        output_root: &args.output,
        by_device: args.by_device,
    };

    let start = Instant::now();
    let run = |path: &PathBuf| -> Result<(FileReport, DeviceSources)> {
        processor
            .run(path)
            .with_context(|| format!("Failed to process {}", path.display()))
    };
    let results: Vec<(FileReport, DeviceSources)> = if args.serial {
        files.iter().map(run).collect::<Result<_>>()?
    } else {
        files.par_iter().map(run).collect::<Result<_>>()?
    };

    let mut reports = Vec::with_capacity(results.len());
    let mut devices = DeviceSources::new();
    for (report, file_devices) in results {
        for (label, sources) in file_devices {
            devices.entry(label).or_default().extend(sources);
        }
        reports.push(report);
    }
    if args.by_device {
        write_per_device(&args.output, &devices)?;
    }

    let totals: TypeCounts = reports.iter().map(|r| r.counts).sum();
    let window_count: usize = reports.iter().map(|r| r.windows).sum();
    info!(
        "Processed {} windows in {} files in {:?}",
        window_count,
        reports.len(),
        start.elapsed()
    );
    print!("{totals}");
    println!("TOTAL\t{}", totals.total());

    if let Some(path) = &args.report {
        let report = RunReport {
            config,
            classified: !args.no_classify,
            files: reports,
            totals,
        };
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write report {}", path.display()))?;
        info!("Wrote run report to {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use tempfile::TempDir;
    use window_sources::classify::EmpiricalClassifier;
    use window_sources::source::SourceType;

    fn hit_window(fov: u8, ccd_strip: u8) -> Window {
        let mut samples = Array2::zeros((8, 8));
        samples[[3, 3]] = 5000.0;
        let mut window = Window::new(samples, 1, 1);
        window.fov = fov;
        window.ccd_row = 1;
        window.ccd_strip = ccd_strip;
        window
    }

    #[test]
    fn test_equal_names_in_subdirectories_get_separate_outputs() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        for sub in ["a", "b"] {
            std::fs::create_dir(input.path().join(sub)).unwrap();
        }
        let first = input.path().join("a").join("Window_1.dat");
        let second = input.path().join("b").join("Window_1.dat");
        io::write_windows(&first, &[hit_window(0, 4)]).unwrap();
        io::write_windows(&second, &[hit_window(0, 4), hit_window(1, 5)]).unwrap();

        let detector = SourceDetector::default();
        let classifier = EmpiricalClassifier::default();
        let processor = FileProcessor {
            detector: &detector,
            classifier: Some(&classifier as &dyn SourceClassifier),
            input_root: input.path(),
            output_root: output.path(),
            by_device: false,
        };
        for path in io::list_files(input.path(), WINDOW_FILE_PREFIX).unwrap() {
            let (report, devices) = processor.run(&path).unwrap();
            assert_eq!(report.counts.get(SourceType::Cosmic), report.windows);
            assert!(devices.is_empty());
        }

        let first_out = io::read_sources(&output.path().join("a").join("Source_1.dat")).unwrap();
        let second_out = io::read_sources(&output.path().join("b").join("Source_1.dat")).unwrap();
        assert_eq!(first_out.len(), 1);
        assert_eq!(second_out.len(), 2);
    }

    #[test]
    fn test_by_device_returns_sources_without_writing() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let path = input.path().join("Window_x.dat");
        io::write_windows(&path, &[hit_window(0, 4), hit_window(1, 5), hit_window(0, 4)]).unwrap();

        let detector = SourceDetector::default();
        let processor = FileProcessor {
            detector: &detector,
            classifier: None,
            input_root: input.path(),
            output_root: output.path(),
            by_device: true,
        };
        let (report, devices) = processor.run(&path).unwrap();

        assert_eq!(report.windows, 3);
        assert_eq!(report.counts.get(SourceType::Unknown), 3);
        let labels: Vec<&str> = devices.keys().map(String::as_str).collect();
        assert_eq!(labels, vec!["FOV1_ROW1_AF1", "FOV2_ROW1_AF2"]);
        assert_eq!(devices["FOV1_ROW1_AF1"].len(), 2);
        assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);

        write_per_device(output.path(), &devices).unwrap();
        let records = io::read_sources(&output.path().join("Source_FOV2_ROW1_AF2.dat")).unwrap();
        assert_eq!(records.len(), 1);
    }
}
