//! End-to-end detection and classification on synthetic windows.

use approx::assert_relative_eq;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;
use tempfile::TempDir;
use window_sources::classify::{ClassifierKind, EmpiricalClassifier, SourceClassifier};
use window_sources::config::PipelineConfig;
use window_sources::image_proc::background::{estimate_background, estimate_window_background};
use window_sources::image_proc::detection::{SegmentationMethod, SourceDetector, Watershed};
use window_sources::image_proc::test_patterns::{add_gaussian_star, add_line, add_point_hit, noisy_background};
use window_sources::io;
use window_sources::report::TypeCounts;
use window_sources::source::SourceType;
use window_sources::window::Window;

fn star_window(seed: u64) -> Window {
    let mut samples = noisy_background((18, 12), 200.0, 5.0, seed).unwrap();
    add_gaussian_star(&mut samples, (9.0, 6.0), 1.5, 20000.0);
    let mut window = Window::new(samples, 1, 1);
    window.obs_time = 5.0e9;
    window
}

fn spike_window() -> Window {
    let mut samples = Array2::zeros((18, 12));
    add_line(&mut samples, (1.0, 5.0), 0.0, 16.0, 0.0, 3000.0);
    Window::new(samples, 1, 1)
}

fn hit_window(al: usize, ac: usize) -> Window {
    let mut samples = Array2::zeros((8, 8));
    add_point_hit(&mut samples, al, ac, 5000.0);
    Window::new(samples, 1, 1)
}

#[test]
fn test_isolated_hit_is_cosmic() {
    let mut window = hit_window(3, 3);
    let counts = SourceDetector::default().detect_and_classify(&mut window, &EmpiricalClassifier::default());

    assert_eq!(counts.total(), 1);
    let source = &window.sources[0];
    assert_eq!(source.len(), 1);
    assert_relative_eq!(source.peak_flux, 5000.0);
    assert!(source.flux_ratio.is_infinite());
    assert_eq!(source.source_type, SourceType::Cosmic);
}

#[test]
fn test_hit_on_first_read_out_line_is_unknown() {
    let mut window = hit_window(7, 3);
    let counts = SourceDetector::default().detect_and_classify(&mut window, &EmpiricalClassifier::default());
    assert_eq!(counts.get(SourceType::Unknown), 1);
    assert_eq!(counts.get(SourceType::Cosmic), 0);
}

#[test]
fn test_gaussian_star_is_stellar_and_round() {
    let mut window = star_window(11);
    SourceDetector::default().detect_and_classify(&mut window, &EmpiricalClassifier::default());

    let bright: Vec<_> = window.sources.iter().filter(|s| s.flux > 10_000.0).collect();
    assert_eq!(bright.len(), 1);
    let star = bright[0];
    assert_eq!(star.source_type, SourceType::Stellar);
    assert!(star.flux_ratio < 10.0);
    assert!(star.eigenvalue_ratio() < 1.2, "ratio {}", star.eigenvalue_ratio());
    assert_relative_eq!(star.obs_time, 5.0e9);
}

#[test]
fn test_al_streak_is_al_spike() {
    let mut window = spike_window();
    SourceDetector::default().detect_and_classify(&mut window, &EmpiricalClassifier::default());

    assert_eq!(window.sources.len(), 1);
    let spike = &window.sources[0];
    assert_eq!(spike.len(), 17);
    assert!(spike.eigenvalues.major > 15.0);
    assert!(spike.eigenvalue_ratio() > 3.0);
    assert_relative_eq!(spike.orientation, 0.0);
    assert_eq!(spike.source_type, SourceType::SpikeAl);
}

#[test]
fn test_segmentation_is_disjoint_and_above_threshold() {
    let mut samples = noisy_background((18, 12), 150.0, 4.0, 3).unwrap();
    add_gaussian_star(&mut samples, (5.0, 3.0), 1.2, 8000.0);
    add_gaussian_star(&mut samples, (12.0, 8.0), 1.0, 6000.0);
    add_point_hit(&mut samples, 15, 1, 4000.0);

    let view = samples.view();
    let background = estimate_window_background(&view);
    let threshold = background.threshold(10.0);
    let sources = Watershed::default().segment(&view, 1, 1, &background);
    assert!(sources.len() >= 3);

    let mut seen = HashSet::new();
    for source in &sources {
        for sample in source.samples() {
            assert!(sample.level > threshold);
            assert!(seen.insert((sample.al, sample.ac)), "sample in two sources");
        }
    }
}

#[test]
fn test_flux_is_background_subtracted_sum() {
    let window = star_window(5);
    let background = estimate_window_background(&window.samples_view());
    for source in SourceDetector::default().detect(&window) {
        let sum: f64 = source.samples().iter().map(|s| s.level - background.level).sum();
        assert_relative_eq!(source.flux, sum, max_relative = 1e-9);
    }
}

#[test]
fn test_background_ignores_sample_order() {
    let samples = noisy_background((18, 12), 120.0, 6.0, 9).unwrap();
    let mut levels: Vec<f64> = samples.iter().map(|&v| v as f64).collect();
    let reference = estimate_background(&levels);

    let mut rng = StdRng::seed_from_u64(42);
    levels.shuffle(&mut rng);
    let shuffled = estimate_background(&levels);
    assert_eq!(reference, shuffled);
}

#[test]
fn test_reclassification_is_idempotent() {
    for kind in [ClassifierKind::Empirical, ClassifierKind::Network] {
        let classifier = kind.build(&PipelineConfig::default().empirical).unwrap();
        let mut window = star_window(2);
        SourceDetector::default().detect_and_classify(&mut window, classifier.as_ref());
        for source in &window.sources {
            assert_eq!(classifier.classify(source), source.source_type);
        }
    }
}

#[test]
fn test_single_pass_finds_isolated_hit() {
    let config = PipelineConfig {
        detection: window_sources::config::DetectionConfig {
            segmentation: SegmentationMethod::SinglePass,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut window = hit_window(2, 2);
    let counts = SourceDetector::new(config.detection).detect_and_classify(&mut window, &EmpiricalClassifier::default());
    assert_eq!(counts.get(SourceType::Cosmic), 1);
}

#[test]
fn test_files_through_detection_and_back() {
    let dir = TempDir::new().unwrap();
    let window_path = dir.path().join("Window_001.dat");
    let mut first = star_window(8);
    first.fov = 1;
    first.ccd_row = 2;
    first.ccd_strip = 4;
    io::write_windows(&window_path, &[first, spike_window(), hit_window(3, 3)]).unwrap();

    let files = io::list_files(dir.path(), io::WINDOW_FILE_PREFIX).unwrap();
    assert_eq!(files, vec![window_path.clone()]);

    let mut windows = io::read_windows(&window_path).unwrap();
    assert_eq!(windows.len(), 3);
    assert_eq!(windows[0].device_label(), "FOV2_ROW2_AF1");

    let detector = SourceDetector::default();
    let classifier = EmpiricalClassifier::default();
    let counts: TypeCounts = windows
        .iter_mut()
        .map(|w| detector.detect_and_classify(w, &classifier))
        .sum();
    assert_eq!(counts.get(SourceType::SpikeAl), 1);
    assert_eq!(counts.get(SourceType::Cosmic), 1);
    assert!(counts.get(SourceType::Stellar) >= 1);

    let source_path = dir.path().join(io::source_file_name(&window_path));
    let written = io::write_sources(&source_path, windows.iter().flat_map(|w| w.sources.iter())).unwrap();
    assert_eq!(written, counts.total());

    let records = io::read_sources(&source_path).unwrap();
    assert_eq!(records.len(), written);
    let mut reread = TypeCounts::new();
    for (record, source) in records.iter().zip(windows.iter().flat_map(|w| w.sources.iter())) {
        reread.record(record.source_type);
        assert_eq!(record.flux.to_bits(), source.flux.to_bits());
        assert_eq!(record.obs_time.to_bits(), source.obs_time.to_bits());
    }
    assert_eq!(reread, counts);
}

#[test]
fn test_config_file_drives_detection() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pipeline.json");
    let mut config = PipelineConfig::default();
    config.detection.faint_source_flux = 6000.0;
    config.save_to_file(&path).unwrap();

    let loaded = PipelineConfig::load_from_file(&path).unwrap();
    let sources = SourceDetector::new(loaded.detection).detect(&hit_window(3, 3));
    assert!(sources.is_empty());
}
