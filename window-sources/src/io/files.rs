//! Window and source files on disk.
//!
//! Input directories hold `Window_*` files of concatenated window records;
//! processing writes `Source_*` files of concatenated source records with
//! the same suffix.

use super::records::{decode_sources, decode_windows, encode_source, encode_window, RecordError, SourceRecord};
use crate::source::Source;
use crate::window::Window;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// File name prefix of window files
pub const WINDOW_FILE_PREFIX: &str = "Window_";

/// File name prefix of source files
pub const SOURCE_FILE_PREFIX: &str = "Source_";

#[derive(Error, Debug)]
pub enum FileError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record in {}: {source}", path.display())]
    Record {
        path: PathBuf,
        #[source]
        source: RecordError,
    },

    #[error("failed to scan directory: {0}")]
    Walk(#[from] walkdir::Error),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> FileError + '_ {
    move |source| FileError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn record_error(path: &Path) -> impl FnOnce(RecordError) -> FileError + '_ {
    move |source| FileError::Record {
        path: path.to_path_buf(),
        source,
    }
}

/// Files under `dir`, at any depth, whose names start with `prefix`, sorted by path
pub fn list_files(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>, FileError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with(prefix) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Name of the source file that holds the results for a window file
///
/// `Window_0042.dat` becomes `Source_0042.dat`; names without the window
/// prefix get the source prefix prepended.
pub fn source_file_name(window_file: &Path) -> String {
    let name = window_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.strip_prefix(WINDOW_FILE_PREFIX) {
        Some(suffix) => format!("{SOURCE_FILE_PREFIX}{suffix}"),
        None => format!("{SOURCE_FILE_PREFIX}{name}"),
    }
}

/// Output path of the source file for a window file found under `input_root`
///
/// The window file's directory relative to `input_root` is recreated under
/// `output_root`, so equally named window files in different
/// subdirectories never share an output.
pub fn source_file_path(input_root: &Path, output_root: &Path, window_file: &Path) -> PathBuf {
    let relative_dir = window_file
        .parent()
        .and_then(|dir| dir.strip_prefix(input_root).ok())
        .unwrap_or_else(|| Path::new(""));
    output_root.join(relative_dir).join(source_file_name(window_file))
}

pub fn read_windows(path: &Path) -> Result<Vec<Window>, FileError> {
    let bytes = fs::read(path).map_err(io_error(path))?;
    decode_windows(&bytes).map_err(record_error(path))
}

pub fn write_windows(path: &Path, windows: &[Window]) -> Result<(), FileError> {
    let mut buf = Vec::new();
    for window in windows {
        encode_window(window, &mut buf).map_err(record_error(path))?;
    }
    fs::write(path, buf).map_err(io_error(path))
}

pub fn read_sources(path: &Path) -> Result<Vec<SourceRecord>, FileError> {
    let bytes = fs::read(path).map_err(io_error(path))?;
    decode_sources(&bytes).map_err(record_error(path))
}

/// Write sources as concatenated records, replacing any existing file
pub fn write_sources<'a>(path: &Path, sources: impl IntoIterator<Item = &'a Source>) -> Result<usize, FileError> {
    let mut buf = Vec::new();
    let mut count = 0;
    for source in sources {
        encode_source(source, &mut buf);
        count += 1;
    }
    fs::write(path, buf).map_err(io_error(path))?;
    Ok(count)
}

/// Append sources to a file, creating it if needed
pub fn append_sources<'a>(path: &Path, sources: impl IntoIterator<Item = &'a Source>) -> Result<usize, FileError> {
    use std::io::Write;

    let mut buf = Vec::new();
    let mut count = 0;
    for source in sources {
        encode_source(source, &mut buf);
        count += 1;
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_error(path))?;
    file.write_all(&buf).map_err(io_error(path))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::WindowGeometry;
    use crate::io::records::SOURCE_RECORD_LEN;
    use crate::source::SourceType;
    use ndarray::Array2;
    use tempfile::TempDir;

    #[test]
    fn test_list_files_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in ["Window_2.dat", "Window_1.dat", "Source_1.dat", "notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("Window_sub")).unwrap();
        fs::write(dir.path().join("Window_sub").join("Window_3.dat"), b"").unwrap();

        let windows = list_files(dir.path(), WINDOW_FILE_PREFIX).unwrap();
        let names: Vec<_> = windows
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["Window_1.dat", "Window_2.dat", "Window_3.dat"]);

        assert_eq!(list_files(dir.path(), SOURCE_FILE_PREFIX).unwrap().len(), 1);
    }

    #[test]
    fn test_list_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(list_files(&missing, WINDOW_FILE_PREFIX), Err(FileError::Walk(_))));
    }

    #[test]
    fn test_source_file_name() {
        assert_eq!(source_file_name(Path::new("/data/Window_0042.dat")), "Source_0042.dat");
        assert_eq!(source_file_name(Path::new("run7.bin")), "Source_run7.bin");
    }

    #[test]
    fn test_source_file_path_mirrors_subdirectories() {
        let input = Path::new("/data/in");
        let output = Path::new("/data/out");
        let top = source_file_path(input, output, Path::new("/data/in/Window_7.dat"));
        let nested_a = source_file_path(input, output, Path::new("/data/in/a/Window_7.dat"));
        let nested_b = source_file_path(input, output, Path::new("/data/in/b/Window_7.dat"));

        assert_eq!(top, Path::new("/data/out/Source_7.dat"));
        assert_eq!(nested_a, Path::new("/data/out/a/Source_7.dat"));
        assert_eq!(nested_b, Path::new("/data/out/b/Source_7.dat"));

        // Files outside the input root land at the top of the output
        let stray = source_file_path(input, output, Path::new("/elsewhere/Window_7.dat"));
        assert_eq!(stray, Path::new("/data/out/Source_7.dat"));
    }

    #[test]
    fn test_window_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Window_a.dat");
        let mut window = Window::new(Array2::from_elem((3, 4), 2.5), 1, 2);
        window.transit_id = 77;
        write_windows(&path, &[window.clone(), window]).unwrap();

        let read = read_windows(&path).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[1].transit_id, 77);
        assert_eq!(read[1].samples.dim(), (3, 4));
    }

    #[test]
    fn test_sources_write_and_append() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Source_a.dat");
        let mut source = Source::new(WindowGeometry::new(6, 6, 1, 1));
        source.source_type = SourceType::Stellar;

        assert_eq!(write_sources(&path, [&source]).unwrap(), 1);
        source.source_type = SourceType::Cosmic;
        assert_eq!(append_sources(&path, [&source, &source]).unwrap(), 2);

        assert_eq!(fs::metadata(&path).unwrap().len() as usize, 3 * SOURCE_RECORD_LEN);
        let records = read_sources(&path).unwrap();
        assert_eq!(records[0].source_type, SourceType::Stellar);
        assert_eq!(records[2].source_type, SourceType::Cosmic);
    }

    #[test]
    fn test_malformed_file_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Source_bad.dat");
        fs::write(&path, [0u8; 10]).unwrap();
        let err = read_sources(&path).unwrap_err();
        assert!(matches!(err, FileError::Record { .. }));
        assert!(err.to_string().contains("Source_bad.dat"));
    }
}
