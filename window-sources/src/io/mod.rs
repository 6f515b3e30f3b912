//! Binary window and source records and the files that hold them.

pub mod files;
pub mod records;

pub use files::{
    append_sources, list_files, read_sources, read_windows, source_file_name, source_file_path, write_sources,
    write_windows, FileError, SOURCE_FILE_PREFIX, WINDOW_FILE_PREFIX,
};
pub use records::{
    decode_source, decode_sources, decode_window, decode_windows, encode_source, encode_window, RecordError,
    SourceRecord, SOURCE_RECORD_LEN, WINDOW_HEADER_LEN,
};
