use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DesimapError {
    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid FITS structure in {file}: {reason}")]
    InvalidFitsStructure { file: Utf8PathBuf, reason: String },

    #[error("No BINTABLE extension found in FITS file: {0}")]
    BintableNotFound(Utf8PathBuf),

    #[error("Column {column} not found in FITS table {file}")]
    ColumnNotFound { file: Utf8PathBuf, column: String },

    #[error("Unsupported TFORM {tform} for column {column} in {file}")]
    UnsupportedTform {
        file: Utf8PathBuf,
        column: String,
        tform: String,
    },

    #[error("Invalid npy file {file}: {reason}")]
    InvalidNpyFile { file: Utf8PathBuf, reason: String },

    #[error("Coordinate arrays have mismatched lengths: ra={ra_len}, dec={dec_len}")]
    CoordinateLengthMismatch { ra_len: usize, dec_len: usize },

    #[error("Weight array has length {weights_len}, expected {expected} to match the coordinates")]
    WeightLengthMismatch {
        weights_len: usize,
        expected: usize,
    },
}
