//! Export error types

use thiserror::Error;

use crate::chart::RasterError;

/// Errors that can occur while producing a report
#[derive(Error, Debug)]
pub enum ExportError {
    /// Another export from the same exporter has not finished
    #[error("An export is already in progress")]
    AlreadyRunning,

    /// Chart rasterization failed
    #[error("Rasterization error: {0}")]
    Raster(#[from] RasterError),

    /// PDF assembly failed
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Writing the document failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<printpdf::Error> for ExportError {
    fn from(err: printpdf::Error) -> Self {
        ExportError::Pdf(err.to_string())
    }
}

/// Result type alias for export operations
pub type ExportResult<T> = Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ExportError::AlreadyRunning.to_string(),
            "An export is already in progress"
        );

        let err: ExportError = RasterError::TooLarge {
            width: 9000,
            height: 10,
        }
        .into();
        assert!(err.to_string().starts_with("Rasterization error"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: ExportError = io_err.into();
        assert!(matches!(err, ExportError::Io(_)));
    }
}
