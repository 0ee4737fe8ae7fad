use ndarray::{Array1, Array2};
use num_complex::Complex;

/// Complex-valued SAR sample (I + jQ)
pub type SarComplex = Complex<f64>;

/// Real-valued intensity or amplitude data
pub type SarReal = f64;

/// 2D complex SAR data array (line x pixel)
pub type SarImage = Array2<SarComplex>;

/// 2D real SAR data array (line x pixel)
pub type SarRealImage = Array2<SarReal>;

/// Real-valued spectral weighting vector
pub type SpectralWindow = Array1<SarReal>;

/// Error types for SAR processing
#[derive(Debug, thiserror::Error)]
pub enum SarError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Truncated file: expected {expected} bytes, only {available} available")]
    TruncatedFile { expected: u64, available: u64 },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for SAR operations
pub type SarResult<T> = Result<T, SarError>;
