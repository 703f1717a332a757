#[derive(thiserror::Error, Debug)]
pub enum CreativeError {
    #[error("Vision API error {code}: {message}")]
    Detection { code: i32, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid image dimensions {0:?}, expected WIDTHxHEIGHT")]
    InvalidDimensions(String),

    #[error("Invalid threshold {0}, expected a value between 0 and 1")]
    InvalidThreshold(f64),

    #[error("Invalid file name {0:?}")]
    InvalidFileName(String),

    #[error("Invalid URL {0:?}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, CreativeError>;
