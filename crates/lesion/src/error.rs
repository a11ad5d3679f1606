use thiserror::Error;

#[derive(Error, Debug)]
pub enum LesionError {
    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error(
        "Image of {width}x{height} is smaller than the {required_width}x{required_height} crop window"
    )]
    OutOfBounds {
        width: u32,
        height: u32,
        required_width: u32,
        required_height: u32,
    },

    #[error("Crop window rows {top}..{bottom} cols {left}..{right} is empty")]
    EmptyCropWindow {
        top: u32,
        bottom: u32,
        left: u32,
        right: u32,
    },

    #[error("Mask contains no foreground contour")]
    NoContourFound,

    #[error("Degenerate moments: {0}")]
    DegenerateMoment(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LesionError>;
