use thiserror::Error;

#[derive(Error, Debug)]
pub enum TerrainError {
    #[error("unsupported rendering backend: {0}")]
    UnsupportedBackend(String),
    #[error("world width must be positive and finite, got {0}")]
    InvalidWorldWidth(f32),
    #[error("world width {world_width} divided by 2^{levels} is not a power of two")]
    NonPowerOfTwoBaseScale { world_width: f32, levels: u32 },
    #[error("tile resolution must be at least one subdivision")]
    ZeroResolution,
    #[error("tile resolution {0} yields more vertices than 32 bit indices can address")]
    ResolutionTooLarge(u32),
    #[error("height field side length {0} is not a power of two")]
    InvalidHeightFieldSize(u32),
    #[error("height field must be square, got {width}x{height}")]
    NonSquareHeightField { width: u32, height: u32 },
    #[error("failed to decode height field image")]
    Image(#[from] image::ImageError),
    #[error("failed to read terrain config")]
    Io(#[from] std::io::Error),
    #[error("failed to parse terrain config")]
    Config(#[from] ron::error::SpannedError),
}

pub type TerrainResult<T> = Result<T, TerrainError>;
