use thiserror::Error;

/// Invalid detector configuration.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("blur kernel size must be odd and positive, got {0}")]
    BlurKernel(u32),

    #[error("adaptive block size must be odd and at least 3, got {0}")]
    BlockSize(u32),

    #[error("adaptive offset must be finite, got {0}")]
    AdaptiveOffset(f64),

    #[error("canny thresholds must satisfy 0 <= low <= high, got low={low} high={high}")]
    CannyThresholds { low: f32, high: f32 },

    #[error("polygon epsilon factor must be finite and positive, got {0}")]
    EpsilonFactor(f64),

    #[error("area threshold must be finite and non-negative, got {0}")]
    AreaThreshold(f64),

    #[error("card sides must be between 1 and {max}, got {width}x{height}")]
    CardSize { width: u32, height: u32, max: u32 },

    #[error("at least one card preview slot is required")]
    NoPreviewSlots,

    #[error("at most {max} cards per frame are supported, got {got}")]
    TooManyCards { got: usize, max: usize },
}

/// Why a quad could not be rectified.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RectifyError {
    #[error("quad corners are coincident or collinear")]
    DegenerateQuad,

    #[error("projective transform is singular")]
    SingularTransform,
}
