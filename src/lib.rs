pub mod capture;
pub mod cli;
pub mod config;
pub mod contours;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod preprocess;
pub mod quad;
pub mod render;
pub mod transform;

pub use capture::{drive, Capture, FrameSource, FrameTag, ImageSequence, StreamSummary};
pub use cli::Cli;
pub use config::{DetectorConfig, PreprocessMode};
pub use error::{ConfigError, RectifyError};
pub use pipeline::{CardDetection, CardDetector, DetectionResult};
pub use quad::{filter, order, CandidateQuad, Corner, OrderedQuad};
pub use render::{compose_preview, draw_overlay};
pub use transform::{rectify, RectifiedCard};
