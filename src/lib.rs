pub mod detection;
pub mod error;
pub mod models;
pub mod ocr;
pub mod overlay;
pub mod pipeline;
pub mod rectify;
pub mod session;

pub use detection::QuadDetector;
pub use detection::preprocessing::Preprocessor;
pub use error::ScanError;
pub use models::{BoundingBox, Quad, TextToken, TokenLevel};
pub use ocr::{EngineOptions, OcrBackend, OcrExtractor};
pub use pipeline::{DebugLevel, Pipeline, ScanOutcome, ScanReport};
pub use rectify::Rectification;
pub use session::{DebugArtifactWriter, NullObserver, ResultSession, StageObserver};
