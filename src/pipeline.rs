//! Per-frame card detection.
//!
//! [`CardDetector::run`] chains preprocessing, contour tracing, quad filtering,
//! corner ordering and rectification. Nothing is carried over between frames.

use image::RgbImage;
use log::debug;

use crate::config::DetectorConfig;
use crate::contours::extract;
use crate::error::ConfigError;
use crate::preprocess::preprocess;
use crate::quad::{filter, order, CandidateQuad, OrderedQuad};
use crate::transform::{rectify, RectifiedCard};

/// One accepted card: the raw outline as detected plus its rectified view
#[derive(Debug, Clone)]
pub struct CardDetection {
    pub outline: CandidateQuad,
    pub card: RectifiedCard,
}

impl CardDetection {
    /// Corner-ordered quad, the form renderers should draw
    pub fn quad(&self) -> &OrderedQuad {
        self.card.quad()
    }
}

/// Cards found in a single frame, in contour order and never more than the configured cap
#[derive(Debug, Clone, Default)]
pub struct DetectionResult {
    pub cards: Vec<CardDetection>,
    /// Contours traced before the cap stopped evaluation
    pub contours_examined: usize,
}

impl DetectionResult {
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CardDetection> {
        self.cards.iter()
    }
}

/// Runs the detection pipeline with a fixed configuration
#[derive(Debug, Clone)]
pub struct CardDetector {
    config: DetectorConfig,
}

impl CardDetector {
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detect and rectify up to `max_cards` cards in a frame.
    ///
    /// Contours are visited in extraction order and evaluation stops as soon
    /// as the cap is reached. Rejected contours and quads that cannot be
    /// rectified simply produce nothing.
    pub fn run(&self, frame: &RgbImage) -> DetectionResult {
        let binary = preprocess(frame, &self.config);
        let contours = extract(&binary);
        let (card_width, card_height) = self.config.card_size();

        let mut result = DetectionResult::default();
        for contour in &contours {
            if result.cards.len() >= self.config.max_cards {
                break;
            }
            result.contours_examined += 1;

            let Some(outline) = filter(contour, &self.config) else {
                continue;
            };
            let ordered = order(&outline);

            match rectify(frame, &ordered, card_width, card_height) {
                Ok(card) => result.cards.push(CardDetection { outline, card }),
                Err(e) => debug!("Dropped candidate {:?}: {}", ordered.corners(), e),
            }
        }

        debug!(
            "Frame {}x{}: {} contours, {} examined, {} cards",
            frame.width(),
            frame.height(),
            contours.len(),
            result.contours_examined,
            result.cards.len()
        );

        result
    }
}
