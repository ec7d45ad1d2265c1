use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{ImageReader, RgbImage};
use log::{debug, warn};

use crate::pipeline::{CardDetector, DetectionResult};

/// Image extensions picked up when an input is a directory
const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

/// Outcome of asking a source for the next frame
#[derive(Debug)]
pub enum Capture {
    Frame(RgbImage),
    /// Nothing to deliver this tick; the source may still produce frames later
    Gap,
    /// The source is exhausted
    Closed,
}

/// Anything that can hand out RGB frames one tick at a time
pub trait FrameSource {
    fn read(&mut self) -> Capture;

    /// Human-readable name of the frame most recently read, if the source has one
    fn current_name(&self) -> Option<String> {
        None
    }
}

/// Identifies a delivered frame to a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameTag {
    /// Position among delivered frames; gaps do not advance it
    pub index: usize,
    pub name: Option<String>,
}

impl FrameTag {
    /// Name to derive output files from
    pub fn stem(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("frame_{:05}", self.index))
    }
}

/// Still images played back as a frame stream.
///
/// Files that cannot be decoded are reported as capture gaps.
#[derive(Debug, Clone)]
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    next: usize,
}

impl ImageSequence {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths, next: 0 }
    }

    /// Expand files and directories into a sorted frame list
    pub fn from_inputs(inputs: &[PathBuf]) -> Result<Self> {
        let mut paths = Vec::new();

        for input in inputs {
            if input.is_dir() {
                let mut frames = Vec::new();
                for entry in std::fs::read_dir(input)
                    .with_context(|| format!("Failed to read directory: {:?}", input))?
                {
                    let path = entry
                        .with_context(|| format!("Failed to list directory: {:?}", input))?
                        .path();
                    if path.is_file() && has_frame_extension(&path) {
                        frames.push(path);
                    }
                }
                frames.sort();
                paths.extend(frames);
            } else if input.is_file() {
                paths.push(input.clone());
            } else {
                anyhow::bail!("Input not found: {:?}", input);
            }
        }

        Ok(Self::new(paths))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Path of the frame most recently handed out
    pub fn current_path(&self) -> Option<&Path> {
        self.next.checked_sub(1).map(|i| self.paths[i].as_path())
    }
}

fn has_frame_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn load_frame(path: &Path) -> Result<RgbImage> {
    let img = ImageReader::open(path)
        .with_context(|| format!("Failed to open frame: {:?}", path))?
        .with_guessed_format()
        .with_context(|| format!("Failed to probe frame format: {:?}", path))?
        .decode()
        .with_context(|| format!("Failed to decode frame: {:?}", path))?;
    Ok(img.to_rgb8())
}

impl FrameSource for ImageSequence {
    fn read(&mut self) -> Capture {
        let Some(path) = self.paths.get(self.next) else {
            return Capture::Closed;
        };
        self.next += 1;

        match load_frame(path) {
            Ok(frame) => Capture::Frame(frame),
            Err(e) => {
                warn!("{:#}", e);
                Capture::Gap
            }
        }
    }

    fn current_name(&self) -> Option<String> {
        self.current_path()
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned())
    }
}

/// Counters gathered while draining a source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub frames: usize,
    pub gaps: usize,
    pub cards: usize,
}

/// Pull frames until the source closes, running the detector on each one.
///
/// Gaps skip the tick entirely. The sink sees each frame alongside its own
/// freshly computed result and must not hold on to either.
pub fn drive<S, F>(source: &mut S, detector: &CardDetector, mut sink: F) -> Result<StreamSummary>
where
    S: FrameSource + ?Sized,
    F: FnMut(&FrameTag, &RgbImage, &DetectionResult) -> Result<()>,
{
    let mut summary = StreamSummary::default();

    loop {
        match source.read() {
            Capture::Frame(frame) => {
                let tag = FrameTag {
                    index: summary.frames,
                    name: source.current_name(),
                };
                let result = detector.run(&frame);
                debug!("Frame {}: {} cards", tag.stem(), result.len());
                summary.cards += result.len();
                sink(&tag, &frame, &result)
                    .with_context(|| format!("Failed to handle frame {}", tag.stem()))?;
                summary.frames += 1;
            }
            Capture::Gap => summary.gaps += 1,
            Capture::Closed => break,
        }
    }

    Ok(summary)
}
