use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::{DetectorConfig, PreprocessMode};

/// Binarization strategy selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Canny edges; suits plain, evenly lit backgrounds
    Edges,
    /// Local adaptive threshold; suits uneven lighting
    Adaptive,
}

#[derive(Parser, Debug)]
#[command(name = "card-picker")]
#[command(version, about = "Find card-shaped quadrilaterals in frames and rectify them")]
pub struct Cli {
    /// Frame images or directories of frames
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output directory [default: current directory]
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// JSON detector configuration; flags below override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Binarization mode
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Minimum card area in square pixels (exclusive)
    #[arg(short, long)]
    pub area_threshold: Option<f64>,

    /// Maximum cards rectified per frame
    #[arg(long)]
    pub max_cards: Option<usize>,

    /// Rectified card size (e.g., "250x350")
    #[arg(long, value_parser = parse_size)]
    pub card_size: Option<(u32, u32)>,

    /// Also write every rectified card as its own image
    #[arg(long)]
    pub save_cards: bool,

    /// Show detection details
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Output path for a frame artifact, e.g. `frame_00003_preview.png`
    pub fn output_path(&self, stem: &str, suffix: &str) -> PathBuf {
        self.output_dir().join(format!("{}_{}.png", stem, suffix))
    }

    /// Build the detector configuration from the optional file plus flags
    pub fn detector_config(&self) -> Result<DetectorConfig> {
        let mut config = match &self.config {
            Some(path) => DetectorConfig::from_json_file(path)?,
            None => DetectorConfig::default(),
        };

        if let Some(mode) = self.mode {
            let mode = match mode {
                ModeArg::Edges => PreprocessMode::edges(),
                ModeArg::Adaptive => PreprocessMode::adaptive(),
            };
            // Switching mode without an explicit threshold picks that mode's default
            if std::mem::discriminant(&mode) != std::mem::discriminant(&config.mode) {
                config.area_threshold = mode.default_area_threshold();
                config.mode = mode;
            }
        }
        if let Some(area_threshold) = self.area_threshold {
            config.area_threshold = area_threshold;
        }
        if let Some(max_cards) = self.max_cards {
            config.max_cards = max_cards;
        }
        if let Some((width, height)) = self.card_size {
            config.card_width = width;
            config.card_height = height;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let parts: Vec<&str> = s.split(['x', 'X']).collect();
    if parts.len() != 2 {
        return Err(format!("Invalid size format '{}', expected WxH", s));
    }

    let width: u32 = parts[0]
        .parse()
        .map_err(|_| format!("Invalid width value: {}", parts[0]))?;
    let height: u32 = parts[1]
        .parse()
        .map_err(|_| format!("Invalid height value: {}", parts[1]))?;

    if width == 0 || height == 0 {
        return Err("Size values must be positive".to_string());
    }

    Ok((width, height))
}
