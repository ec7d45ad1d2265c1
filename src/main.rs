use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};

use card_picker::{compose_preview, drive, CardDetector, Cli, ImageSequence};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = cli.detector_config()?;
    debug!("Detector config: {:?}", config);

    let output_dir = cli.output_dir();
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let mut frames = ImageSequence::from_inputs(&cli.inputs)?;
    if frames.is_empty() {
        anyhow::bail!("No frames found in {:?}", cli.inputs);
    }
    info!("Processing {} frames", frames.len());

    let detector = CardDetector::new(config)?;

    let summary = drive(&mut frames, &detector, |tag, frame, result| {
        let stem = tag.stem();

        for (slot, detection) in result.iter().enumerate() {
            let quad = detection.quad();
            debug!(
                "{} card {}: TL=({:.1}, {:.1}) TR=({:.1}, {:.1}) BR=({:.1}, {:.1}) BL=({:.1}, {:.1}), area {:.0}",
                stem,
                slot,
                quad.top_left().x,
                quad.top_left().y,
                quad.top_right().x,
                quad.top_right().y,
                quad.bottom_right().x,
                quad.bottom_right().y,
                quad.bottom_left().x,
                quad.bottom_left().y,
                detection.outline.area()
            );

            if cli.save_cards {
                let card_path = cli.output_path(&stem, &format!("card{}", slot));
                detection
                    .card
                    .image()
                    .save(&card_path)
                    .with_context(|| format!("Failed to save card: {:?}", card_path))?;
            }
        }

        let preview_path = cli.output_path(&stem, "preview");
        compose_preview(frame, result, detector.config())
            .save(&preview_path)
            .with_context(|| format!("Failed to save preview: {:?}", preview_path))?;

        info!("{}: {} card(s)", stem, result.len());
        Ok(())
    })?;

    eprintln!();
    eprintln!(
        "Processed {} frame(s), skipped {} unreadable, found {} card(s)",
        summary.frames, summary.gaps, summary.cards
    );
    eprintln!("Output directory: {:?}", output_dir);

    Ok(())
}
