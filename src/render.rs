//! Drawing helpers for presenting detections.
//!
//! These sit outside the detection pipeline: they only read a frame and its
//! [`DetectionResult`] and produce new images.

use image::{imageops, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::config::{DetectorConfig, MAX_CARDS, MAX_CARD_SIDE};
use crate::pipeline::DetectionResult;
use crate::quad::OrderedQuad;

pub const OUTLINE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const OUTLINE_THICKNESS: u32 = 3;
const SLOT_COLOR: Rgb<u8> = Rgb([64, 64, 64]);
const SLOT_MARGIN: u32 = 10;

/// Draw the closed outline of a quad, `thickness` pixels wide
pub fn draw_quad_mut(canvas: &mut RgbImage, quad: &OrderedQuad, color: Rgb<u8>, thickness: u32) {
    let corners = quad.corners();

    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let length = (dx * dx + dy * dy).sqrt();
        if length == 0.0 {
            continue;
        }

        // Stack parallel one-pixel lines along the edge normal
        let (nx, ny) = (-dy / length, dx / length);
        for k in 0..thickness.max(1) {
            let offset = k as f64 - (thickness.max(1) - 1) as f64 / 2.0;
            let start = ((a.x + nx * offset) as f32, (a.y + ny * offset) as f32);
            let end = ((b.x + nx * offset) as f32, (b.y + ny * offset) as f32);
            draw_line_segment_mut(canvas, start, end, color);
        }
    }
}

/// Copy of the frame with every detected card outlined
pub fn draw_overlay(frame: &RgbImage, result: &DetectionResult) -> RgbImage {
    let mut overlay = frame.clone();
    for detection in result.iter() {
        draw_quad_mut(&mut overlay, detection.quad(), OUTLINE_COLOR, OUTLINE_THICKNESS);
    }
    overlay
}

/// Top-left corner of preview slot `index` on a canvas built for `frame_width`
pub fn slot_origin(frame_width: u32, config: &DetectorConfig, index: usize) -> (u32, u32) {
    let card_height = config.card_height.min(MAX_CARD_SIDE);
    (
        frame_width.saturating_add(SLOT_MARGIN),
        SLOT_MARGIN + index.min(MAX_CARDS) as u32 * (card_height + SLOT_MARGIN),
    )
}

/// Overlay on the left, one fixed thumbnail slot per allowed card on the right.
///
/// Slots without a card this frame are left as empty outlines. The slot count
/// and card size are capped at the limits `DetectorConfig::validate` enforces.
pub fn compose_preview(
    frame: &RgbImage,
    result: &DetectionResult,
    config: &DetectorConfig,
) -> RgbImage {
    let (frame_width, frame_height) = frame.dimensions();
    let slots = config.max_cards.min(MAX_CARDS);
    let card_width = config.card_width.min(MAX_CARD_SIDE);
    let card_height = config.card_height.min(MAX_CARD_SIDE);
    let column_height = SLOT_MARGIN + slots as u32 * (card_height + SLOT_MARGIN);

    let mut canvas = RgbImage::new(
        frame_width.saturating_add(card_width + 2 * SLOT_MARGIN),
        frame_height.max(column_height),
    );
    imageops::replace(&mut canvas, &draw_overlay(frame, result), 0, 0);

    for index in 0..slots {
        let (x, y) = slot_origin(frame_width, config, index);
        match result.cards.get(index) {
            Some(detection) => {
                imageops::replace(&mut canvas, detection.card.image(), x as i64, y as i64)
            }
            None => draw_hollow_rect_mut(
                &mut canvas,
                Rect::at(x as i32, y as i32).of_size(card_width, card_height),
                SLOT_COLOR,
            ),
        }
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::CardDetector;
    use nalgebra::Point2;

    fn card_frame() -> RgbImage {
        let mut frame = RgbImage::new(320, 240);
        for y in 40..200 {
            for x in 60..180 {
                frame.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        frame
    }

    #[test]
    fn test_quad_outline_is_thick() {
        let mut canvas = RgbImage::new(60, 60);
        let quad = OrderedQuad::new(
            Point2::new(10.0, 10.0),
            Point2::new(50.0, 10.0),
            Point2::new(50.0, 50.0),
            Point2::new(10.0, 50.0),
        );
        draw_quad_mut(&mut canvas, &quad, OUTLINE_COLOR, 3);

        for y in 9..=11 {
            assert_eq!(*canvas.get_pixel(30, y), OUTLINE_COLOR);
        }
        assert_eq!(*canvas.get_pixel(30, 13), Rgb([0, 0, 0]));
        assert_eq!(*canvas.get_pixel(30, 30), Rgb([0, 0, 0]));
        assert_eq!(*canvas.get_pixel(10, 30), OUTLINE_COLOR);
    }

    #[test]
    fn test_overlay_leaves_frame_untouched() {
        let frame = card_frame();
        let detector = CardDetector::new(DetectorConfig::default()).unwrap();
        let result = detector.run(&frame);
        assert_eq!(result.len(), 1);

        let overlay = draw_overlay(&frame, &result);
        assert_eq!(overlay.dimensions(), frame.dimensions());
        assert!(overlay.pixels().any(|p| *p == OUTLINE_COLOR));
        assert!(!frame.pixels().any(|p| *p == OUTLINE_COLOR));
    }

    #[test]
    fn test_preview_layout() {
        let frame = card_frame();
        let config = DetectorConfig::default();
        let detector = CardDetector::new(config.clone()).unwrap();
        let result = detector.run(&frame);

        let preview = compose_preview(&frame, &result, &config);
        assert_eq!(preview.width(), 320 + 250 + 20);
        assert_eq!(preview.height(), 10 + 3 * (350 + 10));

        // First slot holds the white card, the second is an empty outline
        let (x, y) = slot_origin(320, &config, 0);
        assert_eq!(preview.get_pixel(x + 125, y + 175)[0], 255);
        let (x, y) = slot_origin(320, &config, 1);
        assert_eq!(*preview.get_pixel(x, y + 100), SLOT_COLOR);
        assert_eq!(*preview.get_pixel(x + 125, y + 175), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_preview_slots_are_capped() {
        let frame = RgbImage::new(40, 30);
        let config = DetectorConfig {
            card_width: 10,
            card_height: 10,
            max_cards: 20_000_000,
            ..DetectorConfig::default()
        };
        let result = CardDetector::new(DetectorConfig::default())
            .unwrap()
            .run(&frame);

        let preview = compose_preview(&frame, &result, &config);
        assert_eq!(preview.width(), 40 + 10 + 20);
        assert_eq!(preview.height(), 10 + MAX_CARDS as u32 * (10 + 10));

        let (x, y) = slot_origin(40, &config, MAX_CARDS - 1);
        assert_eq!(*preview.get_pixel(x, y), SLOT_COLOR);
    }
}
