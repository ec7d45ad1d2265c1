use image::{Rgb, RgbImage};
use imageproc::geometry::contour_area;
use imageproc::point::Point;
use nalgebra::Point2;

use crate::error::RectifyError;
use crate::geometry::{homography_from_4pt, transform_point};
use crate::quad::OrderedQuad;

/// Quads enclosing less than this many square pixels cannot be rectified
const MIN_QUAD_AREA: f64 = 1.0;

/// Fixed-size, perspective-corrected view of a detected card
#[derive(Debug, Clone)]
pub struct RectifiedCard {
    image: RgbImage,
    quad: OrderedQuad,
}

impl RectifiedCard {
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Source quad the card was resampled from
    pub fn quad(&self) -> &OrderedQuad {
        &self.quad
    }
}

/// Bilinear interpolation at a given position
fn bilinear_interpolate(img: &RgbImage, x: f64, y: f64) -> [f64; 3] {
    let (width, height) = img.dimensions();
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let x1 = x0 + 1;
    let y1 = y0 + 1;

    let x_frac = x - x.floor();
    let y_frac = y - y.floor();

    let get_pixel = |px: i64, py: i64| -> Rgb<u8> {
        let px = px.clamp(0, width as i64 - 1) as u32;
        let py = py.clamp(0, height as i64 - 1) as u32;
        *img.get_pixel(px, py)
    };

    let p00 = get_pixel(x0, y0);
    let p10 = get_pixel(x1, y0);
    let p01 = get_pixel(x0, y1);
    let p11 = get_pixel(x1, y1);

    let mut result = [0.0; 3];
    for c in 0..3 {
        let top = p00[c] as f64 * (1.0 - x_frac) + p10[c] as f64 * x_frac;
        let bottom = p01[c] as f64 * (1.0 - x_frac) + p11[c] as f64 * x_frac;
        result[c] = top * (1.0 - y_frac) + bottom * y_frac;
    }

    result
}

fn is_degenerate(quad: &OrderedQuad) -> bool {
    let corners = quad.corners();
    let coincident = (0..4).any(|i| {
        (i + 1..4).any(|j| (corners[i] - corners[j]).norm() < f64::EPSILON)
    });
    let outline = corners.map(|p| Point::new(p.x, p.y));

    coincident || contour_area(&outline) < MIN_QUAD_AREA
}

/// Resample the quad's interior into a `width` x `height` canvas.
///
/// The four ordered corners map onto the canvas corners in the same roles, so
/// the output size never depends on the quad's own shape. Canvas pixels whose
/// preimage falls outside the frame are black.
pub fn rectify(
    frame: &RgbImage,
    quad: &OrderedQuad,
    width: u32,
    height: u32,
) -> Result<RectifiedCard, RectifyError> {
    let (src_width, src_height) = frame.dimensions();
    if src_width == 0 || src_height == 0 || is_degenerate(quad) {
        return Err(RectifyError::DegenerateQuad);
    }

    let (w, h) = (width as f64, height as f64);
    let canvas = [
        Point2::new(0.0, 0.0),
        Point2::new(w, 0.0),
        Point2::new(w, h),
        Point2::new(0.0, h),
    ];

    // Maps canvas coordinates straight into the frame, so no inversion is needed
    let frame_from_canvas =
        homography_from_4pt(&canvas, quad.corners()).ok_or(RectifyError::SingularTransform)?;

    let mut output = RgbImage::new(width, height);

    for out_y in 0..height {
        for out_x in 0..width {
            // Sample at the pixel center
            let mapped = transform_point(
                &frame_from_canvas,
                out_x as f64 + 0.5,
                out_y as f64 + 0.5,
            );

            let pixel = match mapped {
                Some((src_x, src_y))
                    if src_x >= -1.0
                        && src_x <= src_width as f64
                        && src_y >= -1.0
                        && src_y <= src_height as f64 =>
                {
                    let [r, g, b] = bilinear_interpolate(frame, src_x, src_y);
                    Rgb([
                        r.round().clamp(0.0, 255.0) as u8,
                        g.round().clamp(0.0, 255.0) as u8,
                        b.round().clamp(0.0, 255.0) as u8,
                    ])
                }
                _ => Rgb([0, 0, 0]),
            };
            output.put_pixel(out_x, out_y, pixel);
        }
    }

    Ok(RectifiedCard {
        image: output,
        quad: *quad,
    })
}
