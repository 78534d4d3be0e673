//! Shi-Tomasi corner detection.
//!
//! Each pixel is scored with the smaller eigenvalue of the gradient covariance
//! matrix over a `block_size` neighbourhood. Local maxima above
//! `quality_level` times the strongest score are kept, strongest first.

use image::GrayImage;
use rayon::prelude::*;

use super::reflect101;
use crate::image_ops::Point2;

/// Corner detector settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerParams {
    /// Maximum number of corners returned
    pub max_corners: usize,
    /// Minimum accepted score relative to the best corner
    pub quality_level: f64,
    /// Minimum Euclidean distance between returned corners (0 disables the check)
    pub min_distance: f64,
    /// Side of the neighbourhood the covariance matrix is summed over
    pub block_size: u32,
}

impl Default for CornerParams {
    fn default() -> Self {
        Self {
            max_corners: 1000,
            quality_level: 0.01,
            min_distance: 0.0,
            block_size: 3,
        }
    }
}

/// 3x3 Sobel derivatives with reflect-101 borders.
fn sobel(gray: &GrayImage) -> (Vec<f32>, Vec<f32>) {
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    let src = gray.as_raw();
    let at = |x: i64, y: i64| -> f32 { f32::from(src[reflect101(y, h) * w + reflect101(x, w)]) };

    let rows: Vec<(Vec<f32>, Vec<f32>)> = (0..h)
        .into_par_iter()
        .map(|y| {
            let y = y as i64;
            let mut dx_row = Vec::with_capacity(w);
            let mut dy_row = Vec::with_capacity(w);
            for x in 0..w as i64 {
                let dx = (at(x + 1, y - 1) - at(x - 1, y - 1))
                    + 2.0 * (at(x + 1, y) - at(x - 1, y))
                    + (at(x + 1, y + 1) - at(x - 1, y + 1));
                let dy = (at(x - 1, y + 1) - at(x - 1, y - 1))
                    + 2.0 * (at(x, y + 1) - at(x, y - 1))
                    + (at(x + 1, y + 1) - at(x + 1, y - 1));
                dx_row.push(dx);
                dy_row.push(dy);
            }
            (dx_row, dy_row)
        })
        .collect();

    let mut dx = Vec::with_capacity(w * h);
    let mut dy = Vec::with_capacity(w * h);
    for (dx_row, dy_row) in rows {
        dx.extend(dx_row);
        dy.extend(dy_row);
    }
    (dx, dy)
}

/// Minimum eigenvalue of the gradient covariance at every pixel.
fn min_eigen_map(gray: &GrayImage, block_size: u32) -> Vec<f32> {
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    let (dx, dy) = sobel(gray);
    let radius = i64::from(block_size.max(1) / 2);

    let mut scores = vec![0f32; w * h];
    scores.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        for (x, score) in row.iter_mut().enumerate() {
            let (mut a, mut b, mut c) = (0f32, 0f32, 0f32);
            for oy in -radius..=radius {
                let sy = reflect101(y as i64 + oy, h);
                for ox in -radius..=radius {
                    let idx = sy * w + reflect101(x as i64 + ox, w);
                    a += dx[idx] * dx[idx];
                    b += dx[idx] * dy[idx];
                    c += dy[idx] * dy[idx];
                }
            }
            let spread = ((a - c) * (a - c) + 4.0 * b * b).sqrt();
            *score = ((a + c) - spread) * 0.5;
        }
    });
    scores
}

/// Returns the strongest corners of `gray`, sorted by descending score.
pub(super) fn good_features_to_track(gray: &GrayImage, params: &CornerParams) -> Vec<Point2> {
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    if w < 3 || h < 3 || params.max_corners == 0 {
        return Vec::new();
    }

    let scores = min_eigen_map(gray, params.block_size);
    let best = scores.iter().copied().fold(0f32, f32::max);
    if best <= 0.0 {
        return Vec::new();
    }
    let threshold = (f64::from(best) * params.quality_level) as f32;

    // Local maxima of the 3x3 neighbourhood, skipping the outermost ring.
    let mut candidates: Vec<(f32, usize, usize)> = (1..h - 1)
        .into_par_iter()
        .flat_map_iter(|y| {
            let scores = &scores;
            (1..w - 1).filter_map(move |x| {
                let value = scores[y * w + x];
                if value <= threshold {
                    return None;
                }
                let is_peak = (y - 1..=y + 1)
                    .all(|ny| (x - 1..=x + 1).all(|nx| scores[ny * w + nx] <= value));
                is_peak.then_some((value, x, y))
            })
        })
        .collect();

    candidates.sort_by(|lhs, rhs| rhs.0.total_cmp(&lhs.0));

    let min_distance_sq = (params.min_distance * params.min_distance) as f32;
    let mut corners: Vec<Point2> = Vec::new();
    for (_, x, y) in candidates {
        let point = Point2::new(x as f32, y as f32);
        if min_distance_sq > 0.0 {
            let crowded = corners.iter().any(|kept| {
                let (ddx, ddy) = (kept.x - point.x, kept.y - point.y);
                ddx * ddx + ddy * ddy < min_distance_sq
            });
            if crowded {
                continue;
            }
        }
        corners.push(point);
        if corners.len() == params.max_corners {
            break;
        }
    }
    corners
}
