//! Pyramidal Lucas-Kanade sparse optical flow.
//!
//! Both images are turned into Gaussian pyramids. Every point is tracked from
//! the coarsest level down, each level refining the displacement found on the
//! level above with an iterative Lucas-Kanade solve over a square window.

use image::GrayImage;
use rayon::prelude::*;

use super::reflect101;
use crate::image_ops::{FlowResult, Point2};

/// Tracker settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowParams {
    /// Side of the square search window, in pixels
    pub window_size: u32,
    /// Index of the coarsest pyramid level (0 disables the pyramid)
    pub max_level: u32,
    /// Iteration cap per pyramid level
    pub iterations: u32,
    /// Stop iterating once an update is shorter than this
    pub epsilon: f32,
    /// Windows whose normalised minimum eigenvalue falls below this are lost
    pub min_eigen_threshold: f32,
}

impl Default for FlowParams {
    fn default() -> Self {
        Self {
            window_size: 21,
            max_level: 3,
            iterations: 30,
            epsilon: 0.01,
            min_eigen_threshold: 1e-4,
        }
    }
}

/// Single-channel floating point image.
#[derive(Debug, Clone)]
struct Plane {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Plane {
    fn from_gray(gray: &GrayImage) -> Self {
        Self {
            width: gray.width() as usize,
            height: gray.height() as usize,
            data: gray.as_raw().iter().map(|px| f32::from(*px)).collect(),
        }
    }

    fn at(&self, x: i64, y: i64) -> f32 {
        self.data[reflect101(y, self.height) * self.width + reflect101(x, self.width)]
    }

    /// Bilinear sample, clamping coordinates to the image.
    fn sample(&self, x: f32, y: f32) -> f32 {
        let x = x.clamp(0.0, (self.width - 1) as f32);
        let y = y.clamp(0.0, (self.height - 1) as f32);
        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let fx = x - x0 as f32;
        let fy = y - y0 as f32;

        let top = self.data[y0 * self.width + x0] * (1.0 - fx) + self.data[y0 * self.width + x1] * fx;
        let bottom = self.data[y1 * self.width + x0] * (1.0 - fx) + self.data[y1 * self.width + x1] * fx;
        top * (1.0 - fy) + bottom * fy
    }

    /// 5x5 Gaussian blur followed by dropping every other row and column.
    fn pyr_down(&self) -> Plane {
        const WEIGHTS: [f32; 5] = [1.0, 4.0, 6.0, 4.0, 1.0];
        let width = self.width.div_ceil(2);
        let height = self.height.div_ceil(2);

        let mut data = vec![0f32; width * height];
        data.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
            let sy = 2 * y as i64;
            for (x, out) in row.iter_mut().enumerate() {
                let sx = 2 * x as i64;
                let mut sum = 0f32;
                for (ky, wy) in WEIGHTS.iter().enumerate() {
                    for (kx, wx) in WEIGHTS.iter().enumerate() {
                        sum += wy * wx * self.at(sx + kx as i64 - 2, sy + ky as i64 - 2);
                    }
                }
                *out = sum / 256.0;
            }
        });

        Plane {
            width,
            height,
            data,
        }
    }

    /// Scharr derivatives normalised to intensity change per pixel.
    fn gradients(&self) -> (Plane, Plane) {
        let (w, h) = (self.width, self.height);
        let mut gx = vec![0f32; w * h];
        let mut gy = vec![0f32; w * h];

        gx.par_chunks_mut(w)
            .zip(gy.par_chunks_mut(w))
            .enumerate()
            .for_each(|(y, (gx_row, gy_row))| {
                let y = y as i64;
                for x in 0..w {
                    let xi = x as i64;
                    gx_row[x] = (3.0 * (self.at(xi + 1, y - 1) - self.at(xi - 1, y - 1))
                        + 10.0 * (self.at(xi + 1, y) - self.at(xi - 1, y))
                        + 3.0 * (self.at(xi + 1, y + 1) - self.at(xi - 1, y + 1)))
                        / 32.0;
                    gy_row[x] = (3.0 * (self.at(xi - 1, y + 1) - self.at(xi - 1, y - 1))
                        + 10.0 * (self.at(xi, y + 1) - self.at(xi, y - 1))
                        + 3.0 * (self.at(xi + 1, y + 1) - self.at(xi + 1, y - 1)))
                        / 32.0;
                }
            });

        (
            Plane {
                width: w,
                height: h,
                data: gx,
            },
            Plane {
                width: w,
                height: h,
                data: gy,
            },
        )
    }
}

/// One level of the previous-image pyramid with its derivatives.
struct Level {
    image: Plane,
    grad_x: Plane,
    grad_y: Plane,
}

/// Builds levels `0..=max_level`, stopping early once a level would be smaller
/// than the search window.
fn build_pyramid(gray: &GrayImage, params: &FlowParams) -> Vec<Plane> {
    let window = params.window_size.max(1) as usize;
    let mut levels = vec![Plane::from_gray(gray)];
    for _ in 0..params.max_level {
        let Some(last) = levels.last() else { break };
        if last.width.div_ceil(2) < window || last.height.div_ceil(2) < window {
            break;
        }
        let next = last.pyr_down();
        levels.push(next);
    }
    levels
}

/// Sample of the previous image inside the tracking window.
struct WindowSample {
    offset_x: f32,
    offset_y: f32,
    intensity: f32,
    grad_x: f32,
    grad_y: f32,
}

/// Tracks a single point through the pyramids and returns its new position
/// and whether it converged.
fn track_point(prev: &[Level], next: &[Plane], point: Point2, params: &FlowParams) -> (Point2, bool) {
    let half = (params.window_size.max(1) / 2) as i32;
    let area = ((2 * half + 1) * (2 * half + 1)) as f32;
    let epsilon_sq = params.epsilon * params.epsilon;

    let mut status = true;
    let mut guess = (0f32, 0f32);

    for level in (0..prev.len()).rev() {
        let scale = (1u32 << level) as f32;
        let (px, py) = (point.x / scale, point.y / scale);
        let source = &prev[level];
        let target = &next[level];

        let mut window = Vec::with_capacity(area as usize);
        let (mut a, mut b, mut c) = (0f32, 0f32, 0f32);
        for oy in -half..=half {
            for ox in -half..=half {
                let (sx, sy) = (px + ox as f32, py + oy as f32);
                let sample = WindowSample {
                    offset_x: ox as f32,
                    offset_y: oy as f32,
                    intensity: source.image.sample(sx, sy),
                    grad_x: source.grad_x.sample(sx, sy),
                    grad_y: source.grad_y.sample(sx, sy),
                };
                a += sample.grad_x * sample.grad_x;
                b += sample.grad_x * sample.grad_y;
                c += sample.grad_y * sample.grad_y;
                window.push(sample);
            }
        }

        let det = a * c - b * b;
        let min_eigen = ((a + c) - ((a - c) * (a - c) + 4.0 * b * b).sqrt()) / (2.0 * area);
        let mut step = (0f32, 0f32);

        if min_eigen < params.min_eigen_threshold || det.abs() < f32::EPSILON {
            if level == 0 {
                status = false;
            }
        } else {
            for _ in 0..params.iterations {
                let (nx, ny) = (px + guess.0 + step.0, py + guess.1 + step.1);
                let outside = nx < -(half as f32)
                    || ny < -(half as f32)
                    || nx >= (target.width as i32 + half) as f32
                    || ny >= (target.height as i32 + half) as f32;
                if outside {
                    if level == 0 {
                        status = false;
                    }
                    break;
                }

                let (mut bx, mut by) = (0f32, 0f32);
                for sample in &window {
                    let moved = target.sample(nx + sample.offset_x, ny + sample.offset_y);
                    let diff = sample.intensity - moved;
                    bx += diff * sample.grad_x;
                    by += diff * sample.grad_y;
                }

                let delta = ((c * bx - b * by) / det, (a * by - b * bx) / det);
                step.0 += delta.0;
                step.1 += delta.1;

                if delta.0 * delta.0 + delta.1 * delta.1 <= epsilon_sq {
                    break;
                }
            }
        }

        guess = (guess.0 + step.0, guess.1 + step.1);
        if level > 0 {
            guess = (guess.0 * 2.0, guess.1 * 2.0);
        }
    }

    (Point2::new(point.x + guess.0, point.y + guess.1), status)
}

/// Tracks `points` from `prev` into `next`. Both images must share dimensions.
pub(super) fn track(
    prev: &GrayImage,
    next: &GrayImage,
    points: &[Point2],
    params: &FlowParams,
) -> FlowResult {
    if points.is_empty() {
        return FlowResult::default();
    }

    let prev_levels: Vec<Level> = build_pyramid(prev, params)
        .into_iter()
        .map(|image| {
            let (grad_x, grad_y) = image.gradients();
            Level {
                image,
                grad_x,
                grad_y,
            }
        })
        .collect();
    let mut next_levels = build_pyramid(next, params);
    next_levels.truncate(prev_levels.len());

    let (points, status): (Vec<Point2>, Vec<bool>) = points
        .par_iter()
        .map(|point| track_point(&prev_levels, &next_levels, *point, params))
        .unzip();

    FlowResult { points, status }
}
