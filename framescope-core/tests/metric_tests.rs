use framescope_core::frame::{displacement_energy, entropy_from_histogram, exposure_from_histogram};
use framescope_core::image_ops::{FlowResult, Point2};
use framescope_core::{
    CoreError, CoreResult, Frame, FrameHistory, HsvChannel, ImageOps, PatchGrid, Roi, SoftwareOps,
};
use image::{GrayImage, Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn wave_frame(width: u32, height: u32, shift_x: f32, shift_y: f32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let fx = x as f32 - shift_x;
        let fy = y as f32 - shift_y;
        let value = (128.0 + 50.0 * (fx / 4.0).sin() + 50.0 * (fy / 5.0).cos()).round() as u8;
        Rgba([value, value, value, 255])
    })
}

fn noise_frame(rng: &mut StdRng, width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |_, _| {
        Rgba([rng.r#gen(), rng.r#gen(), rng.r#gen(), 255])
    })
}

/// Software backend whose tracker always fails.
struct BrokenTracker(SoftwareOps);

impl ImageOps for BrokenTracker {
    type Image = RgbaImage;
    type Gray = GrayImage;

    fn dimensions(&self, image: &RgbaImage) -> (u32, u32) {
        self.0.dimensions(image)
    }
    fn to_gray(&self, image: &RgbaImage) -> CoreResult<GrayImage> {
        self.0.to_gray(image)
    }
    fn crop(&self, gray: &GrayImage, rect: &Roi) -> CoreResult<GrayImage> {
        self.0.crop(gray, rect)
    }
    fn mean_std_dev(&self, gray: &GrayImage) -> CoreResult<(f64, f64)> {
        self.0.mean_std_dev(gray)
    }
    fn laplacian(&self, gray: &GrayImage) -> CoreResult<GrayImage> {
        self.0.laplacian(gray)
    }
    fn hsv_planes(&self, image: &RgbaImage) -> CoreResult<[GrayImage; 3]> {
        self.0.hsv_planes(image)
    }
    fn histogram_even(&self, plane: &GrayImage, bins: usize, lower: u32, upper: u32) -> CoreResult<Vec<u32>> {
        self.0.histogram_even(plane, bins, lower, upper)
    }
    fn detect_corners(&self, gray: &GrayImage) -> CoreResult<Vec<Point2>> {
        self.0.detect_corners(gray)
    }
    fn track_points(&self, _prev: &GrayImage, _next: &GrayImage, _points: &[Point2]) -> CoreResult<FlowResult> {
        Err(CoreError::Image("tracker unavailable".to_string()))
    }
}

#[test]
fn test_blur_prefers_sharp_patches() {
    let ops = SoftwareOps::new();
    let sharp = RgbaImage::from_fn(40, 40, |x, y| {
        let value = if (x / 2 + y / 2) % 2 == 0 { 230 } else { 20 };
        Rgba([value, value, value, 255])
    });
    let flat = RgbaImage::from_pixel(40, 40, Rgba([120, 120, 120, 255]));

    let roi = Roi::full_frame(40, 40);
    let grid = PatchGrid {
        count_x: 2,
        count_y: 2,
        patch_width: 20,
        patch_height: 20,
    };

    let mut sharp_frame = Frame::new(sharp, 0);
    sharp_frame.compute_blur(&ops, &roi, &grid).unwrap();
    let mut flat_frame = Frame::new(flat, 1);
    flat_frame.compute_blur(&ops, &roi, &grid).unwrap();

    assert_eq!(sharp_frame.blur_level().len(), 4);
    assert_eq!(flat_frame.blur_level().len(), 4);
    for (sharp, flat) in sharp_frame.blur_level().iter().zip(flat_frame.blur_level()) {
        assert!(sharp.gradient_variance > 0.0);
        assert!(sharp.pixel_variance > 0.0);
        assert_eq!(flat.gradient_variance, 0.0);
        assert_eq!(flat.pixel_variance, 0.0);
    }
}

#[test]
fn test_blur_is_recomputed_not_accumulated() {
    let ops = SoftwareOps::new();
    let mut frame = Frame::new(wave_frame(32, 32, 0.0, 0.0), 0);
    let roi = Roi::new(4, 4, 20, 20);
    let grid = PatchGrid::single(&roi);
    frame.compute_blur(&ops, &roi, &grid).unwrap();
    frame.compute_blur(&ops, &roi, &grid).unwrap();
    assert_eq!(frame.blur_level().len(), 1);
}

#[test]
fn test_exposure_extremes() {
    let ops = SoftwareOps::new();
    let area = 16.0 * 16.0;

    let mut dark = Frame::new(RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 255])), 0);
    dark.compute_exposure(&ops, HsvChannel::Value, 5, area).unwrap();
    assert!((dark.exposure_level() + 1.0).abs() < 1e-12);

    let mut bright = Frame::new(RgbaImage::from_pixel(16, 16, Rgba([255, 255, 255, 255])), 1);
    bright.compute_exposure(&ops, HsvChannel::Value, 5, area).unwrap();
    assert!((bright.exposure_level() - 1.0).abs() < 1e-12);

    let mut grey = Frame::new(RgbaImage::from_pixel(16, 16, Rgba([128, 128, 128, 255])), 2);
    grey.compute_exposure(&ops, HsvChannel::Value, 5, area).unwrap();
    assert_eq!(grey.exposure_level(), 0.0);
}

#[test]
fn test_exposure_range_and_sign_flip() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let mut histogram: Vec<u32> = (0..5).map(|_| rng.gen_range(0..1000)).collect();
        let area = f64::from(histogram.iter().sum::<u32>().max(1));

        let value = exposure_from_histogram(&histogram, area);
        assert!((-1.0..=1.0).contains(&value), "{histogram:?} -> {value}");

        histogram.swap(0, 4);
        let flipped = exposure_from_histogram(&histogram, area);
        assert!((value + flipped).abs() < 1e-12, "{value} vs {flipped}");
    }
}

#[test]
fn test_entropy_is_non_negative() {
    let ops = SoftwareOps::new();
    let mut rng = StdRng::seed_from_u64(42);
    for count in 0..5 {
        let image = noise_frame(&mut rng, 24, 24);
        let mut frame = Frame::new(image, count);
        frame
            .compute_entropy(&ops, HsvChannel::Value, 256, 1e-4, 24.0 * 24.0)
            .unwrap();
        assert!(frame.entropy_level() >= 0.0);
    }

    let uniform = Frame::new(RgbaImage::from_pixel(8, 8, Rgba([40, 40, 40, 255])), 9);
    let histogram = uniform.compute_histogram(&ops, HsvChannel::Value, 256).unwrap();
    assert_eq!(histogram.len(), 256);
    assert_eq!(histogram[40], 64);
    assert!(entropy_from_histogram(&histogram, 64.0, 1e-4) >= 0.0);
    assert_eq!(entropy_from_histogram(&histogram, 64.0, 0.0), 0.0);
}

#[test]
fn test_noise_has_more_entropy_than_flat() {
    let ops = SoftwareOps::new();
    let mut rng = StdRng::seed_from_u64(3);
    let area = 32.0 * 32.0;

    let mut noisy = Frame::new(noise_frame(&mut rng, 32, 32), 0);
    noisy.compute_entropy(&ops, HsvChannel::Value, 256, 1e-4, area).unwrap();
    let mut flat = Frame::new(RgbaImage::from_pixel(32, 32, Rgba([90, 90, 90, 255])), 1);
    flat.compute_entropy(&ops, HsvChannel::Value, 256, 1e-4, area).unwrap();

    assert!(noisy.entropy_level() > flat.entropy_level());
}

#[test]
fn test_motion_is_zero_without_predecessor() {
    let ops = SoftwareOps::new();
    let mut history = FrameHistory::new(10).unwrap();
    history.push(Frame::new(wave_frame(64, 64, 0.0, 0.0), 0));

    let (previous, latest) = history.previous_and_latest_mut().unwrap();
    assert!(previous.is_placeholder());
    latest.compute_motion(previous, &ops);
    assert_eq!(latest.motion(), 0.0);
}

#[test]
fn test_identical_frames_have_no_motion() {
    let ops = SoftwareOps::new();
    let previous = Frame::new(wave_frame(96, 96, 0.0, 0.0), 0);
    let mut latest = Frame::new(wave_frame(96, 96, 0.0, 0.0), 1);
    latest.compute_motion(&previous, &ops);
    assert_eq!(latest.motion(), 0.0);
}

#[test]
fn test_flat_frames_have_positive_zero_motion() {
    let ops = SoftwareOps::new();
    let previous = Frame::new(RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 255])), 0);
    let mut latest = Frame::new(RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 255])), 1);
    latest.compute_motion(&previous, &ops);
    assert_eq!(latest.motion().to_bits(), 0f64.to_bits());
}

#[test]
fn test_single_level_entropy_is_positive_zero() {
    let ops = SoftwareOps::new();
    let mut frame = Frame::new(RgbaImage::from_pixel(8, 8, Rgba([40, 40, 40, 255])), 0);
    frame.compute_entropy(&ops, HsvChannel::Value, 256, 0.0, 64.0).unwrap();
    assert_eq!(frame.entropy_level().to_bits(), 0f64.to_bits());
}

#[test]
fn test_translated_texture_has_motion() {
    let ops = SoftwareOps::new();
    let previous = Frame::new(wave_frame(96, 96, 0.0, 0.0), 0);
    let mut latest = Frame::new(wave_frame(96, 96, 2.0, 1.0), 1);
    latest.compute_motion(&previous, &ops);
    assert!(latest.motion() > 0.0);
}

// Documented behavior, not necessarily desired: a failed tracking step keeps
// the stale motion value instead of resetting it.
#[test]
fn test_motion_keeps_previous_value_when_tracking_fails() {
    let previous = Frame::new(wave_frame(96, 96, 0.0, 0.0), 0);
    let mut latest = Frame::new(wave_frame(96, 96, 2.0, 1.0), 1);

    latest.compute_motion(&previous, &SoftwareOps::new());
    let measured = latest.motion();
    assert!(measured > 0.0);

    latest.compute_motion(&previous, &BrokenTracker(SoftwareOps::new()));
    assert_eq!(latest.motion(), measured);

    let mut fresh = Frame::new(wave_frame(96, 96, 2.0, 1.0), 2);
    fresh.compute_motion(&previous, &BrokenTracker(SoftwareOps::new()));
    assert_eq!(fresh.motion(), 0.0);
}

#[test]
fn test_displacement_energy_is_squared_norm() {
    let before = vec![Point2::new(1.0, 1.0); 4];
    let after = vec![Point2::new(2.0, 3.0); 4];
    // Each point moves by (1, 2): 4 * (1 + 4)
    assert_eq!(displacement_energy(&before, &after).unwrap(), 20.0);
}

#[test]
fn test_placeholder_metrics_fail() {
    let ops = SoftwareOps::new();
    let mut placeholder: Frame<RgbaImage> = Frame::placeholder();
    let roi = Roi::new(0, 0, 4, 4);
    let err = placeholder.compute_blur(&ops, &roi, &PatchGrid::single(&roi)).unwrap_err();
    assert!(matches!(err, CoreError::Image(_)));
}
