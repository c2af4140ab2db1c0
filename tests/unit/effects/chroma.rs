use super::*;

fn img(pixels: &[[u8; 4]]) -> RgbaImage {
    let mut out = RgbaImage::new(pixels.len() as u32, 1);
    for (x, px) in pixels.iter().enumerate() {
        out.put_pixel(x as u32, 0, image::Rgba(*px));
    }
    out
}

#[test]
fn exact_match_is_transparent_at_threshold_zero() {
    let key = ChromaKey::new([0, 255, 0]).with_threshold(0.0);
    let out = key.apply(&img(&[[0, 255, 0, 255], [0, 254, 0, 255]]));
    assert_eq!(out.get_pixel(0, 0)[3], 0);
    assert_eq!(out.get_pixel(1, 0)[3], 255);
}

#[test]
fn solid_key_color_image_goes_fully_transparent() {
    let key = ChromaKey::new([0, 255, 0]).with_threshold(0.0);
    let solid = RgbaImage::from_pixel(4, 3, image::Rgba([0, 255, 0, 255]));
    let out = key.apply(&solid);
    assert!(out.pixels().all(|p| p[3] == 0));
}

#[test]
fn distance_threshold_is_euclidean() {
    // (3,4,0) away from the key: distance 5.
    let key = ChromaKey::new([10, 10, 10]).with_threshold(5.0);
    let out = key.apply(&img(&[[13, 14, 10, 200], [13, 15, 10, 200]]));
    assert_eq!(out.get_pixel(0, 0)[3], 0);
    assert_eq!(out.get_pixel(1, 0)[3], 200);
}

#[test]
fn non_matching_pixels_keep_partial_alpha() {
    let key = ChromaKey::new([255, 0, 0]).with_threshold(10.0);
    let out = key.apply(&img(&[[0, 0, 255, 77]]));
    assert_eq!(out.get_pixel(0, 0)[3], 77);
}

#[test]
fn transparent_set_grows_monotonically_with_threshold() {
    let source = img(&[
        [0, 255, 0, 255],
        [10, 245, 10, 255],
        [40, 215, 40, 255],
        [255, 0, 255, 255],
    ]);
    let count = |threshold: f32| {
        ChromaKey::new([0, 255, 0])
            .with_threshold(threshold)
            .apply(&source)
            .pixels()
            .filter(|p| p[3] == 0)
            .count()
    };

    let mut last = 0;
    for threshold in [0.0, 5.0, 20.0, 80.0, 500.0] {
        let n = count(threshold);
        assert!(n >= last, "threshold {threshold} shrank the transparent set");
        last = n;
    }
    assert_eq!(count(500.0), 4);
}

#[test]
fn default_threshold_matches_nearby_colors() {
    let key = ChromaKey::new([0, 255, 0]);
    assert_eq!(key.threshold, ChromaKey::DEFAULT_THRESHOLD);
    let out = key.apply(&img(&[[10, 240, 10, 255]]));
    assert_eq!(out.get_pixel(0, 0)[3], 0);
}
