use super::*;

use image::RgbaImage;

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "gifweave_{}_{}_{}",
        tag,
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .subsec_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_sample_gif(path: &Path) {
    let frames = vec![
        RgbaImage::from_pixel(8, 8, image::Rgba([255, 0, 0, 255])),
        RgbaImage::from_pixel(8, 8, image::Rgba([0, 0, 255, 255])),
    ];
    GifEncoder::new(GifEncodeConfig::default())
        .unwrap()
        .save(&frames, &[100, 100], path)
        .unwrap();
}

#[test]
fn missing_input_is_rejected() {
    let dir = temp_dir("opt_missing");
    let err = optimize_gif_lossy(&dir.join("absent.gif"), None, &OptimizeOptions::default());
    assert!(err.is_err());
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn explicit_output_path_is_honored() {
    let dir = temp_dir("opt_explicit");
    let src = dir.join("anim.gif");
    let dst = dir.join("tight.gif");
    write_sample_gif(&src);

    let out = optimize_gif_lossy(&src, Some(&dst), &OptimizeOptions::default()).unwrap();
    assert_eq!(out, dst);
    assert_eq!(read_gif_info(&dst).unwrap().frame_count, 2);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn default_destination_is_suffixed_beside_input() {
    let dir = temp_dir("opt_suffix");
    let src = dir.join("anim.gif");
    write_sample_gif(&src);

    let out = optimize_gif_lossy(&src, None, &OptimizeOptions::default()).unwrap();
    assert_eq!(out, dir.join("anim-optimized.gif"));
    assert!(out.exists());
    // The input stays untouched in this mode.
    assert_eq!(read_gif_info(&src).unwrap().frame_count, 2);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn overwrite_replaces_the_input_in_place() {
    let dir = temp_dir("opt_overwrite");
    let src = dir.join("anim.gif");
    write_sample_gif(&src);

    let options = OptimizeOptions {
        overwrite: true,
        ..Default::default()
    };
    let out = optimize_gif_lossy(&src, None, &options).unwrap();
    assert_eq!(out, src);
    assert_eq!(read_gif_info(&src).unwrap().frame_count, 2);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn oversized_lossy_level_is_clamped_not_rejected() {
    let dir = temp_dir("opt_lossy");
    let src = dir.join("anim.gif");
    write_sample_gif(&src);

    let options = OptimizeOptions {
        lossy: 999,
        colors: Some(32),
        ..Default::default()
    };
    let out = optimize_gif_lossy(&src, None, &options).unwrap();
    assert_eq!(read_gif_info(&out).unwrap().frame_count, 2);

    std::fs::remove_dir_all(&dir).ok();
}
