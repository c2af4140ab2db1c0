use super::*;

#[test]
fn canvas_rejects_zero_dimensions() {
    assert!(Canvas::new(0, 10).is_err());
    assert!(Canvas::new(10, 0).is_err());
    let c = Canvas::new(320, 240).unwrap();
    assert_eq!((c.width, c.height), (320, 240));
}

#[test]
fn rgba_constructors() {
    assert_eq!(Rgba8::WHITE.to_array(), [255, 255, 255, 255]);
    assert!(Rgba8::transparent().is_transparent());
    assert!(!Rgba8::opaque(0, 0, 0).is_transparent());
    assert_eq!(Rgba8::new(1, 2, 3, 4).to_array(), [1, 2, 3, 4]);
}
