use super::*;

fn solid(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, image::Rgba(rgba))
}

#[test]
fn add_assigns_sequential_indices_and_auto_names() {
    let mut store = MaterialStore::new();
    let a = store.add_image(solid(2, 2, [255, 0, 0, 255]), "red");
    let b = store.add_image(solid(2, 2, [0, 255, 0, 255]), "");
    assert_eq!((a, b), (0, 1));
    assert_eq!(store.get(0).unwrap().name, "red");
    assert_eq!(store.get(1).unwrap().name, "Material_2");
    assert_eq!(store.get(1).unwrap().duration_ms, DEFAULT_FRAME_DURATION_MS);
}

#[test]
fn stale_indices_return_none() {
    let mut store = MaterialStore::new();
    store.add_image(solid(1, 1, [0, 0, 0, 255]), "only");
    assert!(store.get(0).is_some());
    assert!(store.get(1).is_none());
    assert!(store.remove(5).is_none());
}

#[test]
fn remove_shifts_later_indices() {
    let mut store = MaterialStore::new();
    store.add_image(solid(1, 1, [1, 0, 0, 255]), "a");
    store.add_image(solid(1, 1, [2, 0, 0, 255]), "b");
    store.add_image(solid(1, 1, [3, 0, 0, 255]), "c");

    let removed = store.remove(1).unwrap();
    assert_eq!(removed.name, "b");
    assert_eq!(store.len(), 2);
    assert_eq!(store.get(1).unwrap().name, "c");

    store.clear();
    assert!(store.is_empty());
}

#[test]
fn set_duration_validates_index() {
    let mut store = MaterialStore::new();
    store.add(solid(1, 1, [0, 0, 0, 255]), "a", 40);
    store.set_duration(0, 250).unwrap();
    assert_eq!(store.get(0).unwrap().duration_ms, 250);
    assert!(store.set_duration(3, 250).is_err());
}

#[test]
fn names_iterates_in_index_order() {
    let mut store = MaterialStore::new();
    store.add_image(solid(1, 1, [0, 0, 0, 255]), "first");
    store.add_image(solid(1, 1, [0, 0, 0, 255]), "second");
    let names: Vec<&str> = store.names().collect();
    assert_eq!(names, vec!["first", "second"]);
}
