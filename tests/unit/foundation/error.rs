use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        GifweaveError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        GifweaveError::template("x")
            .to_string()
            .contains("template error:")
    );
    assert!(
        GifweaveError::batch("x")
            .to_string()
            .contains("batch error:")
    );
    assert!(
        GifweaveError::optimizer("x")
            .to_string()
            .contains("optimizer error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = GifweaveError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
