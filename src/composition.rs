pub mod layered;
pub mod sequence;
pub mod timeline;
