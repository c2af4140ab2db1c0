pub mod apply;
pub mod document;
