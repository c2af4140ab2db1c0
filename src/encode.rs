pub mod gif;
pub mod optimize;
