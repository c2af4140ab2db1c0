pub mod chroma;
