// Media helpers: stream container kinds and image payload detection.

pub mod container;
pub mod image;
