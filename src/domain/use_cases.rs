pub mod brand_kit;
pub mod catalog;
pub mod extractors;
pub mod generation;
pub mod image_processor;
pub mod media;
