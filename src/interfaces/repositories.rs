pub mod brand_kit;
pub mod history;
pub mod image_generation;
pub mod media;
pub mod sqlx_repo;
