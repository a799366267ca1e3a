pub mod auth;
pub mod brand_kit;
pub mod catalog;
pub mod generation;
pub mod history;
pub mod media;
pub mod token;
