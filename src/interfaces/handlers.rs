pub mod brand_kits;
pub mod catalog;
pub mod generate;
pub mod history;
pub mod home;
pub mod json_error;
pub mod media;
pub mod system;
