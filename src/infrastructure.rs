pub mod auth;
pub mod db;
pub mod generation;
pub mod imaging;
pub mod storage;
pub mod utils;
