pub mod entities;
pub mod prompt;
pub mod use_cases;
