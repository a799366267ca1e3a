pub mod memory;
pub mod optimizer;
pub mod thumbnail;
