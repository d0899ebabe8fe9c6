pub mod channels;
pub mod factory;
pub mod memory;
pub mod repositories;
