pub mod in_memory;
pub mod stub_rail;
