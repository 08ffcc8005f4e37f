// Adapters layer: concrete stores and the catalog client behind the domain ports.

pub mod file;
pub mod http;
pub mod memory;
