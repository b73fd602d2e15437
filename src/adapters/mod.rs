// Adapters layer: concrete implementations for external systems (filesystem, http services).

pub mod http;
pub mod storage;
