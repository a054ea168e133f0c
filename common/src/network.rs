pub mod domain;
pub mod subnet;
