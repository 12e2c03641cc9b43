pub mod entity;
pub mod fallback;
