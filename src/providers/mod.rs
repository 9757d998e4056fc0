//! Provider implementations

pub mod vertex;
