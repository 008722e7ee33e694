//! Core domain types

pub mod confidence;
pub mod hash;
pub mod tangle;
pub mod transaction;
pub mod trust;
