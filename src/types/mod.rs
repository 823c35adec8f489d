//! User-facing order types

mod order;

pub use order::*;
