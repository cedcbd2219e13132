//! baby.snapshot.v1 schema
//!
//! This module defines the row shapes fetched from the hosted data store and the
//! adapter that turns them into engine inputs.

mod adapter;
mod rows;

pub use adapter::*;
pub use rows::*;
