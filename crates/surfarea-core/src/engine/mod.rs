//! # Engine Module
//!
//! Everything that happens once a [`Structure`](crate::core::models::structure::Structure)
//! exists: running a surface calculation and turning its flat output into the views
//! callers ask for.
//!
//! ## Architecture
//!
//! - **Parameters** ([`parameters`]) - Probe radius, algorithm and resolution settings
//! - **Calculation** ([`calculation`]) - The [`calculation::SurfaceCalculator`] boundary and
//!   the [`calc`]/[`calc_coord`] entry points
//! - **Results** ([`result`], [`tree`]) - Per-atom areas and the chain/residue/atom tree
//!   built from them on demand
//! - **Aggregation** ([`classify`], [`selection`]) - Area per class name and per named
//!   selection predicate
//! - **Error Handling** ([`error`]) - The [`error::EngineError`] shared by all operations

pub mod calculation;
pub mod classify;
pub mod error;
pub mod parameters;
pub mod result;
pub mod selection;
pub mod tree;

pub use calculation::{calc, calc_coord};
