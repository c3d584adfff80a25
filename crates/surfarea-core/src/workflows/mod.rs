//! # Workflows Module
//!
//! High-level procedures that work on a whole source rather than a single structure.
//!
//! - **Splitting** ([`split`]) - Derives a [`split::StructureArray`] from one source, one
//!   structure per model, per chain or per named chain group.

pub mod split;
