//! # surfarea Core Library
//!
//! Structural data model, atom classification and hierarchical area aggregation for
//! solvent accessible surface area (SASA) engines.
//!
//! The numerically hard part of a SASA calculation (Shrake-Rupley or Lee-Richards surface
//! sampling) is delegated to an external engine reached through the
//! [`engine::calculation::SurfaceCalculator`] trait. This library owns everything around
//! that call: how atoms are read and filtered into a [`core::models::structure::Structure`],
//! how radii and polar/apolar classes are assigned, how one source is split into several
//! structures, and how flat per-atom areas are organized into a chain/residue/atom tree.
//!
//! ## Architectural Philosophy
//!
//! - **[`core`]: The Foundation.** Atom records, structures, option validation,
//!   classifiers and PDB-style record I/O.
//!
//! - **[`engine`]: The Logic Core.** Calculation parameters, the calculation boundary,
//!   results with their lazily built [`engine::tree::ResultTree`], class aggregation and
//!   named selections.
//!
//! - **[`workflows`]: The Public API.** Multi-structure procedures such as splitting one
//!   source into a [`workflows::split::StructureArray`].
//!
//! - **[`logging`]**: The process-wide verbosity level that gates diagnostics, and an
//!   optional subscriber that honors it.

pub mod core;
pub mod engine;
pub mod logging;
pub mod workflows;
