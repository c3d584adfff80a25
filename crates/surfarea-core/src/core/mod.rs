//! # Core Module
//!
//! The structural data model: atom records and structures, construction options,
//! classifiers that assign radii and polar/apolar classes, and PDB-style record I/O.
//!
//! ## Architecture
//!
//! - **Classification** ([`classifier`]) - The [`classifier::Classifier`] trait, built-in
//!   tables and TOML-configured tables
//! - **Structural Representation** ([`models`]) - Atoms, structures, options and the
//!   builder that ties them to a source
//! - **File I/O** ([`io`]) - Fixed-column atom records, and write-back of computed areas
//! - **Naming Conventions** ([`utils`]) - Main-chain and hydrogen atom recognition

pub mod classifier;
pub mod io;
pub mod models;
pub mod utils;
