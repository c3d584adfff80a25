//! # Core Models Module
//!
//! Data structures describing what a surface area calculation runs on.
//!
//! ## Key Components
//!
//! - [`atom`] - Atom records and hand-supplied residue numbers
//! - [`structure`] - Ordered atoms with parallel coordinate and radius columns
//! - [`builder`] - Filtered, classified construction from a bulk source
//! - [`options`] - Inclusion, splitting and unknown-atom policy flags
//! - [`area`] - Area breakdowns aggregated over groups of atoms
//!
//! ## Usage
//!
//! ```ignore
//! use surfarea::core::models::{options::StructureOptions, structure::Structure};
//!
//! let options = StructureOptions { include_hetatm: true, ..Default::default() };
//! let structure = Structure::from_path("1ubq.pdb", None, &options)?;
//!
//! let mut manual = Structure::new();
//! manual.add_atom("CA", "ALA", 1, 'A', Point3::new(0.0, 0.0, 0.0))?;
//! ```

pub mod area;
pub mod atom;
pub mod builder;
pub mod options;
pub mod structure;
