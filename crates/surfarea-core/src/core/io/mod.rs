//! Provides input/output for PDB-style atom records.
//!
//! Reading yields a flat list of records; filtering and classification belong to structure
//! construction. Computed areas can be written back as annotated records and read again.

pub mod pdb;
pub mod traits;
