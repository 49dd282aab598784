//! Analyses built on top of the aggregated tables and on raw meshes.
//!
//! * table consumers: [`gaps`], [`distribution`], [`series`]
//! * mesh profiles: [`slice`], [`decay`]
//! * scaling fits: [`trend`]

pub mod decay;
pub mod distribution;
pub mod gaps;
pub mod series;
pub mod slice;
pub mod trend;
