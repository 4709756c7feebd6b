#![deny(unsafe_code)]

pub mod index;
pub mod registry;
pub mod router;

pub use crate::index::{CellEntry, CellLocation, CellMappingIndex, TableProfile};
pub use crate::registry::CellMappingRegistry;
pub use crate::router::{
    ErrorRouter, ExactMatch, MatchBasis, RouteResult, ScoreComponent, TableCandidate,
};
