use crate::topology::Topology;

/// Errors surfaced at the core's two fallible boundaries: bot deserialization
/// and topology reconfiguration. Everything else in the core either cannot
/// fail by construction or is a programmer precondition violation (see
/// module docs on [`crate::field::Field::at`]).
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("bot load failed: {0}")]
    BotLoad(String),
    #[error("topology {0:?} requires a square grid, got {1}x{2}")]
    NonSquareTopology(Topology, i32, i32),
}

pub type Result<T> = std::result::Result<T, Error>;
