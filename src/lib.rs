//! Deterministic core of a 2D cellular-automaton artificial-life world: a
//! grid of cells, each optionally hosting a bot whose genome is interpreted
//! by a small bytecode VM once per tick. Cells carry grass/organic
//! substrates that flow, decay and regrow.
//!
//! Rendering, configuration UI, bot import/export dialogs, camera/input
//! handling and the event loop are all external collaborators; this crate
//! is the headless simulation engine they drive.

pub mod bot;
pub mod cell;
pub mod error;
pub mod field;
pub mod observer;
pub mod rotation;
pub mod serialization;
pub mod species;
pub mod topology;

pub use bot::{Action, Bot, Decision};
pub use cell::Cell;
pub use error::{Error, Result};
pub use field::{Field, Settings};
pub use observer::Observer;
pub use serialization::{load_bot, save_bot, LoadedBot};
pub use species::Species;
pub use topology::Topology;
