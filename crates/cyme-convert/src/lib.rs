//! # cyme-convert: CYME network to GridLAB-D model conversion
//!
//! Turns the tables of a CYME database export into one GLM object graph per
//! network and writes it out.
//!
//! ## Pipeline
//!
//! For each network the builder
//!
//! 1. places a link placeholder on every section that carries a device
//!    ([`mappers::links`]),
//! 2. creates the nodes and picks the SWING bus ([`resolver`]),
//! 3. runs the device mappers, which replace placeholders with concrete
//!    devices or attach loads and capacitors to nodes ([`mappers`]),
//! 4. repairs dangling node references and folds the remaining placeholders
//!    into parent chains ([`reducer`]),
//! 5. removes parallel edges and checks the result ([`check`]).
//!
//! A bad device record is skipped with a warning. A network whose topology
//! cannot be reduced fails on its own; other networks of the run still
//! convert.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cyme_convert::{run, ConvertConfig, RunOptions};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ConvertConfig::load(std::path::Path::new("config.toml"))?;
//!     let summary = run(&RunOptions::new("data/feeder", "out"), config)?;
//!     println!("{} networks converted", summary.converted());
//!     Ok(())
//! }
//! ```

pub mod check;
pub mod config;
pub mod context;
pub mod mappers;
pub mod network;
pub mod reducer;
pub mod resolver;

pub use config::{AssumptionsMode, CollapseStrategy, ConvertConfig, DeviceDefaults, LoadScale};
pub use context::{NetworkContext, RunContext};
pub use mappers::MapOutcome;
pub use network::{
    convert_network, run, run_store, ConvertedNetwork, NetworkSummary, RunOptions, RunSummary,
};
