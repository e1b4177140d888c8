#![cfg_attr(docsrs, feature(doc_cfg))]
//! # wave-halo
//!
//! wave-halo advances a one-dimensional wave field with a second-order
//! leapfrog stencil, split across a fixed group of workers that trade only
//! their edge ("halo") values with their neighbours each timestep.
//!
//! ## Features
//! - Deterministic block partitioning of the interior points
//! - Halo exchange that overlaps the neighbour round-trip with interior updates
//! - Fan-out and shortest-arc ring broadcast collectives
//! - Pluggable communication backends (serial, in-process threads, MPI)
//! - A sequential reference kernel for validating distributed runs
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! wave-halo = "0.3"
//! # Optional features:
//! # features = ["mpi-support"]
//! ```
//!
//! ```
//! use wave_halo::prelude::*;
//!
//! let init = vec![0.0, 1.0, 2.0, 3.0, 4.0, 0.0];
//! let outcomes = run_local_group(2, |comm| {
//!     simulate(&comm, 1, init.clone(), init.clone(), init.clone())
//! })
//! .unwrap();
//! let field = outcomes[0].clone().unwrap().into_field().unwrap();
//! assert_eq!(field.len(), 6);
//! ```
//!
//! ## Determinism
//!
//! Partitioning, halo routing and broadcast routing are pure functions of
//! `(i_max, size, rank, root)`; a distributed run produces bit-for-bit the
//! values of [`algs::sequential::simulate_sequential`].

pub mod algs;
pub mod config;
pub mod data;
pub mod wave_error;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::broadcast::{
        BroadcastAlgorithm, broadcast, broadcast_fanout, broadcast_ring,
    };
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::communicator::{
        CommTag, Communicator, NoComm, RayonComm, Wait, run_local_group,
    };
    pub use crate::algs::halo_exchange::{WaveSimulation, WorkerOutcome, simulate};
    pub use crate::algs::partition::{Partition, owned_range};
    pub use crate::algs::sequential::simulate_sequential;
    pub use crate::config::{ExchangeMode, HaloTags, SimulationConfig};
    pub use crate::data::field::{Field, Role};
    pub use crate::wave_error::WaveError;
}
