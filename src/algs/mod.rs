//! Re-export public algorithms.

pub mod broadcast;
pub mod communicator;
pub mod halo_exchange;
pub mod partition;
pub mod sequential;
pub mod stencil;
pub mod wire;

pub use broadcast::{BroadcastAlgorithm, broadcast, broadcast_fanout, broadcast_ring};
pub use halo_exchange::{WaveSimulation, WorkerOutcome, simulate};
pub use partition::{Partition, owned_range};
pub use sequential::simulate_sequential;
