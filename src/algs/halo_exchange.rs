//! Domain-decomposed leapfrog run with neighbour halo exchange.
//!
//! Each worker advances only its own [`Partition`], mirroring one halo cell
//! on either side from its neighbours every timestep. In the default
//! [`ExchangeMode::Overlapped`] mode a timestep is:
//!
//! 1. post isend/irecv with both neighbours;
//! 2. update every owned point that reads no halo cell;
//! 3. wait on the left pair, store the halo, update `start`;
//! 4. wait on the right pair, store the halo, update `stop-1`;
//! 5. rotate buffer roles.
//!
//! After the last timestep the coordinator (rank 0) collects every other
//! worker's owned range, in rank order, into its own `current` buffer.

use log::{debug, trace};

use crate::algs::communicator::{Communicator, Wait};
use crate::algs::partition::{Partition, owned_range, partitions};
use crate::algs::stencil::{update_point, update_range};
use crate::algs::wire::{VALUE_BYTES, decode_exact, encode_values};
use crate::config::{ExchangeMode, SimulationConfig};
use crate::data::field::{Field, Role};
use crate::wave_error::WaveError;

/// Rank that assembles and returns the global field.
pub const COORDINATOR: usize = 0;

/// What a worker is left holding once the run is over.
#[derive(Clone, Debug, PartialEq)]
pub enum WorkerOutcome {
    /// The coordinator's assembled global field.
    Coordinator(Vec<f64>),
    /// A non-coordinator whose range has been delivered; nothing to return.
    Released,
}

impl WorkerOutcome {
    pub fn is_coordinator(&self) -> bool {
        matches!(self, WorkerOutcome::Coordinator(_))
    }

    pub fn into_field(self) -> Option<Vec<f64>> {
        match self {
            WorkerOutcome::Coordinator(field) => Some(field),
            WorkerOutcome::Released => None,
        }
    }
}

/// One worker's view of a simulation run.
pub struct WaveSimulation<'c, C: Communicator> {
    comm: &'c C,
    i_max: usize,
    partition: Partition,
    config: SimulationConfig,
}

impl<'c, C: Communicator> WaveSimulation<'c, C> {
    /// Resolve this worker's partition for a field of `i_max` points.
    ///
    /// # Errors
    /// Any partitioning error; every member of the group gets the same one.
    pub fn new(comm: &'c C, i_max: usize, config: &SimulationConfig) -> Result<Self, WaveError> {
        let partition = owned_range(i_max, comm.size(), comm.rank())?;
        debug!(
            "rank {}/{}: owns {:?} of {} points, {:?} exchange",
            partition.rank,
            partition.size,
            partition.range(),
            i_max,
            config.exchange
        );
        Ok(Self {
            comm,
            i_max,
            partition,
            config: config.clone(),
        })
    }

    pub fn partition(&self) -> Partition {
        self.partition
    }

    /// Advance `field` by `config.t_max` timesteps and gather the result.
    pub fn run(&self, mut field: Field) -> Result<WorkerOutcome, WaveError> {
        if field.i_max() != self.i_max {
            return Err(WaveError::BufferLengthMismatch {
                role: Role::Current.name(),
                expected: self.i_max,
                got: field.i_max(),
            });
        }
        for t in 0..self.config.t_max {
            trace!("rank {}: timestep {t}", self.partition.rank);
            self.step(&mut field)?;
        }
        self.gather(field)
    }

    /// One timestep: exchange, update the owned range, rotate roles.
    pub fn step(&self, field: &mut Field) -> Result<(), WaveError> {
        match self.config.exchange {
            ExchangeMode::Overlapped => self.step_overlapped(field),
            ExchangeMode::Blocking => self.step_blocking(field),
        }
    }

    fn step_overlapped(&self, field: &mut Field) -> Result<(), WaveError> {
        let p = self.partition;
        let tags = self.config.tags;

        // 1) post both exchanges without blocking
        let left = p.has_left_neighbor().then(|| {
            let edge = encode_values(&field.current()[p.start..p.start + 1]);
            (
                self.comm.isend(p.rank - 1, tags.leftward.as_u16(), &edge),
                self.comm.irecv(p.rank - 1, tags.rightward.as_u16(), VALUE_BYTES),
            )
        });
        let right = p.has_right_neighbor().then(|| {
            let edge = encode_values(&field.current()[p.stop - 1..p.stop]);
            (
                self.comm.isend(p.rank + 1, tags.rightward.as_u16(), &edge),
                self.comm.irecv(p.rank + 1, tags.leftward.as_u16(), VALUE_BYTES),
            )
        });

        // 2) useful work while the halo cells are in flight
        let v = field.views();
        update_range(v.previous, v.current, v.next, p.interior());

        // 3) left edge
        if let Some(pending) = left {
            match join_halo(p.rank - 1, pending) {
                Ok(halo) => field.current_mut()[p.start - 1] = halo,
                Err(e) => {
                    drain(right);
                    return Err(e);
                }
            }
        }
        // A single-point range also reads the right halo; it is done below.
        if p.len() > 1 {
            let v = field.views();
            v.next[p.start] = update_point(v.previous, v.current, p.start);
        }

        // 4) right edge
        if let Some(pending) = right {
            field.current_mut()[p.stop] = join_halo(p.rank + 1, pending)?;
        }
        let v = field.views();
        v.next[p.stop - 1] = update_point(v.previous, v.current, p.stop - 1);

        // 5) previous ← current ← next
        field.rotate();
        Ok(())
    }

    /// Blocking variant. In each neighbour pair the lower rank sends first
    /// and the higher rank receives first, so rendezvous transports cannot
    /// deadlock.
    fn step_blocking(&self, field: &mut Field) -> Result<(), WaveError> {
        let p = self.partition;
        let tags = self.config.tags;

        if p.has_left_neighbor() {
            let peer = p.rank - 1;
            let payload = self.comm.recv(peer, tags.rightward.as_u16(), VALUE_BYTES);
            let halo = decode_exact(peer, payload, 1)?;
            let edge = encode_values(&field.current()[p.start..p.start + 1]);
            self.comm.send(peer, tags.leftward.as_u16(), &edge);
            field.current_mut()[p.start - 1] = halo[0];
        }
        if p.has_right_neighbor() {
            let peer = p.rank + 1;
            let edge = encode_values(&field.current()[p.stop - 1..p.stop]);
            self.comm.send(peer, tags.rightward.as_u16(), &edge);
            let payload = self.comm.recv(peer, tags.leftward.as_u16(), VALUE_BYTES);
            field.current_mut()[p.stop] = decode_exact(peer, payload, 1)?[0];
        }

        let v = field.views();
        update_range(v.previous, v.current, v.next, p.range());
        field.rotate();
        Ok(())
    }

    /// Deliver owned ranges to the coordinator.
    ///
    /// Non-coordinators send their range from the `current` buffer and are
    /// released. The coordinator receives from ranks `1..size` in order and
    /// returns its `current` buffer.
    pub fn gather(&self, mut field: Field) -> Result<WorkerOutcome, WaveError> {
        let p = self.partition;
        let tag = self.config.tags.gather.as_u16();

        if p.rank != COORDINATOR {
            let owned = encode_values(&field.current()[p.range()]);
            self.comm.send(COORDINATOR, tag, &owned);
            debug!("rank {}: delivered {} values", p.rank, p.len());
            return Ok(WorkerOutcome::Released);
        }

        for other in partitions(self.i_max, p.size)?.into_iter().skip(1) {
            let payload = self.comm.recv(other.rank, tag, other.len() * VALUE_BYTES);
            let values = decode_exact(other.rank, payload, other.len())?;
            field.current_mut()[other.range()].copy_from_slice(&values);
        }
        debug!("rank {}: assembled {} points from {} workers", p.rank, self.i_max, p.size);
        Ok(WorkerOutcome::Coordinator(field.into_role(Role::Current)))
    }
}

/// Wait on one neighbour's send/receive pair and decode its halo value.
fn join_halo<S: Wait, R: Wait>(peer: usize, (send, recv): (S, R)) -> Result<f64, WaveError> {
    let _ = send.wait();
    Ok(decode_exact(peer, recv.wait(), 1)?[0])
}

/// Complete a pair we no longer need, so no request is left outstanding.
fn drain<S: Wait, R: Wait>(pending: Option<(S, R)>) {
    if let Some((send, recv)) = pending {
        let _ = send.wait();
        let _ = recv.wait();
    }
}

/// Run `t_max` timesteps over the driver's buffers on this worker.
///
/// `P` and this worker's rank come from `comm`. Only the coordinator gets the
/// field back; every other worker returns [`WorkerOutcome::Released`].
pub fn simulate<C: Communicator>(
    comm: &C,
    t_max: usize,
    previous: Vec<f64>,
    current: Vec<f64>,
    next: Vec<f64>,
) -> Result<WorkerOutcome, WaveError> {
    let field = Field::new(previous, current, next)?;
    let config = SimulationConfig::with_steps(t_max);
    WaveSimulation::new(comm, field.i_max(), &config)?.run(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::{NoComm, run_local_group};
    use crate::algs::sequential::simulate_sequential;

    fn scenario() -> Vec<f64> {
        vec![0.0, 1.0, 2.0, 3.0, 4.0, 0.0]
    }

    #[test]
    fn single_worker_matches_sequential_kernel() {
        let init = vec![0.0, 0.5, 1.0, -0.25, 0.75, 0.1, 0.0];
        let got = simulate(&NoComm, 9, init.clone(), init.clone(), init.clone())
            .unwrap()
            .into_field()
            .unwrap();
        let want = simulate_sequential(9, Field::at_rest(init).unwrap());
        assert_eq!(got, want);
    }

    #[test]
    fn two_workers_one_step() {
        let outcomes = run_local_group(2, |comm| {
            simulate(&comm, 1, scenario(), scenario(), scenario())
        })
        .unwrap();
        let field = outcomes[0].clone().unwrap().into_field().unwrap();
        let want = [0.0, 1.0, 2.0, 3.0, 3.25, 0.0];
        for (g, w) in field.iter().zip(want) {
            assert!((g - w).abs() < 1e-12, "{field:?}");
        }
        assert_eq!(outcomes[1], Ok(WorkerOutcome::Released));
    }

    #[test]
    fn one_point_per_worker_waits_for_both_halos() {
        let init: Vec<f64> = (0..6).map(|i| (i * i) as f64 * 0.1).collect();
        let outcomes = run_local_group(4, |comm| {
            simulate(&comm, 5, init.clone(), init.clone(), init.clone())
        })
        .unwrap();
        let got = outcomes[0].clone().unwrap().into_field().unwrap();
        let want = simulate_sequential(5, Field::at_rest(init.clone()).unwrap());
        assert_eq!(got, want);
    }

    #[test]
    fn oversized_group_fails_everywhere_before_communicating() {
        let outcomes = run_local_group(3, |comm| {
            simulate(&comm, 1, vec![0.0; 4], vec![0.0; 4], vec![0.0; 4])
        })
        .unwrap();
        for out in outcomes {
            assert_eq!(
                out,
                Err(WaveError::TooManyWorkers {
                    workers: 3,
                    interior: 2
                })
            );
        }
    }

    #[test]
    fn run_rejects_a_field_of_the_wrong_size() {
        let sim = WaveSimulation::new(&NoComm, 5, &SimulationConfig::default()).unwrap();
        let res = sim.run(Field::at_rest(vec![0.0; 4]).unwrap());
        assert!(matches!(res, Err(WaveError::BufferLengthMismatch { .. })));
    }
}
