//! Thin façade over intra-process (Rayon) or inter-process (MPI) message passing.
//!
//! Messages are *contiguous byte slices* (no zero-copy guarantees).
//! All handles are **waitable** but non-blocking; the halo exchange calls
//! `.wait()` before it trusts that a halo cell is fresh.
//!
//! The transport is assumed reliable and FIFO per `(src, dst, tag)`; group
//! membership is fixed when the communicator is created.

use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::wave_error::WaveError;

/// Typed message tag. Algorithms derive their tags from a base so two
/// protocols running on the same group never match each other's messages.
///
/// Tags are limited to 15 bits: MPI only guarantees `MPI_TAG_UB >= 32767`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommTag(u16);

impl CommTag {
    /// Largest tag every MPI implementation accepts.
    pub const MAX: u16 = 0x7FFF;

    /// # Panics
    /// If `tag > CommTag::MAX`; in a `const` item this is a compile error.
    pub const fn new(tag: u16) -> Self {
        assert!(tag <= Self::MAX, "message tag exceeds the portable MPI tag bound");
        Self(tag)
    }
    pub const fn as_u16(self) -> u16 {
        self.0
    }
    /// Tag `by` slots after this one, wrapping within `0..=MAX`.
    pub const fn offset(self, by: u16) -> Self {
        Self(self.0.wrapping_add(by) & Self::MAX)
    }
}

/// Non-blocking point-to-point interface over a fixed group.
pub trait Communicator {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    /// Index of this member in `[0, size)`.
    fn rank(&self) -> usize;
    /// Number of members in the group.
    fn size(&self) -> usize;

    /// Post a send of `buf` to `peer`. Raw tags above [`CommTag::MAX`] are
    /// not portable to MPI.
    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    /// Post a receive of (at most) `len` bytes from `peer`.
    fn irecv(&self, peer: usize, tag: u16, len: usize) -> Self::RecvHandle;

    /// True only for the serial stand-in.
    fn is_no_comm(&self) -> bool {
        false
    }

    /// Blocking send: post and wait for local completion.
    fn send(&self, peer: usize, tag: u16, buf: &[u8]) {
        let _ = self.isend(peer, tag, buf).wait();
    }

    /// Blocking receive: post and wait for the payload.
    fn recv(&self, peer: usize, tag: u16, len: usize) -> Option<Vec<u8>> {
        self.irecv(peer, tag, len).wait()
    }
}

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
}

/// Compile-time no-op comm for pure serial runs: a group of one.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16, _len: usize) {}
    fn is_no_comm(&self) -> bool {
        true
    }
}

// --- RayonComm: intra-process / multi-thread ---
type Key = (usize, usize, u16); // (src, dst, tag)

#[derive(Default)]
struct Slot {
    queue: Mutex<VecDeque<Bytes>>,
    ready: Condvar,
}

/// Shared by every member of one local group; plays the role of the network.
#[derive(Default)]
struct Mailbox {
    slots: DashMap<Key, Arc<Slot>>,
    // Set once a member has panicked; receives that can no longer be
    // satisfied return `None` instead of blocking.
    poisoned: AtomicBool,
}

impl Mailbox {
    fn slot(&self, key: Key) -> Arc<Slot> {
        self.slots.entry(key).or_default().clone()
    }

    fn poison(&self) {
        self.poisoned.store(true, Ordering::SeqCst);
        for entry in self.slots.iter() {
            let slot = entry.value();
            // Taking the lock orders the wake-up after any waiter's check.
            let _queue = slot.queue.lock();
            slot.ready.notify_all();
        }
    }

    fn is_poisoned(&self) -> bool {
        self.poisoned.load(Ordering::SeqCst)
    }
}

/// Receive posted on a [`RayonComm`]; the payload is claimed on `wait`.
///
/// `wait` returns `None` if another member of the group panicked before the
/// message arrived.
pub struct LocalHandle {
    mailbox: Arc<Mailbox>,
    slot: Arc<Slot>,
    len: usize,
}

impl Wait for LocalHandle {
    fn wait(self) -> Option<Vec<u8>> {
        let mut queue = self.slot.queue.lock();
        while queue.is_empty() {
            if self.mailbox.is_poisoned() {
                return None;
            }
            self.slot.ready.wait(&mut queue);
        }
        let bytes = queue.pop_front()?;
        let n = bytes.len().min(self.len);
        Some(bytes[..n].to_vec())
    }
}

/// One member of an in-process group.
///
/// Sends are buffered and complete immediately; receives block in `wait`
/// until a message with the matching `(src, dst, tag)` is queued. Receives on
/// the same key match in the order they are waited on.
#[derive(Clone)]
pub struct RayonComm {
    rank: usize,
    size: usize,
    mailbox: Arc<Mailbox>,
}

impl fmt::Debug for RayonComm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RayonComm")
            .field("rank", &self.rank)
            .field("size", &self.size)
            .finish()
    }
}

impl RayonComm {
    /// Build all `size` members of a fresh group, in rank order.
    pub fn group(size: usize) -> Vec<Self> {
        let mailbox = Arc::new(Mailbox::default());
        (0..size)
            .map(|rank| Self {
                rank,
                size,
                mailbox: mailbox.clone(),
            })
            .collect()
    }
}

impl Communicator for RayonComm {
    type SendHandle = ();
    type RecvHandle = LocalHandle;

    fn rank(&self) -> usize {
        self.rank
    }
    fn size(&self) -> usize {
        self.size
    }

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle {
        let slot = self.mailbox.slot((self.rank, peer, tag));
        slot.queue.lock().push_back(Bytes::copy_from_slice(buf));
        slot.ready.notify_all();
    }

    fn irecv(&self, peer: usize, tag: u16, len: usize) -> Self::RecvHandle {
        LocalHandle {
            mailbox: self.mailbox.clone(),
            slot: self.mailbox.slot((peer, self.rank, tag)),
            len,
        }
    }
}

/// Run `work` once per member of a fresh `size`-member local group and
/// collect the results in rank order.
///
/// Each member gets its own thread from a dedicated pool of exactly `size`
/// threads, so members that block on each other always make progress.
///
/// A panicking member is reported as [`WaveError::WorkerPanicked`] (the
/// lowest such rank). Its peers are released: their pending receives return
/// `None`, which the exchange paths turn into a [`WaveError::CommError`].
pub fn run_local_group<F, R>(size: usize, work: F) -> Result<Vec<R>, WaveError>
where
    F: Fn(RayonComm) -> R + Sync,
    R: Send,
{
    if size == 0 {
        return Err(WaveError::EmptyGroup);
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(size)
        .thread_name(|i| format!("wave-worker-{i}"))
        .build()
        .map_err(|e| WaveError::ThreadPool(e.to_string()))?;

    let mut results: Vec<Option<R>> = (0..size).map(|_| None).collect();
    let work = &work;
    let members = RayonComm::group(size);
    let mailbox = members[0].mailbox.clone();
    pool.scope(|s| {
        for (comm, out) in members.into_iter().zip(results.iter_mut()) {
            let mailbox = &mailbox;
            s.spawn(move |_| match catch_unwind(AssertUnwindSafe(|| work(comm))) {
                Ok(r) => *out = Some(r),
                Err(_) => mailbox.poison(),
            });
        }
    });

    results
        .into_iter()
        .enumerate()
        .map(|(rank, r)| r.ok_or(WaveError::WorkerPanicked { rank }))
        .collect()
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::{CommTag, Communicator, Wait};
    use crate::wave_error::WaveError;
    use mpi::environment::Universe;
    use mpi::request::StaticScope;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::{Communicator as _, Destination, Equivalence, Source};

    /// World communicator. MPI is initialized by [`MpiComm::new`] and
    /// finalized when the value is dropped.
    pub struct MpiComm {
        pub world: SimpleCommunicator,
        rank: usize,
        size: usize,
        // Dropped last: finalizes MPI.
        _universe: Universe,
    }

    impl MpiComm {
        pub fn new() -> Result<Self, WaveError> {
            let universe = mpi::initialize().ok_or(WaveError::MpiInit)?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Ok(Self {
                world,
                rank,
                size,
                _universe: universe,
            })
        }
    }

    /// Pending MPI request. The transfer buffer is owned by the handle and
    /// released after the request completes; a handle must be waited on.
    pub struct MpiHandle {
        finish: Box<dyn FnOnce() -> Option<Vec<u8>>>,
    }

    impl Wait for MpiHandle {
        fn wait(self) -> Option<Vec<u8>> {
            (self.finish)()
        }
    }

    impl Communicator for MpiComm {
        type SendHandle = MpiHandle;
        type RecvHandle = MpiHandle;

        fn rank(&self) -> usize {
            self.rank
        }
        fn size(&self) -> usize {
            self.size
        }

        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> MpiHandle {
            debug_assert!(tag <= CommTag::MAX, "tag {tag} exceeds MPI_TAG_UB");
            let raw: *mut [u8] = Box::into_raw(buf.to_vec().into_boxed_slice());
            // SAFETY: `raw` stays allocated until the request has completed.
            let data: &'static [u8] = unsafe { &*raw };
            let req = self.world.process_at_rank(peer as i32).immediate_send_with_tag(
                StaticScope,
                data,
                i32::from(tag),
            );
            MpiHandle {
                finish: Box::new(move || {
                    req.wait();
                    // SAFETY: the request no longer references the buffer.
                    drop(unsafe { Box::from_raw(raw) });
                    None
                }),
            }
        }

        fn irecv(&self, peer: usize, tag: u16, len: usize) -> MpiHandle {
            debug_assert!(tag <= CommTag::MAX, "tag {tag} exceeds MPI_TAG_UB");
            let raw: *mut [u8] = Box::into_raw(vec![0u8; len].into_boxed_slice());
            // SAFETY: `raw` stays allocated until the request has completed.
            let data: &'static mut [u8] = unsafe { &mut *raw };
            let req = self
                .world
                .process_at_rank(peer as i32)
                .immediate_receive_into_with_tag(StaticScope, data, i32::from(tag));
            MpiHandle {
                finish: Box::new(move || {
                    let status = req.wait();
                    // SAFETY: the request no longer references the buffer.
                    let mut data = unsafe { Box::from_raw(raw) }.into_vec();
                    // Report the bytes actually delivered, not the posted size.
                    let received = usize::try_from(status.count(u8::equivalent_datatype()))
                        .unwrap_or(0);
                    data.truncate(received);
                    Some(data)
                }),
            }
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::{MpiComm, MpiHandle};
