//! Collective broadcast over a ring-ordered process group.
//!
//! Two interchangeable algorithms share one signature: every member calls
//! `broadcast_*(comm, buffer, count, root)` with the same `count` and `root`,
//! and on return `buffer[..count]` holds the root's values everywhere.
//!
//! - [`broadcast_fanout`]: the root sends to every other member in turn.
//! - [`broadcast_ring`]: the root sends to both ring neighbours and each
//!   member relays along the shorter arc, so the message travels as two
//!   chains that meet opposite the root.
//!
//! Argument checks happen before any message is posted and give the same
//! verdict on every member. A receive whose message never comes blocks
//! forever; there is no timeout.

use bytemuck::Pod;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::algs::communicator::{CommTag, Communicator};
use crate::algs::wire::expect_exact_len;
use crate::wave_error::WaveError;

/// Tag used by the broadcasts unless the caller supplies one.
pub const BROADCAST_TAG: CommTag = CommTag::new(0x0B00);

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BroadcastAlgorithm {
    /// `P-1` sequential sends from the root.
    FanOut,
    /// Shortest-arc relay around the ring.
    #[default]
    Ring,
}

/// Counter-clockwise and clockwise hop counts from `root` to `rank`.
/// Both are zero for the root itself; otherwise they sum to `size`.
pub fn ring_distances(rank: usize, size: usize, root: usize) -> (usize, usize) {
    let dist_r = (rank + size - root) % size;
    let dist_l = (size - dist_r) % size;
    (dist_l, dist_r)
}

/// One member's part in a ring broadcast.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RingRoute {
    /// Ring neighbour this member receives from; `None` for the root.
    pub recv_from: Option<usize>,
    /// Members this member forwards to, in send order.
    pub send_to: Vec<usize>,
}

/// Work out who `rank` receives from and relays to when `root` broadcasts
/// over a ring of `size` members.
///
/// A member joins the clockwise chain when `dist_r <= dist_l` and the
/// counter-clockwise chain otherwise; the member exactly opposite the root
/// (even `size`) therefore joins the clockwise chain. A member relays only if
/// its successor along the chain belongs to the same chain, so exactly
/// `size-1` messages are sent.
///
/// `root` and `rank` must be in `[0, size)`.
pub fn ring_route(rank: usize, size: usize, root: usize) -> RingRoute {
    let right = (rank + 1) % size;
    let left = (rank + size - 1) % size;

    if rank == root {
        let mut send_to = Vec::with_capacity(2);
        if size >= 2 {
            send_to.push(right);
        }
        // root-1 is counter-clockwise only while 1 < size-1
        if size >= 3 {
            send_to.push(left);
        }
        return RingRoute {
            recv_from: None,
            send_to,
        };
    }

    let (dist_l, dist_r) = ring_distances(rank, size, root);
    if dist_r <= dist_l {
        let relay = dist_r < size - dist_r - 1;
        RingRoute {
            recv_from: Some(left),
            send_to: if relay { vec![right] } else { Vec::new() },
        }
    } else {
        let relay = dist_l + 1 < size - dist_l - 1;
        RingRoute {
            recv_from: Some(right),
            send_to: if relay { vec![left] } else { Vec::new() },
        }
    }
}

fn check_args(size: usize, root: usize, count: usize, len: usize) -> Result<(), WaveError> {
    if size == 0 {
        return Err(WaveError::EmptyGroup);
    }
    if root >= size {
        return Err(WaveError::InvalidRoot { root, size });
    }
    if count > len {
        return Err(WaveError::BroadcastCountMismatch { count, len });
    }
    Ok(())
}

fn receive_into<C, T>(comm: &C, peer: usize, tag: CommTag, buf: &mut [T]) -> Result<(), WaveError>
where
    C: Communicator,
    T: Pod,
{
    let bytes: &mut [u8] = bytemuck::cast_slice_mut(buf);
    let payload = comm
        .recv(peer, tag.as_u16(), bytes.len())
        .ok_or_else(|| WaveError::comm(peer, "no payload received"))?;
    expect_exact_len(payload.len(), bytes.len()).map_err(|e| WaveError::comm(peer, e))?;
    bytes.copy_from_slice(&payload);
    Ok(())
}

/// Fan-out broadcast with the default tag.
pub fn broadcast_fanout<C, T>(
    comm: &C,
    buffer: &mut [T],
    count: usize,
    root: usize,
) -> Result<(), WaveError>
where
    C: Communicator,
    T: Pod,
{
    broadcast_fanout_with_tag(comm, buffer, count, root, BROADCAST_TAG)
}

/// Fan-out broadcast: the root sends to ranks `0..size` (skipping itself) in
/// ascending order; everybody else receives once from the root.
pub fn broadcast_fanout_with_tag<C, T>(
    comm: &C,
    buffer: &mut [T],
    count: usize,
    root: usize,
    tag: CommTag,
) -> Result<(), WaveError>
where
    C: Communicator,
    T: Pod,
{
    let (rank, size) = (comm.rank(), comm.size());
    check_args(size, root, count, buffer.len())?;
    let payload = &mut buffer[..count];

    if rank == root {
        let bytes: &[u8] = bytemuck::cast_slice(&*payload);
        for peer in (0..size).filter(|&p| p != root) {
            comm.send(peer, tag.as_u16(), bytes);
        }
        trace!("rank {rank}: fan-out root sent to {} members", size - 1);
        Ok(())
    } else {
        receive_into(comm, root, tag, payload)
    }
}

/// Ring broadcast with the default tag.
pub fn broadcast_ring<C, T>(
    comm: &C,
    buffer: &mut [T],
    count: usize,
    root: usize,
) -> Result<(), WaveError>
where
    C: Communicator,
    T: Pod,
{
    broadcast_ring_with_tag(comm, buffer, count, root, BROADCAST_TAG)
}

/// Shortest-arc ring broadcast; see [`ring_route`] for the routing rule.
pub fn broadcast_ring_with_tag<C, T>(
    comm: &C,
    buffer: &mut [T],
    count: usize,
    root: usize,
    tag: CommTag,
) -> Result<(), WaveError>
where
    C: Communicator,
    T: Pod,
{
    let (rank, size) = (comm.rank(), comm.size());
    check_args(size, root, count, buffer.len())?;
    let payload = &mut buffer[..count];

    let route = ring_route(rank, size, root);
    if let Some(from) = route.recv_from {
        receive_into(comm, from, tag, payload)?;
    }
    let bytes: &[u8] = bytemuck::cast_slice(&*payload);
    for &peer in &route.send_to {
        comm.send(peer, tag.as_u16(), bytes);
    }
    trace!("rank {rank}: ring route {route:?}");
    Ok(())
}

/// Dispatch to the selected algorithm.
pub fn broadcast<C, T>(
    comm: &C,
    algorithm: BroadcastAlgorithm,
    buffer: &mut [T],
    count: usize,
    root: usize,
) -> Result<(), WaveError>
where
    C: Communicator,
    T: Pod,
{
    match algorithm {
        BroadcastAlgorithm::FanOut => broadcast_fanout(comm, buffer, count, root),
        BroadcastAlgorithm::Ring => broadcast_ring(comm, buffer, count, root),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::{NoComm, run_local_group};

    #[test]
    fn distances_are_complementary() {
        for size in 2..9 {
            for root in 0..size {
                for rank in (0..size).filter(|&r| r != root) {
                    let (l, r) = ring_distances(rank, size, root);
                    assert_eq!(l + r, size);
                }
                assert_eq!(ring_distances(root, size, root), (0, 0));
            }
        }
    }

    #[test]
    fn opposite_member_joins_the_clockwise_chain() {
        // size 4, root 0: member 2 is two hops either way.
        let route = ring_route(2, 4, 0);
        assert_eq!(route.recv_from, Some(1));
        assert!(route.send_to.is_empty());
        assert_eq!(ring_route(1, 4, 0).send_to, vec![2]);
        assert_eq!(ring_route(3, 4, 0).recv_from, Some(0));
        assert!(ring_route(3, 4, 0).send_to.is_empty());
    }

    #[test]
    fn two_members_send_exactly_once() {
        assert_eq!(ring_route(1, 2, 1).send_to, vec![0]);
        assert_eq!(ring_route(0, 2, 1).recv_from, Some(1));
        assert!(ring_route(0, 2, 1).send_to.is_empty());
    }

    #[test]
    fn every_send_has_a_matching_receive() {
        for size in 1..12 {
            for root in 0..size {
                let routes: Vec<_> = (0..size).map(|r| ring_route(r, size, root)).collect();
                let mut edges = 0;
                for (from, route) in routes.iter().enumerate() {
                    for &to in &route.send_to {
                        assert_eq!(routes[to].recv_from, Some(from), "size {size} root {root}");
                        edges += 1;
                    }
                }
                assert_eq!(edges, size - 1, "size {size} root {root}");
                for (rank, route) in routes.iter().enumerate() {
                    assert_eq!(route.recv_from.is_none(), rank == root);
                }
            }
        }
    }

    #[test]
    fn single_member_is_a_no_op() {
        let mut buf = [1.0f64, 2.0];
        broadcast_ring(&NoComm, &mut buf, 2, 0).unwrap();
        broadcast_fanout(&NoComm, &mut buf, 2, 0).unwrap();
        assert_eq!(buf, [1.0, 2.0]);
    }

    #[test]
    fn bad_arguments_are_rejected_before_sending() {
        let mut buf = [0u32; 3];
        assert_eq!(
            broadcast_ring(&NoComm, &mut buf, 3, 1),
            Err(WaveError::InvalidRoot { root: 1, size: 1 })
        );
        assert_eq!(
            broadcast_fanout(&NoComm, &mut buf, 4, 0),
            Err(WaveError::BroadcastCountMismatch { count: 4, len: 3 })
        );
    }

    #[test]
    fn only_the_first_count_elements_travel() {
        let out = run_local_group(3, |comm| {
            let mut buf = if comm.rank() == 1 {
                [7u16, 8, 9]
            } else {
                [0u16, 0, 5]
            };
            broadcast(&comm, BroadcastAlgorithm::Ring, &mut buf, 2, 1).map(|_| buf)
        })
        .unwrap();
        assert_eq!(out[0], Ok([7, 8, 5]));
        assert_eq!(out[1], Ok([7, 8, 9]));
        assert_eq!(out[2], Ok([7, 8, 5]));
    }
}
