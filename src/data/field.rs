//! Field: three role-addressed buffers for the leapfrog scheme.
//!
//! The `Field` type owns three equally sized `Vec<f64>` slots. Which slot is
//! `previous`, `current` or `next` is recorded in a [`RoleMap`]; advancing a
//! timestep permutes the map and never moves or copies data.

use serde::{Deserialize, Serialize};

use crate::wave_error::WaveError;

/// The part a storage slot plays during one timestep.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Values at `t-1`.
    Previous,
    /// Values at `t`; the only role that holds halo cells.
    Current,
    /// Values at `t+1`, being written.
    Next,
}

impl Role {
    /// All roles in slot-assignment order.
    pub const ALL: [Role; 3] = [Role::Previous, Role::Current, Role::Next];

    /// Lower-case name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Role::Previous => "previous",
            Role::Current => "current",
            Role::Next => "next",
        }
    }

    fn index(self) -> usize {
        match self {
            Role::Previous => 0,
            Role::Current => 1,
            Role::Next => 2,
        }
    }
}

/// Slot index held by each role. Always a permutation of `[0, 1, 2]`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleMap {
    slots: [usize; 3],
}

impl Default for RoleMap {
    fn default() -> Self {
        Self { slots: [0, 1, 2] }
    }
}

impl RoleMap {
    /// Storage slot currently playing `role`.
    pub fn slot(&self, role: Role) -> usize {
        self.slots[role.index()]
    }

    /// previous ← current, current ← next, next ← previous.
    pub fn rotate(&mut self) {
        let [previous, current, next] = self.slots;
        self.slots = [current, next, previous];
    }

    /// The map after `steps` rotations. Rotation has period three.
    pub fn after(steps: usize) -> Self {
        let mut map = Self::default();
        for _ in 0..steps % 3 {
            map.rotate();
        }
        map
    }
}

/// Borrowed views of all three roles at once, for one stencil sweep.
pub struct StencilViews<'a> {
    /// Read-only `t-1` values.
    pub previous: &'a [f64],
    /// Read-only `t` values, halo cells included.
    pub current: &'a [f64],
    /// Writable `t+1` values.
    pub next: &'a mut [f64],
}

/// Three buffers of `i_max` points plus the role assignment.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    buffers: [Vec<f64>; 3],
    roles: RoleMap,
}

impl Field {
    /// Take ownership of the driver's buffers.
    ///
    /// Every slot eventually plays `current`, so the two boundary cells of
    /// `previous` and `next` are pinned to those of `current`.
    ///
    /// # Errors
    /// `FieldTooSmall` if `current` has fewer than three points,
    /// `BufferLengthMismatch` if the other buffers differ in length.
    pub fn new(
        mut previous: Vec<f64>,
        current: Vec<f64>,
        mut next: Vec<f64>,
    ) -> Result<Self, WaveError> {
        let i_max = current.len();
        if i_max < 3 {
            return Err(WaveError::FieldTooSmall { i_max });
        }
        for (role, buf) in [(Role::Previous, &mut previous), (Role::Next, &mut next)] {
            if buf.len() != i_max {
                return Err(WaveError::BufferLengthMismatch {
                    role: role.name(),
                    expected: i_max,
                    got: buf.len(),
                });
            }
            buf[0] = current[0];
            buf[i_max - 1] = current[i_max - 1];
        }
        Ok(Self {
            buffers: [previous, current, next],
            roles: RoleMap::default(),
        })
    }

    /// A field at rest in the shape `current`: `previous` equals `current`
    /// and `next` starts as a copy so its boundaries are already set.
    pub fn at_rest(current: Vec<f64>) -> Result<Self, WaveError> {
        Self::new(current.clone(), current.clone(), current)
    }

    /// Number of spatial points.
    pub fn i_max(&self) -> usize {
        self.buffers[0].len()
    }

    /// Current role assignment.
    pub fn roles(&self) -> RoleMap {
        self.roles
    }

    /// Read the buffer playing `role`.
    pub fn get(&self, role: Role) -> &[f64] {
        &self.buffers[self.roles.slot(role)]
    }

    /// Mutable access to the buffer playing `role`.
    pub fn get_mut(&mut self, role: Role) -> &mut [f64] {
        &mut self.buffers[self.roles.slot(role)]
    }

    /// Shorthand for `get(Role::Current)`.
    pub fn current(&self) -> &[f64] {
        self.get(Role::Current)
    }

    /// Shorthand for `get_mut(Role::Current)`; halo cells are stored here.
    pub fn current_mut(&mut self) -> &mut [f64] {
        self.get_mut(Role::Current)
    }

    /// Split the storage into its three roles.
    pub fn views(&mut self) -> StencilViews<'_> {
        let [s0, s1, s2] = &mut self.buffers;
        let mut by_slot = [Some(s0), Some(s1), Some(s2)];
        let previous = by_slot[self.roles.slot(Role::Previous)].take();
        let current = by_slot[self.roles.slot(Role::Current)].take();
        let next = by_slot[self.roles.slot(Role::Next)].take();
        match (previous, current, next) {
            (Some(previous), Some(current), Some(next)) => StencilViews {
                previous,
                current,
                next,
            },
            _ => unreachable!("role map is always a permutation"),
        }
    }

    /// End-of-timestep role rotation.
    pub fn rotate(&mut self) {
        self.roles.rotate();
    }

    /// Give up the field, keeping only the buffer playing `role`.
    pub fn into_role(self, role: Role) -> Vec<f64> {
        let slot = self.roles.slot(role);
        let [s0, s1, s2] = self.buffers;
        match slot {
            0 => s0,
            1 => s1,
            _ => s2,
        }
    }
}
