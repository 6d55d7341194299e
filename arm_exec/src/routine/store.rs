//! Routine slot storage

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use arm_if::tc::{SlotRole, SELECT_ALL};
use log::info;
use serde::{Deserialize, Serialize};

use super::RoutineError;
use crate::arm_ctrl::ArmState;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A captured arm pose. The magnet is not part of a waypoint, the sequencer decides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Units: degrees
    pub shoulder_deg: i32,

    /// Units: degrees
    pub elbow_deg: i32,

    /// Units: degrees
    pub lift_deg: i32,
}

/// The pick and place waypoints for moving one object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoutineSlot {
    pub pick: Option<Waypoint>,
    pub place: Option<Waypoint>,
}

/// A fixed, ordered set of routine slots.
///
/// The order the slots are given in is the order `run all` executes them.
#[derive(Debug, Clone)]
pub struct RoutineStore {
    slots: Vec<(String, RoutineSlot)>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl From<&ArmState> for Waypoint {
    fn from(state: &ArmState) -> Self {
        Self {
            shoulder_deg: state.shoulder_deg,
            elbow_deg: state.elbow_deg,
            lift_deg: state.lift_deg,
        }
    }
}

impl RoutineSlot {
    /// Both waypoints, if both have been captured.
    pub fn waypoints(&self) -> Option<(Waypoint, Waypoint)> {
        match (self.pick, self.place) {
            (Some(pick), Some(place)) => Some((pick, place)),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.waypoints().is_some()
    }

    /// Roles which have not been captured yet.
    pub fn missing(&self) -> Vec<SlotRole> {
        let mut missing = Vec::new();
        if self.pick.is_none() {
            missing.push(SlotRole::Pick);
        }
        if self.place.is_none() {
            missing.push(SlotRole::Place);
        }
        missing
    }
}

impl RoutineStore {
    /// Create a store with the given empty slots.
    ///
    /// Identifiers must be unique, non-empty and must not be the reserved `all` selector.
    pub fn new<S: AsRef<str>>(ids: &[S]) -> Result<Self, RoutineError> {
        if ids.is_empty() {
            return Err(RoutineError::NoSlots);
        }

        let mut slots: Vec<(String, RoutineSlot)> = Vec::with_capacity(ids.len());

        for id in ids {
            let id = id.as_ref().trim();

            if id.is_empty() || id == SELECT_ALL || id.contains(char::is_whitespace) {
                return Err(RoutineError::InvalidSlotId(id.to_string()));
            }
            if slots.iter().any(|(s, _)| s == id) {
                return Err(RoutineError::DuplicateSlot(id.to_string()));
            }

            slots.push((id.to_string(), RoutineSlot::default()));
        }

        Ok(Self { slots })
    }

    /// Slot identifiers in execution order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|(id, _)| id.as_str())
    }

    /// All slots in execution order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RoutineSlot)> {
        self.slots.iter().map(|(id, slot)| (id.as_str(), slot))
    }

    pub fn get(&self, id: &str) -> Result<&RoutineSlot, RoutineError> {
        self.slots
            .iter()
            .find(|(s, _)| s == id)
            .map(|(_, slot)| slot)
            .ok_or_else(|| RoutineError::UnknownSlot(id.to_string()))
    }

    /// Capture the shoulder, elbow and lift of `state` into `role` of slot `id`, replacing any
    /// previous waypoint.
    pub fn save_waypoint(
        &mut self,
        id: &str,
        role: SlotRole,
        state: &ArmState,
    ) -> Result<Waypoint, RoutineError> {
        let slot = self
            .slots
            .iter_mut()
            .find(|(s, _)| s == id)
            .map(|(_, slot)| slot)
            .ok_or_else(|| RoutineError::UnknownSlot(id.to_string()))?;

        let waypoint = Waypoint::from(state);
        match role {
            SlotRole::Pick => slot.pick = Some(waypoint),
            SlotRole::Place => slot.place = Some(waypoint),
        }

        info!("Slot {} {} saved: {:?}", id, role, waypoint);
        Ok(waypoint)
    }
}
