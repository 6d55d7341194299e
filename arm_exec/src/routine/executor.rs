//! Batch executor: validates slots and runs the sequencer over them

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use arm_if::tc::RoutineSelector;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{RoutineError, RoutineStore, Waypoint};
use crate::{
    arm_ctrl::ArmCtrl,
    clock::Clock,
    link::Connector,
    sequencer::{move_one, CancelToken},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Pause between consecutive routines of a batch.
pub const INTER_ROUTINE_PAUSE: Duration = Duration::from_secs(1);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Result of a successful batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Slots run, in the order they ran
    pub slots: Vec<String>,

    /// Frames lost on the link across the whole batch
    pub dropped_frames: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// How `all` treats incomplete slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// Refuse to start unless every slot is complete.
    RequireAll,

    /// Run the complete slots and skip the others. Fails only if no slot is complete.
    SkipIncomplete,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        BatchPolicy::RequireAll
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Run the routines picked by `selector`.
///
/// Every selected slot is validated before the first frame is sent, so an incomplete or unknown
/// slot never results in motion. Routines run in store order with [`INTER_ROUTINE_PAUSE`] between
/// them. A failing routine stops the batch.
pub fn execute<C: Connector, K: Clock>(
    selector: &RoutineSelector,
    store: &RoutineStore,
    policy: BatchPolicy,
    ctrl: &mut ArmCtrl<C, K>,
    cancel: &CancelToken,
) -> Result<BatchReport, RoutineError> {
    let batch = plan_batch(selector, store, policy)?;

    info!(
        "Running {} routine(s): {:?}",
        batch.len(),
        batch.iter().map(|(id, _, _)| id.as_str()).collect::<Vec<_>>()
    );

    let mut report = BatchReport::default();

    for (i, (id, pick, place)) in batch.into_iter().enumerate() {
        if i > 0 {
            ctrl.wait(INTER_ROUTINE_PAUSE);
        }

        let seq_report = move_one(ctrl, &pick, &place, cancel).map_err(|e| {
            RoutineError::Execution {
                slot: id.clone(),
                source: e,
            }
        })?;

        report.dropped_frames += seq_report.dropped_frames;
        report.slots.push(id);
    }

    Ok(report)
}

/// Resolve the selector into the ordered list of routines to run.
pub fn plan_batch(
    selector: &RoutineSelector,
    store: &RoutineStore,
    policy: BatchPolicy,
) -> Result<Vec<(String, Waypoint, Waypoint)>, RoutineError> {
    match selector {
        RoutineSelector::Slot(id) => {
            let slot = store.get(id)?;
            match slot.waypoints() {
                Some((pick, place)) => Ok(vec![(id.clone(), pick, place)]),
                None => Err(RoutineError::IncompleteSlot {
                    slot: id.clone(),
                    missing: slot.missing(),
                }),
            }
        }
        RoutineSelector::All => {
            let mut batch = Vec::new();
            let mut first_incomplete = None;

            for (id, slot) in store.iter() {
                match slot.waypoints() {
                    Some((pick, place)) => batch.push((id.to_string(), pick, place)),
                    None => {
                        if policy == BatchPolicy::SkipIncomplete {
                            warn!("Skipping slot {}, missing {:?}", id, slot.missing());
                        }
                        if first_incomplete.is_none() {
                            first_incomplete = Some(RoutineError::IncompleteSlot {
                                slot: id.to_string(),
                                missing: slot.missing(),
                            });
                        }
                    }
                }
            }

            match (policy, first_incomplete) {
                (BatchPolicy::RequireAll, Some(e)) => Err(e),
                (BatchPolicy::SkipIncomplete, Some(e)) if batch.is_empty() => Err(e),
                _ => Ok(batch),
            }
        }
    }
}
