//! # Data Store
//!
//! Owns everything a telecommand can touch: the arm controller, the routine memory and the
//! cancel flag shared with the signal handler.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use arm_if::tc::{JointField, RoutineSelector, SlotRole};
use log::info;

use crate::{
    arm_ctrl::{ArmCtrl, ArmCtrlError, EndEffectorPos, JointAngles},
    clock::Clock,
    link::{Connector, SendOutcome},
    params::ArmExecParams,
    routine::{self, BatchPolicy, BatchReport, RoutineError, RoutineStore, Waypoint},
    sequencer::CancelToken,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Global data store for the executable.
pub struct DataStore<C: Connector, K: Clock> {
    pub arm_ctrl: ArmCtrl<C, K>,

    pub routines: RoutineStore,

    pub batch_policy: BatchPolicy,

    cancel: CancelToken,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<C: Connector, K: Clock + Clone> DataStore<C, K> {
    /// Build the store from the executable parameters. The link is not opened.
    pub fn new(params: &ArmExecParams, connector: C, clock: K) -> Result<Self, RoutineError> {
        Ok(Self {
            arm_ctrl: ArmCtrl::new(params.arm.clone(), connector, clock),
            routines: RoutineStore::new(params.routine.slots.as_slice())?,
            batch_policy: params.routine.batch_policy,
            cancel: CancelToken::new(),
        })
    }
}

impl<C: Connector, K: Clock> DataStore<C, K> {
    /// A handle on the cancel flag, for the signal handler.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn connect(&mut self) -> bool {
        self.arm_ctrl.connect()
    }

    pub fn move_to_coordinate(&mut self, x: f64, y: f64) -> Result<JointAngles, ArmCtrlError> {
        self.arm_ctrl.move_to_coordinate(x, y)
    }

    pub fn manual_set(
        &mut self,
        field: JointField,
        value: i32,
    ) -> Result<EndEffectorPos, ArmCtrlError> {
        self.arm_ctrl.manual_set(field, value)
    }

    pub fn status(&mut self) -> EndEffectorPos {
        self.arm_ctrl.status()
    }

    pub fn make_safe(&mut self) -> SendOutcome {
        self.arm_ctrl.make_safe()
    }

    /// Capture the arm's current pose into a slot.
    pub fn save_waypoint(&mut self, slot: &str, role: SlotRole) -> Result<Waypoint, RoutineError> {
        let state = self.arm_ctrl.state();
        self.routines.save_waypoint(slot, role, &state)
    }

    /// Run one or all routines.
    ///
    /// Any cancel request left over from before the run is cleared first.
    pub fn run_routine(&mut self, selector: &RoutineSelector) -> Result<BatchReport, RoutineError> {
        self.cancel.reset();

        let report = routine::execute(
            selector,
            &self.routines,
            self.batch_policy,
            &mut self.arm_ctrl,
            &self.cancel,
        )?;

        info!("Batch complete: {:?}", report);
        Ok(report)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::clock::SimClock;
    use crate::link::sim::{SimConnector, SimLog};

    fn sim_ds(params: &ArmExecParams) -> (DataStore<SimConnector, SimClock>, SimLog) {
        let log = SimLog::new();
        let mut ds = DataStore::new(
            params,
            SimConnector::new(log.clone()),
            SimClock::new(log.clone()),
        )
        .unwrap();
        assert!(ds.connect());
        log.clear();
        (ds, log)
    }

    #[test]
    fn test_new_rejects_bad_slots() {
        let mut params = ArmExecParams::default();
        params.routine.slots = vec!["1".into(), "all".into()];

        let log = SimLog::new();
        let ds = DataStore::new(
            &params,
            SimConnector::new(log.clone()),
            SimClock::new(log.clone()),
        );
        assert!(matches!(ds, Err(RoutineError::InvalidSlotId(_))));
    }

    #[test]
    fn test_save_captures_current_pose() {
        let (mut ds, _log) = sim_ds(&ArmExecParams::default());

        ds.manual_set(JointField::Lift, 100).unwrap();
        ds.manual_set(JointField::Magnet, 1).unwrap();
        ds.move_to_coordinate(10.0, 5.0).unwrap();

        let wp = ds.save_waypoint("1", SlotRole::Pick).unwrap();
        assert_eq!(
            wp,
            Waypoint {
                shoulder_deg: 345,
                elbow_deg: 91,
                lift_deg: 100
            }
        );
        assert_eq!(ds.routines.get("1").unwrap().pick, Some(wp));
    }

    #[test]
    fn test_record_then_run() {
        let (mut ds, log) = sim_ds(&ArmExecParams::default());

        ds.move_to_coordinate(10.0, 5.0).unwrap();
        ds.manual_set(JointField::Lift, 100).unwrap();
        ds.save_waypoint("2", SlotRole::Pick).unwrap();

        ds.move_to_coordinate(0.0, 12.0).unwrap();
        ds.manual_set(JointField::Lift, 110).unwrap();
        ds.save_waypoint("2", SlotRole::Place).unwrap();
        log.clear();

        let report = ds
            .run_routine(&RoutineSelector::Slot("2".into()))
            .unwrap();
        assert_eq!(report.slots, vec!["2"]);

        let frames = log.frames();
        assert_eq!(frames.len(), 9);
        assert_eq!(frames[1].shoulder_deg, 345);
        assert_eq!(frames[2].lift_deg, 100);
        assert_eq!(frames[5].shoulder_deg, 51);
        assert_eq!(frames[6].lift_deg, 110);
        assert_eq!(ds.arm_ctrl.state().lift_deg, 180);
    }

    #[test]
    fn test_stale_cancel_is_cleared() {
        let (mut ds, log) = sim_ds(&ArmExecParams::default());
        ds.save_waypoint("1", SlotRole::Pick).unwrap();
        ds.save_waypoint("1", SlotRole::Place).unwrap();

        ds.cancel_token().cancel();
        assert!(ds.run_routine(&RoutineSelector::Slot("1".into())).is_ok());
        assert_eq!(log.frames().len(), 9);
    }
}
