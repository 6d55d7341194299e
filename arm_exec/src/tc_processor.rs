//! # Telecommand processor module
//!
//! The telecommand processor handles TCs coming from any source and turns the result into a
//! [`TcResponse`]. Nothing here fails: every error becomes a `TcResponse::Error`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use arm_if::tc::{ErrorKind, Tc, TcResponse};
use log::{debug, warn};

// Internal
use crate::{
    arm_ctrl::ArmCtrlError, clock::Clock, data_store::DataStore, link::Connector,
    routine::RoutineError,
};

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Execute a telecommand.
pub fn exec<C: Connector, K: Clock>(ds: &mut DataStore<C, K>, tc: &Tc) -> TcResponse {
    debug!("Recieved {:?}", tc);

    let rsp = match tc {
        Tc::MoveTo { x, y } => match ds.move_to_coordinate(*x, *y) {
            Ok(angles) => TcResponse::Joints {
                shoulder_deg: angles.shoulder_deg,
                elbow_deg: angles.elbow_deg,
            },
            Err(e) => arm_ctrl_error(e),
        },
        Tc::ManualSet { field, value } => match ds.manual_set(*field, *value) {
            Ok(pos) => TcResponse::Position { x: pos.x, y: pos.y },
            Err(e) => arm_ctrl_error(e),
        },
        Tc::Status => {
            let pos = ds.status();
            let state = ds.arm_ctrl.state();
            let link = ds.arm_ctrl.link_report();
            TcResponse::ArmStatus {
                x: pos.x,
                y: pos.y,
                shoulder_deg: state.shoulder_deg,
                elbow_deg: state.elbow_deg,
                lift_deg: state.lift_deg,
                magnet_on: state.magnet_on,
                connected: ds.arm_ctrl.is_connected(),
                frames_recovered: link.recovered,
                frames_dropped: link.dropped,
            }
        }
        Tc::SaveWaypoint { slot, role } => match ds.save_waypoint(slot, *role) {
            Ok(wp) => TcResponse::WaypointSaved {
                slot: slot.clone(),
                role: *role,
                shoulder_deg: wp.shoulder_deg,
                elbow_deg: wp.elbow_deg,
                lift_deg: wp.lift_deg,
            },
            Err(e) => routine_error(e),
        },
        Tc::RunRoutine { selector } => match ds.run_routine(selector) {
            Ok(report) => TcResponse::RoutineComplete {
                slots: report.slots,
            },
            Err(e) => routine_error(e),
        },
        Tc::Connect => TcResponse::Connection {
            connected: ds.connect(),
        },
        Tc::MakeSafe => {
            ds.make_safe();
            TcResponse::Safe
        }
    };

    if let TcResponse::Error { kind, msg } = &rsp {
        warn!("{:?} failed ({:?}): {}", tc, kind, msg);
    }

    rsp
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn arm_ctrl_error(e: ArmCtrlError) -> TcResponse {
    let kind = match e {
        ArmCtrlError::Unreachable { .. } => ErrorKind::Unreachable,
        ArmCtrlError::InvalidValue { .. } => ErrorKind::InvalidValue,
    };
    TcResponse::error(kind, e)
}

fn routine_error(e: RoutineError) -> TcResponse {
    let kind = match e {
        RoutineError::UnknownSlot(_) => ErrorKind::UnknownSlot,
        RoutineError::IncompleteSlot { .. } => ErrorKind::IncompleteSlot,
        RoutineError::Execution { .. } => ErrorKind::ExecutionError,
        RoutineError::DuplicateSlot(_) | RoutineError::InvalidSlotId(_) | RoutineError::NoSlots => {
            ErrorKind::InvalidCommand
        }
    };
    TcResponse::error(kind, e)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::clock::SimClock;
    use crate::link::sim::{SimConnector, SimLog};
    use crate::params::ArmExecParams;
    use arm_if::tc::{JointField, RoutineSelector, SlotRole};

    fn sim_ds() -> (DataStore<SimConnector, SimClock>, SimLog) {
        let log = SimLog::new();
        let mut ds = DataStore::new(
            &ArmExecParams::default(),
            SimConnector::new(log.clone()),
            SimClock::new(log.clone()),
        )
        .unwrap();
        assert!(ds.connect());
        log.clear();
        (ds, log)
    }

    fn exec_line(ds: &mut DataStore<SimConnector, SimClock>, line: &str) -> TcResponse {
        exec(ds, &Tc::parse_line(line).unwrap())
    }

    fn kind(rsp: &TcResponse) -> Option<ErrorKind> {
        match rsp {
            TcResponse::Error { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    #[test]
    fn test_move() {
        let (mut ds, log) = sim_ds();

        assert_eq!(
            exec_line(&mut ds, "move 10 5"),
            TcResponse::Joints {
                shoulder_deg: 345,
                elbow_deg: 91
            }
        );
        assert_eq!(log.frames().len(), 1);

        let rsp = exec_line(&mut ds, "move 20 0");
        assert_eq!(kind(&rsp), Some(ErrorKind::Unreachable));
        assert_eq!(log.frames().len(), 1);
    }

    #[test]
    fn test_manual_set_and_status() {
        let (mut ds, log) = sim_ds();

        assert_eq!(
            exec(
                &mut ds,
                &Tc::ManualSet {
                    field: JointField::Shoulder,
                    value: 0
                }
            ),
            TcResponse::Position { x: 8.5, y: 7.5 }
        );

        let rsp = exec_line(&mut ds, "set magnet 2");
        assert_eq!(kind(&rsp), Some(ErrorKind::InvalidValue));

        assert_eq!(
            exec_line(&mut ds, "status"),
            TcResponse::ArmStatus {
                x: 8.5,
                y: 7.5,
                shoulder_deg: 0,
                elbow_deg: 90,
                lift_deg: 180,
                magnet_on: false,
                connected: true,
                frames_recovered: 0,
                frames_dropped: 0,
            }
        );
        assert_eq!(log.frames().len(), 2);
    }

    #[test]
    fn test_extreme_joint_value_is_refused() {
        let (mut ds, log) = sim_ds();

        let rsp = exec_line(&mut ds, "set elbow -2147483648");
        assert_eq!(kind(&rsp), Some(ErrorKind::InvalidValue));
        assert!(log.frames().is_empty());

        // Nothing out of range can reach a saved waypoint either
        exec_line(&mut ds, "save 1 pick");
        assert_eq!(
            ds.routines.get("1").unwrap().pick.map(|w| w.elbow_deg),
            Some(90)
        );
    }

    #[test]
    fn test_routine_errors() {
        let (mut ds, log) = sim_ds();

        let rsp = exec_line(&mut ds, "save 7 pick");
        assert_eq!(kind(&rsp), Some(ErrorKind::UnknownSlot));

        exec_line(&mut ds, "save 2 pick");
        let rsp = exec_line(&mut ds, "run 2");
        assert_eq!(kind(&rsp), Some(ErrorKind::IncompleteSlot));

        let rsp = exec_line(&mut ds, "run all");
        assert_eq!(kind(&rsp), Some(ErrorKind::IncompleteSlot));

        let rsp = exec_line(&mut ds, "run 9");
        assert_eq!(kind(&rsp), Some(ErrorKind::UnknownSlot));

        assert!(log.frames().is_empty());
    }

    #[test]
    fn test_save_and_run_all() {
        let (mut ds, log) = sim_ds();

        for slot in &["1", "2", "3"] {
            exec_line(&mut ds, "move 10 5");
            exec_line(&mut ds, "set lift 100");
            assert_eq!(
                exec(
                    &mut ds,
                    &Tc::SaveWaypoint {
                        slot: slot.to_string(),
                        role: SlotRole::Pick
                    }
                ),
                TcResponse::WaypointSaved {
                    slot: slot.to_string(),
                    role: SlotRole::Pick,
                    shoulder_deg: 345,
                    elbow_deg: 91,
                    lift_deg: 100
                }
            );
            exec_line(&mut ds, "set lift 180");
            exec_line(&mut ds, "move 0 12");
            exec_line(&mut ds, "set lift 110");
            exec_line(&mut ds, &format!("save {} place", slot));
        }
        log.clear();

        assert_eq!(
            exec(
                &mut ds,
                &Tc::RunRoutine {
                    selector: RoutineSelector::All
                }
            ),
            TcResponse::RoutineComplete {
                slots: vec!["1".into(), "2".into(), "3".into()]
            }
        );
        assert_eq!(log.frames().len(), 27);
    }

    #[test]
    fn test_connect_and_safe() {
        let (mut ds, log) = sim_ds();

        log.fail_next_opens(1);
        assert_eq!(
            exec_line(&mut ds, "connect"),
            TcResponse::Connection { connected: false }
        );
        assert_eq!(
            exec_line(&mut ds, "connect"),
            TcResponse::Connection { connected: true }
        );

        exec_line(&mut ds, "set lift 90");
        exec_line(&mut ds, "set magnet 1");
        assert_eq!(exec_line(&mut ds, "safe"), TcResponse::Safe);

        let last = *log.frames().last().unwrap();
        assert_eq!(last.lift_deg, 180);
        assert!(!last.magnet_on);
    }
}
