//! Implementations for the ArmCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use arm_if::{eqpt::ArmFrame, tc::JointField};
use log::{debug, info};
use serde::Serialize;
use std::time::Duration;

// Internal
use super::{
    calc_forward_kinematics, calc_inverse_kinematics, ArmCtrlError, EndEffectorPos, JointAngles,
    Params, ELBOW_MIRROR_DEG, MANUAL_JOINT_RANGE_DEG,
};
use crate::{
    clock::Clock,
    link::{Connector, SendOutcome, Transport},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The live joint configuration of the arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArmState {
    /// Units: degrees
    pub shoulder_deg: i32,

    /// Elbow angle in the kinematic sense (before mirroring).
    ///
    /// Units: degrees
    pub elbow_deg: i32,

    /// Units: degrees
    pub lift_deg: i32,

    pub magnet_on: bool,
}

/// Tally of what happened to every frame sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkReport {
    pub delivered: u64,
    pub recovered: u64,
    pub dropped: u64,
}

/// Arm control module state.
///
/// Sole owner of the arm state and the link to the board. Every mutation of the
/// state is followed by exactly one frame carrying the whole state.
pub struct ArmCtrl<C: Connector, K: Clock> {
    params: Params,

    state: ArmState,

    transport: Transport<C, K>,

    clock: K,

    report: LinkReport,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ArmState {
    /// The start up state: home shoulder and elbow, lift raised, magnet off.
    pub fn home(params: &Params) -> Self {
        Self {
            shoulder_deg: params.home_shoulder_deg,
            elbow_deg: params.home_elbow_deg,
            lift_deg: params.lift_up_deg,
            magnet_on: false,
        }
    }
}

impl From<&ArmState> for ArmFrame {
    fn from(state: &ArmState) -> Self {
        ArmFrame {
            shoulder_deg: state.shoulder_deg,
            elbow_mirrored_deg: ELBOW_MIRROR_DEG.saturating_sub(state.elbow_deg),
            lift_deg: state.lift_deg,
            magnet_on: state.magnet_on,
        }
    }
}

impl LinkReport {
    fn record(&mut self, outcome: SendOutcome) {
        match outcome {
            SendOutcome::Delivered => self.delivered += 1,
            SendOutcome::DeliveredAfterReconnect => self.recovered += 1,
            SendOutcome::Dropped => self.dropped += 1,
        }
    }
}

impl<C: Connector, K: Clock + Clone> ArmCtrl<C, K> {
    /// Create the controller in the home state. The link is not opened.
    pub fn new(params: Params, connector: C, clock: K) -> Self {
        Self {
            state: ArmState::home(&params),
            params,
            transport: Transport::new(connector, clock.clone()),
            clock,
            report: LinkReport::default(),
        }
    }
}

impl<C: Connector, K: Clock> ArmCtrl<C, K> {
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Copy of the current state.
    pub fn state(&self) -> ArmState {
        self.state
    }

    pub fn link_report(&self) -> LinkReport {
        self.report
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// (Re)open the link to the board.
    pub fn connect(&mut self) -> bool {
        self.transport.connect()
    }

    /// Mutate the state and send it.
    pub fn apply<F>(&mut self, mutation: F) -> SendOutcome
    where
        F: FnOnce(&mut ArmState),
    {
        mutation(&mut self.state);
        self.send_state()
    }

    /// Send the current state without changing it.
    pub fn send_state(&mut self) -> SendOutcome {
        let frame = ArmFrame::from(&self.state);
        let outcome = self.transport.send(frame.to_line().as_bytes());
        self.report.record(outcome);
        outcome
    }

    /// Block for the given duration on the controller's clock.
    pub fn wait(&mut self, duration: Duration) {
        self.clock.sleep(duration)
    }

    /// Current end effector position from forward kinematics.
    pub fn position(&self) -> EndEffectorPos {
        calc_forward_kinematics(&self.params, self.state.shoulder_deg, self.state.elbow_deg)
    }

    /// Solve for the target and move the shoulder and elbow there.
    ///
    /// Unreachable targets leave the state untouched and send nothing.
    pub fn move_to_coordinate(&mut self, x: f64, y: f64) -> Result<JointAngles, ArmCtrlError> {
        let angles = calc_inverse_kinematics(&self.params, x, y)?;

        debug!("Moving to ({}, {}) with {:?}", x, y, angles);
        self.apply(|s| {
            s.shoulder_deg = angles.shoulder_deg;
            s.elbow_deg = angles.elbow_deg;
        });

        Ok(angles)
    }

    /// Set one field directly, send, and report where the end effector now is.
    ///
    /// The magnet only accepts 0 (off) or 1 (on), the joints accept
    /// [`MANUAL_JOINT_RANGE_DEG`].
    pub fn manual_set(
        &mut self,
        field: JointField,
        value: i32,
    ) -> Result<EndEffectorPos, ArmCtrlError> {
        let magnet_on = match (field, value) {
            (JointField::Magnet, 0) => false,
            (JointField::Magnet, 1) => true,
            (JointField::Magnet, _) => return Err(ArmCtrlError::InvalidValue { field, value }),
            _ if !MANUAL_JOINT_RANGE_DEG.contains(&value) => {
                return Err(ArmCtrlError::InvalidValue { field, value })
            }
            _ => self.state.magnet_on,
        };

        self.apply(|s| match field {
            JointField::Shoulder => s.shoulder_deg = value,
            JointField::Elbow => s.elbow_deg = value,
            JointField::Lift => s.lift_deg = value,
            JointField::Magnet => s.magnet_on = magnet_on,
        });

        Ok(self.position())
    }

    /// Resend the current state and report the end effector position.
    pub fn status(&mut self) -> EndEffectorPos {
        self.send_state();
        self.position()
    }

    /// Raise the lift and release the magnet.
    pub fn make_safe(&mut self) -> SendOutcome {
        info!("Making arm safe");
        let lift_up_deg = self.params.lift_up_deg;
        self.apply(|s| {
            s.lift_deg = lift_up_deg;
            s.magnet_on = false;
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::clock::SimClock;
    use crate::link::sim::{SimConnector, SimLog};

    fn sim_ctrl() -> (ArmCtrl<SimConnector, SimClock>, SimLog) {
        let log = SimLog::new();
        let mut ctrl = ArmCtrl::new(
            Params::default(),
            SimConnector::new(log.clone()),
            SimClock::new(log.clone()),
        );
        assert!(ctrl.connect());
        log.clear();
        (ctrl, log)
    }

    fn frame(s: i32, e: i32, l: i32, m: bool) -> ArmFrame {
        ArmFrame {
            shoulder_deg: s,
            elbow_mirrored_deg: e,
            lift_deg: l,
            magnet_on: m,
        }
    }

    #[test]
    fn test_home_state() {
        let (ctrl, log) = sim_ctrl();

        assert_eq!(
            ctrl.state(),
            ArmState {
                shoulder_deg: 90,
                elbow_deg: 90,
                lift_deg: 180,
                magnet_on: false
            }
        );
        assert!(log.frames().is_empty());
    }

    #[test]
    fn test_frame_encoding_mirrors_elbow() {
        let state = ArmState {
            shoulder_deg: 345,
            elbow_deg: 91,
            lift_deg: 120,
            magnet_on: true,
        };
        assert_eq!(ArmFrame::from(&state).to_line(), "345,89,120,1\n");
    }

    #[test]
    fn test_move_to_coordinate() {
        let (mut ctrl, log) = sim_ctrl();

        let angles = ctrl.move_to_coordinate(10.0, 5.0).unwrap();
        assert_eq!(
            angles,
            JointAngles {
                shoulder_deg: 345,
                elbow_deg: 91
            }
        );
        assert_eq!(log.frames(), vec![frame(345, 89, 180, false)]);
    }

    #[test]
    fn test_unreachable_move_has_no_effect() {
        let (mut ctrl, log) = sim_ctrl();
        let before = ctrl.state();

        assert!(matches!(
            ctrl.move_to_coordinate(20.0, 0.0),
            Err(ArmCtrlError::Unreachable { .. })
        ));
        assert_eq!(ctrl.state(), before);
        assert!(log.events().is_empty());
    }

    #[test]
    fn test_manual_set() {
        let (mut ctrl, log) = sim_ctrl();

        assert_eq!(
            ctrl.manual_set(JointField::Shoulder, 0).unwrap(),
            EndEffectorPos { x: 8.5, y: 7.5 }
        );
        assert_eq!(
            ctrl.manual_set(JointField::Elbow, 0).unwrap(),
            EndEffectorPos { x: 16.0, y: 0.0 }
        );
        ctrl.manual_set(JointField::Lift, 95).unwrap();
        ctrl.manual_set(JointField::Magnet, 1).unwrap();

        assert_eq!(
            log.frames(),
            vec![
                frame(0, 90, 180, false),
                frame(0, 180, 180, false),
                frame(0, 180, 95, false),
                frame(0, 180, 95, true),
            ]
        );
    }

    #[test]
    fn test_manual_set_invalid_magnet() {
        let (mut ctrl, log) = sim_ctrl();

        assert_eq!(
            ctrl.manual_set(JointField::Magnet, 2),
            Err(ArmCtrlError::InvalidValue {
                field: JointField::Magnet,
                value: 2
            })
        );
        assert!(!ctrl.state().magnet_on);
        assert!(log.events().is_empty());
    }

    #[test]
    fn test_manual_set_joint_out_of_range() {
        let (mut ctrl, log) = sim_ctrl();

        for (field, value) in [
            (JointField::Elbow, i32::MIN),
            (JointField::Elbow, 721),
            (JointField::Shoulder, -361),
            (JointField::Lift, i32::MAX),
        ]
        .iter()
        {
            assert_eq!(
                ctrl.manual_set(*field, *value),
                Err(ArmCtrlError::InvalidValue {
                    field: *field,
                    value: *value
                })
            );
        }
        assert_eq!(ctrl.state(), ArmState::home(ctrl.params()));
        assert!(log.events().is_empty());

        // Range limits themselves are accepted
        ctrl.manual_set(JointField::Elbow, -360).unwrap();
        ctrl.manual_set(JointField::Shoulder, 720).unwrap();
        assert_eq!(
            log.frames(),
            vec![frame(90, 540, 180, false), frame(720, 540, 180, false)]
        );
    }

    #[test]
    fn test_frame_encoding_never_overflows() {
        let state = ArmState {
            shoulder_deg: 0,
            elbow_deg: i32::MIN,
            lift_deg: 0,
            magnet_on: false,
        };
        assert_eq!(ArmFrame::from(&state).elbow_mirrored_deg, i32::MAX);
    }

    #[test]
    fn test_status_resends_state() {
        let (mut ctrl, log) = sim_ctrl();

        assert_eq!(ctrl.status(), EndEffectorPos { x: -7.5, y: 8.5 });
        assert_eq!(log.frames(), vec![frame(90, 90, 180, false)]);
    }

    #[test]
    fn test_make_safe() {
        let (mut ctrl, log) = sim_ctrl();
        ctrl.manual_set(JointField::Lift, 100).unwrap();
        ctrl.manual_set(JointField::Magnet, 1).unwrap();
        log.clear();

        assert_eq!(ctrl.make_safe(), SendOutcome::Delivered);
        assert_eq!(log.frames(), vec![frame(90, 90, 180, false)]);
    }

    #[test]
    fn test_link_report() {
        let (mut ctrl, log) = sim_ctrl();

        ctrl.send_state();
        log.fail_next_writes(1);
        ctrl.send_state();
        log.fail_next_writes(1);
        log.fail_next_opens(1);
        ctrl.send_state();

        assert_eq!(
            ctrl.link_report(),
            LinkReport {
                delivered: 1,
                recovered: 1,
                dropped: 1
            }
        );

        // A dropped frame doesn't stop the state from being applied
        ctrl.manual_set(JointField::Lift, 90).unwrap();
        assert_eq!(ctrl.state().lift_deg, 90);
    }
}
