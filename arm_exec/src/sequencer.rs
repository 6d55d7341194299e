//! # Pick-and-place sequencer
//!
//! A pick-and-place move is a fixed plan of nine [`Step`]s. Each step mutates the arm state, sends
//! exactly one frame and then waits for the step's settle time. The order is what keeps the arm
//! safe:
//!
//! | # | Mutation                         | Settle |
//! |---|----------------------------------|--------|
//! | 1 | lift up, magnet off              | 0.5 s  |
//! | 2 | shoulder/elbow to pick           | 1.5 s  |
//! | 3 | lift to pick height              | 1.0 s  |
//! | 4 | magnet on                        | 0.5 s  |
//! | 5 | lift up                          | 1.0 s  |
//! | 6 | shoulder/elbow to place          | 1.5 s  |
//! | 7 | lift to place height             | 1.0 s  |
//! | 8 | magnet off                       | 0.5 s  |
//! | 9 | lift up                          | 0.5 s  |
//!
//! The shoulder and elbow only ever move while the lift is up, and [`run_plan`] refuses any plan
//! which would do otherwise.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, warn};
use serde::Serialize;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use crate::{
    arm_ctrl::ArmCtrl,
    clock::Clock,
    link::{Connector, SendOutcome},
    routine::Waypoint,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of steps in a pick-and-place plan.
pub const NUM_PICK_PLACE_STEPS: usize = 9;

/// Settle time after raising the lift and releasing the magnet.
pub const SAFE_STEP_SETTLE: Duration = Duration::from_millis(500);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// One step of a motion plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub mutation: Mutation,

    /// Minimum time to wait after the frame is sent.
    pub settle: Duration,
}

/// Cancellation flag polled between steps.
///
/// Clones share the same flag, so one clone can be handed to a signal handler.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

/// Summary of a completed plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SequenceReport {
    /// Number of steps run
    pub steps: usize,

    /// Number of frames which were lost on the link
    pub dropped_frames: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The change a step makes to the arm state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Lift up and magnet off.
    RaiseAndRelease,

    /// Move shoulder and elbow, only allowed with the lift up.
    Traverse { shoulder_deg: i32, elbow_deg: i32 },

    /// Move the lift to the given position.
    Lift { lift_deg: i32 },

    /// Lift up, leaving the magnet as it is.
    Raise,

    /// Switch the magnet.
    Magnet { on: bool },
}

/// Errors which stop a plan part way through.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    #[error("Cancelled after {completed} of {total} steps")]
    Cancelled { completed: usize, total: usize },

    #[error(
        "Step {step} would traverse with the lift at {lift_deg} deg (safe is {lift_up_deg} deg)"
    )]
    UnsafeTraverse {
        step: usize,
        lift_deg: i32,
        lift_up_deg: i32,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Step {
    pub const fn new(mutation: Mutation, settle: Duration) -> Self {
        Self { mutation, settle }
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build the nine step plan moving one object from `pick` to `place`.
pub fn pick_and_place_plan(pick: &Waypoint, place: &Waypoint) -> [Step; NUM_PICK_PLACE_STEPS] {
    use Mutation::*;

    let ms = Duration::from_millis;

    [
        Step::new(RaiseAndRelease, SAFE_STEP_SETTLE),
        Step::new(
            Traverse {
                shoulder_deg: pick.shoulder_deg,
                elbow_deg: pick.elbow_deg,
            },
            ms(1500),
        ),
        Step::new(Lift { lift_deg: pick.lift_deg }, ms(1000)),
        Step::new(Magnet { on: true }, ms(500)),
        Step::new(Raise, ms(1000)),
        Step::new(
            Traverse {
                shoulder_deg: place.shoulder_deg,
                elbow_deg: place.elbow_deg,
            },
            ms(1500),
        ),
        Step::new(Lift { lift_deg: place.lift_deg }, ms(1000)),
        Step::new(Magnet { on: false }, ms(500)),
        Step::new(Raise, ms(500)),
    ]
}

/// Move one object from `pick` to `place`.
pub fn move_one<C: Connector, K: Clock>(
    ctrl: &mut ArmCtrl<C, K>,
    pick: &Waypoint,
    place: &Waypoint,
    cancel: &CancelToken,
) -> Result<SequenceReport, SequenceError> {
    info!("Pick-and-place {:?} -> {:?}", pick, place);
    let report = run_plan(ctrl, &pick_and_place_plan(pick, place), cancel)?;
    info!("Pick-and-place complete");
    Ok(report)
}

/// Run a plan step by step.
///
/// The cancel token is checked before every step. If it is set before the first step nothing is
/// sent. If it is set later the arm is raised and released before returning, so a cancelled plan
/// never leaves the lift down or the magnet on.
pub fn run_plan<C: Connector, K: Clock>(
    ctrl: &mut ArmCtrl<C, K>,
    plan: &[Step],
    cancel: &CancelToken,
) -> Result<SequenceReport, SequenceError> {
    let mut report = SequenceReport::default();

    for (i, step) in plan.iter().enumerate() {
        if cancel.is_cancelled() {
            warn!("Plan cancelled before step {} of {}", i + 1, plan.len());
            if i > 0 {
                run_step(ctrl, &Step::new(Mutation::RaiseAndRelease, SAFE_STEP_SETTLE));
            }
            return Err(SequenceError::Cancelled {
                completed: i,
                total: plan.len(),
            });
        }

        if let Mutation::Traverse { .. } = step.mutation {
            let lift_deg = ctrl.state().lift_deg;
            let lift_up_deg = ctrl.params().lift_up_deg;
            if lift_deg != lift_up_deg {
                return Err(SequenceError::UnsafeTraverse {
                    step: i + 1,
                    lift_deg,
                    lift_up_deg,
                });
            }
        }

        debug!("Step {}/{}: {:?}", i + 1, plan.len(), step.mutation);
        if !run_step(ctrl, step).delivered() {
            report.dropped_frames += 1;
        }
        report.steps += 1;
    }

    Ok(report)
}

fn run_step<C: Connector, K: Clock>(ctrl: &mut ArmCtrl<C, K>, step: &Step) -> SendOutcome {
    let lift_up_deg = ctrl.params().lift_up_deg;

    let outcome = ctrl.apply(|s| match step.mutation {
        Mutation::RaiseAndRelease => {
            s.lift_deg = lift_up_deg;
            s.magnet_on = false;
        }
        Mutation::Traverse {
            shoulder_deg,
            elbow_deg,
        } => {
            s.shoulder_deg = shoulder_deg;
            s.elbow_deg = elbow_deg;
        }
        Mutation::Lift { lift_deg } => s.lift_deg = lift_deg,
        Mutation::Raise => s.lift_deg = lift_up_deg,
        Mutation::Magnet { on } => s.magnet_on = on,
    });

    ctrl.wait(step.settle);
    outcome
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::arm_ctrl::Params;
    use crate::clock::SimClock;
    use crate::link::sim::{SimConnector, SimEvent, SimLog};
    use arm_if::{eqpt::ArmFrame, tc::JointField};
    use std::{cell::Cell, rc::Rc};

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

    fn pick() -> Waypoint {
        Waypoint {
            shoulder_deg: 30,
            elbow_deg: 60,
            lift_deg: 100,
        }
    }

    fn place() -> Waypoint {
        Waypoint {
            shoulder_deg: 150,
            elbow_deg: 45,
            lift_deg: 110,
        }
    }

    fn frame(s: i32, e: i32, l: i32, m: bool) -> ArmFrame {
        ArmFrame {
            shoulder_deg: s,
            elbow_mirrored_deg: 180 - e,
            lift_deg: l,
            magnet_on: m,
        }
    }

    #[test]
    fn test_pick_and_place_frames_and_waits() {
        let (mut ctrl, log) = sim_ctrl();

        let report = move_one(&mut ctrl, &pick(), &place(), &CancelToken::new()).unwrap();
        assert_eq!(
            report,
            SequenceReport {
                steps: 9,
                dropped_frames: 0
            }
        );

        assert_eq!(
            log.frames(),
            vec![
                frame(90, 90, 180, false),
                frame(30, 60, 180, false),
                frame(30, 60, 100, false),
                frame(30, 60, 100, true),
                frame(30, 60, 180, true),
                frame(150, 45, 180, true),
                frame(150, 45, 110, true),
                frame(150, 45, 110, false),
                frame(150, 45, 180, false),
            ]
        );

        let ms = Duration::from_millis;
        assert_eq!(
            log.waits(),
            vec![
                ms(500),
                ms(1500),
                ms(1000),
                ms(500),
                ms(1000),
                ms(1500),
                ms(1000),
                ms(500),
                ms(500)
            ]
        );

        // Every frame is followed by its wait
        let events = log.events();
        for pair in events.chunks(2) {
            assert!(matches!(pair[0], SimEvent::Frame(_)));
            assert!(matches!(pair[1], SimEvent::Wait(_)));
        }
    }

    #[test]
    fn test_first_step_makes_safe_from_any_pose() {
        let (mut ctrl, log) = sim_ctrl();
        ctrl.manual_set(JointField::Lift, 95).unwrap();
        ctrl.manual_set(JointField::Magnet, 1).unwrap();
        ctrl.manual_set(JointField::Shoulder, 270).unwrap();
        log.clear();

        move_one(&mut ctrl, &pick(), &place(), &CancelToken::new()).unwrap();

        assert_eq!(log.frames()[0], frame(270, 90, 180, false));
    }

    #[test]
    fn test_never_traverses_with_lift_down() {
        let (mut ctrl, log) = sim_ctrl();
        ctrl.manual_set(JointField::Lift, 95).unwrap();
        log.clear();

        move_one(&mut ctrl, &pick(), &place(), &CancelToken::new()).unwrap();

        let frames = log.frames();
        for pair in frames.windows(2) {
            let moved = pair[0].shoulder_deg != pair[1].shoulder_deg
                || pair[0].elbow_mirrored_deg != pair[1].elbow_mirrored_deg;
            if moved {
                assert_eq!(pair[0].lift_deg, 180);
                assert_eq!(pair[1].lift_deg, 180);
            }
        }
    }

    #[test]
    fn test_magnet_switches_only_at_waypoint_heights() {
        let (mut ctrl, log) = sim_ctrl();

        move_one(&mut ctrl, &pick(), &place(), &CancelToken::new()).unwrap();

        let frames = log.frames();
        for pair in frames.windows(2) {
            if !pair[0].magnet_on && pair[1].magnet_on {
                assert_eq!(pair[1].lift_deg, pick().lift_deg);
            }
            if pair[0].magnet_on && !pair[1].magnet_on {
                assert_eq!(pair[1].lift_deg, place().lift_deg);
            }
        }
    }

    #[test]
    fn test_unsafe_plan_is_refused() {
        let (mut ctrl, log) = sim_ctrl();

        let plan = [
            Step::new(Mutation::Lift { lift_deg: 90 }, SAFE_STEP_SETTLE),
            Step::new(
                Mutation::Traverse {
                    shoulder_deg: 10,
                    elbow_deg: 10,
                },
                SAFE_STEP_SETTLE,
            ),
        ];

        assert_eq!(
            run_plan(&mut ctrl, &plan, &CancelToken::new()),
            Err(SequenceError::UnsafeTraverse {
                step: 2,
                lift_deg: 90,
                lift_up_deg: 180
            })
        );
        assert_eq!(log.frames().len(), 1);
        assert_eq!(ctrl.state().shoulder_deg, 90);
    }

    #[test]
    fn test_cancel_before_start_sends_nothing() {
        let (mut ctrl, log) = sim_ctrl();
        let cancel = CancelToken::new();
        cancel.cancel();

        assert_eq!(
            move_one(&mut ctrl, &pick(), &place(), &cancel),
            Err(SequenceError::Cancelled {
                completed: 0,
                total: 9
            })
        );
        assert!(log.events().is_empty());
    }

    /// Clock which trips a cancel token once a number of waits have passed.
    #[derive(Clone)]
    struct CancellingClock {
        log: SimLog,
        cancel: CancelToken,
        waits_left: Rc<Cell<usize>>,
    }

    impl Clock for CancellingClock {
        fn sleep(&mut self, duration: Duration) {
            self.log.push(SimEvent::Wait(duration));
            match self.waits_left.get() {
                0 => (),
                1 => {
                    self.cancel.cancel();
                    self.waits_left.set(0);
                }
                n => self.waits_left.set(n - 1),
            }
        }
    }

    #[test]
    fn test_cancel_mid_plan_raises_and_releases() {
        let log = SimLog::new();
        let cancel = CancelToken::new();
        let waits_left = Rc::new(Cell::new(0));
        let clock = CancellingClock {
            log: log.clone(),
            cancel: cancel.clone(),
            waits_left: waits_left.clone(),
        };
        let mut ctrl = ArmCtrl::new(Params::default(), SimConnector::new(log.clone()), clock);
        assert!(ctrl.connect());
        log.clear();

        // Cancel once the magnet has gripped at the pick height
        waits_left.set(4);
        assert_eq!(
            move_one(&mut ctrl, &pick(), &place(), &cancel),
            Err(SequenceError::Cancelled {
                completed: 4,
                total: 9
            })
        );

        assert_eq!(
            log.frames(),
            vec![
                frame(90, 90, 180, false),
                frame(30, 60, 180, false),
                frame(30, 60, 100, false),
                frame(30, 60, 100, true),
                frame(30, 60, 180, false),
            ]
        );
        assert_eq!(log.waits().last(), Some(&SAFE_STEP_SETTLE));
    }

    #[test]
    fn test_dropped_frames_do_not_stop_the_plan() {
        let (mut ctrl, log) = sim_ctrl();
        log.fail_next_writes(2);

        let report = move_one(&mut ctrl, &pick(), &place(), &CancelToken::new()).unwrap();
        assert_eq!(report.steps, 9);
        assert_eq!(report.dropped_frames, 1);
        assert_eq!(ctrl.state().lift_deg, 180);
        assert!(!ctrl.state().magnet_on);
    }
}
