//! # Telecommand module
//!
//! Telecommands are the operations a collaborator (the shell, a script, a web front end) may ask
//! of the arm executable. Each telecommand produces exactly one [`TcResponse`].
//!
//! Telecommands can be written either in shell form (`move 10 5`) or as JSON
//! (`{"MoveTo":{"x":10.0,"y":5.0}}`).

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use structopt::{clap::AppSettings, StructOpt};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Routine selector which runs every slot.
pub const SELECT_ALL: &str = "all";

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A telecommand accepted by the arm executable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, StructOpt)]
#[structopt(name = "arm", no_version)]
pub enum Tc {
    /// Move the end effector to a cartesian target using inverse kinematics.
    #[structopt(name = "move", setting = AppSettings::AllowNegativeNumbers)]
    MoveTo {
        /// Target x coordinate in arm length units.
        x: f64,

        /// Target y coordinate in arm length units.
        y: f64,
    },

    /// Set a single joint or actuator directly.
    #[structopt(name = "set", setting = AppSettings::AllowNegativeNumbers)]
    ManualSet {
        /// One of `shoulder`, `elbow`, `lift` or `magnet`.
        field: JointField,

        /// New value, degrees for joints, 0 or 1 for the magnet.
        value: i32,
    },

    /// Resend the current state and report the end effector position.
    #[structopt(name = "status")]
    Status,

    /// Capture the current pose into a routine slot.
    #[structopt(name = "save")]
    SaveWaypoint {
        /// Slot identifier.
        slot: String,

        /// Either `pick` or `place`.
        role: SlotRole,
    },

    /// Run the routine stored in one slot, or in every slot with `all`.
    #[structopt(name = "run")]
    RunRoutine {
        selector: RoutineSelector,
    },

    /// Reopen the link to the arm.
    #[structopt(name = "connect")]
    Connect,

    /// Raise the lift and release the magnet.
    #[structopt(name = "safe")]
    MakeSafe,
}

/// A directly settable joint or actuator of the arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointField {
    Shoulder,
    Elbow,
    Lift,
    Magnet,
}

/// The role a waypoint plays within a routine slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotRole {
    Pick,
    Place,
}

/// Which routine(s) to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutineSelector {
    /// Every slot in the configured order.
    All,

    /// A single slot.
    Slot(String),
}

/// Response to a telecommand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TcResponse {
    /// Joint angles commanded by an inverse kinematics move.
    Joints { shoulder_deg: i32, elbow_deg: i32 },

    /// End effector position computed from the current joint angles.
    Position { x: f64, y: f64 },

    /// Full state of the arm and its link, sent in reply to `status`.
    ArmStatus {
        x: f64,
        y: f64,
        shoulder_deg: i32,
        elbow_deg: i32,
        lift_deg: i32,
        magnet_on: bool,
        connected: bool,
        frames_recovered: u64,
        frames_dropped: u64,
    },

    /// A waypoint was captured.
    WaypointSaved {
        slot: String,
        role: SlotRole,
        shoulder_deg: i32,
        elbow_deg: i32,
        lift_deg: i32,
    },

    /// The requested routines ran to completion.
    RoutineComplete { slots: Vec<String> },

    /// Result of a connection attempt.
    Connection { connected: bool },

    /// The arm was made safe.
    Safe,

    /// The telecommand could not be carried out.
    Error { kind: ErrorKind, msg: String },
}

/// Classification of a failed telecommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Target outside the arm's workspace, nothing moved.
    Unreachable,

    /// A manual value was out of range, nothing moved.
    InvalidValue,

    /// The slot does not exist.
    UnknownSlot,

    /// A slot is missing a waypoint, nothing moved.
    IncompleteSlot,

    /// A routine failed part way through.
    ExecutionError,

    /// The telecommand itself could not be understood.
    InvalidCommand,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("{0}")]
    InvalidCommand(structopt::clap::Error),

    #[error("Unknown joint {0:?}, expected one of shoulder, elbow, lift, magnet")]
    UnknownJoint(String),

    #[error("Unknown slot role {0:?}, expected pick or place")]
    UnknownRole(String),

    #[error("Routine selector cannot be empty")]
    EmptySelector,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Tc {
    /// Parse a single line of input into a telecommand.
    ///
    /// Lines starting with `{` are treated as JSON, anything else as shell words.
    pub fn parse_line(line: &str) -> Result<Self, TcParseError> {
        let line = line.trim();

        if line.starts_with('{') {
            serde_json::from_str(line).map_err(TcParseError::InvalidJson)
        } else {
            Tc::from_iter_safe(std::iter::once("arm").chain(line.split_whitespace()))
                .map_err(TcParseError::InvalidCommand)
        }
    }
}

impl TcResponse {
    /// Build an error response.
    pub fn error<S: ToString>(kind: ErrorKind, msg: S) -> Self {
        TcResponse::Error {
            kind,
            msg: msg.to_string(),
        }
    }

    /// Returns true if this response reports a failure.
    pub fn is_error(&self) -> bool {
        matches!(self, TcResponse::Error { .. })
    }
}

impl FromStr for JointField {
    type Err = TcParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shoulder" => Ok(JointField::Shoulder),
            "elbow" => Ok(JointField::Elbow),
            "lift" => Ok(JointField::Lift),
            "magnet" => Ok(JointField::Magnet),
            _ => Err(TcParseError::UnknownJoint(s.to_string())),
        }
    }
}

impl fmt::Display for JointField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JointField::Shoulder => "shoulder",
            JointField::Elbow => "elbow",
            JointField::Lift => "lift",
            JointField::Magnet => "magnet",
        };
        f.write_str(s)
    }
}

impl FromStr for SlotRole {
    type Err = TcParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pick" => Ok(SlotRole::Pick),
            "place" => Ok(SlotRole::Place),
            _ => Err(TcParseError::UnknownRole(s.to_string())),
        }
    }
}

impl fmt::Display for SlotRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotRole::Pick => f.write_str("pick"),
            SlotRole::Place => f.write_str("place"),
        }
    }
}

impl FromStr for RoutineSelector {
    type Err = TcParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(TcParseError::EmptySelector),
            SELECT_ALL => Ok(RoutineSelector::All),
            slot => Ok(RoutineSelector::Slot(slot.to_string())),
        }
    }
}

impl fmt::Display for RoutineSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutineSelector::All => f.write_str(SELECT_ALL),
            RoutineSelector::Slot(s) => f.write_str(s),
        }
    }
}
