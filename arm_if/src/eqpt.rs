//! # Equipment Interface
//!
//! The arm controller board accepts one ASCII line per demand:
//!
//! ```text
//! <shoulder>,<elbow_mirrored>,<lift>,<magnet>\n
//! ```
//!
//! All fields are integers and `magnet` is either `0` or `1`. Nothing is read back from the board.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of comma separated fields in a frame.
pub const NUM_FRAME_FIELDS: usize = 4;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single demand frame for the arm controller board.
///
/// The elbow field is already in the board's (mirrored) sense, this struct does no calibration.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmFrame {
    /// Shoulder servo demand
    ///
    /// Units: degrees
    pub shoulder_deg: i32,

    /// Elbow servo demand in the board's sense
    ///
    /// Units: degrees
    pub elbow_mirrored_deg: i32,

    /// Lift servo demand
    ///
    /// Units: degrees
    pub lift_deg: i32,

    /// Electromagnet demand
    pub magnet_on: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors that occur while parsing a frame line.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum FrameParseError {
    #[error("Expected {} fields in the frame, found {0}", NUM_FRAME_FIELDS)]
    WrongFieldCount(usize),

    #[error("Field {index} ({value:?}) is not an integer")]
    InvalidInteger { index: usize, value: String },

    #[error("Magnet field must be 0 or 1, found {0}")]
    InvalidMagnet(i32),
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl ArmFrame {
    /// Encode the frame as the newline terminated line sent to the board.
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for ArmFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.shoulder_deg,
            self.elbow_mirrored_deg,
            self.lift_deg,
            self.magnet_on as u8
        )
    }
}

impl FromStr for ArmFrame {
    type Err = FrameParseError;

    /// Parse a frame line, with or without the trailing newline.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.trim_end_matches(&['\r', '\n'][..]).split(',').collect();

        if fields.len() != NUM_FRAME_FIELDS {
            return Err(FrameParseError::WrongFieldCount(fields.len()));
        }

        let mut values = [0i32; NUM_FRAME_FIELDS];
        for (index, field) in fields.iter().enumerate() {
            values[index] = field
                .trim()
                .parse()
                .map_err(|_| FrameParseError::InvalidInteger {
                    index,
                    value: field.to_string(),
                })?;
        }

        let magnet_on = match values[3] {
            0 => false,
            1 => true,
            v => return Err(FrameParseError::InvalidMagnet(v)),
        };

        Ok(Self {
            shoulder_deg: values[0],
            elbow_mirrored_deg: values[1],
            lift_deg: values[2],
            magnet_on,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_frame_line() {
        let frame = ArmFrame {
            shoulder_deg: 90,
            elbow_mirrored_deg: 90,
            lift_deg: 180,
            magnet_on: false,
        };
        assert_eq!(frame.to_line(), "90,90,180,0\n");

        let frame = ArmFrame {
            shoulder_deg: 345,
            elbow_mirrored_deg: -12,
            lift_deg: 120,
            magnet_on: true,
        };
        assert_eq!(frame.to_line(), "345,-12,120,1\n");
        assert_eq!(frame.to_line().parse::<ArmFrame>(), Ok(frame));
    }

    #[test]
    fn test_frame_parse_errors() {
        assert_eq!(
            "1,2,3".parse::<ArmFrame>(),
            Err(FrameParseError::WrongFieldCount(3))
        );
        assert_eq!(
            "1,x,3,0\n".parse::<ArmFrame>(),
            Err(FrameParseError::InvalidInteger {
                index: 1,
                value: "x".into()
            })
        );
        assert_eq!(
            "1,2,3,2\n".parse::<ArmFrame>(),
            Err(FrameParseError::InvalidMagnet(2))
        );
    }
}
