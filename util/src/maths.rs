//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Number of degrees in a full turn.
pub const DEG_PER_TURN: i32 = 360;

/// Wrap an integer angle in degrees into the range [0, 360).
///
/// Adds or subtracts whole turns until the angle lies in range.
pub fn wrap_deg_360(deg: i32) -> i32 {
    let mut wrapped = deg;

    while wrapped < 0 {
        wrapped += DEG_PER_TURN;
    }
    while wrapped >= DEG_PER_TURN {
        wrapped -= DEG_PER_TURN;
    }

    wrapped
}

/// Round a value to the given number of decimal places.
pub fn round_dp<T>(value: T, decimal_places: i32) -> T
where
    T: Float
{
    let scale = T::from(10.0).unwrap_or_else(T::one).powi(decimal_places);
    (value * scale).round() / scale
}
