//! Delimiter-framed serial command protocol for six-joint servo controllers.
//!
//! A host sends `<NAME,i1,i2,i3,i4,i5,i6>`; the receiver reassembles the
//! frame from the byte stream, splits it into a name and six integers, and
//! moves an actuator.
//!
//! # Crate Structure
//!
//! - [`transport`]: Serial link and loopback streams
//! - [`frame`]: Frame accumulator, field tokenizer, encoder
//! - [`dispatch`]: Actuator/reporter capabilities and the receive loop (behind `dispatch` feature)

/// Re-export transport types.
pub mod transport {
    pub use servolink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use servolink_frame::*;
}

/// Re-export dispatch types (requires `dispatch` feature).
#[cfg(feature = "dispatch")]
pub mod dispatch {
    pub use servolink_dispatch::*;
}
