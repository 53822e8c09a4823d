//! Command dispatch for the servolink protocol.
//!
//! This is the layer that acts on parsed frames. A [`Receiver`] pulls
//! frames from a byte source one at a time, tokenizes them, and hands each
//! command to a [`Dispatcher`], which moves an [`Actuator`] and echoes the
//! command through a [`Reporter`].

pub mod actuator;
pub mod dispatcher;
pub mod error;
pub mod receiver;
pub mod reporter;

pub use actuator::{
    Actuator, JointLimits, LimitPolicy, LimitedActuator, LogActuator, Move, RecordingActuator,
};
pub use dispatcher::{DispatchConfig, Dispatcher, DEFAULT_MOVE_DURATION_MS};
pub use error::{DispatchError, ReceiveError, Result};
pub use receiver::{
    open_serial, ReceiveEvent, Receiver, ReceiverConfig, ReceiverStats, RejectReason,
    DEFAULT_BANNER,
};
pub use reporter::{EchoReporter, NullReporter, Reporter};
