//! Error types for the device model and the emulator. Framing errors live
//! alongside the codec in `message`.
use std::io;

use crate::message::Command;

/// Failures when building or commanding a remote device.
#[derive( Debug, thiserror::Error )]
pub enum DeviceError {
  /// The message is not a current state reply.
  #[error( "expected a current state message, got {0:?}" )]
  NotCurrentState( Command ),

  /// The trailing discriminator of a current state payload is unrecognized.
  #[error( "unknown device type {0:#04x}" )]
  UnknownDeviceType( u8 ),

  /// The current state payload is shorter than its device type requires.
  #[error( "current state payload is {actual} bytes, expected {expected}" )]
  Truncated { expected: usize, actual: usize },

  #[error( "{field} must be within {min}..={max}, got {value}" )]
  OutOfRange { field: &'static str, value: i64, min: i64, max: i64 },

  /// The device variant has no such setting (e.g. HDMI on a SideKick).
  #[error( "operation not supported by {0}" )]
  Unsupported( &'static str ),

  #[error( "I/O error: {0}" )]
  Io( #[from] io::Error )
}

/// Failures from the local emulator API. Inbound network commands never
/// surface errors; invalid ones are logged and dropped.
#[derive( Debug, Clone, PartialEq, Eq, thiserror::Error )]
pub enum EmulatorError {
  #[error( "{field} must be within {min}..={max}, got {value}" )]
  OutOfRange { field: &'static str, value: i64, min: i64, max: i64 },

  #[error( "operation not supported by {0}" )]
  Unsupported( &'static str )
}
