//! The DreamScreen wire message and its codec.
//!
//! ```text
//! [0]      start of packet (0xFC)
//! [1]      length, from group address through checksum (inclusive)
//! [2]      group address
//! [3]      flags
//! [4]      command upper (namespace)
//! [5]      command lower (opcode)
//! [6..n-1] payload
//! [n-1]    checksum over [0..n-1]
//! ```
use std::fmt;

use crate::checksum::{ self, Checksum };
use crate::constants::*;

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -  Errors

/// A datagram that could not be framed as a message. Always recoverable by
/// dropping the datagram.
#[derive( Clone, Copy, Debug, PartialEq, Eq, thiserror::Error )]
pub enum FramingError {
  #[error( "message is {0} bytes, under the minimum of 7" )]
  TooShort( usize ),

  #[error( "invalid start of packet: expected 0xFC, got {0:#04x}" )]
  InvalidMarker( u8 ),

  #[error( "invalid length: declared {declared} bytes, got {actual} bytes" )]
  LengthMismatch { declared: usize, actual: usize },

  #[error( "invalid checksum: expected {expected:#04x}, got {actual:#04x}" )]
  ChecksumMismatch { expected: u8, actual: u8 }
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -  Command

/// The semantic classification of a message, derived from its command octets
/// and whether its payload is empty.
#[derive( Clone, Copy, Debug, PartialEq, Eq, Hash )]
pub enum Command {
  CurrentStateRequest,
  CurrentState,
  GroupNumber,
  GroupName,
  DeviceName,
  SubscriptionRequest,
  Mode,
  Brightness,
  AmbientColor,
  ColorSaturation,
  AmbientMode,
  AmbientScene,
  ScreenSectorData,
  SectorSetting,
  HdmiInput,
  HdmiName1,
  HdmiName2,
  HdmiName3,
  HdmiActiveChannels,
  HdmiInputStatus,
  Unknown
}

impl Command {
  /// Classifies a `( upper, lower )` command pair. The payload only matters to
  /// tell a current state request (empty) from a current state reply.
  pub fn classify( upper: u8, lower: u8, payload_is_empty: bool ) -> Command {
    match ( upper, lower ) {
      ( NAMESPACE_MANAGEMENT, COMMAND_CURRENT_STATE ) if payload_is_empty => Command::CurrentStateRequest,
      ( NAMESPACE_MANAGEMENT, COMMAND_CURRENT_STATE ) => Command::CurrentState,
      ( NAMESPACE_MANAGEMENT, COMMAND_DEVICE_NAME ) => Command::DeviceName,
      ( NAMESPACE_MANAGEMENT, COMMAND_GROUP_NAME ) => Command::GroupName,
      ( NAMESPACE_MANAGEMENT, COMMAND_GROUP_NUMBER ) => Command::GroupNumber,
      ( NAMESPACE_MANAGEMENT, COMMAND_SUBSCRIPTION_REQUEST ) => Command::SubscriptionRequest,
      ( NAMESPACE_DEVICE, COMMAND_MODE ) => Command::Mode,
      ( NAMESPACE_DEVICE, COMMAND_BRIGHTNESS ) => Command::Brightness,
      ( NAMESPACE_DEVICE, COMMAND_AMBIENT_COLOR ) => Command::AmbientColor,
      ( NAMESPACE_DEVICE, COMMAND_COLOR_SATURATION ) => Command::ColorSaturation,
      ( NAMESPACE_DEVICE, COMMAND_AMBIENT_MODE ) => Command::AmbientMode,
      ( NAMESPACE_DEVICE, COMMAND_AMBIENT_SCENE ) => Command::AmbientScene,
      ( NAMESPACE_DEVICE, COMMAND_SCREEN_SECTOR_DATA ) => Command::ScreenSectorData,
      ( NAMESPACE_DEVICE, COMMAND_SECTOR_SETTING ) => Command::SectorSetting,
      ( NAMESPACE_DEVICE, COMMAND_HDMI_INPUT ) => Command::HdmiInput,
      ( NAMESPACE_DEVICE, COMMAND_HDMI_NAME_1 ) => Command::HdmiName1,
      ( NAMESPACE_DEVICE, COMMAND_HDMI_NAME_2 ) => Command::HdmiName2,
      ( NAMESPACE_DEVICE, COMMAND_HDMI_NAME_3 ) => Command::HdmiName3,
      ( NAMESPACE_DEVICE, COMMAND_HDMI_ACTIVE_CHANNELS ) => Command::HdmiActiveChannels,
      ( NAMESPACE_DEVICE, COMMAND_HDMI_INPUT_STATUS ) => Command::HdmiInputStatus,
      _ => Command::Unknown
    }
  }
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -  Message

#[derive( Clone, Debug, Default, PartialEq, Eq )]
pub struct Message {
  group_address: u8,
  flags: u8,
  command_upper: u8,
  command_lower: u8,
  payload: Vec<u8>
}

impl Message {
  pub fn new( group_address: u8, flags: u8, command_upper: u8, command_lower: u8, payload: Vec<u8> ) -> Self {
    return Self{ group_address, flags, command_upper, command_lower, payload };
  }

  /// The discovery query broadcast to every device on the network.
  pub fn current_state_request() -> Self {
    return Self::new( GROUP_ALL, FLAG_QUERY, NAMESPACE_MANAGEMENT, COMMAND_CURRENT_STATE, Vec::new() );
  }

  /// Decodes `bytes` using the default codec (CRC-8, checksum validated).
  pub fn decode( bytes: &[u8] ) -> Result<Message,FramingError> {
    return Codec::default().decode( bytes );
  }

  /// Encodes `self` using the default codec.
  pub fn encode( &self ) -> Vec<u8> {
    return Codec::default().encode( self );
  }

  pub fn command( &self ) -> Command {
    return Command::classify( self.command_upper, self.command_lower, self.payload.is_empty() );
  }

  #[inline]
  pub fn group_address( &self ) -> u8 {
    return self.group_address;
  }

  #[inline]
  pub fn set_group_address( &mut self, group_address: u8 ) {
    self.group_address = group_address;
  }

  #[inline]
  pub fn flags( &self ) -> u8 {
    return self.flags;
  }

  #[inline]
  pub fn set_flags( &mut self, flags: u8 ) {
    self.flags = flags;
  }

  #[inline]
  pub fn command_upper( &self ) -> u8 {
    return self.command_upper;
  }

  #[inline]
  pub fn command_lower( &self ) -> u8 {
    return self.command_lower;
  }

  pub fn set_command( &mut self, upper: u8, lower: u8 ) {
    self.command_upper = upper;
    self.command_lower = lower;
  }

  #[inline]
  pub fn payload( &self ) -> &[u8] {
    return &self.payload;
  }

  #[inline]
  pub fn payload_mut( &mut self ) -> &mut Vec<u8> {
    return &mut self.payload;
  }

  pub fn set_payload( &mut self, payload: Vec<u8> ) {
    self.payload = payload;
  }

  /// Returns the serialized length of this message, including framing.
  pub fn len( &self ) -> usize {
    return MIN_MESSAGE_BYTES + self.payload.len().min( MAX_PAYLOAD_BYTES );
  }
}

impl fmt::Display for Message {
  fn fmt( &self, f: &mut fmt::Formatter ) -> fmt::Result {
    let hex =
      self.encode().iter()
      .map( |b| format!( "{:02X}", b ) )
      .collect::<Vec<String>>()
      .join( " " );

    return write!( f, "{:?} [{}]", self.command(), hex );
  }
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Codec

/// Frames and unframes messages. The checksum function is pluggable so that
/// captured traffic from other firmware revisions can be replayed.
#[derive( Clone, Copy, Debug )]
pub struct Codec {
  checksum: Checksum,
  validate_checksum: bool
}

impl Default for Codec {
  fn default() -> Self {
    return Self{ checksum: checksum::crc8, validate_checksum: true };
  }
}

impl Codec {
  pub fn new( checksum: Checksum ) -> Self {
    return Self{ checksum, validate_checksum: true };
  }

  /// Disables checksum validation on decode. Checksums are still written on
  /// encode.
  pub fn lenient( mut self ) -> Self {
    self.validate_checksum = false;
    return self;
  }

  pub fn validates_checksum( &self ) -> bool {
    return self.validate_checksum;
  }

  /// Serializes `message`. Payloads beyond 250 octets can not be described by
  /// the length octet and are truncated.
  pub fn encode( &self, message: &Message ) -> Vec<u8> {
    let payload = &message.payload[..message.payload.len().min( MAX_PAYLOAD_BYTES )];
    let mut bytes = Vec::with_capacity( MIN_MESSAGE_BYTES + payload.len() );

    bytes.push( START_OF_PACKET );
    bytes.push( ( MIN_MESSAGE_BYTES - 2 + payload.len() ) as u8 );
    bytes.push( message.group_address );
    bytes.push( message.flags );
    bytes.push( message.command_upper );
    bytes.push( message.command_lower );
    bytes.extend_from_slice( payload );
    bytes.push( ( self.checksum )( &bytes ) );

    return bytes;
  }

  /// Validates and deserializes `bytes`. Checks are made in order: minimum
  /// length, start of packet, declared length, then checksum.
  pub fn decode( &self, bytes: &[u8] ) -> Result<Message,FramingError> {
    if bytes.len() < MIN_MESSAGE_BYTES {
      return Err( FramingError::TooShort( bytes.len() ) );
    }

    if bytes[0] != START_OF_PACKET {
      return Err( FramingError::InvalidMarker( bytes[0] ) );
    }

    let declared = bytes[1] as usize;
    if declared != bytes.len() - 2 {
      return Err( FramingError::LengthMismatch{ declared, actual: bytes.len() - 2 } );
    }

    let ( body, crc ) = bytes.split_at( bytes.len() - 1 );
    let expected = ( self.checksum )( body );
    if self.validate_checksum && expected != crc[0] {
      return Err( FramingError::ChecksumMismatch{ expected, actual: crc[0] } );
    }

    Ok( Message{
      group_address: bytes[2],
      flags: bytes[3],
      command_upper: bytes[4],
      command_lower: bytes[5],
      payload: body[HEADER_BYTES..].to_vec()
    })
  }
}
