//! Typed views over a `Message`, one per command. Constructors set the flags
//! the devices expect for that command; `addressed` re-flags a message for
//! the group echo and local-only paths.
use crate::color::{ Rgb, ScreenColor };
use crate::constants::*;
use crate::current_state::{ self, DeviceSnapshot };
use crate::error::DeviceError;
use crate::message::{ Command, Message };
use crate::types::{ AmbientMode, AmbientScene, HdmiActiveChannels, Mode };

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Addressing

/// How a message is meant to be handled by the devices that receive it. Maps
/// one-to-one onto the flags octet.
#[derive( Clone, Copy, Debug, PartialEq, Eq, Hash )]
pub enum Addressing {
  /// Applied by the receiver only; not propagated to its group.
  UnicastLocal,

  /// Applied by the receiver, which echoes the change to its group.
  Unicast,
  BroadcastToAll,
  BroadcastToGroup,
  Query,
  Status
}

impl Addressing {
  pub fn flags( self ) -> u8 {
    match self {
      Addressing::UnicastLocal => FLAG_UNICAST_LOCAL,
      Addressing::Unicast => FLAG_UNICAST,
      Addressing::BroadcastToAll => FLAG_BROADCAST_TO_ALL,
      Addressing::BroadcastToGroup => FLAG_BROADCAST_TO_GROUP,
      Addressing::Query => FLAG_QUERY,
      Addressing::Status => FLAG_STATUS
    }
  }

  pub fn from_flags( flags: u8 ) -> Option<Addressing> {
    match flags {
      FLAG_UNICAST_LOCAL => Some( Addressing::UnicastLocal ),
      FLAG_UNICAST => Some( Addressing::Unicast ),
      FLAG_BROADCAST_TO_ALL => Some( Addressing::BroadcastToAll ),
      FLAG_BROADCAST_TO_GROUP => Some( Addressing::BroadcastToGroup ),
      FLAG_QUERY => Some( Addressing::Query ),
      FLAG_STATUS => Some( Addressing::Status ),
      _ => None
    }
  }
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Wrappers

macro_rules! message_wrapper {
  ( $( #[$meta:meta] )* $name:ident => $command:ident( $upper:expr, $lower:expr ) as $addressing:ident ) => {
    $( #[$meta] )*
    #[derive( Clone, Debug, PartialEq, Eq )]
    pub struct $name( Message );

    impl $name {
      /// The flags every new message of this command carries.
      pub const ADDRESSING: Addressing = Addressing::$addressing;

      fn build( group: u8, payload: Vec<u8> ) -> Self {
        return Self( Message::new( group, Self::ADDRESSING.flags(), $upper, $lower, payload ) );
      }

      /// Re-flags the message, for group echoes and local-only changes.
      pub fn addressed( mut self, addressing: Addressing ) -> Self {
        self.0.set_flags( addressing.flags() );
        return self;
      }

      /// Wraps `message`, or returns `None` if it carries another command.
      pub fn from_message( message: Message ) -> Option<Self> {
        return ( message.command() == Command::$command ).then( || Self( message ) );
      }

      pub fn message( &self ) -> &Message {
        return &self.0;
      }

      pub fn into_message( self ) -> Message {
        return self.0;
      }
    }

    impl From<$name> for Message {
      fn from( wrapper: $name ) -> Message {
        return wrapper.0;
      }
    }
  };
}

fn first_octet( message: &Message ) -> u8 {
  return message.payload().first().copied().unwrap_or( 0 );
}

fn name_payload( name: &str ) -> Vec<u8> {
  return current_state::truncate_name( name ).as_bytes().to_vec();
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Current State

message_wrapper!(
  /// A full device snapshot, sent in reply to a current state request.
  CurrentStateMessage => CurrentState( NAMESPACE_MANAGEMENT, COMMAND_CURRENT_STATE ) as Status
);

impl CurrentStateMessage {
  /// Replies go to every group with the status flag.
  pub fn new( snapshot: &DeviceSnapshot ) -> Self {
    return Self::build( GROUP_ALL, snapshot.encode() );
  }

  pub fn snapshot( &self ) -> Result<DeviceSnapshot,DeviceError> {
    return DeviceSnapshot::decode( self.0.payload() );
  }
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Naming

message_wrapper!( GroupNumberMessage => GroupNumber( NAMESPACE_MANAGEMENT, COMMAND_GROUP_NUMBER ) as Unicast );

impl GroupNumberMessage {
  pub fn new( group: u8, group_number: u8 ) -> Self {
    return Self::build( group, vec![ group_number ] );
  }

  pub fn group_number( &self ) -> u8 {
    return first_octet( &self.0 );
  }
}

message_wrapper!( GroupNameMessage => GroupName( NAMESPACE_MANAGEMENT, COMMAND_GROUP_NAME ) as Unicast );

impl GroupNameMessage {
  pub fn new( group: u8, name: &str ) -> Self {
    return Self::build( group, name_payload( name ) );
  }

  pub fn group_name( &self ) -> String {
    return current_state::read_name( self.0.payload() );
  }
}

message_wrapper!( DeviceNameMessage => DeviceName( NAMESPACE_MANAGEMENT, COMMAND_DEVICE_NAME ) as Unicast );

impl DeviceNameMessage {
  pub fn new( group: u8, name: &str ) -> Self {
    return Self::build( group, name_payload( name ) );
  }

  pub fn device_name( &self ) -> String {
    return current_state::read_name( self.0.payload() );
  }
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Lighting

message_wrapper!( ModeMessage => Mode( NAMESPACE_DEVICE, COMMAND_MODE ) as Unicast );

impl ModeMessage {
  pub fn new( group: u8, mode: Mode ) -> Self {
    return Self::build( group, vec![ mode.as_byte() ] );
  }

  pub fn mode( &self ) -> Option<Mode> {
    return Mode::from_byte( first_octet( &self.0 ) );
  }
}

message_wrapper!( BrightnessMessage => Brightness( NAMESPACE_DEVICE, COMMAND_BRIGHTNESS ) as Unicast );

impl BrightnessMessage {
  pub fn new( group: u8, brightness: u8 ) -> Self {
    return Self::build( group, vec![ brightness ] );
  }

  pub fn brightness( &self ) -> u8 {
    return first_octet( &self.0 );
  }
}

message_wrapper!( AmbientColorMessage => AmbientColor( NAMESPACE_DEVICE, COMMAND_AMBIENT_COLOR ) as Unicast );

impl AmbientColorMessage {
  pub fn new( group: u8, color: Rgb ) -> Self {
    return Self::build( group, color.to_array().to_vec() );
  }

  pub fn color( &self ) -> Rgb {
    return Rgb::from_slice( self.0.payload() );
  }
}

message_wrapper!( ColorSaturationMessage => ColorSaturation( NAMESPACE_DEVICE, COMMAND_COLOR_SATURATION ) as Unicast );

impl ColorSaturationMessage {
  pub fn new( group: u8, saturation: Rgb ) -> Self {
    return Self::build( group, saturation.to_array().to_vec() );
  }

  pub fn saturation( &self ) -> Rgb {
    return Rgb::from_slice( self.0.payload() );
  }
}

message_wrapper!( AmbientModeMessage => AmbientMode( NAMESPACE_DEVICE, COMMAND_AMBIENT_MODE ) as Unicast );

impl AmbientModeMessage {
  pub fn new( group: u8, ambient_mode: AmbientMode ) -> Self {
    return Self::build( group, vec![ ambient_mode.as_byte() ] );
  }

  pub fn ambient_mode( &self ) -> Option<AmbientMode> {
    return AmbientMode::from_byte( first_octet( &self.0 ) );
  }
}

message_wrapper!( AmbientSceneMessage => AmbientScene( NAMESPACE_DEVICE, COMMAND_AMBIENT_SCENE ) as Unicast );

impl AmbientSceneMessage {
  pub fn new( group: u8, scene: AmbientScene ) -> Self {
    return Self::build( group, vec![ scene.as_byte() ] );
  }

  pub fn ambient_scene( &self ) -> Option<AmbientScene> {
    return AmbientScene::from_byte( first_octet( &self.0 ) );
  }
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Sectors

message_wrapper!( ScreenSectorDataMessage => ScreenSectorData( NAMESPACE_DEVICE, COMMAND_SCREEN_SECTOR_DATA ) as BroadcastToGroup );

impl ScreenSectorDataMessage {
  pub fn new( group: u8, screen: &ScreenColor ) -> Self {
    return Self::build( group, screen.as_bytes().to_vec() );
  }

  pub fn screen( &self ) -> ScreenColor {
    return ScreenColor::from_payload( self.0.payload() );
  }
}

message_wrapper!(
  /// The 1-based sectors a SideKick averages to pick its color.
  SectorSettingMessage => SectorSetting( NAMESPACE_DEVICE, COMMAND_SECTOR_SETTING ) as Unicast
);

impl SectorSettingMessage {
  pub fn new( group: u8, sectors: &[u8] ) -> Self {
    let mut payload = vec![0u8; SECTOR_SETTING_BYTES];
    current_state::write_sectors( &mut payload, sectors );
    return Self::build( group, payload );
  }

  pub fn sectors( &self ) -> Vec<u8> {
    return current_state::read_sectors( self.0.payload() );
  }
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - HDMI

message_wrapper!( HdmiInputMessage => HdmiInput( NAMESPACE_DEVICE, COMMAND_HDMI_INPUT ) as Unicast );

impl HdmiInputMessage {
  /// `input` is 0-based.
  pub fn new( group: u8, input: u8 ) -> Self {
    return Self::build( group, vec![ input ] );
  }

  pub fn input( &self ) -> u8 {
    return first_octet( &self.0 );
  }
}

message_wrapper!( HdmiActiveChannelsMessage => HdmiActiveChannels( NAMESPACE_DEVICE, COMMAND_HDMI_ACTIVE_CHANNELS ) as Unicast );

impl HdmiActiveChannelsMessage {
  pub fn new( group: u8, channels: HdmiActiveChannels ) -> Self {
    return Self::build( group, vec![ channels.as_byte() ] );
  }

  pub fn channels( &self ) -> HdmiActiveChannels {
    return HdmiActiveChannels::from_byte( first_octet( &self.0 ) );
  }
}

/// The name of one HDMI input. Each input has its own command.
#[derive( Clone, Debug, PartialEq, Eq )]
pub struct HdmiNameMessage( Message );

impl HdmiNameMessage {
  pub const ADDRESSING: Addressing = Addressing::Unicast;

  /// `input` is 1-based. Returns `None` unless it is within `1..=3`.
  pub fn new( group: u8, input: usize, name: &str ) -> Option<Self> {
    let lower = match input {
      1 => COMMAND_HDMI_NAME_1,
      2 => COMMAND_HDMI_NAME_2,
      3 => COMMAND_HDMI_NAME_3,
      _ => return None
    };

    return Some( Self( Message::new( group, Self::ADDRESSING.flags(), NAMESPACE_DEVICE, lower, name_payload( name ) ) ) );
  }

  pub fn addressed( mut self, addressing: Addressing ) -> Self {
    self.0.set_flags( addressing.flags() );
    return self;
  }

  pub fn from_message( message: Message ) -> Option<Self> {
    matches!( message.command(), Command::HdmiName1 | Command::HdmiName2 | Command::HdmiName3 )
      .then( || Self( message ) )
  }

  /// The 1-based input this name belongs to.
  pub fn input( &self ) -> usize {
    match self.0.command() {
      Command::HdmiName1 => 1,
      Command::HdmiName2 => 2,
      _ => 3
    }
  }

  pub fn name( &self ) -> String {
    return current_state::read_name( self.0.payload() );
  }

  pub fn message( &self ) -> &Message {
    return &self.0;
  }

  pub fn into_message( self ) -> Message {
    return self.0;
  }
}

impl From<HdmiNameMessage> for Message {
  fn from( wrapper: HdmiNameMessage ) -> Message {
    return wrapper.0;
  }
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -  Subscription

message_wrapper!(
  /// Sent by a streaming device to solicit subscribers. Subscribers answer with
  /// the same message carrying the acknowledgement payload.
  SubscriptionRequestMessage => SubscriptionRequest( NAMESPACE_MANAGEMENT, COMMAND_SUBSCRIPTION_REQUEST ) as BroadcastToGroup
);

impl SubscriptionRequestMessage {
  pub fn request( group: u8 ) -> Self {
    return Self::build( group, Vec::new() );
  }

  /// The acknowledgement for this request, keeping its group and flags.
  pub fn acknowledgement( &self ) -> Self {
    let mut message = self.0.clone();
    message.set_payload( SUBSCRIPTION_ACK_PAYLOAD.to_vec() );
    return Self( message );
  }

  pub fn is_acknowledgement( &self ) -> bool {
    return self.0.payload() == SUBSCRIPTION_ACK_PAYLOAD;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::DeviceKind;

  #[test]
  fn flags_follow_the_addressing() {
    assert_eq!( ModeMessage::new( 0, Mode::Music ).message().flags(), FLAG_UNICAST );
    assert_eq!( SubscriptionRequestMessage::request( 2 ).message().flags(), FLAG_BROADCAST_TO_GROUP );

    let message = BrightnessMessage::new( 3, 42 ).addressed( Addressing::UnicastLocal ).into_message();
    assert_eq!( message.flags(), FLAG_UNICAST_LOCAL );
    assert_eq!( message.group_address(), 3 );
    assert_eq!( message.payload(), &[ 42 ] );

    let message = ModeMessage::new( 1, Mode::Video ).addressed( Addressing::BroadcastToGroup ).into_message();
    assert_eq!( message.flags(), FLAG_BROADCAST_TO_GROUP );
    assert_eq!( message.command(), Command::Mode );
  }

  #[test]
  fn wrapping_checks_the_command() {
    let message = BrightnessMessage::new( 0, 10 ).into_message();
    assert!( ModeMessage::from_message( message.clone() ).is_none() );
    assert_eq!( BrightnessMessage::from_message( message ).map( |m| m.brightness() ), Some( 10 ) );
  }

  #[test]
  fn names_are_truncated_on_write() {
    let message = DeviceNameMessage::new( 0, "The quick brown fox jumps" );
    assert_eq!( message.device_name(), "The quick brown" );
    assert_eq!( message.message().payload().len(), 16 );
  }

  #[test]
  fn hdmi_names_map_inputs_to_commands() {
    let message = HdmiNameMessage::new( 0, 2, "Console" ).unwrap().into_message();
    assert_eq!( message.command(), Command::HdmiName2 );
    assert_eq!( HdmiNameMessage::from_message( message ).map( |m| m.input() ), Some( 2 ) );
    assert!( HdmiNameMessage::new( 0, 4, "Nope" ).is_none() );
  }

  #[test]
  fn sector_settings_pad_to_fifteen_octets() {
    let message = SectorSettingMessage::new( 1, &[ 7, 8, 9 ] );
    assert_eq!( message.message().payload().len(), SECTOR_SETTING_BYTES );
    assert_eq!( message.sectors(), vec![ 7, 8, 9 ] );
  }

  #[test]
  fn acknowledgements_keep_the_request_group() {
    let request = SubscriptionRequestMessage::request( 4 );
    assert!( ! request.is_acknowledgement() );

    let ack = request.acknowledgement();
    assert!( ack.is_acknowledgement() );
    assert_eq!( ack.message().group_address(), 4 );
  }

  #[test]
  fn current_state_replies_use_the_status_flag() {
    let message = CurrentStateMessage::new( &DeviceSnapshot::new( DeviceKind::Hd ) );
    assert_eq!( message.message().flags(), FLAG_STATUS );
    assert_eq!( message.message().group_address(), GROUP_ALL );
    assert_eq!( message.snapshot().unwrap().kind, DeviceKind::Hd );
  }
}
