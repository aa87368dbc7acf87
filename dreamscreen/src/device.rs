//! Client side model of a remote device. Built from a current state reply and
//! kept in sync by write-through setters: each updates the cached state and
//! sends the matching command. No acknowledgement is awaited.
use std::fmt;
use std::net::SocketAddr;

use crate::color::Rgb;
use crate::current_state::{ self, DeviceSnapshot, HdmiSettings };
use crate::error::DeviceError;
use crate::message::{ Codec, Command, Message };
use crate::transport;
use crate::types::{ AmbientMode, AmbientScene, DeviceKind, Mode };
use crate::wrappers::*;

#[derive( Clone, Debug )]
pub struct Device {
  address: SocketAddr,
  state: DeviceSnapshot,
  ambient_mode: Option<AmbientMode>,
  codec: Codec
}

impl Device {
  /// Builds a device from a current state reply received from `address`.
  pub fn parse( message: &Message, address: SocketAddr ) -> Result<Device,DeviceError> {
    if message.command() != Command::CurrentState {
      return Err( DeviceError::NotCurrentState( message.command() ) );
    }

    return Ok( Self::from_snapshot( DeviceSnapshot::decode( message.payload() )?, address ) );
  }

  pub fn from_snapshot( state: DeviceSnapshot, address: SocketAddr ) -> Self {
    return Self{ address, state, ambient_mode: None, codec: Codec::default() };
  }

  /// Overrides the codec used to frame outgoing commands.
  pub fn with_codec( mut self, codec: Codec ) -> Self {
    self.codec = codec;
    return self;
  }

  /// Replaces the cached state with a newer snapshot of the same device.
  pub fn update( &mut self, state: DeviceSnapshot ) {
    self.state = state;
  }

  pub fn address( &self ) -> SocketAddr {
    return self.address;
  }

  pub fn kind( &self ) -> DeviceKind {
    return self.state.kind;
  }

  pub fn snapshot( &self ) -> &DeviceSnapshot {
    return &self.state;
  }

  pub fn name( &self ) -> &str {
    return &self.state.name;
  }

  pub fn group_name( &self ) -> &str {
    return &self.state.group_name;
  }

  pub fn group_number( &self ) -> u8 {
    return self.state.group_number;
  }

  pub fn mode( &self ) -> Mode {
    return self.state.mode;
  }

  pub fn brightness( &self ) -> u8 {
    return self.state.brightness;
  }

  pub fn ambient_color( &self ) -> Rgb {
    return self.state.ambient_color;
  }

  pub fn ambient_scene( &self ) -> AmbientScene {
    return self.state.ambient_scene;
  }

  /// The last ambient mode set through this handle. Current state replies do
  /// not carry it.
  pub fn ambient_mode( &self ) -> Option<AmbientMode> {
    return self.ambient_mode;
  }

  pub fn color_saturation( &self ) -> Rgb {
    return self.state.saturation;
  }

  /// HDMI settings, for HD and 4K devices.
  pub fn hdmi( &self ) -> Option<&HdmiSettings> {
    return self.state.hdmi.as_ref();
  }

  /// The sectors a SideKick averages.
  pub fn sectors( &self ) -> &[u8] {
    return &self.state.sectors;
  }

  // - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Setters

  pub async fn set_name( &mut self, name: &str ) -> Result<(),DeviceError> {
    self.state.name = current_state::truncate_name( name ).to_string();
    return self.send( DeviceNameMessage::new( self.state.group_number, name ) ).await;
  }

  pub async fn set_group_name( &mut self, name: &str ) -> Result<(),DeviceError> {
    self.state.group_name = current_state::truncate_name( name ).to_string();
    return self.send( GroupNameMessage::new( self.state.group_number, name ) ).await;
  }

  /// Moves the device to `group_number`. The command is addressed to the
  /// group the device is leaving.
  pub async fn set_group_number( &mut self, group_number: u8 ) -> Result<(),DeviceError> {
    let message = GroupNumberMessage::new( self.state.group_number, group_number );
    self.state.group_number = group_number;
    return self.send( message ).await;
  }

  pub async fn set_mode( &mut self, mode: Mode ) -> Result<(),DeviceError> {
    self.state.mode = mode;
    return self.send( ModeMessage::new( self.state.group_number, mode ) ).await;
  }

  /// Sets the brightness (`0..=100`). With `broadcast_to_group` the device
  /// propagates the change to its group.
  pub async fn set_brightness( &mut self, brightness: u8, broadcast_to_group: bool ) -> Result<(),DeviceError> {
    if brightness > 100 {
      return Err( DeviceError::OutOfRange{ field: "brightness", value: brightness as i64, min: 0, max: 100 } );
    }

    self.state.brightness = brightness;
    return self.send( BrightnessMessage::new( self.state.group_number, brightness ).addressed( addressing( broadcast_to_group ) ) ).await;
  }

  /// Sets the ambient color. With `broadcast_to_group` the device propagates
  /// the change to its group.
  pub async fn set_ambient_color( &mut self, color: Rgb, broadcast_to_group: bool ) -> Result<(),DeviceError> {
    self.state.ambient_color = color;
    return self.send( AmbientColorMessage::new( self.state.group_number, color ).addressed( addressing( broadcast_to_group ) ) ).await;
  }

  pub async fn set_ambient_mode( &mut self, ambient_mode: AmbientMode ) -> Result<(),DeviceError> {
    self.ambient_mode = Some( ambient_mode );
    return self.send( AmbientModeMessage::new( self.state.group_number, ambient_mode ) ).await;
  }

  pub async fn set_ambient_scene( &mut self, scene: AmbientScene ) -> Result<(),DeviceError> {
    self.state.ambient_scene = scene;
    return self.send( AmbientSceneMessage::new( self.state.group_number, scene ) ).await;
  }

  pub async fn set_color_saturation( &mut self, saturation: Rgb ) -> Result<(),DeviceError> {
    self.state.saturation = saturation;
    return self.send( ColorSaturationMessage::new( self.state.group_number, saturation ) ).await;
  }

  /// Selects HDMI `input` (`1..=3`).
  pub async fn set_hdmi_input( &mut self, input: u8 ) -> Result<(),DeviceError> {
    if ! ( 1..=3 ).contains( &input ) {
      return Err( DeviceError::OutOfRange{ field: "hdmi input", value: input as i64, min: 1, max: 3 } );
    }

    let group = self.state.group_number;
    self.hdmi_mut()?.input = input - 1;
    return self.send( HdmiInputMessage::new( group, input - 1 ) ).await;
  }

  /// Renames HDMI `input` (`1..=3`).
  pub async fn set_hdmi_name( &mut self, input: usize, name: &str ) -> Result<(),DeviceError> {
    let group = self.state.group_number;
    let message = HdmiNameMessage::new( group, input, name )
      .ok_or( DeviceError::OutOfRange{ field: "hdmi input", value: input as i64, min: 1, max: 3 } )?;

    self.hdmi_mut()?.names[input - 1] = current_state::truncate_name( name ).to_string();
    return self.send( message ).await;
  }

  /// Sets the sectors a SideKick averages to pick its color.
  pub async fn set_sectors( &mut self, sectors: &[u8] ) -> Result<(),DeviceError> {
    if ! self.state.kind.is_compact() {
      return Err( DeviceError::Unsupported( "HD and 4K devices" ) );
    }

    let message = SectorSettingMessage::new( self.state.group_number, sectors );
    self.state.sectors = message.sectors();
    return self.send( message ).await;
  }

  fn hdmi_mut( &mut self ) -> Result<&mut HdmiSettings,DeviceError> {
    return self.state.hdmi.as_mut().ok_or( DeviceError::Unsupported( "SideKick devices" ) );
  }

  async fn send( &self, message: impl Into<Message> ) -> Result<(),DeviceError> {
    let message = message.into();
    log::debug!( "Sending to {}: {}", self.address, message );

    transport::send_bytes_static( &self.codec.encode( &message ), self.address ).await?;
    return Ok(());
  }
}

fn addressing( broadcast_to_group: bool ) -> Addressing {
  if broadcast_to_group { Addressing::Unicast } else { Addressing::UnicastLocal }
}

impl fmt::Display for Device {
  fn fmt( &self, f: &mut fmt::Formatter ) -> fmt::Result {
    writeln!( f, "{} at {}", self.state.kind, self.address )?;
    writeln!( f, "  Name = {}", self.state.name )?;
    writeln!( f, "  Group = {} ({})", self.state.group_name, self.state.group_number )?;
    writeln!( f, "  Mode = {:?}", self.state.mode )?;
    writeln!( f, "  Brightness = {}", self.state.brightness )?;
    writeln!( f, "  Ambient color = {}", self.state.ambient_color )?;
    writeln!( f, "  Ambient scene = {:?}", self.state.ambient_scene )?;
    write!( f, "  Saturation = {}", self.state.saturation )?;

    if let Some( hdmi ) = &self.state.hdmi {
      writeln!( f )?;
      writeln!( f, "  HDMI input = {} ({})", hdmi.input + 1, hdmi.names.get( hdmi.input as usize ).map( String::as_str ).unwrap_or( "?" ) )?;
      write!( f, "  HDMI names = {} / {} / {}", hdmi.names[0], hdmi.names[1], hdmi.names[2] )?;
    }

    if self.state.kind.is_compact() {
      writeln!( f )?;
      write!( f, "  Sectors = {:?}", self.state.sectors )?;
    }

    return Ok(());
  }
}
