//! Enumerations shared by the device model, the emulator and the message
//! wrappers. Each maps one-to-one onto a payload octet.
use std::fmt;

use crate::color::Rgb;
use crate::constants::*;

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -  Device

/// The product discriminator found in the trailing octet of a current state
/// payload.
#[repr( u8 )]
#[derive( Clone, Copy, Debug, PartialEq, Eq, Hash )]
pub enum DeviceKind {
  Hd = DEVICE_TYPE_HD,
  FourK = DEVICE_TYPE_4K,
  SideKick = DEVICE_TYPE_SIDEKICK
}

impl DeviceKind {
  pub fn from_byte( byte: u8 ) -> Option<DeviceKind> {
    match byte {
      DEVICE_TYPE_HD => Some( DeviceKind::Hd ),
      DEVICE_TYPE_4K => Some( DeviceKind::FourK ),
      DEVICE_TYPE_SIDEKICK => Some( DeviceKind::SideKick ),
      _ => None
    }
  }

  pub fn as_byte( self ) -> u8 {
    return self as u8;
  }

  /// Compact devices (SideKick) have no HDMI inputs and use the short current
  /// state layout.
  pub fn is_compact( self ) -> bool {
    return self == DeviceKind::SideKick;
  }

  /// Size of the current state payload this kind of device reports.
  pub fn state_payload_size( self ) -> usize {
    if self.is_compact() { COMPACT_STATE_BYTES } else { EXTENDED_STATE_BYTES }
  }
}

impl fmt::Display for DeviceKind {
  fn fmt( &self, f: &mut fmt::Formatter ) -> fmt::Result {
    match self {
      DeviceKind::Hd => write!( f, "DreamScreen HD" ),
      DeviceKind::FourK => write!( f, "DreamScreen 4K" ),
      DeviceKind::SideKick => write!( f, "SideKick" )
    }
  }
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Mode

#[repr( u8 )]
#[derive( Clone, Copy, Debug, Default, PartialEq, Eq, Hash )]
pub enum Mode {
  #[default]
  Sleep = 0,
  Video = 1,
  Music = 2,
  Ambient = 3
}

impl Mode {
  pub fn from_byte( byte: u8 ) -> Option<Mode> {
    match byte {
      0 => Some( Mode::Sleep ),
      1 => Some( Mode::Video ),
      2 => Some( Mode::Music ),
      3 => Some( Mode::Ambient ),
      _ => None
    }
  }

  pub fn as_byte( self ) -> u8 {
    return self as u8;
  }

  /// Modes in which screen sector colors are produced and streamed.
  pub fn is_streaming( self ) -> bool {
    return matches!( self, Mode::Video | Mode::Music );
  }
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Ambient Mode

#[repr( u8 )]
#[derive( Clone, Copy, Debug, Default, PartialEq, Eq, Hash )]
pub enum AmbientMode {
  #[default]
  Rgb = 0,
  Scene = 1
}

impl AmbientMode {
  pub fn from_byte( byte: u8 ) -> Option<AmbientMode> {
    match byte {
      0 => Some( AmbientMode::Rgb ),
      1 => Some( AmbientMode::Scene ),
      _ => None
    }
  }

  pub fn as_byte( self ) -> u8 {
    return self as u8;
  }
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Ambient Scene

#[repr( u8 )]
#[derive( Clone, Copy, Debug, Default, PartialEq, Eq, Hash )]
pub enum AmbientScene {
  RandomColor = 0,
  #[default]
  Fireside = 1,
  Twinkle = 2,
  Ocean = 3,
  Rainbow = 4,
  July4th = 5,
  Holiday = 6,
  Pop = 7,
  EnchantedForest = 8
}

impl AmbientScene {
  pub const ALL: [AmbientScene; 9] = [
    AmbientScene::RandomColor,
    AmbientScene::Fireside,
    AmbientScene::Twinkle,
    AmbientScene::Ocean,
    AmbientScene::Rainbow,
    AmbientScene::July4th,
    AmbientScene::Holiday,
    AmbientScene::Pop,
    AmbientScene::EnchantedForest
  ];

  pub fn from_byte( byte: u8 ) -> Option<AmbientScene> {
    return Self::ALL.get( byte as usize ).copied();
  }

  pub fn as_byte( self ) -> u8 {
    return self as u8;
  }

  /// A static color standing in for the scene's animation. `RandomColor`
  /// picks a new color on every call.
  pub fn representative_color( self ) -> Rgb {
    match self {
      AmbientScene::RandomColor => Rgb::random(),
      AmbientScene::Fireside => Rgb::new( 255, 120, 0 ),
      AmbientScene::Twinkle => Rgb::new( 255, 214, 170 ),
      AmbientScene::Ocean => Rgb::new( 0, 105, 148 ),
      AmbientScene::Rainbow => Rgb::new( 127, 0, 255 ),
      AmbientScene::July4th => Rgb::new( 178, 34, 52 ),
      AmbientScene::Holiday => Rgb::new( 0, 135, 62 ),
      AmbientScene::Pop => Rgb::new( 255, 20, 147 ),
      AmbientScene::EnchantedForest => Rgb::new( 34, 139, 34 )
    }
  }
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - HDMI Channels

/// Which of the three HDMI inputs carry a valid signal. On the wire, bit 2 is
/// input 1, bit 1 is input 2 and bit 0 is input 3.
#[derive( Clone, Copy, Debug, Default, PartialEq, Eq, Hash )]
pub struct HdmiActiveChannels {
  active: [bool; 3]
}

impl HdmiActiveChannels {
  pub fn new( input_1: bool, input_2: bool, input_3: bool ) -> Self {
    return Self{ active: [ input_1, input_2, input_3 ] };
  }

  pub fn from_byte( byte: u8 ) -> Self {
    return Self::new( byte & 0b100 != 0, byte & 0b010 != 0, byte & 0b001 != 0 );
  }

  pub fn as_byte( self ) -> u8 {
    return ( self.active[0] as u8 ) << 2 | ( self.active[1] as u8 ) << 1 | self.active[2] as u8;
  }

  /// Returns whether HDMI `input` (1-based) is active. Out of range inputs are
  /// never active.
  pub fn is_active( self, input: usize ) -> bool {
    return input.checked_sub( 1 ).and_then( |i| self.active.get( i ) ).copied().unwrap_or( false );
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hdmi_channels_map_input_one_to_the_high_bit() {
    let channels = HdmiActiveChannels::from_byte( 0b100 );
    assert!( channels.is_active( 1 ) );
    assert!( ! channels.is_active( 3 ) );
    assert_eq!( HdmiActiveChannels::new( false, true, true ).as_byte(), 0b011 );
  }

  #[test]
  fn scene_colors_are_deterministic_except_random() {
    for scene in AmbientScene::ALL.into_iter().filter( |s| *s != AmbientScene::RandomColor ) {
      assert_eq!( scene.representative_color(), scene.representative_color() );
      assert_eq!( AmbientScene::from_byte( scene.as_byte() ), Some( scene ) );
    }

    assert_eq!( AmbientScene::from_byte( 9 ), None );
  }
}
