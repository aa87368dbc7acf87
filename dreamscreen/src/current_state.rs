//! The current state payload, a fixed layout snapshot of every setting on a
//! device. Two layouts exist, selected by the trailing device type octet:
//!
//! ```text
//!              compact (SideKick, 63)   extended (HD / 4K, 141)
//! name         0..16                    0..16
//! group name   16..32                   16..32
//! group        32                       32
//! mode         33                       33
//! brightness   34                       34
//! color        35..38                   40..43
//! saturation   38..41                   43..46
//! sectors      42..57                   -
//! scene        60                       62
//! hdmi input   -                        73
//! hdmi names   -                        75..91, 91..107, 107..123
//! channels     -                        129
//! device type  62                       140
//! ```
use zerocopy::{ FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout };

use crate::color::Rgb;
use crate::constants::*;
use crate::error::DeviceError;
use crate::types::{ AmbientScene, DeviceKind, HdmiActiveChannels, Mode };

type NameBlock = [u8; MAX_NAME_LENGTH];

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Layouts

#[repr( C )]
#[derive( Clone, Copy, FromBytes, Immutable, IntoBytes, KnownLayout )]
struct CommonLayout {
  name: NameBlock,
  group_name: NameBlock,
  group_number: u8,
  mode: u8,
  brightness: u8
}

#[repr( C )]
#[derive( Clone, Copy, FromBytes, Immutable, IntoBytes, KnownLayout )]
struct CompactLayout {
  common: CommonLayout,
  ambient_color: Rgb,
  saturation: Rgb,
  _reserved_0: u8,
  sectors: [u8; SECTOR_SETTING_BYTES],
  _reserved_1: [u8; 3],
  ambient_scene: u8,
  _reserved_2: u8,
  device_type: u8
}

#[repr( C )]
#[derive( Clone, Copy, FromBytes, Immutable, IntoBytes, KnownLayout )]
struct ExtendedLayout {
  common: CommonLayout,
  _reserved_0: [u8; 5],
  ambient_color: Rgb,
  saturation: Rgb,
  _reserved_1: [u8; 16],
  ambient_scene: u8,
  _reserved_2: [u8; 10],
  hdmi_input: u8,
  _reserved_3: u8,
  hdmi_names: [NameBlock; 3],
  _reserved_4: [u8; 6],
  active_channels: u8,
  _reserved_5: [u8; 10],
  device_type: u8
}

const _: () = assert!( size_of::<CompactLayout>() == COMPACT_STATE_BYTES );
const _: () = assert!( size_of::<ExtendedLayout>() == EXTENDED_STATE_BYTES );

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Names

/// Truncates `name` to at most 16 characters that also fit in 16 octets.
pub fn truncate_name( name: &str ) -> &str {
  let end =
    name.char_indices()
    .map( |( i, c )| i + c.len_utf8() )
    .take( MAX_NAME_LENGTH )
    .take_while( |end| *end <= MAX_NAME_LENGTH )
    .last()
    .unwrap_or( 0 );

  return &name[..end];
}

/// Reads a NUL-padded UTF-8 name.
pub fn read_name( bytes: &[u8] ) -> String {
  let end = bytes.iter().position( |b| *b == 0 ).unwrap_or( bytes.len() );
  return String::from_utf8_lossy( &bytes[..end] ).trim().to_string();
}

fn write_name( block: &mut NameBlock, name: &str ) {
  let name = truncate_name( name ).as_bytes();
  block.fill( 0 );
  block[..name.len()].copy_from_slice( name );
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Sectors

/// Reads a sector setting block: 1-based sector indices, terminated by the
/// first zero. Indices above 12 are skipped.
pub fn read_sectors( bytes: &[u8] ) -> Vec<u8> {
  bytes.iter()
    .take_while( |s| **s != 0 )
    .filter( |s| **s as usize <= SCREEN_SECTOR_COUNT )
    .take( SCREEN_SECTOR_COUNT )
    .copied()
    .collect()
}

pub fn write_sectors( block: &mut [u8], sectors: &[u8] ) {
  block.fill( 0 );

  let valid = sectors.iter().filter( |s| ( 1..=SCREEN_SECTOR_COUNT as u8 ).contains( *s ) );
  for ( slot, sector ) in block.iter_mut().zip( valid.take( SCREEN_SECTOR_COUNT ) ) {
    *slot = *sector;
  }
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -  Snapshot

/// HDMI bookkeeping carried by HD and 4K devices.
#[derive( Clone, Debug, PartialEq, Eq )]
pub struct HdmiSettings {
  /// The selected input, 0-based.
  pub input: u8,
  pub names: [String; 3],
  pub active_channels: HdmiActiveChannels
}

impl Default for HdmiSettings {
  fn default() -> Self {
    Self{
      input: 0,
      names: [ "unassigned".into(), "unassigned".into(), "unassigned".into() ],
      active_channels: HdmiActiveChannels::from_byte( 0x01 )
    }
  }
}

/// The decoded contents of a current state message.
#[derive( Clone, Debug, PartialEq, Eq )]
pub struct DeviceSnapshot {
  pub kind: DeviceKind,
  pub name: String,
  pub group_name: String,
  pub group_number: u8,
  pub mode: Mode,
  pub brightness: u8,
  pub ambient_color: Rgb,
  pub ambient_scene: AmbientScene,
  pub saturation: Rgb,

  /// Present for HD and 4K devices only.
  pub hdmi: Option<HdmiSettings>,

  /// The sectors a SideKick averages. Always empty for HD and 4K devices.
  pub sectors: Vec<u8>
}

impl DeviceSnapshot {
  /// A snapshot with factory defaults for `kind`.
  pub fn new( kind: DeviceKind ) -> Self {
    Self{
      kind,
      name: String::new(),
      group_name: String::new(),
      group_number: GROUP_NONE,
      mode: Mode::Sleep,
      brightness: 100,
      ambient_color: Rgb::BLACK,
      ambient_scene: AmbientScene::Fireside,
      saturation: Rgb::WHITE,
      hdmi: if kind.is_compact() { None } else { Some( HdmiSettings::default() ) },
      sectors: Vec::new()
    }
  }

  /// Decodes a current state payload. The device type is read from the
  /// trailing octet and selects the layout.
  pub fn decode( payload: &[u8] ) -> Result<Self,DeviceError> {
    let discriminator = *payload.last().ok_or( DeviceError::Truncated{ expected: COMPACT_STATE_BYTES, actual: 0 } )?;
    let kind = DeviceKind::from_byte( discriminator ).ok_or( DeviceError::UnknownDeviceType( discriminator ) )?;

    let expected = kind.state_payload_size();
    if payload.len() < expected {
      return Err( DeviceError::Truncated{ expected, actual: payload.len() } );
    }

    let bytes = &payload[..expected];
    let truncated = || DeviceError::Truncated{ expected, actual: payload.len() };

    let snapshot =
      if kind.is_compact() {
        let layout = CompactLayout::read_from_bytes( bytes ).map_err( |_| truncated() )?;
        let mut snapshot = Self::from_common( kind, &layout.common, layout.ambient_color, layout.saturation, layout.ambient_scene );
        snapshot.sectors = read_sectors( &layout.sectors );
        snapshot
      } else {
        let layout = ExtendedLayout::read_from_bytes( bytes ).map_err( |_| truncated() )?;
        let mut snapshot = Self::from_common( kind, &layout.common, layout.ambient_color, layout.saturation, layout.ambient_scene );
        snapshot.hdmi = Some( HdmiSettings{
          input: layout.hdmi_input,
          names: layout.hdmi_names.map( |block| read_name( &block ) ),
          active_channels: HdmiActiveChannels::from_byte( layout.active_channels )
        });
        snapshot
      };

    return Ok( snapshot );
  }

  fn from_common( kind: DeviceKind, common: &CommonLayout, ambient_color: Rgb, saturation: Rgb, scene: u8 ) -> Self {
    let mode = Mode::from_byte( common.mode ).unwrap_or_else( || {
      log::warn!( "Unknown mode {:#04x} in current state, assuming sleep", common.mode );
      Mode::Sleep
    });

    let ambient_scene = AmbientScene::from_byte( scene ).unwrap_or_else( || {
      log::warn!( "Unknown ambient scene {:#04x} in current state", scene );
      AmbientScene::default()
    });

    Self{
      kind,
      name: read_name( &common.name ),
      group_name: read_name( &common.group_name ),
      group_number: common.group_number,
      mode,
      brightness: common.brightness,
      ambient_color,
      ambient_scene,
      saturation,
      hdmi: None,
      sectors: Vec::new()
    }
  }

  /// Encodes this snapshot into the payload layout for its device type.
  pub fn encode( &self ) -> Vec<u8> {
    let mut common = CommonLayout::new_zeroed();
    write_name( &mut common.name, &self.name );
    write_name( &mut common.group_name, &self.group_name );
    common.group_number = self.group_number;
    common.mode = self.mode.as_byte();
    common.brightness = self.brightness;

    if self.kind.is_compact() {
      let mut layout = CompactLayout::new_zeroed();
      layout.common = common;
      layout.ambient_color = self.ambient_color;
      layout.saturation = self.saturation;
      write_sectors( &mut layout.sectors, &self.sectors );
      layout.ambient_scene = self.ambient_scene.as_byte();
      layout.device_type = self.kind.as_byte();
      layout.as_bytes().to_vec()
    } else {
      let hdmi = self.hdmi.clone().unwrap_or_default();

      let mut layout = ExtendedLayout::new_zeroed();
      layout.common = common;
      layout.ambient_color = self.ambient_color;
      layout.saturation = self.saturation;
      layout.ambient_scene = self.ambient_scene.as_byte();
      layout.hdmi_input = hdmi.input;
      for ( block, name ) in layout.hdmi_names.iter_mut().zip( hdmi.names.iter() ) {
        write_name( block, name );
      }
      layout.active_channels = hdmi.active_channels.as_byte();
      layout.device_type = self.kind.as_byte();
      layout.as_bytes().to_vec()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extended_fields_land_on_their_offsets() {
    let mut snapshot = DeviceSnapshot::new( DeviceKind::FourK );
    snapshot.name = "Living Room".into();
    snapshot.ambient_color = Rgb::new( 1, 2, 3 );
    snapshot.ambient_scene = AmbientScene::Ocean;
    snapshot.hdmi = Some( HdmiSettings{
      input: 2,
      names: [ "PS5".into(), "AppleTV".into(), "PC".into() ],
      active_channels: HdmiActiveChannels::from_byte( 0b101 )
    });

    let payload = snapshot.encode();
    assert_eq!( payload.len(), EXTENDED_STATE_BYTES );
    assert_eq!( &payload[0..11], b"Living Room" );
    assert_eq!( &payload[40..43], &[ 1, 2, 3 ] );
    assert_eq!( payload[62], AmbientScene::Ocean.as_byte() );
    assert_eq!( payload[73], 2 );
    assert_eq!( &payload[91..98], b"AppleTV" );
    assert_eq!( payload[129], 0b101 );
    assert_eq!( payload[140], DEVICE_TYPE_4K );

    assert_eq!( DeviceSnapshot::decode( &payload ).unwrap(), snapshot );
  }

  #[test]
  fn compact_fields_land_on_their_offsets() {
    let mut snapshot = DeviceSnapshot::new( DeviceKind::SideKick );
    snapshot.ambient_color = Rgb::new( 9, 8, 7 );
    snapshot.sectors = vec![ 1, 2, 12 ];

    let payload = snapshot.encode();
    assert_eq!( payload.len(), COMPACT_STATE_BYTES );
    assert_eq!( &payload[35..38], &[ 9, 8, 7 ] );
    assert_eq!( &payload[42..46], &[ 1, 2, 12, 0 ] );
    assert_eq!( payload[62], DEVICE_TYPE_SIDEKICK );
    assert_eq!( DeviceSnapshot::decode( &payload ).unwrap().hdmi, None );
  }

  #[test]
  fn rejects_unknown_and_truncated_payloads() {
    let mut payload = DeviceSnapshot::new( DeviceKind::Hd ).encode();
    *payload.last_mut().unwrap() = 0x09;
    assert!( matches!( DeviceSnapshot::decode( &payload ), Err( DeviceError::UnknownDeviceType( 0x09 ) ) ) );

    assert!( matches!( DeviceSnapshot::decode( &[ 0, 0, DEVICE_TYPE_HD ] ), Err( DeviceError::Truncated{ .. } ) ) );
    assert!( matches!( DeviceSnapshot::decode( &[] ), Err( DeviceError::Truncated{ .. } ) ) );
  }

  #[test]
  fn names_truncate_to_sixteen_characters() {
    assert_eq!( truncate_name( "A very long device name" ), "A very long devi" );
    assert_eq!( truncate_name( "" ), "" );
    assert_eq!( read_name( b"Lounge\0\0\0\0\0\0\0\0\0\0" ), "Lounge" );
  }

  #[test]
  fn sector_lists_stop_at_zero_and_skip_invalid_indices() {
    assert_eq!( read_sectors( &[ 3, 13, 4, 0, 5 ] ), vec![ 3, 4 ] );
  }
}
