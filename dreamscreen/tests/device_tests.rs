use dreamscreen::constants::FLAG_UNICAST_LOCAL;
use dreamscreen::wrappers::{ BrightnessMessage, CurrentStateMessage };
use dreamscreen::{
  AmbientMode, AmbientScene, Command, Device, DeviceError, DeviceKind, DeviceSnapshot, EmulatorBuilder, Mode, Rgb, ScreenColor
};

pub mod common;
use common::*;

async fn connect_to( builder: EmulatorBuilder ) -> ( dreamscreen::Emulator, Device, tokio::net::UdpSocket ) {
  let ( watcher, watcher_address ) = observer().await;
  let ( emulator, address ) = start_emulator( builder, watcher_address );

  let device = dreamscreen::connect( &transport_to( watcher_address ), address ).await.unwrap();
  ( emulator, device, watcher )
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Parsing

#[test]
fn only_current_state_messages_parse() {
  let address = localhost();
  let brightness = BrightnessMessage::new( 0, 10 ).into_message();

  assert!( matches!(
    Device::parse( &brightness, address ),
    Err( DeviceError::NotCurrentState( Command::Brightness ) )
  ));

  let snapshot = DeviceSnapshot::new( DeviceKind::SideKick );
  let device = Device::parse( CurrentStateMessage::new( &snapshot ).message(), address ).unwrap();
  assert_eq!( device.kind(), DeviceKind::SideKick );
  assert!( device.hdmi().is_none() );
}

#[test]
fn unknown_device_types_are_rejected() {
  let mut message = CurrentStateMessage::new( &DeviceSnapshot::new( DeviceKind::Hd ) ).into_message();
  if let Some( last ) = message.payload_mut().last_mut() {
    *last = 0x09;
  }

  assert!( matches!( Device::parse( &message, localhost() ), Err( DeviceError::UnknownDeviceType( 0x09 ) ) ) );
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Setters

#[tokio::test]
async fn setters_reach_the_device() {
  let ( emulator, mut device, _watcher ) = connect_to( EmulatorBuilder::new( DeviceKind::Hd ) ).await;

  device.set_name( "Den" ).await.unwrap();
  device.set_brightness( 42, true ).await.unwrap();
  device.set_ambient_scene( AmbientScene::Ocean ).await.unwrap();
  device.set_ambient_mode( AmbientMode::Scene ).await.unwrap();
  device.set_mode( Mode::Ambient ).await.unwrap();

  assert!( eventually( || emulator.mode() == Mode::Ambient ).await );
  assert_eq!( emulator.name(), "Den" );
  assert_eq!( emulator.brightness(), 42 );
  assert_eq!( emulator.ambient_mode(), AmbientMode::Scene );
  assert_eq!( emulator.screen(), ScreenColor::filled( AmbientScene::Ocean.representative_color() ) );

  assert_eq!( device.name(), "Den" );
  assert_eq!( device.brightness(), 42 );
  assert_eq!( device.ambient_mode(), Some( AmbientMode::Scene ) );
}

#[tokio::test]
async fn local_changes_are_not_echoed() {
  let ( emulator, mut device, watcher ) = connect_to( EmulatorBuilder::new( DeviceKind::SideKick ) ).await;

  device.set_ambient_color( Rgb::new( 9, 8, 7 ), false ).await.unwrap();
  assert!( eventually( || emulator.ambient_color() == Rgb::new( 9, 8, 7 ) ).await );

  device.set_ambient_color( Rgb::new( 1, 1, 1 ), true ).await.unwrap();
  let update = recv_command( &watcher, Command::AmbientColor ).await;
  assert_eq!( update.payload(), &[ 1, 1, 1 ] );
  assert_ne!( update.flags(), FLAG_UNICAST_LOCAL );
}

#[tokio::test]
async fn brightness_is_checked_before_sending() {
  let ( emulator, mut device, _watcher ) = connect_to( EmulatorBuilder::new( DeviceKind::SideKick ).brightness( 70 ) ).await;

  let result = device.set_brightness( 101, false ).await;

  assert!( matches!( result, Err( DeviceError::OutOfRange{ field: "brightness", value: 101, .. } ) ) );
  assert_eq!( device.brightness(), 70 );
  assert_eq!( emulator.brightness(), 70 );
}

#[tokio::test]
async fn variant_settings_are_checked() {
  let ( emulator, mut sidekick, _watcher ) = connect_to( EmulatorBuilder::new( DeviceKind::SideKick ) ).await;

  assert!( matches!( sidekick.set_hdmi_input( 2 ).await, Err( DeviceError::Unsupported( _ ) ) ) );

  sidekick.set_sectors( &[ 1, 2, 3 ] ).await.unwrap();
  assert!( eventually( || emulator.sectors() == vec![ 1, 2, 3 ] ).await );

  let ( hd_emulator, mut hd, _watcher ) = connect_to( EmulatorBuilder::new( DeviceKind::FourK ) ).await;

  assert!( matches!( hd.set_sectors( &[ 1 ] ).await, Err( DeviceError::Unsupported( _ ) ) ) );
  assert!( matches!( hd.set_hdmi_input( 4 ).await, Err( DeviceError::OutOfRange{ .. } ) ) );

  hd.set_hdmi_input( 3 ).await.unwrap();
  hd.set_hdmi_name( 1, "Console" ).await.unwrap();
  assert!( eventually( || hd_emulator.hdmi().is_some_and( |h| h.input == 2 && h.names[0] == "Console" ) ).await );
}

#[tokio::test]
async fn group_changes_are_sent_to_the_old_group() {
  let ( emulator, mut device, _watcher ) = connect_to( EmulatorBuilder::new( DeviceKind::SideKick ).group_number( 5 ) ).await;

  device.set_group_number( 8 ).await.unwrap();
  assert!( eventually( || emulator.group_number() == 8 ).await );

  device.set_group_name( "Upstairs" ).await.unwrap();
  assert!( eventually( || emulator.group_name() == "Upstairs" ).await );
}
