use std::net::{ IpAddr, Ipv4Addr, SocketAddr };

use tokio::net::UdpSocket;
use tokio::time::{ sleep, Duration };

use dreamscreen::constants::GROUP_NONE;
use dreamscreen::wrappers::ModeMessage;
use dreamscreen::{ AmbientScene, DeviceKind, Discovery, Mode, TransportConfig };
use dreamscreen_cli::app::{ describe_frame, parse_address, parse_kind, parse_mode, parse_scene };
use dreamscreen_cli::App;

fn localhost() -> SocketAddr {
  SocketAddr::new( IpAddr::V4( Ipv4Addr::LOCALHOST ), 0 )
}

fn quick_discovery() -> Discovery {
  Discovery::new().retries( 1 ).grace( Duration::from_millis( 300 ) )
}

#[test]
fn parses_user_input() {
  assert_eq!( parse_mode( "Ambient" ), Some( Mode::Ambient ) );
  assert_eq!( parse_mode( "disco" ), None );

  assert_eq!( parse_kind( "4K" ), Some( DeviceKind::FourK ) );
  assert_eq!( parse_kind( "sidekick" ), Some( DeviceKind::SideKick ) );

  assert_eq!( parse_scene( "enchanted-forest" ), Some( AmbientScene::EnchantedForest ) );
  assert_eq!( parse_scene( "July4th" ), Some( AmbientScene::July4th ) );
  assert_eq!( parse_scene( "lava" ), None );

  assert_eq!( parse_address( "192.168.1.20" ), Some( "192.168.1.20:8888".parse().unwrap() ) );
  assert_eq!( parse_address( "127.0.0.1:9000" ), Some( "127.0.0.1:9000".parse().unwrap() ) );
  assert_eq!( parse_address( "living-room" ), None );
}

#[test]
fn frames_are_described_field_by_field() {
  let source: SocketAddr = "10.0.0.5:8888".parse().unwrap();
  let message = ModeMessage::new( GROUP_NONE, Mode::Ambient ).into_message();

  let line = describe_frame( &message, source, false );
  assert!( line.starts_with( "10.0.0.5:8888 -> group 0x00 | upper 0x03 | lower 0x01 | flags 0x11" ) );
  assert!( line.contains( "payload 0x03" ) );
  assert!( line.ends_with( "| Mode" ) );

  let line = describe_frame( &message, source, true );
  assert!( line.ends_with( &format!( "| 0x{}", message.encode().iter().map( |b| format!( "{:02X}", b ) ).collect::<String>() ) ) );
}

#[tokio::test]
async fn the_monitor_holds_the_transport_open() {
  let ( _peer, peer_address ) = bind_peer().await;
  let transport = TransportConfig::new().bind_address( localhost() ).broadcast_address( peer_address ).build();
  let mut app = App::new( transport.clone() );

  app.do_monitor( true );
  assert!( app.is_monitoring() );
  assert!( transport.is_running() );

  // Stopping an emulator leaves the monitor listening
  app.do_emulate( "hd", None );
  app.do_stop_emulator();
  assert!( transport.is_running() );

  app.do_monitor( false );
  assert!( ! app.is_monitoring() );
  assert!( ! transport.is_running() );
}

#[tokio::test]
async fn the_emulator_runs_until_stopped() {
  let ( _peer, peer_address ) = bind_peer().await;
  let transport = TransportConfig::new().bind_address( localhost() ).broadcast_address( peer_address ).build();
  let mut app = App::new( transport.clone() );

  app.do_emulate( "sidekick", Some( "Shelf" ) );
  assert!( app.emulator().is_some_and( |emulator| emulator.is_running() ) );
  assert_eq!( app.prompt(), "[Shelf]> " );
  assert!( transport.is_running() );

  app.do_emulate( "toaster", None );
  assert!( app.emulator().is_some() );

  app.do_stop_emulator();
  assert!( app.emulator().is_none() );
  assert!( ! transport.is_running() );
  assert_eq!( app.prompt(), "> " );
}

#[tokio::test]
async fn devices_listed_can_be_commanded() {
  // An emulating app plays the device for a second app acting as the client
  let ( _peer, peer_address ) = bind_peer().await;
  let device_transport = TransportConfig::new().bind_address( localhost() ).broadcast_address( peer_address ).build();
  let mut device_app = App::new( device_transport.clone() );
  device_app.do_emulate( "hd", Some( "Theater" ) );

  let device_address = device_transport.local_address().unwrap();
  let client_transport = TransportConfig::new().bind_address( localhost() ).broadcast_address( device_address ).build();
  let mut app = App::new( client_transport ).with_discovery( quick_discovery() );

  app.do_list_devices().await;
  assert_eq!( app.devices().len(), 1 );
  assert_eq!( app.devices()[0].name(), "Theater" );

  app.do_set_scene( 0, "ocean" ).await;
  app.do_set_mode( 0, "ambient" ).await;
  app.do_set_brightness( 0, 55 ).await;
  app.do_set_brightness( 5, 55 ).await;

  let emulator = device_app.emulator().unwrap();
  for _ in 0..200 {
    if emulator.brightness() == 55 {
      break;
    }
    sleep( Duration::from_millis( 10 ) ).await;
  }

  assert_eq!( emulator.brightness(), 55 );
  assert_eq!( emulator.mode(), Mode::Ambient );
  assert_eq!( emulator.ambient_scene(), AmbientScene::Ocean );
  assert_eq!( emulator.display_color(), AmbientScene::Ocean.representative_color() );
}

#[tokio::test]
async fn devices_can_be_connected_to_and_replicated() {
  let ( _peer, peer_address ) = bind_peer().await;
  let device_transport = TransportConfig::new().bind_address( localhost() ).broadcast_address( peer_address ).build();
  let mut device_app = App::new( device_transport.clone() );
  device_app.do_emulate( "4k", Some( "Theater" ) );
  let device_address = device_transport.local_address().unwrap().to_string();

  let client_transport = TransportConfig::new().bind_address( localhost() ).broadcast_address( peer_address ).build();
  let mut app = App::new( client_transport );

  app.do_replicate( &device_address ).await;
  assert!( app.devices().is_empty() );

  app.do_emulate( "hd", Some( "Spare" ) );
  app.do_replicate( &device_address ).await;
  assert_eq!( app.emulator().unwrap().name(), "Theater" );

  app.do_connect( &device_address ).await;
  app.do_connect( &device_address ).await;
  assert_eq!( app.devices().len(), 1 );
  assert_eq!( app.devices()[0].kind(), DeviceKind::FourK );

  app.do_set_hdmi_input( 0, 2 ).await;
  app.do_set_hdmi_name( 0, 3, "Console" ).await;

  let emulator = device_app.emulator().unwrap();
  for _ in 0..200 {
    if emulator.hdmi().is_some_and( |hdmi| hdmi.input == 1 && hdmi.names[2] == "Console" ) {
      break;
    }
    sleep( Duration::from_millis( 10 ) ).await;
  }

  let hdmi = emulator.hdmi().unwrap();
  assert_eq!( hdmi.input, 1 );
  assert_eq!( hdmi.names[2], "Console" );
}

async fn bind_peer() -> ( UdpSocket, SocketAddr ) {
  let socket = UdpSocket::bind( localhost() ).await.unwrap();
  let address = socket.local_addr().unwrap();
  ( socket, address )
}
