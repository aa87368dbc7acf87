/// The primary application CLI logic, used by `main`.
use std::net::{ IpAddr, SocketAddr };

use dreamscreen::constants::DREAMSCREEN_PORT;
use dreamscreen::transport::ListenerId;
use dreamscreen::{
  AmbientMode, AmbientScene, Device, DeviceKind, Discovery, Emulator, EmulatorBuilder, Message, Mode, Rgb, Transport
};

pub struct App {
  // The endpoint shared by discovery, device commands and the emulator
  transport: Transport,

  // Devices found by the last `list`, in the order they were printed
  devices: Vec<Device>,

  // The emulator running in the background, if any
  emulator: Option<Emulator>,

  // The traffic monitor's transport listener, while it runs
  monitor: Option<ListenerId>,

  discovery: Discovery
}

impl App {
  pub fn new( transport: Transport ) -> Self {
    return Self{ transport, devices: Vec::new(), emulator: None, monitor: None, discovery: Discovery::new() };
  }

  /// Overrides the discovery settings used by `list`.
  pub fn with_discovery( mut self, discovery: Discovery ) -> Self {
    self.discovery = discovery;
    return self;
  }

  pub fn devices( &self ) -> &[Device] {
    return &self.devices;
  }

  pub fn emulator( &self ) -> Option<&Emulator> {
    return self.emulator.as_ref();
  }

  pub fn is_monitoring( &self ) -> bool {
    return self.monitor.is_some();
  }

  pub fn prompt( &self ) -> String {
    match &self.emulator {
      Some( emulator ) => format!( "[{}]> ", emulator.name() ),
      None => "> ".to_string()
    }
  }

  pub async fn do_list_devices( &mut self ) {
    match self.discovery.discover( &self.transport ).await {
      Ok( devices ) => {
        let mut devices: Vec<Device> = devices.into_values().collect();
        devices.sort_by_key( |device| device.address() );
        self.devices = devices;
      },
      Err( err ) => {
        println!( "Discovery failed: {}", err );
        return;
      }
    }

    if self.devices.is_empty() {
      println!( "(no devices)" );
    } else {
      for ( index, device ) in self.devices.iter().enumerate() {
        println!( "  [{}] {}", index, summary( device ) );
      }
    }
  }

  /// Queries a single device directly and adds it to the list.
  pub async fn do_connect( &mut self, address: &str ) {
    let Some( device ) = self.connect( address ).await else { return };

    self.devices.retain( |known| known.address() != device.address() );
    self.devices.push( device );

    let index = self.devices.len() - 1;
    println!( "  [{}] {}", index, summary( &self.devices[index] ) );
  }

  pub fn do_print_device_info( &self, index: usize ) {
    match self.devices.get( index ) {
      Some( device ) => println!( "{}", device ),
      None => println!( "(does not exist)" )
    }
  }

  pub async fn do_set_mode( &mut self, index: usize, mode: &str ) {
    let Some( mode ) = parse_mode( mode ) else {
      println!( "Unknown mode: {}", mode );
      return;
    };

    if let Some( device ) = self.device_mut( index ) {
      report( device.set_mode( mode ).await );
    }
  }

  pub async fn do_set_brightness( &mut self, index: usize, brightness: u8 ) {
    if let Some( device ) = self.device_mut( index ) {
      report( device.set_brightness( brightness, true ).await );
    }
  }

  pub async fn do_set_color( &mut self, index: usize, color: Rgb ) {
    if let Some( device ) = self.device_mut( index ) {
      report( device.set_ambient_mode( AmbientMode::Rgb ).await );
      report( device.set_ambient_color( color, true ).await );
    }
  }

  pub async fn do_set_scene( &mut self, index: usize, scene: &str ) {
    let Some( scene ) = parse_scene( scene ) else {
      println!( "Unknown scene: {}", scene );
      return;
    };

    if let Some( device ) = self.device_mut( index ) {
      report( device.set_ambient_mode( AmbientMode::Scene ).await );
      report( device.set_ambient_scene( scene ).await );
    }
  }

  pub async fn do_set_name( &mut self, index: usize, name: &str ) {
    if let Some( device ) = self.device_mut( index ) {
      report( device.set_name( name ).await );
    }
  }

  /// Selects HDMI `input` (1-3) on an HD or 4K.
  pub async fn do_set_hdmi_input( &mut self, index: usize, input: u8 ) {
    if let Some( device ) = self.device_mut( index ) {
      report( device.set_hdmi_input( input ).await );
    }
  }

  pub async fn do_set_hdmi_name( &mut self, index: usize, input: usize, name: &str ) {
    if let Some( device ) = self.device_mut( index ) {
      report( device.set_hdmi_name( input, name ).await );
    }
  }

  /// Starts an emulator of `kind` on the shared transport, replacing any
  /// running one.
  pub fn do_emulate( &mut self, kind: &str, name: Option<&str> ) {
    let Some( kind ) = parse_kind( kind ) else {
      println!( "Unknown device kind: {}", kind );
      return;
    };

    self.do_stop_emulator();

    let mut builder = EmulatorBuilder::new( kind );
    if let Some( name ) = name {
      builder = builder.name( name );
    }

    let emulator = builder.build( self.transport.clone() );
    match emulator.start() {
      Ok(()) => {
        log::debug!( "Emulator listening on {:?}", self.transport.local_address() );
        println!( "Emulating {} \"{}\"", kind, emulator.name() );
        self.emulator = Some( emulator );
      },
      Err( err ) => println!( "Failed to start the emulator: {}", err )
    }
  }

  pub fn do_stop_emulator( &mut self ) {
    if let Some( emulator ) = self.emulator.take() {
      emulator.stop();
    }
  }

  /// Copies the settings of the device at `address` into the running
  /// emulator.
  pub async fn do_replicate( &mut self, address: &str ) {
    let Some( emulator ) = self.emulator.clone() else {
      println!( "(no emulator running)" );
      return;
    };

    if let Some( device ) = self.connect( address ).await {
      emulator.replicate( device.snapshot() ).await;
      println!( "Replicated \"{}\"", device.name() );
    }
  }

  /// Starts printing every frame on the transport, or stops if already
  /// running. With `hex` each line ends with the raw frame.
  pub fn do_monitor( &mut self, hex: bool ) {
    if let Some( id ) = self.monitor.take() {
      self.transport.remove_listener( id );
      println!( "Monitor stopped" );
      return;
    }

    match self.transport.add_listener( move | message, source | println!( "{}", describe_frame( message, source, hex ) ) ) {
      Ok( id ) => {
        self.monitor = Some( id );
        println!( "Monitoring on {:?} (run `monitor` again to stop)", self.transport.local_address() );
      },
      Err( err ) => println!( "Failed to start the monitor: {}", err )
    }
  }

  async fn connect( &self, address: &str ) -> Option<Device> {
    let Some( target ) = parse_address( address ) else {
      println!( "Invalid address: {}", address );
      return None;
    };

    match dreamscreen::connect( &self.transport, target ).await {
      Ok( device ) => Some( device ),
      Err( err ) => {
        println!( "Could not connect to {}: {}", target, err );
        None
      }
    }
  }

  fn device_mut( &mut self, index: usize ) -> Option<&mut Device> {
    let device = self.devices.get_mut( index );
    if device.is_none() {
      println!( "(does not exist)" );
    }

    return device;
  }
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Helpers

fn summary( device: &Device ) -> String {
  format!(
    "{} ({}) at {}, group {} \"{}\"",
    device.name(), device.kind(), address_label( device.address() ), device.group_number(), device.group_name()
  )
}

fn address_label( address: SocketAddr ) -> String {
  if address.port() == DREAMSCREEN_PORT {
    address.ip().to_string()
  } else {
    address.to_string()
  }
}

fn report<E: std::fmt::Display>( result: Result<(),E> ) {
  if let Err( err ) = result {
    println!( "Error: {}", err );
  }
}

/// One line describing a received frame field by field.
pub fn describe_frame( message: &Message, source: SocketAddr, hex: bool ) -> String {
  let mut line = format!(
    "{} -> group 0x{:02X} | upper 0x{:02X} | lower 0x{:02X} | flags 0x{:02X}",
    source, message.group_address(), message.command_upper(), message.command_lower(), message.flags()
  );

  if ! message.payload().is_empty() {
    line.push_str( &format!( " | payload 0x{} ({:?})", to_hex( message.payload() ), String::from_utf8_lossy( message.payload() ) ) );
  }

  line.push_str( &format!( " | {:?}", message.command() ) );

  if hex {
    line.push_str( &format!( " | 0x{}", to_hex( &message.encode() ) ) );
  }

  return line;
}

fn to_hex( bytes: &[u8] ) -> String {
  return bytes.iter().map( |b| format!( "{:02X}", b ) ).collect();
}

/// An IP address, or an IP address and port. The port defaults to 8888.
pub fn parse_address( text: &str ) -> Option<SocketAddr> {
  if let Ok( address ) = text.parse::<SocketAddr>() {
    return Some( address );
  }

  return text.parse::<IpAddr>().ok().map( |ip| SocketAddr::new( ip, DREAMSCREEN_PORT ) );
}

pub fn parse_mode( text: &str ) -> Option<Mode> {
  match text.to_ascii_lowercase().as_str() {
    "sleep" | "off" => Some( Mode::Sleep ),
    "video" => Some( Mode::Video ),
    "music" => Some( Mode::Music ),
    "ambient" => Some( Mode::Ambient ),
    _ => None
  }
}

pub fn parse_kind( text: &str ) -> Option<DeviceKind> {
  match text.to_ascii_lowercase().as_str() {
    "hd" => Some( DeviceKind::Hd ),
    "4k" => Some( DeviceKind::FourK ),
    "sidekick" => Some( DeviceKind::SideKick ),
    _ => None
  }
}

pub fn parse_scene( text: &str ) -> Option<AmbientScene> {
  let scene = match text.to_ascii_lowercase().replace( ['-', '_', ' '], "" ).as_str() {
    "random" | "randomcolor" => AmbientScene::RandomColor,
    "fireside" => AmbientScene::Fireside,
    "twinkle" => AmbientScene::Twinkle,
    "ocean" => AmbientScene::Ocean,
    "rainbow" => AmbientScene::Rainbow,
    "july4th" => AmbientScene::July4th,
    "holiday" => AmbientScene::Holiday,
    "pop" => AmbientScene::Pop,
    "forest" | "enchantedforest" => AmbientScene::EnchantedForest,
    _ => return None
  };

  return Some( scene );
}
