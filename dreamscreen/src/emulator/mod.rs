//! A software DreamScreen device. An emulator answers discovery, obeys
//! commands from the official app and real devices, and (as an HD or 4K)
//! streams screen colors to subscribed SideKicks.
//!
//! All state lives behind one lock. Inbound commands are funneled through a
//! single dispatcher task; local API calls take the same lock, so the field
//! set has one writer at a time.
mod sampler;
mod state;
mod subscription;

use std::io;
use std::net::SocketAddr;
use std::sync::{ Arc, Weak };

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Duration;

use crate::color::{ Rgb, ScreenColor };
use crate::constants::{ FLAG_BROADCAST_TO_GROUP, FLAG_UNICAST, GROUP_ALL, GROUP_NONE };
use crate::current_state::{ DeviceSnapshot, HdmiSettings };
use crate::error::EmulatorError;
use crate::message::{ Command, Message };
use crate::transport::{ ListenerId, Transport };
use crate::types::{ AmbientMode, AmbientScene, DeviceKind, HdmiActiveChannels, Mode };
use crate::wrappers::*;

use state::{ EmulatorState, Effects };
use subscription::{ RateLimiter, Subscribers };

pub use sampler::{ EmulatorHandle, PatternSampler, ScreenSampler };
pub use subscription::{ SubscribedDevice, MAX_MISSED_RENEWALS, STREAM_INTERVAL, SUBSCRIPTION_INTERVAL };

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Builder

pub struct EmulatorBuilder {
  snapshot: DeviceSnapshot,
  ambient_mode: AmbientMode,
  sampler: Option<Box<dyn ScreenSampler>>,
  subscription_interval: Duration
}

impl EmulatorBuilder {
  /// Starts from the factory defaults of `kind`.
  pub fn new( kind: DeviceKind ) -> Self {
    Self{
      snapshot: EmulatorState::defaults( kind ),
      ambient_mode: AmbientMode::Rgb,
      sampler: None,
      subscription_interval: SUBSCRIPTION_INTERVAL
    }
  }

  pub fn name( mut self, name: &str ) -> Self {
    self.snapshot.name = crate::current_state::truncate_name( name ).to_string();
    return self;
  }

  pub fn group_name( mut self, name: &str ) -> Self {
    self.snapshot.group_name = crate::current_state::truncate_name( name ).to_string();
    return self;
  }

  pub fn group_number( mut self, group_number: u8 ) -> Self {
    self.snapshot.group_number = group_number;
    return self;
  }

  pub fn mode( mut self, mode: Mode ) -> Self {
    self.snapshot.mode = mode;
    return self;
  }

  /// Values above 100 are clamped.
  pub fn brightness( mut self, brightness: u8 ) -> Self {
    self.snapshot.brightness = brightness.min( 100 );
    return self;
  }

  pub fn ambient_color( mut self, color: Rgb ) -> Self {
    self.snapshot.ambient_color = color;
    return self;
  }

  pub fn ambient_mode( mut self, ambient_mode: AmbientMode ) -> Self {
    self.ambient_mode = ambient_mode;
    return self;
  }

  pub fn ambient_scene( mut self, scene: AmbientScene ) -> Self {
    self.snapshot.ambient_scene = scene;
    return self;
  }

  pub fn color_saturation( mut self, saturation: Rgb ) -> Self {
    self.snapshot.saturation = saturation;
    return self;
  }

  /// Sectors averaged by a SideKick. Ignored for other kinds.
  pub fn sectors( mut self, sectors: &[u8] ) -> Self {
    if self.snapshot.kind.is_compact() {
      self.snapshot.sectors = SectorSettingMessage::new( GROUP_NONE, sectors ).sectors();
    }
    return self;
  }

  /// HDMI settings of an HD or 4K. Ignored for a SideKick.
  pub fn hdmi( mut self, hdmi: HdmiSettings ) -> Self {
    if self.snapshot.hdmi.is_some() {
      self.snapshot.hdmi = Some( hdmi );
    }
    return self;
  }

  /// The screen color source driven while in video mode.
  pub fn sampler( mut self, sampler: impl ScreenSampler + 'static ) -> Self {
    self.sampler = Some( Box::new( sampler ) );
    return self;
  }

  /// Period of the subscription broadcast. Defaults to 5 seconds.
  pub fn subscription_interval( mut self, interval: Duration ) -> Self {
    self.subscription_interval = interval;
    return self;
  }

  /// Builds a stopped emulator on `transport`.
  pub fn build( self, transport: Transport ) -> Emulator {
    let inner = Arc::new( Inner{
      transport,
      state: Mutex::new( EmulatorState::new( self.snapshot, self.ambient_mode ) ),
      subscribers: Mutex::new( Subscribers::default() ),
      limiter: tokio::sync::Mutex::new( RateLimiter::new( STREAM_INTERVAL ) ),
      sampler: Mutex::new( None ),
      tasks: Mutex::new( Tasks::default() ),
      subscription_interval: self.subscription_interval
    });

    if let Some( mut sampler ) = self.sampler {
      sampler.init( EmulatorHandle::new( Arc::downgrade( &inner ) ) );
      *inner.sampler.lock() = Some( sampler );
    }

    return Emulator{ inner };
  }
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Emulator

#[derive( Clone )]
pub struct Emulator {
  inner: Arc<Inner>
}

pub(crate) struct Inner {
  transport: Transport,
  state: Mutex<EmulatorState>,
  subscribers: Mutex<Subscribers>,
  limiter: tokio::sync::Mutex<RateLimiter>,
  sampler: Mutex<Option<Box<dyn ScreenSampler>>>,
  tasks: Mutex<Tasks>,
  subscription_interval: Duration
}

#[derive( Default )]
struct Tasks {
  listener: Option<ListenerId>,
  dispatcher: Option<JoinHandle<()>>,
  broadcaster: Option<JoinHandle<()>>
}

impl Inner {
  fn shutdown( &self ) {
    let tasks = std::mem::take( &mut *self.tasks.lock() );

    if let Some( id ) = tasks.listener {
      self.transport.remove_listener( id );
    }

    for task in [ tasks.dispatcher, tasks.broadcaster ].into_iter().flatten() {
      task.abort();
    }

    if let Some( sampler ) = self.sampler.lock().as_mut() {
      sampler.stop();
    }

    self.subscribers.lock().clear();
  }
}

impl Drop for Inner {
  fn drop( &mut self ) {
    self.shutdown();
  }
}

impl Emulator {
  pub fn builder( kind: DeviceKind ) -> EmulatorBuilder {
    return EmulatorBuilder::new( kind );
  }

  pub(crate) fn from_inner( inner: Arc<Inner> ) -> Self {
    return Self{ inner };
  }

  pub fn transport( &self ) -> &Transport {
    return &self.inner.transport;
  }

  /// Registers with the transport and starts the background tasks. Must be
  /// called from within a tokio runtime. Starting twice is a no-op.
  pub fn start( &self ) -> io::Result<()> {
    {
      let mut tasks = self.inner.tasks.lock();
      if tasks.listener.is_some() {
        return Ok(());
      }

      let ( tx, rx ) = mpsc::unbounded_channel();
      let id = self.inner.transport.add_listener( move | message, source | {
        let _ = tx.send( ( message.clone(), source ) );
      })?;

      tasks.listener = Some( id );
      tasks.dispatcher = Some( tokio::spawn( dispatch( rx, Arc::downgrade( &self.inner ) ) ) );
    }

    let ( kind, name, group, mode ) = {
      let state = self.inner.state.lock();
      ( state.kind(), state.snapshot.name.clone(), state.group(), state.mode() )
    };

    if group != GROUP_NONE {
      self.start_broadcaster();
    }

    if mode == Mode::Video {
      self.drive_sampler( true );
    }

    log::info!( "Emulating {} \"{}\" in group {}", kind, name, group );
    return Ok(());
  }

  /// Unregisters from the transport and cancels the background tasks.
  pub fn stop( &self ) {
    self.inner.shutdown();
    log::info!( "Emulator \"{}\" stopped", self.inner.state.lock().snapshot.name );
  }

  pub fn is_running( &self ) -> bool {
    return self.inner.tasks.lock().listener.is_some();
  }

  // - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Getters

  pub fn kind( &self ) -> DeviceKind {
    return self.inner.state.lock().kind();
  }

  pub fn snapshot( &self ) -> DeviceSnapshot {
    return self.inner.state.lock().snapshot.clone();
  }

  pub fn name( &self ) -> String {
    return self.inner.state.lock().snapshot.name.clone();
  }

  pub fn group_name( &self ) -> String {
    return self.inner.state.lock().snapshot.group_name.clone();
  }

  pub fn group_number( &self ) -> u8 {
    return self.inner.state.lock().group();
  }

  pub fn mode( &self ) -> Mode {
    return self.inner.state.lock().mode();
  }

  pub fn brightness( &self ) -> u8 {
    return self.inner.state.lock().snapshot.brightness;
  }

  pub fn ambient_color( &self ) -> Rgb {
    return self.inner.state.lock().snapshot.ambient_color;
  }

  pub fn ambient_mode( &self ) -> AmbientMode {
    return self.inner.state.lock().ambient_mode;
  }

  pub fn ambient_scene( &self ) -> AmbientScene {
    return self.inner.state.lock().snapshot.ambient_scene;
  }

  pub fn color_saturation( &self ) -> Rgb {
    return self.inner.state.lock().snapshot.saturation;
  }

  pub fn hdmi( &self ) -> Option<HdmiSettings> {
    return self.inner.state.lock().snapshot.hdmi.clone();
  }

  pub fn sectors( &self ) -> Vec<u8> {
    return self.inner.state.lock().snapshot.sectors.clone();
  }

  /// The colors currently displayed, one per sector.
  pub fn screen( &self ) -> ScreenColor {
    return self.inner.state.lock().screen;
  }

  /// The color of the first sector. A SideKick shows a single color, so this
  /// is its whole display.
  pub fn display_color( &self ) -> Rgb {
    return self.inner.state.lock().screen.color( 1 );
  }

  /// Addresses currently receiving the color stream.
  pub fn subscribers( &self ) -> Vec<SocketAddr> {
    return self.inner.subscribers.lock().addresses();
  }

  // - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Setters

  pub async fn set_name( &self, name: &str ) {
    return self.update( |state, effects| state.set_name( name, true, effects ) ).await;
  }

  pub async fn set_group_name( &self, name: &str ) {
    return self.update( |state, effects| state.set_group_name( name, true, effects ) ).await;
  }

  pub async fn set_group_number( &self, group_number: u8 ) {
    return self.update( |state, effects| state.set_group_number( group_number, true, effects ) ).await;
  }

  pub async fn set_mode( &self, mode: Mode ) {
    return self.update( |state, effects| state.set_mode( mode, true, effects ) ).await;
  }

  /// Sets the brightness (`0..=100`).
  pub async fn set_brightness( &self, brightness: u8 ) -> Result<(),EmulatorError> {
    return self.update( |state, effects| state.set_brightness( brightness, true, effects ) ).await;
  }

  pub async fn set_ambient_color( &self, color: Rgb ) {
    return self.update( |state, effects| state.set_ambient_color( color, true, effects ) ).await;
  }

  pub async fn set_ambient_mode( &self, ambient_mode: AmbientMode ) {
    return self.update( |state, effects| state.set_ambient_mode( ambient_mode, true, effects ) ).await;
  }

  pub async fn set_ambient_scene( &self, scene: AmbientScene ) {
    return self.update( |state, effects| state.set_ambient_scene( scene, true, effects ) ).await;
  }

  pub async fn set_color_saturation( &self, saturation: Rgb ) {
    return self.update( |state, effects| state.set_color_saturation( saturation, true, effects ) ).await;
  }

  /// Selects HDMI `input` (`1..=3`).
  pub async fn set_hdmi_input( &self, input: u8 ) -> Result<(),EmulatorError> {
    if ! ( 1..=3 ).contains( &input ) {
      return Err( EmulatorError::OutOfRange{ field: "hdmi input", value: input as i64, min: 1, max: 3 } );
    }

    return self.update( |state, effects| state.set_hdmi_input( input - 1, true, effects ) ).await;
  }

  /// Renames HDMI `input` (`1..=3`).
  pub async fn set_hdmi_name( &self, input: usize, name: &str ) -> Result<(),EmulatorError> {
    return self.update( |state, effects| state.set_hdmi_name( input, name, true, effects ) ).await;
  }

  pub async fn set_hdmi_active_channels( &self, channels: HdmiActiveChannels ) -> Result<(),EmulatorError> {
    return self.update( |state, effects| state.set_hdmi_active_channels( channels, true, effects ) ).await;
  }

  /// Sets the sectors a SideKick averages. An empty list means all of them.
  pub async fn set_sectors( &self, sectors: &[u8] ) -> Result<(),EmulatorError> {
    return self.update( |state, effects| state.set_sectors( sectors, true, effects ) ).await;
  }

  /// Copies the settings of `other`, typically a real device found through
  /// discovery, without broadcasting them.
  pub async fn replicate( &self, other: &DeviceSnapshot ) {
    self.update( |state, effects| state.replicate( other, effects ) ).await;
    log::debug!( "Replicated \"{}\"", other.name );
  }

  /// Feeds a frame of screen colors. HD and 4K emulators forward it to their
  /// subscribers, no faster than one batch every 16ms.
  pub async fn set_screen_colors( &self, screen: ScreenColor ) {
    let message = self.inner.state.lock().set_screen_colors( screen );
    let Some( message ) = message else { return };

    let subscribers = self.inner.subscribers.lock().addresses();
    if subscribers.is_empty() {
      return;
    }

    let mut limiter = self.inner.limiter.lock().await;

    for address in subscribers {
      if let Err( err ) = self.inner.transport.send_to( &message, address ).await {
        log::warn!( "Streaming to {} failed: {}", address, err );
      }
    }

    limiter.wait().await;
  }

  // - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Internals

  async fn update<T>( &self, apply: impl FnOnce( &mut EmulatorState, &mut Effects ) -> T ) -> T {
    let mut effects = Effects::default();
    let result = {
      let mut state = self.inner.state.lock();
      apply( &mut *state, &mut effects )
    };

    self.run_effects( effects ).await;
    return result;
  }

  async fn run_effects( &self, effects: Effects ) {
    if self.is_running() {
      if let Some( start ) = effects.sampler {
        self.drive_sampler( start );
      }

      match effects.broadcaster {
        Some( true ) => self.start_broadcaster(),
        Some( false ) => self.stop_broadcaster(),
        None => {}
      }
    }

    // A stopped emulator is offline
    if ! self.is_running() {
      return;
    }

    for update in effects.updates {
      log::trace!( "Update: {}", update );

      if let Err( err ) = self.inner.transport.send_broadcast( &update ).await {
        log::warn!( "Update broadcast failed: {}", err );
      }
    }
  }

  fn drive_sampler( &self, start: bool ) {
    if let Some( sampler ) = self.inner.sampler.lock().as_mut() {
      if start { sampler.start() } else { sampler.stop() }
    }
  }

  fn start_broadcaster( &self ) {
    if self.kind().is_compact() {
      return;
    }

    let mut tasks = self.inner.tasks.lock();
    if tasks.broadcaster.as_ref().is_some_and( |task| ! task.is_finished() ) {
      return;
    }

    let period = self.inner.subscription_interval;
    tasks.broadcaster = Some( tokio::spawn( broadcast_subscriptions( Arc::downgrade( &self.inner ), period ) ) );
  }

  fn stop_broadcaster( &self ) {
    if let Some( task ) = self.inner.tasks.lock().broadcaster.take() {
      task.abort();
    }

    self.inner.subscribers.lock().clear();
  }

  // - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Inbound

  async fn handle( &self, message: Message, source: SocketAddr ) {
    let ( group, kind ) = {
      let state = self.inner.state.lock();
      ( state.group(), state.kind() )
    };

    if ! accepts( group, &message ) {
      log::trace!( "Ignoring message for group {} from {}", message.group_address(), source );
      return;
    }

    // Our own update broadcasts loop back on a shared network. Queries are
    // still answered so that a client on the same transport finds us.
    if message.command() != Command::CurrentStateRequest && self.inner.transport.is_own_address( source ) {
      log::trace!( "Ignoring our own {:?}", message.command() );
      return;
    }

    match message.command() {
      Command::CurrentStateRequest => {
        let reply = self.inner.state.lock().current_state().into_message();
        if let Err( err ) = self.inner.transport.send_to( &reply, source ).await {
          log::warn!( "Current state reply to {} failed: {}", source, err );
        }
      },

      Command::SubscriptionRequest => {
        if let Some( request ) = SubscriptionRequestMessage::from_message( message ) {
          self.handle_subscription( request, kind, group, source ).await;
        }
      },

      Command::ScreenSectorData => {
        if kind.is_compact() {
          if let Some( data ) = ScreenSectorDataMessage::from_message( message ) {
            self.set_screen_colors( data.screen() ).await;
          }
        }
      },

      _ => {
        let echo = message.flags() == FLAG_UNICAST;

        if let Err( err ) = self.update( |state, effects| apply_command( state, message, echo, effects ) ).await {
          log::warn!( "Dropping command from {}: {}", source, err );
        }
      }
    }
  }

  async fn handle_subscription( &self, request: SubscriptionRequestMessage, kind: DeviceKind, group: u8, source: SocketAddr ) {
    if kind.is_compact() {
      if ! request.is_acknowledgement() {
        let ack = request.acknowledgement().into_message();
        if let Err( err ) = self.inner.transport.send_to( &ack, source ).await {
          log::warn!( "Subscription acknowledgement to {} failed: {}", source, err );
        }
      }
    } else if request.is_acknowledgement() && group != GROUP_NONE && self.inner.subscribers.lock().acknowledge( source ) {
      log::info!( "{} subscribed", source );
    }
  }
}

/// Whether a message addressed to `message.group_address()` concerns a device
/// in `group`. Group broadcasts to group 0 are always ignored.
fn accepts( group: u8, message: &Message ) -> bool {
  match message.group_address() {
    GROUP_NONE => message.flags() != FLAG_BROADCAST_TO_GROUP,
    GROUP_ALL => true,
    address => address == group
  }
}

fn out_of_range( field: &'static str, message: &Message, max: i64 ) -> EmulatorError {
  let value = message.payload().first().copied().unwrap_or( 0 ) as i64;
  EmulatorError::OutOfRange{ field, value, min: 0, max }
}

/// Applies an inbound command to the state.
fn apply_command( state: &mut EmulatorState, message: Message, emit: bool, effects: &mut Effects ) -> Result<(),EmulatorError> {
  match message.command() {
    Command::GroupNumber => if let Some( m ) = GroupNumberMessage::from_message( message ) {
      state.set_group_number( m.group_number(), emit, effects );
    },

    Command::GroupName => if let Some( m ) = GroupNameMessage::from_message( message ) {
      state.set_group_name( &m.group_name(), emit, effects );
    },

    Command::DeviceName => if let Some( m ) = DeviceNameMessage::from_message( message ) {
      state.set_name( &m.device_name(), emit, effects );
    },

    Command::Mode => {
      let mode = ModeMessage::from_message( message.clone() ).and_then( |m| m.mode() );
      state.set_mode( mode.ok_or_else( || out_of_range( "mode", &message, 3 ) )?, emit, effects );
    },

    Command::Brightness => if let Some( m ) = BrightnessMessage::from_message( message ) {
      state.set_brightness( m.brightness(), emit, effects )?;
    },

    Command::AmbientColor => if let Some( m ) = AmbientColorMessage::from_message( message ) {
      state.set_ambient_color( m.color(), emit, effects );
    },

    Command::ColorSaturation => if let Some( m ) = ColorSaturationMessage::from_message( message ) {
      state.set_color_saturation( m.saturation(), emit, effects );
    },

    Command::AmbientMode => {
      let ambient_mode = AmbientModeMessage::from_message( message.clone() ).and_then( |m| m.ambient_mode() );
      state.set_ambient_mode( ambient_mode.ok_or_else( || out_of_range( "ambient mode", &message, 1 ) )?, emit, effects );
    },

    Command::AmbientScene => {
      let scene = AmbientSceneMessage::from_message( message.clone() ).and_then( |m| m.ambient_scene() );
      state.set_ambient_scene( scene.ok_or_else( || out_of_range( "ambient scene", &message, 8 ) )?, emit, effects );
    },

    Command::SectorSetting => if let Some( m ) = SectorSettingMessage::from_message( message ) {
      state.set_sectors( &m.sectors(), emit, effects )?;
    },

    Command::HdmiInput => if let Some( m ) = HdmiInputMessage::from_message( message ) {
      state.set_hdmi_input( m.input(), emit, effects )?;
    },

    Command::HdmiName1 | Command::HdmiName2 | Command::HdmiName3 => if let Some( m ) = HdmiNameMessage::from_message( message ) {
      state.set_hdmi_name( m.input(), &m.name(), emit, effects )?;
    },

    Command::HdmiActiveChannels => if let Some( m ) = HdmiActiveChannelsMessage::from_message( message ) {
      state.set_hdmi_active_channels( m.channels(), emit, effects )?;
    },

    Command::CurrentState | Command::HdmiInputStatus | Command::Unknown => {
      log::trace!( "Ignoring {:?}", message.command() );
    },

    // Handled by the emulator before the state lock is taken
    Command::CurrentStateRequest | Command::SubscriptionRequest | Command::ScreenSectorData => {}
  }

  return Ok(());
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -  Tasks

async fn dispatch( mut rx: mpsc::UnboundedReceiver<( Message, SocketAddr )>, inner: Weak<Inner> ) {
  while let Some( ( message, source ) ) = rx.recv().await {
    let Some( inner ) = inner.upgrade() else { break };
    Emulator::from_inner( inner ).handle( message, source ).await;
  }
}

/// Solicits and renews subscribers every `period` while the emulator is in a
/// group. Each cycle counts one missed renewal against every subscriber.
async fn broadcast_subscriptions( inner: Weak<Inner>, period: Duration ) {
  let mut interval = tokio::time::interval( period );

  loop {
    interval.tick().await;

    let Some( emulator ) = inner.upgrade() else { break };

    let group = emulator.state.lock().group();
    if group == GROUP_NONE {
      break;
    }

    let expired = emulator.subscribers.lock().tick();
    for address in expired {
      log::info!( "{} unsubscribed after {} missed renewals", address, MAX_MISSED_RENEWALS );
    }

    let request = SubscriptionRequestMessage::request( group ).into_message();
    if let Err( err ) = emulator.transport.send_broadcast( &request ).await {
      log::warn!( "Subscription broadcast failed: {}", err );
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::constants::{ FLAG_QUERY, FLAG_UNICAST_LOCAL };

  fn message( group: u8, flags: u8 ) -> Message {
    let mut message = BrightnessMessage::new( group, 50 ).into_message();
    message.set_flags( flags );
    message
  }

  #[test]
  fn accepts_its_own_group_and_everyone() {
    assert!( accepts( 3, &message( 3, FLAG_BROADCAST_TO_GROUP ) ) );
    assert!( accepts( 3, &message( GROUP_ALL, FLAG_QUERY ) ) );
    assert!( ! accepts( 3, &message( 4, FLAG_UNICAST ) ) );
  }

  #[test]
  fn ignores_group_broadcasts_to_group_zero() {
    assert!( accepts( 0, &message( 0, FLAG_UNICAST ) ) );
    assert!( accepts( 5, &message( 0, FLAG_UNICAST_LOCAL ) ) );
    assert!( ! accepts( 0, &message( 0, FLAG_BROADCAST_TO_GROUP ) ) );
  }

  #[test]
  fn inbound_commands_echo_only_when_asked() {
    let mut state = EmulatorState::new( EmulatorState::defaults( DeviceKind::Hd ), AmbientMode::Rgb );

    let mut effects = Effects::default();
    apply_command( &mut state, message( 0, FLAG_UNICAST ), false, &mut effects ).unwrap();
    assert!( effects.updates.is_empty() );
    assert_eq!( state.snapshot.brightness, 50 );

    let mut effects = Effects::default();
    apply_command( &mut state, AmbientColorMessage::new( 0, Rgb::WHITE ).into_message(), true, &mut effects ).unwrap();
    assert_eq!( effects.updates.len(), 1 );
    assert_eq!( effects.updates[0].flags(), FLAG_BROADCAST_TO_GROUP );
  }

  #[test]
  fn unknown_modes_are_rejected() {
    let mut state = EmulatorState::new( EmulatorState::defaults( DeviceKind::SideKick ), AmbientMode::Rgb );
    let mut mode = ModeMessage::new( 0, Mode::Video ).into_message();
    mode.set_payload( vec![ 9 ] );

    let result = apply_command( &mut state, mode, false, &mut Effects::default() );
    assert_eq!( result, Err( EmulatorError::OutOfRange{ field: "mode", value: 9, min: 0, max: 3 } ) );
    assert_eq!( state.mode(), Mode::Sleep );
  }
}
