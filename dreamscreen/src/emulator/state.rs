//! The emulator's field set and its mode state machine. Every mutation takes
//! an `emit` switch and records its consequences in `Effects`; the caller
//! performs them once the state lock is released.
use crate::color::{ Rgb, ScreenColor };
use crate::constants::{ GROUP_NONE, SCREEN_SECTOR_COUNT };
use crate::current_state::{ self, DeviceSnapshot, HdmiSettings };
use crate::error::EmulatorError;
use crate::message::Message;
use crate::types::{ AmbientMode, AmbientScene, DeviceKind, HdmiActiveChannels, Mode };
use crate::wrappers::*;

/// Work left over after a state change.
#[derive( Debug, Default )]
pub(crate) struct Effects {
  /// Update messages to broadcast to the group.
  pub updates: Vec<Message>,

  /// `Some( true )` to start the sampler, `Some( false )` to stop it.
  pub sampler: Option<bool>,

  /// `Some( true )` to start the subscription broadcaster, `Some( false )` to
  /// stop it.
  pub broadcaster: Option<bool>
}

#[derive( Clone, Debug )]
pub(crate) struct EmulatorState {
  pub snapshot: DeviceSnapshot,
  pub ambient_mode: AmbientMode,
  pub screen: ScreenColor
}

impl EmulatorState {
  pub fn new( snapshot: DeviceSnapshot, ambient_mode: AmbientMode ) -> Self {
    let mut state = Self{ snapshot, ambient_mode, screen: ScreenColor::new() };
    if state.snapshot.mode == Mode::Ambient {
      state.render_ambient();
    }

    return state;
  }

  /// Factory defaults for an emulated `kind`.
  pub fn defaults( kind: DeviceKind ) -> DeviceSnapshot {
    let mut snapshot = DeviceSnapshot::new( kind );
    snapshot.name = "DSEmulator".into();
    snapshot.group_name = "undefined".into();
    return snapshot;
  }

  pub fn kind( &self ) -> DeviceKind {
    return self.snapshot.kind;
  }

  pub fn group( &self ) -> u8 {
    return self.snapshot.group_number;
  }

  pub fn mode( &self ) -> Mode {
    return self.snapshot.mode;
  }

  /// Whether this device streams screen colors to subscribers right now.
  pub fn is_streaming( &self ) -> bool {
    return ! self.kind().is_compact() && self.mode().is_streaming() && self.group() != GROUP_NONE;
  }

  pub fn current_state( &self ) -> CurrentStateMessage {
    return CurrentStateMessage::new( &self.snapshot );
  }

  /// Queues `message` as an update broadcast to the group.
  fn emit( &self, emit: bool, effects: &mut Effects, message: impl Into<Message> ) {
    if emit {
      let mut update = message.into();
      update.set_flags( Addressing::BroadcastToGroup.flags() );
      effects.updates.push( update );
    }
  }

  // - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Naming

  pub fn set_name( &mut self, name: &str, emit: bool, effects: &mut Effects ) {
    self.snapshot.name = current_state::truncate_name( name ).to_string();
    self.emit( emit, effects, DeviceNameMessage::new( self.group(), name ) );
  }

  pub fn set_group_name( &mut self, name: &str, emit: bool, effects: &mut Effects ) {
    self.snapshot.group_name = current_state::truncate_name( name ).to_string();
    self.emit( emit, effects, GroupNameMessage::new( self.group(), name ) );
  }

  /// Both update broadcasts are addressed to the group being left.
  pub fn set_group_number( &mut self, group_number: u8, emit: bool, effects: &mut Effects ) {
    let previous = self.snapshot.group_number;
    self.snapshot.group_number = group_number;

    self.emit( emit, effects, GroupNumberMessage::new( previous, group_number ) );
    self.emit( emit, effects, GroupNameMessage::new( previous, &self.snapshot.group_name ) );

    if ( previous == GROUP_NONE ) != ( group_number == GROUP_NONE ) {
      effects.broadcaster = Some( group_number != GROUP_NONE );
    }
  }

  // - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -  Modes

  pub fn set_mode( &mut self, mode: Mode, emit: bool, effects: &mut Effects ) {
    let previous = self.snapshot.mode;
    if previous == mode {
      return;
    }

    log::debug!( "{}: mode {:?} -> {:?}", self.snapshot.name, previous, mode );
    self.snapshot.mode = mode;

    if previous == Mode::Video {
      effects.sampler = Some( false );
    }

    match mode {
      Mode::Ambient => self.render_ambient(),
      Mode::Sleep | Mode::Music => self.screen.fill( Rgb::BLACK ),
      Mode::Video => effects.sampler = Some( true )
    }

    self.emit( emit, effects, ModeMessage::new( self.group(), mode ) );
  }

  pub fn set_ambient_mode( &mut self, ambient_mode: AmbientMode, emit: bool, effects: &mut Effects ) {
    if self.ambient_mode == ambient_mode {
      return;
    }

    self.ambient_mode = ambient_mode;
    if self.mode() == Mode::Ambient {
      self.render_ambient();
    }

    self.emit( emit, effects, AmbientModeMessage::new( self.group(), ambient_mode ) );
  }

  pub fn set_ambient_scene( &mut self, scene: AmbientScene, emit: bool, effects: &mut Effects ) {
    if self.snapshot.ambient_scene == scene {
      return;
    }

    self.snapshot.ambient_scene = scene;
    if self.mode() == Mode::Ambient && self.ambient_mode == AmbientMode::Scene {
      self.render_ambient();
    }

    self.emit( emit, effects, AmbientSceneMessage::new( self.group(), scene ) );
  }

  pub fn set_ambient_color( &mut self, color: Rgb, emit: bool, effects: &mut Effects ) {
    self.snapshot.ambient_color = color;
    if self.mode() == Mode::Ambient && self.ambient_mode == AmbientMode::Rgb {
      self.render_ambient();
    }

    self.emit( emit, effects, AmbientColorMessage::new( self.group(), color ) );
  }

  pub fn set_brightness( &mut self, brightness: u8, emit: bool, effects: &mut Effects ) -> Result<(),EmulatorError> {
    if brightness > 100 {
      return Err( EmulatorError::OutOfRange{ field: "brightness", value: brightness as i64, min: 0, max: 100 } );
    }

    self.snapshot.brightness = brightness;
    self.emit( emit, effects, BrightnessMessage::new( self.group(), brightness ) );
    return Ok(());
  }

  pub fn set_color_saturation( &mut self, saturation: Rgb, emit: bool, effects: &mut Effects ) {
    self.snapshot.saturation = saturation;
    self.emit( emit, effects, ColorSaturationMessage::new( self.group(), saturation ) );
  }

  /// Fills every sector with the ambient color or the scene's color.
  fn render_ambient( &mut self ) {
    let color = match self.ambient_mode {
      AmbientMode::Rgb => self.snapshot.ambient_color,
      AmbientMode::Scene => self.snapshot.ambient_scene.representative_color()
    };

    self.screen.fill( color );
  }

  // - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - HDMI

  fn hdmi_mut( &mut self ) -> Result<&mut HdmiSettings,EmulatorError> {
    return self.snapshot.hdmi.as_mut().ok_or( EmulatorError::Unsupported( "SideKick" ) );
  }

  /// Selects HDMI `input` (0-based).
  pub fn set_hdmi_input( &mut self, input: u8, emit: bool, effects: &mut Effects ) -> Result<(),EmulatorError> {
    if input > 2 {
      return Err( EmulatorError::OutOfRange{ field: "hdmi input", value: input as i64, min: 0, max: 2 } );
    }

    self.hdmi_mut()?.input = input;
    self.emit( emit, effects, HdmiInputMessage::new( self.group(), input ) );
    return Ok(());
  }

  /// Renames HDMI `input` (1-based).
  pub fn set_hdmi_name( &mut self, input: usize, name: &str, emit: bool, effects: &mut Effects ) -> Result<(),EmulatorError> {
    let message = HdmiNameMessage::new( self.group(), input, name )
      .ok_or( EmulatorError::OutOfRange{ field: "hdmi input", value: input as i64, min: 1, max: 3 } )?;

    self.hdmi_mut()?.names[input - 1] = current_state::truncate_name( name ).to_string();
    self.emit( emit, effects, message );
    return Ok(());
  }

  pub fn set_hdmi_active_channels( &mut self, channels: HdmiActiveChannels, emit: bool, effects: &mut Effects ) -> Result<(),EmulatorError> {
    self.hdmi_mut()?.active_channels = channels;
    self.emit( emit, effects, HdmiActiveChannelsMessage::new( self.group(), channels ) );
    return Ok(());
  }

  // - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Sectors

  /// Replaces the sectors a SideKick averages.
  pub fn set_sectors( &mut self, sectors: &[u8], emit: bool, effects: &mut Effects ) -> Result<(),EmulatorError> {
    if ! self.kind().is_compact() {
      return Err( EmulatorError::Unsupported( "HD and 4K devices" ) );
    }

    let message = SectorSettingMessage::new( self.group(), sectors );
    self.snapshot.sectors = message.sectors();
    self.emit( emit, effects, message );
    return Ok(());
  }

  /// Takes in a frame of screen colors, while in video or music mode only.
  /// HD and 4K devices display it as is and return the stream message for
  /// their subscribers. A SideKick shows the average of its configured
  /// sectors (all 12 when none are set).
  ///
  /// Frames arriving in other modes are dropped, so a sampler frame still in
  /// flight cannot overwrite an ambient fill or a sleep blank.
  pub fn set_screen_colors( &mut self, screen: ScreenColor ) -> Option<Message> {
    if ! self.mode().is_streaming() {
      log::trace!( "{}: dropping a frame in {:?} mode", self.snapshot.name, self.mode() );
      return None;
    }

    if self.kind().is_compact() {
      let sectors: Vec<usize> =
        if self.snapshot.sectors.is_empty() {
          ( 1..=SCREEN_SECTOR_COUNT ).collect()
        } else {
          self.snapshot.sectors.iter().map( |s| *s as usize ).collect()
        };

      self.screen.fill( screen.average_color( &sectors ) );
      return None;
    }

    self.screen = screen;
    self.is_streaming()
      .then( || ScreenSectorDataMessage::new( self.group(), &self.screen ).into_message() )
  }

  // - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Replicate

  /// Copies the settings of another device. Mode and group changes keep their
  /// side effects but nothing is broadcast.
  pub fn replicate( &mut self, other: &DeviceSnapshot, effects: &mut Effects ) {
    self.snapshot.name = other.name.clone();
    self.snapshot.group_name = other.group_name.clone();
    self.snapshot.brightness = other.brightness.min( 100 );
    self.snapshot.ambient_color = other.ambient_color;
    self.snapshot.ambient_scene = other.ambient_scene;
    self.snapshot.saturation = other.saturation;

    if let ( Some( mine ), Some( theirs ) ) = ( self.snapshot.hdmi.as_mut(), other.hdmi.as_ref() ) {
      *mine = theirs.clone();
    } else if self.kind().is_compact() && other.kind.is_compact() {
      self.snapshot.sectors = other.sectors.clone();
    }

    self.set_group_number( other.group_number, false, effects );

    if self.mode() == other.mode && other.mode == Mode::Ambient {
      self.render_ambient();
    } else {
      self.set_mode( other.mode, false, effects );
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::message::Command;

  fn hd() -> EmulatorState {
    EmulatorState::new( EmulatorState::defaults( DeviceKind::Hd ), AmbientMode::Rgb )
  }

  #[test]
  fn setting_the_current_mode_is_a_no_op() {
    let mut state = hd();
    let mut effects = Effects::default();

    state.set_mode( Mode::Sleep, true, &mut effects );
    assert!( effects.updates.is_empty() );
    assert_eq!( effects.sampler, None );
  }

  #[test]
  fn entering_and_leaving_video_drives_the_sampler() {
    let mut state = hd();

    let mut effects = Effects::default();
    state.set_mode( Mode::Video, true, &mut effects );
    assert_eq!( effects.sampler, Some( true ) );
    assert_eq!( effects.updates[0].command(), Command::Mode );

    let mut effects = Effects::default();
    state.set_mode( Mode::Music, true, &mut effects );
    assert_eq!( effects.sampler, Some( false ) );
  }

  #[test]
  fn entering_ambient_renders_the_scene() {
    let mut state = hd();
    let mut effects = Effects::default();
    state.set_ambient_mode( AmbientMode::Scene, false, &mut effects );
    state.set_ambient_scene( AmbientScene::Ocean, false, &mut effects );
    assert_eq!( state.screen, ScreenColor::new() );

    state.set_mode( Mode::Ambient, false, &mut effects );
    assert_eq!( state.screen, ScreenColor::filled( AmbientScene::Ocean.representative_color() ) );

    state.set_ambient_scene( AmbientScene::Pop, false, &mut effects );
    assert_eq!( state.screen.color( 5 ), AmbientScene::Pop.representative_color() );
    assert!( effects.updates.is_empty() );
  }

  #[test]
  fn brightness_is_range_checked_before_mutation() {
    let mut state = hd();
    let mut effects = Effects::default();

    assert!( state.set_brightness( 101, true, &mut effects ).is_err() );
    assert_eq!( state.snapshot.brightness, 100 );
    assert!( effects.updates.is_empty() );
  }

  #[test]
  fn group_changes_are_announced_to_the_previous_group() {
    let mut state = hd();
    let mut effects = Effects::default();
    state.set_group_number( 4, true, &mut effects );

    assert_eq!( effects.broadcaster, Some( true ) );
    assert_eq!( effects.updates.len(), 2 );
    assert!( effects.updates.iter().all( |m| m.group_address() == 0 ) );
    assert_eq!( effects.updates[1].command(), Command::GroupName );
  }

  #[test]
  fn sidekicks_average_only_while_streaming() {
    let mut state = EmulatorState::new( EmulatorState::defaults( DeviceKind::SideKick ), AmbientMode::Rgb );
    let mut screen = ScreenColor::new();
    screen.set_color( 1, Rgb::new( 120, 0, 0 ) );

    assert_eq!( state.set_screen_colors( screen ), None );
    assert_eq!( state.screen, ScreenColor::new() );

    state.set_mode( Mode::Music, false, &mut Effects::default() );
    state.set_screen_colors( screen );
    assert_eq!( state.screen.color( 1 ), Rgb::new( 10, 0, 0 ) );
  }

  #[test]
  fn frames_outside_video_and_music_are_dropped() {
    let mut state = hd();
    state.snapshot.group_number = 2;
    let red = ScreenColor::filled( Rgb::new( 200, 0, 0 ) );

    state.set_mode( Mode::Ambient, false, &mut Effects::default() );
    let ambient = state.screen;
    assert_eq!( state.set_screen_colors( red ), None );
    assert_eq!( state.screen, ambient );

    state.set_mode( Mode::Video, false, &mut Effects::default() );
    assert!( state.set_screen_colors( red ).is_some() );
    assert_eq!( state.screen, red );

    state.set_mode( Mode::Sleep, false, &mut Effects::default() );
    assert_eq!( state.set_screen_colors( red ), None );
    assert_eq!( state.screen, ScreenColor::new() );
  }

  #[test]
  fn hd_devices_have_no_sector_setting() {
    assert_eq!(
      hd().set_sectors( &[ 1 ], true, &mut Effects::default() ),
      Err( EmulatorError::Unsupported( "HD and 4K devices" ) )
    );
  }
}
