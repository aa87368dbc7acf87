//! Producers of screen colors. An emulator starts its sampler when it enters
//! video mode and stops it when it leaves.
use std::sync::{ Arc, Weak };

use tokio::task::JoinHandle;
use tokio::time::Duration;

use crate::color::ScreenColor;
use crate::emulator::subscription::STREAM_INTERVAL;
use crate::emulator::{ Emulator, Inner };

/// A weak handle through which a sampler feeds an emulator. It does not keep
/// the emulator alive.
#[derive( Clone )]
pub struct EmulatorHandle {
  inner: Weak<Inner>
}

impl EmulatorHandle {
  pub(crate) fn new( inner: Weak<Inner> ) -> Self {
    return Self{ inner };
  }

  pub fn upgrade( &self ) -> Option<Emulator> {
    return self.inner.upgrade().map( Emulator::from_inner );
  }

  /// Pushes a frame into the emulator. Returns `false` once the emulator is
  /// gone.
  pub async fn set_screen_colors( &self, screen: ScreenColor ) -> bool {
    match self.upgrade() {
      Some( emulator ) => {
        emulator.set_screen_colors( screen ).await;
        true
      },
      None => false
    }
  }
}

pub trait ScreenSampler: Send {
  /// Called once, when the sampler is attached to an emulator.
  fn init( &mut self, handle: EmulatorHandle );

  fn start( &mut self );

  fn stop( &mut self );
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Pattern Sampler

/// Generates frames from a function of the frame number, at roughly 60 frames
/// per second. Stands in for screen capture in tools and tests.
pub struct PatternSampler<F> {
  pattern: Arc<F>,
  interval: Duration,
  handle: Option<EmulatorHandle>,
  task: Option<JoinHandle<()>>
}

impl<F> PatternSampler<F>
  where F: Fn( u64 ) -> ScreenColor + Send + Sync + 'static
{
  pub fn new( pattern: F ) -> Self {
    return Self{ pattern: Arc::new( pattern ), interval: STREAM_INTERVAL, handle: None, task: None };
  }

  pub fn interval( mut self, interval: Duration ) -> Self {
    self.interval = interval;
    return self;
  }
}

impl<F> ScreenSampler for PatternSampler<F>
  where F: Fn( u64 ) -> ScreenColor + Send + Sync + 'static
{
  fn init( &mut self, handle: EmulatorHandle ) {
    self.handle = Some( handle );
  }

  fn start( &mut self ) {
    if self.task.as_ref().is_some_and( |task| ! task.is_finished() ) {
      return;
    }

    let Some( handle ) = self.handle.clone() else {
      log::warn!( "Sampler started before it was attached to an emulator" );
      return;
    };

    let pattern = self.pattern.clone();
    let interval = self.interval;

    self.task = Some( tokio::spawn( async move {
      for frame in 0u64.. {
        if ! handle.set_screen_colors( pattern( frame ) ).await {
          break;
        }

        tokio::time::sleep( interval ).await;
      }
    }));
  }

  fn stop( &mut self ) {
    if let Some( task ) = self.task.take() {
      task.abort();
    }
  }
}

impl<F> Drop for PatternSampler<F> {
  fn drop( &mut self ) {
    if let Some( task ) = self.task.take() {
      task.abort();
    }
  }
}
