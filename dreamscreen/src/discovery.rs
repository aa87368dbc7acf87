use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Duration;

use crate::device::Device;
use crate::message::{ Command, Message };
use crate::transport::{ ListenerId, Transport };

pub type DeviceMap = HashMap<SocketAddr,Device>;

const DEFAULT_RETRIES: usize = 3;
const DEFAULT_INTERVAL: Duration = Duration::from_millis( 500 );
const DEFAULT_GRACE: Duration = Duration::from_secs( 1 );
const CONNECT_TIMEOUT: Duration = Duration::from_secs( 1 );

// Unregisters a listener when dropped, so that every exit path releases the
// transport.
struct ListenerGuard<'a> {
  transport: &'a Transport,
  id: ListenerId
}

impl Drop for ListenerGuard<'_> {
  fn drop( &mut self ) {
    self.transport.remove_listener( self.id );
  }
}

fn parse_reply( message: &Message, address: SocketAddr ) -> Option<Device> {
  if message.command() != Command::CurrentState {
    return None;
  }

  match Device::parse( message, address ) {
    Ok( device ) => Some( device ),
    Err( err ) => {
      log::warn!( "Skipping device at {}: {}", address, err );
      None
    }
  }
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Discovery

/// Broadcasts current state requests and collects every reply.
#[derive( Clone, Copy, Debug )]
pub struct Discovery {
  /// How many times the query is broadcast. Defaults to 3.
  retries: usize,

  /// The delay between two broadcasts. Defaults to 500ms.
  interval: Duration,

  /// How long replies are still collected after the last broadcast.
  grace: Duration
}

impl Default for Discovery {
  fn default() -> Self {
    return Self{ retries: DEFAULT_RETRIES, interval: DEFAULT_INTERVAL, grace: DEFAULT_GRACE };
  }
}

impl Discovery {
  pub fn new() -> Self {
    return Self::default();
  }

  pub fn retries( mut self, retries: usize ) -> Self {
    self.retries = retries.max( 1 );
    return self;
  }

  pub fn interval( mut self, interval: Duration ) -> Self {
    self.interval = interval;
    return self;
  }

  pub fn grace( mut self, grace: Duration ) -> Self {
    self.grace = grace;
    return self;
  }

  /// Runs discovery on `transport` and returns the devices found, keyed by
  /// their address.
  pub async fn discover( self, transport: &Transport ) -> io::Result<DeviceMap> {
    return self.discover_with( transport, |_, _| {} ).await;
  }

  /// Like `discover`, also calling `callback_fn` once for each new device as
  /// its first reply arrives.
  pub async fn discover_with<T>( self, transport: &Transport, callback_fn: T ) -> io::Result<DeviceMap>
    where T: Fn( SocketAddr, &Device ) + Send + Sync + 'static
  {
    let devices = Arc::new( Mutex::new( DeviceMap::new() ) );

    let id = transport.add_listener({
      let devices = devices.clone();

      move | message, address | {
        if let Some( device ) = parse_reply( message, address ) {
          let mut devices = devices.lock();

          match devices.get_mut( &address ) {
            Some( known ) => known.update( device.snapshot().clone() ),
            None => {
              callback_fn( address, &device );
              devices.insert( address, device );
            }
          }
        }
      }
    })?;

    let _guard = ListenerGuard{ transport, id };
    let query = Message::current_state_request();

    for attempt in 0..self.retries {
      if attempt > 0 {
        tokio::time::sleep( self.interval ).await;
      }

      if let Err( err ) = transport.send_broadcast( &query ).await {
        log::warn!( "Discovery broadcast failed: {}", err );
      }
    }

    tokio::time::sleep( self.grace ).await;

    let devices = std::mem::take( &mut *devices.lock() );
    log::debug!( "Discovered {} device(s)", devices.len() );

    return Ok( devices );
  }
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Connect

/// Queries the device at `address` directly and returns the first reply.
/// Gives up after 3 unanswered attempts of 1 second each.
pub async fn connect( transport: &Transport, address: SocketAddr ) -> io::Result<Device> {
  let ( tx, mut rx ) = mpsc::unbounded_channel();

  let id = transport.add_listener( move | message, source | {
    if source.ip() == address.ip() {
      if let Some( device ) = parse_reply( message, source ) {
        let _ = tx.send( device );
      }
    }
  })?;

  let _guard = ListenerGuard{ transport, id };
  let query = Message::current_state_request();

  for _ in 0..DEFAULT_RETRIES {
    transport.send_unicast( &query, address ).await?;

    if let Ok( Some( device ) ) = tokio::time::timeout( CONNECT_TIMEOUT, rx.recv() ).await {
      return Ok( device );
    }
  }

  return Err( io::Error::new( io::ErrorKind::TimedOut, format!( "no reply from {}", address ) ) );
}
