//! The UDP endpoint shared by the discovery client and the emulators. One
//! receive loop decodes every inbound datagram and fans it out to the
//! registered listeners.
use std::io;
use std::net::{ IpAddr, Ipv4Addr, SocketAddr };
use std::sync::atomic::{ AtomicU64, Ordering };
use std::sync::{ Arc, Weak };

use parking_lot::{ Mutex, RwLock };
use socket2::{ Domain, Protocol, SockAddr, Socket, Type };
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio::time::{ sleep, Duration };

use crate::constants::{ DREAMSCREEN_BUFFER_BYTES, DREAMSCREEN_PORT };
use crate::message::{ Codec, Message };

/// A callback invoked with every decoded inbound message and its source.
pub type Listener = dyn Fn( &Message, SocketAddr ) + Send + Sync;

#[derive( Clone, Copy, Debug, PartialEq, Eq, Hash )]
pub struct ListenerId( u64 );

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -  Config

#[derive( Clone, Copy, Debug )]
pub struct TransportConfig {
  /// The local address the receive loop binds. Defaults to `0.0.0.0:8888`.
  bind_address: SocketAddr,

  /// Where broadcasts are sent. Defaults to `255.255.255.255:8888`.
  broadcast_address: SocketAddr,

  /// Start the receive loop with the first listener and stop it with the last.
  auto_start_stop: bool,

  codec: Codec
}

impl Default for TransportConfig {
  fn default() -> Self {
    Self{
      bind_address: SocketAddr::new( IpAddr::V4( Ipv4Addr::UNSPECIFIED ), DREAMSCREEN_PORT ),
      broadcast_address: SocketAddr::new( IpAddr::V4( Ipv4Addr::BROADCAST ), DREAMSCREEN_PORT ),
      auto_start_stop: true,
      codec: Codec::default()
    }
  }
}

impl TransportConfig {
  pub fn new() -> Self {
    return Self::default();
  }

  pub fn bind_address( mut self, address: SocketAddr ) -> Self {
    self.bind_address = address;
    return self;
  }

  pub fn broadcast_address( mut self, address: SocketAddr ) -> Self {
    self.broadcast_address = address;
    return self;
  }

  pub fn auto_start_stop( mut self, enabled: bool ) -> Self {
    self.auto_start_stop = enabled;
    return self;
  }

  pub fn codec( mut self, codec: Codec ) -> Self {
    self.codec = codec;
    return self;
  }

  pub fn build( self ) -> Transport {
    return Transport::new( self );
  }
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Transport

#[derive( Clone )]
pub struct Transport {
  inner: Arc<Inner>
}

struct Inner {
  config: TransportConfig,
  listeners: RwLock<Vec<( ListenerId, Arc<Listener> )>>,
  next_listener_id: AtomicU64,
  receiver: Mutex<Option<Receiver>>
}

struct Receiver {
  socket: Arc<UdpSocket>,
  task: JoinHandle<()>,

  // Source addresses our own broadcasts arrive from
  own_addresses: Vec<SocketAddr>
}

impl Drop for Receiver {
  fn drop( &mut self ) {
    self.task.abort();
  }
}

impl Default for Transport {
  fn default() -> Self {
    return Self::new( TransportConfig::default() );
  }
}

impl Transport {
  pub fn new( config: TransportConfig ) -> Self {
    Self{
      inner: Arc::new( Inner{
        config,
        listeners: RwLock::new( Vec::new() ),
        next_listener_id: AtomicU64::new( 0 ),
        receiver: Mutex::new( None )
      })
    }
  }

  pub fn config( &self ) -> &TransportConfig {
    return &self.inner.config;
  }

  pub fn broadcast_address( &self ) -> SocketAddr {
    return self.inner.config.broadcast_address;
  }

  pub fn codec( &self ) -> Codec {
    return self.inner.config.codec;
  }

  /// The bound address of the running receive loop, if any.
  pub fn local_address( &self ) -> Option<SocketAddr> {
    return self.inner.receiver.lock().as_ref().and_then( |r| r.socket.local_addr().ok() );
  }

  /// Whether `source` is this endpoint, as seen by the receivers of its
  /// broadcasts.
  pub fn is_own_address( &self, source: SocketAddr ) -> bool {
    return self.inner.receiver.lock().as_ref().is_some_and( |r| r.own_addresses.contains( &source ) );
  }

  pub fn is_running( &self ) -> bool {
    return self.inner.receiver.lock().as_ref().is_some_and( |r| ! r.task.is_finished() );
  }

  /// Binds the endpoint and spawns the receive loop. Must be called from
  /// within a tokio runtime. Starting a running transport is a no-op.
  pub fn start( &self ) -> io::Result<SocketAddr> {
    let mut receiver = self.inner.receiver.lock();

    if let Some( running ) = receiver.as_ref() {
      if ! running.task.is_finished() {
        return running.socket.local_addr();
      }
    }

    let socket = Arc::new( UdpSocket::from_std( bind_socket( self.inner.config.bind_address )? )? );
    let local_address = socket.local_addr()?;
    let own_addresses = own_addresses( local_address, self.inner.config.broadcast_address );
    let task = tokio::spawn( receive_loop( socket.clone(), Arc::downgrade( &self.inner ) ) );

    log::debug!( "Transport listening on {}", local_address );
    *receiver = Some( Receiver{ socket, task, own_addresses } );

    return Ok( local_address );
  }

  /// Stops the receive loop and closes the endpoint.
  pub fn stop( &self ) {
    if let Some( receiver ) = self.inner.receiver.lock().take() {
      log::debug!( "Transport stopped" );
      drop( receiver );
    }
  }

  /// Registers `listener`. With auto start enabled, the receive loop is started
  /// if it is not running.
  pub fn add_listener<F>( &self, listener: F ) -> io::Result<ListenerId>
    where F: Fn( &Message, SocketAddr ) + Send + Sync + 'static
  {
    let id = ListenerId( self.inner.next_listener_id.fetch_add( 1, Ordering::Relaxed ) );
    let listener: Arc<Listener> = Arc::new( listener );
    self.inner.listeners.write().push( ( id, listener ) );

    if self.inner.config.auto_start_stop {
      if let Err( err ) = self.start() {
        self.inner.listeners.write().retain( |( other, _ )| *other != id );
        return Err( err );
      }
    }

    return Ok( id );
  }

  /// Unregisters a listener. With auto stop enabled, removing the last
  /// listener stops the receive loop.
  ///
  /// The receiver lock is held from the count check through the stop, so a
  /// listener added meanwhile either keeps the loop alive or restarts it.
  pub fn remove_listener( &self, id: ListenerId ) {
    let mut receiver = self.inner.receiver.lock();

    let remaining = {
      let mut listeners = self.inner.listeners.write();
      listeners.retain( |( other, _ )| *other != id );
      listeners.len()
    };

    if self.inner.config.auto_start_stop && remaining == 0 {
      if let Some( stopped ) = receiver.take() {
        log::debug!( "Transport stopped" );
        drop( stopped );
      }
    }
  }

  pub fn listener_count( &self ) -> usize {
    return self.inner.listeners.read().len();
  }

  /// Sends `message` to `target`, from the listening endpoint when it is
  /// running and from a transient socket otherwise.
  pub async fn send_to( &self, message: &Message, target: SocketAddr ) -> io::Result<()> {
    let bytes = self.inner.config.codec.encode( message );
    let socket = self.inner.receiver.lock().as_ref().map( |r| r.socket.clone() );

    match socket {
      Some( socket ) => socket.send_to( &bytes, target ).await.map( |_| () ),
      None => send_bytes_static( &bytes, target ).await
    }
  }

  pub async fn send_unicast( &self, message: &Message, target: SocketAddr ) -> io::Result<()> {
    return self.send_to( message, target ).await;
  }

  pub async fn send_broadcast( &self, message: &Message ) -> io::Result<()> {
    return self.send_to( message, self.inner.config.broadcast_address ).await;
  }

  /// Sends `message` from a transient socket on an ephemeral port, leaving
  /// the listening endpoint untouched.
  pub async fn send_static( &self, message: &Message, target: SocketAddr ) -> io::Result<()> {
    return send_bytes_static( &self.inner.config.codec.encode( message ), target ).await;
  }
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Helpers

fn bind_socket( address: SocketAddr ) -> io::Result<std::net::UdpSocket> {
  let socket = Socket::new( Domain::for_address( address ), Type::DGRAM, Some( Protocol::UDP ) )?;
  socket.set_reuse_address( true )?;
  socket.set_broadcast( true )?;
  socket.set_nonblocking( true )?;
  socket.bind( &SockAddr::from( address ) )?;

  return Ok( socket.into() );
}

/// The addresses a datagram sent from `local` appears to come from. A socket
/// bound to the unspecified address broadcasts from its outbound interface.
fn own_addresses( local: SocketAddr, broadcast: SocketAddr ) -> Vec<SocketAddr> {
  let mut own = vec![ local ];

  if local.ip().is_unspecified() {
    match outbound_ip( broadcast ) {
      Ok( ip ) => own.push( SocketAddr::new( ip, local.port() ) ),
      Err( err ) => log::debug!( "No outbound address towards {}: {}", broadcast, err )
    }
  }

  return own;
}

fn outbound_ip( target: SocketAddr ) -> io::Result<IpAddr> {
  let socket = Socket::new( Domain::for_address( target ), Type::DGRAM, Some( Protocol::UDP ) )?;
  socket.set_broadcast( true )?;
  socket.connect( &SockAddr::from( target ) )?;

  socket.local_addr()?
    .as_socket()
    .map( |address| address.ip() )
    .ok_or_else( || io::Error::other( "not an inet address" ) )
}

pub(crate) async fn send_bytes_static( bytes: &[u8], target: SocketAddr ) -> io::Result<()> {
  let local = match target {
    SocketAddr::V4( _ ) => SocketAddr::new( IpAddr::V4( Ipv4Addr::UNSPECIFIED ), 0 ),
    SocketAddr::V6( _ ) => SocketAddr::new( IpAddr::V6( std::net::Ipv6Addr::UNSPECIFIED ), 0 )
  };

  let socket = UdpSocket::bind( local ).await?;
  socket.set_broadcast( true )?;
  socket.send_to( bytes, target ).await?;

  return Ok(());
}

const RECEIVE_RETRY_DELAY: Duration = Duration::from_millis( 10 );

async fn receive_loop( socket: Arc<UdpSocket>, inner: Weak<Inner> ) {
  let mut buffer = [0u8; DREAMSCREEN_BUFFER_BYTES];

  loop {
    let ( length, source ) = match socket.recv_from( &mut buffer ).await {
      Ok( received ) => received,
      Err( err ) => {
        // ICMP errors from earlier sends surface here; the socket stays usable
        log::warn!( "Receive failed: {}", err );
        sleep( RECEIVE_RETRY_DELAY ).await;
        continue;
      }
    };

    let Some( inner ) = inner.upgrade() else { break };

    let message = match inner.config.codec.decode( &buffer[..length] ) {
      Ok( message ) => message,
      Err( err ) => {
        log::warn!( "Dropping datagram from {}: {}", source, err );
        continue;
      }
    };

    log::trace!( "Received from {}: {}", source, message );

    let listeners: Vec<Arc<Listener>> =
      inner.listeners.read().iter().map( |( _, listener )| listener.clone() ).collect();

    for listener in listeners {
      listener( &message, source );
    }
  }
}
