//! Helpers shared by the integration tests. Every endpoint binds an ephemeral
//! port on localhost, and "broadcasts" are pointed at a single peer.
#![allow( dead_code )]

use std::net::{ IpAddr, Ipv4Addr, SocketAddr };

use tokio::net::UdpSocket;
use tokio::time::{ sleep, timeout, Duration, Instant };

use dreamscreen::{ Command, Emulator, EmulatorBuilder, Message, Transport, TransportConfig };

pub const TIMEOUT: Duration = Duration::from_secs( 2 );

pub fn localhost() -> SocketAddr {
  SocketAddr::new( IpAddr::V4( Ipv4Addr::LOCALHOST ), 0 )
}

/// A transport on an ephemeral localhost port whose broadcasts go to `peer`.
pub fn transport_to( peer: SocketAddr ) -> Transport {
  TransportConfig::new()
    .bind_address( localhost() )
    .broadcast_address( peer )
    .build()
}

/// A plain socket used to watch what an emulator broadcasts.
pub async fn observer() -> ( UdpSocket, SocketAddr ) {
  let socket = UdpSocket::bind( localhost() ).await.expect( "observer socket" );
  let address = socket.local_addr().expect( "observer address" );
  ( socket, address )
}

/// Builds and starts an emulator that broadcasts to `peer`. Returns the
/// emulator and the address it listens on.
pub fn start_emulator( builder: EmulatorBuilder, peer: SocketAddr ) -> ( Emulator, SocketAddr ) {
  let emulator = builder.build( transport_to( peer ) );
  emulator.start().expect( "emulator start" );

  let address = emulator.transport().local_address().expect( "emulator address" );
  ( emulator, address )
}

/// Sends a raw message to `target` from a throwaway socket.
pub async fn send( message: impl Into<Message>, target: SocketAddr ) {
  let socket = UdpSocket::bind( localhost() ).await.expect( "sender socket" );
  socket.send_to( &message.into().encode(), target ).await.expect( "send" );
}

/// Receives the next message on `socket`, or `None` after `wait`.
pub async fn recv_within( socket: &UdpSocket, wait: Duration ) -> Option<Message> {
  let mut buffer = [0u8; 512];

  match timeout( wait, socket.recv_from( &mut buffer ) ).await {
    Ok( Ok( ( length, _ ) ) ) => Some( Message::decode( &buffer[..length] ).expect( "well formed message" ) ),
    _ => None
  }
}

/// Receives messages until one carries `command`, skipping the others.
pub async fn recv_command( socket: &UdpSocket, command: Command ) -> Message {
  let deadline = Instant::now() + TIMEOUT;

  loop {
    let remaining = deadline.saturating_duration_since( Instant::now() );
    match recv_within( socket, remaining ).await {
      Some( message ) if message.command() == command => return message,
      Some( _ ) => continue,
      None => panic!( "No {:?} message received", command )
    }
  }
}

/// Polls `condition` until it holds or the timeout elapses.
pub async fn eventually( condition: impl Fn() -> bool ) -> bool {
  let deadline = Instant::now() + TIMEOUT;

  while Instant::now() < deadline {
    if condition() {
      return true;
    }
    sleep( Duration::from_millis( 10 ) ).await;
  }

  condition()
}
