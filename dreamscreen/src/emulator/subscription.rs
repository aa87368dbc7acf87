//! Bookkeeping for the peers that receive a device's screen color stream.
use std::collections::HashMap;
use std::net::SocketAddr;

use tokio::time::{ Duration, Instant };

/// How often a streaming device solicits and renews subscribers.
pub const SUBSCRIPTION_INTERVAL: Duration = Duration::from_secs( 5 );

/// Renewal cycles a subscriber may miss before it is dropped.
pub const MAX_MISSED_RENEWALS: u8 = 3;

/// Minimum spacing between two streamed frames, about 60 per second.
pub const STREAM_INTERVAL: Duration = Duration::from_millis( 16 );

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Subscribed Device

#[derive( Clone, Copy, Debug, PartialEq, Eq )]
pub struct SubscribedDevice {
  address: SocketAddr,
  ticks: u8
}

impl SubscribedDevice {
  pub fn new( address: SocketAddr ) -> Self {
    return Self{ address, ticks: 0 };
  }

  pub fn address( &self ) -> SocketAddr {
    return self.address;
  }

  /// Counts one unacknowledged renewal cycle. Returns `false` once more than
  /// 3 cycles went by without an acknowledgement.
  pub fn tick( &mut self ) -> bool {
    self.ticks = self.ticks.saturating_add( 1 );
    return self.ticks <= MAX_MISSED_RENEWALS;
  }

  /// Records a fresh acknowledgement.
  pub fn tock( &mut self ) {
    self.ticks = 0;
  }
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Subscribers

#[derive( Debug, Default )]
pub(crate) struct Subscribers {
  devices: HashMap<SocketAddr,SubscribedDevice>
}

impl Subscribers {
  /// Registers `address`, or refreshes it if already subscribed. Returns
  /// `true` for a new subscriber.
  pub fn acknowledge( &mut self, address: SocketAddr ) -> bool {
    match self.devices.get_mut( &address ) {
      Some( device ) => {
        device.tock();
        false
      },
      None => {
        self.devices.insert( address, SubscribedDevice::new( address ) );
        true
      }
    }
  }

  /// Ticks every subscriber and removes the expired ones, which are returned.
  pub fn tick( &mut self ) -> Vec<SocketAddr> {
    let mut expired = Vec::new();

    self.devices.retain( |address, device| {
      let alive = device.tick();
      if ! alive {
        expired.push( *address );
      }
      alive
    });

    return expired;
  }

  pub fn addresses( &self ) -> Vec<SocketAddr> {
    return self.devices.keys().copied().collect();
  }

  pub fn clear( &mut self ) {
    self.devices.clear();
  }
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Rate Limiter

/// Spaces out batches of streamed frames by at least `interval`.
#[derive( Debug )]
pub(crate) struct RateLimiter {
  interval: Duration,
  last: Option<Instant>
}

impl RateLimiter {
  pub fn new( interval: Duration ) -> Self {
    return Self{ interval, last: None };
  }

  /// Called after each batch. Sleeps for whatever is left of the interval
  /// since the previous batch.
  pub async fn wait( &mut self ) {
    if let Some( last ) = self.last {
      let elapsed = last.elapsed();
      if elapsed < self.interval {
        tokio::time::sleep( self.interval - elapsed ).await;
      }
    }

    self.last = Some( Instant::now() );
  }
}
