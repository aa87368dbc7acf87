use std::fmt;

use zerocopy::{ FromBytes, Immutable, IntoBytes, KnownLayout };

use crate::constants::{ SCREEN_SECTOR_BYTES, SCREEN_SECTOR_COUNT };

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Rgb

#[repr( C )]
#[derive( Clone, Copy, Debug, Default, PartialEq, Eq, Hash, FromBytes, Immutable, IntoBytes, KnownLayout )]
pub struct Rgb {
  pub r: u8,
  pub g: u8,
  pub b: u8
}

impl Rgb {
  pub const BLACK: Rgb = Rgb::new( 0, 0, 0 );
  pub const WHITE: Rgb = Rgb::new( 255, 255, 255 );

  pub const fn new( r: u8, g: u8, b: u8 ) -> Self {
    return Self{ r, g, b };
  }

  /// Reads the first three octets of `bytes`, or black if fewer are present.
  pub fn from_slice( bytes: &[u8] ) -> Self {
    match bytes {
      [ r, g, b, .. ] => Rgb::new( *r, *g, *b ),
      _ => Rgb::BLACK
    }
  }

  pub fn to_array( self ) -> [u8; 3] {
    [ self.r, self.g, self.b ]
  }

  /// Returns a random color.
  pub fn random() -> Self {
    return Rgb::new( rand::random(), rand::random(), rand::random() );
  }
}

impl fmt::Display for Rgb {
  fn fmt( &self, f: &mut fmt::Formatter ) -> fmt::Result {
    return write!( f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b );
  }
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -  Screen Color

/// The colors of the 12 screen sectors, addressed 1 through 12. The sectors
/// run counter-clockwise around the screen edge starting at the bottom right:
///
/// ```text
///  7  6  5  4  3
///  8           2
///  9 10 11 12  1
/// ```
#[derive( Clone, Copy, Debug, PartialEq, Eq )]
pub struct ScreenColor {
  sectors: [u8; SCREEN_SECTOR_BYTES]
}

impl Default for ScreenColor {
  fn default() -> Self {
    return Self{ sectors: [0u8; SCREEN_SECTOR_BYTES] };
  }
}

impl ScreenColor {
  /// All sectors set to black.
  pub fn new() -> Self {
    return Self::default();
  }

  /// All sectors set to `color`.
  pub fn filled( color: Rgb ) -> Self {
    let mut screen = Self::default();
    screen.fill( color );
    return screen;
  }

  /// Builds a screen from a sector data payload. Anything other than exactly
  /// 36 octets yields an all-black screen.
  pub fn from_payload( payload: &[u8] ) -> Self {
    match <[u8; SCREEN_SECTOR_BYTES]>::try_from( payload ) {
      Ok( sectors ) => Self{ sectors },
      Err( _ ) => {
        log::warn!( "Expected {} bytes of sector data but got {}", SCREEN_SECTOR_BYTES, payload.len() );
        Self::default()
      }
    }
  }

  /// Returns the color of `sector` (1-based).
  ///
  /// # Panics
  /// If `sector` is not within `1..=12`.
  pub fn color( &self, sector: usize ) -> Rgb {
    let i = ( sector - 1 ) * 3;
    return Rgb::from_slice( &self.sectors[i..i + 3] );
  }

  /// Sets the color of `sector` (1-based).
  ///
  /// # Panics
  /// If `sector` is not within `1..=12`.
  pub fn set_color( &mut self, sector: usize, color: Rgb ) {
    let i = ( sector - 1 ) * 3;
    self.sectors[i..i + 3].copy_from_slice( &color.to_array() );
  }

  pub fn fill( &mut self, color: Rgb ) {
    for sector in 1..=SCREEN_SECTOR_COUNT {
      self.set_color( sector, color );
    }
  }

  /// Returns the per-channel mean of `sectors`, truncated. Indices outside
  /// `1..=12` are skipped. No valid sectors yields black.
  pub fn average_color( &self, sectors: &[usize] ) -> Rgb {
    let ( mut r, mut g, mut b, mut count ) = ( 0u32, 0u32, 0u32, 0u32 );

    for &sector in sectors.iter().filter( |s| ( 1..=SCREEN_SECTOR_COUNT ).contains( s ) ) {
      let color = self.color( sector );
      r += color.r as u32;
      g += color.g as u32;
      b += color.b as u32;
      count += 1;
    }

    if count == 0 {
      return Rgb::BLACK;
    }

    return Rgb::new( ( r / count ) as u8, ( g / count ) as u8, ( b / count ) as u8 );
  }

  /// The raw 36-octet sector payload.
  pub fn as_bytes( &self ) -> &[u8; SCREEN_SECTOR_BYTES] {
    &self.sectors
  }
}
