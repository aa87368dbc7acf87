//! The 8-bit checksum that terminates every DreamScreen message.

/// A checksum over every octet that precedes it in a serialized message.
pub type Checksum = fn( &[u8] ) -> u8;

const CRC8_POLYNOMIAL: u8 = 0x07;

const CRC8_TABLE: [u8; 256] = build_crc8_table();

/// CRC-8 (polynomial `0x07`, initial value `0x00`, no reflection, no final
/// xor) as used by DreamScreen devices.
pub fn crc8( bytes: &[u8] ) -> u8 {
  return bytes.iter().fold( 0u8, |crc, byte| CRC8_TABLE[( crc ^ byte ) as usize] );
}

const fn build_crc8_table() -> [u8; 256] {
  let mut table = [0u8; 256];
  let mut i = 0;

  while i < 256 {
    let mut crc = i as u8;
    let mut bit = 0;

    while bit < 8 {
      crc = if crc & 0x80 != 0 { ( crc << 1 ) ^ CRC8_POLYNOMIAL } else { crc << 1 };
      bit += 1;
    }

    table[i] = crc;
    i += 1;
  }

  table
}
