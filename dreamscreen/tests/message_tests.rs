use dreamscreen::checksum::crc8;
use dreamscreen::constants::*;
use dreamscreen::{ Codec, Command, FramingError, Message };

fn sample_messages() -> Vec<Message> {
  vec![
    Message::current_state_request(),
    Message::new( 0x02, FLAG_UNICAST, NAMESPACE_DEVICE, COMMAND_BRIGHTNESS, vec![ 42 ] ),
    Message::new( 0x10, FLAG_BROADCAST_TO_GROUP, NAMESPACE_DEVICE, COMMAND_SCREEN_SECTOR_DATA, ( 0..36 ).collect() ),
    Message::new( GROUP_ALL, FLAG_STATUS, NAMESPACE_MANAGEMENT, COMMAND_CURRENT_STATE, vec![ 0xAB; MAX_PAYLOAD_BYTES ] ),
    Message::new( 0x00, 0x00, 0x7F, 0x7F, Vec::new() )
  ]
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -  Tests

#[test]
fn decoding_an_encoded_message_restores_it() {
  for message in sample_messages() {
    assert_eq!( Message::decode( &message.encode() ), Ok( message ) );
  }
}

#[test]
fn the_length_octet_excludes_marker_and_length() {
  let bytes = Message::new( 1, FLAG_UNICAST, NAMESPACE_DEVICE, COMMAND_MODE, vec![ 3 ] ).encode();

  assert_eq!( bytes.len(), 8 );
  assert_eq!( bytes[0], START_OF_PACKET );
  assert_eq!( bytes[1] as usize, bytes.len() - 2 );
  assert_eq!( bytes[7], crc8( &bytes[..7] ) );
}

#[test]
fn oversized_payloads_are_truncated_on_encode() {
  let message = Message::new( 1, FLAG_UNICAST, NAMESPACE_DEVICE, COMMAND_SCREEN_SECTOR_DATA, vec![ 7; MAX_PAYLOAD_BYTES + 20 ] );
  let bytes = message.encode();

  assert_eq!( bytes.len(), MIN_MESSAGE_BYTES + MAX_PAYLOAD_BYTES );
  assert_eq!( bytes[1], u8::MAX );

  let decoded = Message::decode( &bytes ).unwrap();
  assert_eq!( decoded.payload(), &message.payload()[..MAX_PAYLOAD_BYTES] );
  assert_eq!( decoded.command(), Command::ScreenSectorData );
}

#[test]
fn empty_and_full_payloads_survive_a_round_trip() {
  for length in [ 0, 1, MAX_PAYLOAD_BYTES - 1, MAX_PAYLOAD_BYTES ] {
    let message = Message::new( 3, FLAG_BROADCAST_TO_GROUP, NAMESPACE_DEVICE, COMMAND_HDMI_NAME_1, vec![ 0x5A; length ] );
    let bytes = message.encode();

    assert_eq!( bytes.len(), MIN_MESSAGE_BYTES + length );
    assert_eq!( Message::decode( &bytes ), Ok( message ) );
  }
}

#[test]
fn any_corrupted_octet_is_detected() {
  for message in sample_messages() {
    let bytes = message.encode();

    for index in 0..bytes.len() {
      let mut corrupted = bytes.clone();
      corrupted[index] ^= 0xFF;

      assert!( Message::decode( &corrupted ).is_err(), "octet {} of {}", index, message );
    }
  }
}

#[test]
fn payload_corruption_is_a_checksum_mismatch() {
  let mut bytes = Message::new( 1, FLAG_UNICAST, NAMESPACE_DEVICE, COMMAND_AMBIENT_COLOR, vec![ 1, 2, 3 ] ).encode();
  bytes[7] = 0x55;

  assert!( matches!( Message::decode( &bytes ), Err( FramingError::ChecksumMismatch{ .. } ) ) );
  assert!( Codec::default().lenient().decode( &bytes ).is_ok() );
}

#[test]
fn truncation_fails_on_length_first() {
  let bytes = Message::new( 1, FLAG_UNICAST, NAMESPACE_DEVICE, COMMAND_AMBIENT_COLOR, vec![ 1, 2, 3 ] ).encode();

  for cut in 1..=( bytes.len() - MIN_MESSAGE_BYTES ) {
    let truncated = &bytes[..bytes.len() - cut];
    assert!(
      matches!( Message::decode( truncated ), Err( FramingError::LengthMismatch{ .. } ) ),
      "cut {}", cut
    );
  }

  assert!( matches!( Message::decode( &bytes[..4] ), Err( FramingError::TooShort( 4 ) ) ) );
}

#[test]
fn a_bad_marker_is_rejected() {
  let mut bytes = Message::current_state_request().encode();
  bytes[0] = 0xFD;

  assert!( matches!( Message::decode( &bytes ), Err( FramingError::InvalidMarker( 0xFD ) ) ) );
}

#[test]
fn classification_is_stable() {
  let cases = [
    ( NAMESPACE_MANAGEMENT, COMMAND_CURRENT_STATE, true, Command::CurrentStateRequest ),
    ( NAMESPACE_MANAGEMENT, COMMAND_CURRENT_STATE, false, Command::CurrentState ),
    ( NAMESPACE_MANAGEMENT, COMMAND_SUBSCRIPTION_REQUEST, true, Command::SubscriptionRequest ),
    ( NAMESPACE_DEVICE, COMMAND_COLOR_SATURATION, false, Command::ColorSaturation ),
    ( NAMESPACE_DEVICE, COMMAND_HDMI_NAME_3, false, Command::HdmiName3 ),
    ( NAMESPACE_DEVICE, COMMAND_HDMI_INPUT_STATUS, false, Command::HdmiInputStatus ),
    ( NAMESPACE_MANAGEMENT, COMMAND_MODE, false, Command::Unknown )
  ];

  for ( upper, lower, empty, expected ) in cases {
    assert_eq!( Command::classify( upper, lower, empty ), expected );
    assert_eq!( Command::classify( upper, lower, empty ), Command::classify( upper, lower, empty ) );
  }
}
