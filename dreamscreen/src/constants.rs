//! Constants that map to the DreamScreen UDP protocol (v2). Every message is
//! framed as `[0xFC, length, group, flags, upper, lower, payload.., crc8]`.

// Framing
pub const START_OF_PACKET: u8       = 0xFC;
pub const HEADER_BYTES: usize       = 6;
pub const MIN_MESSAGE_BYTES: usize  = HEADER_BYTES + 1;
pub const MAX_PAYLOAD_BYTES: usize  = u8::MAX as usize - 5;

// Group addresses
pub const GROUP_NONE: u8 = 0x00;
pub const GROUP_ALL: u8  = 0xFF;

// Flags
pub const FLAG_UNICAST_LOCAL: u8      = 0x01;
pub const FLAG_UNICAST: u8            = 0x11;
pub const FLAG_BROADCAST_TO_ALL: u8   = 0x21;
pub const FLAG_QUERY: u8              = 0x30;
pub const FLAG_BROADCAST_TO_GROUP: u8 = 0x41;
pub const FLAG_STATUS: u8             = 0x60;

// Command namespaces
pub const NAMESPACE_MANAGEMENT: u8 = 0x01;
pub const NAMESPACE_DEVICE: u8     = 0x03;

// Management commands (namespace 0x01)
pub const COMMAND_DEVICE_NAME: u8          = 0x07;
pub const COMMAND_GROUP_NAME: u8           = 0x08;
pub const COMMAND_GROUP_NUMBER: u8         = 0x09;
pub const COMMAND_CURRENT_STATE: u8        = 0x0A;
pub const COMMAND_SUBSCRIPTION_REQUEST: u8 = 0x0C;

// Device commands (namespace 0x03)
pub const COMMAND_MODE: u8                 = 0x01;
pub const COMMAND_BRIGHTNESS: u8           = 0x02;
pub const COMMAND_AMBIENT_COLOR: u8        = 0x05;
pub const COMMAND_COLOR_SATURATION: u8     = 0x06;
pub const COMMAND_AMBIENT_MODE: u8         = 0x08;
pub const COMMAND_AMBIENT_SCENE: u8        = 0x0D;
pub const COMMAND_SCREEN_SECTOR_DATA: u8   = 0x16;
pub const COMMAND_SECTOR_SETTING: u8       = 0x17;
pub const COMMAND_HDMI_INPUT: u8           = 0x20;
pub const COMMAND_HDMI_NAME_1: u8          = 0x23;
pub const COMMAND_HDMI_NAME_2: u8          = 0x24;
pub const COMMAND_HDMI_NAME_3: u8          = 0x25;
pub const COMMAND_HDMI_ACTIVE_CHANNELS: u8 = 0x2C;
pub const COMMAND_HDMI_INPUT_STATUS: u8    = 0x2F;

// Payloads
pub const SUBSCRIPTION_ACK_PAYLOAD: [u8; 1] = [0x01];
pub const SECTOR_SETTING_BYTES: usize       = 15;
pub const SCREEN_SECTOR_COUNT: usize        = 12;
pub const SCREEN_SECTOR_BYTES: usize        = SCREEN_SECTOR_COUNT * 3;
pub const MAX_NAME_LENGTH: usize            = 16;

// Current state payload sizes
pub const COMPACT_STATE_BYTES: usize  = 63;
pub const EXTENDED_STATE_BYTES: usize = 141;

// Device type discriminators (trailing octet of a current state payload)
pub const DEVICE_TYPE_HD: u8       = 0x01;
pub const DEVICE_TYPE_4K: u8       = 0x02;
pub const DEVICE_TYPE_SIDEKICK: u8 = 0x03;

// Network
pub const DREAMSCREEN_PORT: u16           = 8888;
pub const DREAMSCREEN_BUFFER_BYTES: usize = 512;

/// The pre-built discovery query: group `0xFF`, flags `0x30`, command
/// `0x01/0x0A` and an empty payload.
pub const MESSAGE_READ_CURRENT_STATE: [u8; 7] = [ 0xFC, 0x05, 0xFF, 0x30, 0x01, 0x0A, 0x2A ];
