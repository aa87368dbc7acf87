pub mod checksum;
pub mod color;
pub mod constants;
pub mod current_state;
pub mod device;
pub mod discovery;
pub mod emulator;
pub mod error;
pub mod message;
pub mod transport;
pub mod types;
pub mod wrappers;

// Convenience exports
pub use color::{ Rgb, ScreenColor };
pub use current_state::{ DeviceSnapshot, HdmiSettings };
pub use device::Device;
pub use discovery::{ connect, Discovery };
pub use emulator::{ Emulator, EmulatorBuilder, PatternSampler, ScreenSampler };
pub use error::{ DeviceError, EmulatorError };
pub use message::{ Codec, Command, FramingError, Message };
pub use transport::{ Transport, TransportConfig };
pub use types::{ AmbientMode, AmbientScene, DeviceKind, HdmiActiveChannels, Mode };
