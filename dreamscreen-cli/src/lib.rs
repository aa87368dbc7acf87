pub mod app;

// Convenience exports
pub use app::App;
