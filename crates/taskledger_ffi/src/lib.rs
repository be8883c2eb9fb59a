//! FFI bindings exposed to the UI host through flutter_rust_bridge.

pub mod api;
