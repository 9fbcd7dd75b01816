#![deny(unsafe_op_in_unsafe_fn)]
// Library interface for the menu so the engine can be driven without GPIO.

pub mod app;
pub mod config;
pub mod display;
pub mod editor;
pub mod idle;
pub mod info;
pub mod input;
pub mod lcd;
pub mod led;
pub mod menu;
pub mod navigator;
pub mod shutdown;
pub mod system;
pub mod util;
