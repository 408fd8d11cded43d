//! Helper functions to deal with serial ports, uploads and the keyboard.

#[macro_use]
mod macros;

mod keyboard;
mod ports;
mod xmodem;

pub(crate) use keyboard::{key_to_bytes, KeyAction};
pub(crate) use ports::{open_and_setup_port, ConsoleReader};
pub(crate) use xmodem::Sender as XmodemSender;
