//! Console actions driving the boot monitor of the switch.
//!
//! This is the concrete [`Callbacks`] implementation used by `swctl`. It types
//! the boot monitor commands and pushes the images with XMODEM over a
//! [`Transport`].

use std::io::{Read, Write};

use console::style;
use log::{debug, info};
use serialport::SerialPort;

use crate::console_protocol::Callbacks;
use crate::error::Result;
use crate::utils::XmodemSender;

// =============================================================================
// Public Interface
// =============================================================================

/// A bidirectional byte transport to the switch console whose speed can be
/// changed on the fly.
pub trait Transport: Read + Write {
    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()>;
}
impl Transport for Box<dyn SerialPort> {
    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        self.as_mut().set_baud_rate(baud_rate)?;
        Ok(())
    }
}

/// Key sent to interrupt the boot countdown.
pub const KEY_PRESS: &[u8] = b" ";

/// Command asking the boot monitor to receive an image with XMODEM at
/// `address`.
pub fn upload_command(address: u32) -> String {
    format!("ATUP{:x}\r", address)
}

/// Command asking the boot monitor to jump to `address`.
pub fn go_command(address: u32) -> String {
    format!("ATGO{:x}\r", address)
}

/// Drives the boot monitor: types the commands and uploads the baud-set
/// helper and the firmware image, each exactly once.
pub struct ConsoleActions<T> {
    port: T,
    load_address: u32,
    baudset: Vec<u8>,
    firmware: Vec<u8>,
    upload_baud_rate: Option<u32>,
    baudset_sent: bool,
    firmware_sent: bool,
    sender: XmodemSender,
}
impl<T: Transport> ConsoleActions<T> {
    pub fn new(port: T, load_address: u32, baudset: Vec<u8>, firmware: Vec<u8>) -> Self {
        ConsoleActions {
            port,
            load_address,
            baudset,
            firmware,
            upload_baud_rate: None,
            baudset_sent: false,
            firmware_sent: false,
            sender: XmodemSender::new(),
        }
    }

    /// Switch the transport to `baud_rate` once the baud-set helper is done.
    pub fn with_upload_baud_rate(mut self, baud_rate: Option<u32>) -> Self {
        self.upload_baud_rate = baud_rate;
        self
    }

    pub fn into_port(self) -> T {
        self.port
    }

    fn type_command(&mut self, command: &str) -> Result<()> {
        debug!("typing {:?}", command);
        self.port.write_all(command.as_bytes())?;
        self.port.flush()?;
        Ok(())
    }
}
impl<T: Transport> Callbacks for ConsoleActions<T> {
    fn on_hit_any_key(&mut self) -> Result<()> {
        debug!("hitting a key");
        self.port.write_all(KEY_PRESS)?;
        self.port.flush()?;
        Ok(())
    }

    fn on_wait_for_baudset(&mut self) -> Result<()> {
        let command = upload_command(self.load_address);
        self.type_command(&command)
    }

    fn on_wait_for_baudset_upload(&mut self) -> Result<()> {
        if self.baudset_sent {
            debug!("baudset already sent, ignoring upload request");
            return Ok(());
        }
        info!("Uploading baudset ({} bytes)", self.baudset.len());
        self.sender
            .send(&mut self.port, &self.baudset, "baudset")?;
        self.baudset_sent = true;
        Ok(())
    }

    fn on_baudset_ready(&mut self) -> Result<()> {
        let command = go_command(self.load_address);
        self.type_command(&command)
    }

    fn on_baudset_done(&mut self) -> Result<()> {
        if let Some(baud_rate) = self.upload_baud_rate {
            info!("Switching the console to {} baud", baud_rate);
            self.port.set_baud_rate(baud_rate)?;
        }
        // Get a fresh prompt for the firmware upload.
        self.type_command("\r")
    }

    fn on_wait_for_firmware(&mut self) -> Result<()> {
        let command = upload_command(self.load_address);
        self.type_command(&command)
    }

    fn on_wait_for_firmware_upload(&mut self) -> Result<()> {
        if self.firmware_sent {
            debug!("firmware already sent, ignoring upload request");
            return Ok(());
        }
        info!("Uploading firmware ({} bytes)", self.firmware.len());
        self.sender
            .send(&mut self.port, &self.firmware, "firmware")?;
        self.firmware_sent = true;
        Ok(())
    }

    fn on_ready_to_boot(&mut self) -> Result<()> {
        println!("{}", style("[SW] 🚀 Booting the firmware").green());
        let command = go_command(self.load_address);
        self.type_command(&command)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[test]
fn commands_use_the_load_address() {
    assert_eq!(upload_command(0x8180_0000), "ATUP81800000\r");
    assert_eq!(go_command(0x8180_0000), "ATGO81800000\r");
}
