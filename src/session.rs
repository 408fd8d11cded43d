//! `swctl` actions: power off, reboot, and boot an image.
//!
//! **Example** - Booting an image:
//! ```no_run
//! use swctl::{self as sw, SettingsBuilder};
//!
//! let settings = SettingsBuilder::new()
//!     .plug("192.168.33.2")
//!     .path("/dev/ttyUSB0")
//!     .baudset_image("baudset.bin")
//!     .firmware_image("openwrt-initramfs-kernel.bin")
//!     .finalize();
//! if let Err(e) = sw::boot(&settings) {
//!     eprintln!("{}", e);
//!     std::process::exit(1);
//! }
//! ```

mod actions;
mod terminal;

use std::{fs, path::Path};

use console::style;
use log::info;

use crate::console_protocol::{Automator, Scanner, StateMachine};
use crate::error::{Error, Result};
use crate::power::{self, Relay};
use crate::utils::{open_and_setup_port, ConsoleReader};
use crate::Settings;

pub use actions::{go_command, upload_command, ConsoleActions, Transport, KEY_PRESS};
pub use terminal::interact;

// =============================================================================
// Public Interface
// =============================================================================

/// Switch the device off.
pub fn power_off(settings: &Settings) -> Result<()> {
    let relay = relay(settings)?;
    power::power_off(&relay)
}

/// Power cycle the device.
pub fn reboot(settings: &Settings) -> Result<()> {
    let relay = relay(settings)?;
    power::reboot(&relay, settings.settle_delay)
}

/// Power cycle the device, drive its boot monitor until the firmware image
/// runs, then hand the console over to the operator.
pub fn boot(settings: &Settings) -> Result<()> {
    settings.validate_boot()?;

    // Images are read before touching the power.
    let baudset = read_image(settings.baudset_image.as_deref().unwrap_or_default())?;
    let firmware = read_image(settings.firmware_image.as_deref().unwrap_or_default())?;

    reboot(settings)?;
    println!("{}", style("[SW] 🔌 Switch powered on").green());

    let port = open_and_setup_port(settings)?;
    let reader = ConsoleReader::new(port.try_clone()?, settings.console_timeout);
    let actions = ConsoleActions::new(port, settings.load_address, baudset, firmware)
        .with_upload_baud_rate(settings.upload_baud_rate);

    let mut automator = Automator::new(
        Scanner::with_prompt(reader, &settings.prompt),
        StateMachine::new(actions),
    );
    automator.run()?;
    info!("Boot automation done");

    let (_, machine) = automator.into_parts();
    interact(machine.into_callbacks().into_port())
}

// =============================================================================
// Private stuff
// =============================================================================

fn relay(settings: &Settings) -> Result<Relay> {
    match &settings.plug {
        Some(plug) if !plug.is_empty() => Relay::new(plug),
        _ => Err(Error::Usage("plug IP address required".into())),
    }
}

fn read_image(path: &str) -> Result<Vec<u8>> {
    let data = fs::read(path).map_err(|source| Error::Image {
        path: Path::new(path).to_path_buf(),
        source,
    })?;
    info!("{}: {} bytes", path, data.len());
    Ok(data)
}

// =============================================================================
// Unit Tests
// =============================================================================
