//! Settings related to the switch serial console, the power relay and the boot
//! images.
//!
//! Use the [builder](https://doc.rust-lang.org/1.0.0/style/ownership/builders.html)
//! pattern to set the configurable values.

use std::time::Duration;

pub use serialport::{DataBits, FlowControl, Parity, StopBits};

use crate::console_protocol::{is_usable_prompt, DEFAULT_PROMPT};
use crate::error::{Error, Result};

// =============================================================================
// Public Interface
// =============================================================================

/// Groups all settings used by `swctl` and acts as a
/// [builder](https://doc.rust-lang.org/1.0.0/style/ownership/builders.html)
/// for the settings.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Settings {
    /// Host (usually an IP address) of the power relay feeding the switch.
    pub plug: Option<String>,
    /// Pause between powering the switch off and on again.
    pub settle_delay: Duration,

    /// The port name, usually the device path.
    pub path: Option<String>,
    /// The baud rate of the boot monitor console in symbols-per-second.
    pub baud_rate: u32,
    /// Number of bits used to represent a character sent on the line.
    pub data_bits: DataBits,
    /// The type of signalling to use for controlling data transfer.
    pub flow_control: FlowControl,
    /// The type of parity to use for error checking.
    pub parity: Parity,
    /// Number of bits to use to signal the end of a character.
    pub stop_bits: StopBits,
    /// Timeout of a single read on the serial port. Reads timing out are
    /// retried, this only bounds how long a read blocks.
    pub read_timeout: Duration,
    /// When set, the boot fails if the console stays silent for longer.
    pub console_timeout: Option<Duration>,

    /// The exact prompt of the boot monitor.
    pub prompt: String,
    /// Path to the baud-set helper pushed before the firmware.
    pub baudset_image: Option<String>,
    /// Path to the firmware image to boot.
    pub firmware_image: Option<String>,
    /// Address where the boot monitor loads the uploaded images.
    pub load_address: u32,
    /// When set, the local serial port switches to this baud rate once the
    /// baud-set helper reports completion.
    pub upload_baud_rate: Option<u32>,

    /// Restrict creation of `Settings` instances unless through the
    /// `SettingsBuilder`.
    #[doc(hidden)]
    _private_use_builder: (),
}
impl Settings {
    /// Check that everything needed to boot an image is set.
    pub fn validate_boot(&self) -> Result<()> {
        fn required(value: &Option<String>, what: &str) -> Result<()> {
            match value {
                Some(v) if !v.is_empty() => Ok(()),
                _ => Err(Error::Usage(format!("invalid {} path", what))),
            }
        }
        required(&self.path, "serial port")?;
        required(&self.firmware_image, "boot file")?;
        required(&self.baudset_image, "baudset file")?;
        if !is_usable_prompt(&self.prompt) {
            return Err(Error::Usage(format!(
                "invalid device prompt {:?}: it cannot be empty or start with '.' or 'C'",
                self.prompt
            )));
        }
        Ok(())
    }
}

/// The builder for the `Settings` values.
///
/// All values are optional and have default values that will be used if not
/// explicitly set.
///
/// **Example**
///
/// ```
/// use swctl::SettingsBuilder;
///
/// let settings = SettingsBuilder::new().path("/dev/ttyUSB0").finalize();
/// assert_eq!(settings.baud_rate, 115_200);
/// ```
pub struct SettingsBuilder {
    settings: Settings,
}
impl SettingsBuilder {
    /// Start building the settings using default values, no relay, no port
    /// and no images.
    pub fn new() -> Self {
        SettingsBuilder {
            settings: Settings {
                plug: None,
                settle_delay: Duration::from_secs(1),
                path: None,
                baud_rate: 115_200,
                data_bits: DataBits::Eight,
                flow_control: FlowControl::None,
                parity: Parity::None,
                stop_bits: StopBits::One,
                read_timeout: Duration::from_millis(100),
                console_timeout: None,
                prompt: DEFAULT_PROMPT.into(),
                baudset_image: None,
                firmware_image: None,
                load_address: 0x8180_0000,
                upload_baud_rate: None,
                _private_use_builder: (),
            },
        }
    }

    /// Set the host of the power relay
    pub fn plug<'a>(mut self, plug: impl Into<std::borrow::Cow<'a, str>>) -> Self {
        self.settings.plug = Some(plug.into().into_owned());
        self
    }

    /// Set the pause between powering off and on
    pub fn settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settings.settle_delay = settle_delay;
        self
    }

    /// Set the path to the serial port
    pub fn path<'a>(mut self, path: impl Into<std::borrow::Cow<'a, str>>) -> Self {
        self.settings.path = Some(path.into().into_owned());
        self
    }

    /// Set the baud rate in symbols-per-second
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.settings.baud_rate = baud_rate;
        self
    }

    /// Set the number of bits used to represent a character sent on the line
    pub fn data_bits(mut self, data_bits: DataBits) -> Self {
        self.settings.data_bits = data_bits;
        self
    }

    /// Set the type of signalling to use for controlling data transfer
    pub fn flow_control(mut self, flow_control: FlowControl) -> Self {
        self.settings.flow_control = flow_control;
        self
    }

    /// Set the type of parity to use for error checking
    pub fn parity(mut self, parity: Parity) -> Self {
        self.settings.parity = parity;
        self
    }

    /// Set the number of bits to use to signal the end of a character
    pub fn stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.settings.stop_bits = stop_bits;
        self
    }

    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.settings.read_timeout = read_timeout;
        self
    }

    /// Fail the boot when the console stays silent for longer than this
    pub fn console_timeout(mut self, console_timeout: Duration) -> Self {
        self.settings.console_timeout = Some(console_timeout);
        self
    }

    /// Set the boot monitor prompt
    pub fn prompt<'a>(mut self, prompt: impl Into<std::borrow::Cow<'a, str>>) -> Self {
        self.settings.prompt = prompt.into().into_owned();
        self
    }

    /// Set the path to the baud-set helper
    pub fn baudset_image<'a>(mut self, image: impl Into<std::borrow::Cow<'a, str>>) -> Self {
        self.settings.baudset_image = Some(image.into().into_owned());
        self
    }

    /// Set the path to the firmware image
    pub fn firmware_image<'a>(mut self, image: impl Into<std::borrow::Cow<'a, str>>) -> Self {
        self.settings.firmware_image = Some(image.into().into_owned());
        self
    }

    /// Set the address where images are loaded
    pub fn load_address(mut self, load_address: u32) -> Self {
        self.settings.load_address = load_address;
        self
    }

    /// Switch the local port to this baud rate after the baud-set helper ran
    pub fn upload_baud_rate(mut self, baud_rate: u32) -> Self {
        self.settings.upload_baud_rate = Some(baud_rate);
        self
    }

    pub fn finalize(self) -> Settings {
        self.settings
    }
}
impl Default for SettingsBuilder {
    fn default() -> Self {
        SettingsBuilder::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[test]
fn all_default() {
    let settings = SettingsBuilder::new().finalize();
    assert_eq!(
        settings,
        Settings {
            plug: None,
            settle_delay: Duration::from_secs(1),
            path: None,
            baud_rate: 115_200,
            data_bits: DataBits::Eight,
            flow_control: FlowControl::None,
            parity: Parity::None,
            stop_bits: StopBits::One,
            read_timeout: Duration::from_millis(100),
            console_timeout: None,
            prompt: "XMG1915-10E> ".into(),
            baudset_image: None,
            firmware_image: None,
            load_address: 0x8180_0000,
            upload_baud_rate: None,
            _private_use_builder: (),
        }
    )
}

#[test]
fn plug() {
    let settings = SettingsBuilder::new().plug("192.168.33.2").finalize();
    assert_eq!(settings.plug.unwrap(), "192.168.33.2");
}

#[test]
fn path() {
    let settings = SettingsBuilder::new().path("/dev/ttyUSB0").finalize();
    assert_eq!(settings.path.unwrap(), "/dev/ttyUSB0");
}

#[test]
fn baud_rate() {
    let baud_rate = 57_600;
    let settings = SettingsBuilder::new().baud_rate(baud_rate).finalize();
    assert_eq!(settings.baud_rate, baud_rate);
}

#[test]
fn parity_and_stop_bits() {
    let settings = SettingsBuilder::new()
        .parity(Parity::Even)
        .stop_bits(StopBits::Two)
        .finalize();
    assert_eq!(settings.parity, Parity::Even);
    assert_eq!(settings.stop_bits, StopBits::Two);
}

#[test]
fn console_timeout() {
    let settings = SettingsBuilder::new()
        .console_timeout(Duration::from_secs(30))
        .finalize();
    assert_eq!(settings.console_timeout, Some(Duration::from_secs(30)));
}

#[test]
fn images_and_address() {
    let settings = SettingsBuilder::new()
        .baudset_image("baudset.bin")
        .firmware_image("openwrt-initramfs.bin")
        .load_address(0x8000_0000)
        .upload_baud_rate(460_800)
        .finalize();
    assert_eq!(settings.baudset_image.unwrap(), "baudset.bin");
    assert_eq!(settings.firmware_image.unwrap(), "openwrt-initramfs.bin");
    assert_eq!(settings.load_address, 0x8000_0000);
    assert_eq!(settings.upload_baud_rate, Some(460_800));
}

#[test]
fn boot_requires_port_and_images() {
    let complete = SettingsBuilder::new()
        .path("/dev/ttyUSB0")
        .baudset_image("baudset.bin")
        .firmware_image("openwrt-initramfs.bin");
    assert!(complete.finalize().validate_boot().is_ok());

    let no_port = SettingsBuilder::new()
        .baudset_image("baudset.bin")
        .firmware_image("openwrt-initramfs.bin")
        .finalize();
    assert_eq!(
        no_port.validate_boot().unwrap_err().to_string(),
        "invalid serial port path"
    );

    let empty_image = SettingsBuilder::new()
        .path("/dev/ttyUSB0")
        .baudset_image("baudset.bin")
        .firmware_image("")
        .finalize();
    assert_eq!(
        empty_image.validate_boot().unwrap_err().to_string(),
        "invalid boot file path"
    );

    let no_baudset = SettingsBuilder::new()
        .path("/dev/ttyUSB0")
        .firmware_image("openwrt-initramfs.bin")
        .finalize();
    assert_eq!(
        no_baudset.validate_boot().unwrap_err().to_string(),
        "invalid baudset file path"
    );
}

#[test]
fn boot_rejects_ambiguous_prompts() {
    let base = || {
        SettingsBuilder::new()
            .path("/dev/ttyUSB0")
            .baudset_image("baudset.bin")
            .firmware_image("openwrt-initramfs.bin")
    };
    assert!(base().prompt("GS1900# ").finalize().validate_boot().is_ok());
    for prompt in &["CLI> ", "...> ", ""] {
        match base().prompt(*prompt).finalize().validate_boot() {
            Err(Error::Usage(message)) => assert!(message.starts_with("invalid device prompt")),
            other => panic!("prompt {:?} gave {:?}", prompt, other),
        }
    }
}
