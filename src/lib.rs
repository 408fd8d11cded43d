//! Swctl boots firmware images on a network switch whose only control surface
//! is its serial console. It power cycles the switch through a remotely
//! controlled relay, catches the boot monitor before it boots the flash, and
//! drives it through the upload of a small baud-set helper and of the firmware
//! image, before handing the console over to the operator.
//!
//! This is handy for firmware development on such switches: every iteration is
//! a single `swctl --boot` away, without touching the hardware.
//!
//! The console automation is implemented as a **scanner** feeding a **state
//! machine**:
//!
//! * The scanner turns the raw console bytes into tokens: banners, the boot
//!   monitor prompt, countdown dots, XMODEM requests and plain lines.
//! * The state machine is in exactly one state at any time and each token
//!   triggers one transition. Text it has no rule for is echoed and ignored.
//! * On protocol milestones, the state machine calls back into its
//!   environment through a capability set (press a key, type a command, push
//!   an image). The concrete callbacks are kept out of the state machine so
//!   it can be exercised without any hardware.
//! * Any callback failure is fatal: the state machine stops in its error state
//!   and the boot attempt is aborted, there is no partial retry.

pub mod console_protocol;
mod error;
pub mod power;
mod session;
mod settings;
mod utils;

pub use error::{Error, Result};
pub use session::{
    boot, go_command, interact, power_off, reboot, upload_command, ConsoleActions, Transport,
    KEY_PRESS,
};
pub use settings::{Settings, SettingsBuilder};
