//! Actions the console state machine triggers on protocol milestones.

use crate::error::Result;

/// The capability set the [`StateMachine`](super::StateMachine) acts through.
///
/// Each method corresponds to one milestone of the boot sequence. Any error
/// returned by a callback is fatal for the state machine, which moves to its
/// error state and reports the failure annotated with the state it was in.
pub trait Callbacks {
    /// The boot monitor counts down and waits for any key to enter debug
    /// mode. Called once per countdown dot.
    fn on_hit_any_key(&mut self) -> Result<()>;

    /// The debug mode prompt is up and the baud-set helper can be requested.
    fn on_wait_for_baudset(&mut self) -> Result<()>;

    /// The XMODEM receiver is ready for the baud-set helper.
    fn on_wait_for_baudset_upload(&mut self) -> Result<()>;

    /// The baud-set helper was received and can be started.
    fn on_baudset_ready(&mut self) -> Result<()>;

    /// The baud-set helper completed.
    fn on_baudset_done(&mut self) -> Result<()>;

    /// The prompt is up again and the firmware image can be requested.
    fn on_wait_for_firmware(&mut self) -> Result<()>;

    /// The XMODEM receiver is ready for the firmware image.
    fn on_wait_for_firmware_upload(&mut self) -> Result<()>;

    /// The firmware image was received and can be started.
    fn on_ready_to_boot(&mut self) -> Result<()>;
}
