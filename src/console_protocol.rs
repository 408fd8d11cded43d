//! The switch console automation protocol.
//!
//! Console output is turned into [`Token`]s by the [`Scanner`], the tokens
//! drive the [`StateMachine`] which calls back into the environment through
//! the [`Callbacks`] capability set, and the [`Automator`] glues the two
//! together until the device boots.
//!
//! **Example** - Running the automation over a recorded console transcript:
//! ```
//! use std::io::Cursor;
//! use swctl::console_protocol::{Automator, Callbacks, Scanner, State, StateMachine};
//! use swctl::Result;
//!
//! struct Quiet;
//! impl Callbacks for Quiet {
//!     fn on_hit_any_key(&mut self) -> Result<()> { Ok(()) }
//!     fn on_wait_for_baudset(&mut self) -> Result<()> { Ok(()) }
//!     fn on_wait_for_baudset_upload(&mut self) -> Result<()> { Ok(()) }
//!     fn on_baudset_ready(&mut self) -> Result<()> { Ok(()) }
//!     fn on_baudset_done(&mut self) -> Result<()> { Ok(()) }
//!     fn on_wait_for_firmware(&mut self) -> Result<()> { Ok(()) }
//!     fn on_wait_for_firmware_upload(&mut self) -> Result<()> { Ok(()) }
//!     fn on_ready_to_boot(&mut self) -> Result<()> { Ok(()) }
//! }
//!
//! let transcript = "Press any key to enter debug mode within 1 second.\r\n";
//! let mut automator = Automator::new(
//!     Scanner::new(Cursor::new(transcript)),
//!     StateMachine::new(Quiet),
//! );
//! assert!(automator.run().is_err()); // the console closed before booting
//! assert_eq!(automator.state(), State::AwaitingKeyPress);
//! ```

mod automator;
mod callbacks;
mod scanner;
mod state_machine;
mod states;
mod tokens;

pub use automator::Automator;
pub use callbacks::Callbacks;
pub use scanner::Scanner;
pub use state_machine::StateMachine;
pub use states::State;
pub use tokens::{Token, DEFAULT_PROMPT};

pub(crate) use tokens::is_usable_prompt;
