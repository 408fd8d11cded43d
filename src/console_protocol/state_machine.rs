//! The console state machine.
//!
//! The boot monitor of the switch is driven through a fixed sequence: enter
//! debug mode, upload and run a small helper switching the console to the
//! upload speed (the "baud-set" helper), then upload and run the firmware
//! image. The state machine follows that sequence token by token and calls
//! back into its environment on each milestone.
//!
//! The following state diagram summarizes the states and transitions (text
//! lines are echoed in every state and do not change it):
//!
//! ```text
//!                         START
//!                           |
//!                           v
//!                     .-----------.
//!                     |   Start   |
//!                     '-----------'
//!                           | PRESS_ANY_KEY
//!                           v
//!                  .------------------.
//!      DOT ------->| AwaitingKeyPress |      (hit any key)
//!                  '------------------'
//!                           | DEBUG_MODE
//!                           v
//!                 .--------------------.
//!      PROMPT --->| AwaitingBaudUpload |     (wait for baudset)
//!                 '--------------------'
//!                           | XMODEM_START
//!                           v
//!                .----------------------.
//!      C ------->| BaudUploadInProgress |    (wait for baudset upload)
//!                '----------------------'
//!                           | OK, PROMPT
//!                           v
//!                     .-----------.
//!      PROMPT ------->| BaudReady |          (baudset ready)
//!                     '-----------'
//!                           | BAUDSET_DONE   (baudset done)
//!                           v
//!               .------------------------.
//!      PROMPT ->| AwaitingFirmwarePrompt |   (wait for firmware)
//!               '------------------------'
//!                           | XMODEM_START
//!                           v
//!              .--------------------------.
//!      C ----->| FirmwareUploadInProgress |  (wait for firmware upload)
//!              '--------------------------'
//!                           | OK
//!                           v
//!                     .-----------.
//!      PROMPT ------->|  Booting  |          (ready to boot)
//!                     '-----------'
//!                           | OK
//!                           v
//!                     .-----------.
//!                     |   Done    |
//!                     '-----------'
//! ```
//!
//! Any callback failure moves the machine to the `Error` state, from which it
//! never moves again.

use log::{error, info};

use super::callbacks::Callbacks;
use super::states::{self, State};
use super::tokens::Token;
use crate::error::{Error, Result};

// =============================================================================
// Public Interface
// =============================================================================

/// The console state machine, bound to a set of [`Callbacks`].
///
/// Feed it the tokens produced by a [`Scanner`](super::Scanner) with
/// [`advance`](StateMachine::advance) until it reports termination.
#[derive(Debug)]
pub struct StateMachine<C> {
    state: State,
    /// The state in which a callback failed, once the machine is in `Error`.
    failed_in: Option<State>,
    callbacks: C,
}
impl<C: Callbacks> StateMachine<C> {
    /// The machine naturally starts in the `Start` state.
    pub fn new(callbacks: C) -> Self {
        StateMachine {
            state: State::Start,
            failed_in: None,
            callbacks,
        }
    }

    /// Feed the next token to the machine.
    ///
    /// Returns `Ok(true)` once the device booted; further calls are no-ops
    /// returning `Ok(true)` again. A callback failure is returned as
    /// [`Error::Callback`] naming the state it happened in, after which every
    /// call fails with [`Error::Halted`].
    pub fn advance(&mut self, token: Token, literal: &str) -> Result<bool> {
        let current = self.state;
        let next = match current {
            State::Done => return Ok(true),
            State::Error => {
                return Err(Error::Halted {
                    state: self.failed_in.unwrap_or(State::Error),
                })
            }
            State::Start => states::start(&mut self.callbacks, token, literal),
            State::AwaitingKeyPress => {
                states::awaiting_key_press(&mut self.callbacks, token, literal)
            }
            State::AwaitingBaudUpload => {
                states::awaiting_baud_upload(&mut self.callbacks, token, literal)
            }
            State::BaudUploadInProgress => {
                states::baud_upload_in_progress(&mut self.callbacks, token, literal)
            }
            State::BaudReady => states::baud_ready(&mut self.callbacks, token, literal),
            State::AwaitingFirmwarePrompt => {
                states::awaiting_firmware_prompt(&mut self.callbacks, token, literal)
            }
            State::FirmwareUploadInProgress => {
                states::firmware_upload_in_progress(&mut self.callbacks, token, literal)
            }
            State::Booting => states::booting(&mut self.callbacks, token, literal),
        };

        match next {
            Ok(next) => {
                if next != current {
                    info!("=> {}", next);
                }
                self.state = next;
                Ok(next == State::Done)
            }
            Err(e) => {
                error!("{} failed on {}: {}", current, token, e);
                self.state = State::Error;
                self.failed_in = Some(current);
                Err(Error::Callback {
                    state: current,
                    source: Box::new(e),
                })
            }
        }
    }

    /// The current protocol state.
    pub fn state(&self) -> State {
        self.state
    }

    pub fn callbacks(&self) -> &C {
        &self.callbacks
    }

    pub fn into_callbacks(self) -> C {
        self.callbacks
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
