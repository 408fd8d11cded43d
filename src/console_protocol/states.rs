//! States of the console state machine and their transition functions.
//!
//! This modules is private and restricted to the
//! [`console_protocol`](crate::console_protocol) scope. The public interface of
//! the state machine is provided by
//! [`console_protocol`](crate::console_protocol).
//!
//! Every state has one transition function taking the current token and its
//! literal text, optionally invoking one callback, and returning the next
//! state. Tokens a state has no rule for are echoed to the operator and
//! otherwise ignored.
//!
//! Refer to the [`state_machine`](super::state_machine) module for an overview
//! of states and transitions.

use std::{
    fmt,
    io::{self, Write},
};

use log::{info, trace};

use super::{callbacks::Callbacks, tokens::Token};
use crate::error::Result;

// =============================================================================
// Public Interface
// =============================================================================

/// The stages of the device boot sequence.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum State {
    /// Waiting for the boot monitor to offer the debug mode.
    Start,
    /// Pressing a key on every countdown dot until debug mode is entered.
    AwaitingKeyPress,
    /// Requesting the upload of the baud-set helper at each prompt.
    AwaitingBaudUpload,
    /// Uploading the baud-set helper.
    BaudUploadInProgress,
    /// Starting the baud-set helper and waiting for its completion banner.
    BaudReady,
    /// Requesting the upload of the firmware image at each prompt.
    AwaitingFirmwarePrompt,
    /// Uploading the firmware image.
    FirmwareUploadInProgress,
    /// Starting the firmware image.
    Booting,
    /// The device runs the firmware. Terminal.
    Done,
    /// A callback failed. Terminal.
    Error,
}
impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// =============================================================================
// Crate-Public Interface
// =============================================================================

// Start State =================================================================

/// Echo the boot messages until the boot monitor offers the debug mode.
pub(crate) fn start<C: Callbacks>(_cb: &mut C, token: Token, literal: &str) -> Result<State> {
    match token {
        Token::PressAnyKey => {
            emit(literal);
            Ok(State::AwaitingKeyPress)
        }
        t if t.is_text() => {
            emit(literal);
            Ok(State::Start)
        }
        _ => Ok(State::Start),
    }
}

// AwaitingKeyPress State ======================================================

/// The boot monitor prints a dot for each tick of its countdown. A key is
/// pressed for every dot, until the debug mode banner shows up.
pub(crate) fn awaiting_key_press<C: Callbacks>(
    cb: &mut C,
    token: Token,
    literal: &str,
) -> Result<State> {
    match token {
        Token::Dot => cb.on_hit_any_key()?,
        Token::DebugMode => {
            emit(literal);
            info!("=> Debug Mode");
            return Ok(State::AwaitingBaudUpload);
        }
        t if t.is_text() => emit(literal),
        _ => {}
    }
    Ok(State::AwaitingKeyPress)
}

// AwaitingBaudUpload State ====================================================

pub(crate) fn awaiting_baud_upload<C: Callbacks>(
    cb: &mut C,
    token: Token,
    literal: &str,
) -> Result<State> {
    match token {
        Token::Prompt => {
            emit(literal);
            cb.on_wait_for_baudset()?;
        }
        Token::XmodemStart => {
            emit(literal);
            return Ok(State::BaudUploadInProgress);
        }
        t if t.is_text() => emit(literal),
        _ => {}
    }
    Ok(State::AwaitingBaudUpload)
}

// BaudUploadInProgress State ==================================================

/// The baud-set helper is pushed on the first `C` from the receiver. Either
/// the acknowledgement or a prompt means the transfer is over; a prompt is
/// handled right away as if it had been received in [`State::BaudReady`].
pub(crate) fn baud_upload_in_progress<C: Callbacks>(
    cb: &mut C,
    token: Token,
    literal: &str,
) -> Result<State> {
    match token {
        Token::XmodemC => cb.on_wait_for_baudset_upload()?,
        Token::Ok => return Ok(State::BaudReady),
        Token::Prompt => return baud_ready(cb, token, literal),
        _ => emit(literal),
    }
    Ok(State::BaudUploadInProgress)
}

// BaudReady State =============================================================

pub(crate) fn baud_ready<C: Callbacks>(cb: &mut C, token: Token, literal: &str) -> Result<State> {
    match token {
        Token::Prompt => cb.on_baudset_ready()?,
        Token::BaudsetDone => {
            cb.on_baudset_done()?;
            return Ok(State::AwaitingFirmwarePrompt);
        }
        _ => emit(literal),
    }
    Ok(State::BaudReady)
}

// AwaitingFirmwarePrompt State ================================================

pub(crate) fn awaiting_firmware_prompt<C: Callbacks>(
    cb: &mut C,
    token: Token,
    literal: &str,
) -> Result<State> {
    match token {
        Token::Prompt => {
            emit(literal);
            cb.on_wait_for_firmware()?;
        }
        Token::XmodemStart => {
            emit(literal);
            return Ok(State::FirmwareUploadInProgress);
        }
        t if t.is_text() => emit(literal),
        _ => {}
    }
    Ok(State::AwaitingFirmwarePrompt)
}

// FirmwareUploadInProgress State ==============================================

pub(crate) fn firmware_upload_in_progress<C: Callbacks>(
    cb: &mut C,
    token: Token,
    literal: &str,
) -> Result<State> {
    match token {
        Token::XmodemC => cb.on_wait_for_firmware_upload()?,
        Token::Ok => return Ok(State::Booting),
        _ => emit(literal),
    }
    Ok(State::FirmwareUploadInProgress)
}

// Booting State ===============================================================

pub(crate) fn booting<C: Callbacks>(cb: &mut C, token: Token, literal: &str) -> Result<State> {
    match token {
        Token::Prompt => cb.on_ready_to_boot()?,
        Token::Ok => return Ok(State::Done),
        _ => emit(literal),
    }
    Ok(State::Booting)
}

// =============================================================================
// Private stuff
// =============================================================================

/// Echo console text to the operator. Empty lines are skipped.
fn emit(literal: &str) {
    if literal.is_empty() {
        return;
    }
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = writeln!(out, "{}", literal) {
        trace!("console echo failed: {}", e);
    }
}
