//! Tokens recognized on the switch console.
//!
//! This modules is private and restricted to the
//! [`console_protocol`](crate::console_protocol) scope; the public types are
//! re-exported from there.

use std::fmt;

// =============================================================================
// Console vocabulary
// =============================================================================

/// Prompt printed by the boot monitor of the `XMG1915-10E`. Unlike the banners
/// it is not followed by a line terminator.
pub const DEFAULT_PROMPT: &str = "XMG1915-10E> ";

pub(crate) const PRESS_ANY_KEY_STR: &str = "Press any key to enter debug mode within 1 second.";
pub(crate) const DEBUG_MODE_STR: &str = "Enter Debug Mode";
pub(crate) const XMODEM_STARTING_STR: &str = "Starting XMODEM upload (CRC mode)....";
pub(crate) const OK_STR: &str = "OK";
pub(crate) const BAUDSET_DONE_STR: &str = "BAUDSET DONE";

/// `true` when `prompt` can be told apart from the single character tokens:
/// it must not be empty nor start with `.` or `C`.
pub(crate) fn is_usable_prompt(prompt: &str) -> bool {
    !matches!(prompt.as_bytes().first(), None | Some(b'.') | Some(b'C'))
}

// Token =======================================================================

/// A classified unit of console output.
///
/// The literal text that produced the token travels next to it (see
/// [`Scanner::scan`](super::Scanner::scan)); the token itself only carries the
/// classification.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Token {
    /// The console stream ended.
    Eof,
    /// A single `.`, printed by the boot monitor while counting down.
    Dot,
    /// A line that is not part of the console vocabulary.
    Line,
    /// The boot monitor prompt.
    Prompt,
    /// The `OK` acknowledgement.
    Ok,
    /// The banner inviting to press a key to enter debug mode.
    PressAnyKey,
    /// The banner confirming the debug mode.
    DebugMode,
    /// The banner announcing an XMODEM upload.
    XmodemStart,
    /// A single `C`, the XMODEM-CRC receiver asking for the first block.
    XmodemC,
    /// The banner printed by the baud-set helper once it completed.
    BaudsetDone,
    /// Bytes that started like the prompt but did not match it.
    Unknown,
}
impl Token {
    /// Classify a complete line of console text.
    pub(crate) fn classify(line: &str) -> Token {
        match line {
            DEBUG_MODE_STR => Token::DebugMode,
            PRESS_ANY_KEY_STR => Token::PressAnyKey,
            XMODEM_STARTING_STR => Token::XmodemStart,
            OK_STR => Token::Ok,
            BAUDSET_DONE_STR => Token::BaudsetDone,
            _ => Token::Line,
        }
    }

    /// `true` for the tokens carrying free-form console text.
    pub fn is_text(self) -> bool {
        matches!(self, Token::Line | Token::Unknown)
    }
}
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Token::Eof => "EOF",
            Token::Dot => "DOT",
            Token::Line => "LINE",
            Token::Prompt => "PROMPT",
            Token::Ok => "OK",
            Token::PressAnyKey => "PRESS_ANY_KEY",
            Token::DebugMode => "DEBUG_MODE",
            Token::XmodemStart => "XMODEM_START",
            Token::XmodemC => "XMODEM_C",
            Token::BaudsetDone => "BAUDSET_DONE",
            Token::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[test]
fn banners_are_classified() {
    assert_eq!(Token::classify(PRESS_ANY_KEY_STR), Token::PressAnyKey);
    assert_eq!(Token::classify(DEBUG_MODE_STR), Token::DebugMode);
    assert_eq!(Token::classify(XMODEM_STARTING_STR), Token::XmodemStart);
    assert_eq!(Token::classify(OK_STR), Token::Ok);
    assert_eq!(Token::classify(BAUDSET_DONE_STR), Token::BaudsetDone);
}

#[test]
fn anything_else_is_a_line() {
    assert_eq!(Token::classify(""), Token::Line);
    assert_eq!(Token::classify("ok"), Token::Line);
    assert_eq!(Token::classify("OK "), Token::Line);
    assert_eq!(Token::classify("Enter Debug Mode!"), Token::Line);
}
