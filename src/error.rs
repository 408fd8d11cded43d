//! Errors reported by `swctl`.
//!
//! Every error is fatal for the boot attempt: nothing in the console
//! automation tries to recover from a failure, the error simply bubbles up to
//! the command line interface which reports it and exits with a non-zero
//! status.

use std::{
    io,
    path::{Path, PathBuf},
};

use crate::console_protocol::State;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("relay request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The relay answered a `turn` request but reports a different state.
    #[error("failed to turn the relay {turn}")]
    RelayState { turn: &'static str },

    /// A power-control operation failed during one of the reboot phases.
    #[error("failed to {phase}: {source}")]
    Power {
        phase: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// A callback invoked by the console state machine failed.
    #[error("callback failed in state {state}: {source}")]
    Callback {
        state: State,
        #[source]
        source: Box<Error>,
    },

    /// The console state machine already failed and refuses further tokens.
    #[error("console state machine halted after a failure in state {state}")]
    Halted { state: State },

    /// The console stream ended before the device finished booting.
    #[error("console closed while in state {state}{}", describe_cause(.cause))]
    ConsoleClosed {
        state: State,
        cause: Option<io::Error>,
    },

    #[error("xmodem transfer failed: {0}")]
    Xmodem(String),

    #[error("cannot read image `{}`: {source}", display_path(.path))]
    Image {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Usage(String),
}

fn describe_cause(cause: &Option<io::Error>) -> String {
    match cause {
        Some(e) => format!(": {}", e),
        None => String::new(),
    }
}

fn display_path(path: &Path) -> std::path::Display<'_> {
    path.display()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_error_names_the_state() {
        let err = Error::Callback {
            state: State::BaudReady,
            source: Box::new(Error::Xmodem("receiver cancelled".into())),
        };
        assert_eq!(
            err.to_string(),
            "callback failed in state BaudReady: xmodem transfer failed: receiver cancelled"
        );
    }

    #[test]
    fn relay_state_error_names_the_request() {
        assert_eq!(
            Error::RelayState { turn: "off" }.to_string(),
            "failed to turn the relay off"
        );
    }

    #[test]
    fn console_closed_with_and_without_cause() {
        let plain = Error::ConsoleClosed {
            state: State::Start,
            cause: None,
        };
        assert_eq!(plain.to_string(), "console closed while in state Start");

        let timed_out = Error::ConsoleClosed {
            state: State::Booting,
            cause: Some(io::Error::new(io::ErrorKind::TimedOut, "console idle")),
        };
        assert_eq!(
            timed_out.to_string(),
            "console closed while in state Booting: console idle"
        );
    }
}
