//! The driver loop feeding the scanner output into the state machine.

use std::io::Read;

use hexplay::HexViewBuilder;
use log::{debug, info, log_enabled, Level::Debug};

use super::{Callbacks, Scanner, State, StateMachine, Token};
use crate::error::{Error, Result};

/// Runs the console state machine over a console byte stream.
///
/// **Example**
/// ```ignore
/// let mut automator = Automator::new(Scanner::new(reader), StateMachine::new(actions));
/// automator.run()?;
/// ```
#[derive(Debug)]
pub struct Automator<R, C> {
    scanner: Scanner<R>,
    machine: StateMachine<C>,
}
impl<R: Read, C: Callbacks> Automator<R, C> {
    pub fn new(scanner: Scanner<R>, machine: StateMachine<C>) -> Self {
        Automator { scanner, machine }
    }

    /// Scan one token and feed it to the state machine. Returns `Ok(true)`
    /// once the device booted.
    ///
    /// The end of the console stream before that point is an error.
    pub fn step(&mut self) -> Result<bool> {
        let (token, literal) = self.scanner.scan();
        if token == Token::Eof && self.machine.state() != State::Done {
            return Err(Error::ConsoleClosed {
                state: self.machine.state(),
                cause: self.scanner.take_error(),
            });
        }
        if token == Token::Unknown && log_enabled!(Debug) {
            let view = HexViewBuilder::new(self.scanner.last_raw())
                .address_offset(0)
                .row_width(16)
                .finish();
            debug!("unrecognized console output:\n{}", view);
        }
        self.machine.advance(token, &literal)
    }

    /// Run the state machine to completion.
    pub fn run(&mut self) -> Result<()> {
        info!("=> {}", self.machine.state());
        while !self.step()? {}
        Ok(())
    }

    /// The current protocol state.
    pub fn state(&self) -> State {
        self.machine.state()
    }

    pub fn into_parts(self) -> (Scanner<R>, StateMachine<C>) {
        (self.scanner, self.machine)
    }
}
