//! Interactive console session with the booted switch.
//!
//! Two independent directions run concurrently, each on its own handle to the
//! serial port: the device output is copied to stdout, and the operator input
//! is copied to the device. When stdin is a terminal, it is put in raw mode so
//! that every key reaches the device as typed.

use std::{
    io::{self, Read, Write},
    process,
    sync::mpsc,
    thread,
};

use console::style;
use crossterm::{
    event::{read, Event},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use log::{debug, info};
use serialport::SerialPort;

use crate::error::{Error, Result};
use crate::utils::{key_to_bytes, KeyAction};

/// Relay the console between the operator and the device. Only returns on a
/// transport error; the session otherwise ends with the process.
pub fn interact(port: Box<dyn SerialPort>) -> Result<()> {
    let mut device_out = port.try_clone()?;
    let mut device_in = port;

    println!(
        "{}",
        style("[SW] 🔗 Connected to the switch console (Ctrl+C to quit)").green()
    );

    let (done_tx, done_rx) = mpsc::channel::<(&'static str, Result<()>)>();

    let output_tx = done_tx.clone();
    thread::spawn(move || {
        let result = copy_device_output(&mut device_out);
        let _ = output_tx.send(("device output", result));
    });

    thread::spawn(move || {
        let result = if console::user_attended() {
            forward_keys(&mut device_in)
        } else {
            forward_stdin(&mut device_in)
        };
        let _ = done_tx.send(("operator input", result));
    });

    // Stdin running dry only stops that direction; the device output keeps
    // flowing until the port fails.
    for (direction, result) in done_rx {
        match result {
            Ok(()) => info!("{} closed", direction),
            Err(e) => {
                debug!("{} failed: {}", direction, e);
                return Err(e);
            }
        }
    }
    Ok(())
}

fn copy_device_output<R: Read + ?Sized>(device: &mut R) -> Result<()> {
    let mut buf = [0u8; 4096];
    let stdout = io::stdout();
    loop {
        match device.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(count) => {
                let mut out = stdout.lock();
                out.write_all(&buf[..count])?;
                out.flush()?;
            }
            Err(ref e)
                if e.kind() == io::ErrorKind::TimedOut
                    || e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
}

fn forward_stdin<W: Write + ?Sized>(device: &mut W) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut buf = [0u8; 1024];
    loop {
        let count = input.read(&mut buf)?;
        if count == 0 {
            return Ok(());
        }
        device.write_all(&buf[..count])?;
        device.flush()?;
    }
}

fn forward_keys<W: Write + ?Sized>(device: &mut W) -> Result<()> {
    enable_raw_mode().map_err(term_error)?;
    let result = loop {
        let event = match read() {
            Ok(event) => event,
            Err(e) => break Err(term_error(e)),
        };
        if let Event::Key(key) = event {
            match key_to_bytes(key) {
                KeyAction::Send(bytes) => {
                    if let Err(e) = device.write_all(&bytes).and_then(|_| device.flush()) {
                        break Err(e.into());
                    }
                }
                KeyAction::Quit => {
                    let _ = disable_raw_mode();
                    println!();
                    println!("🛑 received Ctrl+C!");
                    process::exit(0);
                }
                KeyAction::Ignore => {}
            }
        }
    };
    let _ = disable_raw_mode();
    result
}

fn term_error(error: crossterm::ErrorKind) -> Error {
    Error::Io(io::Error::new(io::ErrorKind::Other, error.to_string()))
}
