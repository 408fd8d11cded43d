//! Serial port device manipulation.

use std::{
    fmt,
    io::{self, Read},
    time::{Duration, Instant},
};

use log::{debug, info};
use serialport::SerialPort;

use crate::error::{Error, Result};
use crate::Settings;

//==============================================================================
// Public Interface
//==============================================================================

/// Open the serial port in `settings` and configure it.
///
/// The device node of a USB serial adapter powered by the switch may take a
/// moment to come back after a power cycle, so opening is retried a few times.
pub(crate) fn open_and_setup_port(settings: &Settings) -> Result<Box<dyn SerialPort>> {
    use retry::{delay, retry_with_index};

    let path = match &settings.path {
        Some(path) => path.clone(),
        None => return Err(Error::Usage("no serial port configured".into())),
    };

    let result = retry_with_index(
        delay::Fixed::from_millis(1000).take(4),
        |index| -> std::result::Result<Box<dyn SerialPort>, serialport::Error> {
            debug!("Trying to connect {}", index);
            serialport::new(&path, settings.baud_rate)
                .data_bits(settings.data_bits)
                .stop_bits(settings.stop_bits)
                .parity(settings.parity)
                .flow_control(settings.flow_control)
                .timeout(settings.read_timeout)
                .open()
        },
    );
    let mut port = match result {
        Ok(port) => port,
        Err(retry::Error::Operation {
            error,
            total_delay,
            tries,
        }) => {
            info!(
                "Failed to open the port after {:?} and {} tries: {}",
                total_delay, tries, error,
            );
            return Err(error.into());
        }
        Err(retry::Error::Internal(_)) => {
            info!("Internal retry error while opening port");
            return Err(serialport::Error::new(
                serialport::ErrorKind::Unknown,
                "internal error while retrying to open the port",
            )
            .into());
        }
    };

    // Some drivers ignore the builder values, set them again explicitly.
    port.set_baud_rate(settings.baud_rate)?;
    port.set_data_bits(settings.data_bits)?;
    port.set_stop_bits(settings.stop_bits)?;
    port.set_parity(settings.parity)?;
    port.set_flow_control(settings.flow_control)?;
    port.set_timeout(settings.read_timeout)?;

    info!("Connected to {} at {} baud", path, settings.baud_rate);
    debug!("{:?}", PortInfo(port.as_ref()));

    let actual = port.baud_rate()?;
    if actual != settings.baud_rate {
        return Err(serialport::Error::new(
            serialport::ErrorKind::InvalidInput,
            format!(
                "failed to set the baud rate to {} (port reports {})",
                settings.baud_rate, actual
            ),
        )
        .into());
    }

    Ok(port)
}

/// Debug view of an open serial port and its line parameters.
pub(crate) struct PortInfo<'a>(pub &'a dyn SerialPort);
impl fmt::Debug for PortInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_fmt_serialport!(self.0, f).finish()
    }
}

/// A blocking reader over the console.
///
/// Serial reads time out regularly; timeouts are swallowed so that a read
/// only returns with data or a real error. When an idle limit is set, a read
/// waiting longer than that fails with [`io::ErrorKind::TimedOut`].
pub(crate) struct ConsoleReader<R> {
    inner: R,
    idle_limit: Option<Duration>,
}
impl<R: Read> ConsoleReader<R> {
    pub(crate) fn new(inner: R, idle_limit: Option<Duration>) -> Self {
        ConsoleReader { inner, idle_limit }
    }
}
impl<R: Read> Read for ConsoleReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let started = Instant::now();
        loop {
            match self.inner.read(buf) {
                Ok(count) => return Ok(count),
                Err(ref e)
                    if e.kind() == io::ErrorKind::TimedOut
                        || e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::Interrupted =>
                {
                    if let Some(limit) = self.idle_limit {
                        if started.elapsed() >= limit {
                            return Err(io::Error::new(
                                io::ErrorKind::TimedOut,
                                format!("console silent for more than {:?}", limit),
                            ));
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

//==============================================================================
// Unit Tests
//==============================================================================

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    /// Times out `timeouts` times before each scripted chunk.
    struct Sluggish {
        chunks: VecDeque<&'static [u8]>,
        timeouts: usize,
        pending: usize,
    }
    impl Read for Sluggish {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pending > 0 {
                self.pending -= 1;
                std::thread::sleep(Duration::from_millis(1));
                return Err(io::Error::new(io::ErrorKind::TimedOut, "timed out"));
            }
            self.pending = self.timeouts;
            match self.chunks.pop_front() {
                Some(chunk) => {
                    buf[..chunk.len()].copy_from_slice(chunk);
                    Ok(chunk.len())
                }
                None => Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged")),
            }
        }
    }

    #[test]
    fn timeouts_are_retried() {
        let inner = Sluggish {
            chunks: vec![&b"OK"[..]].into(),
            timeouts: 5,
            pending: 5,
        };
        let mut reader = ConsoleReader::new(inner, None);
        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"OK");
        assert_eq!(
            reader.read(&mut buf).unwrap_err().kind(),
            io::ErrorKind::BrokenPipe
        );
    }

    #[test]
    fn idle_limit_ends_the_wait() {
        let inner = Sluggish {
            chunks: vec![&b"late"[..]].into(),
            timeouts: usize::MAX,
            pending: usize::MAX,
        };
        let mut reader = ConsoleReader::new(inner, Some(Duration::from_millis(20)));
        let mut buf = [0u8; 8];
        assert_eq!(
            reader.read(&mut buf).unwrap_err().kind(),
            io::ErrorKind::TimedOut
        );
    }
}
