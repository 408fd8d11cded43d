//! XMODEM-CRC sender.
//!
//! The boot monitor receives images with XMODEM in CRC mode: it asks for the
//! transfer by sending `C`, then acknowledges each 128 byte block. The `C`
//! itself is consumed by the console scanner, so the sender starts right away
//! with the first block.

use std::{
    io::{self, Read, Write},
    thread,
    time::{Duration, Instant},
};

use crc::{Crc, CRC_16_XMODEM};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, log_enabled, trace, Level::Debug};

use crate::error::{Error, Result};

const SOH: u8 = 0x01;
const EOT: u8 = 0x04;
const ACK: u8 = 0x06;
const NAK: u8 = 0x15;
const CAN: u8 = 0x18;
const SUB: u8 = 0x1A;
const CRC_REQUEST: u8 = b'C';

const BLOCK_SIZE: usize = 128;

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Pushes data to an XMODEM-CRC receiver.
#[derive(Debug, Clone)]
pub(crate) struct Sender {
    /// How long to wait for the receiver to answer a block.
    response_timeout: Duration,
    /// How many times a block is sent before giving up.
    max_attempts: usize,
    progress: bool,
}
impl Sender {
    pub(crate) fn new() -> Self {
        Sender {
            response_timeout: Duration::from_secs(10),
            max_attempts: 10,
            progress: true,
        }
    }

    #[cfg(test)]
    fn quiet(response_timeout: Duration) -> Self {
        Sender {
            response_timeout,
            max_attempts: 3,
            progress: false,
        }
    }

    /// Send `data` over `port`, padding the last block with `SUB`.
    pub(crate) fn send<T: Read + Write>(&self, port: &mut T, data: &[u8], name: &str) -> Result<()> {
        let pb = if self.progress {
            ProgressBar::new(data.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(ProgressStyle::default_bar()
            .template("[SW] ⏩ Pushing {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .progress_chars("=>-"));
        pb.set_message(name.to_owned());

        for (index, chunk) in data.chunks(BLOCK_SIZE).enumerate() {
            // Block numbers start at 1 and wrap around.
            let number = ((index + 1) % 256) as u8;
            let block = build_block(number, chunk);
            if let Err(e) = self.send_block(port, &block, number) {
                pb.abandon();
                return Err(e);
            }
            pb.inc(chunk.len() as u64);
        }

        self.send_eot(port)?;
        pb.finish_with_message(format!("{} uploaded", name));
        Ok(())
    }

    fn send_block<T: Read + Write>(&self, port: &mut T, block: &[u8], number: u8) -> Result<()> {
        for attempt in 1..=self.max_attempts {
            trace!("block {} attempt {}", number, attempt);
            port.write_all(block)?;
            port.flush()?;

            loop {
                match self.read_response(port)? {
                    Some(ACK) => return Ok(()),
                    Some(NAK) | None => break,
                    Some(CAN) => return Err(Error::Xmodem("transfer cancelled by the receiver".into())),
                    // The receiver may repeat its request while the first
                    // block is in flight.
                    Some(CRC_REQUEST) => {}
                    Some(other) => debug!("ignoring unexpected byte {:#04x}", other),
                }
            }
        }
        if log_enabled!(Debug) {
            debug!(
                "giving up on block {}:\n{}",
                number,
                hexplay::HexViewBuilder::new(block)
                    .address_offset(0)
                    .row_width(16)
                    .finish()
            );
        }
        Err(Error::Xmodem(format!(
            "block {} not acknowledged after {} attempts",
            number, self.max_attempts
        )))
    }

    fn send_eot<T: Read + Write>(&self, port: &mut T) -> Result<()> {
        for _ in 0..self.max_attempts {
            port.write_all(&[EOT])?;
            port.flush()?;
            match self.read_response(port)? {
                Some(ACK) => return Ok(()),
                Some(CAN) => return Err(Error::Xmodem("transfer cancelled by the receiver".into())),
                other => trace!("EOT answered with {:?}", other),
            }
        }
        Err(Error::Xmodem("end of transmission not acknowledged".into()))
    }

    /// Wait for one byte from the receiver. `None` when it stays silent for
    /// longer than the response timeout.
    fn read_response<T: Read>(&self, port: &mut T) -> Result<Option<u8>> {
        let deadline = Instant::now() + self.response_timeout;
        let mut byte = [0u8; 1];
        while Instant::now() < deadline {
            match port.read(&mut byte) {
                Ok(0) => {
                    return Err(Error::Xmodem("receiver closed the connection".into()));
                }
                Ok(_) => return Ok(Some(byte[0])),
                Err(ref e)
                    if e.kind() == io::ErrorKind::TimedOut
                        || e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::Interrupted =>
                {
                    thread::sleep(Duration::from_millis(1));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(None)
    }
}

/// Frame one block: `SOH`, the block number and its complement, the padded
/// payload and its CRC-16 (big endian).
fn build_block(number: u8, chunk: &[u8]) -> Vec<u8> {
    let mut block = Vec::with_capacity(BLOCK_SIZE + 5);
    block.push(SOH);
    block.push(number);
    block.push(!number);
    block.extend_from_slice(chunk);
    block.resize(3 + BLOCK_SIZE, SUB);
    let crc = CRC16.checksum(&block[3..]);
    block.extend_from_slice(&crc.to_be_bytes());
    block
}

//==============================================================================
// Unit Tests
//==============================================================================

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    /// A receiver answering with scripted bytes and recording what it gets.
    #[derive(Default)]
    struct Receiver {
        answers: VecDeque<u8>,
        received: Vec<u8>,
        writes: usize,
    }
    impl Read for Receiver {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.answers.pop_front() {
                Some(b) => {
                    buf[0] = b;
                    Ok(1)
                }
                None => Err(io::Error::new(io::ErrorKind::TimedOut, "silent")),
            }
        }
    }
    impl Write for Receiver {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            self.received.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn sender() -> Sender {
        Sender::quiet(Duration::from_millis(20))
    }

    #[test]
    fn crc_matches_the_reference_value() {
        assert_eq!(CRC16.checksum(b"123456789"), 0x31C3);
    }

    #[test]
    fn block_is_padded_and_framed() {
        let block = build_block(1, b"hello");
        assert_eq!(block.len(), 133);
        assert_eq!(&block[..3], &[SOH, 0x01, 0xFE]);
        assert_eq!(&block[3..8], b"hello");
        assert!(block[8..131].iter().all(|b| *b == SUB));
        let crc = CRC16.checksum(&block[3..131]);
        assert_eq!(&block[131..], &crc.to_be_bytes());
    }

    #[test]
    fn sends_all_blocks_then_eot() {
        let data: Vec<u8> = (0..=255u8).cycle().take(300).collect();
        let mut rx = Receiver {
            answers: vec![ACK, ACK, ACK, ACK].into(),
            ..Default::default()
        };
        sender().send(&mut rx, &data, "test").unwrap();

        assert_eq!(rx.received.len(), 3 * 133 + 1);
        assert_eq!(&rx.received[..3], &[SOH, 1, 0xFE]);
        assert_eq!(&rx.received[133..136], &[SOH, 2, 0xFD]);
        assert_eq!(&rx.received[266..269], &[SOH, 3, 0xFC]);
        assert_eq!(&rx.received[3..131], &data[..128]);
        assert_eq!(rx.received.last(), Some(&EOT));
    }

    #[test]
    fn nak_resends_the_block() {
        let mut rx = Receiver {
            answers: vec![b'C', NAK, ACK, NAK, ACK].into(),
            ..Default::default()
        };
        sender().send(&mut rx, b"firmware", "test").unwrap();

        assert_eq!(rx.writes, 4);
        assert_eq!(rx.received[..133], rx.received[133..266]);
        assert_eq!(&rx.received[266..], &[EOT, EOT]);
    }

    #[test]
    fn cancel_aborts() {
        let mut rx = Receiver {
            answers: vec![CAN].into(),
            ..Default::default()
        };
        let err = sender().send(&mut rx, b"firmware", "test").unwrap_err();
        assert!(err.to_string().contains("cancelled"));
        assert_eq!(rx.writes, 1);
    }

    #[test]
    fn silent_receiver_fails_after_max_attempts() {
        let mut rx = Receiver::default();
        let err = sender().send(&mut rx, b"firmware", "test").unwrap_err();
        assert_eq!(
            err.to_string(),
            "xmodem transfer failed: block 1 not acknowledged after 3 attempts"
        );
        assert_eq!(rx.writes, 3);
    }
}
