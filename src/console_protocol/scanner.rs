//! Lexical scanner for the switch console.
//!
//! The scanner reads the console one byte at a time, without any buffering of
//! its own, so that the serial port can be handed over to other users (e.g. an
//! XMODEM upload) between two tokens without losing data. It keeps exactly one
//! byte of look-ahead which can be pushed back with [`Scanner::unread`].

use std::io::{self, Read};

use log::trace;

use super::tokens::{is_usable_prompt, Token, DEFAULT_PROMPT};

// =============================================================================
// Public Interface
// =============================================================================

/// Turns the raw console byte stream into a sequence of [`Token`]s.
///
/// **Example**
/// ```
/// use std::io::Cursor;
/// use swctl::console_protocol::{Scanner, Token};
///
/// let mut scanner = Scanner::new(Cursor::new("Enter Debug Mode\r\nXMG1915-10E> "));
/// assert_eq!(scanner.scan(), (Token::DebugMode, "Enter Debug Mode".to_string()));
/// assert_eq!(scanner.scan(), (Token::Prompt, "XMG1915-10E> ".to_string()));
/// assert_eq!(scanner.scan().0, Token::Eof);
/// ```
#[derive(Debug)]
pub struct Scanner<R> {
    reader: R,
    /// The exact bytes of the device prompt. Never empty.
    prompt: Vec<u8>,
    /// The most recently read byte, `None` after the end of the stream.
    last: Option<u8>,
    /// When `true`, the next read returns `last` again.
    pushed_back: bool,
    /// Sticky end of stream.
    eof: bool,
    /// The error that terminated the stream, if any.
    error: Option<io::Error>,
    /// The bytes of the last scanned token, as received.
    raw: Vec<u8>,
}
impl<R: Read> Scanner<R> {
    /// Create a scanner recognizing the default `XMG1915-10E` prompt.
    pub fn new(reader: R) -> Self {
        Scanner::with_prompt(reader, DEFAULT_PROMPT)
    }

    /// Create a scanner recognizing a custom device prompt.
    ///
    /// # Panics
    ///
    /// If `prompt` is empty or starts with `.` or `C`, which are single
    /// character tokens of their own.
    pub fn with_prompt(reader: R, prompt: &str) -> Self {
        assert!(
            is_usable_prompt(prompt),
            "the device prompt cannot be empty or start with '.' or 'C'"
        );
        Scanner {
            reader,
            prompt: prompt.as_bytes().to_vec(),
            last: None,
            pushed_back: false,
            eof: false,
            error: None,
            raw: Vec::new(),
        }
    }

    /// Scan the next token and return it with the literal text it was made of.
    ///
    /// Blocks until a complete token is available. Once the stream has ended,
    /// every call returns [`Token::Eof`] with an empty literal.
    pub fn scan(&mut self) -> (Token, String) {
        self.raw.clear();
        let (token, literal) = match self.read() {
            None => (Token::Eof, String::new()),
            Some(b'.') => {
                self.raw.push(b'.');
                (Token::Dot, ".".into())
            }
            Some(b'C') => {
                self.raw.push(b'C');
                (Token::XmodemC, "C".into())
            }
            Some(ch) if ch == self.prompt[0] => {
                self.unread();
                self.scan_prompt()
            }
            Some(_) => {
                self.unread();
                self.scan_line()
            }
        };
        trace!("{} {:?}", token, literal);
        (token, literal)
    }

    /// Push back the most recently read byte. Only one byte of look-ahead is
    /// supported: calling this twice in a row has the same effect as calling
    /// it once.
    pub fn unread(&mut self) {
        self.pushed_back = true;
    }

    /// Take the I/O error that ended the stream, if the stream did not end
    /// normally.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    /// The bytes the last token was made of, exactly as the console sent
    /// them. Unlike the literal returned by [`Scanner::scan`], invalid UTF-8
    /// is kept as is. Line terminators are not included.
    pub fn last_raw(&self) -> &[u8] {
        &self.raw
    }
}

// =============================================================================
// Private stuff
// =============================================================================

impl<R: Read> Scanner<R> {
    fn read(&mut self) -> Option<u8> {
        if self.pushed_back {
            self.pushed_back = false;
            return self.last;
        }
        if self.eof {
            self.last = None;
            return None;
        }

        let mut byte = [0u8; 1];
        self.last = loop {
            match self.reader.read(&mut byte) {
                Ok(0) => {
                    self.eof = true;
                    break None;
                }
                Ok(_) => break Some(byte[0]),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    trace!("console stream ended with error: {}", e);
                    self.error = Some(e);
                    self.eof = true;
                    break None;
                }
            }
        };
        self.last
    }

    /// Compare the input against the prompt, byte for byte. There is no
    /// backtracking: on a mismatch, everything read so far (including the
    /// mismatching byte) is returned as [`Token::Unknown`].
    fn scan_prompt(&mut self) -> (Token, String) {
        for index in 0..self.prompt.len() {
            let expected = self.prompt[index];
            match self.read() {
                None => {
                    self.raw.clear();
                    return (Token::Eof, String::new());
                }
                Some(ch) => {
                    self.raw.push(ch);
                    if ch != expected {
                        return (Token::Unknown, String::from_utf8_lossy(&self.raw).into_owned());
                    }
                }
            }
        }
        (Token::Prompt, String::from_utf8_lossy(&self.raw).into_owned())
    }

    /// Accumulate bytes up to a line terminator (`\n`, `\r\n` or a lone `\r`)
    /// and classify the line.
    fn scan_line(&mut self) -> (Token, String) {
        loop {
            match self.read() {
                None => {
                    self.raw.clear();
                    return (Token::Eof, String::new());
                }
                Some(b'\r') => {
                    if self.read() != Some(b'\n') {
                        self.unread();
                    }
                    break;
                }
                Some(b'\n') => break,
                Some(ch) => self.raw.push(ch),
            }
        }
        let line = String::from_utf8_lossy(&self.raw).into_owned();
        (Token::classify(&line), line)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::console_protocol::tokens::*;

    fn scan_all(input: &[u8]) -> Vec<(Token, String)> {
        let mut scanner = Scanner::new(Cursor::new(input.to_vec()));
        let mut tokens = Vec::new();
        loop {
            let (token, literal) = scanner.scan();
            if token == Token::Eof {
                break;
            }
            tokens.push((token, literal));
        }
        tokens
    }

    #[test]
    fn empty_stream_is_eof_forever() {
        let mut scanner = Scanner::new(Cursor::new(Vec::new()));
        for _ in 0..3 {
            assert_eq!(scanner.scan(), (Token::Eof, String::new()));
        }
        assert!(scanner.take_error().is_none());
    }

    #[test]
    fn banners_yield_their_token() {
        for (text, token) in &[
            (PRESS_ANY_KEY_STR, Token::PressAnyKey),
            (DEBUG_MODE_STR, Token::DebugMode),
            (XMODEM_STARTING_STR, Token::XmodemStart),
            (OK_STR, Token::Ok),
            (BAUDSET_DONE_STR, Token::BaudsetDone),
        ] {
            let input = format!("{}\n", text);
            assert_eq!(
                scan_all(input.as_bytes()),
                vec![(*token, text.to_string())],
                "scanning {:?}",
                text
            );
        }
    }

    #[test]
    fn prompt_is_recognized_without_terminator() {
        assert_eq!(
            scan_all(b"XMG1915-10E> "),
            vec![(Token::Prompt, DEFAULT_PROMPT.to_string())]
        );
    }

    #[test]
    fn single_character_markers() {
        assert_eq!(
            scan_all(b"..C"),
            vec![
                (Token::Dot, ".".to_string()),
                (Token::Dot, ".".to_string()),
                (Token::XmodemC, "C".to_string()),
            ]
        );
    }

    #[test]
    fn other_text_is_a_line() {
        assert_eq!(
            scan_all(b"Bootbase Version: V1.00\n"),
            vec![(Token::Line, "Bootbase Version: V1.00".to_string())]
        );
    }

    #[test]
    fn terminators_are_equivalent() {
        let expected = vec![(Token::Ok, "OK".to_string())];
        assert_eq!(scan_all(b"OK\n"), expected);
        assert_eq!(scan_all(b"OK\r\n"), expected);
        assert_eq!(scan_all(b"OK\r"), expected);
    }

    #[test]
    fn lone_carriage_return_ends_the_line() {
        assert_eq!(
            scan_all(b"OK\rBAUDSET DONE\r\n"),
            vec![
                (Token::Ok, "OK".to_string()),
                (Token::BaudsetDone, "BAUDSET DONE".to_string()),
            ]
        );
    }

    #[test]
    fn empty_lines_are_lines() {
        assert_eq!(
            scan_all(b"\r\n\n"),
            vec![(Token::Line, String::new()), (Token::Line, String::new())]
        );
    }

    #[test]
    fn prompt_mismatch_is_unknown_and_consumed() {
        assert_eq!(
            scan_all(b"XMG1916\n"),
            vec![
                (Token::Unknown, "XMG1916".to_string()),
                (Token::Line, String::new()),
            ]
        );
    }

    #[test]
    fn partial_content_at_eof_is_discarded() {
        assert_eq!(scan_all(b"XMG19"), vec![]);
        assert_eq!(scan_all(b"Enter Debug"), vec![]);

        let mut scanner = Scanner::new(Cursor::new(b"OK\nhalf a line".to_vec()));
        assert_eq!(scanner.scan().0, Token::Ok);
        assert_eq!(scanner.scan(), (Token::Eof, String::new()));
        assert_eq!(scanner.scan(), (Token::Eof, String::new()));
    }

    #[test]
    fn custom_prompt() {
        let mut scanner = Scanner::with_prompt(Cursor::new(b"GS1900# ".to_vec()), "GS1900# ");
        assert_eq!(scanner.scan(), (Token::Prompt, "GS1900# ".to_string()));
    }

    #[test]
    #[should_panic]
    fn prompt_starting_like_a_marker_is_rejected() {
        Scanner::with_prompt(Cursor::new(b"CLI> ".to_vec()), "CLI> ");
    }

    #[test]
    #[should_panic]
    fn empty_prompt_is_rejected() {
        Scanner::with_prompt(Cursor::new(Vec::new()), "");
    }

    #[test]
    fn raw_bytes_of_unknown_output_are_kept() {
        let mut scanner = Scanner::new(Cursor::new(vec![b'X', 0xFF, b'\n']));
        let (token, literal) = scanner.scan();
        assert_eq!(token, Token::Unknown);
        assert_eq!(literal, "X\u{FFFD}");
        assert_eq!(scanner.last_raw(), &[b'X', 0xFF]);

        assert_eq!(scanner.scan(), (Token::Line, String::new()));
        assert!(scanner.last_raw().is_empty());
    }

    #[test]
    fn raw_bytes_of_a_line() {
        let mut scanner = Scanner::new(Cursor::new(b"..OK\r\n".to_vec()));
        assert_eq!(scanner.scan().0, Token::Dot);
        assert_eq!(scanner.last_raw(), b".");
        scanner.scan();
        assert_eq!(scanner.scan().0, Token::Ok);
        assert_eq!(scanner.last_raw(), b"OK");
    }

    #[test]
    fn unread_pushes_back_one_byte() {
        let mut scanner = Scanner::new(Cursor::new(b"ab".to_vec()));
        assert_eq!(scanner.read(), Some(b'a'));
        scanner.unread();
        scanner.unread();
        assert_eq!(scanner.read(), Some(b'a'));
        assert_eq!(scanner.read(), Some(b'b'));
        assert_eq!(scanner.read(), None);
    }

    struct Broken;
    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::TimedOut, "console idle"))
        }
    }

    #[test]
    fn read_errors_end_the_stream() {
        let mut scanner = Scanner::new(Broken);
        assert_eq!(scanner.scan().0, Token::Eof);
        let error = scanner.take_error().expect("the error is kept");
        assert_eq!(error.kind(), io::ErrorKind::TimedOut);
        assert_eq!(scanner.scan().0, Token::Eof);
    }
}
