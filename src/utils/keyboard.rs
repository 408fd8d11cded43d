//! Translation of terminal key events to the bytes sent to the switch.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What to do with a key pressed by the operator.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) enum KeyAction {
    /// Send these bytes to the device.
    Send(Vec<u8>),
    /// Leave the session.
    Quit,
    Ignore,
}

pub(crate) fn key_to_bytes(key: KeyEvent) -> KeyAction {
    let control = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    let bytes: Vec<u8> = match key.code {
        // As we are in raw mode, Ctrl+C is captured here as a key event.
        KeyCode::Char('c') | KeyCode::Char('C') if control => return KeyAction::Quit,
        KeyCode::Char(c) if control && c.is_ascii_alphabetic() => {
            vec![(c.to_ascii_lowercase() as u8) & 0x1f]
        }
        KeyCode::Char(c) => {
            let mut buf = [0u8; 4];
            let mut bytes = Vec::with_capacity(5);
            if alt {
                bytes.push(0x1b);
            }
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            bytes
        }
        KeyCode::Enter => vec![b'\r'],
        KeyCode::Backspace => vec![0x7f],
        KeyCode::Tab => vec![b'\t'],
        KeyCode::Esc => vec![0x1b],
        KeyCode::Up => b"\x1b[A".to_vec(),
        KeyCode::Down => b"\x1b[B".to_vec(),
        KeyCode::Right => b"\x1b[C".to_vec(),
        KeyCode::Left => b"\x1b[D".to_vec(),
        KeyCode::Home => b"\x1b[H".to_vec(),
        KeyCode::End => b"\x1b[F".to_vec(),
        KeyCode::Delete => b"\x1b[3~".to_vec(),
        _ => return KeyAction::Ignore,
    };
    KeyAction::Send(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent { code, modifiers }
    }

    #[test]
    fn printable_characters() {
        assert_eq!(
            key_to_bytes(key(KeyCode::Char('a'), KeyModifiers::NONE)),
            KeyAction::Send(vec![b'a'])
        );
        assert_eq!(
            key_to_bytes(key(KeyCode::Char('A'), KeyModifiers::SHIFT)),
            KeyAction::Send(vec![b'A'])
        );
        assert_eq!(
            key_to_bytes(key(KeyCode::Char('é'), KeyModifiers::NONE)),
            KeyAction::Send("é".as_bytes().to_vec())
        );
    }

    #[test]
    fn control_keys() {
        assert_eq!(
            key_to_bytes(key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            KeyAction::Quit
        );
        assert_eq!(
            key_to_bytes(key(KeyCode::Char('d'), KeyModifiers::CONTROL)),
            KeyAction::Send(vec![0x04])
        );
        assert_eq!(
            key_to_bytes(key(KeyCode::Char('x'), KeyModifiers::ALT)),
            KeyAction::Send(vec![0x1b, b'x'])
        );
    }

    #[test]
    fn editing_keys() {
        assert_eq!(
            key_to_bytes(key(KeyCode::Enter, KeyModifiers::NONE)),
            KeyAction::Send(vec![b'\r'])
        );
        assert_eq!(
            key_to_bytes(key(KeyCode::Up, KeyModifiers::NONE)),
            KeyAction::Send(b"\x1b[A".to_vec())
        );
        assert_eq!(
            key_to_bytes(key(KeyCode::F(5), KeyModifiers::NONE)),
            KeyAction::Ignore
        );
    }
}
