//! Power control of the switch.
//!
//! The switch is fed through a remotely switchable relay. Rebooting it is the
//! precondition to any console automation: the boot monitor only offers its
//! debug mode for a second right after power on.

mod relay;

use std::{thread, time::Duration};

use log::info;

use crate::error::{Error, Result};

pub use relay::{Relay, RelayStatus};

// =============================================================================
// Public Interface
// =============================================================================

/// A remotely controlled power switch.
pub trait PowerControl {
    /// Query whether the power is currently on.
    fn is_on(&self) -> Result<bool>;

    /// Switch the power on or off. Succeeds only if the switch confirms the
    /// requested state.
    fn set_on(&self, on: bool) -> Result<()>;
}

/// Power cycle the device: if it is powered, switch it off and wait for
/// `settle` before switching it on again; otherwise simply switch it on.
pub fn reboot(power: &dyn PowerControl, settle: Duration) -> Result<()> {
    let on = power.is_on().map_err(|e| in_phase("check the power state", e))?;

    if on {
        info!("Powering off");
        power
            .set_on(false)
            .map_err(|e| in_phase("power off the switch", e))?;
        thread::sleep(settle);
    }

    info!("Powering on");
    power
        .set_on(true)
        .map_err(|e| in_phase("power on the switch", e))
}

/// Switch the device off.
pub fn power_off(power: &dyn PowerControl) -> Result<()> {
    info!("Powering off");
    power
        .set_on(false)
        .map_err(|e| in_phase("power off the switch", e))
}

// =============================================================================
// Private stuff
// =============================================================================

fn in_phase(phase: &'static str, error: Error) -> Error {
    Error::Power {
        phase,
        source: Box::new(error),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, time::Instant};

    use super::*;

    #[derive(Debug, PartialEq)]
    enum Call {
        IsOn,
        SetOn(bool, Instant),
    }

    struct MockPlug {
        on: RefCell<bool>,
        calls: RefCell<Vec<Call>>,
        refuse: Option<bool>,
    }
    impl MockPlug {
        fn new(on: bool) -> Self {
            MockPlug {
                on: RefCell::new(on),
                calls: RefCell::new(Vec::new()),
                refuse: None,
            }
        }
    }
    impl PowerControl for MockPlug {
        fn is_on(&self) -> Result<bool> {
            self.calls.borrow_mut().push(Call::IsOn);
            Ok(*self.on.borrow())
        }

        fn set_on(&self, on: bool) -> Result<()> {
            self.calls.borrow_mut().push(Call::SetOn(on, Instant::now()));
            if self.refuse == Some(on) {
                return Err(Error::RelayState {
                    turn: if on { "on" } else { "off" },
                });
            }
            *self.on.borrow_mut() = on;
            Ok(())
        }
    }

    #[test]
    fn reboot_when_on_cycles_once_with_settle_delay() {
        let plug = MockPlug::new(true);
        let settle = Duration::from_millis(50);
        reboot(&plug, settle).unwrap();

        let calls = plug.calls.borrow();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], Call::IsOn);
        match (&calls[1], &calls[2]) {
            (Call::SetOn(false, off_at), Call::SetOn(true, on_at)) => {
                assert!(on_at.duration_since(*off_at) >= settle);
            }
            other => panic!("unexpected calls {:?}", other),
        }
        assert!(*plug.on.borrow());
    }

    #[test]
    fn reboot_when_off_powers_on_once() {
        let plug = MockPlug::new(false);
        reboot(&plug, Duration::from_secs(10)).unwrap();

        let calls = plug.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], Call::IsOn);
        assert!(matches!(calls[1], Call::SetOn(true, _)));
    }

    #[test]
    fn reboot_failure_names_the_phase() {
        let mut plug = MockPlug::new(true);
        plug.refuse = Some(false);
        let err = reboot(&plug, Duration::from_millis(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to power off the switch: failed to turn the relay off"
        );
        // Never powered back on after the failure.
        assert_eq!(plug.calls.borrow().len(), 2);
    }

    #[test]
    fn power_off_switches_off() {
        let plug = MockPlug::new(true);
        power_off(&plug).unwrap();
        assert!(!*plug.on.borrow());
        assert_eq!(plug.calls.borrow().len(), 1);
    }
}
