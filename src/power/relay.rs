//! HTTP client for the power relay.
//!
//! The relay exposes its first output at `http://<host>/relay/0`. A plain
//! `GET` returns the output status as JSON; adding `turn=on` or `turn=off` to
//! the query switches it and returns the new status.

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;

use super::PowerControl;
use crate::error::{Error, Result};

/// Status of a relay output as reported by the device. Only `ison` is
/// required, the timer and power fields are informational.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RelayStatus {
    pub ison: bool,
    #[serde(default)]
    pub has_timer: bool,
    #[serde(default)]
    pub timer_started_at: i64,
    #[serde(default)]
    pub timer_duration: f32,
    #[serde(default)]
    pub timer_remaining: f32,
    #[serde(default)]
    pub overpower: bool,
    #[serde(default)]
    pub source: Option<String>,
}

/// A relay reachable over HTTP.
#[derive(Debug, Clone)]
pub struct Relay {
    url: String,
    client: Client,
}
impl Relay {
    /// Create a client for the relay at `host` (an IP address or a host
    /// name, optionally with a port).
    pub fn new(host: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .no_proxy()
            .build()?;
        Ok(Relay {
            url: format!("http://{}/relay/0", host),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the current status of the relay output.
    pub fn status(&self) -> Result<RelayStatus> {
        debug!("GET {}", self.url);
        let status = self
            .client
            .get(&self.url)
            .send()?
            .error_for_status()?
            .json::<RelayStatus>()?;
        debug!("{:?}", status);
        Ok(status)
    }

    fn turn(&self, on: bool) -> Result<RelayStatus> {
        let turn = if on { "on" } else { "off" };
        debug!("GET {}?turn={}", self.url, turn);
        let status = self
            .client
            .get(&self.url)
            .query(&[("turn", turn)])
            .send()?
            .error_for_status()?
            .json::<RelayStatus>()?;
        debug!("{:?}", status);
        Ok(status)
    }
}
impl PowerControl for Relay {
    fn is_on(&self) -> Result<bool> {
        Ok(self.status()?.ison)
    }

    fn set_on(&self, on: bool) -> Result<()> {
        let status = self.turn(on)?;
        if status.ison != on {
            return Err(Error::RelayState {
                turn: if on { "on" } else { "off" },
            });
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[test]
fn full_status_is_decoded() {
    let status: RelayStatus = serde_json::from_str(
        r#"{"ison":true,"has_timer":false,"timer_started_at":0,"timer_duration":0,
            "timer_remaining":0,"overpower":false,"source":"http"}"#,
    )
    .unwrap();
    assert!(status.ison);
    assert_eq!(status.source.as_deref(), Some("http"));
}

#[test]
fn only_ison_is_required() {
    let status: RelayStatus = serde_json::from_str(r#"{"ison":false}"#).unwrap();
    assert!(!status.ison);
    assert!(!status.has_timer);
    assert!(serde_json::from_str::<RelayStatus>(r#"{"source":"http"}"#).is_err());
}

#[test]
fn url_points_at_the_first_output() {
    let relay = Relay::new("192.168.33.2").unwrap();
    assert_eq!(relay.url(), "http://192.168.33.2/relay/0");
}
