use std::future;
use std::pin::Pin;
use std::time::Duration;

use log::debug;
use tokio::time::{Instant, Sleep};

/// One-shot timer guarding the initial connect.
///
/// Disarmed, `expired()` never resolves, so it can sit in a `select!`
/// branch unconditionally.
#[derive(Debug, Default)]
pub struct Watchdog {
    sleep: Option<Pin<Box<Sleep>>>,
}

impl Watchdog {
    /// Arms (or re-arms) the timer. Must be called inside a tokio runtime.
    pub fn arm(&mut self, after: Duration) {
        debug!("Watchdog armed for {:?}", after);
        self.sleep = Some(Box::pin(tokio::time::sleep_until(Instant::now() + after)));
    }

    pub fn cancel(&mut self) {
        if self.sleep.take().is_some() {
            debug!("Watchdog cancelled");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.sleep.is_some()
    }

    /// Resolves once when the armed deadline passes, then disarms.
    pub async fn expired(&mut self) {
        match self.sleep.as_mut() {
            Some(sleep) => {
                sleep.as_mut().await;
                self.sleep = None;
            }
            None => future::pending::<()>().await,
        }
    }
}
