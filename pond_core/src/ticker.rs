//! Fixed-period event source.

use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::pond::PondEvent;

/// Send `make()` every `period` until the pond hangs up.
pub fn spawn_ticker(period: Duration, tx: Sender<PondEvent>, make: fn() -> PondEvent) -> JoinHandle<()> {
    thread::spawn(move || loop {
        thread::sleep(period);
        if tx.send(make()).is_err() {
            tracing::debug!(target: "koi_pond::ticker", "ticker.stopped");
            break;
        }
    })
}
