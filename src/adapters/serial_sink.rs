//! Serial event sink adapter.
//!
//! Implements [`EventSink`] by rendering the events the analysis controller
//! cares about as protocol lines (see [`crate::serial::report`]) and handing
//! them to a [`HostLink`].

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, HostLink};
use crate::serial::report;

/// Adapter that forwards protocol-relevant [`AppEvent`]s over the host link.
pub struct SerialEventSink<L: HostLink> {
    link: L,
}

impl<L: HostLink> SerialEventSink<L> {
    pub fn new(link: L) -> Self {
        Self { link }
    }

    /// Borrow the underlying link (e.g. to flush a UART).
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }
}

impl<L: HostLink> EventSink for SerialEventSink<L> {
    fn emit(&mut self, event: &AppEvent) {
        if let Some(line) = report::render(event) {
            self.link.send_line(&line);
        }
    }
}
