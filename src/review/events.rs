//! Events driving review and viewing sessions.
//!
//! Every trigger (a key press, Ctrl+C, a viewer exiting, a timer tick) is
//! turned into a [`ReviewEvent`] and sent into one `std::sync::mpsc` channel.
//! A single session loop consumes the channel, so state changes never
//! overlap.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::store::Decision;

/// A request for the session loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewEvent {
    /// Whitelist the current item.
    Accept,
    /// Blacklist the current item.
    Reject,
    /// End the session, leaving remaining items untouched.
    Quit,
    /// Move on without deciding (viewing-mode timer).
    Advance,
    /// The playback surface finished showing the current item.
    Finished,
}

impl ReviewEvent {
    /// The decision this event records, if any.
    #[must_use]
    pub fn decision(self) -> Option<Decision> {
        match self {
            Self::Accept => Some(Decision::Accepted),
            Self::Reject => Some(Decision::Rejected),
            Self::Quit | Self::Advance | Self::Finished => None,
        }
    }
}

/// Create the single-consumer event channel for a session.
#[must_use]
pub fn channel() -> (Sender<ReviewEvent>, Receiver<ReviewEvent>) {
    mpsc::channel()
}
