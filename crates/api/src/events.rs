//! Post-commit booking events.
//!
//! Handlers emit an event after the booking transaction commits. The
//! channel is unbounded so a send never blocks a request, and a send
//! failure is logged and swallowed: notification delivery must never
//! roll back or delay a committed booking.

use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BookingEvent {
    Reserved {
        booking_id: Uuid,
        customer_id: Uuid,
        provider_id: Uuid,
        time_slot_id: Uuid,
    },
    Held {
        booking_id: Uuid,
        customer_id: Uuid,
        provider_id: Uuid,
        time_slot_id: Uuid,
    },
    Confirmed {
        booking_id: Uuid,
        time_slot_id: Uuid,
    },
    Cancelled {
        booking_id: Uuid,
        time_slot_id: Uuid,
    },
}

pub fn channel() -> (UnboundedSender<BookingEvent>, UnboundedReceiver<BookingEvent>) {
    mpsc::unbounded_channel()
}

/// Consume events and log them. This is where a notification collaborator
/// would attach.
pub fn spawn_logger(mut rx: UnboundedReceiver<BookingEvent>) {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(payload) => tracing::info!(target: "slotbook::events", "{payload}"),
                Err(err) => tracing::warn!("Failed to encode booking event: {err}"),
            }
        }
    });
}

pub fn emit(tx: &UnboundedSender<BookingEvent>, event: BookingEvent) {
    if tx.send(event).is_err() {
        tracing::warn!("Booking event listener is gone; dropping event");
    }
}
