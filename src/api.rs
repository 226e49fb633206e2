//! `TvPad` API Functions
//!
//! Entry points for the Bluetooth stack glue. Stack callbacks convert what
//! they receive into a [`StackEvent`] and queue it here; the
//! [`crate::processor`] task handles the queue in order.
//!
//! # Usage
//!
//! ```rust,no_run
//! use tvpad::{api, event::{StackEvent, StackState}};
//!
//! // From an async context
//! # async fn example() {
//! api::post_event(StackEvent::StackState(StackState::Working)).await;
//! # }
//!
//! // From inside a synchronous stack callback
//! if api::try_post_event(StackEvent::ConnectionCountChanged(0)).is_err() {
//!     // queue full, event dropped
//! }
//! ```

use crate::{BluetoothError, EVENT_CHANNEL, event::StackEvent};

/// Queue a stack event, waiting for room if the queue is full
pub async fn post_event(event: StackEvent) {
    EVENT_CHANNEL.send(event).await;
}

/// Queue a stack event without waiting
///
/// # Errors
///
/// Returns `BluetoothError::QueueFull` if the event queue has no room; the
/// event is dropped.
pub fn try_post_event(event: StackEvent) -> Result<(), BluetoothError> {
    EVENT_CHANNEL.try_send(event).map_err(|_| {
        warn!("[API] Event queue full, dropping event");
        BluetoothError::QueueFull
    })
}
