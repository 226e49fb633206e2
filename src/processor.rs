//! Event processor task
//!
//! Drains the stack event queue and hands every event to the [`HidHost`].
//! There is a single consumer, so host state needs no locking; stack
//! callbacks only enqueue through [`crate::api`].
//!
//! ```rust,no_run
//! use tvpad::{HidHost, HidHostOptions, processor};
//!
//! # async fn example<S: tvpad::BluetoothStack, I: tvpad::IrTransmitter>(stack: S, ir: I) -> Result<(), tvpad::BluetoothError> {
//! let mut host = HidHost::new(HidHostOptions::default(), stack, ir)?;
//! processor::run(&mut host).await;
//! # }
//! ```

use crate::{BluetoothStack, EVENT_CHANNEL, HidHost, IrTransmitter, event::StackEvent};

/// Start the host, then process stack events forever
///
/// A failing start is logged; events are still processed so a stack that
/// powers on by itself keeps working.
pub async fn run<S: BluetoothStack, I: IrTransmitter>(host: &mut HidHost<S, I>) -> ! {
    if let Err(e) = host.start() {
        error!("[PROCESSOR] Failed to start HID host: {:?}", e);
    }

    loop {
        process_next(host).await;
        embassy_futures::yield_now().await;
    }
}

/// Wait for one event and handle it to completion
pub async fn process_next<S: BluetoothStack, I: IrTransmitter>(host: &mut HidHost<S, I>) {
    let event: StackEvent = EVENT_CHANNEL.receive().await;
    host.handle_event(&event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        HidHostOptions, HidHostState, api,
        constants::EVENT_QUEUE_DEPTH,
        event::StackState,
        testing::{MockStack, RecordingIr, StackCall},
    };
    use embassy_futures::{block_on, select::select};

    // The event queue is a process-wide static, so every use of it lives in
    // this single test.
    #[test]
    fn test_events_flow_from_api_to_host() {
        let mut host = HidHost::new(
            HidHostOptions::default(),
            MockStack::default(),
            RecordingIr::default(),
        )
        .unwrap();

        block_on(async {
            api::post_event(StackEvent::StackState(StackState::Working)).await;
            api::try_post_event(StackEvent::ConnectionCountChanged(1)).unwrap();
            process_next(&mut host).await;
            process_next(&mut host).await;
        });
        assert_eq!(host.state(), HidHostState::Discovering);
        assert!(host.is_device_connected());

        for _ in 0..EVENT_QUEUE_DEPTH {
            api::try_post_event(StackEvent::ConnectionCountChanged(1)).unwrap();
        }
        assert!(matches!(
            api::try_post_event(StackEvent::ConnectionCountChanged(0)),
            Err(crate::BluetoothError::QueueFull)
        ));

        block_on(select(run(&mut host), async {
            while !EVENT_CHANNEL.is_empty() {
                embassy_futures::yield_now().await;
            }
        }));
        assert!(EVENT_CHANNEL.is_empty());
        assert_eq!(
            &host.stack().calls[1..],
            &[
                StackCall::LinkPolicy(crate::LinkPolicy::ENABLE_SNIFF_MODE),
                StackCall::PowerOn
            ]
        );
    }
}
