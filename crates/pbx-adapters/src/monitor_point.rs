//! A subscription point for events concerning one monitored device.
//! Mirrors the `pbx.MonitorPoint` interface and `osbiz.monitorPoint`'s
//! buffered `events chan csta.Message`.

use cra_csta_proto::Message;
use tokio::sync::broadcast;

/// Matches `defaultEventBufferSize`. A subscriber that falls this far behind
/// the event stream sees its oldest unread events replaced by
/// `RecvError::Lagged` on its next `recv()` — the broadcast channel's
/// built-in drop-oldest behavior is the policy wanted here, so no custom
/// ring buffer is needed.
const EVENT_BUFFER_SIZE: usize = 100;

pub struct MonitorPoint {
    extension: String,
    cross_reference_id: String,
    events: broadcast::Sender<Message>,
}

impl MonitorPoint {
    pub fn new(extension: impl Into<String>, cross_reference_id: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self {
            extension: extension.into(),
            cross_reference_id: cross_reference_id.into(),
            events,
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn cross_reference_id(&self) -> &str {
        &self.cross_reference_id
    }

    /// A fresh subscriber sees only events dispatched after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.events.subscribe()
    }

    /// Broadcasts `message` to every current subscriber. A send with no
    /// subscribers is not an error — events before anyone has subscribed
    /// are simply not observed, matching the original's lazily-created
    /// channel.
    pub(crate) fn dispatch(&self, message: Message) {
        let _ = self.events.send(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cra_csta_proto::messages::call_control_events::EstablishedEvent;
    use cra_csta_proto::types::{ConnectionId, ExtendedDeviceId, RedirectionDeviceId};

    #[tokio::test]
    async fn dispatched_event_reaches_subscriber() {
        let point = MonitorPoint::new("1001", "5001");
        let mut rx = point.subscribe();

        point.dispatch(Message::EstablishedEvent(EstablishedEvent {
            monitor_cross_ref_id: "5001".to_string(),
            established_connection: ConnectionId {
                call_id: "call-1".to_string(),
                device_id: None,
            },
            answering_device: ExtendedDeviceId::NotKnown,
            calling_device: ExtendedDeviceId::NotKnown,
            called_device: ExtendedDeviceId::NotKnown,
            last_redirection_device: RedirectionDeviceId::NotKnown,
            local_connection_info: "connected".to_string(),
            cause: "normal".to_string(),
        }));

        let received = rx.recv().await.unwrap();
        assert!(matches!(received, Message::EstablishedEvent(_)));
    }

    #[tokio::test]
    async fn dispatch_with_no_subscribers_does_not_panic() {
        let point = MonitorPoint::new("1001", "5001");
        point.dispatch(Message::ButtonInformationEvent(
            cra_csta_proto::messages::physical_device_events::ButtonInformationEvent {
                monitor_cross_ref_id: "5001".to_string(),
                device: ExtendedDeviceId::NotKnown,
                button: "hold".to_string(),
            },
        ));
    }
}
