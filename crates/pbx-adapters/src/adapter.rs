//! Uniform adapter capability surface the reconnect supervisor drives, and
//! the event fan-out shared by every vendor adapter.
//!
//! `osbiz.setupHandlers` only wired up three of the seven event types;
//! the other four (`DeliveredEvent`, `OriginatedEvent`,
//! `ConnectionClearedEvent`, `ButtonInformationEvent`) are handled here
//! too, consolidated so every adapter gets the same fan-out for free.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use cra_agent_config::DeviceStore;
use cra_csta_proto::messages::call_control_events::{
    ConnectionClearedEvent, DeliveredEvent, EstablishedEvent, OriginatedEvent,
};
use cra_csta_proto::messages::device_maintenance_events::{BackInServiceEvent, OutOfServiceEvent};
use cra_csta_proto::messages::physical_device_events::ButtonInformationEvent;
use cra_csta_proto::Message;
use cra_csta_session::Connection;
use cra_rtp_recorder::RecorderPool;
use dashmap::DashMap;
use tracing::debug;

use crate::error::Result;
use crate::monitor_point::MonitorPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Error,
}

/// The capability set the reconnect supervisor drives every vendor adapter
/// through, independent of the underlying switch's message shapes.
#[async_trait]
pub trait PbxAdapter: Send + Sync {
    /// Dials the configured address and starts an application session with
    /// vendor-specific credentials and protocol version.
    async fn connect(&self) -> Result<()>;

    fn connection_state(&self) -> ConnectionState;

    /// Resolves `extension` to a device ID (vendor-specific when required)
    /// and registers a monitor point for its events.
    async fn monitor_start(&self, extension: &str) -> Result<Arc<MonitorPoint>>;

    /// Force-registers a virtual station (active-recording vendors only)
    /// whose audio streams to `local_rtp_endpoint` as G.711 mu-law, 20 ms
    /// packets, unencrypted.
    async fn register_terminal(
        &self,
        extension: &str,
        password: &str,
        local_rtp_endpoint: SocketAddr,
    ) -> Result<()>;

    /// Post-session bring-up (register recording terminals, start monitors
    /// on every device flagged for recording, persist cross-reference IDs),
    /// then blocks until the connection closes or the supervisor cancels.
    async fn serve(&self, recorder_pool: Arc<RecorderPool>, devices: Arc<dyn DeviceStore>) -> Result<()>;

    /// Stops the session if active and closes the connection.
    async fn close(&self);
}

/// Installs default handlers for every event type a monitored device can
/// produce, dispatching each to the matching [`MonitorPoint`] by
/// `monitorCrossRefID`. Shared by every vendor adapter so their `connect`
/// implementations only need to differ in login shape.
pub(crate) fn install_event_handlers(
    connection: &Connection,
    monitor_points: Arc<DashMap<String, Arc<MonitorPoint>>>,
) {
    fn dispatch_to(monitor_points: &DashMap<String, Arc<MonitorPoint>>, cross_ref_id: &str, message: Message) {
        match monitor_points.get(cross_ref_id) {
            Some(point) => point.dispatch(message),
            None => debug!(cross_ref_id = cross_ref_id, "event for unknown monitor point, dropping"),
        }
    }

    let points = monitor_points.clone();
    connection.handle(EstablishedEvent::LOCAL_NAME, move |_conn, _invoke_id, message| {
        if let Message::EstablishedEvent(ref e) = message {
            dispatch_to(&points, &e.monitor_cross_ref_id, message.clone());
        }
    });

    let points = monitor_points.clone();
    connection.handle(DeliveredEvent::LOCAL_NAME, move |_conn, _invoke_id, message| {
        if let Message::DeliveredEvent(ref e) = message {
            dispatch_to(&points, &e.monitor_cross_ref_id, message.clone());
        }
    });

    let points = monitor_points.clone();
    connection.handle(OriginatedEvent::LOCAL_NAME, move |_conn, _invoke_id, message| {
        if let Message::OriginatedEvent(ref e) = message {
            dispatch_to(&points, &e.monitor_cross_ref_id, message.clone());
        }
    });

    let points = monitor_points.clone();
    connection.handle(ConnectionClearedEvent::LOCAL_NAME, move |_conn, _invoke_id, message| {
        if let Message::ConnectionClearedEvent(ref e) = message {
            dispatch_to(&points, &e.monitor_cross_ref_id, message.clone());
        }
    });

    let points = monitor_points.clone();
    connection.handle(OutOfServiceEvent::LOCAL_NAME, move |_conn, _invoke_id, message| {
        if let Message::OutOfServiceEvent(ref e) = message {
            dispatch_to(&points, &e.monitor_cross_ref_id, message.clone());
        }
    });

    let points = monitor_points.clone();
    connection.handle(BackInServiceEvent::LOCAL_NAME, move |_conn, _invoke_id, message| {
        if let Message::BackInServiceEvent(ref e) = message {
            dispatch_to(&points, &e.monitor_cross_ref_id, message.clone());
        }
    });

    let points = monitor_points;
    connection.handle(ButtonInformationEvent::LOCAL_NAME, move |_conn, _invoke_id, message| {
        if let Message::ButtonInformationEvent(ref e) = message {
            dispatch_to(&points, &e.monitor_cross_ref_id, message.clone());
        }
    });
}
