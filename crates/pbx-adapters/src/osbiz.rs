//! Siemens/Unify OpenScape Business (OSBiz) adapter: passive monitoring
//! only, no `GetDeviceId`/`RegisterTerminal` — the extension itself is the
//! device ID. Grounded in `pbx/osbiz/pbx.go`.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use cra_agent_config::DeviceStore;
use cra_csta_proto::messages::monitoring::{MonitorStart as MonitorStartMessage, MonitorStartResponse};
use cra_csta_proto::{Message, XmlElement};
use cra_csta_session::{ApplicationSession, Connection, ConnectionState as SessionConnectionState};
use cra_rtp_recorder::RecorderPool;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::adapter::{install_event_handlers, ConnectionState, PbxAdapter};
use crate::error::{AdapterError, Result};
use crate::monitor_point::MonitorPoint;

pub struct OsbizAdapter {
    address: String,
    username: String,
    password: String,
    application_id: String,
    cancel: CancellationToken,
    connection: Mutex<Option<Connection>>,
    session: Mutex<Option<ApplicationSession>>,
    monitor_points: Arc<DashMap<String, Arc<MonitorPoint>>>,
}

impl OsbizAdapter {
    pub fn new(
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        application_id: impl Into<String>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            address: address.into(),
            username: username.into(),
            password: password.into(),
            application_id: application_id.into(),
            cancel,
            connection: Mutex::new(None),
            session: Mutex::new(None),
            monitor_points: Arc::new(DashMap::new()),
        }
    }

    fn login_info(&self) -> XmlElement {
        XmlElement::new("applicationSpecificInfo")
            .with_child(XmlElement::leaf("user", self.username.clone()))
            .with_child(XmlElement::leaf("password", self.password.clone()))
    }
}

#[async_trait]
impl PbxAdapter for OsbizAdapter {
    #[instrument(skip(self), fields(address = %self.address))]
    async fn connect(&self) -> Result<()> {
        let connection = Connection::connect(&self.address, self.cancel.clone()).await?;
        install_event_handlers(&connection, self.monitor_points.clone());

        let session = ApplicationSession::start_with_login(
            connection.clone(),
            self.application_id.clone(),
            Some(self.login_info()),
            None,
        )
        .await?;

        *self.connection.lock() = Some(connection);
        *self.session.lock() = Some(session);
        info!("OSBiz application session established");
        Ok(())
    }

    fn connection_state(&self) -> ConnectionState {
        match self.connection.lock().as_ref().map(Connection::state) {
            Some(SessionConnectionState::Active) => ConnectionState::Connected,
            Some(SessionConnectionState::Error) => ConnectionState::Error,
            _ => ConnectionState::Disconnected,
        }
    }

    async fn monitor_start(&self, extension: &str) -> Result<Arc<MonitorPoint>> {
        let connection = self
            .connection
            .lock()
            .clone()
            .ok_or(AdapterError::NotConnected)?;

        info!(extension, "starting OSBiz monitor");
        let reply = connection
            .request(Message::MonitorStart(MonitorStartMessage::device(extension)))
            .await?;

        match reply {
            Message::MonitorStartResponse(MonitorStartResponse { monitor_cross_ref_id }) => {
                let point = Arc::new(MonitorPoint::new(extension, monitor_cross_ref_id.clone()));
                self.monitor_points.insert(monitor_cross_ref_id, point.clone());
                Ok(point)
            }
            other => {
                warn!(message_type = other.local_name(), "unexpected reply to MonitorStart");
                Err(AdapterError::Rejected(other.local_name().to_string()))
            }
        }
    }

    async fn register_terminal(
        &self,
        _extension: &str,
        _password: &str,
        _local_rtp_endpoint: SocketAddr,
    ) -> Result<()> {
        // OSBiz streams audio to the CTI link itself; there is no virtual
        // station to register. Recording terminals are configured entirely
        // on the switch side.
        Ok(())
    }

    async fn serve(&self, _recorder_pool: Arc<RecorderPool>, devices: Arc<dyn DeviceStore>) -> Result<()> {
        for device in devices.devices().await {
            if !device.record_calls {
                continue;
            }
            match self.monitor_start(&device.extension).await {
                Ok(point) => {
                    if let Ok(cross_ref_id) = point.cross_reference_id().parse() {
                        let _ = devices.record_started(&device.extension, cross_ref_id).await;
                    }
                }
                Err(e) => warn!(extension = %device.extension, error = %e, "failed to start monitor"),
            }
        }

        let connection = self
            .connection
            .lock()
            .clone()
            .ok_or(AdapterError::NotConnected)?;
        let mut closed = connection.closed();

        tokio::select! {
            _ = self.cancel.cancelled() => Ok(()),
            _ = closed.recv() => Err(AdapterError::ConnectionLost),
        }
    }

    async fn close(&self) {
        if let Some(session) = self.session.lock().take() {
            session.stop().await;
        } else if let Some(connection) = self.connection.lock().take() {
            connection.close().await;
        }
    }
}
