//! Avaya AES (Application Enablement Services) adapter: device IDs must be
//! resolved with `GetDeviceId`, and recording requires force-registering a
//! virtual station (`RegisterTerminalRequest`) whose audio is steered at an
//! RTP recorder pool slot. `pbx/avaya/aes.go` left `Connect`/`MonitorStart`
//! as `// TODO implement` stubs; this fills them in using the same DMCC
//! message shapes `dmcc_services.go` defines and the helper pattern from
//! `pbx/avaya/recorder.go`.

use std::fs::File;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use cra_agent_config::{ChannelUploadQueue, DeviceStore, UploadQueue, UploadRecord, UploadRecordType};
use cra_csta_proto::messages::application_session::PROTOCOL_VERSION_ED3;
use cra_csta_proto::messages::dmcc::{
    GetDeviceId, GetDeviceIdResponse, NetworkEndpoint, RegisterTerminalRequest, RegisterTerminalResponse,
};
use cra_csta_proto::messages::monitoring::{MonitorStart as MonitorStartMessage, MonitorStartResponse};
use cra_csta_proto::types::DeviceId;
use cra_csta_proto::{Message, XmlElement};
use cra_csta_session::{ApplicationSession, Connection, ConnectionState as SessionConnectionState};
use cra_rtp_recorder::{RecorderHandle, RecorderPool};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::adapter::{install_event_handlers, ConnectionState, PbxAdapter};
use crate::error::{AdapterError, Result};
use crate::monitor_point::MonitorPoint;

/// A virtual recording station paired with one RTP recorder pool slot.
struct ActiveRecording {
    extension: String,
    handle: RecorderHandle,
    file_path: std::path::PathBuf,
    begin_time: chrono::DateTime<Utc>,
}

pub struct AvayaAesAdapter {
    address: String,
    username: String,
    password: String,
    cleanup_delay: u32,
    application_id: String,
    switch_name: Option<String>,
    recordings_dir: std::path::PathBuf,
    cancel: CancellationToken,
    connection: Mutex<Option<Connection>>,
    session: Mutex<Option<ApplicationSession>>,
    monitor_points: Arc<DashMap<String, Arc<MonitorPoint>>>,
    active_recordings: Arc<DashMap<String, Mutex<Option<ActiveRecording>>>>,
    upload_queue: Arc<dyn UploadQueue>,
}

impl AvayaAesAdapter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        application_id: impl Into<String>,
        switch_name: Option<String>,
        recordings_dir: impl Into<std::path::PathBuf>,
        cancel: CancellationToken,
        upload_queue: Arc<dyn UploadQueue>,
    ) -> Self {
        Self {
            address: address.into(),
            username: username.into(),
            password: password.into(),
            cleanup_delay: 10,
            application_id: application_id.into(),
            switch_name,
            recordings_dir: recordings_dir.into(),
            cancel,
            connection: Mutex::new(None),
            session: Mutex::new(None),
            monitor_points: Arc::new(DashMap::new()),
            active_recordings: Arc::new(DashMap::new()),
            upload_queue,
        }
    }

    /// Convenience constructor backed by an internal, unconsumed upload
    /// queue, for callers that only care about the adapter's CSTA side.
    pub fn with_default_upload_queue(
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        application_id: impl Into<String>,
        switch_name: Option<String>,
        recordings_dir: impl Into<std::path::PathBuf>,
        cancel: CancellationToken,
    ) -> Self {
        let (queue, _receiver) = ChannelUploadQueue::new(64);
        Self::new(
            address,
            username,
            password,
            application_id,
            switch_name,
            recordings_dir,
            cancel,
            Arc::new(queue),
        )
    }

    fn login_info(&self) -> XmlElement {
        XmlElement::new("applicationSpecificInfo").with_child(
            XmlElement::new("loginInfo")
                .with_child(XmlElement::leaf("username", self.username.clone()))
                .with_child(XmlElement::leaf("password", self.password.clone()))
                .with_child(XmlElement::leaf("cleanupDelay", self.cleanup_delay.to_string())),
        )
    }

    fn connection(&self) -> Result<Connection> {
        self.connection.lock().clone().ok_or(AdapterError::NotConnected)
    }

    async fn get_device_id(&self, extension: &str) -> Result<DeviceId> {
        let connection = self.connection()?;
        let mut request = GetDeviceId::new(extension);
        request.switch_name = self.switch_name.clone();

        match connection.request(Message::GetDeviceId(request)).await? {
            Message::GetDeviceIdResponse(GetDeviceIdResponse { device }) => {
                // the switch sometimes omits typeOfNumber on this reply; Avaya AES
                // devices resolved through GetDeviceId are always "other".
                if device.type_of_number.is_some() {
                    Ok(device)
                } else {
                    Ok(DeviceId::with_type(device.value, "other"))
                }
            }
            other => {
                warn!(message_type = other.local_name(), "unexpected reply to GetDeviceId");
                Err(AdapterError::Rejected(other.local_name().to_string()))
            }
        }
    }

    /// Spawns a task that drives one monitor point's `EstablishedEvent` /
    /// `ConnectionClearedEvent` pair into `start_recording`/`stop_recording`
    /// on its paired RTP recorder slot, enqueueing a finished WAV for
    /// upload when the call clears.
    fn spawn_recording_driver(&self, point: Arc<MonitorPoint>) {
        let active_recordings = self.active_recordings.clone();
        let upload_queue = self.upload_queue.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let mut events = point.subscribe();
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = events.recv() => {
                        let message = match event {
                            Ok(m) => m,
                            Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                                warn!(extension = point.extension(), skipped = n, "recording driver lagged behind events");
                                continue;
                            }
                            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                        };

                        match message {
                            Message::EstablishedEvent(_) => {
                                let Some(entry) = active_recordings.get(point.extension()) else { continue };
                                let mut slot = entry.lock();
                                if let Some(recording) = slot.as_mut() {
                                    recording.begin_time = Utc::now();
                                    if let Ok(file) = File::create(&recording.file_path) {
                                        if let Err(e) = recording.handle.start_recording(file) {
                                            warn!(extension = %recording.extension, error = %e, "failed to start recording");
                                        }
                                    }
                                }
                            }
                            Message::ConnectionClearedEvent(_) => {
                                // Stop the recording and build the upload record inside this
                                // block so both the DashMap ref and the mutex guard (neither
                                // Send) are dropped before the await below.
                                let record = {
                                    let Some(entry) = active_recordings.get(point.extension()) else { continue };
                                    let mut slot = entry.lock();
                                    slot.as_mut().map(|recording| {
                                        if let Err(e) = recording.handle.stop_recording() {
                                            warn!(extension = %recording.extension, error = %e, "failed to stop recording");
                                        }
                                        UploadRecord::new(
                                            recording.file_path.to_string_lossy().to_string(),
                                            UploadRecordType::CfsAudio,
                                            recording.begin_time,
                                            Utc::now(),
                                        )
                                    })
                                };

                                if let Some(record) = record {
                                    if let Err(e) = upload_queue.enqueue(record).await {
                                        warn!(extension = point.extension(), error = %e, "failed to enqueue recording upload");
                                    }
                                }
                            }
                            _ => {}
                        }
                    }
                }
            }
        });
    }
}

#[async_trait]
impl PbxAdapter for AvayaAesAdapter {
    #[instrument(skip(self), fields(address = %self.address))]
    async fn connect(&self) -> Result<()> {
        let connection = Connection::connect(&self.address, self.cancel.clone()).await?;
        install_event_handlers(&connection, self.monitor_points.clone());

        let session = ApplicationSession::start_with_login(
            connection.clone(),
            self.application_id.clone(),
            Some(self.login_info()),
            Some(PROTOCOL_VERSION_ED3.to_string()),
        )
        .await?;

        *self.connection.lock() = Some(connection);
        *self.session.lock() = Some(session);
        info!("Avaya AES application session established");
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
        let device_id = self.get_device_id(extension).await?;
        let connection = self.connection()?;

        info!(extension, device_id = %device_id.value, "starting Avaya AES monitor");
        let reply = connection
            .request(Message::MonitorStart(MonitorStartMessage::device_with_id(device_id)))
            .await?;

        match reply {
            Message::MonitorStartResponse(MonitorStartResponse { monitor_cross_ref_id }) => {
                let point = Arc::new(MonitorPoint::new(extension, monitor_cross_ref_id.clone()));
                self.monitor_points.insert(monitor_cross_ref_id, point.clone());
                self.spawn_recording_driver(point.clone());
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
        extension: &str,
        password: &str,
        local_rtp_endpoint: SocketAddr,
    ) -> Result<()> {
        let device_id = self.get_device_id(extension).await?;
        let connection = self.connection()?;

        let mut request = RegisterTerminalRequest::new(device_id.value.clone(), password)
            .with_local_rtp_endpoint(NetworkEndpoint {
                address: local_rtp_endpoint.ip(),
                port: local_rtp_endpoint.port(),
            });
        request.device = device_id;

        match connection.request(Message::RegisterTerminalRequest(request)).await? {
            Message::RegisterTerminalResponse(RegisterTerminalResponse { code, .. }) => {
                info!(extension, code, "registered Avaya AES recording terminal");
                Ok(())
            }
            other => {
                warn!(message_type = other.local_name(), "unexpected reply to RegisterTerminalRequest");
                Err(AdapterError::Rejected(other.local_name().to_string()))
            }
        }
    }

    async fn serve(&self, recorder_pool: Arc<RecorderPool>, devices: Arc<dyn DeviceStore>) -> Result<()> {
        let recorders = recorder_pool.all();
        let mut recorders = recorders.into_iter();

        for device in devices.devices().await {
            if !device.record_calls {
                continue;
            }
            let Some(handle) = recorders.next() else {
                warn!(extension = %device.extension, "no free RTP recorder slot for device");
                continue;
            };

            let station_password = device.station_security_code.clone().unwrap_or_default();
            if let Err(e) = self
                .register_terminal(&device.extension, &station_password, handle.local_addr())
                .await
            {
                warn!(extension = %device.extension, error = %e, "failed to register recording terminal");
                continue;
            }

            let file_path = self
                .recordings_dir
                .join(format!("{}-{}.wav", device.extension, Utc::now().timestamp()));
            self.active_recordings.insert(
                device.extension.clone(),
                Mutex::new(Some(ActiveRecording {
                    extension: device.extension.clone(),
                    handle,
                    file_path,
                    begin_time: Utc::now(),
                })),
            );

            match self.monitor_start(&device.extension).await {
                Ok(point) => {
                    if let Ok(cross_ref_id) = point.cross_reference_id().parse() {
                        let _ = devices.record_started(&device.extension, cross_ref_id).await;
                    }
                }
                Err(e) => warn!(extension = %device.extension, error = %e, "failed to start monitor"),
            }
        }

        let connection = self.connection()?;
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
