pub mod application_session;
pub mod call_control_events;
pub mod capability_exchange;
pub mod device_maintenance_events;
pub mod dmcc;
pub mod errors;
pub mod monitoring;
pub mod physical_device_events;
pub mod snapshot;
pub mod system_services;

use crate::error::{CstaError, Result};
use crate::xmltree::XmlElement;

/// Every CSTA/ACSE message body the agent can send or receive.
///
/// Each variant wraps the type-specific struct defined in a sibling module.
/// `local_name`/`namespace`/`to_xml` dispatch on the variant; decoding goes
/// through [`crate::registry`], keyed by the root element's local name.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    StartApplicationSession(application_session::StartApplicationSession),
    StartApplicationSessionPosResponse(application_session::StartApplicationSessionPosResponse),
    StartApplicationSessionNegResponse(application_session::StartApplicationSessionNegResponse),
    ResetApplicationSessionTimer(application_session::ResetApplicationSessionTimer),
    ResetApplicationSessionTimerPosResponse(
        application_session::ResetApplicationSessionTimerPosResponse,
    ),
    ResetApplicationSessionTimerNegResponse(
        application_session::ResetApplicationSessionTimerNegResponse,
    ),
    StopApplicationSession(application_session::StopApplicationSession),
    StopApplicationSessionResponse(application_session::StopApplicationSessionResponse),

    MonitorStart(monitoring::MonitorStart),
    MonitorStartResponse(monitoring::MonitorStartResponse),
    MonitorStop(monitoring::MonitorStop),
    MonitorStopResponse(monitoring::MonitorStopResponse),

    RegisterTerminalRequest(dmcc::RegisterTerminalRequest),
    RegisterTerminalResponse(dmcc::RegisterTerminalResponse),
    GetDeviceId(dmcc::GetDeviceId),
    GetDeviceIdResponse(dmcc::GetDeviceIdResponse),

    GetSwitchingFunctionDevices(capability_exchange::GetSwitchingFunctionDevices),
    GetSwitchingFunctionDevicesResponse(capability_exchange::GetSwitchingFunctionDevicesResponse),
    SwitchingFunctionDevices(capability_exchange::SwitchingFunctionDevices),

    SnapshotDevice(snapshot::SnapshotDevice),
    SnapshotDeviceResponse(snapshot::SnapshotDeviceResponse),

    SystemStatus(system_services::SystemStatus),
    SystemStatusResponse(system_services::SystemStatusResponse),

    ServiceInitiatedEvent(call_control_events::ServiceInitiatedEvent),
    OriginatedEvent(call_control_events::OriginatedEvent),
    DeliveredEvent(call_control_events::DeliveredEvent),
    EstablishedEvent(call_control_events::EstablishedEvent),
    ConnectionClearedEvent(call_control_events::ConnectionClearedEvent),

    OutOfServiceEvent(device_maintenance_events::OutOfServiceEvent),
    BackInServiceEvent(device_maintenance_events::BackInServiceEvent),

    ButtonInformationEvent(physical_device_events::ButtonInformationEvent),

    CstaErrorCode(errors::CstaErrorCode),
}

impl Message {
    pub fn local_name(&self) -> &'static str {
        use Message::*;
        match self {
            StartApplicationSession(_) => application_session::StartApplicationSession::LOCAL_NAME,
            StartApplicationSessionPosResponse(_) => {
                application_session::StartApplicationSessionPosResponse::LOCAL_NAME
            }
            StartApplicationSessionNegResponse(_) => {
                application_session::StartApplicationSessionNegResponse::LOCAL_NAME
            }
            ResetApplicationSessionTimer(_) => {
                application_session::ResetApplicationSessionTimer::LOCAL_NAME
            }
            ResetApplicationSessionTimerPosResponse(_) => {
                application_session::ResetApplicationSessionTimerPosResponse::LOCAL_NAME
            }
            ResetApplicationSessionTimerNegResponse(_) => {
                application_session::ResetApplicationSessionTimerNegResponse::LOCAL_NAME
            }
            StopApplicationSession(_) => application_session::StopApplicationSession::LOCAL_NAME,
            StopApplicationSessionResponse(_) => {
                application_session::StopApplicationSessionResponse::LOCAL_NAME
            }
            MonitorStart(_) => monitoring::MonitorStart::LOCAL_NAME,
            MonitorStartResponse(_) => monitoring::MonitorStartResponse::LOCAL_NAME,
            MonitorStop(_) => monitoring::MonitorStop::LOCAL_NAME,
            MonitorStopResponse(_) => monitoring::MonitorStopResponse::LOCAL_NAME,
            RegisterTerminalRequest(_) => dmcc::RegisterTerminalRequest::LOCAL_NAME,
            RegisterTerminalResponse(_) => dmcc::RegisterTerminalResponse::LOCAL_NAME,
            GetDeviceId(_) => dmcc::GetDeviceId::LOCAL_NAME,
            GetDeviceIdResponse(_) => dmcc::GetDeviceIdResponse::LOCAL_NAME,
            GetSwitchingFunctionDevices(_) => {
                capability_exchange::GetSwitchingFunctionDevices::LOCAL_NAME
            }
            GetSwitchingFunctionDevicesResponse(_) => {
                capability_exchange::GetSwitchingFunctionDevicesResponse::LOCAL_NAME
            }
            SwitchingFunctionDevices(_) => capability_exchange::SwitchingFunctionDevices::LOCAL_NAME,
            SnapshotDevice(_) => snapshot::SnapshotDevice::LOCAL_NAME,
            SnapshotDeviceResponse(_) => snapshot::SnapshotDeviceResponse::LOCAL_NAME,
            SystemStatus(_) => system_services::SystemStatus::LOCAL_NAME,
            SystemStatusResponse(_) => system_services::SystemStatusResponse::LOCAL_NAME,
            ServiceInitiatedEvent(_) => call_control_events::ServiceInitiatedEvent::LOCAL_NAME,
            OriginatedEvent(_) => call_control_events::OriginatedEvent::LOCAL_NAME,
            DeliveredEvent(_) => call_control_events::DeliveredEvent::LOCAL_NAME,
            EstablishedEvent(_) => call_control_events::EstablishedEvent::LOCAL_NAME,
            ConnectionClearedEvent(_) => call_control_events::ConnectionClearedEvent::LOCAL_NAME,
            OutOfServiceEvent(_) => device_maintenance_events::OutOfServiceEvent::LOCAL_NAME,
            BackInServiceEvent(_) => device_maintenance_events::BackInServiceEvent::LOCAL_NAME,
            ButtonInformationEvent(_) => physical_device_events::ButtonInformationEvent::LOCAL_NAME,
            CstaErrorCode(_) => errors::CstaErrorCode::LOCAL_NAME,
        }
    }

    /// Renders this message's body as the XML document sent on the wire
    /// (without the length-prefixed CSTA header; see [`crate::codec`]).
    pub fn to_xml(&self) -> Result<String> {
        use Message::*;
        let (el, ns): (XmlElement, &str) = match self {
            StartApplicationSession(m) => (m.encode(), application_session::StartApplicationSession::NAMESPACE),
            StartApplicationSessionPosResponse(m) => {
                (m.encode(), application_session::StartApplicationSessionPosResponse::NAMESPACE)
            }
            StartApplicationSessionNegResponse(m) => {
                (m.encode(), application_session::StartApplicationSessionNegResponse::NAMESPACE)
            }
            ResetApplicationSessionTimer(m) => {
                (m.encode(), application_session::ResetApplicationSessionTimer::NAMESPACE)
            }
            ResetApplicationSessionTimerPosResponse(m) => (
                m.encode(),
                application_session::ResetApplicationSessionTimerPosResponse::NAMESPACE,
            ),
            ResetApplicationSessionTimerNegResponse(m) => (
                m.encode(),
                application_session::ResetApplicationSessionTimerNegResponse::NAMESPACE,
            ),
            StopApplicationSession(m) => (m.encode(), application_session::StopApplicationSession::NAMESPACE),
            StopApplicationSessionResponse(m) => {
                (m.encode(), application_session::StopApplicationSessionResponse::NAMESPACE)
            }
            MonitorStart(m) => (m.encode(), monitoring::MonitorStart::NAMESPACE),
            MonitorStartResponse(m) => (m.encode(), monitoring::MonitorStartResponse::NAMESPACE),
            MonitorStop(m) => (m.encode(), monitoring::MonitorStop::NAMESPACE),
            MonitorStopResponse(m) => (m.encode(), monitoring::MonitorStopResponse::NAMESPACE),
            RegisterTerminalRequest(m) => (m.encode(), dmcc::RegisterTerminalRequest::NAMESPACE),
            RegisterTerminalResponse(m) => (m.encode(), dmcc::RegisterTerminalResponse::NAMESPACE),
            GetDeviceId(m) => (m.encode(), dmcc::GetDeviceId::NAMESPACE),
            GetDeviceIdResponse(m) => (m.encode(), dmcc::GetDeviceIdResponse::NAMESPACE),
            GetSwitchingFunctionDevices(m) => {
                (m.encode(), capability_exchange::GetSwitchingFunctionDevices::NAMESPACE)
            }
            GetSwitchingFunctionDevicesResponse(m) => (
                m.encode(),
                capability_exchange::GetSwitchingFunctionDevicesResponse::NAMESPACE,
            ),
            SwitchingFunctionDevices(m) => {
                (m.encode(), capability_exchange::SwitchingFunctionDevices::NAMESPACE)
            }
            SnapshotDevice(m) => (m.encode(), snapshot::SnapshotDevice::NAMESPACE),
            SnapshotDeviceResponse(m) => (m.encode(), snapshot::SnapshotDeviceResponse::NAMESPACE),
            SystemStatus(m) => (m.encode(), system_services::SystemStatus::NAMESPACE),
            SystemStatusResponse(m) => (m.encode(), system_services::SystemStatusResponse::NAMESPACE),
            other => {
                return Err(CstaError::EncodeError(format!(
                    "{} is a receive-only message type and cannot be encoded",
                    other.local_name()
                )))
            }
        };
        el.to_xml_string(ns)
    }
}
