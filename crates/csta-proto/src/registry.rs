//! Message-type registry: maps a root element's local name to a decode
//! function, mirroring `registerMessageType`/`messageTypes` in the original
//! implementation's `message.go`. Registration happens once, at process
//! start, via [`build_registry`]; duplicate registrations overwrite the
//! earlier entry, same as the original's plain map assignment.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::error::{CstaError, Result};
use crate::messages::*;
use crate::xmltree::XmlElement;

type DecodeFn = fn(&XmlElement) -> Result<Message>;

static REGISTRY: Lazy<RwLock<HashMap<&'static str, DecodeFn>>> =
    Lazy::new(|| RwLock::new(build_registry()));

/// Registers (or overwrites) the decoder for `local_name`. Exposed mainly so
/// tests can exercise the idempotent-overwrite behavior; production code
/// never needs to call this; the full catalogue is wired up once in
/// [`build_registry`].
pub fn register(local_name: &'static str, decode: DecodeFn) {
    REGISTRY.write().insert(local_name, decode);
}

fn build_registry() -> HashMap<&'static str, DecodeFn> {
    let mut m: HashMap<&'static str, DecodeFn> = HashMap::new();

    m.insert(
        application_session::StartApplicationSession::LOCAL_NAME,
        |el| Ok(Message::StartApplicationSession(application_session::StartApplicationSession::decode(el)?)),
    );
    m.insert(
        application_session::StartApplicationSessionPosResponse::LOCAL_NAME,
        |el| {
            Ok(Message::StartApplicationSessionPosResponse(
                application_session::StartApplicationSessionPosResponse::decode(el)?,
            ))
        },
    );
    m.insert(
        application_session::StartApplicationSessionNegResponse::LOCAL_NAME,
        |el| {
            Ok(Message::StartApplicationSessionNegResponse(
                application_session::StartApplicationSessionNegResponse::decode(el)?,
            ))
        },
    );
    m.insert(
        application_session::ResetApplicationSessionTimer::LOCAL_NAME,
        |el| {
            Ok(Message::ResetApplicationSessionTimer(
                application_session::ResetApplicationSessionTimer::decode(el)?,
            ))
        },
    );
    m.insert(
        application_session::ResetApplicationSessionTimerPosResponse::LOCAL_NAME,
        |el| {
            Ok(Message::ResetApplicationSessionTimerPosResponse(
                application_session::ResetApplicationSessionTimerPosResponse::decode(el)?,
            ))
        },
    );
    m.insert(
        application_session::ResetApplicationSessionTimerNegResponse::LOCAL_NAME,
        |el| {
            Ok(Message::ResetApplicationSessionTimerNegResponse(
                application_session::ResetApplicationSessionTimerNegResponse::decode(el)?,
            ))
        },
    );
    m.insert(
        application_session::StopApplicationSession::LOCAL_NAME,
        |el| Ok(Message::StopApplicationSession(application_session::StopApplicationSession::decode(el)?)),
    );
    m.insert(
        application_session::StopApplicationSessionResponse::LOCAL_NAME,
        |el| {
            Ok(Message::StopApplicationSessionResponse(
                application_session::StopApplicationSessionResponse::decode(el)?,
            ))
        },
    );

    m.insert(monitoring::MonitorStart::LOCAL_NAME, |el| {
        Ok(Message::MonitorStart(monitoring::MonitorStart::decode(el)?))
    });
    m.insert(monitoring::MonitorStartResponse::LOCAL_NAME, |el| {
        Ok(Message::MonitorStartResponse(monitoring::MonitorStartResponse::decode(el)?))
    });
    m.insert(monitoring::MonitorStop::LOCAL_NAME, |el| {
        Ok(Message::MonitorStop(monitoring::MonitorStop::decode(el)?))
    });
    m.insert(monitoring::MonitorStopResponse::LOCAL_NAME, |el| {
        Ok(Message::MonitorStopResponse(monitoring::MonitorStopResponse::decode(el)?))
    });

    m.insert(dmcc::RegisterTerminalRequest::LOCAL_NAME, |el| {
        Ok(Message::RegisterTerminalRequest(dmcc::RegisterTerminalRequest::decode(el)?))
    });
    m.insert(dmcc::RegisterTerminalResponse::LOCAL_NAME, |el| {
        Ok(Message::RegisterTerminalResponse(dmcc::RegisterTerminalResponse::decode(el)?))
    });
    m.insert(dmcc::GetDeviceId::LOCAL_NAME, |el| {
        Ok(Message::GetDeviceId(dmcc::GetDeviceId::decode(el)?))
    });
    m.insert(dmcc::GetDeviceIdResponse::LOCAL_NAME, |el| {
        Ok(Message::GetDeviceIdResponse(dmcc::GetDeviceIdResponse::decode(el)?))
    });

    m.insert(capability_exchange::GetSwitchingFunctionDevices::LOCAL_NAME, |el| {
        Ok(Message::GetSwitchingFunctionDevices(
            capability_exchange::GetSwitchingFunctionDevices::decode(el)?,
        ))
    });
    m.insert(
        capability_exchange::GetSwitchingFunctionDevicesResponse::LOCAL_NAME,
        |el| {
            Ok(Message::GetSwitchingFunctionDevicesResponse(
                capability_exchange::GetSwitchingFunctionDevicesResponse::decode(el)?,
            ))
        },
    );
    m.insert(capability_exchange::SwitchingFunctionDevices::LOCAL_NAME, |el| {
        Ok(Message::SwitchingFunctionDevices(
            capability_exchange::SwitchingFunctionDevices::decode(el)?,
        ))
    });

    m.insert(snapshot::SnapshotDevice::LOCAL_NAME, |el| {
        Ok(Message::SnapshotDevice(snapshot::SnapshotDevice::decode(el)?))
    });
    m.insert(snapshot::SnapshotDeviceResponse::LOCAL_NAME, |el| {
        Ok(Message::SnapshotDeviceResponse(snapshot::SnapshotDeviceResponse::decode(el)?))
    });

    m.insert(system_services::SystemStatus::LOCAL_NAME, |el| {
        Ok(Message::SystemStatus(system_services::SystemStatus::decode(el)?))
    });
    m.insert(system_services::SystemStatusResponse::LOCAL_NAME, |el| {
        Ok(Message::SystemStatusResponse(system_services::SystemStatusResponse::decode(el)?))
    });

    m.insert(call_control_events::ServiceInitiatedEvent::LOCAL_NAME, |el| {
        Ok(Message::ServiceInitiatedEvent(
            call_control_events::ServiceInitiatedEvent::decode(el)?,
        ))
    });
    m.insert(call_control_events::OriginatedEvent::LOCAL_NAME, |el| {
        Ok(Message::OriginatedEvent(call_control_events::OriginatedEvent::decode(el)?))
    });
    m.insert(call_control_events::DeliveredEvent::LOCAL_NAME, |el| {
        Ok(Message::DeliveredEvent(call_control_events::DeliveredEvent::decode(el)?))
    });
    m.insert(call_control_events::EstablishedEvent::LOCAL_NAME, |el| {
        Ok(Message::EstablishedEvent(call_control_events::EstablishedEvent::decode(el)?))
    });
    m.insert(call_control_events::ConnectionClearedEvent::LOCAL_NAME, |el| {
        Ok(Message::ConnectionClearedEvent(
            call_control_events::ConnectionClearedEvent::decode(el)?,
        ))
    });

    m.insert(device_maintenance_events::OutOfServiceEvent::LOCAL_NAME, |el| {
        Ok(Message::OutOfServiceEvent(
            device_maintenance_events::OutOfServiceEvent::decode(el)?,
        ))
    });
    m.insert(device_maintenance_events::BackInServiceEvent::LOCAL_NAME, |el| {
        Ok(Message::BackInServiceEvent(
            device_maintenance_events::BackInServiceEvent::decode(el)?,
        ))
    });

    m.insert(physical_device_events::ButtonInformationEvent::LOCAL_NAME, |el| {
        Ok(Message::ButtonInformationEvent(
            physical_device_events::ButtonInformationEvent::decode(el)?,
        ))
    });

    m.insert(errors::CstaErrorCode::LOCAL_NAME, |el| {
        Ok(Message::CstaErrorCode(errors::CstaErrorCode::decode(el)?))
    });

    m
}

/// Decodes a message body given its parsed root element, looking up the
/// decoder by the element's local name.
pub fn decode_by_local_name(root: &XmlElement) -> Result<Message> {
    let decode = REGISTRY
        .read()
        .get(root.name.as_str())
        .copied()
        .ok_or_else(|| CstaError::UnknownMessage(root.name.clone()))?;
    decode(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_message_type_is_reported_not_fatal() {
        let el = XmlElement::new("SomeFutureMessageType");
        let err = decode_by_local_name(&el).unwrap_err();
        assert!(matches!(err, CstaError::UnknownMessage(name) if name == "SomeFutureMessageType"));
    }

    #[test]
    fn duplicate_registration_overwrites_with_latest() {
        fn decode_a(_el: &XmlElement) -> Result<Message> {
            Ok(Message::SystemStatus(system_services::SystemStatus))
        }
        fn decode_b(_el: &XmlElement) -> Result<Message> {
            Ok(Message::SystemStatusResponse(system_services::SystemStatusResponse))
        }

        register("TestDuplicate", decode_a);
        register("TestDuplicate", decode_b);

        let el = XmlElement::new("TestDuplicate");
        let decoded = decode_by_local_name(&el).unwrap();
        assert!(matches!(decoded, Message::SystemStatusResponse(_)));
    }

    #[test]
    fn known_type_decodes_via_registry() {
        let el = XmlElement::new("SystemStatus");
        let decoded = decode_by_local_name(&el).unwrap();
        assert!(matches!(decoded, Message::SystemStatus(_)));
    }
}
