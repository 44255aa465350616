//! Value types shared across several CSTA message bodies.
//!
//! Mirrors the shapes found in `types.go`:
//! `DeviceID`/`LocalDeviceID` carry a `typeOfNumber` attribute and chardata;
//! `ExtendedDeviceID` (used for `SubjectDeviceID`/`CallingDeviceID`/
//! `CalledDeviceID`) is either a known device or one of `notKnown`/
//! `restricted`; `RedirectionDeviceID` adds `notRequired`/`notSpecified`.

use crate::error::{CstaError, Result};
use crate::xmltree::XmlElement;

/// A bare `*DeviceID` element: chardata plus the `typeOfNumber` attribute.
/// Used directly for `deviceObject`, `numberDialed`, DMCC `device`, etc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceId {
    pub type_of_number: Option<String>,
    pub value: String,
}

impl DeviceId {
    pub fn dialing_number(value: impl Into<String>) -> Self {
        Self {
            type_of_number: Some("dialingNumber".to_string()),
            value: value.into(),
        }
    }

    /// Avaya AES identifies devices with `typeOfNumber="other"` once
    /// resolved through `GetDeviceId`.
    pub fn with_type(value: impl Into<String>, type_of_number: impl Into<String>) -> Self {
        Self {
            type_of_number: Some(type_of_number.into()),
            value: value.into(),
        }
    }

    pub fn encode(&self, element_name: &str) -> XmlElement {
        let mut el = XmlElement::new(element_name).with_text(self.value.clone());
        if let Some(ton) = &self.type_of_number {
            el = el.with_attr("typeOfNumber", ton.clone());
        }
        el
    }

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            type_of_number: el.attr("typeOfNumber").map(str::to_string),
            value: el.require_text()?.to_string(),
        })
    }
}

/// `ExtendedDeviceID`: a known device identifier or a `notKnown`/`restricted`
/// placeholder. Used for `SubjectDeviceID`/`CallingDeviceID`/`CalledDeviceID`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtendedDeviceId {
    Known(DeviceId),
    NotKnown,
    Restricted,
}

impl ExtendedDeviceId {
    pub fn encode(&self, wrapper_name: &str) -> XmlElement {
        let inner = match self {
            ExtendedDeviceId::Known(d) => d.encode("deviceIdentifier"),
            ExtendedDeviceId::NotKnown => XmlElement::new("notKnown"),
            ExtendedDeviceId::Restricted => XmlElement::new("restricted"),
        };
        XmlElement::new(wrapper_name).with_child(inner)
    }

    pub fn decode(el: &XmlElement) -> Result<Self> {
        if let Some(d) = el.child("deviceIdentifier") {
            return Ok(ExtendedDeviceId::Known(DeviceId::decode(d)?));
        }
        if el.child("notKnown").is_some() {
            return Ok(ExtendedDeviceId::NotKnown);
        }
        if el.child("restricted").is_some() {
            return Ok(ExtendedDeviceId::Restricted);
        }
        Err(CstaError::DecodeError(format!(
            "<{}> has no recognised device identifier variant",
            el.name
        )))
    }

    pub fn number(&self) -> Option<&str> {
        match self {
            ExtendedDeviceId::Known(d) => Some(d.value.as_str()),
            _ => None,
        }
    }
}

/// `RedirectionDeviceID`: a dialed number or one of four placeholder states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectionDeviceId {
    NumberDialed(DeviceId),
    NotKnown,
    Restricted,
    NotRequired,
    NotSpecified,
}

impl RedirectionDeviceId {
    pub fn encode(&self, wrapper_name: &str) -> XmlElement {
        let inner = match self {
            RedirectionDeviceId::NumberDialed(d) => d.encode("numberDialed"),
            RedirectionDeviceId::NotKnown => XmlElement::new("notKnown"),
            RedirectionDeviceId::Restricted => XmlElement::new("restricted"),
            RedirectionDeviceId::NotRequired => XmlElement::new("notRequired"),
            RedirectionDeviceId::NotSpecified => XmlElement::new("notSpecified"),
        };
        XmlElement::new(wrapper_name).with_child(inner)
    }

    pub fn decode(el: &XmlElement) -> Result<Self> {
        if let Some(d) = el.child("numberDialed") {
            return Ok(RedirectionDeviceId::NumberDialed(DeviceId::decode(d)?));
        }
        if el.child("notKnown").is_some() {
            return Ok(RedirectionDeviceId::NotKnown);
        }
        if el.child("restricted").is_some() {
            return Ok(RedirectionDeviceId::Restricted);
        }
        if el.child("notRequired").is_some() {
            return Ok(RedirectionDeviceId::NotRequired);
        }
        if el.child("notSpecified").is_some() {
            return Ok(RedirectionDeviceId::NotSpecified);
        }
        Err(CstaError::DecodeError(format!(
            "<{}> has no recognised redirection device variant",
            el.name
        )))
    }
}

/// `LocalDeviceID`: same shape as `DeviceID` but the `typeOfNumber` attribute
/// is mandatory. Appears inside `connectionID`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDeviceId {
    pub type_of_number: String,
    pub value: String,
}

impl LocalDeviceId {
    pub fn encode(&self) -> XmlElement {
        XmlElement::new("deviceID")
            .with_attr("typeOfNumber", self.type_of_number.clone())
            .with_text(self.value.clone())
    }

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            type_of_number: el.attr("typeOfNumber").unwrap_or("").to_string(),
            value: el.require_text()?.to_string(),
        })
    }
}

/// `ConnectionID`: `callID` plus an optional `deviceID`. Present on every
/// call control event and snapshot response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionId {
    pub call_id: String,
    pub device_id: Option<LocalDeviceId>,
}

impl ConnectionId {
    pub fn encode(&self, element_name: &str) -> XmlElement {
        let mut el =
            XmlElement::new(element_name).with_child(XmlElement::leaf("callID", self.call_id.clone()));
        if let Some(d) = &self.device_id {
            el = el.with_child(d.encode());
        }
        el
    }

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            call_id: el.require_child_text("callID")?.to_string(),
            device_id: el.child("deviceID").map(LocalDeviceId::decode).transpose()?,
        })
    }
}

/// `CSTAObject`: one of `deviceObject`/`callObject`, used by `MonitorStart`
/// and `SnapshotDevice`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CstaObject {
    Device(DeviceId),
    Call(ConnectionId),
}

impl CstaObject {
    pub fn device(value: impl Into<String>) -> Self {
        CstaObject::Device(DeviceId::dialing_number(value))
    }

    pub fn encode(&self, wrapper_name: &str) -> XmlElement {
        let inner = match self {
            CstaObject::Device(d) => d.encode("deviceObject"),
            CstaObject::Call(c) => c.encode("callObject"),
        };
        XmlElement::new(wrapper_name).with_child(inner)
    }

    pub fn decode(el: &XmlElement) -> Result<Self> {
        if let Some(d) = el.child("deviceObject") {
            return Ok(CstaObject::Device(DeviceId::decode(d)?));
        }
        if let Some(c) = el.child("callObject") {
            return Ok(CstaObject::Call(ConnectionId::decode(c)?));
        }
        Err(CstaError::DecodeError(format!(
            "<{}> has neither deviceObject nor callObject",
            el.name
        )))
    }
}

/// `<monitorType>` values: `call` or `device`. The agent only issues
/// `device` monitors but decodes both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorType {
    Call,
    Device,
}

impl MonitorType {
    pub fn as_str(self) -> &'static str {
        match self {
            MonitorType::Call => "call",
            MonitorType::Device => "device",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "call" => Ok(MonitorType::Call),
            "device" => Ok(MonitorType::Device),
            other => Err(CstaError::DecodeError(format!(
                "unsupported monitorType: {other}"
            ))),
        }
    }
}

/// A single entry of a `DeviceList` (`GetSwitchingFunctionDevicesResponse`
/// payload carried by `SwitchingFunctionDevices`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub device_id: DeviceId,
    pub category: String,
}

impl Device {
    pub fn encode(&self) -> XmlElement {
        XmlElement::new("device")
            .with_child(self.device_id.encode("deviceID"))
            .with_child(XmlElement::leaf("deviceCategory", self.category.clone()))
    }

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            device_id: DeviceId::decode(el.require_child("deviceID")?)?,
            category: el.require_child_text("deviceCategory")?.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceList {
    pub devices: Vec<Device>,
}

impl DeviceList {
    pub fn encode(&self) -> XmlElement {
        let mut el = XmlElement::new("deviceList");
        for d in &self.devices {
            el = el.with_child(d.encode());
        }
        el
    }

    pub fn decode(el: &XmlElement) -> Result<Self> {
        let devices = el
            .children_named("device")
            .map(Device::decode)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { devices })
    }
}

pub type CrossRefId = String;
