//! End-user device identifiers.
//!
//! A three-legged token carries the device of the user who consented, so API
//! calls made with it do not name a device. A two-legged token carries none
//! and the device travels in each request instead.
//!
//! The token core stores a [`Device`] verbatim. [`Device::validate`] exists for
//! the request-handling layer; nothing in the token lifecycle calls it.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

static E164: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+[1-9][0-9]{4,14}$").expect("E.164 pattern is valid")
});

/// Device able to connect to a mobile network.
///
/// Several identifiers may be given; they must then all belong to the same
/// device. Unknown members are kept so the device round-trips unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Phone number in E.164 format, `+` prefixed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,

    /// Network access identifier (`localId@domain`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_access_identifier: Option<String>,

    /// Observed IPv4 addressing of the device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4_address: Option<DeviceIpv4Addr>,

    /// IPv6 address of the device or of its allocated subnet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_address: Option<String>,

    /// Members this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// IPv4 addressing of a device, possibly behind NAT.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIpv4Addr {
    /// Public (observed) address.
    pub public_address: String,

    /// Private (local) address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_address: Option<String>,

    /// Public (observed) port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_port: Option<u16>,
}

/// Structural problems found by [`Device::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceValidationError {
    /// No identifier was given.
    #[error("At least one device identifier must be provided")]
    NoIdentifier,

    /// The phone number is not in E.164 form.
    #[error("Phone number must be in E.164 format with + prefix: {0}")]
    InvalidPhoneNumber(String),

    /// An IPv4 address does not parse.
    #[error("Invalid IPv4 address: {0}")]
    InvalidIpv4(String),

    /// `publicAddress` was given alone.
    #[error("Either privateAddress or publicPort must be provided")]
    IncompleteIpv4,

    /// The IPv6 address does not parse.
    #[error("Invalid IPv6 address: {0}")]
    InvalidIpv6(String),
}

impl Device {
    /// Creates a device identified by phone number only.
    #[must_use]
    pub fn with_phone_number(phone_number: impl Into<String>) -> Self {
        Self {
            phone_number: Some(phone_number.into()),
            ..Default::default()
        }
    }

    /// Returns how many identifiers are present.
    #[must_use]
    pub fn identifier_count(&self) -> usize {
        [
            self.phone_number.is_some(),
            self.network_access_identifier.is_some(),
            self.ipv4_address.is_some(),
            self.ipv6_address.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }

    /// Checks the structure of every present identifier.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), DeviceValidationError> {
        if self.identifier_count() == 0 {
            return Err(DeviceValidationError::NoIdentifier);
        }

        if let Some(ref phone) = self.phone_number {
            if !E164.is_match(phone) {
                return Err(DeviceValidationError::InvalidPhoneNumber(phone.clone()));
            }
        }

        if let Some(ref ipv4) = self.ipv4_address {
            ipv4.validate()?;
        }

        if let Some(ref ipv6) = self.ipv6_address {
            if ipv6.parse::<Ipv6Addr>().is_err() {
                return Err(DeviceValidationError::InvalidIpv6(ipv6.clone()));
            }
        }

        Ok(())
    }
}

impl DeviceIpv4Addr {
    fn validate(&self) -> Result<(), DeviceValidationError> {
        for addr in std::iter::once(&self.public_address).chain(self.private_address.as_ref()) {
            if addr.parse::<Ipv4Addr>().is_err() {
                return Err(DeviceValidationError::InvalidIpv4(addr.clone()));
            }
        }

        if self.private_address.is_none() && self.public_port.is_none() {
            return Err(DeviceValidationError::IncompleteIpv4);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_names_are_camel_case() {
        let device = Device {
            phone_number: Some("+123456789".to_string()),
            ipv4_address: Some(DeviceIpv4Addr {
                public_address: "84.125.93.10".to_string(),
                private_address: None,
                public_port: Some(59765),
            }),
            ..Default::default()
        };

        let value = serde_json::to_value(&device).unwrap();
        assert_eq!(
            value,
            json!({
                "phoneNumber": "+123456789",
                "ipv4Address": {"publicAddress": "84.125.93.10", "publicPort": 59765}
            })
        );
    }

    #[test]
    fn test_unknown_members_are_preserved() {
        let input = json!({
            "phoneNumber": "+1234567890",
            "ipv4Address": {"publicAddress": "192.0.2.1"},
            "imsi": "001010123456789"
        });

        let device: Device = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(device.extra.get("imsi"), Some(&json!("001010123456789")));
        assert_eq!(serde_json::to_value(&device).unwrap(), input);
    }

    #[test]
    fn test_identifier_count() {
        assert_eq!(Device::default().identifier_count(), 0);
        assert_eq!(Device::with_phone_number("+123456789").identifier_count(), 1);
    }

    #[test]
    fn test_validate_accepts_well_formed_device() {
        let device = Device {
            phone_number: Some("+34600123456".to_string()),
            ipv4_address: Some(DeviceIpv4Addr {
                public_address: "84.125.93.10".to_string(),
                private_address: Some("192.168.1.10".to_string()),
                public_port: None,
            }),
            ipv6_address: Some("2001:db8:85a3:8d3:1319:8a2e:370:7344".to_string()),
            ..Default::default()
        };
        assert_eq!(device.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_bad_identifiers() {
        assert_eq!(
            Device::default().validate(),
            Err(DeviceValidationError::NoIdentifier)
        );

        assert!(matches!(
            Device::with_phone_number("123456789").validate(),
            Err(DeviceValidationError::InvalidPhoneNumber(_))
        ));

        let device = Device {
            ipv4_address: Some(DeviceIpv4Addr {
                public_address: "84.125.93.10".to_string(),
                private_address: None,
                public_port: None,
            }),
            ..Default::default()
        };
        assert_eq!(device.validate(), Err(DeviceValidationError::IncompleteIpv4));

        let device = Device {
            ipv4_address: Some(DeviceIpv4Addr {
                public_address: "999.1.1.1".to_string(),
                private_address: None,
                public_port: Some(80),
            }),
            ..Default::default()
        };
        assert!(matches!(
            device.validate(),
            Err(DeviceValidationError::InvalidIpv4(_))
        ));

        let device = Device {
            ipv6_address: Some("not-an-address".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            device.validate(),
            Err(DeviceValidationError::InvalidIpv6(_))
        ));
    }
}
