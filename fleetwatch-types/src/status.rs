//! Closed enumerations used on the wire.
//!
//! Both enums decode leniently: unknown names, unknown numeric codes and
//! `null` all become the `Unspecified` member instead of failing the record.
//! Parsing from user input ([`FromStr`]) is strict.

use core::fmt;
use core::str::FromStr;

/// Error returned when user input does not name a known enum member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident: $kind:literal {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = ($code:literal, $wire:literal, $short:literal),
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $name {
            /// All members in wire-code order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The canonical wire name (e.g. `DEVICE_STATUS_HEALTHY`).
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            /// Short lowercase label, used for display and CLI input.
            pub const fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $short,)+
                }
            }

            /// Numeric wire code.
            pub const fn code(&self) -> i32 {
                match self {
                    $($name::$variant => $code,)+
                }
            }

            /// Decode a wire name; unknown names map to `Unspecified`.
            pub fn from_name(name: &str) -> Self {
                match name {
                    $($wire => $name::$variant,)+
                    _ => $name::Unspecified,
                }
            }

            /// Decode a numeric wire code; unknown codes map to `Unspecified`.
            pub fn from_code(code: i64) -> Self {
                match code {
                    $($code => $name::$variant,)+
                    _ => $name::Unspecified,
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::Unspecified
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            /// Accepts the wire name or the short label, case-insensitively.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| {
                        v.as_str().eq_ignore_ascii_case(trimmed)
                            || v.label().eq_ignore_ascii_case(trimmed)
                    })
                    .ok_or_else(|| ParseEnumError {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }

        #[cfg(feature = "serde")]
        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserializer.deserialize_any(lenient::WireEnumVisitor::<$name>::new($kind))
            }
        }

        #[cfg(feature = "serde")]
        impl lenient::WireEnum for $name {
            fn from_name(name: &str) -> Self {
                $name::from_name(name)
            }

            fn from_code(code: i64) -> Self {
                $name::from_code(code)
            }
        }
    };
}

wire_enum! {
    /// Health state reported by (or assigned to) a device.
    pub enum DeviceStatus: "device status" {
        Unspecified = (0, "DEVICE_STATUS_UNSPECIFIED", "unspecified"),
        Healthy = (1, "DEVICE_STATUS_HEALTHY", "healthy"),
        Degraded = (2, "DEVICE_STATUS_DEGRADED", "degraded"),
        Error = (3, "DEVICE_STATUS_ERROR", "error"),
        Maintenance = (4, "DEVICE_STATUS_MAINTENANCE", "maintenance"),
        Booting = (5, "DEVICE_STATUS_BOOTING", "booting"),
        Offline = (6, "DEVICE_STATUS_OFFLINE", "offline"),
    }
}

wire_enum! {
    /// Transport a device can be monitored over.
    pub enum Protocol: "protocol" {
        Unspecified = (0, "PROTOCOL_UNSPECIFIED", "unspecified"),
        Http = (1, "PROTOCOL_HTTP", "http"),
        HttpStream = (2, "PROTOCOL_HTTP_STREAM", "http-stream"),
        Grpc = (3, "PROTOCOL_GRPC", "grpc"),
        GrpcStream = (4, "PROTOCOL_GRPC_STREAM", "grpc-stream"),
    }
}

#[cfg(feature = "serde")]
mod lenient {
    use core::fmt;
    use core::marker::PhantomData;

    use serde::de::{self, Visitor};

    pub trait WireEnum: Default {
        fn from_name(name: &str) -> Self;
        fn from_code(code: i64) -> Self;
    }

    pub struct WireEnumVisitor<T> {
        kind: &'static str,
        marker: PhantomData<T>,
    }

    impl<T> WireEnumVisitor<T> {
        pub fn new(kind: &'static str) -> Self {
            Self {
                kind,
                marker: PhantomData,
            }
        }
    }

    impl<'de, T: WireEnum> Visitor<'de> for WireEnumVisitor<T> {
        type Value = T;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "a {} name, numeric code or null", self.kind)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<T, E> {
            Ok(T::from_name(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<T, E> {
            Ok(T::from_code(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<T, E> {
            Ok(i64::try_from(v).map(T::from_code).unwrap_or_default())
        }

        fn visit_unit<E: de::Error>(self) -> Result<T, E> {
            Ok(T::default())
        }

        fn visit_none<E: de::Error>(self) -> Result<T, E> {
            Ok(T::default())
        }

        fn visit_some<D: de::Deserializer<'de>>(self, deserializer: D) -> Result<T, D::Error> {
            deserializer.deserialize_any(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(DeviceStatus::Healthy.as_str(), "DEVICE_STATUS_HEALTHY");
        assert_eq!(Protocol::GrpcStream.as_str(), "PROTOCOL_GRPC_STREAM");
        assert_eq!(DeviceStatus::default(), DeviceStatus::Unspecified);
        assert_eq!(Protocol::default(), Protocol::Unspecified);
    }

    #[test]
    fn test_from_name_unknown_is_unspecified() {
        assert_eq!(DeviceStatus::from_name("DEVICE_STATUS_OFFLINE"), DeviceStatus::Offline);
        assert_eq!(DeviceStatus::from_name("ON_FIRE"), DeviceStatus::Unspecified);
        assert_eq!(Protocol::from_code(2), Protocol::HttpStream);
        assert_eq!(Protocol::from_code(99), Protocol::Unspecified);
        assert_eq!(Protocol::from_code(-1), Protocol::Unspecified);
    }

    #[test]
    fn test_from_str_is_strict() {
        assert_eq!("healthy".parse::<DeviceStatus>(), Ok(DeviceStatus::Healthy));
        assert_eq!(
            "device_status_maintenance".parse::<DeviceStatus>(),
            Ok(DeviceStatus::Maintenance)
        );
        assert_eq!("http-stream".parse::<Protocol>(), Ok(Protocol::HttpStream));

        let err = "sideways".parse::<DeviceStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown device status 'sideways'");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_lenient_deserialize() {
        let status: DeviceStatus = serde_json::from_str(r#""DEVICE_STATUS_DEGRADED""#).unwrap();
        assert_eq!(status, DeviceStatus::Degraded);

        let status: DeviceStatus = serde_json::from_str(r#""SOMETHING_NEW""#).unwrap();
        assert_eq!(status, DeviceStatus::Unspecified);

        let status: DeviceStatus = serde_json::from_str("null").unwrap();
        assert_eq!(status, DeviceStatus::Unspecified);

        let protocols: Vec<Protocol> = serde_json::from_str(r#"[1, "PROTOCOL_GRPC", 7]"#).unwrap();
        assert_eq!(
            protocols,
            vec![Protocol::Http, Protocol::Grpc, Protocol::Unspecified]
        );

        assert!(serde_json::from_str::<DeviceStatus>("true").is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialize_uses_wire_name() {
        let json = serde_json::to_string(&DeviceStatus::Booting).unwrap();
        assert_eq!(json, r#""DEVICE_STATUS_BOOTING""#);
    }
}
