//! Serde helpers for documents written by earlier tooling.
//!
//! Those documents store empty collections as `null` and missing addresses as
//! an empty string. Both have to read back as the zero value.

use serde::{Deserialize, Deserializer};

/// Deserialize `null` as `T::default()`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Optional IP address stored as text, `""` when absent.
pub(crate) mod optional_ip {
    use std::net::IpAddr;

    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S>(ip: &Option<IpAddr>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match ip {
            Some(ip) => serializer.collect_str(ip),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<IpAddr>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => text
                .parse::<IpAddr>()
                .map(Some)
                .map_err(|e| de::Error::custom(format!("invalid ip address '{text}': {e}"))),
        }
    }
}
