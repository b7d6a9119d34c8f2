//! Connection attributes whose edits invalidate verification.

use super::ServerDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection attribute that identifies how a server is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionField {
    /// Login identity on the target.
    User,
    /// Host name or address.
    IpAddress,
    /// Deploy root on the target filesystem.
    Path,
    /// SSH port.
    Port,
}

impl ConnectionField {
    /// All connection fields.
    pub const ALL: [Self; 4] = [Self::User, Self::IpAddress, Self::Path, Self::Port];

    /// Returns the canonical field name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::IpAddress => "ip_address",
            Self::Path => "path",
            Self::Port => "port",
        }
    }
}

impl fmt::Display for ConnectionField {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ConnectionField {
    type Error = ServerDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "user" => Ok(Self::User),
            "ip_address" | "ipAddress" => Ok(Self::IpAddress),
            "path" => Ok(Self::Path),
            "port" => Ok(Self::Port),
            _ => Err(ServerDomainError::UnknownField(value.to_owned())),
        }
    }
}

/// Typed new value for a single connection attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum ConnectionEdit {
    /// New login identity.
    User(String),
    /// New host name or address.
    IpAddress(String),
    /// New deploy root.
    Path(String),
    /// New SSH port.
    Port(u16),
}

impl ConnectionEdit {
    /// Coerces a raw caller-supplied value into a typed edit.
    ///
    /// String fields are taken verbatim. The port is trimmed and parsed as an
    /// unsigned 16-bit integer.
    ///
    /// # Errors
    ///
    /// Returns [`ServerDomainError::InvalidFieldValue`] when the port is not
    /// a number in `0..=65535`.
    pub fn parse(field: ConnectionField, raw: &str) -> Result<Self, ServerDomainError> {
        match field {
            ConnectionField::User => Ok(Self::User(raw.to_owned())),
            ConnectionField::IpAddress => Ok(Self::IpAddress(raw.to_owned())),
            ConnectionField::Path => Ok(Self::Path(raw.to_owned())),
            ConnectionField::Port => raw.trim().parse::<u16>().map(Self::Port).map_err(|_| {
                ServerDomainError::InvalidFieldValue {
                    field: field.as_str().to_owned(),
                    value: raw.to_owned(),
                }
            }),
        }
    }

    /// Returns the field this edit targets.
    #[must_use]
    pub const fn field(&self) -> ConnectionField {
        match self {
            Self::User(_) => ConnectionField::User,
            Self::IpAddress(_) => ConnectionField::IpAddress,
            Self::Path(_) => ConnectionField::Path,
            Self::Port(_) => ConnectionField::Port,
        }
    }
}

/// Connection attributes of a server.
///
/// Every attribute is optional so that "never set" stays distinguishable
/// from any concrete value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDetails {
    /// Login identity on the target.
    pub user: Option<String>,
    /// Host name or address.
    pub ip_address: Option<String>,
    /// Deploy root, stored as supplied.
    pub path: Option<String>,
    /// SSH port.
    pub port: Option<u16>,
}

impl ConnectionDetails {
    /// Writes `edit` into the matching attribute.
    ///
    /// Returns `true` when the stored value differs from the new one,
    /// including when no value was stored.
    pub fn write(&mut self, edit: ConnectionEdit) -> bool {
        match edit {
            ConnectionEdit::User(value) => replace_value(&mut self.user, value),
            ConnectionEdit::IpAddress(value) => replace_value(&mut self.ip_address, value),
            ConnectionEdit::Path(value) => replace_value(&mut self.path, value),
            ConnectionEdit::Port(value) => replace_value(&mut self.port, value),
        }
    }
}

fn replace_value<T: PartialEq>(slot: &mut Option<T>, value: T) -> bool {
    let changed = slot.as_ref() != Some(&value);
    *slot = Some(value);
    changed
}

/// Strips trailing `/` separators from a deploy path.
///
/// The root path `/` becomes the empty string, so that callers can always
/// append `/<segment>` to the result.
#[must_use]
pub fn clean_path(path: &str) -> &str {
    path.trim_end_matches('/')
}
