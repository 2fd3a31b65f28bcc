//! Resource snapshots rebuilt from flat postback fields

use serde::Serialize;
use std::str::FromStr;

use crate::core::{Error, ParameterSet, Result};
use crate::iframe::postback::RESOURCE_TYPE_FIELD;

/// `resource_type` values the iframe posts back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    AuthenticationRequest,
    Pairing,
    RequesterUser,
}

impl FromStr for ResourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "authentication_request" => Ok(ResourceType::AuthenticationRequest),
            "pairing" => Ok(ResourceType::Pairing),
            "requester_user" => Ok(ResourceType::RequesterUser),
            other => Err(Error::UnknownResourceType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSnapshot {
    pub id: String,
    pub name: String,
    pub toopher_authentication_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminalSnapshot {
    pub id: String,
    pub name: String,
    pub requester_specified_id: Option<String>,
    pub user: UserSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionSnapshot {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticationRequestSnapshot {
    pub id: String,
    pub pending: bool,
    pub granted: bool,
    pub automated: bool,
    pub reason_code: Option<String>,
    pub reason: Option<String>,
    pub terminal: TerminalSnapshot,
    pub user: UserSnapshot,
    pub action: ActionSnapshot,
}

impl AuthenticationRequestSnapshot {
    /// Finished and granted
    pub fn is_granted(&self) -> bool {
        !self.pending && self.granted
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairingSnapshot {
    pub id: String,
    pub enabled: bool,
    pub pending: bool,
    pub user: UserSnapshot,
}

/// Read-only view of a remote entity as of the signed postback
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "resource_type", rename_all = "snake_case")]
pub enum ResourceSnapshot {
    AuthenticationRequest(AuthenticationRequestSnapshot),
    Pairing(PairingSnapshot),
    #[serde(rename = "requester_user")]
    User(UserSnapshot),
}

impl ResourceSnapshot {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            ResourceSnapshot::AuthenticationRequest(_) => ResourceType::AuthenticationRequest,
            ResourceSnapshot::Pairing(_) => ResourceType::Pairing,
            ResourceSnapshot::User(_) => ResourceType::RequesterUser,
        }
    }

    pub fn as_authentication_request(&self) -> Option<&AuthenticationRequestSnapshot> {
        match self {
            ResourceSnapshot::AuthenticationRequest(auth) => Some(auth),
            _ => None,
        }
    }
}

/// Dispatch on `resource_type` and rebuild the nested snapshot
pub fn decode(fields: &ParameterSet) -> Result<ResourceSnapshot> {
    let resource_type: ResourceType = required(fields, RESOURCE_TYPE_FIELD)?.parse()?;
    decode_as(resource_type, fields)
}

pub fn decode_as(resource_type: ResourceType, fields: &ParameterSet) -> Result<ResourceSnapshot> {
    match resource_type {
        ResourceType::AuthenticationRequest => {
            let user = pairing_user(fields)?;
            Ok(ResourceSnapshot::AuthenticationRequest(AuthenticationRequestSnapshot {
                id: required(fields, "id")?.to_string(),
                pending: flag(fields, "pending")?,
                granted: flag(fields, "granted")?,
                automated: flag(fields, "automated")?,
                reason_code: optional(fields, "reason_code"),
                reason: optional(fields, "reason"),
                terminal: TerminalSnapshot {
                    id: required(fields, "terminal_id")?.to_string(),
                    name: required(fields, "terminal_name")?.to_string(),
                    requester_specified_id: optional(fields, "terminal_requester_specified_id"),
                    user: user.clone(),
                },
                user,
                action: ActionSnapshot {
                    id: required(fields, "action_id")?.to_string(),
                    name: required(fields, "action_name")?.to_string(),
                },
            }))
        }
        ResourceType::Pairing => Ok(ResourceSnapshot::Pairing(PairingSnapshot {
            id: required(fields, "id")?.to_string(),
            enabled: flag(fields, "enabled")?,
            pending: flag(fields, "pending")?,
            user: pairing_user(fields)?,
        })),
        ResourceType::RequesterUser => Ok(ResourceSnapshot::User(UserSnapshot {
            id: required(fields, "id")?.to_string(),
            name: required(fields, "name")?.to_string(),
            toopher_authentication_enabled: flag(fields, "toopher_authentication_enabled")?,
        })),
    }
}

fn pairing_user(fields: &ParameterSet) -> Result<UserSnapshot> {
    Ok(UserSnapshot {
        id: required(fields, "pairing_user_id")?.to_string(),
        name: required(fields, "user_name")?.to_string(),
        toopher_authentication_enabled: flag(fields, "user_toopher_authentication_enabled")?,
    })
}

fn required<'a>(fields: &'a ParameterSet, key: &str) -> Result<&'a str> {
    fields
        .get(key)
        .ok_or_else(|| Error::MalformedResource(format!("missing field: {}", key)))
}

fn optional(fields: &ParameterSet, key: &str) -> Option<String> {
    fields.get(key).map(str::to_string)
}

// Only the literal "true" is true
fn flag(fields: &ParameterSet, key: &str) -> Result<bool> {
    Ok(required(fields, key)? == "true")
}
