// Wire types for the controller REST protocol.
//
// Switches and ports are the controller's only first-class resources.
// Cross-referencing against local records rides on tags: small
// scope/value pairs attached to both resource kinds.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Well-known tag scopes used for cross-referencing.
pub mod tag_scope {
    /// Local port record id, attached to backend ports at create time.
    /// The join key for port reconciliation.
    pub const LOGICAL_PORT_ID: &str = "logical-port-id";
    /// Local network record id, attached to every backend switch that
    /// carries the network (primary and fragments alike).
    pub const LOGICAL_NETWORK_ID: &str = "logical-network-id";
    /// Owning tenant id.
    pub const TENANT_ID: &str = "tenant-id";
    /// Digested device identifier of the attached workload.
    pub const DEVICE_ID: &str = "device-id";
    /// Present on a network's primary switch once the network spans
    /// more than one backend switch.
    pub const MULTI_SWITCH: &str = "multi-switch";
}

/// Controllers cap tag values at 40 characters.
pub const MAX_TAG_VALUE_LEN: usize = 40;
/// Display names share the same cap.
pub const MAX_DISPLAY_NAME_LEN: usize = 40;

/// A scope/value pair attached to a backend resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub scope: String,
    pub tag: String,
}

impl Tag {
    /// Tag with the value clamped to the controller's length cap.
    pub fn scoped(scope: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        let tag = if value.chars().count() > MAX_TAG_VALUE_LEN {
            value.chars().take(MAX_TAG_VALUE_LEN).collect()
        } else {
            value
        };
        Self {
            scope: scope.to_owned(),
            tag,
        }
    }
}

/// Digest a device identifier down to a tag-sized value.
///
/// Device ids are free-form and routinely longer than the tag cap, so
/// both the stored tag and any filter on it use this digest.
pub fn device_digest(device_id: &str) -> String {
    let hex = format!("{:x}", Sha256::digest(device_id.as_bytes()));
    hex.chars().take(MAX_TAG_VALUE_LEN).collect()
}

/// Clamp a display name to the controller's length cap.
pub fn truncate_display_name(name: &str) -> String {
    if name.chars().count() > MAX_DISPLAY_NAME_LEN {
        tracing::warn!(name, "display name exceeds backend cap, truncating");
        name.chars().take(MAX_DISPLAY_NAME_LEN).collect()
    } else {
        name.to_owned()
    }
}

/// Look up a tag value by scope.
fn tag_value<'a>(tags: &'a [Tag], scope: &str) -> Option<&'a str> {
    tags.iter()
        .find(|t| t.scope == scope)
        .map(|t| t.tag.as_str())
}

// ── Paging envelope ──────────────────────────────────────────────────

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub result_count: u64,
    /// Opaque cursor for the next page; absent on the last page.
    #[serde(default)]
    pub page_cursor: Option<String>,
}

// ── Switches ─────────────────────────────────────────────────────────

/// Observed fabric state of a backend switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SwitchStatus {
    /// Whether the transport fabric reports the switch as up.
    pub fabric_status: bool,
    /// Number of ports currently attached.
    #[serde(default)]
    pub port_count: u32,
}

/// A logical switch as the controller reports it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BackendSwitch {
    pub uuid: Uuid,
    pub display_name: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Populated only when the listing requested status relations.
    #[serde(default)]
    pub status: Option<SwitchStatus>,
}

impl BackendSwitch {
    pub fn tag_value(&self, scope: &str) -> Option<&str> {
        tag_value(&self.tags, scope)
    }

    pub fn has_tag(&self, scope: &str) -> bool {
        self.tags.iter().any(|t| t.scope == scope)
    }

    /// Attached port count, zero when status was not requested.
    pub fn port_count(&self) -> u32 {
        self.status.as_ref().map_or(0, |s| s.port_count)
    }

    pub fn fabric_up(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.fabric_status)
    }
}

/// Request body for creating a backend switch.
#[derive(Debug, Clone, Serialize)]
pub struct SwitchSpec {
    pub display_name: String,
    pub transport_zone: Uuid,
    /// Transport encapsulation, mirrors the provider network type.
    pub transport_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan_id: Option<u16>,
    pub tags: Vec<Tag>,
}

/// Partial update for a backend switch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SwitchUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
}

// ── Ports ────────────────────────────────────────────────────────────

/// Observed fabric state of a backend port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PortStatus {
    pub fabric_status_up: bool,
}

/// A logical port as the controller reports it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BackendPort {
    pub uuid: Uuid,
    pub display_name: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default = "default_admin_enabled")]
    pub admin_status_enabled: bool,
    #[serde(default)]
    pub status: Option<PortStatus>,
    /// Parent switch uuid, present in wildcard listings.
    #[serde(default)]
    pub switch_uuid: Option<Uuid>,
}

fn default_admin_enabled() -> bool {
    true
}

impl BackendPort {
    pub fn tag_value(&self, scope: &str) -> Option<&str> {
        tag_value(&self.tags, scope)
    }

    pub fn fabric_up(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.fabric_status_up)
    }
}

/// Request body for creating a backend port.
#[derive(Debug, Clone, Serialize)]
pub struct PortSpec {
    pub display_name: String,
    pub admin_status_enabled: bool,
    pub tags: Vec<Tag>,
}

/// Partial update for a backend port.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PortUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_status_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
}

/// What a backend port is plugged into.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Attachment {
    /// A workload interface, identified by the local port record id.
    #[serde(rename = "VifAttachment")]
    Vif { vif_uuid: Uuid },
}

// ── Listing filters ──────────────────────────────────────────────────

/// Filter for switch and port listings.
#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    pub uuid: Option<Uuid>,
    pub tags: Vec<Tag>,
    /// Restrict to resources carrying any tag under this scope.
    pub scope_presence: Option<String>,
    /// Ask the controller to include status relations.
    pub relations: bool,
    pub page_length: Option<u32>,
}

impl ResourceFilter {
    pub fn by_tag(scope: &str, value: impl Into<String>) -> Self {
        Self {
            tags: vec![Tag::scoped(scope, value)],
            ..Self::default()
        }
    }

    pub fn by_uuid(uuid: Uuid) -> Self {
        Self {
            uuid: Some(uuid),
            ..Self::default()
        }
    }

    pub fn and_tag(mut self, scope: &str, value: impl Into<String>) -> Self {
        self.tags.push(Tag::scoped(scope, value));
        self
    }

    pub fn with_relations(mut self) -> Self {
        self.relations = true;
        self
    }

    /// Only match resources carrying some tag under `scope`, whatever
    /// its value.
    pub fn with_scope_presence(mut self, scope: &str) -> Self {
        self.scope_presence = Some(scope.to_owned());
        self
    }

    /// Encode as query parameters. Tag constraints come out as adjacent
    /// `tag` / `tag_scope` pairs; a presence constraint is a bare
    /// `tag_scope`.
    pub(crate) fn query(&self) -> Vec<(String, String)> {
        let mut params = vec![(String::from("fields"), String::from("*"))];
        if let Some(uuid) = self.uuid {
            params.push((String::from("uuid"), uuid.to_string()));
        }
        for tag in &self.tags {
            params.push((String::from("tag"), tag.tag.clone()));
            params.push((String::from("tag_scope"), tag.scope.clone()));
        }
        if let Some(scope) = &self.scope_presence {
            params.push((String::from("tag_scope"), scope.clone()));
        }
        if self.relations {
            params.push((String::from("relations"), String::from("status")));
        }
        if let Some(len) = self.page_length {
            params.push((String::from("_page_length"), len.to_string()));
        }
        params
    }
}
