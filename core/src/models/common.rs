use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A hypermedia reference from a `_links` map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

/// `_links` keyed by relation (`self`, `parent`, `next`, ...).
pub type Links = BTreeMap<String, Link>;

/// Which client-side SDK credentials may evaluate a flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSideAvailability {
    pub using_mobile_key: bool,
    pub using_environment_id: bool,
}
