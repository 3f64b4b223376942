use serde::{Deserialize, Serialize};

use super::common::Links;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub key: String,
    pub name: String,
    /// Server-side SDK key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_key: Option<String>,
    /// Hex color without `#`.
    #[serde(default)]
    pub color: String,
    /// Minutes the service waits before re-enabling event capture.
    #[serde(default)]
    pub default_ttl: u32,
    #[serde(default)]
    pub secure_mode: bool,
    #[serde(default)]
    pub default_track_events: bool,
    #[serde(default)]
    pub require_comments: bool,
    #[serde(default)]
    pub confirm_changes: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "_links", default)]
    pub links: Links,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentPost {
    pub name: String,
    pub key: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_ttl: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl EnvironmentPost {
    pub fn new(name: impl Into<String>, key: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            color: color.into(),
            default_ttl: None,
            secure_mode: None,
            tags: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_round_trips() {
        let env = Environment {
            id: None,
            key: "staging".into(),
            name: "Staging".into(),
            api_key: Some("sdk-abc".into()),
            mobile_key: None,
            color: "00ff00".into(),
            default_ttl: 0,
            secure_mode: false,
            default_track_events: true,
            require_comments: false,
            confirm_changes: true,
            tags: Vec::new(),
            links: Links::new(),
        };
        let json = serde_json::to_string(&env).unwrap();
        assert_eq!(serde_json::from_str::<Environment>(&json).unwrap(), env);

        let post = EnvironmentPost {
            default_ttl: Some(10),
            secure_mode: Some(true),
            tags: vec!["qa".into()],
            ..EnvironmentPost::new("Staging", "staging", "00ff00")
        };
        let json = serde_json::to_string(&post).unwrap();
        assert_eq!(serde_json::from_str::<EnvironmentPost>(&json).unwrap(), post);
    }
}

