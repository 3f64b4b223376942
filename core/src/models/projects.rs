use serde::{Deserialize, Serialize};

use super::common::Links;
use super::environments::{Environment, EnvironmentPost};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub include_in_snippet_by_default: bool,
    /// Present only when the service expands environments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environments: Option<Vec<Environment>>,
    #[serde(rename = "_links", default)]
    pub links: Links,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Projects {
    pub items: Vec<Project>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    #[serde(rename = "_links", default)]
    pub links: Links,
}

/// Payload for creating a project. Without `environments` the service seeds
/// its default set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPost {
    pub name: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_in_snippet_by_default: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environments: Option<Vec<EnvironmentPost>>,
}

impl ProjectPost {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            tags: Vec::new(),
            include_in_snippet_by_default: None,
            environments: None,
        }
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn environments(mut self, environments: Vec<EnvironmentPost>) -> Self {
        self.environments = Some(environments);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Link;

    #[test]
    fn project_with_environments_round_trips() {
        let project = Project {
            id: Some("p-1".into()),
            key: "web".into(),
            name: "Web".into(),
            tags: vec!["frontend".into()],
            include_in_snippet_by_default: true,
            environments: Some(vec![Environment {
                id: Some("e-1".into()),
                key: "production".into(),
                name: "Production".into(),
                api_key: Some("sdk-123".into()),
                mobile_key: Some("mob-123".into()),
                color: "417505".into(),
                default_ttl: 5,
                secure_mode: true,
                default_track_events: false,
                require_comments: true,
                confirm_changes: false,
                tags: vec!["prod".into()],
                links: Links::new(),
            }]),
            links: Links::from([("self".to_string(), Link { href: "/api/v2/projects/web".into(), media_type: None })]),
        };
        let json = serde_json::to_string(&project).unwrap();
        assert_eq!(serde_json::from_str::<Project>(&json).unwrap(), project);

        let page = Projects { items: vec![project], total_count: Some(1), links: Links::new() };
        let json = serde_json::to_string(&page).unwrap();
        assert_eq!(serde_json::from_str::<Projects>(&json).unwrap(), page);
    }

    #[test]
    fn project_post_round_trips() {
        let post = ProjectPost::new("Web", "web")
            .tags(["frontend"])
            .environments(vec![EnvironmentPost::new("Staging", "staging", "00ff00")]);
        let json = serde_json::to_string(&post).unwrap();
        assert_eq!(serde_json::from_str::<ProjectPost>(&json).unwrap(), post);
    }
}

