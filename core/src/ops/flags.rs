use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::models::{FeatureFlag, FeatureFlagBody, FeatureFlags, PatchWithComment};
use crate::operation::{json_body, Operation, Query};

/// `GET /flags/{project}`: flags of a project, optionally narrowed.
#[derive(Debug, Clone)]
pub struct ListFeatureFlags {
    project_key: String,
    env: Vec<String>,
    tag: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
    archived: Option<bool>,
    summary: Option<bool>,
    filter: Option<String>,
    sort: Option<String>,
}

impl ListFeatureFlags {
    pub fn new(project_key: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
            env: Vec::new(),
            tag: None,
            limit: None,
            offset: None,
            archived: None,
            summary: None,
            filter: None,
            sort: None,
        }
    }

    /// Only include configurations for this environment. Repeatable.
    pub fn env(mut self, env: impl Into<String>) -> Self {
        self.env.push(env.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn archived(mut self, archived: bool) -> Self {
        self.archived = Some(archived);
        self
    }

    /// Omit per-environment configurations unless `env` names them.
    pub fn summary(mut self, summary: bool) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }
}

impl Operation for ListFeatureFlags {
    type Output = FeatureFlags;

    fn method(&self) -> HttpMethod {
        HttpMethod::Get
    }

    fn path(&self) -> Vec<String> {
        vec!["flags".to_string(), self.project_key.clone()]
    }

    fn query(&self) -> Query {
        let mut query = Query::default();
        for env in &self.env {
            query.push("env", env);
        }
        query
            .push_opt("tag", self.tag.as_deref())
            .push_opt("limit", self.limit)
            .push_opt("offset", self.offset)
            .push_opt("archived", self.archived)
            .push_opt("summary", self.summary)
            .push_opt("filter", self.filter.as_deref())
            .push_opt("sort", self.sort.as_deref());
        query
    }
}

#[derive(Debug, Clone)]
pub struct GetFeatureFlag {
    project_key: String,
    flag_key: String,
    env: Option<String>,
}

impl GetFeatureFlag {
    pub fn new(project_key: impl Into<String>, flag_key: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
            flag_key: flag_key.into(),
            env: None,
        }
    }

    pub fn env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }
}

impl Operation for GetFeatureFlag {
    type Output = FeatureFlag;

    fn method(&self) -> HttpMethod {
        HttpMethod::Get
    }

    fn path(&self) -> Vec<String> {
        flag_path(&self.project_key, &self.flag_key)
    }

    fn query(&self) -> Query {
        let mut query = Query::default();
        query.push_opt("env", self.env.as_deref());
        query
    }
}

#[derive(Debug, Clone)]
pub struct CreateFeatureFlag {
    project_key: String,
    body: FeatureFlagBody,
    clone: Option<String>,
}

impl CreateFeatureFlag {
    pub fn new(project_key: impl Into<String>, body: FeatureFlagBody) -> Self {
        Self {
            project_key: project_key.into(),
            body,
            clone: None,
        }
    }

    /// Copy targeting from an existing flag with this key.
    pub fn clone_flag(mut self, flag_key: impl Into<String>) -> Self {
        self.clone = Some(flag_key.into());
        self
    }
}

impl Operation for CreateFeatureFlag {
    type Output = FeatureFlag;

    fn method(&self) -> HttpMethod {
        HttpMethod::Post
    }

    fn path(&self) -> Vec<String> {
        vec!["flags".to_string(), self.project_key.clone()]
    }

    fn query(&self) -> Query {
        let mut query = Query::default();
        query.push_opt("clone", self.clone.as_deref());
        query
    }

    fn body(&self) -> Result<Option<String>, ApiError> {
        json_body(&self.body)
    }
}

/// `PATCH /flags/{project}/{flag}` with a JSON Patch document.
#[derive(Debug, Clone)]
pub struct PatchFeatureFlag {
    project_key: String,
    flag_key: String,
    patch: PatchWithComment,
}

impl PatchFeatureFlag {
    pub fn new(project_key: impl Into<String>, flag_key: impl Into<String>, patch: PatchWithComment) -> Self {
        Self {
            project_key: project_key.into(),
            flag_key: flag_key.into(),
            patch,
        }
    }
}

impl Operation for PatchFeatureFlag {
    type Output = FeatureFlag;

    fn method(&self) -> HttpMethod {
        HttpMethod::Patch
    }

    fn path(&self) -> Vec<String> {
        flag_path(&self.project_key, &self.flag_key)
    }

    fn body(&self) -> Result<Option<String>, ApiError> {
        json_body(&self.patch)
    }
}

#[derive(Debug, Clone)]
pub struct DeleteFeatureFlag {
    project_key: String,
    flag_key: String,
}

impl DeleteFeatureFlag {
    pub fn new(project_key: impl Into<String>, flag_key: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
            flag_key: flag_key.into(),
        }
    }
}

impl Operation for DeleteFeatureFlag {
    type Output = ();

    fn method(&self) -> HttpMethod {
        HttpMethod::Delete
    }

    fn expects_body(&self) -> bool {
        false
    }

    fn path(&self) -> Vec<String> {
        flag_path(&self.project_key, &self.flag_key)
    }
}

fn flag_path(project_key: &str, flag_key: &str) -> Vec<String> {
    vec!["flags".to_string(), project_key.to_string(), flag_key.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_repeats_env_and_skips_unset() {
        let op = ListFeatureFlags::new("default")
            .env("production")
            .env("test")
            .archived(false)
            .filter("query:checkout");
        let query = op.query();
        assert_eq!(
            query.pairs(),
            &[
                ("env".to_string(), "production".to_string()),
                ("env".to_string(), "test".to_string()),
                ("archived".to_string(), "false".to_string()),
                ("filter".to_string(), "query:checkout".to_string()),
            ]
        );
    }

    #[test]
    fn bare_list_has_no_query() {
        assert!(ListFeatureFlags::new("default").query().is_empty());
    }

    #[test]
    fn create_with_clone_sets_query() {
        let op = CreateFeatureFlag::new("default", FeatureFlagBody::new("B", "b")).clone_flag("a");
        assert_eq!(op.query().get("clone"), Some("a"));
        assert_eq!(op.path(), vec!["flags", "default"]);
    }

    #[test]
    fn delete_has_no_body() {
        let op = DeleteFeatureFlag::new("default", "a");
        assert_eq!(op.method(), HttpMethod::Delete);
        assert!(op.body().unwrap().is_none());
    }
}
