//! In-memory state of the mock service.
//!
//! All mutations live here so handlers stay thin. Every method returns the
//! service's error shape directly.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiFailure;
use crate::models::{
    Defaults, Environment, EnvironmentInput, Flag, FlagEnvironment, FlagInput, Link,
    Links, PatchOperation, Project, ProjectInput, Segment, SegmentInput, Variation,
};
use crate::patch;

const API_ROOT: &str = "/api/v2";

#[derive(Debug, Default)]
pub struct Store {
    projects: BTreeMap<String, ProjectRecord>,
}

#[derive(Debug)]
struct ProjectRecord {
    project: Project,
    environments: BTreeMap<String, Environment>,
    flags: BTreeMap<String, Flag>,
    /// Segments keyed by environment, then segment key.
    segments: BTreeMap<String, BTreeMap<String, Segment>>,
}

impl ProjectRecord {
    fn rendered(&self, with_environments: bool) -> Project {
        let mut project = self.project.clone();
        if with_environments {
            project.environments = Some(self.environments.values().cloned().collect());
        }
        project
    }
}

pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn self_link(href: String) -> Links {
    BTreeMap::from([("self".to_string(), Link::json(href))])
}

/// Keys are 1-256 chars of ASCII letters, digits, `.`, `_` or `-`, starting
/// with a letter or digit so `.` and `..` never name a resource.
fn validate_key(kind: &str, key: &str) -> Result<(), ApiFailure> {
    let valid = key.len() <= 256
        && key.starts_with(|c: char| c.is_ascii_alphanumeric())
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(ApiFailure::invalid_request(format!("invalid {kind} key {key:?}")))
    }
}

fn validate_name(kind: &str, name: &str) -> Result<(), ApiFailure> {
    if name.trim().is_empty() {
        return Err(ApiFailure::invalid_request(format!("{kind} name must not be empty")));
    }
    Ok(())
}

fn build_environment(project_key: &str, input: EnvironmentInput) -> Result<Environment, ApiFailure> {
    validate_key("environment", &input.key)?;
    validate_name("environment", &input.name)?;
    Ok(Environment {
        id: new_id(),
        links: self_link(format!(
            "{API_ROOT}/projects/{project_key}/environments/{}",
            input.key
        )),
        api_key: format!("sdk-{}", Uuid::new_v4()),
        mobile_key: format!("mob-{}", Uuid::new_v4()),
        key: input.key,
        name: input.name,
        color: input.color,
        default_ttl: input.default_ttl,
        secure_mode: input.secure_mode,
        default_track_events: false,
        require_comments: false,
        confirm_changes: false,
        tags: input.tags,
    })
}

fn default_environments() -> Vec<EnvironmentInput> {
    vec![
        EnvironmentInput {
            name: "Production".to_string(),
            key: "production".to_string(),
            color: "417505".to_string(),
            default_ttl: 0,
            secure_mode: false,
            tags: Vec::new(),
        },
        EnvironmentInput {
            name: "Test".to_string(),
            key: "test".to_string(),
            color: "F5A623".to_string(),
            default_ttl: 0,
            secure_mode: false,
            tags: Vec::new(),
        },
    ]
}

/// Filters and paging shared by the list endpoints.
#[derive(Debug, Default, Clone)]
pub struct ListParams {
    pub limit: Option<usize>,
    pub offset: usize,
    /// Substring matched against key and name, from `filter=query:<text>`.
    pub query: Option<String>,
}

impl ListParams {
    fn matches(&self, key: &str, name: &str) -> bool {
        match &self.query {
            Some(q) => key.contains(q.as_str()) || name.contains(q.as_str()),
            None => true,
        }
    }

    fn page<T>(&self, items: Vec<T>) -> Vec<T> {
        let limit = self.limit.unwrap_or(usize::MAX);
        items.into_iter().skip(self.offset).take(limit).collect()
    }
}

#[derive(Debug, Default, Clone)]
pub struct FlagListParams {
    pub list: ListParams,
    pub envs: Vec<String>,
    pub tag: Option<String>,
    pub archived: Option<bool>,
    pub summary: bool,
    pub sort: Option<String>,
}

impl Store {
    fn project(&self, key: &str) -> Result<&ProjectRecord, ApiFailure> {
        self.projects
            .get(key)
            .ok_or_else(|| ApiFailure::not_found("project", key))
    }

    fn project_mut(&mut self, key: &str) -> Result<&mut ProjectRecord, ApiFailure> {
        self.projects
            .get_mut(key)
            .ok_or_else(|| ApiFailure::not_found("project", key))
    }

    // --- projects ---

    pub fn list_projects(&self, params: &ListParams) -> (Vec<Project>, usize) {
        let matching: Vec<Project> = self
            .projects
            .values()
            .filter(|r| params.matches(&r.project.key, &r.project.name))
            .map(|r| r.rendered(false))
            .collect();
        let total = matching.len();
        (params.page(matching), total)
    }

    pub fn get_project(&self, key: &str) -> Result<Project, ApiFailure> {
        Ok(self.project(key)?.rendered(true))
    }

    pub fn create_project(&mut self, input: ProjectInput) -> Result<Project, ApiFailure> {
        validate_key("project", &input.key)?;
        validate_name("project", &input.name)?;
        if self.projects.contains_key(&input.key) {
            return Err(ApiFailure::conflict(format!("project {} already exists", input.key)));
        }
        let key = input.key;
        let mut environments = BTreeMap::new();
        for env_input in input.environments.unwrap_or_else(default_environments) {
            let env = build_environment(&key, env_input)?;
            if environments.contains_key(&env.key) {
                return Err(ApiFailure::invalid_request(format!("duplicate environment key {}", env.key)));
            }
            environments.insert(env.key.clone(), env);
        }
        let project = Project {
            id: new_id(),
            links: self_link(format!("{API_ROOT}/projects/{key}")),
            key: key.clone(),
            name: input.name,
            tags: input.tags,
            include_in_snippet_by_default: input.include_in_snippet_by_default,
            environments: None,
        };
        let record = ProjectRecord {
            project,
            environments,
            flags: BTreeMap::new(),
            segments: BTreeMap::new(),
        };
        let rendered = record.rendered(true);
        self.projects.insert(key, record);
        Ok(rendered)
    }

    pub fn delete_project(&mut self, key: &str) -> Result<(), ApiFailure> {
        self.projects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| ApiFailure::not_found("project", key))
    }

    // --- environments ---

    pub fn get_environment(&self, project_key: &str, env_key: &str) -> Result<Environment, ApiFailure> {
        self.project(project_key)?
            .environments
            .get(env_key)
            .cloned()
            .ok_or_else(|| ApiFailure::not_found("environment", env_key))
    }

    pub fn create_environment(
        &mut self,
        project_key: &str,
        input: EnvironmentInput,
    ) -> Result<Environment, ApiFailure> {
        let record = self.project_mut(project_key)?;
        let env = build_environment(project_key, input)?;
        if record.environments.contains_key(&env.key) {
            return Err(ApiFailure::conflict(format!("environment {} already exists", env.key)));
        }
        let now = now_millis();
        for flag in record.flags.values_mut() {
            let config = FlagEnvironment::new(project_key, &flag.key, &env, flag.defaults, new_id(), now);
            flag.environments.insert(env.key.clone(), config);
        }
        record.environments.insert(env.key.clone(), env.clone());
        Ok(env)
    }

    pub fn delete_environment(&mut self, project_key: &str, env_key: &str) -> Result<(), ApiFailure> {
        let record = self.project_mut(project_key)?;
        record
            .environments
            .remove(env_key)
            .ok_or_else(|| ApiFailure::not_found("environment", env_key))?;
        for flag in record.flags.values_mut() {
            flag.environments.remove(env_key);
        }
        record.segments.remove(env_key);
        Ok(())
    }

    // --- flags ---

    pub fn list_flags(&self, project_key: &str, params: &FlagListParams) -> Result<(Vec<Flag>, usize), ApiFailure> {
        let record = self.project(project_key)?;
        for env in &params.envs {
            if !record.environments.contains_key(env) {
                return Err(ApiFailure::invalid_request(format!("unknown environment {env}")));
            }
        }
        let mut matching: Vec<Flag> = record
            .flags
            .values()
            .filter(|f| params.list.matches(&f.key, &f.name))
            .filter(|f| params.tag.as_ref().map_or(true, |t| f.tags.contains(t)))
            .filter(|f| f.archived == params.archived.unwrap_or(false))
            .map(|f| render_flag(f, &params.envs, params.summary))
            .collect();
        match params.sort.as_deref() {
            None | Some("key") => {}
            Some("-key") => matching.reverse(),
            Some("name") => matching.sort_by(|a, b| a.name.cmp(&b.name)),
            Some("-name") => matching.sort_by(|a, b| b.name.cmp(&a.name)),
            Some("creationDate") => matching.sort_by_key(|f| f.creation_date),
            Some("-creationDate") => matching.sort_by_key(|f| std::cmp::Reverse(f.creation_date)),
            Some(other) => return Err(ApiFailure::invalid_request(format!("unsupported sort {other:?}"))),
        }
        let total = matching.len();
        Ok((params.list.page(matching), total))
    }

    pub fn get_flag(&self, project_key: &str, flag_key: &str, env: Option<&str>) -> Result<Flag, ApiFailure> {
        let record = self.project(project_key)?;
        let flag = record
            .flags
            .get(flag_key)
            .ok_or_else(|| ApiFailure::not_found("flag", flag_key))?;
        let envs: Vec<String> = env.map(str::to_string).into_iter().collect();
        Ok(render_flag(flag, &envs, false))
    }

    pub fn create_flag(
        &mut self,
        project_key: &str,
        input: FlagInput,
        clone: Option<&str>,
    ) -> Result<Flag, ApiFailure> {
        let record = self.project_mut(project_key)?;
        validate_key("flag", &input.key)?;
        validate_name("flag", &input.name)?;
        if record.flags.contains_key(&input.key) {
            return Err(ApiFailure::conflict(format!("flag {} already exists", input.key)));
        }
        let source = match clone {
            Some(source_key) => Some(
                record
                    .flags
                    .get(source_key)
                    .ok_or_else(|| ApiFailure::not_found("flag", source_key))?
                    .clone(),
            ),
            None => None,
        };

        let variations: Vec<Variation> = if input.variations.is_empty() {
            vec![Value::Bool(true), Value::Bool(false)]
                .into_iter()
                .map(|value| Variation {
                    id: new_id(),
                    value,
                    name: None,
                    description: None,
                })
                .collect()
        } else {
            input
                .variations
                .into_iter()
                .map(|v| Variation {
                    id: new_id(),
                    value: v.value,
                    name: v.name,
                    description: v.description,
                })
                .collect()
        };
        if variations.len() < 2 {
            return Err(ApiFailure::invalid_request("a flag needs at least two variations"));
        }
        let defaults = input.defaults.unwrap_or(Defaults {
            on_variation: 0,
            off_variation: variations.len() - 1,
        });
        if defaults.on_variation >= variations.len() || defaults.off_variation >= variations.len() {
            return Err(ApiFailure::invalid_request("defaults refer to a missing variation"));
        }
        let kind = if variations.len() == 2 && variations.iter().all(|v| v.value.is_boolean()) {
            "boolean"
        } else {
            "multivariate"
        };

        let now = now_millis();
        let key = input.key;
        let environments = record
            .environments
            .values()
            .map(|env| {
                let config = source
                    .as_ref()
                    .and_then(|s| s.environments.get(&env.key).cloned())
                    .map(|mut config| {
                        config.site.href = format!("/{project_key}/{}/features/{key}", env.key);
                        config.salt = new_id();
                        config.version = 1;
                        config.last_modified = now;
                        config
                    })
                    .unwrap_or_else(|| FlagEnvironment::new(project_key, &key, env, defaults, new_id(), now));
                (env.key.clone(), config)
            })
            .collect();

        let flag = Flag {
            links: BTreeMap::from([
                ("self".to_string(), Link::json(format!("{API_ROOT}/flags/{project_key}/{key}"))),
                ("parent".to_string(), Link::json(format!("{API_ROOT}/flags/{project_key}"))),
            ]),
            key: key.clone(),
            name: input.name,
            kind: kind.to_string(),
            description: input.description,
            version: 1,
            creation_date: now,
            variations,
            temporary: input.temporary,
            tags: input.tags,
            client_side_availability: input.client_side_availability.unwrap_or_default(),
            defaults,
            archived: false,
            deprecated: false,
            environments,
        };
        record.flags.insert(key, flag.clone());
        Ok(flag)
    }

    pub fn patch_flag(
        &mut self,
        project_key: &str,
        flag_key: &str,
        ops: &[PatchOperation],
    ) -> Result<Flag, ApiFailure> {
        let record = self.project_mut(project_key)?;
        let current = record
            .flags
            .get(flag_key)
            .ok_or_else(|| ApiFailure::not_found("flag", flag_key))?;
        let mut updated: Flag = patched(current, ops)?;
        if updated.key != current.key
            || updated.version != current.version
            || updated.creation_date != current.creation_date
        {
            return Err(ApiFailure::invalid_request("key, _version and creationDate are read-only"));
        }
        if updated.environments.keys().ne(current.environments.keys()) {
            return Err(ApiFailure::invalid_request("environments cannot be added or removed by patch"));
        }
        let variation_count = updated.variations.len();
        for variation in updated.variations.iter_mut().filter(|v| v.id.is_empty()) {
            variation.id = new_id();
        }
        if updated.defaults.on_variation >= variation_count || updated.defaults.off_variation >= variation_count {
            return Err(ApiFailure::invalid_request("defaults refer to a missing variation"));
        }

        let now = now_millis();
        for (env_key, config) in updated.environments.iter_mut() {
            if current.environments.get(env_key) != Some(config) {
                config.version += 1;
                config.last_modified = now;
            }
        }
        updated.version += 1;
        record.flags.insert(flag_key.to_string(), updated.clone());
        Ok(updated)
    }

    pub fn delete_flag(&mut self, project_key: &str, flag_key: &str) -> Result<(), ApiFailure> {
        self.project_mut(project_key)?
            .flags
            .remove(flag_key)
            .map(|_| ())
            .ok_or_else(|| ApiFailure::not_found("flag", flag_key))
    }

    // --- segments ---

    fn check_environment(record: &ProjectRecord, env_key: &str) -> Result<(), ApiFailure> {
        if record.environments.contains_key(env_key) {
            Ok(())
        } else {
            Err(ApiFailure::not_found("environment", env_key))
        }
    }

    pub fn list_segments(
        &self,
        project_key: &str,
        env_key: &str,
        params: &ListParams,
    ) -> Result<(Vec<Segment>, usize), ApiFailure> {
        let record = self.project(project_key)?;
        Self::check_environment(record, env_key)?;
        let matching: Vec<Segment> = record
            .segments
            .get(env_key)
            .map(|segments| {
                segments
                    .values()
                    .filter(|s| params.matches(&s.key, &s.name))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        let total = matching.len();
        Ok((params.page(matching), total))
    }

    pub fn get_segment(&self, project_key: &str, env_key: &str, segment_key: &str) -> Result<Segment, ApiFailure> {
        let record = self.project(project_key)?;
        Self::check_environment(record, env_key)?;
        record
            .segments
            .get(env_key)
            .and_then(|segments| segments.get(segment_key))
            .cloned()
            .ok_or_else(|| ApiFailure::not_found("segment", segment_key))
    }

    pub fn create_segment(
        &mut self,
        project_key: &str,
        env_key: &str,
        input: SegmentInput,
    ) -> Result<Segment, ApiFailure> {
        let record = self.project_mut(project_key)?;
        Self::check_environment(record, env_key)?;
        validate_key("segment", &input.key)?;
        validate_name("segment", &input.name)?;
        let segments = record.segments.entry(env_key.to_string()).or_default();
        if segments.contains_key(&input.key) {
            return Err(ApiFailure::conflict(format!("segment {} already exists", input.key)));
        }
        let now = now_millis();
        let segment = Segment {
            links: self_link(format!("{API_ROOT}/segments/{project_key}/{env_key}/{}", input.key)),
            key: input.key,
            name: input.name,
            description: input.description,
            tags: input.tags,
            creation_date: now,
            last_modified_date: now,
            included: Vec::new(),
            excluded: Vec::new(),
            rules: Vec::new(),
            unbounded: input.unbounded,
            version: 1,
            deleted: false,
        };
        segments.insert(segment.key.clone(), segment.clone());
        Ok(segment)
    }

    pub fn patch_segment(
        &mut self,
        project_key: &str,
        env_key: &str,
        segment_key: &str,
        ops: &[PatchOperation],
    ) -> Result<Segment, ApiFailure> {
        let record = self.project_mut(project_key)?;
        Self::check_environment(record, env_key)?;
        let segment = record
            .segments
            .get_mut(env_key)
            .and_then(|segments| segments.get_mut(segment_key))
            .ok_or_else(|| ApiFailure::not_found("segment", segment_key))?;
        let mut updated: Segment = patched(&*segment, ops)?;
        if updated.key != segment.key || updated.version != segment.version {
            return Err(ApiFailure::invalid_request("key and version are read-only"));
        }
        updated.version += 1;
        updated.last_modified_date = now_millis();
        *segment = updated.clone();
        Ok(updated)
    }

    pub fn delete_segment(&mut self, project_key: &str, env_key: &str, segment_key: &str) -> Result<(), ApiFailure> {
        let record = self.project_mut(project_key)?;
        Self::check_environment(record, env_key)?;
        record
            .segments
            .get_mut(env_key)
            .and_then(|segments| segments.remove(segment_key))
            .map(|_| ())
            .ok_or_else(|| ApiFailure::not_found("segment", segment_key))
    }
}

/// Apply a JSON Patch to a copy of `current` and decode the result.
fn patched<T>(current: &T, ops: &[PatchOperation]) -> Result<T, ApiFailure>
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    if ops.is_empty() {
        return Err(ApiFailure::invalid_request("patch must contain at least one operation"));
    }
    let mut doc = serde_json::to_value(current).map_err(|e| ApiFailure::invalid_request(e.to_string()))?;
    patch::apply(&mut doc, ops).map_err(ApiFailure::invalid_request)?;
    serde_json::from_value(doc).map_err(|e| ApiFailure::invalid_request(format!("patched document is invalid: {e}")))
}

/// Narrow per-environment configs: explicit `envs` win, `summary` drops all.
fn render_flag(flag: &Flag, envs: &[String], summary: bool) -> Flag {
    let mut flag = flag.clone();
    if !envs.is_empty() {
        flag.environments.retain(|key, _| envs.contains(key));
    } else if summary {
        flag.environments.clear();
    }
    flag
}
