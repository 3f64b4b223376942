use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::models::{Project, ProjectPost, Projects};
use crate::operation::{json_body, Operation, Query};

#[derive(Debug, Clone, Default)]
pub struct ListProjects {
    limit: Option<u32>,
    offset: Option<u32>,
    filter: Option<String>,
    sort: Option<String>,
}

impl ListProjects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Server-side filter expression, e.g. `query:checkout`.
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Field to sort on; prefix with `-` for descending.
    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }
}

impl Operation for ListProjects {
    type Output = Projects;

    fn method(&self) -> HttpMethod {
        HttpMethod::Get
    }

    fn path(&self) -> Vec<String> {
        vec!["projects".to_string()]
    }

    fn query(&self) -> Query {
        let mut query = Query::default();
        query
            .push_opt("limit", self.limit)
            .push_opt("offset", self.offset)
            .push_opt("filter", self.filter.as_deref())
            .push_opt("sort", self.sort.as_deref());
        query
    }
}

#[derive(Debug, Clone)]
pub struct GetProject {
    project_key: String,
}

impl GetProject {
    pub fn new(project_key: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
        }
    }
}

impl Operation for GetProject {
    type Output = Project;

    fn method(&self) -> HttpMethod {
        HttpMethod::Get
    }

    fn path(&self) -> Vec<String> {
        vec!["projects".to_string(), self.project_key.clone()]
    }
}

#[derive(Debug, Clone)]
pub struct CreateProject {
    body: ProjectPost,
}

impl CreateProject {
    pub fn new(body: ProjectPost) -> Self {
        Self { body }
    }
}

impl Operation for CreateProject {
    type Output = Project;

    fn method(&self) -> HttpMethod {
        HttpMethod::Post
    }

    fn path(&self) -> Vec<String> {
        vec!["projects".to_string()]
    }

    fn body(&self) -> Result<Option<String>, ApiError> {
        json_body(&self.body)
    }
}

#[derive(Debug, Clone)]
pub struct DeleteProject {
    project_key: String,
}

impl DeleteProject {
    pub fn new(project_key: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
        }
    }
}

impl Operation for DeleteProject {
    type Output = ();

    fn method(&self) -> HttpMethod {
        HttpMethod::Delete
    }

    fn expects_body(&self) -> bool {
        false
    }

    fn path(&self) -> Vec<String> {
        vec!["projects".to_string(), self.project_key.clone()]
    }
}
