use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::models::{PatchWithComment, SegmentBody, UserSegment, UserSegments};
use crate::operation::{json_body, Operation, Query};

#[derive(Debug, Clone)]
pub struct ListSegments {
    project_key: String,
    environment_key: String,
    limit: Option<u32>,
    offset: Option<u32>,
    filter: Option<String>,
}

impl ListSegments {
    pub fn new(project_key: impl Into<String>, environment_key: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
            environment_key: environment_key.into(),
            limit: None,
            offset: None,
            filter: None,
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

impl Operation for ListSegments {
    type Output = UserSegments;

    fn method(&self) -> HttpMethod {
        HttpMethod::Get
    }

    fn path(&self) -> Vec<String> {
        segment_path(&self.project_key, &self.environment_key, None)
    }

    fn query(&self) -> Query {
        let mut query = Query::default();
        query
            .push_opt("limit", self.limit)
            .push_opt("offset", self.offset)
            .push_opt("filter", self.filter.as_deref());
        query
    }
}

#[derive(Debug, Clone)]
pub struct GetSegment {
    project_key: String,
    environment_key: String,
    segment_key: String,
}

impl GetSegment {
    pub fn new(
        project_key: impl Into<String>,
        environment_key: impl Into<String>,
        segment_key: impl Into<String>,
    ) -> Self {
        Self {
            project_key: project_key.into(),
            environment_key: environment_key.into(),
            segment_key: segment_key.into(),
        }
    }
}

impl Operation for GetSegment {
    type Output = UserSegment;

    fn method(&self) -> HttpMethod {
        HttpMethod::Get
    }

    fn path(&self) -> Vec<String> {
        segment_path(&self.project_key, &self.environment_key, Some(&self.segment_key))
    }
}

#[derive(Debug, Clone)]
pub struct CreateSegment {
    project_key: String,
    environment_key: String,
    body: SegmentBody,
}

impl CreateSegment {
    pub fn new(project_key: impl Into<String>, environment_key: impl Into<String>, body: SegmentBody) -> Self {
        Self {
            project_key: project_key.into(),
            environment_key: environment_key.into(),
            body,
        }
    }
}

impl Operation for CreateSegment {
    type Output = UserSegment;

    fn method(&self) -> HttpMethod {
        HttpMethod::Post
    }

    fn path(&self) -> Vec<String> {
        segment_path(&self.project_key, &self.environment_key, None)
    }

    fn body(&self) -> Result<Option<String>, ApiError> {
        json_body(&self.body)
    }
}

#[derive(Debug, Clone)]
pub struct PatchSegment {
    project_key: String,
    environment_key: String,
    segment_key: String,
    patch: PatchWithComment,
}

impl PatchSegment {
    pub fn new(
        project_key: impl Into<String>,
        environment_key: impl Into<String>,
        segment_key: impl Into<String>,
        patch: PatchWithComment,
    ) -> Self {
        Self {
            project_key: project_key.into(),
            environment_key: environment_key.into(),
            segment_key: segment_key.into(),
            patch,
        }
    }
}

impl Operation for PatchSegment {
    type Output = UserSegment;

    fn method(&self) -> HttpMethod {
        HttpMethod::Patch
    }

    fn path(&self) -> Vec<String> {
        segment_path(&self.project_key, &self.environment_key, Some(&self.segment_key))
    }

    fn body(&self) -> Result<Option<String>, ApiError> {
        json_body(&self.patch)
    }
}

#[derive(Debug, Clone)]
pub struct DeleteSegment {
    project_key: String,
    environment_key: String,
    segment_key: String,
}

impl DeleteSegment {
    pub fn new(
        project_key: impl Into<String>,
        environment_key: impl Into<String>,
        segment_key: impl Into<String>,
    ) -> Self {
        Self {
            project_key: project_key.into(),
            environment_key: environment_key.into(),
            segment_key: segment_key.into(),
        }
    }
}

impl Operation for DeleteSegment {
    type Output = ();

    fn method(&self) -> HttpMethod {
        HttpMethod::Delete
    }

    fn expects_body(&self) -> bool {
        false
    }

    fn path(&self) -> Vec<String> {
        segment_path(&self.project_key, &self.environment_key, Some(&self.segment_key))
    }
}

fn segment_path(project_key: &str, environment_key: &str, segment_key: Option<&str>) -> Vec<String> {
    let mut path = vec![
        "segments".to_string(),
        project_key.to_string(),
        environment_key.to_string(),
    ];
    path.extend(segment_key.map(str::to_string));
    path
}
