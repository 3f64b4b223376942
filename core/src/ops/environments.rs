use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::models::{Environment, EnvironmentPost};
use crate::operation::{json_body, Operation};

#[derive(Debug, Clone)]
pub struct GetEnvironment {
    project_key: String,
    environment_key: String,
}

impl GetEnvironment {
    pub fn new(project_key: impl Into<String>, environment_key: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
            environment_key: environment_key.into(),
        }
    }
}

impl Operation for GetEnvironment {
    type Output = Environment;

    fn method(&self) -> HttpMethod {
        HttpMethod::Get
    }

    fn path(&self) -> Vec<String> {
        environment_path(&self.project_key, Some(&self.environment_key))
    }
}

#[derive(Debug, Clone)]
pub struct CreateEnvironment {
    project_key: String,
    body: EnvironmentPost,
}

impl CreateEnvironment {
    pub fn new(project_key: impl Into<String>, body: EnvironmentPost) -> Self {
        Self {
            project_key: project_key.into(),
            body,
        }
    }
}

impl Operation for CreateEnvironment {
    type Output = Environment;

    fn method(&self) -> HttpMethod {
        HttpMethod::Post
    }

    fn path(&self) -> Vec<String> {
        environment_path(&self.project_key, None)
    }

    fn body(&self) -> Result<Option<String>, ApiError> {
        json_body(&self.body)
    }
}

#[derive(Debug, Clone)]
pub struct DeleteEnvironment {
    project_key: String,
    environment_key: String,
}

impl DeleteEnvironment {
    pub fn new(project_key: impl Into<String>, environment_key: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
            environment_key: environment_key.into(),
        }
    }
}

impl Operation for DeleteEnvironment {
    type Output = ();

    fn method(&self) -> HttpMethod {
        HttpMethod::Delete
    }

    fn expects_body(&self) -> bool {
        false
    }

    fn path(&self) -> Vec<String> {
        environment_path(&self.project_key, Some(&self.environment_key))
    }
}

fn environment_path(project_key: &str, environment_key: Option<&str>) -> Vec<String> {
    let mut path = vec![
        "projects".to_string(),
        project_key.to_string(),
        "environments".to_string(),
    ];
    path.extend(environment_key.map(str::to_string));
    path
}
