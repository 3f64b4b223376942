//! Request builders for the supported REST operations.
//!
//! Each struct takes its required path and body parameters in `new` and its
//! optional query parameters through fluent setters. Pass the finished value
//! to `ApiClient::build` and the response to `ApiClient::parse`.

mod environments;
mod flags;
mod projects;
mod segments;

pub use environments::{CreateEnvironment, DeleteEnvironment, GetEnvironment};
pub use flags::{CreateFeatureFlag, DeleteFeatureFlag, GetFeatureFlag, ListFeatureFlags, PatchFeatureFlag};
pub use projects::{CreateProject, DeleteProject, GetProject, ListProjects};
pub use segments::{CreateSegment, DeleteSegment, GetSegment, ListSegments, PatchSegment};
