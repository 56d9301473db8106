// SPDX-License-Identifier: MIT

//! Boundary surface for clients: serde DTOs plus the [`ProjectsApi`] facade
//! that the save coordinator and session controller talk to.

pub mod service;
pub mod types;

pub use service::ProjectsApi;
pub use types::{
    ContentDto, CreateProjectResponse, ProjectContentDto, ProjectSummaryDto, SaveProjectRequest,
    SaveProjectResponse,
};
