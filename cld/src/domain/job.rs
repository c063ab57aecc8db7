//! Job descriptors and id generation
//!
//! Job ids use the format: `{6-char-hex}-job-{slug}`
//! Example: `019430-job-nightly-rebuild`

use serde::{Deserialize, Serialize};

/// Job submitted through the coordinator's submission boundary
///
/// Placement is handled by an external scheduler; the coordinator only
/// accepts the descriptor and assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    /// Human-readable job name, slugified into the id
    pub name: String,

    /// Opaque job body, passed through to the scheduler
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl JobDescriptor {
    pub fn new(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// Generate an opaque job id from the job name
pub fn generate_job_id(name: &str) -> String {
    let uuid = uuid::Uuid::now_v7();
    let hex_prefix = &uuid.to_string()[..6];
    format!("{}-job-{}", hex_prefix, slugify(name))
}

/// Slugify a job name for use in ids
fn slugify(name: &str) -> String {
    let slug = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() { "unnamed".to_string() } else { slug }
}
