//! Domain types: resource identity, registration records, job descriptors

mod job;
mod resource;

pub use job::{JobDescriptor, generate_job_id};
pub use resource::{RegistrationRecord, ResourceDescriptor, ResourceId, now_us};
