pub mod jobs;
pub mod lifetime;
