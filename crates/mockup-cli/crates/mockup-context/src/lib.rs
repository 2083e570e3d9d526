pub mod config;
pub mod project;

pub use config::MockupConfig;
pub use project::MockupProject;
