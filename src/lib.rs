pub mod config;
pub mod deadline;
pub mod entities;
pub mod extractor;
pub mod fetcher;
pub mod lookup;
pub mod pipeline;

pub use entities::{EmailSource, EmailStatus, Target};
pub use lookup::process_target;
pub use pipeline::{EmailPipeline, PipelineError};
