pub mod charset;
pub mod client;
pub mod errors;
pub mod render;
pub mod retry;
pub mod types;

pub use client::HttpFetcher;
pub use errors::FetchError;
pub use render::{RemoteRenderer, RenderError, RenderFetcher};
pub use retry::{RetrySchedule, fetch_with_retry};
pub use types::{Charset, PageResponse};
