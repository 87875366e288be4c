use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes a prepared request. Implemented by [`super::BasicClient`] for real
/// traffic and by in-process fakes in tests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
