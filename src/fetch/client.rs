use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Method, Request, Response, Url};

/// Transport seam for outgoing requests. Auth decorators such as
/// [`ApiKey`](super::auth::ApiKey) wrap another implementation.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;

    /// Sends a GET for `url` asking for a JSON body.
    async fn get_json(&self, url: Url) -> reqwest::Result<Response> {
        let mut req = Request::new(Method::GET, url);
        req.headers_mut()
            .insert(ACCEPT, HeaderValue::from_static("application/json"));
        self.execute(req).await
    }
}
