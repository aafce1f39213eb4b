//! Publishing API client.
//!
//! Commands talk to the service through the [`PostsApi`] trait so they can be
//! run against a fake in tests; [`WriteasClient`] is the HTTP implementation.

pub mod client;
pub mod error;

pub use client::{ClientConfig, WriteasClient};
pub use error::ApiError;

use crate::protocol::{AuthUser, ClaimPostResult, Collection, OwnedPostParams, Post, PostParams};
use async_trait::async_trait;

/// Default API endpoint.
pub const WRITEAS_API_URL: &str = "https://write.as/api";

/// API endpoint of the onion service, reached through the Tor SOCKS proxy.
pub const TOR_API_URL: &str = "http://writeas7pm7rcdqg.onion/api";

/// Default port of the local Tor SOCKS proxy (Tor Browser).
pub const DEFAULT_TOR_PORT: u16 = 9150;

/// Operations the CLI needs from the publishing service.
#[async_trait]
pub trait PostsApi: Send + Sync {
    /// Whether requests carry a user access token.
    fn is_authenticated(&self) -> bool;

    /// Create a post, anonymously or in the user's account or blog.
    async fn create_post(&self, params: &PostParams) -> Result<Post, ApiError>;

    /// Fetch a single post by ID.
    async fn get_post(&self, id: &str) -> Result<Post, ApiError>;

    /// Overwrite a post, authorised by its edit token or by ownership.
    async fn update_post(&self, id: &str, token: &str, params: &PostParams) -> Result<Post, ApiError>;

    /// Delete a post, authorised by its edit token or by ownership.
    async fn delete_post(&self, id: &str, token: &str) -> Result<(), ApiError>;

    /// Exchange credentials for an access token.
    async fn log_in(&self, username: &str, password: &str) -> Result<AuthUser, ApiError>;

    /// Invalidate the current access token.
    async fn log_out(&self) -> Result<(), ApiError>;

    /// All posts owned by the authenticated user.
    async fn get_user_posts(&self) -> Result<Vec<Post>, ApiError>;

    /// All blogs owned by the authenticated user.
    async fn get_user_collections(&self) -> Result<Vec<Collection>, ApiError>;

    /// Move anonymous posts into the authenticated user's account.
    async fn claim_posts(&self, posts: &[OwnedPostParams]) -> Result<Vec<ClaimPostResult>, ApiError>;
}
