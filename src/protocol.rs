//! Wire types for the publishing API.
//!
//! Every response body is a JSON envelope `{code, data, error_msg}`; the
//! payload types here are what `data` carries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Response envelope wrapping every API payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// HTTP status code, repeated in the body.
    pub code: u16,
    /// Human-readable error, present on non-2xx responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
    /// Payload, present on 2xx responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// The error message, or an empty string.
    pub fn message(&self) -> &str {
        self.error_msg.as_deref().unwrap_or_default()
    }
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A post as returned by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    /// Edit token; only returned for anonymous posts.
    #[serde(default, deserialize_with = "null_as_default")]
    pub token: String,
    #[serde(default, rename = "appearance", deserialize_with = "null_as_default")]
    pub font: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub rtl: Option<bool>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, rename = "body", deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default)]
    pub views: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<Collection>,
}

/// Fields sent when creating or updating a post.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostParams {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(rename = "body", skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub font: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtl: Option<bool>,
    #[serde(rename = "lang", skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Destination blog; selects the endpoint rather than going in the body.
    #[serde(skip)]
    pub collection: Option<String>,
}

/// A blog belonging to the authenticated user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Collection {
    pub alias: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub views: i64,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub url: String,
    #[serde(default)]
    pub total_posts: i64,
}

/// Credentials sent to the login endpoint.
#[derive(Debug, Serialize)]
pub struct LoginParams<'a> {
    pub alias: &'a str,
    pub pass: &'a str,
}

/// A just-authenticated user, cached locally as `user.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access_token: String,
    pub user: Option<User>,
}

impl AuthUser {
    /// Username of the authenticated account, or an empty string.
    pub fn username(&self) -> &str {
        self.user.as_ref().map(|u| u.username.as_str()).unwrap_or_default()
    }
}

/// A registered user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub subscription: Option<UserSubscription>,
}

/// Paid subscription details, if any.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSubscription {
    pub name: String,
    pub begin: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub auto_renew: bool,
    #[serde(default, rename = "is_active")]
    pub active: bool,
    #[serde(default, rename = "is_delinquent")]
    pub delinquent: bool,
}

/// A post ID with the token proving ownership, as sent to the claim endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct OwnedPostParams {
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token: String,
}

/// Per-post outcome of a claim request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaimPostResult {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub code: u16,
    #[serde(default, deserialize_with = "null_as_default")]
    pub error_msg: String,
    #[serde(default)]
    pub post: Option<Post>,
}

impl ClaimPostResult {
    /// ID of the claimed post, preferring the echoed post over the bare ID.
    pub fn post_id(&self) -> &str {
        match &self.post {
            Some(p) if !p.id.is_empty() => &p.id,
            _ => &self.id,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_msg.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_envelope_deserialization() {
        let json = r#"{
            "code": 201,
            "data": {
                "id": "rf3t35fkax0aw",
                "slug": null,
                "token": "ozPEuJWYK8L1QsysBUcTUKy9za7yqQ4M",
                "appearance": "mono",
                "language": "en",
                "rtl": false,
                "created": "2016-07-09T01:43:46Z",
                "updated": "2016-07-09T01:43:46Z",
                "title": "My First Post",
                "body": "This is a post.",
                "tags": [],
                "views": 0
            }
        }"#;
        let env: Envelope<Post> = serde_json::from_str(json).unwrap();
        assert_eq!(env.code, 201);
        let post = env.data.unwrap();
        assert_eq!(post.id, "rf3t35fkax0aw");
        assert_eq!(post.font, "mono");
        assert_eq!(post.content, "This is a post.");
        assert!(post.slug.is_empty());
        assert!(post.collection.is_none());
    }

    #[test]
    fn test_error_envelope() {
        let json = r#"{"code": 404, "error_msg": "Post not found."}"#;
        let env: Envelope<Post> = serde_json::from_str(json).unwrap();
        assert!(env.data.is_none());
        assert_eq!(env.message(), "Post not found.");
    }

    #[test]
    fn test_post_params_serialization() {
        let params = PostParams {
            content: "hello".to_string(),
            font: "sans".to_string(),
            language: Some("en".to_string()),
            collection: Some("blog".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["body"], "hello");
        assert_eq!(json["font"], "sans");
        assert_eq!(json["lang"], "en");
        assert!(json.get("collection").is_none());
        assert!(json.get("title").is_none());
        assert!(json.get("token").is_none());
    }

    #[test]
    fn test_auth_user_round_trip() {
        let json = r#"{
            "access_token": "00000000-0000-0000-0000-000000000000",
            "user": {"username": "matt", "email": "matt@example.com", "created": "2015-02-03T02:41:19Z"}
        }"#;
        let user: AuthUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.username(), "matt");
        let back = serde_json::to_string(&user).unwrap();
        let again: AuthUser = serde_json::from_str(&back).unwrap();
        assert_eq!(user, again);
    }

    #[test]
    fn test_claim_result_post_id() {
        let ok: ClaimPostResult = serde_json::from_str(
            r#"{"code": 200, "post": {"id": "abc"}}"#,
        )
        .unwrap();
        assert!(ok.is_success());
        assert_eq!(ok.post_id(), "abc");

        let failed: ClaimPostResult = serde_json::from_str(
            r#"{"id": "xyz", "code": 409, "error_msg": "Post already owned."}"#,
        )
        .unwrap();
        assert!(!failed.is_success());
        assert_eq!(failed.post_id(), "xyz");
    }
}
