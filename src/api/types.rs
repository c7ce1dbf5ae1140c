//! Wire types for the Flux Nova backend
//!
//! Every response body is wrapped in a `{ "data": ... }` envelope. Field
//! names follow the backend's camelCase/Mongo conventions (`_id`,
//! `profilePicture`) and are renamed to Rust naming here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Success envelope shared by every endpoint
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    /// Payload; absent on some endpoints
    pub data: Option<T>,
}

/// Error body returned alongside non-success statuses
#[derive(Debug, Deserialize, Default)]
pub struct ErrorBody {
    /// Human readable reason
    #[serde(default)]
    pub message: Option<String>,
    /// Some endpoints put the reason in `data` instead
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Best available description of the failure
    pub fn describe(&self) -> Option<String> {
        if let Some(message) = &self.message {
            return Some(message.clone());
        }
        match &self.data {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            _ => None,
        }
    }
}

/// Pending snap as listed by `GET /snap`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SnapRecord {
    /// Snap identifier
    #[serde(rename = "_id")]
    pub id: String,
    /// Sender user id
    pub from: String,
    /// Creation timestamp as sent by the backend (ISO 8601)
    #[serde(default)]
    pub date: Option<String>,
}

impl SnapRecord {
    /// Parsed creation timestamp; `None` if missing or unparseable
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
            .map(|d| d.with_timezone(&Utc))
    }
}

/// Public user record from `GET /user` and `GET /user/friends`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// User identifier
    #[serde(rename = "_id")]
    pub id: String,
    /// Public username
    pub username: String,
    /// Avatar as a URL or data URI; empty when unset
    #[serde(rename = "profilePicture", default)]
    pub profile_picture: Option<String>,
}

impl UserRecord {
    /// Avatar reference, treating the empty string as unset
    pub fn avatar(&self) -> Option<&str> {
        self.profile_picture.as_deref().filter(|p| !p.is_empty())
    }
}

/// Body of `GET /snap/{id}`
///
/// Both fields are optional on the wire; a snap is only viewable when both
/// are present, see [`SnapContent::into_payload`].
#[derive(Debug, Clone, Deserialize)]
pub struct SnapContent {
    /// Data URI of the image
    #[serde(default)]
    pub image: Option<String>,
    /// Display duration in seconds; any JSON number, `5` and `5.0` alike
    #[serde(default)]
    pub duration: Option<serde_json::Number>,
}

/// A viewable snap: image data URI plus a positive duration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapPayload {
    /// Data URI of the image
    pub image: String,
    /// Display duration in seconds, always > 0
    pub duration_secs: u32,
}

impl SnapContent {
    /// Validate the raw body into a [`SnapPayload`]
    ///
    /// Returns `None` when the image is missing or empty, or when the
    /// duration is missing, non-positive or out of range.
    pub fn into_payload(self) -> Option<SnapPayload> {
        let image = self.image.filter(|i| !i.is_empty())?;
        let duration_secs = whole_seconds(self.duration.as_ref()?)?;
        Some(SnapPayload {
            image,
            duration_secs,
        })
    }
}

/// Positive whole number of seconds that fits in a `u32`
fn whole_seconds(value: &serde_json::Number) -> Option<u32> {
    let secs = match value.as_u64() {
        Some(secs) => secs,
        None => {
            let secs = value.as_f64()?;
            if secs.fract() != 0.0 || secs < 0.0 || secs > f64::from(u32::MAX) {
                return None;
            }
            secs as u64
        }
    };
    u32::try_from(secs).ok().filter(|secs| *secs > 0)
}

/// Body of `POST /snap`
#[derive(Debug, Clone, Serialize)]
pub struct NewSnap {
    /// Recipient user id
    pub to: String,
    /// Image data URI
    pub image: String,
    /// Send timestamp
    pub date: DateTime<Utc>,
    /// Display duration in seconds
    pub duration: u32,
}

/// Body of `PUT /user` (login)
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

/// Body of `POST /user` (registration)
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    /// Account email
    pub email: String,
    /// Public username
    pub username: String,
    /// Account password
    pub password: String,
    /// Always sent empty; set later with a profile update
    #[serde(rename = "profilePicture")]
    pub profile_picture: String,
}

/// Response of a successful login
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// User identifier
    #[serde(rename = "_id")]
    pub id: String,
    /// Account email
    #[serde(default)]
    pub email: String,
    /// Public username
    #[serde(default)]
    pub username: String,
    /// Avatar data URI, may be empty
    #[serde(rename = "profilePicture", default)]
    pub profile_picture: Option<String>,
    /// Bearer token for subsequent requests
    #[serde(default)]
    pub token: Option<String>,
}

/// Response of a registration; the backend may or may not log the user in
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterResponse {
    /// Bearer token if the backend issued one
    #[serde(default)]
    pub token: Option<String>,
}

/// Body of `PATCH /user`; only set fields are sent
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    /// New username
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// New avatar data URI
    #[serde(rename = "profilePicture", skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

/// Body of `POST`/`DELETE /user/friends`
#[derive(Debug, Clone, Serialize)]
pub struct FriendRef {
    /// Friend user id
    #[serde(rename = "friendId")]
    pub friend_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_record_parses_backend_shape() {
        let json = r#"{"_id":"s1","from":"u1","date":"2024-05-01T10:00:00.000Z","extra":1}"#;
        let snap: SnapRecord = serde_json::from_str(json).unwrap();
        assert_eq!(snap.id, "s1");
        assert_eq!(snap.from, "u1");
        assert_eq!(
            snap.created_at().unwrap().to_rfc3339(),
            "2024-05-01T10:00:00+00:00"
        );
    }

    #[test]
    fn test_snap_record_bad_date_is_none() {
        let snap = SnapRecord {
            id: "s1".to_string(),
            from: "u1".to_string(),
            date: Some("yesterday".to_string()),
        };
        assert!(snap.created_at().is_none());
    }

    #[test]
    fn test_user_record_empty_picture_is_no_avatar() {
        let json = r#"{"_id":"u1","username":"alice","profilePicture":""}"#;
        let user: UserRecord = serde_json::from_str(json).unwrap();
        assert_eq!(user.avatar(), None);
    }

    #[test]
    fn test_snap_content_requires_image_and_duration() {
        let ok = SnapContent {
            image: Some("data:image/png;base64,AAAA".to_string()),
            duration: Some(5u32.into()),
        };
        assert_eq!(ok.into_payload().unwrap().duration_secs, 5);

        let no_image = SnapContent {
            image: None,
            duration: Some(5u32.into()),
        };
        assert!(no_image.into_payload().is_none());

        let empty_image = SnapContent {
            image: Some(String::new()),
            duration: Some(5u32.into()),
        };
        assert!(empty_image.into_payload().is_none());

        let zero = SnapContent {
            image: Some("data:,x".to_string()),
            duration: Some(0u32.into()),
        };
        assert!(zero.into_payload().is_none());

        let negative = SnapContent {
            image: Some("data:,x".to_string()),
            duration: Some((-3i64).into()),
        };
        assert!(negative.into_payload().is_none());
    }

    #[test]
    fn test_snap_content_accepts_whole_float_duration() {
        let parse = |body: &str| {
            serde_json::from_str::<SnapContent>(body)
                .unwrap()
                .into_payload()
                .map(|p| p.duration_secs)
        };
        assert_eq!(parse(r#"{"image":"data:,x","duration":5}"#), Some(5));
        assert_eq!(parse(r#"{"image":"data:,x","duration":5.0}"#), Some(5));
        assert_eq!(parse(r#"{"image":"data:,x","duration":5.5}"#), None);
        assert_eq!(parse(r#"{"image":"data:,x","duration":0.0}"#), None);
        assert_eq!(parse(r#"{"image":"data:,x","duration":-2.0}"#), None);
        assert_eq!(parse(r#"{"image":"data:,x","duration":1e12}"#), None);
    }

    #[test]
    fn test_profile_update_skips_unset_fields() {
        let update = ProfileUpdate {
            username: Some("bob".to_string()),
            profile_picture: None,
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "username": "bob" }));
    }

    #[test]
    fn test_friend_ref_uses_camel_case() {
        let body = FriendRef {
            friend_id: "u9".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "friendId": "u9" })
        );
    }

    #[test]
    fn test_error_body_describe() {
        let body: ErrorBody = serde_json::from_str(r#"{"message":"bad token"}"#).unwrap();
        assert_eq!(body.describe().as_deref(), Some("bad token"));

        let body: ErrorBody = serde_json::from_str(r#"{"data":"no such user"}"#).unwrap();
        assert_eq!(body.describe().as_deref(), Some("no such user"));

        let body: ErrorBody = serde_json::from_str(r#"{}"#).unwrap();
        assert!(body.describe().is_none());
    }
}
