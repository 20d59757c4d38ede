//! Response shapes of the remote API and their conversion to domain types
//!
//! Attachment payloads vary by kind and are often partial, so they are kept as
//! raw JSON until conversion. Conversion never fails: anything unusable in a
//! photo is dropped here and shows up later as a skipped photo.

use crate::types::{Attachment, Channel, Photo, PhotoSize, Post, PostId};
use serde::Deserialize;
use serde_json::Value;

/// Error body of a failed method call
#[derive(Debug, Deserialize)]
pub(super) struct ApiErrorBody {
    pub error_code: i64,
    #[serde(default)]
    pub error_msg: String,
}

/// `groups.getById` response; older API versions return a bare list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum GroupsResponse {
    Wrapped { groups: Vec<WireGroup> },
    List(Vec<WireGroup>),
}

impl GroupsResponse {
    pub fn into_first(self) -> Option<WireGroup> {
        match self {
            GroupsResponse::Wrapped { groups } | GroupsResponse::List(groups) => {
                groups.into_iter().next()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct WireGroup {
    pub id: i64,
    pub name: String,
}

impl WireGroup {
    pub fn into_channel(self, identifier: &str) -> Channel {
        Channel {
            identifier: identifier.to_string(),
            // Some responses already carry the signed owner form
            id: self.id.abs(),
            name: self.name,
        }
    }
}

/// `wall.get` response
#[derive(Debug, Deserialize)]
pub(super) struct WallResponse {
    #[serde(default)]
    pub items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct WirePost {
    id: i64,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    attachments: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct WireSize {
    #[serde(default, alias = "src")]
    url: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

/// Convert one wall item; `None` if it does not even carry a post ID
pub(super) fn post_from_value(item: Value) -> Option<Post> {
    let wire: WirePost = match serde_json::from_value(item) {
        Ok(wire) => wire,
        Err(e) => {
            tracing::warn!(error = %e, "Skipping malformed wall item");
            return None;
        }
    };

    Some(Post {
        id: PostId(wire.id),
        text: wire.text.unwrap_or_default(),
        attachments: wire.attachments.iter().map(attachment_from_value).collect(),
    })
}

pub(super) fn attachment_from_value(value: &Value) -> Attachment {
    match value.get("type").and_then(Value::as_str) {
        Some("photo") => Attachment::Photo(photo_from_value(value.get("photo"))),
        Some(kind) => Attachment::Other {
            kind_name: kind.to_string(),
        },
        None => Attachment::Other {
            kind_name: "unknown".to_string(),
        },
    }
}

fn photo_from_value(value: Option<&Value>) -> Photo {
    let sizes = value
        .and_then(|photo| photo.get("sizes"))
        .and_then(Value::as_array)
        .map(|sizes| {
            sizes
                .iter()
                .filter_map(|size| serde_json::from_value::<WireSize>(size.clone()).ok())
                .filter_map(|size| {
                    size.url.map(|url| PhotoSize {
                        url,
                        width: size.width,
                        height: size.height,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Photo { sizes }
}
