//! Wire-format fixtures for the remote API

use serde_json::{Value, json};

/// `groups.getById` payload for one community
pub fn group_response(id: i64, name: &str) -> Value {
    json!({
        "response": {
            "groups": [{"id": id, "name": name, "screen_name": name, "is_closed": 0}],
            "profiles": []
        }
    })
}

/// API error envelope
pub fn api_error(code: i64, message: &str) -> Value {
    json!({"error": {"error_code": code, "error_msg": message, "request_params": []}})
}

/// `wall.get` payload wrapping the given items
pub fn wall_response(items: Vec<Value>) -> Value {
    json!({"response": {"count": items.len(), "items": items}})
}

/// Wall item with text and attachments
pub fn wall_post(id: i64, text: &str, attachments: Vec<Value>) -> Value {
    json!({
        "id": id,
        "owner_id": -1,
        "from_id": -1,
        "date": 1_700_000_000,
        "post_type": "post",
        "text": text,
        "attachments": attachments
    })
}

/// Photo attachment with a single size variant
pub fn photo_attachment(url: &str) -> Value {
    photo_with_sizes(vec![size(url, 807, 538, "x")])
}

/// Photo attachment with explicit size variants
pub fn photo_with_sizes(sizes: Vec<Value>) -> Value {
    json!({
        "type": "photo",
        "photo": {"id": 1, "owner_id": -1, "sizes": sizes}
    })
}

/// One size variant
pub fn size(url: &str, width: u32, height: u32, kind: &str) -> Value {
    json!({"type": kind, "url": url, "width": width, "height": height})
}

/// Non-photo attachment
pub fn link_attachment(url: &str) -> Value {
    json!({"type": "link", "link": {"url": url, "title": "link"}})
}
