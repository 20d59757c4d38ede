//! Mock remote API and photo host backed by wiremock

use serde_json::Value;
use std::path::Path;
use wall_ingest::{ApiConfig, Config, StorageConfig};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock VK method API; also serves photo bytes under `/photos/`
pub struct MockVk {
    pub server: MockServer,
}

impl MockVk {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL to put in `ApiConfig::base_url`
    pub fn base_url(&self) -> String {
        format!("{}/method/", self.server.uri())
    }

    /// Absolute URL of a photo served by this mock
    pub fn photo_url(&self, name: &str) -> String {
        format!("{}/photos/{}", self.server.uri(), name)
    }

    /// Serve a channel: its resolution and its wall
    pub async fn mount_channel(&self, identifier: &str, id: i64, name: &str, items: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path("/method/groups.getById"))
            .and(query_param("group_ids", identifier))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(super::group_response(id, name)),
            )
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path("/method/wall.get"))
            .and(query_param("owner_id", (-id).to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(super::wall_response(items)))
            .mount(&self.server)
            .await;
    }

    /// Resolving this identifier answers with an API error
    pub async fn mount_channel_error(&self, identifier: &str, code: i64, message: &str) {
        Mock::given(method("GET"))
            .and(path("/method/groups.getById"))
            .and(query_param("group_ids", identifier))
            .respond_with(ResponseTemplate::new(200).set_body_json(super::api_error(code, message)))
            .mount(&self.server)
            .await;
    }

    /// Serve photo bytes at `/photos/<name>`
    pub async fn mount_photo(&self, name: &str, bytes: &[u8]) {
        Mock::given(method("GET"))
            .and(path(format!("/photos/{}", name)))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg")
                    .set_body_bytes(bytes.to_vec()),
            )
            .mount(&self.server)
            .await;
    }
}

/// Config pointing at the mock, with media under `<root>/data` and the ledger
/// under `<root>/ledger`
pub fn test_config(root: &Path, base_url: String, channels: &[&str]) -> Config {
    let mut api = ApiConfig::with_token("test-token");
    api.base_url = base_url;

    Config {
        channels: channels.iter().map(|c| c.to_string()).collect(),
        api,
        storage: StorageConfig {
            data_dir: root.join("data"),
            ledger_path: root.join("ledger").join("info.db"),
        },
    }
}
