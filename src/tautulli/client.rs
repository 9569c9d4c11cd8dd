use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use super::{
    ActivitySnapshot, Envelope, GeoInfo, HistoryEntry, HistoryPage, TautulliApi, HISTORY_LENGTH,
    THUMB_HEIGHT,
};
use crate::config::Config;
use crate::error::FetchError;

const USER_AGENT: &str = concat!("tautulli-bar/", env!("CARGO_PKG_VERSION"));

/// Client for the Tautulli `/api/v2` endpoint.
///
/// One GET per call, no timeout and no retry: the host kills a plugin that
/// hangs for too long.
pub struct TautulliClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TautulliClient {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// `{base_url}/api/v2?apikey=...&cmd=...&<params>`
    pub fn command_url(&self, command: &str, params: &[(&str, &str)]) -> Result<Url, FetchError> {
        let mut url = Url::parse(&format!("{}/api/v2", self.base_url))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("apikey", &self.api_key)
                .append_pair("cmd", command);
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn fetch_bytes(
        &self,
        command: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<u8>, FetchError> {
        let url = self.command_url(command, params)?;

        // The URL carries the API key, keep it out of the logs
        tracing::debug!(command, ?params, "requesting Tautulli command");

        // `?` goes through `From<reqwest::Error>`, which strips the URL
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                command: command.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn fetch_data<T: DeserializeOwned>(
        &self,
        command: &str,
        params: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let body = self.fetch_bytes(command, params).await?;
        let envelope: Envelope<T> =
            serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
                command: command.to_string(),
                source,
            })?;
        Ok(envelope.response.data)
    }
}

impl TautulliApi for TautulliClient {
    async fn activity(&self) -> Result<ActivitySnapshot, FetchError> {
        self.fetch_data("get_activity", &[]).await
    }

    async fn history(&self) -> Result<Vec<HistoryEntry>, FetchError> {
        let length = HISTORY_LENGTH.to_string();
        let page: HistoryPage = self
            .fetch_data(
                "get_history",
                &[("length", length.as_str()), ("include_activity", "0")],
            )
            .await?;
        Ok(page.data)
    }

    async fn geoip_lookup(&self, ip_address: &str) -> Result<GeoInfo, FetchError> {
        self.fetch_data("get_geoip_lookup", &[("ip_address", ip_address)])
            .await
    }

    async fn image_proxy(&self, thumb: &str) -> Result<Vec<u8>, FetchError> {
        let height = THUMB_HEIGHT.to_string();
        self.fetch_bytes(
            "pms_image_proxy",
            &[("img", thumb), ("height", height.as_str())],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> TautulliClient {
        TautulliClient::new(&Config {
            base_url: base_url.to_string(),
            api_key: "s3cret".to_string(),
            plex_url: None,
        })
        .unwrap()
    }

    #[test]
    fn test_command_url() {
        let url = client("http://tautulli.local:8181")
            .command_url("get_history", &[("length", "5"), ("include_activity", "0")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            concat!(
                "http://tautulli.local:8181/api/v2",
                "?apikey=s3cret&cmd=get_history&length=5&include_activity=0"
            )
        );
    }

    #[test]
    fn test_command_url_encodes_params() {
        let url = client("http://tautulli.local:8181")
            .command_url("pms_image_proxy", &[("img", "/library/metadata/6/thumb?t=1")])
            .unwrap();
        assert!(url
            .as_str()
            .ends_with("cmd=pms_image_proxy&img=%2Flibrary%2Fmetadata%2F6%2Fthumb%3Ft%3D1"));
    }

    #[test]
    fn test_command_url_keeps_base_path() {
        let url = client("https://example.com/tautulli")
            .command_url("get_activity", &[])
            .unwrap();
        assert_eq!(url.path(), "/tautulli/api/v2");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = client("not a url").command_url("get_activity", &[]);
        assert!(matches!(result, Err(FetchError::Url(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error() {
        // Nothing listens on the discard port
        let result = client("http://127.0.0.1:9").activity().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_transport_error_hides_api_key() {
        let config = Config {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: "s3cretKEY".to_string(),
            plex_url: None,
        };
        let client = TautulliClient::new(&config).unwrap();

        let err = client.activity().await.unwrap_err();
        assert!(!format!("{:?}", anyhow::Error::from(err)).contains("s3cretKEY"));

        let lines = crate::report::run(&client, &config, &chrono::Utc).await;
        assert_eq!(lines[0].text, "Script error:");
        for line in &lines {
            assert!(!line.to_string().contains("s3cretKEY"), "leaked in {line}");
        }
    }
}
