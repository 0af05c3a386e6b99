use super::{ConstituencySource, FetchError, FetchResult};
use crate::config::FetchConfig;
use crate::formats::democracy_club::{Ballot, Election};
use crate::model::election::ConstituencyResult;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

/// HTTP client for the Democracy Club candidates API.
pub struct CandidatesClient {
    client: reqwest::Client,
    base_url: String,
}

impl CandidatesClient {
    pub fn new(config: &FetchConfig) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("seat-share/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|source| FetchError::Http {
                url: config.base_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> FetchResult<T> {
        let url = self.url(path);
        debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| FetchError::Http {
            url: url.clone(),
            source,
        })?;

        serde_json::from_slice(&body).map_err(|e| FetchError::Schema {
            url,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl ConstituencySource for CandidatesClient {
    async fn ballot_ids(&self, election: &str) -> FetchResult<Vec<String>> {
        let election: Election = self.get_json(&format!("elections/{}/", election)).await?;
        Ok(election
            .ballots
            .into_iter()
            .map(|ballot| ballot.ballot_paper_id)
            .collect())
    }

    async fn constituency(&self, ballot_paper_id: &str) -> FetchResult<ConstituencyResult> {
        let ballot: Ballot = self
            .get_json(&format!("ballots/{}/", ballot_paper_id))
            .await?;
        Ok(ballot.into_result(ballot_paper_id)?)
    }
}
