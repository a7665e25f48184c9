//! Rating-service players listing.

use reqwest::Client;
use url::Url;

use super::{ClientError, parse_response};
use crate::objects::PlayersPage;

/// Typed HTTP client for `GET /api/v1/players`.
///
/// The listing is paginated; [`PlayersPage::next`] carries an absolute URL
/// that can be handed back to [`PlayersClient::follow`].
#[derive(Debug, Clone)]
pub struct PlayersClient {
    http: Client,
    base_url: Url,
}

impl PlayersClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// URL of a given listing page. Page 1 carries no query.
    pub fn page_url(&self, page: u32) -> Result<Url, ClientError> {
        let mut url = self.base_url.join("/api/v1/players")?;
        if page > 1 {
            url.query_pairs_mut().append_pair("page", &page.to_string());
        }
        Ok(url)
    }

    /// `GET /api/v1/players?page={page}`
    pub async fn list_players(&self, page: u32) -> Result<PlayersPage, ClientError> {
        let url = self.page_url(page)?;
        self.follow(url.as_str()).await
    }

    /// Fetch a page by the absolute URL found in `next` / `previous`.
    pub async fn follow(&self, url: &str) -> Result<PlayersPage, ClientError> {
        let url = Url::parse(url)?;
        let resp = self.http.get(url).send().await?;
        parse_response(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url() {
        let client = PlayersClient::new("https://online-go.com".parse().unwrap());
        assert_eq!(
            client.page_url(1).unwrap().as_str(),
            "https://online-go.com/api/v1/players"
        );
        assert_eq!(
            client.page_url(3).unwrap().as_str(),
            "https://online-go.com/api/v1/players?page=3"
        );
    }
}
