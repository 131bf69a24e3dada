use domain::{
    payloads::{FetchTaxonomiesPayload, FetchedTaxonomiesPayload},
    protocol::{taxonomy_from_response, TaxonomiesResponse},
    TaxonomyAction,
};

use super::WpComRestClient;
use crate::Dispatcher;

#[derive(Clone)]
pub struct TaxonomyRestClient {
    rest: WpComRestClient,
    dispatcher: Dispatcher,
}

impl TaxonomyRestClient {
    pub fn new(rest: WpComRestClient, dispatcher: Dispatcher) -> Self {
        Self { rest, dispatcher }
    }

    pub async fn fetch_taxonomies_payload(
        &self,
        payload: &FetchTaxonomiesPayload,
    ) -> FetchedTaxonomiesPayload {
        let site_id = payload.site.site_id.to_string();
        let segments = ["v1.1", "sites", site_id.as_str(), "post-types", "post", "taxonomies"];
        match self.rest.get::<TaxonomiesResponse>(&segments, &[]).await {
            Ok(resp) => FetchedTaxonomiesPayload {
                site: payload.site.clone(),
                taxonomies: resp
                    .taxonomies
                    .into_iter()
                    .map(|t| taxonomy_from_response(t, &payload.site))
                    .collect(),
                error: None,
            },
            Err(e) => FetchedTaxonomiesPayload {
                site: payload.site.clone(),
                taxonomies: Vec::new(),
                error: Some(e.into()),
            },
        }
    }

    pub fn fetch_taxonomies(&self, payload: FetchTaxonomiesPayload) {
        let this = self.clone();
        tokio::spawn(async move {
            let resp = this.fetch_taxonomies_payload(&payload).await;
            this.dispatcher.dispatch(TaxonomyAction::FetchedTaxonomies(resp));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::detached;
    use crate::test_support::{MockResponse, MockWpCom};
    use domain::{Site, TaxonomyErrorType};

    #[tokio::test]
    async fn maps_taxonomies_onto_local_site() {
        let mock = MockWpCom::start().await;
        mock.enqueue(MockResponse::json(serde_json::json!({ "taxonomies": [
            { "name": "category", "label": "Categories", "hierarchical": true, "public": true },
            { "name": "post_tag", "label": "Tags", "description": "", "public": true }
        ]})))
        .await;
        let (dispatcher, _rx) = detached();
        let client = TaxonomyRestClient::new(mock.client(), dispatcher);
        let mut site = Site::placeholder(1000);
        site.id = 4;

        let resp = client.fetch_taxonomies_payload(&FetchTaxonomiesPayload { site }).await;

        assert_eq!(resp.taxonomies.len(), 2);
        assert!(resp.taxonomies.iter().all(|t| t.local_site_id == 4));
        assert!(resp.taxonomies[0].is_hierarchical);
        assert_eq!(resp.taxonomies[1].description, None);
        assert_eq!(
            mock.requests().await[0].path,
            "/rest/v1.1/sites/1000/post-types/post/taxonomies"
        );
    }

    #[tokio::test]
    async fn forbidden_is_unauthorized_access() {
        let mock = MockWpCom::start().await;
        mock.enqueue(MockResponse::error(403, "unauthorized", "nope")).await;
        let (dispatcher, _rx) = detached();
        let client = TaxonomyRestClient::new(mock.client(), dispatcher);
        let resp = client
            .fetch_taxonomies_payload(&FetchTaxonomiesPayload { site: Site::placeholder(1) })
            .await;
        assert_eq!(resp.error.unwrap().kind, TaxonomyErrorType::UnauthorizedAccess);
    }
}
