use insights::imports::{summarize_sessions, ImportOverview};
use shared_types::{ImportSessionsResponse, StagingRecordParams, StagingRecordsResponse};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::http::ApiClient;
use crate::query::{QueryClient, QueryKey, QuerySnapshot};

const STALE_TIME: Duration = Duration::from_secs(30);

pub mod keys {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::new("import")
    }

    pub fn sessions() -> QueryKey {
        all().segment("sessions")
    }

    pub fn staging(session_id: &str, params: &StagingRecordParams) -> QueryKey {
        all().segment("staging").segment(session_id).with(params)
    }
}

/// Read-only views over import jobs run by the backend
#[derive(Clone)]
pub struct ImportHooks {
    api: ApiClient,
    queries: QueryClient,
}

impl ImportHooks {
    pub fn new(api: ApiClient, queries: QueryClient) -> Self {
        Self { api, queries }
    }

    pub async fn use_import_sessions(&self) -> Result<Arc<ImportSessionsResponse>> {
        let api = self.api.clone();
        let options = self.queries.defaults().with_stale_time(STALE_TIME);

        self.queries
            .fetch(keys::sessions(), options, move || {
                let api = api.clone();
                async move { api.get::<ImportSessionsResponse>("/import/sessions").await }
            })
            .await
    }

    pub fn peek_import_sessions(&self) -> QuerySnapshot<ImportSessionsResponse> {
        self.queries.peek(&keys::sessions(), || ImportSessionsResponse {
            sessions: Vec::new(),
            total: 0,
        })
    }

    /// Status counts and overall success rate across the listed sessions
    pub async fn use_import_overview(&self) -> Result<ImportOverview> {
        let response = self.use_import_sessions().await?;
        Ok(summarize_sessions(&response.sessions))
    }

    pub async fn use_staging_records(
        &self,
        session_id: &str,
        params: &StagingRecordParams,
    ) -> Result<Arc<StagingRecordsResponse>> {
        let api = self.api.clone();
        let endpoint = format!(
            "/import/staging/{}/records",
            urlencoding::encode(session_id)
        );
        let params_owned = params.clone();
        let options = self.queries.defaults().with_stale_time(STALE_TIME);

        self.queries
            .fetch(keys::staging(session_id, params), options, move || {
                let api = api.clone();
                let endpoint = endpoint.clone();
                let params = params_owned.clone();
                async move {
                    api.get_with_query::<StagingRecordsResponse, _>(&endpoint, &params)
                        .await
                }
            })
            .await
    }
}
