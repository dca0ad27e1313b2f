use chrono::Utc;
use insights::contacts::{
    derive_contact_detail, derive_contact_list, is_searchable, search_relevance, ContactDetailView,
    ContactListView, ContactSearchHit,
};
use serde::de::IgnoredAny;
use shared_types::{
    BulkCreateContactsRequest, BulkCreateContactsResponse, Channel, CheckExistsParams,
    CheckExistsResponse, Contact, ContactListParams, ContactStats, ContactsResponse,
    CreateChannelRequest, CreateContactRequest, UpdateChannelRequest, UpdateContactRequest,
};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::http::ApiClient;
use crate::query::{QueryClient, QueryKey, QueryOptions, QuerySnapshot, RetryPolicy};

const LIST_STALE_TIME: Duration = Duration::from_secs(30);
const DETAIL_STALE_TIME: Duration = Duration::from_secs(60);
const STATS_STALE_TIME: Duration = Duration::from_secs(300);
const SEARCH_STALE_TIME: Duration = Duration::from_secs(30);

pub mod keys {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::new("contacts")
    }

    pub fn lists() -> QueryKey {
        all().segment("list")
    }

    pub fn list(params: &ContactListParams) -> QueryKey {
        lists().with(params)
    }

    pub fn details() -> QueryKey {
        all().segment("detail")
    }

    pub fn detail(id: i64) -> QueryKey {
        details().with(&id)
    }

    pub fn stats() -> QueryKey {
        all().segment("stats")
    }

    pub fn searches() -> QueryKey {
        all().segment("search")
    }

    pub fn search(query: &str) -> QueryKey {
        searches().segment(query)
    }
}

/// Keys a contact write can make stale: every list, stats, search results
/// and, when known, the contact's own detail
fn mutation_keys(contact_id: Option<i64>) -> Vec<QueryKey> {
    let mut stale = vec![keys::lists(), keys::stats(), keys::searches()];
    if let Some(id) = contact_id {
        stale.push(keys::detail(id));
    }
    stale
}

fn empty_response() -> ContactsResponse {
    ContactsResponse {
        contacts: Vec::new(),
        total: 0,
        has_more: false,
    }
}

#[derive(Clone)]
pub struct ContactHooks {
    api: ApiClient,
    queries: QueryClient,
}

impl ContactHooks {
    pub fn new(api: ApiClient, queries: QueryClient) -> Self {
        Self { api, queries }
    }

    fn options(&self, stale_time: Duration) -> QueryOptions {
        self.queries.defaults().with_stale_time(stale_time)
    }

    /// Raw cached page of contacts
    pub async fn fetch_contacts(&self, params: &ContactListParams) -> Result<Arc<ContactsResponse>> {
        let api = self.api.clone();
        let params_owned = params.clone();

        self.queries
            .fetch(keys::list(params), self.options(LIST_STALE_TIME), move || {
                let api = api.clone();
                let params = params_owned.clone();
                async move { api.get_with_query::<ContactsResponse, _>("/contacts", &params).await }
            })
            .await
    }

    /// Contacts page with status/type buckets, prefix counts and stats
    pub async fn use_contacts(&self, params: &ContactListParams) -> Result<ContactListView> {
        let response = self.fetch_contacts(params).await?;
        Ok(derive_contact_list(&response))
    }

    /// What a list view shows right now; an empty page until the first load
    pub fn peek_contacts(&self, params: &ContactListParams) -> QuerySnapshot<ContactsResponse> {
        self.queries.peek(&keys::list(params), empty_response)
    }

    pub async fn fetch_contact(&self, id: i64) -> Result<Arc<Contact>> {
        let api = self.api.clone();

        self.queries
            .fetch(keys::detail(id), self.options(DETAIL_STALE_TIME), move || {
                let api = api.clone();
                async move { api.get::<Contact>(&format!("/contacts/{}", id)).await }
            })
            .await
    }

    pub async fn use_contact(&self, id: i64) -> Result<ContactDetailView> {
        let contact = self.fetch_contact(id).await?;
        Ok(derive_contact_detail(&contact, Utc::now()))
    }

    pub async fn use_contact_stats(&self) -> Result<Arc<ContactStats>> {
        let api = self.api.clone();

        self.queries
            .fetch(keys::stats(), self.options(STATS_STALE_TIME), move || {
                let api = api.clone();
                async move { api.get::<ContactStats>("/contacts/stats").await }
            })
            .await
    }

    pub fn peek_contact_stats(&self) -> QuerySnapshot<ContactStats> {
        self.queries.peek(&keys::stats(), ContactStats::default)
    }

    /// Searches by name, email or mobile.
    ///
    /// Queries under two characters resolve to nothing without a request.
    /// Failures are logged and resolve to an empty list.
    pub async fn use_contact_search(&self, query: &str) -> Vec<ContactSearchHit> {
        if !is_searchable(query) {
            return Vec::new();
        }

        let query = query.trim().to_string();
        let api = self.api.clone();
        let endpoint = format!("/contacts/search/{}", urlencoding::encode(&query));
        let options = self
            .options(SEARCH_STALE_TIME)
            .with_retry(RetryPolicy::none());

        let result = self
            .queries
            .fetch(keys::search(&query), options, move || {
                let api = api.clone();
                let endpoint = endpoint.clone();
                async move { api.get::<Vec<Contact>>(&endpoint).await }
            })
            .await;

        match result {
            Ok(contacts) => search_relevance(&contacts, &query),
            Err(e) => {
                tracing::debug!("Contact search for {:?} failed: {}", query, e);
                Vec::new()
            }
        }
    }

    /// Uncached lookup used to warn about duplicates before creating a contact
    pub async fn check_exists(&self, params: &CheckExistsParams) -> Result<CheckExistsResponse> {
        self.api
            .get_with_query("/contacts/check-exists", params)
            .await
    }

    pub async fn create_contact(&self, request: &CreateContactRequest) -> Result<Contact> {
        self.queries
            .mutate(self.api.post("/contacts", request), &mutation_keys(None))
            .await
    }

    pub async fn bulk_create_contacts(
        &self,
        request: &BulkCreateContactsRequest,
    ) -> Result<BulkCreateContactsResponse> {
        self.queries
            .mutate(self.api.post("/contacts/bulk", request), &mutation_keys(None))
            .await
    }

    pub async fn update_contact(&self, id: i64, request: &UpdateContactRequest) -> Result<Contact> {
        let endpoint = format!("/contacts/{}", id);
        self.queries
            .mutate(self.api.put(&endpoint, request), &mutation_keys(Some(id)))
            .await
    }

    pub async fn delete_contact(&self, id: i64) -> Result<()> {
        let endpoint = format!("/contacts/{}", id);
        self.queries
            .mutate(self.api.delete::<IgnoredAny>(&endpoint), &mutation_keys(Some(id)))
            .await?;
        Ok(())
    }

    pub async fn add_channel(&self, contact_id: i64, request: &CreateChannelRequest) -> Result<Channel> {
        let endpoint = format!("/contacts/{}/channels", contact_id);
        self.queries
            .mutate(self.api.post(&endpoint, request), &mutation_keys(Some(contact_id)))
            .await
    }

    pub async fn update_channel(
        &self,
        contact_id: i64,
        channel_id: i64,
        request: &UpdateChannelRequest,
    ) -> Result<Channel> {
        let endpoint = format!("/contacts/{}/channels/{}", contact_id, channel_id);
        self.queries
            .mutate(self.api.put(&endpoint, request), &mutation_keys(Some(contact_id)))
            .await
    }

    pub async fn delete_channel(&self, contact_id: i64, channel_id: i64) -> Result<()> {
        let endpoint = format!("/contacts/{}/channels/{}", contact_id, channel_id);
        self.queries
            .mutate(
                self.api.delete::<IgnoredAny>(&endpoint),
                &mutation_keys(Some(contact_id)),
            )
            .await?;
        Ok(())
    }

    /// Makes the channel the primary one of its type
    pub async fn set_primary_channel(&self, contact_id: i64, channel_id: i64) -> Result<Channel> {
        let endpoint = format!("/contacts/{}/channels/{}/primary", contact_id, channel_id);
        self.queries
            .mutate(
                self.api.put(&endpoint, &serde_json::json!({})),
                &mutation_keys(Some(contact_id)),
            )
            .await
    }
}
