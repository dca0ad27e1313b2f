use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use shared_types::{Channel, ChannelType, Contact, ContactsResponse};
use std::collections::BTreeMap;

/// Search queries shorter than this never reach the API
pub const MIN_SEARCH_QUERY_LEN: usize = 2;

/// Contacts updated within this many days count as recently updated
const RECENT_UPDATE_DAYS: i64 = 7;

const NO_PREFIX: &str = "none";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusBuckets {
    pub active: Vec<Contact>,
    pub inactive: Vec<Contact>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TypeBuckets {
    pub customers: Vec<Contact>,
    pub prospects: Vec<Contact>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContactListStats {
    /// Total matching contacts on the server
    pub total: u64,
    /// Contacts present in this page
    pub showing: usize,
    pub has_more: bool,
    pub avg_channels_per_contact: f64,
}

/// Contacts list response enriched for display
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContactListView {
    pub contacts: Vec<Contact>,
    pub by_status: StatusBuckets,
    pub by_type: TypeBuckets,
    /// Frequency of name prefixes; contacts without one are counted under "none"
    pub prefix_counts: BTreeMap<String, usize>,
    pub stats: ContactListStats,
}

/// Builds the list view from a raw response.
///
/// The response is only borrowed, so cached data is never modified and each
/// call yields a fresh view.
pub fn derive_contact_list(response: &ContactsResponse) -> ContactListView {
    let contacts = response.contacts.clone();

    let (active, inactive): (Vec<_>, Vec<_>) =
        contacts.iter().cloned().partition(|c| c.is_active);
    let (customers, prospects): (Vec<_>, Vec<_>) =
        contacts.iter().cloned().partition(|c| c.is_customer);

    let mut prefix_counts = BTreeMap::new();
    for contact in &contacts {
        let prefix = contact
            .prefix
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(NO_PREFIX);
        *prefix_counts.entry(prefix.to_string()).or_insert(0) += 1;
    }

    let channel_total: usize = contacts.iter().map(|c| c.channels.len()).sum();
    let avg_channels_per_contact = if contacts.is_empty() {
        0.0
    } else {
        channel_total as f64 / contacts.len() as f64
    };

    ContactListView {
        stats: ContactListStats {
            total: response.total,
            showing: contacts.len(),
            has_more: response.has_more,
            avg_channels_per_contact,
        },
        by_status: StatusBuckets { active, inactive },
        by_type: TypeBuckets {
            customers,
            prospects,
        },
        prefix_counts,
        contacts,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PrimaryChannels {
    pub email: Option<Channel>,
    pub mobile: Option<Channel>,
    pub whatsapp: Option<Channel>,
}

impl PrimaryChannels {
    pub fn get(&self, channel_type: ChannelType) -> Option<&Channel> {
        match channel_type {
            ChannelType::Email => self.email.as_ref(),
            ChannelType::Mobile => self.mobile.as_ref(),
            ChannelType::Whatsapp => self.whatsapp.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactDetailView {
    pub contact: Contact,
    pub primary: PrimaryChannels,
    pub channel_counts: BTreeMap<ChannelType, usize>,
    pub has_multiple_channels: bool,
    pub account_age_days: i64,
    pub recently_updated: bool,
}

fn first_primary(channels: &[Channel], channel_type: ChannelType) -> Option<Channel> {
    channels
        .iter()
        .find(|c| c.channel_type == channel_type && c.is_primary)
        .cloned()
}

pub fn derive_contact_detail(contact: &Contact, now: DateTime<Utc>) -> ContactDetailView {
    let mut channel_counts = BTreeMap::new();
    for channel in &contact.channels {
        *channel_counts.entry(channel.channel_type).or_insert(0) += 1;
    }

    ContactDetailView {
        primary: PrimaryChannels {
            email: first_primary(&contact.channels, ChannelType::Email),
            mobile: first_primary(&contact.channels, ChannelType::Mobile),
            whatsapp: first_primary(&contact.channels, ChannelType::Whatsapp),
        },
        channel_counts,
        has_multiple_channels: contact.channels.len() > 1,
        account_age_days: (now - contact.created_at).num_days(),
        recently_updated: now - contact.updated_at <= Duration::days(RECENT_UPDATE_DAYS),
        contact: contact.clone(),
    }
}

/// A search result annotated with why it matched
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactSearchHit {
    pub contact: Contact,
    pub name_match: bool,
    pub email_match: bool,
    pub mobile_match: bool,
    pub exact_match: bool,
}

/// Annotates search results with case-insensitive relevance flags.
pub fn search_relevance(contacts: &[Contact], query: &str) -> Vec<ContactSearchHit> {
    let needle = query.trim().to_lowercase();

    contacts
        .iter()
        .map(|contact| {
            let name = contact.name.to_lowercase();
            let emails: Vec<String> = contact
                .channel_values(ChannelType::Email)
                .map(str::to_lowercase)
                .collect();
            let mobiles: Vec<String> = contact
                .channel_values(ChannelType::Mobile)
                .map(str::to_lowercase)
                .collect();

            ContactSearchHit {
                name_match: name.contains(&needle),
                email_match: emails.iter().any(|e| e.contains(&needle)),
                mobile_match: mobiles.iter().any(|m| m.contains(&needle)),
                exact_match: name == needle
                    || emails.iter().any(|e| *e == needle)
                    || mobiles.iter().any(|m| *m == needle),
                contact: contact.clone(),
            }
        })
        .collect()
}

/// Whether a query is long enough to be sent to the search endpoint
pub fn is_searchable(query: &str) -> bool {
    query.trim().chars().count() >= MIN_SEARCH_QUERY_LEN
}
