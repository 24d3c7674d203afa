use serde::{Deserialize, Serialize};

use crate::api::client::ApiClient;
use crate::api::models::{PartnerQuery, PartnerRecord};
use crate::config::SupportContact;
use crate::error::Result;
use crate::storage::PartnerCache;

/// One row of the conversation list, with its display identity resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerEntry {
    pub partner_id: String,
    pub display_name: String,
    pub email: String,
    pub avatar: String,
    pub role: String,
    pub chat_id: String,
    pub order_id: Option<String>,
    pub order_number: Option<String>,
}

impl PartnerEntry {
    /// Composite row key. Order-scoped lists may repeat a counterpart
    /// across orders, so neither the partner id nor the chat id alone is
    /// unique enough for a view to key rows on.
    pub fn row_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.partner_id,
            self.chat_id,
            self.order_number.as_deref().unwrap_or("")
        )
    }
}

/// Produces the set of conversations the current user may open, under a
/// role/type/search filter. Keeps a last-known-good cache so a failed
/// refresh leaves the previous list visible instead of blanking it.
pub struct ChatDirectory {
    api: ApiClient,
    cache: PartnerCache,
    support: SupportContact,
}

impl ChatDirectory {
    pub fn new(api: ApiClient, cache: PartnerCache, support: SupportContact) -> Self {
        Self {
            api,
            cache,
            support,
        }
    }

    /// Fetch the counterpart list for `query` and update the cache. On
    /// failure the cache is untouched; callers surface the error and keep
    /// rendering [`ChatDirectory::cached`].
    pub async fn refresh(&mut self, query: &PartnerQuery) -> Result<Vec<PartnerEntry>> {
        let records = match self.api.chat_partners(query).await {
            Ok(records) => records,
            Err(err) => {
                log::warn!("chat directory refresh failed: {}", err);
                return Err(err);
            }
        };
        let entries: Vec<PartnerEntry> = records
            .into_iter()
            .map(|record| resolve(record, &self.support))
            .collect();
        self.cache.upsert(&entries)?;
        Ok(entries)
    }

    /// Last-known-good entries from the local cache, newest first.
    pub fn cached(&self) -> Result<Vec<PartnerEntry>> {
        self.cache.entries(None)
    }
}

/// Map a raw record to its display identity. The platform support account
/// is always shown under the configured label and avatar, whatever name
/// and image the record carries.
fn resolve(record: PartnerRecord, support: &SupportContact) -> PartnerEntry {
    let masked = !support.email.is_empty() && record.email == support.email;
    let display_name = if masked {
        support.label.clone()
    } else if record.name.is_empty() {
        record.email.clone()
    } else {
        record.name.clone()
    };
    let avatar = if masked {
        support.avatar.clone()
    } else {
        record.image.clone()
    };
    PartnerEntry {
        partner_id: record.id,
        display_name,
        email: record.email,
        avatar,
        role: record.role,
        chat_id: record.chat_id,
        order_id: record.order_id,
        order_number: record.order_number,
    }
}
