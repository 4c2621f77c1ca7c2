//! In-process holder for known campaigns and the active selection

use super::{Campaign, CampaignContextProvider, NO_CAMPAIGN};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CampaignError {
    #[error("Campaign not found: {0}")]
    NotFound(String),
}

/// Campaign store with an explicit active selection
///
/// Passed into block orchestrators at construction instead of living in a
/// global.
#[derive(Default)]
pub struct ActiveCampaign {
    campaigns: RwLock<HashMap<String, Campaign>>,
    active: RwLock<Option<String>>,
}

impl ActiveCampaign {
    pub fn new() -> Self {
        Self::default()
    }

    /// Holder with one campaign, already active
    pub fn with_active(campaign: Campaign) -> Self {
        let id = campaign.id.clone();
        let mut campaigns = HashMap::new();
        campaigns.insert(id.clone(), campaign);
        Self {
            campaigns: RwLock::new(campaigns),
            active: RwLock::new(Some(id)),
        }
    }

    /// Insert or replace a campaign
    pub async fn upsert(&self, campaign: Campaign) {
        self.campaigns
            .write()
            .await
            .insert(campaign.id.clone(), campaign);
    }

    pub async fn set_active(&self, campaign_id: &str) -> Result<(), CampaignError> {
        if !self.campaigns.read().await.contains_key(campaign_id) {
            return Err(CampaignError::NotFound(campaign_id.to_string()));
        }
        *self.active.write().await = Some(campaign_id.to_string());
        log::debug!("Active campaign set to {}", campaign_id);
        Ok(())
    }

    pub async fn clear_active(&self) {
        *self.active.write().await = None;
    }

    pub async fn get(&self, campaign_id: &str) -> Option<Campaign> {
        self.campaigns.read().await.get(campaign_id).cloned()
    }
}

#[async_trait]
impl CampaignContextProvider for ActiveCampaign {
    async fn active_campaign_id(&self) -> Option<String> {
        self.active.read().await.clone()
    }

    async fn context_string(&self, campaign_id: &str) -> String {
        self.campaigns
            .read()
            .await
            .get(campaign_id)
            .map(|c| c.context_string())
            .unwrap_or_else(|| NO_CAMPAIGN.to_string())
    }

    async fn roster(&self, campaign_id: &str) -> Vec<String> {
        self.campaigns
            .read()
            .await
            .get(campaign_id)
            .map(|c| c.roster())
            .unwrap_or_default()
    }
}
