use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use crate::auth::repo::{PgUserDirectory, UserDirectory};
use crate::config::AppConfig;
use crate::db;
use crate::mail::{BrevoMailer, LogMailer, Mailer};
use crate::meals::repo::PgMealCatalog;
use crate::plans::provider::{OpenAiPlanProvider, PlanProvider};
use crate::plans::repo::PgPlanStore;
use crate::plans::services::PlanService;
use crate::quotes::repo::{PgQuoteStore, QuoteStore};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub plans: PlanService,
    pub users: Arc<dyn UserDirectory>,
    pub quotes: Arc<dyn QuoteStore>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config.database_url).await?;

        let provider = match &config.ai {
            Some(ai) => {
                info!(model = %ai.model, timeout_secs = ai.timeout_secs, "delegated plan generation enabled");
                Some(Arc::new(OpenAiPlanProvider::new(ai.clone())?) as Arc<dyn PlanProvider>)
            }
            None => {
                info!("OPENAI_API_KEY not set; plans are generated locally");
                None
            }
        };

        let mailer = match &config.mail {
            Some(mail) => Arc::new(BrevoMailer::new(mail.clone())?) as Arc<dyn Mailer>,
            None => {
                info!("BREVO_API_KEY not set; emails are only logged");
                Arc::new(LogMailer) as Arc<dyn Mailer>
            }
        };

        let users = Arc::new(PgUserDirectory::new(db.clone())) as Arc<dyn UserDirectory>;
        let plans = PlanService::new(
            Arc::new(PgMealCatalog::new(db.clone())),
            Arc::new(PgPlanStore::new(db.clone())),
            users.clone(),
            provider,
        );

        Ok(Self {
            quotes: Arc::new(PgQuoteStore::new(db.clone())),
            db,
            config,
            plans,
            users,
            mailer,
        })
    }

    #[cfg(test)]
    pub fn from_parts(
        db: PgPool,
        config: Arc<AppConfig>,
        plans: PlanService,
        users: Arc<dyn UserDirectory>,
        quotes: Arc<dyn QuoteStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            db,
            config,
            plans,
            users,
            quotes,
            mailer,
        }
    }

    /// State backed by in-memory stores and a pool that never connects.
    #[cfg(test)]
    pub fn fake() -> Self {
        crate::testing::Fixture::new(Vec::new()).app_state()
    }
}
