use async_trait::async_trait;
use reqwest::Method;
use tracing::{debug, info};

use shared_backend::{BackendClient, BackendError};
use shared_config::AppConfig;

use crate::models::{CalendarFeed, MacroPeriodPublicView, SubmissionReceipt, SubmitResponseRequest};

const CALENDAR_CONTENT_TYPE: &str = "text/calendar";

/// The backend operations a response session consumes.
#[async_trait]
pub trait MacroPeriodGateway: Send + Sync {
    async fn load(&self, token: &str) -> Result<MacroPeriodPublicView, BackendError>;

    async fn submit(&self, token: &str, request: &SubmitResponseRequest) -> Result<SubmissionReceipt, BackendError>;

    async fn calendar_feed(&self, token: &str) -> Result<CalendarFeed, BackendError>;
}

pub struct PublicMacroPeriodApi {
    backend: BackendClient,
}

impl PublicMacroPeriodApi {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            backend: BackendClient::new(config),
        }
    }

    fn period_path(token: &str) -> String {
        format!("/public/macro-period/{}", urlencoding::encode(token))
    }
}

#[async_trait]
impl MacroPeriodGateway for PublicMacroPeriodApi {
    async fn load(&self, token: &str) -> Result<MacroPeriodPublicView, BackendError> {
        debug!("Loading macro period by token");
        self.backend
            .request::<MacroPeriodPublicView, ()>(Method::GET, &Self::period_path(token), None)
            .await
    }

    async fn submit(&self, token: &str, request: &SubmitResponseRequest) -> Result<SubmissionReceipt, BackendError> {
        info!(
            "Submitting {} selection(s) (confirm = {})",
            request.selections.len(),
            request.confirm
        );
        let path = format!("{}/response", Self::period_path(token));
        self.backend.request(Method::POST, &path, Some(request)).await
    }

    async fn calendar_feed(&self, token: &str) -> Result<CalendarFeed, BackendError> {
        let path = format!("{}/calendar", Self::period_path(token));
        let (content_type, body) = self.backend.request_bytes(&path).await?;

        Ok(CalendarFeed {
            content_type: content_type.unwrap_or_else(|| CALENDAR_CONTENT_TYPE.to_string()),
            body,
        })
    }
}
