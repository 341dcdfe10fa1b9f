//! NWDAF SBI Handler
//!
//! Notification endpoints under `/nnwdaf-events/v1`:
//! - `POST notifications`: AMF event reports
//! - `POST smf-notifications`: SMF PDU session events
//! - `POST udm-ee-notifications`: UDM event exposure reports
//! - `GET uli`, `GET smf-events`: stored reports

use std::sync::Arc;

use ogs_sbi::message::{SbiRequest, SbiResponse};
use ogs_sbi::server::{
    send_bad_request, send_internal_error, send_method_not_allowed, send_not_found,
};

use crate::error::NotificationError;
use crate::notification::NotificationEnvelope;
use crate::store::{ReportKind, ReportStore, StoredReport};

/// Notification endpoint a payload arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSurface {
    Amf,
    Smf,
    UdmEe,
}

pub struct NotificationRouter {
    store: Arc<dyn ReportStore>,
}

impl NotificationRouter {
    pub fn new(store: Arc<dyn ReportStore>) -> Self {
        Self { store }
    }

    /// Dispatch a request to its endpoint
    pub async fn handle(&self, request: SbiRequest) -> SbiResponse {
        let method = request.header.method.as_str();
        let path = request.header.path();

        log::debug!("NWDAF SBI: {method} {path}");

        let parts: Vec<&str> = path.trim_start_matches('/').split('/').collect();

        match parts.as_slice() {
            ["nnwdaf-events", "v1", "notifications"] => match method {
                "POST" => self.handle_notification(NotificationSurface::Amf, &request).await,
                _ => send_method_not_allowed(method, "notifications"),
            },
            ["nnwdaf-events", "v1", "smf-notifications"] => match method {
                "POST" => self.handle_notification(NotificationSurface::Smf, &request).await,
                _ => send_method_not_allowed(method, "smf-notifications"),
            },
            ["nnwdaf-events", "v1", "udm-ee-notifications"] => match method {
                "POST" => self.handle_notification(NotificationSurface::UdmEe, &request).await,
                _ => send_method_not_allowed(method, "udm-ee-notifications"),
            },
            ["nnwdaf-events", "v1", "uli"] => match method {
                "GET" => self.handle_list(ReportKind::Location).await,
                _ => send_method_not_allowed(method, "uli"),
            },
            ["nnwdaf-events", "v1", "smf-events"] => match method {
                "GET" => self.handle_list(ReportKind::SmfEvent).await,
                _ => send_method_not_allowed(method, "smf-events"),
            },
            _ => send_not_found(&format!("Resource not found: {path}"), None),
        }
    }

    async fn handle_notification(
        &self,
        surface: NotificationSurface,
        request: &SbiRequest,
    ) -> SbiResponse {
        let envelope = match NotificationEnvelope::classify(request.http.content.as_deref()) {
            Ok(envelope) => envelope,
            Err(e) => {
                log::warn!("Rejected {surface:?} notification: {e}");
                return send_bad_request(&e.to_string(), Some(e.cause()));
            }
        };

        match (surface, envelope) {
            (NotificationSurface::Amf, NotificationEnvelope::LocationReport(report)) => {
                log::info!(
                    "LOCATION_REPORT: UE={} TAC={} CELL={}",
                    report.ue_identity,
                    report.tac.as_deref().unwrap_or("-"),
                    report.cell_id
                );
                self.persist(report.into(), SbiResponse::no_content()).await
            }
            (NotificationSurface::Amf, NotificationEnvelope::AmfReport(kind)) => {
                log::debug!("Ignoring AMF {kind} notification");
                SbiResponse::no_content()
            }
            (NotificationSurface::Smf, NotificationEnvelope::SmfEvent(event)) => {
                log::info!(
                    "SMF {}: UE={} PDU session={}",
                    event.event_type,
                    event.ue_identity,
                    event.pdu_session_id
                );
                let ack = SbiResponse::ok()
                    .with_body(r#"{"status":"received"}"#, ogs_sbi::constants::content_type::JSON);
                self.persist(event.into(), ack).await
            }
            (NotificationSurface::UdmEe, NotificationEnvelope::UdmEeEvent(event)) => {
                log::info!(
                    "UDM EE {}: UE={}",
                    event.event,
                    event.ue_identity.as_deref().unwrap_or("-")
                );
                SbiResponse::no_content()
            }
            (surface, envelope) => {
                log::warn!("Rejected {surface:?} notification classified as {}", envelope.name());
                let e = NotificationError::Unrecognized;
                send_bad_request(&e.to_string(), Some(e.cause()))
            }
        }
    }

    async fn persist(&self, record: StoredReport, success: SbiResponse) -> SbiResponse {
        match self.store.put(record.key(), record).await {
            Ok(()) => success,
            Err(e) => {
                log::error!("Report store failure: {e}");
                send_internal_error(&e.to_string())
            }
        }
    }

    async fn handle_list(&self, kind: ReportKind) -> SbiResponse {
        let records = match self.store.list(kind).await {
            Ok(records) => records,
            Err(e) => {
                log::error!("Report store failure: {e}");
                return send_internal_error(&e.to_string());
            }
        };

        match SbiResponse::ok().with_json_body(&records) {
            Ok(response) => response,
            Err(e) => send_internal_error(&format!("Failed to encode reports: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::{InMemoryReportStore, ReportKey};
    use async_trait::async_trait;
    use ogs_sbi::ProblemDetails;

    const NR_LOCATION: &str = r#"{"type":"LOCATION_REPORT","supi":"imsi-1","location":{"nrLocation":{"tai":{"tac":"1"},"ncgi":{"nrCellId":"2"}}}}"#;

    fn router() -> NotificationRouter {
        NotificationRouter::new(Arc::new(InMemoryReportStore::new()))
    }

    fn post(path: &str, body: &str) -> SbiRequest {
        SbiRequest::post(path).with_body(body, "application/json")
    }

    fn cause(response: &SbiResponse) -> Option<String> {
        response.json_body::<ProblemDetails>().ok().and_then(|p| p.cause)
    }

    #[tokio::test]
    async fn test_location_report_persisted() {
        let router = router();
        let response = router
            .handle(post("/nnwdaf-events/v1/notifications", NR_LOCATION))
            .await;
        assert_eq!(response.status, 204);

        let response = router.handle(SbiRequest::get("/nnwdaf-events/v1/uli")).await;
        assert_eq!(response.status, 200);
        let listed: serde_json::Value = response.json_body().unwrap();
        assert_eq!(listed[0]["ueIdentity"], "imsi-1");
        assert_eq!(listed[0]["cellId"], "2");
        assert_eq!(listed[0]["tac"], "1");
    }

    #[tokio::test]
    async fn test_empty_read_surface() {
        let response = router().handle(SbiRequest::get("/nnwdaf-events/v1/uli")).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.text(), "[]");
    }

    #[tokio::test]
    async fn test_amf_report_ignored() {
        let router = router();
        let response = router
            .handle(post("/nnwdaf-events/v1/notifications", r#"{"type":"REGISTRATION_STATE_REPORT"}"#))
            .await;
        assert_eq!(response.status, 204);
        let response = router.handle(SbiRequest::get("/nnwdaf-events/v1/uli")).await;
        assert_eq!(response.text(), "[]");
    }

    #[tokio::test]
    async fn test_smf_event_acknowledged() {
        let router = router();
        let response = router
            .handle(post(
                "/nnwdaf-events/v1/smf-notifications",
                r#"{"eventType":"PDU_SESSION_ESTABLISHMENT","supi":"imsi-1","pduSessionId":1,"timeStamp":"t1"}"#,
            ))
            .await;
        assert_eq!(response.status, 200);
        assert_eq!(response.text(), r#"{"status":"received"}"#);

        let response = router.handle(SbiRequest::get("/nnwdaf-events/v1/smf-events")).await;
        let listed: serde_json::Value = response.json_body().unwrap();
        assert_eq!(listed[0]["pduSessionId"], 1);
    }

    #[tokio::test]
    async fn test_udm_event_acknowledged() {
        let response = router()
            .handle(post(
                "/nnwdaf-events/v1/udm-ee-notifications",
                r#"{"event":"SUBSCRIPTION_DATA_CHANGE","supi":"imsi-1"}"#,
            ))
            .await;
        assert_eq!(response.status, 204);
    }

    #[tokio::test]
    async fn test_rejections() {
        let router = router();
        let cases = [
            ("/nnwdaf-events/v1/notifications", "{broken", "INVALID_JSON"),
            ("/nnwdaf-events/v1/notifications", "", "MISSING_BODY"),
            ("/nnwdaf-events/v1/notifications", "{}", "UNRECOGNIZED_NOTIFICATION"),
            ("/nnwdaf-events/v1/notifications", r#"{"type":"LOCATION_REPORT"}"#, "MANDATORY_IE_MISSING"),
            ("/nnwdaf-events/v1/smf-notifications", NR_LOCATION, "UNRECOGNIZED_NOTIFICATION"),
            ("/nnwdaf-events/v1/udm-ee-notifications", r#"{"event":"NOPE"}"#, "UNRECOGNIZED_NOTIFICATION"),
            ("/nnwdaf-events/v1/smf-notifications", "[1]", "UNRECOGNIZED_NOTIFICATION"),
        ];
        for (path, body, expected) in cases {
            let response = router.handle(post(path, body)).await;
            assert_eq!(response.status, 400, "{path} {body}");
            assert_eq!(cause(&response).as_deref(), Some(expected), "{path} {body}");
        }

        let response = router.handle(SbiRequest::get("/nnwdaf-events/v1/uli")).await;
        assert_eq!(response.text(), "[]");
    }

    #[tokio::test]
    async fn test_routing_errors() {
        let router = router();
        assert_eq!(router.handle(SbiRequest::get("/nnwdaf-events/v1/unknown")).await.status, 404);
        assert_eq!(router.handle(SbiRequest::get("/")).await.status, 404);
        assert_eq!(router.handle(SbiRequest::get("/nnwdaf-events/v1/notifications")).await.status, 405);
        assert_eq!(router.handle(post("/nnwdaf-events/v1/uli", "{}")).await.status, 405);
    }

    struct FailingStore;

    #[async_trait]
    impl ReportStore for FailingStore {
        async fn put(&self, _key: ReportKey, _record: StoredReport) -> Result<(), StoreError> {
            Err(StoreError("database unavailable".to_string()))
        }

        async fn list(&self, _kind: ReportKind) -> Result<Vec<StoredReport>, StoreError> {
            Err(StoreError("database unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_store_failure_passthrough() {
        let router = NotificationRouter::new(Arc::new(FailingStore));
        let response = router
            .handle(post("/nnwdaf-events/v1/notifications", NR_LOCATION))
            .await;
        assert_eq!(response.status, 500);
        let problem: ProblemDetails = response.json_body().unwrap();
        assert_eq!(problem.detail.as_deref(), Some("database unavailable"));

        let response = router.handle(SbiRequest::get("/nnwdaf-events/v1/uli")).await;
        assert_eq!(response.status, 500);
    }
}
