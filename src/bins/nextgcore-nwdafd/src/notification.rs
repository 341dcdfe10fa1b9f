//! Notification Classification
//!
//! Peers share notification endpoints, so payloads are classified by their
//! discriminator fields. Matching is explicit: a payload without a
//! recognised discriminator is [`NotificationEnvelope::Unrecognized`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::NotificationError;

const LOCATION_REPORT: &str = "LOCATION_REPORT";

/// PDU session transitions reported by the SMF
const SMF_PDU_SESSION_EVENTS: [&str; 3] = [
    "PDU_SESSION_ESTABLISHMENT",
    "PDU_SESSION_MODIFICATION",
    "PDU_SESSION_RELEASE",
];

/// Nudm_EE event types (TS 29.503 EventType)
const UDM_EE_EVENTS: [&str; 14] = [
    "SUBSCRIPTION_DATA_CHANGE",
    "AMF_REGISTRATION_STATE",
    "LOSS_OF_CONNECTIVITY",
    "UE_REACHABILITY_FOR_DATA",
    "UE_REACHABILITY_FOR_SMS",
    "LOCATION_REPORTING",
    "CHANGE_OF_SUPI_PEI_ASSOCIATION",
    "ROAMING_STATUS",
    "COMMUNICATION_FAILURE",
    "AVAILABILITY_AFTER_DDN_FAILURE",
    "CN_TYPE_CHANGE",
    "DL_DATA_DELIVERY_STATUS",
    "PDN_CONNECTIVITY_STATUS",
    "UE_CONNECTION_MANAGEMENT_STATE",
];

/// Namf_EventExposure event types other than LOCATION_REPORT (TS 29.518 AmfEventType)
const AMF_EVENT_TYPES: [&str; 15] = [
    "PRESENCE_IN_AOI_REPORT",
    "TIMEZONE_REPORT",
    "ACCESS_TYPE_REPORT",
    "REGISTRATION_STATE_REPORT",
    "CONNECTIVITY_STATE_REPORT",
    "REACHABILITY_REPORT",
    "COMMUNICATION_FAILURE_REPORT",
    "UES_IN_AREA_REPORT",
    "SUBSCRIPTION_ID_CHANGE",
    "SUBSCRIPTION_ID_ADDITION",
    "LOSS_OF_CONNECTIVITY",
    "5GS_USER_STATE_REPORT",
    "AVAILABILITY_AFTER_DDN_FAILURE",
    "TYPE_ALLOCATION_CODE_REPORT",
    "FREQUENCY_SELECTION_PRIORITY_REPORT",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RatType {
    Nr,
    Eutra,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlmnId {
    pub mcc: String,
    pub mnc: String,
}

/// UE location as reported by the AMF
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationReport {
    pub ue_identity: String,
    pub rat: RatType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plmn_id: Option<PlmnId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tac: Option<String>,
    pub cell_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_stamp: Option<String>,
    pub received_at: DateTime<Utc>,
}

/// PDU session event as reported by the SMF
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmfEvent {
    pub event_type: String,
    pub ue_identity: String,
    pub pdu_session_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dnn: Option<String>,
    /// Event time, or the receive time when the SMF sent none
    pub time_stamp: String,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UdmEeEvent {
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ue_identity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_stamp: Option<String>,
}

/// A classified inbound notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEnvelope {
    LocationReport(LocationReport),
    SmfEvent(SmfEvent),
    UdmEeEvent(UdmEeEvent),
    /// Recognised AMF event kind that carries nothing to persist
    AmfReport(String),
    Unrecognized,
}

impl NotificationEnvelope {
    /// Classify a notification body
    pub fn classify(body: Option<&str>) -> Result<Self, NotificationError> {
        let body = body
            .filter(|b| !b.trim().is_empty())
            .ok_or(NotificationError::MissingBody)?;
        let value: Value =
            serde_json::from_str(body).map_err(|e| NotificationError::InvalidJson(e.to_string()))?;
        Self::classify_value(&value, Utc::now())
    }

    pub fn classify_value(value: &Value, received_at: DateTime<Utc>) -> Result<Self, NotificationError> {
        let Some(object) = value.as_object() else {
            return Ok(Self::Unrecognized);
        };

        let type_tag = str_field(object, "type");
        let event_type = str_field(object, "eventType");

        if type_tag == Some(LOCATION_REPORT) || event_type == Some(LOCATION_REPORT) {
            return amf_location_report(object, received_at).map(Self::LocationReport);
        }

        if object.contains_key("ueId") && object.get("uli").is_some_and(Value::is_object) {
            return legacy_uli_report(object, received_at).map(Self::LocationReport);
        }

        if let Some(event) = event_type.filter(|e| SMF_PDU_SESSION_EVENTS.contains(e)) {
            return smf_event(object, event, received_at).map(Self::SmfEvent);
        }

        if let Some(event) = str_field(object, "event").filter(|e| UDM_EE_EVENTS.contains(e)) {
            return Ok(Self::UdmEeEvent(UdmEeEvent {
                event: event.to_string(),
                ue_identity: ["supi", "gpsi", "ueId"]
                    .iter()
                    .find_map(|key| str_field(object, key))
                    .map(String::from),
                time_stamp: str_field(object, "timeStamp").map(String::from),
            }));
        }

        if let Some(kind) = type_tag.filter(|t| AMF_EVENT_TYPES.contains(t)) {
            return Ok(Self::AmfReport(kind.to_string()));
        }

        Ok(Self::Unrecognized)
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::LocationReport(_) => "LocationReport",
            Self::SmfEvent(_) => "SmfEvent",
            Self::UdmEeEvent(_) => "UdmEeEvent",
            Self::AmfReport(_) => "AmfReport",
            Self::Unrecognized => "Unrecognized",
        }
    }
}

fn str_field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str)
}

fn non_empty<'a>(value: Option<&'a Value>, key: &str) -> Option<&'a str> {
    value
        .and_then(|v| v.get(key))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn plmn_id(value: Option<&Value>) -> Option<PlmnId> {
    let plmn = value?.get("plmnId")?;
    Some(PlmnId {
        mcc: plmn.get("mcc")?.as_str()?.to_string(),
        mnc: plmn.get("mnc")?.as_str()?.to_string(),
    })
}

/// AmfEventReport with `location` (TS 29.518 / TS 29.571 UserLocation)
fn amf_location_report(
    object: &Map<String, Value>,
    received_at: DateTime<Utc>,
) -> Result<LocationReport, NotificationError> {
    let supi = str_field(object, "supi")
        .filter(|s| !s.is_empty())
        .ok_or(NotificationError::MandatoryIeMissing("supi"))?;
    let location = object.get("location");

    let nr = location.and_then(|l| l.get("nrLocation"));
    let eutra = location.and_then(|l| l.get("eutraLocation"));

    let (rat, area, cell_id) =
        if let Some(cell) = non_empty(nr.and_then(|n| n.get("ncgi")), "nrCellId") {
            (RatType::Nr, nr, cell)
        } else if let Some(cell) = non_empty(eutra.and_then(|e| e.get("ecgi")), "eutraCellId") {
            (RatType::Eutra, eutra, cell)
        } else {
            return Err(NotificationError::MandatoryIeMissing("location.ncgi/ecgi"));
        };

    let tai = area.and_then(|a| a.get("tai"));
    Ok(LocationReport {
        ue_identity: supi.to_string(),
        rat,
        plmn_id: plmn_id(tai),
        tac: non_empty(tai, "tac").map(String::from),
        cell_id: cell_id.to_string(),
        time_stamp: str_field(object, "timeStamp").map(String::from),
        received_at,
    })
}

/// `{ueId, uli: {tai, ecgi}}` as sent by older AMF builds
fn legacy_uli_report(
    object: &Map<String, Value>,
    received_at: DateTime<Utc>,
) -> Result<LocationReport, NotificationError> {
    let ue_id = str_field(object, "ueId")
        .filter(|s| !s.is_empty())
        .ok_or(NotificationError::MandatoryIeMissing("ueId"))?;
    let uli = object.get("uli");
    let tai = uli.and_then(|u| u.get("tai"));
    let cell_id = non_empty(uli.and_then(|u| u.get("ecgi")), "eci")
        .ok_or(NotificationError::MandatoryIeMissing("uli.ecgi.eci"))?;

    Ok(LocationReport {
        ue_identity: ue_id.to_string(),
        rat: RatType::Eutra,
        plmn_id: plmn_id(tai),
        tac: non_empty(tai, "tac").map(String::from),
        cell_id: cell_id.to_string(),
        time_stamp: None,
        received_at,
    })
}

fn smf_event(
    object: &Map<String, Value>,
    event: &str,
    received_at: DateTime<Utc>,
) -> Result<SmfEvent, NotificationError> {
    let supi = str_field(object, "supi")
        .filter(|s| !s.is_empty())
        .ok_or(NotificationError::MandatoryIeMissing("supi"))?;

    // Sent as a number by most SMFs, as a string by some
    let pdu_session_id = match object.get("pduSessionId") {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
    .ok_or(NotificationError::MandatoryIeMissing("pduSessionId"))?;

    Ok(SmfEvent {
        event_type: event.to_string(),
        ue_identity: supi.to_string(),
        pdu_session_id,
        dnn: str_field(object, "dnn").map(String::from),
        time_stamp: str_field(object, "timeStamp")
            .map(String::from)
            .unwrap_or_else(|| received_at.to_rfc3339()),
        received_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(body: &str) -> Result<NotificationEnvelope, NotificationError> {
        NotificationEnvelope::classify(Some(body))
    }

    #[test]
    fn test_nr_location_report() {
        let envelope = classify(
            r#"{"type":"LOCATION_REPORT","supi":"imsi-1","location":{"nrLocation":{"tai":{"tac":"1"},"ncgi":{"nrCellId":"2"}}}}"#,
        )
        .unwrap();
        let NotificationEnvelope::LocationReport(report) = envelope else {
            panic!("expected location report, got {envelope:?}");
        };
        assert_eq!(report.ue_identity, "imsi-1");
        assert_eq!(report.rat, RatType::Nr);
        assert_eq!(report.tac.as_deref(), Some("1"));
        assert_eq!(report.cell_id, "2");
        assert_eq!(report.plmn_id, None);
    }

    #[test]
    fn test_eutra_location_report_via_event_type() {
        let envelope = classify(
            r#"{"eventType":"LOCATION_REPORT","supi":"imsi-2","timeStamp":"2024-01-01T00:00:00Z",
               "location":{"eutraLocation":{"tai":{"plmnId":{"mcc":"208","mnc":"93"},"tac":"7"},
               "ecgi":{"plmnId":{"mcc":"208","mnc":"93"},"eutraCellId":"abc"}}}}"#,
        )
        .unwrap();
        let NotificationEnvelope::LocationReport(report) = envelope else {
            panic!("expected location report");
        };
        assert_eq!(report.rat, RatType::Eutra);
        assert_eq!(report.cell_id, "abc");
        assert_eq!(report.plmn_id.unwrap().mcc, "208");
        assert_eq!(report.time_stamp.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn test_location_report_missing_ies() {
        assert_eq!(
            classify(r#"{"type":"LOCATION_REPORT","location":{"nrLocation":{"ncgi":{"nrCellId":"2"}}}}"#),
            Err(NotificationError::MandatoryIeMissing("supi"))
        );
        assert_eq!(
            classify(r#"{"type":"LOCATION_REPORT","supi":"imsi-1"}"#),
            Err(NotificationError::MandatoryIeMissing("location.ncgi/ecgi"))
        );
    }

    #[test]
    fn test_legacy_uli() {
        let envelope = classify(
            r#"{"ueId":"imsi-3","uli":{"tai":{"plmnId":{"mcc":"001","mnc":"01"},"tac":"5"},
               "ecgi":{"plmnId":{"mcc":"001","mnc":"01"},"eci":"e1"}}}"#,
        )
        .unwrap();
        let NotificationEnvelope::LocationReport(report) = envelope else {
            panic!("expected location report");
        };
        assert_eq!(report.ue_identity, "imsi-3");
        assert_eq!(report.cell_id, "e1");
        assert_eq!(report.tac.as_deref(), Some("5"));

        assert_eq!(
            classify(r#"{"ueId":"imsi-3","uli":{}}"#),
            Err(NotificationError::MandatoryIeMissing("uli.ecgi.eci"))
        );
    }

    #[test]
    fn test_smf_event() {
        let envelope = classify(
            r#"{"eventType":"PDU_SESSION_RELEASE","supi":"imsi-4","pduSessionId":"5","dnn":"internet"}"#,
        )
        .unwrap();
        let NotificationEnvelope::SmfEvent(event) = envelope else {
            panic!("expected smf event");
        };
        assert_eq!(event.event_type, "PDU_SESSION_RELEASE");
        assert_eq!(event.pdu_session_id, 5);
        assert_eq!(event.dnn.as_deref(), Some("internet"));
        assert!(!event.time_stamp.is_empty());

        assert_eq!(
            classify(r#"{"eventType":"PDU_SESSION_ESTABLISHMENT","supi":"imsi-4"}"#),
            Err(NotificationError::MandatoryIeMissing("pduSessionId"))
        );
    }

    #[test]
    fn test_udm_and_amf_kinds() {
        assert!(matches!(
            classify(r#"{"event":"AMF_REGISTRATION_STATE","supi":"imsi-5"}"#),
            Ok(NotificationEnvelope::UdmEeEvent(UdmEeEvent { ref ue_identity, .. }))
                if ue_identity.as_deref() == Some("imsi-5")
        ));
        assert_eq!(
            classify(r#"{"type":"REACHABILITY_REPORT","supi":"imsi-5"}"#),
            Ok(NotificationEnvelope::AmfReport("REACHABILITY_REPORT".to_string()))
        );
    }

    #[test]
    fn test_fail_closed() {
        for body in [
            "{}",
            "[]",
            "42",
            r#"{"type":"SOMETHING_ELSE"}"#,
            r#"{"eventType":"QOS_CHANGE","supi":"imsi-1","pduSessionId":1}"#,
            r#"{"event":"UNKNOWN_EVENT"}"#,
            r#"{"type":null,"eventType":""}"#,
            r#"{"supi":"imsi-1","location":{"nrLocation":{"ncgi":{"nrCellId":"2"}}}}"#,
        ] {
            assert_eq!(classify(body), Ok(NotificationEnvelope::Unrecognized), "{body}");
        }
    }

    #[test]
    fn test_malformed_bodies() {
        assert_eq!(
            NotificationEnvelope::classify(None),
            Err(NotificationError::MissingBody)
        );
        assert_eq!(classify("  "), Err(NotificationError::MissingBody));
        assert!(matches!(
            classify("{not json"),
            Err(NotificationError::InvalidJson(_))
        ));
    }
}
