//! Wire data model for the e-signature REST API.
//!
//! Field names serialize in the camelCase form the remote API expects.
//! Only the structural subset the workflows need is modeled; unknown
//! response fields are ignored on deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states reported for an envelope.
///
/// Observed transitions are `created → sent → delivered → completed |
/// declined | voided`; states this crate does not know about pass through
/// as [`Status::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Created,
    Sent,
    Delivered,
    Completed,
    Declined,
    Voided,
    Other(String),
}

impl Status {
    /// Wire form of the status.
    pub fn as_str(&self) -> &str {
        match self {
            Status::Created => "created",
            Status::Sent => "sent",
            Status::Delivered => "delivered",
            Status::Completed => "completed",
            Status::Declined => "declined",
            Status::Voided => "voided",
            Status::Other(s) => s,
        }
    }
}

impl From<String> for Status {
    fn from(value: String) -> Self {
        match value.as_str() {
            "created" => Status::Created,
            "sent" => Status::Sent,
            "delivered" => Status::Delivered,
            "completed" => Status::Completed,
            "declined" => Status::Declined,
            "voided" => Status::Voided,
            _ => Status::Other(value),
        }
    }
}

impl From<Status> for String {
    fn from(value: Status) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A document within an envelope, content already base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub document_base64: String,
    pub name: String,
    pub file_extension: String,
    pub document_id: String,
}

/// A signature tab. The anchored form places the tab wherever the anchor
/// string occurs in the document text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignHere {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_units: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_x_offset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_y_offset: Option<String>,
}

impl SignHere {
    /// Anchor-positioned tab in pixel units with zero offsets.
    pub fn anchored(anchor: impl Into<String>) -> Self {
        Self {
            anchor_string: Some(anchor.into()),
            anchor_units: Some("pixels".to_string()),
            anchor_x_offset: Some("0".to_string()),
            anchor_y_offset: Some("0".to_string()),
        }
    }
}

/// Tab placements for a signer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tabs {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sign_here_tabs: Vec<SignHere>,
}

/// A signing recipient.
///
/// A `client_user_id` routes the signer to an embedded session; leaving it
/// unset routes them to an emailed signing notification. The two shapes are
/// mutually exclusive by protocol contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signer {
    pub name: String,
    pub email: String,
    pub recipient_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_user_id: Option<String>,
    pub routing_order: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tabs: Option<Tabs>,
}

/// The recipient set of an envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipients {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signers: Vec<Signer>,
}

/// An envelope ready to submit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_subject: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub recipients: Recipients,
    pub status: Status,
}

/// Request body for a recipient (embedded signing) view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientViewRequest {
    pub user_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_user_id: Option<String>,
    /// Post-signing redirect; the orchestrator substitutes the
    /// `{envelopeId}` placeholder before submitting.
    pub return_url: String,
    pub authentication_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ping_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ping_frequency: Option<String>,
}

/// Response to envelope creation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEnvelope {
    pub envelope_id: String,
}

/// Response to a recipient-view request: a short-lived, single-use signing
/// session link meant to be opened immediately.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientView {
    pub url: String,
}

/// Envelope metadata returned by the status query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeStatus {
    pub envelope_id: String,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_changed_date_time: Option<DateTime<Utc>>,
}
