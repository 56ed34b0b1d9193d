//! Signing workflow orchestration on top of the authenticated gateway.
//!
//! Two envelope-based workflows live here:
//! - **Embedded signing** - create an envelope for a signer with a
//!   `clientUserId`, then open a recipient view whose URL is loaded in an
//!   iframe or new tab immediately (it is short-lived and single-use).
//! - **Email signing** - create an envelope for a signer *without* a
//!   `clientUserId`; the signing experience is delivered by the service's
//!   own email, so only the envelope id comes back.
//!
//! The hosted web-form workflow is in [`crate::webforms`].

use crate::client::{Client, ClientError};
use crate::model::{
    CreatedEnvelope, Document, EnvelopeDefinition, Recipients, RecipientViewRequest, SignHere,
    Signer, Status, Tabs,
};
use crate::urlenc::encode_component;

/// Anchor string the signature tab is placed on.
pub const SIGNATURE_ANCHOR: &str = "/sn1/";

/// Placeholder substituted with the created envelope id in return URLs.
pub const ENVELOPE_ID_PLACEHOLDER: &str = "{envelopeId}";

/// A document to send, content already base64-encoded by the caller; this
/// crate performs no file I/O.
#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub base64: String,
    pub name: String,
    /// Defaults to `pdf` when unset.
    pub file_extension: Option<String>,
}

/// The signer of an embedded-signing envelope.
#[derive(Debug, Clone)]
pub struct SignerInput {
    pub name: String,
    pub email: String,
    /// Required for embedded signing; this is what routes the recipient to
    /// an embedded session instead of an email.
    pub client_user_id: String,
}

/// Input for the embedded-signing workflow.
#[derive(Debug, Clone)]
pub struct EmbeddedSigningInput {
    pub email_subject: String,
    pub document: DocumentInput,
    pub signer: SignerInput,
    /// Post-signing redirect; may contain [`ENVELOPE_ID_PLACEHOLDER`].
    pub return_url: String,
    /// Optional heartbeat URL for the signing session.
    pub ping_url: Option<String>,
    pub ping_frequency: Option<String>,
}

/// Result of the embedded-signing workflow.
#[derive(Debug, Clone)]
pub struct EmbeddedSigningResult {
    pub envelope_id: String,
    /// Short-lived, single-use signing session URL.
    pub url: String,
}

/// Substitute the envelope-id placeholder in a return-URL template.
///
/// Templates without the placeholder pass through unchanged.
pub(crate) fn render_return_url(template: &str, envelope_id: &str) -> String {
    if template.contains(ENVELOPE_ID_PLACEHOLDER) {
        template.replace(ENVELOPE_ID_PLACEHOLDER, &encode_component(envelope_id))
    } else {
        template.to_string()
    }
}

/// Build the 1-document / 1-signer envelope both workflows submit, with an
/// anchor-tagged signature tab and routing order 1.
///
/// A `client_user_id` routes the signer for embedded signing; `None` routes
/// them for email signing.
pub fn single_signer_envelope(
    email_subject: impl Into<String>,
    document: &DocumentInput,
    signer_name: impl Into<String>,
    signer_email: impl Into<String>,
    client_user_id: Option<String>,
) -> EnvelopeDefinition {
    EnvelopeDefinition {
        email_subject: Some(email_subject.into()),
        documents: vec![Document {
            document_base64: document.base64.clone(),
            name: document.name.clone(),
            file_extension: document
                .file_extension
                .clone()
                .unwrap_or_else(|| "pdf".to_string()),
            document_id: "1".to_string(),
        }],
        recipients: Recipients {
            signers: vec![Signer {
                name: signer_name.into(),
                email: signer_email.into(),
                recipient_id: "1".to_string(),
                client_user_id,
                routing_order: "1".to_string(),
                tabs: Some(Tabs {
                    sign_here_tabs: vec![SignHere::anchored(SIGNATURE_ANCHOR)],
                }),
            }],
        },
        status: Status::Sent,
    }
}

impl Client {
    /// Create an envelope and an embedded signing session for it.
    ///
    /// The returned URL should be opened immediately; it is not a durable
    /// link.
    pub async fn create_embedded_signing_url(
        &self,
        input: EmbeddedSigningInput,
    ) -> Result<EmbeddedSigningResult, ClientError> {
        if input.signer.client_user_id.trim().is_empty() {
            return Err(ClientError::RecipientShape(
                "embedded signing requires a non-empty clientUserId".to_string(),
            ));
        }

        let definition = single_signer_envelope(
            input.email_subject,
            &input.document,
            input.signer.name.clone(),
            input.signer.email.clone(),
            Some(input.signer.client_user_id.clone()),
        );

        let created = self.create_envelope(&definition).await?;
        let return_url = render_return_url(&input.return_url, &created.envelope_id);

        let view_request = RecipientViewRequest {
            user_name: input.signer.name,
            email: input.signer.email,
            client_user_id: Some(input.signer.client_user_id),
            return_url,
            authentication_method: "none".to_string(),
            ping_url: input.ping_url,
            ping_frequency: input.ping_frequency,
        };

        let view = self
            .create_recipient_view(&created.envelope_id, &view_request)
            .await?;
        tracing::info!(envelope_id = %created.envelope_id, "created embedded signing session");

        Ok(EmbeddedSigningResult {
            envelope_id: created.envelope_id,
            url: view.url,
        })
    }

    /// Send an envelope for email (remote) signing.
    ///
    /// Status is forced to `sent`; the result carries only the envelope id
    /// because the signing experience is delivered out-of-band.
    pub async fn send_for_email_signing(
        &self,
        mut definition: EnvelopeDefinition,
    ) -> Result<CreatedEnvelope, ClientError> {
        if definition
            .recipients
            .signers
            .iter()
            .any(|s| s.client_user_id.is_some())
        {
            return Err(ClientError::RecipientShape(
                "email signing signers must not carry a clientUserId".to_string(),
            ));
        }

        definition.status = Status::Sent;
        let created = self.create_envelope(&definition).await?;
        tracing::info!(envelope_id = %created.envelope_id, "envelope sent for email signing");
        Ok(created)
    }
}
