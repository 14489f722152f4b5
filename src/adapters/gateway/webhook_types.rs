//! Stripe-style wire types for webhook handling.
//!
//! These types represent provider API objects as they arrive in webhook
//! payloads and API responses. Parsed here, converted to port types, and
//! never leaked past the gateway adapter.

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════════
// Signature Parsing
// ════════════════════════════════════════════════════════════════════════════════

/// Error parsing the Gateway-Signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureParseError {
    /// Header is empty or missing.
    MissingHeader,
    /// Missing timestamp component (t=...).
    MissingTimestamp,
    /// Missing v1 signature component.
    MissingV1Signature,
    /// Invalid timestamp format.
    InvalidTimestamp,
    /// Invalid signature format (not valid hex).
    InvalidSignatureFormat,
}

impl std::fmt::Display for SignatureParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "Missing signature header"),
            Self::MissingTimestamp => write!(f, "Missing timestamp (t=) in signature"),
            Self::MissingV1Signature => write!(f, "Missing v1 signature in header"),
            Self::InvalidTimestamp => write!(f, "Invalid timestamp format"),
            Self::InvalidSignatureFormat => write!(f, "Invalid signature format (not valid hex)"),
        }
    }
}

impl std::error::Error for SignatureParseError {}

/// Parsed signature header components.
///
/// The header format is: `t=timestamp,v1=signature[,v0=legacy_signature]`
#[derive(Debug, Clone)]
pub struct SignatureHeader {
    /// Unix timestamp when the provider generated the event.
    pub timestamp: i64,

    /// Primary v1 signature (HMAC-SHA256, hex-encoded).
    pub v1_signature: Vec<u8>,
}

impl SignatureHeader {
    /// Parse a signature header into components.
    pub fn parse(header: &str) -> Result<Self, SignatureParseError> {
        if header.is_empty() {
            return Err(SignatureParseError::MissingHeader);
        }

        let mut timestamp: Option<i64> = None;
        let mut v1_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or(SignatureParseError::MissingTimestamp)?;

            match key.trim() {
                "t" => {
                    timestamp = Some(
                        value
                            .trim()
                            .parse()
                            .map_err(|_| SignatureParseError::InvalidTimestamp)?,
                    );
                }
                "v1" => {
                    v1_signature = Some(
                        hex_decode(value.trim())
                            .ok_or(SignatureParseError::InvalidSignatureFormat)?,
                    );
                }
                _ => {
                    // Ignore unknown fields for forward compatibility
                }
            }
        }

        Ok(Self {
            timestamp: timestamp.ok_or(SignatureParseError::MissingTimestamp)?,
            v1_signature: v1_signature.ok_or(SignatureParseError::MissingV1Signature)?,
        })
    }
}

/// Decode a hex string to bytes.
fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.trim();
    if hex.len() % 2 != 0 {
        return None;
    }

    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for i in (0..hex.len()).step_by(2) {
        let byte = u8::from_str_radix(&hex[i..i + 2], 16).ok()?;
        bytes.push(byte);
    }
    Some(bytes)
}

/// Encode bytes to hex string. Production code only verifies signatures;
/// tests need this to forge them.
#[cfg(test)]
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// ════════════════════════════════════════════════════════════════════════════════
// Provider Wire Types
// ════════════════════════════════════════════════════════════════════════════════

/// Raw webhook event as received from the provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderWebhookEvent {
    /// Unique event identifier (evt_...).
    pub id: String,

    /// Event type (e.g., "payment_intent.succeeded").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Unix timestamp when the event was created.
    pub created: i64,

    /// Event payload containing the affected object.
    pub data: ProviderEventData,

    /// Whether this is a live or test event.
    #[serde(default)]
    pub livemode: bool,
}

/// Event data container.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderEventData {
    /// The object affected by this event.
    pub object: serde_json::Value,
}

/// Provider PaymentIntent object, as embedded in events and API responses.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderPaymentIntent {
    /// Unique intent identifier (pi_...).
    pub id: String,

    /// Intent status (requires_payment_method, succeeded, canceled, ...).
    pub status: String,

    /// Client secret for the buyer-facing confirmation flow.
    pub client_secret: Option<String>,

    /// Last payment error, present on failed intents.
    pub last_payment_error: Option<ProviderPaymentError>,

    /// Custom metadata attached at creation.
    #[serde(default)]
    pub metadata: std::collections::HashMap<String, String>,
}

/// Payment error details on a failed intent.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderPaymentError {
    /// Provider error code ("card_declined", ...).
    pub code: Option<String>,

    /// Human-readable decline message.
    pub message: Option<String>,
}

/// Provider Transfer object, returned from payout calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderTransfer {
    /// Unique transfer identifier.
    pub id: String,

    /// Destination account reference.
    pub destination: Option<String>,
}

/// Provider Refund object, returned from refund calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderRefund {
    /// Unique refund identifier (re_...).
    pub id: String,

    /// Refund status (succeeded, pending, failed).
    pub status: String,

    /// Failure reason, set when status is "failed".
    pub failure_reason: Option<String>,
}
