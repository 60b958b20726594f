//! Frame admission for the push relay.

use talio_events::{FrameError, PushEnvelope};

/// Parse, decode and validate an inbound frame.
///
/// Only frames that pass are relayed; the original text is forwarded
/// unchanged so receivers see exactly what the sender published.
pub fn admit_frame(text: &str) -> Result<PushEnvelope, FrameError> {
    let envelope = PushEnvelope::parse(text)?;
    envelope.decode()?.validate()?;
    Ok(envelope)
}
