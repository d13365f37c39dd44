//! JSON codec for choreography documents
//!
//! One document per choreography: `name`, `loop`, and a `keyframes`
//! array of {comment, speed, accel, delayMs, cascadeMode,
//! cascadeDelayMs, clocks[8][3]{angleH, angleM, dirH, dirM}}. Missing
//! fields take the model defaults; unknown enum names fall back to
//! their defaults; arrays longer than the fixed capacities are
//! truncated. A document that does not parse at all is an error and
//! leaves whatever was loaded before untouched.

use alloc::string::String;

use crate::choreo::model::Choreography;
use crate::choreo::store::StoreError;

/// Serialize a choreography to its document form.
pub fn to_json(choreo: &Choreography) -> Result<String, StoreError> {
    serde_json::to_string(choreo).map_err(|_| StoreError::Io)
}

/// Parse a choreography document.
pub fn from_json(text: &str) -> Result<Choreography, StoreError> {
    serde_json::from_str(text).map_err(|_| StoreError::Corrupt)
}
