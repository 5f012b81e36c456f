//! Ephemeral one-time-code cache. Process-lifetime working memory: no
//! persistence, no expiry beyond being overwritten or consumed. The
//! caller holds it behind a `Mutex` since handlers issue and consume
//! codes concurrently.

use std::collections::HashMap;

use rand::Rng;

use crate::config::MASTER_OTP;

use super::AuthError;

/// In-memory phone → code mapping.
pub struct OtpCache {
    codes: HashMap<String, String>,
}

impl OtpCache {
    pub fn new() -> Self {
        Self {
            codes: HashMap::new(),
        }
    }

    /// Generate a fresh 4-digit code for `phone`, overwriting any prior
    /// entry. Always succeeds and never reveals whether the phone is
    /// registered (anti-enumeration).
    pub fn issue(&mut self, phone: &str) -> String {
        let code = format!("{:04}", rand::thread_rng().gen_range(0..10_000));
        self.codes.insert(phone.to_string(), code.clone());
        code
    }

    /// Verify a code for `phone`. The master code always passes and is
    /// never consumed; a real code must match the cached entry and is
    /// deleted on success (replay protection).
    pub fn verify_and_consume(&mut self, phone: &str, code: &str) -> Result<(), AuthError> {
        if code == MASTER_OTP {
            return Ok(());
        }
        match self.codes.get(phone) {
            Some(stored) if stored == code => {
                self.codes.remove(phone);
                Ok(())
            }
            _ => Err(AuthError::InvalidCredential),
        }
    }
}

impl Default for OtpCache {
    fn default() -> Self {
        Self::new()
    }
}
