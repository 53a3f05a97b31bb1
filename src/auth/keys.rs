//! RSA signing keys for forged test credentials.

use jsonwebtoken::{DecodingKey, EncodingKey};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;

use crate::error::{HarnessError, Result};

/// In-memory RSA keypair. Never written to disk.
pub struct SigningKeyPair {
    bits: usize,
    private_key_pem: String,
    public_key_pem: String,
    encoding_key: EncodingKey,
}

impl SigningKeyPair {
    pub fn generate(bits: usize) -> Result<Self> {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| HarnessError::KeyGeneration(format!("{} bit RSA key: {}", bits, e)))?;
        let public_key = RsaPublicKey::from(&private_key);

        let private_key_pem = private_key
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| HarnessError::KeyGeneration(e.to_string()))?
            .as_str()
            .to_owned();
        let public_key_pem = public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| HarnessError::KeyGeneration(e.to_string()))?;

        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| HarnessError::KeyGeneration(e.to_string()))?;

        tracing::debug!(bits, "Generated signing keypair");

        Ok(Self {
            bits,
            private_key_pem,
            public_key_pem,
            encoding_key,
        })
    }

    pub fn bits(&self) -> usize {
        self.bits
    }

    /// PKCS#1 PEM (`BEGIN RSA PRIVATE KEY`)
    pub fn private_key_pem(&self) -> &str {
        &self.private_key_pem
    }

    /// SPKI PEM (`BEGIN PUBLIC KEY`), the stringified public key handed to the service
    pub fn public_key_pem(&self) -> &str {
        &self.public_key_pem
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    /// Key material a service would use to check harness-issued tokens
    pub fn decoding_key(&self) -> Result<DecodingKey> {
        DecodingKey::from_rsa_pem(self.public_key_pem.as_bytes())
            .map_err(|e| HarnessError::KeyGeneration(e.to_string()))
    }
}

impl fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeyPair")
            .field("bits", &self.bits)
            .field("public_key_pem", &self.public_key_pem)
            .finish_non_exhaustive()
    }
}
