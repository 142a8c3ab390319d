//! Peer identity certificates.
//!
//! The pipeline only needs two capabilities from a PKI: mint a self-signed
//! root certificate for a principal, and recover the private key with the
//! password it was protected under. [`RcgenPki`] provides both.
//!
//! ## Key protection format
//!
//! The PKCS#8 private key is sealed with AES-256-GCM. The key is derived from
//! the password with salted, iterated SHA-256. The stored form is hex of
//! `salt (16) || nonce (12) || ciphertext+tag`.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KDF_ROUNDS: u32 = 10_000;

/// Errors raised by PKI operations
#[derive(Debug, thiserror::Error)]
pub enum PkiError {
    #[error("certificate generation failed: {0}")]
    Generation(String),

    #[error("private key encryption failed")]
    Encryption,

    #[error("encrypted private key is malformed")]
    MalformedKey,

    #[error("wrong password or corrupted private key")]
    Decryption,
}

/// Root certificate plus its password-protected private key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// PEM encoded self-signed certificate
    pub certificate: String,
    /// Hex encoded encrypted PKCS#8 private key
    pub encrypted_private_key: String,
}

/// PKI collaborator used during normalization.
pub trait Pki {
    fn mint_self_signed(&self, principal: &str, password: &[u8]) -> Result<Credentials, PkiError>;

    fn decrypt_private_key(
        &self,
        encrypted: &str,
        password: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, PkiError>;
}

/// [`Pki`] backed by `rcgen` and AES-256-GCM.
#[derive(Debug, Default, Clone, Copy)]
pub struct RcgenPki;

impl Pki for RcgenPki {
    fn mint_self_signed(&self, principal: &str, password: &[u8]) -> Result<Credentials, PkiError> {
        use rcgen::{CertificateParams, DnType, DnValue, KeyPair};

        let mut params = CertificateParams::default();
        params.distinguished_name.push(
            DnType::CommonName,
            DnValue::Utf8String(principal.to_string()),
        );
        params.distinguished_name.push(
            DnType::OrganizationalUnitName,
            DnValue::Utf8String("overlay peer".to_string()),
        );

        let key_pair = KeyPair::generate().map_err(|e| PkiError::Generation(e.to_string()))?;
        let cert = params
            .self_signed(&key_pair)
            .map_err(|e| PkiError::Generation(e.to_string()))?;

        let key_der = Zeroizing::new(key_pair.serialize_der());
        let encrypted_private_key = seal(&key_der, password)?;

        Ok(Credentials {
            certificate: cert.pem(),
            encrypted_private_key,
        })
    }

    fn decrypt_private_key(
        &self,
        encrypted: &str,
        password: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, PkiError> {
        open(encrypted, password)
    }
}

fn derive_key(password: &[u8], salt: &[u8]) -> Zeroizing<[u8; 32]> {
    let mut digest: [u8; 32] = Sha256::new()
        .chain_update(salt)
        .chain_update(password)
        .finalize()
        .into();
    for _ in 1..KDF_ROUNDS {
        digest = Sha256::new()
            .chain_update(digest)
            .chain_update(password)
            .finalize()
            .into();
    }
    Zeroizing::new(digest)
}

fn seal(plaintext: &[u8], password: &[u8]) -> Result<String, PkiError> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce_bytes = [0u8; NONCE_LEN];
    let mut rng = rand::thread_rng();
    rng.fill(&mut salt);
    rng.fill(&mut nonce_bytes);

    let key = derive_key(password, &salt);
    let cipher = Aes256Gcm::new_from_slice(&key[..]).map_err(|_| PkiError::Encryption)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|_| PkiError::Encryption)?;

    let mut sealed = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&salt);
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);
    Ok(hex::encode(sealed))
}

fn open(sealed_hex: &str, password: &[u8]) -> Result<Zeroizing<Vec<u8>>, PkiError> {
    let sealed = hex::decode(sealed_hex.trim()).map_err(|_| PkiError::MalformedKey)?;
    if sealed.len() <= SALT_LEN + NONCE_LEN {
        return Err(PkiError::MalformedKey);
    }
    let (salt, rest) = sealed.split_at(SALT_LEN);
    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);

    let key = derive_key(password, salt);
    let cipher = Aes256Gcm::new_from_slice(&key[..]).map_err(|_| PkiError::Decryption)?;
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| PkiError::Decryption)
}
