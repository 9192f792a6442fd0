//! AES-256-CBC encryption of tenant records with a self-describing marker block.
//!
//! **Integrity is weak.** There is no MAC. A wrong key or corrupted ciphertext
//! is caught only when the decrypted first block no longer starts and ends with
//! `==`, a 32-bit check that a random block passes about once in 4 billion.
//! Do not use this codec for anything an attacker can submit for decryption.

use std::sync::Arc;

use aes::Aes256;
use cbc::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::{distributions::Alphanumeric, Rng};
use thiserror::Error;

use super::kdf::DerivedKey;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// AES block length; also the length of the marker block.
pub const BLOCK_LEN: usize = 16;

/// Length of the random field inside the marker block.
pub const NONCE_LEN: usize = 10;

const ZERO_IV: [u8; BLOCK_LEN] = [0u8; BLOCK_LEN];
const FENCE: &[u8; 2] = b"==";
const PAD_BYTE: u8 = b'=';
const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Errors produced by [`SecretCodec::decrypt`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The input is not valid hex.
    #[error("ciphertext is not valid hex")]
    InvalidHex,

    /// The ciphertext is empty or not a whole number of AES blocks.
    #[error("ciphertext length is not a positive multiple of {BLOCK_LEN} bytes")]
    MalformedCiphertext,

    /// The decrypted marker block is not `==<pad>-<nonce>==`.
    #[error("decryption failed: marker block mismatch")]
    MarkerMismatch,

    /// The record decrypted cleanly but is not UTF-8.
    #[error("decrypted record is not valid UTF-8")]
    InvalidUtf8,
}

/// Encrypts and decrypts opaque strings under the process-wide [`DerivedKey`].
///
/// Output is lowercase hex of
/// `AES-256-CBC(key, iv = 0, "==" || hex(pad) || "-" || nonce(10) || "==" || text || "=" * pad)`.
/// With a fixed IV the random nonce is the only thing separating two
/// encryptions of the same text, and it only changes the first block directly.
#[derive(Clone, Debug)]
pub struct SecretCodec {
    key: Arc<DerivedKey>,
}

impl SecretCodec {
    pub fn new(key: Arc<DerivedKey>) -> Self {
        Self { key }
    }

    /// Encrypt `plaintext`, returning lowercase hex.
    pub fn encrypt(&self, plaintext: &str) -> String {
        let text = plaintext.as_bytes();
        let pad_len = padding_for(text.len());

        let mut buf = Vec::with_capacity(BLOCK_LEN + text.len() + pad_len);
        buf.extend_from_slice(&marker_block(pad_len));
        buf.extend_from_slice(text);
        buf.resize(buf.len() + pad_len, PAD_BYTE);

        let ciphertext = Aes256CbcEnc::new(self.key.as_bytes().into(), &ZERO_IV.into())
            .encrypt_padded_vec_mut::<NoPadding>(&buf);
        hex::encode(ciphertext)
    }

    /// Decrypt hex produced by [`SecretCodec::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidHex`] or [`CodecError::MalformedCiphertext`]
    /// for input that cannot be ciphertext at all, and
    /// [`CodecError::MarkerMismatch`] when the key is wrong or the data was
    /// tampered with (probabilistically, see the module docs).
    pub fn decrypt(&self, ciphertext_hex: &str) -> Result<String, CodecError> {
        let ciphertext = hex::decode(ciphertext_hex).map_err(|_| CodecError::InvalidHex)?;
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
            return Err(CodecError::MalformedCiphertext);
        }

        let buf = Aes256CbcDec::new(self.key.as_bytes().into(), &ZERO_IV.into())
            .decrypt_padded_vec_mut::<NoPadding>(&ciphertext)
            .map_err(|_| CodecError::MalformedCiphertext)?;

        let pad_len = read_marker(&buf[..BLOCK_LEN])?;
        let end = buf
            .len()
            .checked_sub(pad_len)
            .filter(|end| *end >= BLOCK_LEN)
            .ok_or(CodecError::MarkerMismatch)?;

        String::from_utf8(buf[BLOCK_LEN..end].to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }
}

/// Bytes of `=` needed after a `len`-byte text so marker + text + padding is block-aligned.
fn padding_for(len: usize) -> usize {
    (BLOCK_LEN - len % BLOCK_LEN) % BLOCK_LEN
}

fn marker_block(pad_len: usize) -> [u8; BLOCK_LEN] {
    let mut block = [0u8; BLOCK_LEN];
    block[..2].copy_from_slice(FENCE);
    block[2] = HEX_DIGITS[pad_len];
    block[3] = b'-';
    let nonce = rand::thread_rng().sample_iter(&Alphanumeric);
    for (slot, c) in block[4..4 + NONCE_LEN].iter_mut().zip(nonce) {
        *slot = c;
    }
    block[BLOCK_LEN - 2..].copy_from_slice(FENCE);
    block
}

/// Check the fences and return the padding length carried at offset 2.
fn read_marker(block: &[u8]) -> Result<usize, CodecError> {
    if &block[..2] != FENCE || &block[BLOCK_LEN - 2..BLOCK_LEN] != FENCE {
        return Err(CodecError::MarkerMismatch);
    }
    char::from(block[2])
        .to_digit(16)
        .map(|d| d as usize)
        .ok_or(CodecError::MarkerMismatch)
}
