// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Digest engine used to derive hashed filenames

use base64::{engine::general_purpose, Engine as _};
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::fmt;
use std::str::FromStr;

use crate::{HashPasteError, Result};

/// Hash functions available for naming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
    /// Kept for existing vaults only; not collision-safe.
    Md5,
}

/// Binary-to-text encoding of a digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodeDigest {
    Hex,
    Base64url,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 4] = [Self::Sha256, Self::Sha384, Self::Sha512, Self::Md5];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
            Self::Md5 => "md5",
        }
    }

    fn digest(&self, input: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(input).to_vec(),
            Self::Sha384 => Sha384::digest(input).to_vec(),
            Self::Sha512 => Sha512::digest(input).to_vec(),
            Self::Md5 => Md5::digest(input).to_vec(),
        }
    }
}

impl EncodeDigest {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hex => "hex",
            Self::Base64url => "base64url",
        }
    }

    fn encode(&self, bytes: &[u8]) -> String {
        match self {
            Self::Hex => hex::encode(bytes),
            Self::Base64url => general_purpose::URL_SAFE_NO_PAD.encode(bytes),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashPasteError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            "md5" => Ok(Self::Md5),
            other => Err(HashPasteError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl FromStr for EncodeDigest {
    type Err = HashPasteError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hex" => Ok(Self::Hex),
            "base64url" => Ok(Self::Base64url),
            other => Err(HashPasteError::UnsupportedEncoding(other.to_string())),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for EncodeDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Digest `input` and encode it, with any `=` padding stripped.
///
/// Text input is hashed as its UTF-8 bytes.
pub fn hash(algorithm: HashAlgorithm, encoding: EncodeDigest, input: impl AsRef<[u8]>) -> String {
    let digest = algorithm.digest(input.as_ref());
    encoding.encode(&digest).replace('=', "")
}

/// Same as [`hash`], taking the algorithm and encoding by name.
pub fn hash_named(algorithm: &str, encoding: &str, input: impl AsRef<[u8]>) -> Result<String> {
    let algorithm: HashAlgorithm = algorithm.parse()?;
    let encoding: EncodeDigest = encoding.parse()?;
    Ok(hash(algorithm, encoding, input))
}
