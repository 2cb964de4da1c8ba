//! Content naming.
//!
//! Blobs are named by the lowercase hex SHA-256 of their content, so equal
//! content always maps to the same name.

use std::io::{self, Read};

use sha2::{Digest, Sha256};

/// Hash everything `reader` yields.
pub fn content_name<R: Read + ?Sized>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    io::copy(reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

pub fn content_name_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
