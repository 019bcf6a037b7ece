use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use xsalsa20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use xsalsa20poly1305::{Key, Nonce, XSalsa20Poly1305, NONCE_SIZE};

pub fn blake3_hash(bytes: &[u8]) -> [u8; 32] {
    *blake3::hash(bytes).as_bytes()
}

/// Secretbox over an opaque payload. The wire form is base64(nonce || ciphertext);
/// the key is derived from the shared salt, so both sides only exchange the salt.
pub fn encrypt(plaintext: &str, salt: &str) -> Result<String> {
    let key = blake3_hash(salt.as_bytes());
    let cipher = XSalsa20Poly1305::new(Key::from_slice(&key));
    let nonce = XSalsa20Poly1305::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|e| anyhow!("encryption failed: {}", e))?;

    let mut out = nonce.to_vec();
    out.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(out))
}

pub fn decrypt(token: &str, salt: &str) -> Result<String> {
    let raw = STANDARD.decode(token)?;
    if raw.len() <= NONCE_SIZE {
        return Err(anyhow!("token too short"));
    }

    let key = blake3_hash(salt.as_bytes());
    let cipher = XSalsa20Poly1305::new(Key::from_slice(&key));
    let nonce = Nonce::from_slice(&raw[..NONCE_SIZE]);

    let plaintext = cipher
        .decrypt(nonce, &raw[NONCE_SIZE..])
        .map_err(|e| anyhow!("decryption failed: {}", e))?;

    Ok(String::from_utf8(plaintext)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let token = encrypt("{\"user_id\":\"abc\"}", "salt").unwrap();
        assert_eq!(decrypt(&token, "salt").unwrap(), "{\"user_id\":\"abc\"}");
    }

    #[test]
    fn wrong_salt_rejected() {
        let token = encrypt("payload", "salt-a").unwrap();
        assert!(decrypt(&token, "salt-b").is_err());
    }

    #[test]
    fn garbage_rejected() {
        assert!(decrypt("not-base64!!", "salt").is_err());
        assert!(decrypt("", "salt").is_err());
    }
}
