//! AES-256 in counter mode.

use ::aes::Aes256;
use ::ctr::{
    Ctr128BE,
    cipher::{KeyIvInit, StreamCipher},
};

use super::Cipher;
use crate::error::CryptoError;

/// AES-256 key length (32 bytes)
const AES256_KEY_SIZE: usize = 32;

/// AES block size, used as the CTR initial counter block (16 bytes)
const AES_BLOCK_SIZE: usize = 16;

/// CTR-AES256 with the whole 128-bit counter block incremented big-endian.
///
/// The 48-byte record key is split as `key (32) ‖ iv (16)`.
pub struct Aes256Ctr {
    inner: Ctr128BE<Aes256>,
}

impl Cipher for Aes256Ctr {
    const KEY_SIZE: usize = AES256_KEY_SIZE + AES_BLOCK_SIZE;
    const NAME: &'static str = "aes256-ctr";

    fn new(key: &[u8]) -> Result<Self, CryptoError> {
        CryptoError::check_key_len(Self::NAME, Self::KEY_SIZE, key)?;

        let (key, iv) = key.split_at(AES256_KEY_SIZE);
        let Ok(inner) = Ctr128BE::<Aes256>::new_from_slices(key, iv) else {
            unreachable!("aes256 key and iv lengths checked above");
        };

        Ok(Self { inner })
    }

    fn apply_keystream(&mut self, buf: &mut [u8]) {
        self.inner.apply_keystream(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_size_is_48() {
        assert_eq!(Aes256Ctr::KEY_SIZE, 48);
    }

    #[test]
    fn nist_sp800_38a_ctr_aes256_encrypt() {
        // SP 800-38A F.5.5, first two blocks
        let mut key =
            hex::decode("603deb1015ca71be2b73aef0857d77811f352c073b6108d72d9810a30914dff4")
                .unwrap();
        key.extend(hex::decode("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff").unwrap());

        let mut buf = hex::decode(
            "6bc1bee22e409f96e93d7e117393172aae2d8a571e03ac9c9eb76fac45af8e51",
        )
        .unwrap();
        Aes256Ctr::new(&key).unwrap().apply_keystream(&mut buf);

        let expected = hex::decode(
            "601ec313775789a5b7a7f504bbf3d228f443e3ca4d62b59aca84e990cacaf5c5",
        )
        .unwrap();
        assert_eq!(buf, expected);
    }
}
