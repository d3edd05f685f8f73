//! Content fingerprints using blake3.
//!
//! # Usage
//!
//! ```ignore
//! use crate::utils::hash;
//!
//! let fp = hash::fingerprint("export default 1"); // -> "a1b2c3d4e5f60718"
//! ```

/// Full blake3 digest of `data` as lowercase hex.
pub fn digest<T: AsRef<[u8]> + ?Sized>(data: &T) -> String {
    hex::encode(blake3::hash(data.as_ref()).as_bytes())
}

/// Short 16-char fingerprint, enough to tell two revisions of a file apart.
#[inline]
pub fn fingerprint<T: AsRef<[u8]> + ?Sized>(data: &T) -> String {
    let hash = blake3::hash(data.as_ref());
    hex::encode(&hash.as_bytes()[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(fingerprint("abc"), fingerprint("abc"));
        assert_ne!(fingerprint("abc"), fingerprint("abd"));
        assert_eq!(fingerprint("abc").len(), 16);
    }

    #[test]
    fn test_digest_prefix_matches_fingerprint() {
        let full = digest("const a = 1;");
        assert_eq!(full.len(), 64);
        assert!(full.starts_with(&fingerprint("const a = 1;")));
    }
}
