/// Packs up to the first 8 bytes of `key` most-significant-byte-first. Bytes
/// past the 8th don't contribute, and shorter keys are zero-padded on the
/// right, so comparing scores agrees with comparing the keys' leading bytes.
pub fn key_score(key: &[u8]) -> u64 {
    let mut buf = [0_u8; 8];
    let n = key.len().min(buf.len());
    buf[..n].copy_from_slice(&key[..n]);
    u64::from_be_bytes(buf)
}

// Field order matters: the derived Ord compares the score first and only
// falls back to the full key when the scores collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct ScoredKey<'a> {
    score: u64,
    key: &'a [u8],
}

impl<'a> ScoredKey<'a> {
    pub(crate) fn new(key: &'a [u8]) -> Self {
        ScoredKey {
            score: key_score(key),
            key,
        }
    }

    pub(crate) fn with_score(score: u64, key: &'a [u8]) -> Self {
        ScoredKey { score, key }
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::{key_score, ScoredKey};

    #[test]
    fn test_key_score() {
        assert_eq!(key_score(b""), 0);
        assert_eq!(key_score(b"a"), 0x61_u64 << 56);
        assert_eq!(key_score(b"ab"), (0x61_u64 << 56) | (0x62_u64 << 48));
        assert_eq!(
            key_score(b"abcdefgh"),
            u64::from_be_bytes(*b"abcdefgh"),
        );
        // Only the first 8 bytes count.
        assert_eq!(key_score(b"abcdefghXYZ"), key_score(b"abcdefgh"));
    }

    #[test]
    fn test_score_is_order_preserving() {
        let mut keys: Vec<&[u8]> = vec![
            &b""[..],
            &b"\x00"[..],
            &b"a"[..],
            &b"aa"[..],
            &b"aaa"[..],
            &b"ab"[..],
            &b"b"[..],
            &b"zzzz"[..],
            &b"\xff"[..],
        ];
        keys.sort();
        for w in keys.windows(2) {
            assert!(key_score(w[0]) <= key_score(w[1]), "{:?} vs {:?}", w[0], w[1]);
        }
    }

    #[test]
    fn test_compare_falls_back_to_key() {
        // Same score: "a" and "a\0" both pack to 0x61 followed by zeros.
        let a = ScoredKey::new(b"a");
        let a0 = ScoredKey::new(b"a\x00");
        assert_eq!(key_score(b"a"), key_score(b"a\x00"));
        assert_eq!(a.cmp(&a0), Ordering::Less);

        let long1 = ScoredKey::new(b"prefix__one");
        let long2 = ScoredKey::new(b"prefix__two");
        assert_eq!(long1.cmp(&long2), Ordering::Less);
        assert_eq!(long2.cmp(&long1), Ordering::Greater);
        assert_eq!(long1.cmp(&ScoredKey::new(b"prefix__one")), Ordering::Equal);
    }

    #[test]
    fn test_compare_matches_lexicographic() {
        let keys: Vec<Vec<u8>> = (0..200_u32)
            .map(|i| format!("k{}", i * 7919 % 1000).into_bytes())
            .chain([b"".to_vec(), b"k".to_vec(), b"k1000000000".to_vec()])
            .collect();
        for a in &keys {
            for b in &keys {
                assert_eq!(
                    ScoredKey::new(a).cmp(&ScoredKey::new(b)),
                    a.cmp(b),
                    "{:?} vs {:?}",
                    a,
                    b
                );
            }
        }
    }
}
