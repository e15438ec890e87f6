/// Identifies equivalent states so that separate paths can share one search node.
///
/// Equal states must produce equal hashes. Collisions are not detected.
pub trait TranspositionHash {
    fn transposition_hash(&self) -> u64;
}

macro_rules! impl_transposition_hash {
    ($($t:ty),*) => {
        $(
            impl TranspositionHash for $t {
                fn transposition_hash(&self) -> u64 {
                    *self as u64
                }
            }
        )*
    };
}

impl_transposition_hash!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl<T: TranspositionHash> TranspositionHash for [T] {
    fn transposition_hash(&self) -> u64 {
        // FNV-1a over the element hashes.
        self.iter().fold(0xcbf2_9ce4_8422_2325, |hash, item| {
            (hash ^ item.transposition_hash()).wrapping_mul(0x0100_0000_01b3)
        })
    }
}

impl<T: TranspositionHash, const N: usize> TranspositionHash for [T; N] {
    fn transposition_hash(&self) -> u64 {
        self.as_slice().transposition_hash()
    }
}

impl<T: TranspositionHash> TranspositionHash for Vec<T> {
    fn transposition_hash(&self) -> u64 {
        self.as_slice().transposition_hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_hash_is_identity() {
        assert_eq!(42usize.transposition_hash(), 42);
    }

    #[test]
    fn test_sequence_hash_depends_on_order() {
        assert_eq!(vec![1u8, 2, 3].transposition_hash(), [1u8, 2, 3].transposition_hash());
        assert_ne!([1u8, 2, 3].transposition_hash(), [3u8, 2, 1].transposition_hash());
    }
}
