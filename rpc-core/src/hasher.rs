//! Storage hashers, selected by the names chain metadata declares them with.

use core::{fmt, str::FromStr};
use sp_core::{blake2_128, blake2_256, twox_128, twox_256, twox_64};

/// A hashing algorithm a storage map may use for its keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageHasher {
    Blake2_128,
    Blake2_256,
    /// `blake2_128(key) ++ key`
    Blake2_128Concat,
    Twox128,
    Twox256,
    /// `twox_64(key) ++ key`
    Twox64Concat,
    Identity,
}

/// The metadata named a hasher this crate does not know about.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported storage hasher `{0}`")]
pub struct UnknownHasher(pub String);

impl FromStr for StorageHasher {
    type Err = UnknownHasher;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "Blake2_128" => Ok(Self::Blake2_128),
            "Blake2_256" => Ok(Self::Blake2_256),
            "Blake2_128Concat" => Ok(Self::Blake2_128Concat),
            "Twox128" => Ok(Self::Twox128),
            "Twox256" => Ok(Self::Twox256),
            "Twox64Concat" => Ok(Self::Twox64Concat),
            "Identity" => Ok(Self::Identity),
            other => Err(UnknownHasher(other.to_string())),
        }
    }
}

impl fmt::Display for StorageHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl StorageHasher {
    /// Hash `data`, appending the input for the `Concat` variants.
    pub fn hash(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Blake2_128 => blake2_128(data).to_vec(),
            Self::Blake2_256 => blake2_256(data).to_vec(),
            Self::Blake2_128Concat => [blake2_128(data).as_slice(), data].concat(),
            Self::Twox128 => twox_128(data).to_vec(),
            Self::Twox256 => twox_256(data).to_vec(),
            Self::Twox64Concat => [twox_64(data).as_slice(), data].concat(),
            Self::Identity => data.to_vec(),
        }
    }
}

/// Hash `data` with the algorithm called `name` in chain metadata.
pub fn hash_by_name(data: &[u8], name: &str) -> Result<Vec<u8>, UnknownHasher> {
    Ok(name.parse::<StorageHasher>()?.hash(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use pretty_assertions::assert_eq;

    #[test]
    fn twox128_matches_known_pallet_prefixes() {
        assert_eq!(
            hash_by_name(b"System", "Twox128").unwrap(),
            hex!("26aa394eea5630e07c48ae0c9558cef7").to_vec()
        );
        assert_eq!(
            hash_by_name(b"Number", "Twox128").unwrap(),
            hex!("02a5c1b19ab7a04f536c519aca4983ac").to_vec()
        );
    }

    #[test]
    fn concat_hashers_keep_the_input() {
        let key = [7u8; 32];
        let hashed = StorageHasher::Twox64Concat.hash(&key);
        assert_eq!(hashed.len(), 8 + 32);
        assert_eq!(&hashed[..8], twox_64(&key).as_slice());
        assert_eq!(&hashed[8..], key.as_slice());

        let hashed = StorageHasher::Blake2_128Concat.hash(&key);
        assert_eq!(hashed.len(), 16 + 32);
        assert_eq!(&hashed[16..], key.as_slice());
    }

    #[test]
    fn identity_returns_input() {
        assert_eq!(StorageHasher::Identity.hash(b"abc"), b"abc".to_vec());
    }

    #[test]
    fn unknown_hasher_is_an_error() {
        assert_eq!(
            hash_by_name(b"x", "Keccak"),
            Err(UnknownHasher("Keccak".to_string()))
        );
    }

    #[test]
    fn names_round_trip_through_display() {
        for hasher in [
            StorageHasher::Blake2_128,
            StorageHasher::Blake2_256,
            StorageHasher::Blake2_128Concat,
            StorageHasher::Twox128,
            StorageHasher::Twox256,
            StorageHasher::Twox64Concat,
            StorageHasher::Identity,
        ] {
            assert_eq!(hasher.to_string().parse::<StorageHasher>(), Ok(hasher));
        }
    }
}
