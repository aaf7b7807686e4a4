//! JSON payloads exchanged with the upstream address API and the proxy.

pub mod addresszip;
pub mod proxytoken;
pub mod searchcode;
pub mod token;

pub use addresszip::{Address, AddressZipRequest, AddressZipResponse, MatchLevel};
pub use proxytoken::{ProxyTokenRequest, ProxyTokenResponse};
pub use searchcode::{ChoikiType, SearchAddress, SearchCodeRequest, SearchCodeResponse, SearchType};
pub use token::{TokenRequest, TokenResponse};

/// `bool` carried on the wire as `0` / `1`.
pub(crate) mod bool_int {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(u8::deserialize(deserializer)? != 0)
    }
}
