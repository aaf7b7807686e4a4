use serde::{Deserialize, Serialize};

use crate::models::bool_int;

/// Filters for the address → zip code lookup. Empty strings mean "no filter".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressZipRequest {
    pub pref_code: String,
    pub pref_name: String,
    pub pref_kana: String,
    pub pref_roma: String,
    pub city_code: String,
    pub city_name: String,
    pub city_kana: String,
    pub city_roma: String,
    pub town_name: String,
    pub town_kana: String,
    pub town_roma: String,
    #[serde(rename = "freeword")]
    pub free_word: String,
    #[serde(rename = "flg_getcity", with = "bool_int")]
    pub flg_get_city: bool,
    #[serde(rename = "flg_getpref", with = "bool_int")]
    pub flg_get_pref: bool,
    pub page: u32,
    pub limit: u32,
}

impl Default for AddressZipRequest {
    fn default() -> Self {
        Self {
            pref_code: String::new(),
            pref_name: String::new(),
            pref_kana: String::new(),
            pref_roma: String::new(),
            city_code: String::new(),
            city_name: String::new(),
            city_kana: String::new(),
            city_roma: String::new(),
            town_name: String::new(),
            town_kana: String::new(),
            town_roma: String::new(),
            free_word: String::new(),
            flg_get_city: false,
            flg_get_pref: false,
            page: 1,
            limit: 1000,
        }
    }
}

/// How deep the lookup matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MatchLevel {
    Prefecture,
    City,
    Town,
}

impl TryFrom<u8> for MatchLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Prefecture),
            2 => Ok(Self::City),
            3 => Ok(Self::Town),
            other => Err(format!("unknown match level {}", other)),
        }
    }
}

impl From<MatchLevel> for u8 {
    fn from(level: MatchLevel) -> Self {
        match level {
            MatchLevel::Prefecture => 1,
            MatchLevel::City => 2,
            MatchLevel::Town => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub zip_code: String,
    pub pref_code: String,
    pub pref_name: String,
    pub pref_kana: String,
    pub pref_roma: String,
    pub city_code: String,
    pub city_name: String,
    pub city_kana: String,
    pub city_roma: String,
    pub town_name: String,
    pub town_kana: String,
    pub town_roma: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressZipResponse {
    pub level: MatchLevel,
    pub page: u32,
    pub limit: u32,
    pub count: u32,
    pub addresses: Vec<Address>,
}
