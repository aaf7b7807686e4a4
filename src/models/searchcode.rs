use serde::{Deserialize, Serialize};

/// Query parameters for the zip / digital-address code search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchCodeRequest {
    pub page: u32,
    pub limit: u32,
    #[serde(rename = "choikitype")]
    pub choiki: ChoikiType,
    #[serde(rename = "searchtype")]
    pub search_type: SearchType,
}

impl Default for SearchCodeRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 1,
            choiki: ChoikiType::WithoutBrackets,
            search_type: SearchType::WithBiz,
        }
    }
}

/// Town-area rendering: `1` without brackets, `2` with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ChoikiType {
    WithoutBrackets,
    WithBrackets,
}

impl TryFrom<u8> for ChoikiType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::WithoutBrackets),
            2 => Ok(Self::WithBrackets),
            other => Err(format!("unknown choikitype {}", other)),
        }
    }
}

impl From<ChoikiType> for u8 {
    fn from(value: ChoikiType) -> Self {
        match value {
            ChoikiType::WithoutBrackets => 1,
            ChoikiType::WithBrackets => 2,
        }
    }
}

/// `1` includes business addresses, `2` excludes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SearchType {
    WithBiz,
    WithoutBiz,
}

impl TryFrom<u8> for SearchType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::WithBiz),
            2 => Ok(Self::WithoutBiz),
            other => Err(format!("unknown searchtype {}", other)),
        }
    }
}

impl From<SearchType> for u8 {
    fn from(value: SearchType) -> Self {
        match value {
            SearchType::WithBiz => 1,
            SearchType::WithoutBiz => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchAddress {
    #[serde(rename = "dgacode")]
    pub dga_code: Option<String>,
    pub zip_code: Option<String>,
    pub pref_code: Option<String>,
    pub pref_name: Option<String>,
    pub pref_kana: Option<String>,
    pub pref_roma: Option<String>,
    pub city_code: Option<i64>,
    pub city_name: Option<String>,
    pub city_kana: Option<String>,
    pub city_roma: Option<String>,
    pub town_name: Option<String>,
    pub town_kana: Option<String>,
    pub town_roma: Option<String>,
    pub biz_name: Option<String>,
    pub biz_kana: Option<String>,
    pub biz_roma: Option<String>,
    pub block_name: Option<String>,
    pub other_name: Option<String>,
    pub address: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCodeResponse {
    pub page: u32,
    pub limit: u32,
    pub count: u32,
    #[serde(rename = "searchtype")]
    pub search_type: String,
    pub addresses: Vec<SearchAddress>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn enums_travel_as_small_integers() {
        let request = SearchCodeRequest {
            choiki: ChoikiType::WithBrackets,
            search_type: SearchType::WithoutBiz,
            ..Default::default()
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, json!({"page": 1, "limit": 1, "choikitype": 2, "searchtype": 2}));
    }

    #[test]
    fn search_address_tolerates_missing_fields() {
        let address: SearchAddress = serde_json::from_value(json!({
            "dgacode": null,
            "zip_code": "1000001",
            "pref_code": "13",
            "pref_name": "Tokyo",
            "pref_kana": null,
            "pref_roma": null,
            "city_code": 13101,
            "city_name": "Chiyoda",
            "city_kana": null,
            "city_roma": null,
            "town_name": "Chiyoda",
            "town_kana": null,
            "town_roma": null,
            "biz_name": null,
            "biz_kana": null,
            "biz_roma": null,
            "block_name": null,
            "other_name": null,
            "address": null,
            "longitude": 139.75,
            "latitude": 35.68
        }))
        .unwrap();
        assert_eq!(address.city_code, Some(13101));
        assert_eq!(address.dga_code, None);
    }
}
