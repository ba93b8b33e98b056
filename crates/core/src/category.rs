//! Drought category taxonomy.
//!
//! Codes are the integers stored by the backend. `-9999` is the "No Data"
//! sentinel, which is excluded from scoring and distinct from "not set".

use serde::Serialize;

use crate::error::CoreError;

/// Sentinel code for "No Data".
pub const NO_DATA_CODE: i32 = -9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DroughtCategory {
    Normal,
    D0,
    D1,
    D2,
    D3,
    D4,
    NoData,
}

impl DroughtCategory {
    pub fn code(&self) -> i32 {
        match self {
            Self::Normal => 0,
            Self::D0 => 1,
            Self::D1 => 2,
            Self::D2 => 3,
            Self::D3 => 4,
            Self::D4 => 5,
            Self::NoData => NO_DATA_CODE,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Normal),
            1 => Some(Self::D0),
            2 => Some(Self::D1),
            3 => Some(Self::D2),
            4 => Some(Self::D3),
            5 => Some(Self::D4),
            NO_DATA_CODE => Some(Self::NoData),
            _ => None,
        }
    }

    /// Parse the short names used in payloads and on the command line.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "normal" | "wet" => Ok(Self::Normal),
            "d0" => Ok(Self::D0),
            "d1" => Ok(Self::D1),
            "d2" => Ok(Self::D2),
            "d3" => Ok(Self::D3),
            "d4" => Ok(Self::D4),
            "none" | "nodata" | "no-data" => Ok(Self::NoData),
            other => match other.parse::<i32>().ok().and_then(Self::from_code) {
                Some(cat) => Ok(cat),
                None => Err(CoreError::UnknownCategory(name.to_string())),
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::D0 => "d0",
            Self::D1 => "d1",
            Self::D2 => "d2",
            Self::D3 => "d3",
            Self::D4 => "d4",
            Self::NoData => "none",
        }
    }

    pub fn info(&self) -> &'static CategoryInfo {
        let idx = match self {
            Self::Normal => 0,
            Self::D0 => 1,
            Self::D1 => 2,
            Self::D2 => 3,
            Self::D3 => 4,
            Self::D4 => 5,
            Self::NoData => 6,
        };
        &TAXONOMY[idx]
    }
}

impl std::fmt::Display for DroughtCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Display metadata for one category code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryInfo {
    pub value: i32,
    pub label: &'static str,
    pub color: &'static str,
}

/// Ordered least to most severe, "No Data" last.
pub const TAXONOMY: [CategoryInfo; 7] = [
    CategoryInfo { value: 0, label: "Wet/normal conditions", color: "#b9f8cf" },
    CategoryInfo { value: 1, label: "D0 Abnormally Dry", color: "#ffff00" },
    CategoryInfo { value: 2, label: "D1 Moderate Drought", color: "#fbd47f" },
    CategoryInfo { value: 3, label: "D2 Severe Drought", color: "#ffaa00" },
    CategoryInfo { value: 4, label: "D3 Extreme Drought", color: "#e60000" },
    CategoryInfo { value: 5, label: "D4 Exceptional Drought", color: "#730000" },
    CategoryInfo { value: NO_DATA_CODE, label: "No Data", color: "#ffffff" },
];

/// Look up a code. Unknown codes return `None`; callers render blank.
pub fn category_of(code: i32) -> Option<&'static CategoryInfo> {
    TAXONOMY.iter().find(|c| c.value == code)
}

pub fn label_of(code: Option<i32>) -> Option<&'static str> {
    code.and_then(category_of).map(|c| c.label)
}

pub fn color_of(code: Option<i32>) -> Option<&'static str> {
    code.and_then(category_of).map(|c| c.color)
}

/// Legend entries. Public maps drop the trailing "No Data" entry.
pub fn legend(include_no_data: bool) -> &'static [CategoryInfo] {
    if include_no_data {
        &TAXONOMY
    } else {
        &TAXONOMY[..TAXONOMY.len() - 1]
    }
}

/// Options offered when an admin picks a validated value.
pub fn selector_options() -> &'static [CategoryInfo] {
    legend(false)
}

/// Serde helpers for category fields on the wire.
///
/// Accepts integers, integral floats, symbolic names and `null`.
pub(crate) mod code {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::DroughtCategory;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(from_value))
    }

    pub(crate) fn from_value(value: &Value) -> Option<i32> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .and_then(|n| i32::try_from(n).ok()),
            Value::String(s) => DroughtCategory::from_name(s).ok().map(|c| c.code()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_data_sentinel_is_white() {
        let info = category_of(-9999).unwrap();
        assert_eq!(info.label, "No Data");
        assert_eq!(info.color, "#ffffff");
    }

    #[test]
    fn unknown_code_is_none() {
        assert!(category_of(42).is_none());
        assert!(category_of(-1).is_none());
        assert_eq!(label_of(Some(6)), None);
        assert_eq!(color_of(None), None);
    }

    #[test]
    fn taxonomy_order_is_by_severity() {
        let codes: Vec<i32> = TAXONOMY.iter().map(|c| c.value).collect();
        assert_eq!(codes, vec![0, 1, 2, 3, 4, 5, -9999]);
    }

    #[test]
    fn public_legend_omits_no_data() {
        assert_eq!(legend(true).len(), 7);
        assert_eq!(legend(false).len(), 6);
        assert!(selector_options().iter().all(|c| c.value != NO_DATA_CODE));
    }

    #[test]
    fn names_and_codes_agree() {
        for info in TAXONOMY.iter() {
            let cat = DroughtCategory::from_code(info.value).unwrap();
            assert_eq!(cat.info(), info);
            assert_eq!(DroughtCategory::from_name(cat.name()).unwrap(), cat);
        }
        assert_eq!(DroughtCategory::from_name("D2").unwrap(), DroughtCategory::D2);
        assert_eq!(DroughtCategory::from_name("3").unwrap(), DroughtCategory::D2);
        assert!(DroughtCategory::from_name("d9").is_err());
    }

    #[test]
    fn wire_codes_accept_names_and_floats() {
        use serde_json::json;
        assert_eq!(code::from_value(&json!(4)), Some(4));
        assert_eq!(code::from_value(&json!(2.0)), Some(2));
        assert_eq!(code::from_value(&json!(2.5)), None);
        assert_eq!(code::from_value(&json!("d1")), Some(2));
        assert_eq!(code::from_value(&json!("none")), Some(-9999));
        assert_eq!(code::from_value(&json!(true)), None);
    }
}
