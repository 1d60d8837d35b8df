//! 내장 응답 스키마 정의
//!
//! 스키마는 JSON Schema Draft 7을 따릅니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinSchema {
    StockQuote,
    Timeline,
    News,
    MarketStatus,
    ErrorResponse,
}

impl BuiltinSchema {
    pub const ALL: [BuiltinSchema; 5] = [
        BuiltinSchema::StockQuote,
        BuiltinSchema::Timeline,
        BuiltinSchema::News,
        BuiltinSchema::MarketStatus,
        BuiltinSchema::ErrorResponse,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::StockQuote => "stock_quote",
            Self::Timeline => "timeline",
            Self::News => "news",
            Self::MarketStatus => "market_status",
            Self::ErrorResponse => "error_response",
        }
    }

    pub fn definition(self) -> &'static str {
        match self {
            Self::StockQuote => STOCK_QUOTE_SCHEMA,
            Self::Timeline => TIMELINE_SCHEMA,
            Self::News => NEWS_SCHEMA,
            Self::MarketStatus => MARKET_STATUS_SCHEMA,
            Self::ErrorResponse => ERROR_RESPONSE_SCHEMA,
        }
    }
}

impl fmt::Display for BuiltinSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BuiltinSchema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|schema| schema.name() == s)
            .ok_or_else(|| format!("Unknown schema: {}", s))
    }
}

pub const STOCK_QUOTE_SCHEMA: &str = r#"{
    "$schema": "http://json-schema.org/draft-07/schema#",
    "type": "object",
    "required": ["symbol", "price"],
    "properties": {
        "symbol": {"type": "string", "minLength": 1},
        "price": {"type": "number", "minimum": 0},
        "open": {"type": "number"},
        "high": {"type": "number"},
        "low": {"type": "number"},
        "previous_close": {"type": "number"},
        "change": {"type": "number"},
        "change_percent": {"type": "number"},
        "volume": {"type": "integer", "minimum": 0},
        "timestamp": {"type": ["string", "integer"]}
    }
}"#;

pub const TIMELINE_SCHEMA: &str = r#"{
    "$schema": "http://json-schema.org/draft-07/schema#",
    "type": "object",
    "required": ["symbol", "data"],
    "properties": {
        "symbol": {"type": "string", "minLength": 1},
        "interval": {"type": "string"},
        "data": {
            "type": "array",
            "items": {
                "type": "object",
                "required": ["timestamp", "price"],
                "properties": {
                    "timestamp": {"type": ["string", "integer"]},
                    "price": {"type": "number"},
                    "volume": {"type": "integer", "minimum": 0}
                }
            }
        }
    }
}"#;

pub const NEWS_SCHEMA: &str = r#"{
    "$schema": "http://json-schema.org/draft-07/schema#",
    "type": "object",
    "required": ["items"],
    "properties": {
        "total": {"type": "integer", "minimum": 0},
        "items": {
            "type": "array",
            "items": {
                "type": "object",
                "required": ["title", "url"],
                "properties": {
                    "id": {"type": ["string", "integer"]},
                    "title": {"type": "string"},
                    "url": {"type": "string"},
                    "source": {"type": "string"},
                    "published_at": {"type": "string"},
                    "symbols": {"type": "array", "items": {"type": "string"}}
                }
            }
        }
    }
}"#;

pub const MARKET_STATUS_SCHEMA: &str = r#"{
    "$schema": "http://json-schema.org/draft-07/schema#",
    "type": "object",
    "required": ["market", "status"],
    "properties": {
        "market": {"type": "string"},
        "status": {"type": "string", "enum": ["open", "closed", "pre_market", "after_hours"]},
        "next_open": {"type": "string"},
        "next_close": {"type": "string"}
    }
}"#;

pub const ERROR_RESPONSE_SCHEMA: &str = r#"{
    "$schema": "http://json-schema.org/draft-07/schema#",
    "type": "object",
    "required": ["error"],
    "properties": {
        "error": {"type": ["string", "object"]},
        "message": {"type": "string"},
        "code": {"type": ["integer", "string"]}
    }
}"#;
