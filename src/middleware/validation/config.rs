use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 응답 검증 미들웨어 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub validate_responses: bool,

    /// 검증 실패 시 에러로 승격
    pub fail_on_validation_error: bool,

    /// 검증 결과를 응답 헤더로 노출
    pub add_validation_headers: bool,

    /// 등록된 검증기가 없을 때 경로로 내장 스키마를 고름
    pub auto_detect_schemas: bool,

    /// 자동 감지 시 4xx/5xx 응답은 에러 응답 스키마로 검증
    pub validate_error_responses: bool,

    /// 경로 패턴 → 내장 스키마 이름
    pub schema_mappings: BTreeMap<String, String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            validate_responses: true,
            fail_on_validation_error: false,
            add_validation_headers: false,
            auto_detect_schemas: true,
            validate_error_responses: true,
            schema_mappings: default_schema_mappings(),
        }
    }
}

fn default_schema_mappings() -> BTreeMap<String, String> {
    [
        ("/v2/stocks/quote*", "stock_quote"),
        ("/v2/stocks/timeline*", "timeline"),
        ("/v2/news*", "news"),
        ("/v2/market/status*", "market_status"),
    ]
    .into_iter()
    .map(|(pattern, schema)| (pattern.to_string(), schema.to_string()))
    .collect()
}
