use hyper::HeaderMap;
use serde_json::{Map, Value};

pub const REDACTED: &str = "***REDACTED***";
const TRUNCATED_SUFFIX: &str = "... (truncated)";

fn contains_ignore_case(names: &[String], name: &str) -> bool {
    names.iter().any(|n| n.eq_ignore_ascii_case(name))
}

/// 헤더를 로그용 맵으로 변환하며 민감한 값은 가립니다.
pub fn sanitize_headers(headers: &HeaderMap, sensitive: &[String], mask: bool) -> Map<String, Value> {
    let mut out = Map::new();
    for name in headers.keys() {
        let value = if mask && contains_ignore_case(sensitive, name.as_str()) {
            REDACTED.to_string()
        } else {
            headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ")
        };
        out.insert(name.as_str().to_string(), Value::String(value));
    }
    out
}

/// 본문 발췌
///
/// JSON 객체나 배열이면 민감한 키를 재귀적으로 가립니다. 가린 결과가 최대 길이
/// 안이면 구조 그대로, 넘으면 직렬화한 문자열을 잘라서 돌려줍니다.
/// 그 외 본문은 최대 길이로 자른 문자열입니다.
pub fn sanitize_body(body: &[u8], sensitive: &[String], mask: bool, max_length: usize) -> Value {
    if mask {
        if let Ok(mut value) = serde_json::from_slice::<Value>(body) {
            if value.is_object() || value.is_array() {
                redact_fields(&mut value, sensitive);
                let serialized = value.to_string();
                if serialized.chars().count() <= max_length {
                    return value;
                }
                return Value::String(truncate(&serialized, max_length));
            }
        }
    }
    Value::String(truncate(&String::from_utf8_lossy(body), max_length))
}

pub fn redact_fields(value: &mut Value, sensitive: &[String]) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if contains_ignore_case(sensitive, key) {
                    *field = Value::String(REDACTED.to_string());
                } else {
                    redact_fields(field, sensitive);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                redact_fields(item, sensitive);
            }
        }
        _ => {}
    }
}

pub fn truncate(text: &str, max_length: usize) -> String {
    match text.char_indices().nth(max_length) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATED_SUFFIX),
        None => text.to_string(),
    }
}
