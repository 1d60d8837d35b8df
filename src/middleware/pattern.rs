use regex_lite as regex;
use std::fmt;

use super::MiddlewareError;

/// 와일드카드 경로 패턴
///
/// `*` 는 임의 길이 문자열, `?` 는 임의의 한 글자와 매칭됩니다.
/// 그 외 문자는 모두 문자 그대로 비교하며, 전체 문자열이 일치해야 합니다.
#[derive(Clone)]
pub struct GlobPattern {
    pattern: String,
    regex: regex::Regex,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self, MiddlewareError> {
        let regex = regex::Regex::new(&glob_to_regex(pattern)).map_err(|e| {
            MiddlewareError::Config(format!("잘못된 경로 패턴 {}: {}", pattern, e))
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl fmt::Debug for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GlobPattern").field(&self.pattern).finish()
    }
}

impl PartialEq for GlobPattern {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
        }
    }
    out.push('$');
    out
}

/// 패턴 목록 중 하나라도 일치하는지 검사합니다.
pub fn matches_any(patterns: &[GlobPattern], value: &str) -> bool {
    patterns.iter().any(|p| p.matches(value))
}

/// 일회성 매칭. 패턴이 잘못되었으면 false.
pub fn glob_match(pattern: &str, value: &str) -> bool {
    GlobPattern::new(pattern)
        .map(|p| p.matches(value))
        .unwrap_or(false)
}
