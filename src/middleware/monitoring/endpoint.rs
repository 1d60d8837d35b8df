/// 요청 경로를 지표용 엔드포인트 템플릿으로 정규화합니다.
///
/// `/v2/stocks/quote/AAPL` → `/v2/stocks/quote/{symbol}`,
/// `/v2/currency/convert/USD/KRW` → `/v2/currency/convert/{from}/{to}`.
pub fn normalize_endpoint(path: &str) -> String {
    let path = path.split('?').next().unwrap_or_default();
    let segments: Vec<&str> = path.split('/').collect();
    let mut normalized: Vec<String> = Vec::with_capacity(segments.len());

    let mut i = 0;
    while i < segments.len() {
        let segment = segments[i];
        normalized.push(segment.to_string());

        let next = segments.get(i + 1).copied().filter(|s| !s.is_empty());
        match segment {
            "quote" | "timeline" | "news" if next.is_some() => {
                normalized.push("{symbol}".to_string());
                i += 2;
            }
            "convert" | "exchange" if next.is_some() => {
                normalized.push("{from}".to_string());
                if segments.get(i + 2).is_some_and(|s| !s.is_empty()) {
                    normalized.push("{to}".to_string());
                    i += 3;
                } else {
                    i += 2;
                }
            }
            _ => i += 1,
        }
    }

    let joined = normalized.join("/");
    if joined.is_empty() {
        "/".to_string()
    } else {
        joined
    }
}

/// 정규화된 엔드포인트의 계열 카운터 이름
pub fn endpoint_family(endpoint: &str) -> Option<&'static str> {
    if endpoint.contains("quote") {
        Some("quote")
    } else if endpoint.contains("timeline") {
        Some("timeline")
    } else if endpoint.contains("news") {
        Some("news")
    } else if endpoint.contains("market") {
        Some("market_status")
    } else if endpoint.contains("currency") || endpoint.contains("convert") {
        Some("currency")
    } else {
        None
    }
}
