use jiff::{SignedDuration, Span, SpanRelativeTo};

/// Accepts "5s", "1m30s", ISO 8601 ("PT1H30M") or a plain number of seconds.
pub fn parse_duration(input: &str) -> Result<SignedDuration, String> {
    let duration = input
        .parse::<SignedDuration>()
        .ok()
        .or_else(|| {
            input
                .parse::<Span>()
                .and_then(|span| span.to_duration(SpanRelativeTo::days_are_24_hours()))
                .ok()
        })
        .or_else(|| input.parse::<i64>().ok().map(SignedDuration::from_secs))
        .ok_or_else(|| format!("Invalid duration: {input}"))?;

    if duration.is_negative() {
        return Err(format!("Duration must not be negative: {input}"));
    }

    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("5s"), Ok(SignedDuration::from_secs(5)));
        assert_eq!(parse_duration("1m30s"), Ok(SignedDuration::from_secs(90)));
        assert_eq!(parse_duration("PT1H"), Ok(SignedDuration::from_hours(1)));
        assert_eq!(parse_duration("12"), Ok(SignedDuration::from_secs(12)));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("-3").is_err());
    }
}
