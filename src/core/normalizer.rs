use super::errors::ScanError;
use super::models::{Scheme, Target};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use url::Url;

/// A rejected input line. Non-fatal; reported in the run summary.
#[derive(Debug, Clone)]
pub struct ParseFailure {
    pub line_no: usize,
    pub line: String,
    pub reason: String,
}

/// Parse one raw input line into a canonical target.
///
/// Lines without a scheme default to http; ports default to 80/443 by
/// scheme. Anything that is not plain http(s) is rejected.
pub fn parse_line(raw: &str) -> Result<Target, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("empty line".to_string());
    }

    // url::Url would otherwise read "10.0.0.1:8080" as scheme "10.0.0.1"
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let parsed = Url::parse(&candidate).map_err(|e| e.to_string())?;

    let scheme = match parsed.scheme() {
        "http" => Scheme::Http,
        "https" => Scheme::Https,
        other => return Err(format!("unsupported scheme '{}'", other)),
    };

    let host = parsed
        .host_str()
        .ok_or_else(|| "missing host".to_string())?
        .to_lowercase();

    let port = parsed.port().unwrap_or_else(|| scheme.default_port());

    Ok(Target { scheme, host, port })
}

/// Normalize a batch of raw lines into an ordered, deduplicated target list.
///
/// Comment (`#`) and blank lines are skipped silently; malformed lines are
/// collected as failures without stopping the batch. The first occurrence of
/// a fingerprint wins and input order is preserved, so reports are
/// deterministic.
pub fn normalize_lines<'a, I>(lines: I) -> (Vec<Target>, Vec<ParseFailure>)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut targets = Vec::new();
    let mut failures = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (idx, raw) in lines.into_iter().enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match parse_line(trimmed) {
            Ok(target) => {
                if seen.insert(target.fingerprint()) {
                    targets.push(target);
                } else {
                    tracing::debug!("duplicate target skipped: {}", trimmed);
                }
            }
            Err(reason) => {
                let err = ScanError::TargetParse {
                    line: idx + 1,
                    reason: reason.clone(),
                };
                tracing::warn!("{}: {}", err, trimmed);
                failures.push(ParseFailure {
                    line_no: idx + 1,
                    line: trimmed.to_string(),
                    reason,
                });
            }
        }
    }

    (targets, failures)
}

pub fn load_target_file(path: &Path) -> Result<(Vec<Target>, Vec<ParseFailure>), ScanError> {
    let content = fs::read_to_string(path)?;
    Ok(normalize_lines(content.lines()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_scheme_and_port() {
        let t = parse_line("10.0.0.1").unwrap();
        assert_eq!(t.scheme, Scheme::Http);
        assert_eq!(t.host, "10.0.0.1");
        assert_eq!(t.port, 80);

        let t = parse_line("https://example.com").unwrap();
        assert_eq!(t.port, 443);
    }

    #[test]
    fn test_explicit_port_kept() {
        let t = parse_line("http://192.168.1.1:8080").unwrap();
        assert_eq!(t.port, 8080);
    }

    #[test]
    fn test_host_lowercased() {
        let t = parse_line("HTTP://Router.LOCAL").unwrap();
        assert_eq!(t.host, "router.local");
    }

    #[test]
    fn test_rejects_non_http_schemes() {
        assert!(parse_line("ftp://example.com").is_err());
        assert!(parse_line("ssh://example.com").is_err());
    }

    #[test]
    fn test_equivalent_spellings_collapse() {
        // Default-port explicit vs implicit must dedupe to one target.
        let (targets, failures) = normalize_lines(vec![
            "http://10.0.0.1",
            "http://10.0.0.1:80",
            "10.0.0.1",
        ]);
        assert!(failures.is_empty());
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].fingerprint(), "http://10.0.0.1:80");
    }

    #[test]
    fn test_comments_and_blanks_skipped() {
        let (targets, failures) =
            normalize_lines(vec!["# header", "", "   ", "http://a.example", "# tail"]);
        assert!(failures.is_empty());
        assert_eq!(targets.len(), 1);
    }

    #[test]
    fn test_malformed_lines_reported_not_fatal() {
        let (targets, failures) =
            normalize_lines(vec!["http://good.example", "http://", "https://also.good"]);
        assert_eq!(targets.len(), 2);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].line_no, 2);
    }

    #[test]
    fn test_first_occurrence_order_preserved() {
        let (targets, _) = normalize_lines(vec![
            "http://b.example",
            "http://a.example",
            "http://b.example:80",
        ]);
        let hosts: Vec<&str> = targets.iter().map(|t| t.host.as_str()).collect();
        assert_eq!(hosts, vec!["b.example", "a.example"]);
    }
}
