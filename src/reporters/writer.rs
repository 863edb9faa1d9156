use crate::config::OutputFormat;
use crate::core::models::ScanResult;
use crate::utils::fs::atomic_write;
use crate::utils::time::timestamp_slug;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Emit the requested file reports from the finalized result list. Terminal
/// output is handled separately by the printer; this module only renders
/// CSV and HTML documents, both pure functions of the result list.
pub fn write_reports(
    results: &[ScanResult],
    formats: &[OutputFormat],
    reports_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let slug = timestamp_slug();
    let mut written = Vec::new();

    for format in formats {
        let path = match format {
            OutputFormat::Terminal => continue,
            OutputFormat::Csv => {
                let path = reports_dir.join(format!("report_{}.csv", slug));
                atomic_write(&path, render_csv(results).as_bytes())?;
                path
            }
            OutputFormat::Html => {
                let path = reports_dir.join(format!("report_{}.html", slug));
                atomic_write(&path, render_html(results).as_bytes())?;
                path
            }
        };
        tracing::info!("report written: {}", path.display());
        written.push(path);
    }

    Ok(written)
}

/// One row per confirmed credential, header fixed. Pairs confirmed by both
/// probes render the methods joined with `+`.
pub fn render_csv(results: &[ScanResult]) -> String {
    let mut out = String::from("URL,Host,Port,Protocol,Method,Username,Password,Timestamp\n");

    for result in results {
        for cred in &result.credentials {
            let methods = cred
                .methods
                .iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join("+");
            let row = [
                result.target.url(),
                result.target.host.clone(),
                result.target.port.to_string(),
                result.target.scheme.as_str().to_string(),
                methods,
                cred.username.clone(),
                cred.password.clone(),
                cred.tested_at.to_rfc3339(),
            ];
            let escaped: Vec<String> = row.iter().map(|f| csv_field(f)).collect();
            out.push_str(&escaped.join(","));
            out.push('\n');
        }
    }

    out
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn render_html(results: &[ScanResult]) -> String {
    let total: usize = results.iter().map(|r| r.credentials.len()).sum();

    let mut rows = String::new();
    for result in results {
        for cred in &result.credentials {
            let methods = cred
                .methods
                .iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join("+");
            rows.push_str(&format!(
                "        <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                html_escape(&result.target.url()),
                html_escape(&methods),
                html_escape(&cred.username),
                html_escape(&cred.password),
                cred.tested_at.format("%Y-%m-%d %H:%M:%S"),
            ));
        }
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Credential Scan Report</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 40px; background: #f5f5f5; }}
        h1 {{ color: #333; }}
        .summary {{ background: #fff; padding: 20px; border-radius: 5px; margin-bottom: 20px; }}
        table {{ width: 100%; border-collapse: collapse; background: #fff; }}
        th {{ background: #4CAF50; color: white; padding: 12px; text-align: left; }}
        td {{ padding: 12px; border-bottom: 1px solid #ddd; }}
        tr:hover {{ background: #f5f5f5; }}
        .critical {{ color: #d32f2f; font-weight: bold; }}
    </style>
</head>
<body>
    <h1>Default Credential Scan Report</h1>
    <div class="summary">
        <p><strong>Targets Scanned:</strong> {}</p>
        <p><strong>Total Findings:</strong> <span class="critical">{}</span></p>
    </div>
    <table>
        <tr><th>URL</th><th>Method</th><th>Username</th><th>Password</th><th>Timestamp</th></tr>
{}    </table>
</body>
</html>
"#,
        results.len(),
        total,
        rows
    )
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{ConfirmedCredential, ProbeMethod, Scheme, Target};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn fixed_result() -> ScanResult {
        let when = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        ScanResult {
            target: Target {
                scheme: Scheme::Http,
                host: "10.0.0.1".to_string(),
                port: 8080,
            },
            credentials: vec![ConfirmedCredential {
                username: "admin".to_string(),
                password: "adm,in".to_string(),
                methods: vec![ProbeMethod::NmapNse, ProbeMethod::CustomBasic],
                evidence: "test".to_string(),
                tested_at: when,
            }],
            methods_attempted: vec![ProbeMethod::NmapNse, ProbeMethod::CustomBasic],
            completed_at: when,
        }
    }

    #[test]
    fn test_csv_header_and_row_schema() {
        let csv = render_csv(&[fixed_result()]);
        let mut lines = csv.lines();

        assert_eq!(
            lines.next().unwrap(),
            "URL,Host,Port,Protocol,Method,Username,Password,Timestamp"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("http://10.0.0.1:8080,10.0.0.1,8080,http,"));
        assert!(row.contains("nmap-nse+custom-basic"));
        // Comma inside the password is quoted
        assert!(row.contains("\"adm,in\""));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_csv_is_deterministic() {
        let results = [fixed_result()];
        assert_eq!(render_csv(&results), render_csv(&results));
    }

    #[test]
    fn test_targets_without_findings_emit_no_rows() {
        let mut result = fixed_result();
        result.credentials.clear();
        let csv = render_csv(&[result]);
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_html_escapes_and_counts() {
        let mut result = fixed_result();
        result.credentials[0].password = "<script>".to_string();
        let html = render_html(&[result]);

        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("Total Findings:</strong> <span class=\"critical\">1</span>"));
    }
}
