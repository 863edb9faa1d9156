use crate::core::errors::ScanError;
use crate::core::models::Credential;
use std::fs;
use std::path::Path;

/// Immutable set of (username, password) pairs tried by the built-in prober.
/// Loaded once at startup and shared read-only across all workers; order is
/// fixed so attempt sequences are deterministic.
pub struct Catalog {
    creds: Vec<Credential>,
}

const BUILTIN_CREDS: &[(&str, &str)] = &[
    ("admin", "admin"),
    ("admin", "password"),
    ("root", "root"),
    ("root", "toor"),
    ("administrator", "administrator"),
    ("admin", ""),
    ("admin", "1234"),
    ("admin", "12345"),
    ("tomcat", "tomcat"),
    ("tomcat", "s3cret"),
];

impl Catalog {
    pub fn builtin() -> Self {
        Self {
            creds: BUILTIN_CREDS
                .iter()
                .map(|(u, p)| Credential::new(u, p))
                .collect(),
        }
    }

    /// Load `username:password` lines from a file, one pair per line.
    /// Comment and blank lines are skipped. A password may contain colons;
    /// only the first colon splits.
    pub fn from_file(path: &Path) -> Result<Self, ScanError> {
        let content = fs::read_to_string(path)?;
        let mut creds = Vec::new();

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match trimmed.split_once(':') {
                Some((user, pass)) => creds.push(Credential::new(user, pass)),
                None => {
                    tracing::warn!("ignoring malformed credential line: {}", trimmed);
                }
            }
        }

        if creds.is_empty() {
            return Err(ScanError::FatalConfig(format!(
                "credential file {} contains no usable entries",
                path.display()
            )));
        }

        Ok(Self { creds })
    }

    pub fn credentials(&self) -> &[Credential] {
        &self.creds
    }

    pub fn len(&self) -> usize {
        self.creds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_catalog_order_is_stable() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), BUILTIN_CREDS.len());
        assert_eq!(catalog.credentials()[0], Credential::new("admin", "admin"));
        assert_eq!(
            catalog.credentials().last().unwrap(),
            &Credential::new("tomcat", "s3cret")
        );
    }

    #[test]
    fn test_from_file_splits_on_first_colon() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# header").unwrap();
        writeln!(file, "admin:pass:with:colons").unwrap();
        writeln!(file, "nocolonhere").unwrap();
        writeln!(file, "guest:").unwrap();

        let catalog = Catalog::from_file(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.credentials()[0].password, "pass:with:colons");
        assert_eq!(catalog.credentials()[1].password, "");
    }

    #[test]
    fn test_from_file_rejects_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# only comments").unwrap();
        assert!(Catalog::from_file(file.path()).is_err());
    }
}
