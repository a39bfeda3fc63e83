use std::path::Path;

use reqwest::Certificate;

use crate::errors::TlsError;

/// Load every certificate in a PEM file as a trust anchor for the secret store.
///
/// The file is read once, when the pinned client is built. An unreadable file, a
/// malformed PEM block, or a file with no certificates at all is rejected.
pub fn load_trust_anchors(path: &Path) -> Result<Vec<Certificate>, TlsError> {
    if path.as_os_str().is_empty() {
        return Err(TlsError::MissingCaPath);
    }

    let pem = std::fs::read(path)
        .map_err(|source| TlsError::CaReadError { path: path.to_path_buf(), source })?;

    let ders = rustls_pemfile::certs(&mut pem.as_slice())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::InvalidCertificatePem { path: path.to_path_buf(), source })?;

    if ders.is_empty() {
        return Err(TlsError::EmptyCertificateChain { path: path.to_path_buf() });
    }

    ders.iter()
        .map(|der| {
            Certificate::from_der(der.as_ref())
                .map_err(|source| TlsError::RejectedCertificate { path: path.to_path_buf(), source })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_is_read_error() {
        let err = load_trust_anchors(Path::new("/nonexistent/ca.crt")).unwrap_err();
        assert!(matches!(err, TlsError::CaReadError { .. }));
    }

    #[test]
    fn test_empty_path_is_missing() {
        let err = load_trust_anchors(Path::new("")).unwrap_err();
        assert!(matches!(err, TlsError::MissingCaPath));
    }

    #[test]
    fn test_file_without_certificates_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is not a certificate").unwrap();

        let err = load_trust_anchors(file.path()).unwrap_err();
        assert!(matches!(err, TlsError::EmptyCertificateChain { .. }));
    }

    #[test]
    fn test_loads_generated_certificate() {
        let certified = rcgen::generate_simple_self_signed(vec!["vault.internal".to_string()])
            .unwrap();
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(certified.cert.pem().as_bytes()).unwrap();

        let anchors = load_trust_anchors(file.path()).unwrap();
        assert_eq!(anchors.len(), 1);
    }
}
