use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::warn;

use crate::model::{ScanResult, ScannerKind};

/// Every compiled class file starts with this big-endian signature.
const CLASS_MAGIC: u32 = 0xCAFE_BABE;
/// Class-file major versions are the Java release number plus 44
/// (major 52 = Java 8, major 61 = Java 17).
const MAJOR_VERSION_OFFSET: u16 = 44;

/// Determines the bytecode Java version from a class file's fixed header:
/// 4-byte magic, 2-byte minor (discarded), 2-byte major.
///
/// A file that does not carry the class-file magic, or cannot be read, is
/// logged and yields `None` rather than an error.
pub fn scan_class_file(path: &Path) -> Option<ScanResult> {
    let major = match read_major_version(path) {
        Ok(Some(major)) => major,
        Ok(None) => {
            warn!(file = %path.display(), "not a valid class file");
            return None;
        }
        Err(err) => {
            warn!(file = %path.display(), error = %err, "failed to read class file");
            return None;
        }
    };

    Some(ScanResult {
        file_name: super::display_file_name(path),
        scanner: ScannerKind::ClassFile,
        // Signed arithmetic: a crafted header with major < 44 reports a
        // negative version rather than panicking.
        java_version: Some((i32::from(major) - i32::from(MAJOR_VERSION_OFFSET)).to_string()),
        spring_boot_version: None,
    })
}

fn read_major_version(path: &Path) -> std::io::Result<Option<u16>> {
    let mut header = [0u8; 8];
    File::open(path)?.read_exact(&mut header)?;

    let magic = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
    if magic != CLASS_MAGIC {
        return Ok(None);
    }
    // header[4..6] is the minor version.
    Ok(Some(u16::from_be_bytes([header[6], header[7]])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[test]
    fn major_55_is_java_11() {
        let file = file_with(&[0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x37]);

        let result = scan_class_file(file.path()).unwrap();
        assert_eq!(result.scanner, ScannerKind::ClassFile);
        assert_eq!(result.java_version.as_deref(), Some("11"));
        assert_eq!(result.spring_boot_version, None);
    }

    #[test]
    fn major_61_is_java_17() {
        let file = file_with(&[0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x03, 0x00, 0x3D]);

        let result = scan_class_file(file.path()).unwrap();
        assert_eq!(result.java_version.as_deref(), Some("17"));
    }

    #[test]
    fn wrong_magic_yields_none() {
        let file = file_with(&[0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x00, 0x00, 0x37]);
        assert!(scan_class_file(file.path()).is_none());
    }

    #[test]
    fn truncated_file_yields_none() {
        let file = file_with(&[0xCA, 0xFE]);
        assert!(scan_class_file(file.path()).is_none());
    }

    #[test]
    fn missing_file_yields_none() {
        assert!(scan_class_file(Path::new("/nonexistent/App.class")).is_none());
    }
}
