use std::path::Path;

use crate::model::{ScanResult, ScannerKind};

/// Derives the Spring Boot version from the dependency jar's own filename.
/// Never reads the file; the Java version is always absent for this kind.
pub fn scan_dependency_name(path: &Path) -> Option<ScanResult> {
    let file_name = super::display_file_name(path);
    let spring_boot_version = super::SPRING_BOOT_JAR
        .captures(&file_name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    Some(ScanResult {
        file_name,
        scanner: ScannerKind::DependencyName,
        java_version: None,
        spring_boot_version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_version_from_filename() {
        let result = scan_dependency_name(Path::new("/lib/spring-boot-3.1.2.jar")).unwrap();
        assert_eq!(result.scanner, ScannerKind::DependencyName);
        assert_eq!(result.spring_boot_version.as_deref(), Some("3.1.2"));
        assert_eq!(result.java_version, None);
    }

    #[test]
    fn captures_qualified_versions() {
        let result =
            scan_dependency_name(Path::new("spring-boot-2.7.18-SNAPSHOT.jar")).unwrap();
        assert_eq!(
            result.spring_boot_version.as_deref(),
            Some("2.7.18-SNAPSHOT")
        );
    }

    #[test]
    fn related_artifacts_do_not_match() {
        // The pipeline only routes exact `spring-boot-<x>.<y>.*.jar` names
        // here, but the capture itself must not loosen that.
        let result =
            scan_dependency_name(Path::new("spring-boot-starter-web-3.1.2.jar")).unwrap();
        assert_eq!(result.spring_boot_version, None);
    }
}
