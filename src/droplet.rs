//! Droplet retrieval and selective archive extraction.
//!
//! A droplet is the gzip-compressed tarball CF builds from app source plus
//! buildpack. Only the `./app` subtree holds application content; everything
//! else (deps, staging metadata) is irrelevant to version scanning and is
//! skipped during extraction.

use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use tar::Archive;
use tokio::process::Command;
use tracing::debug;

use crate::error::RetrieveError;

/// Archive subtree that holds the application's own files.
const APP_PREFIX: &str = "./app";

/// Downloads a droplet through the `cf` CLI and unpacks its `./app` subtree
/// into a per-droplet temp directory.
///
/// All paths are derived deterministically from the droplet guid, so
/// concurrent scans of different apps never collide on disk. Concurrent runs
/// of the whole tool against the same space share these paths and are not
/// mutually guarded.
#[derive(Debug, Clone)]
pub struct DropletRetriever {
    tmp_folder: PathBuf,
    download_droplets: bool,
}

impl DropletRetriever {
    pub fn new(tmp_folder: PathBuf, download_droplets: bool) -> Self {
        Self {
            tmp_folder,
            download_droplets,
        }
    }

    /// `<tmp>/droplet_<guid>.tgz`
    pub fn tarball_path(&self, droplet_guid: &str) -> PathBuf {
        self.tmp_folder.join(format!("droplet_{droplet_guid}.tgz"))
    }

    /// `<tmp>/droplet_<guid>`
    pub fn droplet_dir(&self, droplet_guid: &str) -> PathBuf {
        self.tmp_folder.join(format!("droplet_{droplet_guid}"))
    }

    /// Fetches and unpacks one app's droplet, returning the directory to
    /// scan (`<droplet dir>/app`).
    ///
    /// The download step is optional so repeated runs can reuse tarballs
    /// kept by a previous `cleanup_droplets = false` run; extraction always
    /// starts from a freshly created directory.
    pub async fn retrieve(
        &self,
        app_name: &str,
        droplet_guid: &str,
    ) -> Result<PathBuf, RetrieveError> {
        let tarball = self.tarball_path(droplet_guid);
        if self.download_droplets {
            self.download(app_name, &tarball).await?;
        }

        // Extraction is synchronous disk work; run it on the blocking pool
        // so it stalls only this app's task.
        let droplet_dir = self.droplet_dir(droplet_guid);
        let dir = droplet_dir.clone();
        tokio::task::spawn_blocking(move || {
            prepare_clean_dir(&dir)?;
            extract_app_folder(&tarball, &dir)
        })
        .await
        .map_err(RetrieveError::Task)??;

        Ok(droplet_dir.join("app"))
    }

    /// Deletes the tarball and extraction directory for one droplet.
    /// Missing paths are fine; a scan may have failed before creating them.
    pub fn cleanup(&self, droplet_guid: &str) -> Result<(), RetrieveError> {
        let tarball = self.tarball_path(droplet_guid);
        if tarball.exists() {
            fs::remove_file(&tarball).map_err(|source| RetrieveError::Cleanup {
                path: tarball,
                source,
            })?;
        }

        let dir = self.droplet_dir(droplet_guid);
        if dir.exists() {
            fs::remove_dir_all(&dir).map_err(|source| RetrieveError::Cleanup {
                path: dir,
                source,
            })?;
        }

        Ok(())
    }

    async fn download(&self, app_name: &str, tarball: &Path) -> Result<(), RetrieveError> {
        if let Some(parent) = tarball.parent() {
            fs::create_dir_all(parent).map_err(|source| RetrieveError::Prepare {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let output = Command::new("cf")
            .arg("download-droplet")
            .arg(app_name)
            .arg("--path")
            .arg(tarball)
            .output()
            .await
            .map_err(RetrieveError::Spawn)?;

        debug!(
            app = app_name,
            output = %String::from_utf8_lossy(&output.stdout).trim(),
            "cf download-droplet"
        );

        if !output.status.success() {
            return Err(RetrieveError::Download {
                app: app_name.to_string(),
                code: output.status.code(),
            });
        }

        Ok(())
    }
}

fn prepare_clean_dir(dir: &Path) -> Result<(), RetrieveError> {
    let wrap = |source| RetrieveError::Prepare {
        path: dir.to_path_buf(),
        source,
    };
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(wrap)?;
    }
    fs::create_dir_all(dir).map_err(wrap)
}

/// Stream-extracts every `./app`-prefixed entry of the tarball into
/// `dest`, re-rooted so content lands under `dest/app/...`. Entries outside
/// the prefix are skipped without error.
pub fn extract_app_folder(tarball: &Path, dest: &Path) -> Result<(), RetrieveError> {
    let wrap_archive = |source| RetrieveError::Extract {
        path: tarball.to_path_buf(),
        source,
    };

    let file = File::open(tarball).map_err(wrap_archive)?;
    let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));

    for entry in archive.entries().map_err(wrap_archive)? {
        let mut entry = entry.map_err(wrap_archive)?;
        let entry_path = entry.path().map_err(wrap_archive)?.into_owned();

        let relative = match entry_path.strip_prefix(APP_PREFIX) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => continue,
        };
        let dest_path = dest.join("app").join(relative);
        let wrap_write = |source| RetrieveError::Extract {
            path: dest_path.clone(),
            source,
        };

        if entry.header().entry_type().is_dir() {
            fs::create_dir_all(&dest_path).map_err(wrap_write)?;
        } else {
            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent).map_err(wrap_write)?;
            }
            let mut out = File::create(&dest_path).map_err(wrap_write)?;
            io::copy(&mut entry, &mut out).map_err(wrap_write)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tar::{EntryType, Header};
    use tempfile::TempDir;

    fn build_tarball(path: &Path, entries: &[(&str, Option<&[u8]>)]) {
        let file = File::create(path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));

        for (entry_path, contents) in entries {
            let mut header = Header::new_gnu();
            // Write the name bytes verbatim: `append_data`/`set_path` strips
            // the leading `./` that droplet archives carry.
            header.as_gnu_mut().unwrap().name[..entry_path.len()]
                .copy_from_slice(entry_path.as_bytes());
            match contents {
                Some(data) => {
                    header.set_entry_type(EntryType::Regular);
                    header.set_size(data.len() as u64);
                    header.set_mode(0o644);
                    header.set_cksum();
                    builder.append(&header, *data).unwrap();
                }
                None => {
                    header.set_entry_type(EntryType::Directory);
                    header.set_size(0);
                    header.set_mode(0o755);
                    header.set_cksum();
                    builder.append(&header, &[] as &[u8]).unwrap();
                }
            }
        }

        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn extracts_only_app_prefixed_entries() {
        let tmp = TempDir::new().unwrap();
        let tarball = tmp.path().join("droplet.tgz");
        build_tarball(
            &tarball,
            &[
                ("./app/a.txt", Some(b"alpha".as_slice())),
                ("./other/b.txt", Some(b"beta".as_slice())),
                ("./app/sub/", None),
            ],
        );

        let dest = tmp.path().join("out");
        fs::create_dir_all(&dest).unwrap();
        extract_app_folder(&tarball, &dest).unwrap();

        assert_eq!(fs::read(dest.join("app/a.txt")).unwrap(), b"alpha");
        assert!(dest.join("app/sub").is_dir());
        assert!(!dest.join("other").exists());
        assert!(!dest.join("app/b.txt").exists());
    }

    #[test]
    fn extraction_creates_parents_on_demand() {
        let tmp = TempDir::new().unwrap();
        let tarball = tmp.path().join("droplet.tgz");
        // File entry with no preceding directory entry for its parent.
        build_tarball(
            &tarball,
            &[("./app/deep/nested/file.txt", Some(b"x".as_slice()))],
        );

        let dest = tmp.path().join("out");
        fs::create_dir_all(&dest).unwrap();
        extract_app_folder(&tarball, &dest).unwrap();

        assert_eq!(fs::read(dest.join("app/deep/nested/file.txt")).unwrap(), b"x");
    }

    #[test]
    fn corrupt_tarball_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let tarball = tmp.path().join("droplet.tgz");
        fs::write(&tarball, b"not a gzip stream").unwrap();

        let dest = tmp.path().join("out");
        fs::create_dir_all(&dest).unwrap();
        let err = extract_app_folder(&tarball, &dest).unwrap_err();
        assert!(matches!(err, RetrieveError::Extract { .. }));
    }

    #[tokio::test]
    async fn retrieve_without_download_reuses_existing_tarball() {
        let tmp = TempDir::new().unwrap();
        let retriever = DropletRetriever::new(tmp.path().to_path_buf(), false);
        build_tarball(
            &retriever.tarball_path("d-1"),
            &[("./app/readme.txt", Some(b"hi".as_slice()))],
        );

        let app_dir = retriever.retrieve("billing", "d-1").await.unwrap();

        assert_eq!(app_dir, retriever.droplet_dir("d-1").join("app"));
        assert_eq!(fs::read(app_dir.join("readme.txt")).unwrap(), b"hi");
    }

    #[tokio::test]
    async fn retrieve_replaces_stale_extraction_dir() {
        let tmp = TempDir::new().unwrap();
        let retriever = DropletRetriever::new(tmp.path().to_path_buf(), false);
        let stale = retriever.droplet_dir("d-1").join("app").join("stale.txt");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, b"old").unwrap();
        build_tarball(
            &retriever.tarball_path("d-1"),
            &[("./app/fresh.txt", Some(b"new".as_slice()))],
        );

        let app_dir = retriever.retrieve("billing", "d-1").await.unwrap();

        assert!(!app_dir.join("stale.txt").exists());
        assert_eq!(fs::read(app_dir.join("fresh.txt")).unwrap(), b"new");
    }

    #[test]
    fn cleanup_removes_tarball_and_dir() {
        let tmp = TempDir::new().unwrap();
        let retriever = DropletRetriever::new(tmp.path().to_path_buf(), true);
        fs::write(retriever.tarball_path("d-1"), b"tar").unwrap();
        fs::create_dir_all(retriever.droplet_dir("d-1").join("app")).unwrap();

        retriever.cleanup("d-1").unwrap();

        assert!(!retriever.tarball_path("d-1").exists());
        assert!(!retriever.droplet_dir("d-1").exists());
    }

    #[test]
    fn cleanup_tolerates_missing_paths() {
        let tmp = TempDir::new().unwrap();
        let retriever = DropletRetriever::new(tmp.path().to_path_buf(), true);
        retriever.cleanup("never-downloaded").unwrap();
    }
}
