// SPDX-License-Identifier: MIT

fn summary_from_envelope(
    envelope: ProjectDocumentJson,
    path: PathBuf,
) -> Result<ProjectSummary, StoreError> {
    let id: ProjectId = envelope.id.parse().map_err(|source| StoreError::InvalidId {
        field: "id",
        value: envelope.id.clone(),
        source: Box::new(source),
    })?;

    Ok(ProjectSummary::new(
        id,
        envelope.title,
        envelope.kind,
        path,
        envelope.created_at,
        envelope.updated_at,
    ))
}

fn document_from_envelope(envelope: ProjectDocumentJson) -> Result<ProjectDocument, StoreError> {
    let id: ProjectId = envelope.id.parse().map_err(|source| StoreError::InvalidId {
        field: "id",
        value: envelope.id.clone(),
        source: Box::new(source),
    })?;

    let content = DocumentContent::from_blob(SnapshotBlob::from_string(envelope.content));

    // Older documents carry no top-level createdAt; the snapshot inside the
    // content still does.
    let created_at = envelope
        .created_at
        .or_else(|| created_at_from_content(&content));

    Ok(ProjectDocument::new(
        id,
        envelope.title,
        envelope.kind,
        created_at,
        envelope.updated_at,
        content,
    ))
}

fn created_at_from_content(content: &DocumentContent) -> Option<DateTime<Utc>> {
    let raw = content.as_structured()?.get("createdAt")?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|stamp| stamp.with_timezone(&Utc))
}

/// Case-insensitive title ordering. A stand-in for full locale collation that
/// keeps mixed-case catalogs grouped sensibly.
fn title_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Rejects any path that could step outside a storage root when joined onto
/// it: absolute paths, drive prefixes, and `..` components.
pub(crate) fn validate_relative_path(field: &'static str, path: &Path) -> Result<(), StoreError> {
    let invalid = || StoreError::InvalidRelativePath {
        field,
        value: path.to_path_buf(),
    };

    if path.as_os_str().is_empty() {
        return Err(invalid());
    }
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir | Component::Prefix(_) | Component::RootDir => {
                return Err(invalid());
            }
        }
    }
    Ok(())
}

/// Re-expresses `path` relative to `root`, failing when it does not live
/// underneath it.
fn to_relative_path<'a>(
    root: &Path,
    path: &'a Path,
    field: &'static str,
) -> Result<&'a Path, StoreError> {
    let relative = path.strip_prefix(root).map_err(|_| StoreError::PathOutsideRoot {
        root: root.to_path_buf(),
        path: path.to_path_buf(),
    })?;
    validate_relative_path(field, relative)?;
    Ok(relative)
}

/// Atomically replaces `path` (which must resolve under `root`) with
/// `contents`: write a uniquely named temp file beside the target, then rename
/// it into place. Readers observe either the old file or the new one, never a
/// partial write. Refuses to write through a symlink.
pub(crate) fn write_atomic_in_root(
    root: &Path,
    path: &Path,
    contents: &[u8],
    durability: WriteDurability,
) -> Result<(), StoreError> {
    fs::create_dir_all(root).map_err(|source| StoreError::Io {
        path: root.to_path_buf(),
        source,
    })?;
    to_relative_path(root, path, "path")?;

    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_symlink() => {
            return Err(StoreError::SymlinkRefused {
                path: path.to_path_buf(),
            });
        }
        Ok(_) => {}
        Err(source) if source.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    }

    let parent = path.parent().unwrap_or(root);
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| StoreError::InvalidRelativePath {
            field: "path",
            value: path.to_path_buf(),
        })?;
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or(0);
    let temp_path = parent.join(format!(".bulb.tmp.{file_name}.{nanos}"));

    let io_err = |at: &Path| {
        let at = at.to_path_buf();
        move |source| StoreError::Io { path: at, source }
    };

    let mut temp = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .map_err(io_err(&temp_path))?;
    temp.write_all(contents).map_err(io_err(&temp_path))?;
    if durability == WriteDurability::Durable {
        temp.sync_all().map_err(io_err(&temp_path))?;
    }
    drop(temp);

    if let Err(source) = rename_overwrite(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    #[cfg(unix)]
    if durability == WriteDurability::Durable {
        // Persist the rename itself by syncing the containing directory.
        if let Ok(dir) = fs::File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}

#[cfg(not(windows))]
fn rename_overwrite(from: &Path, to: &Path) -> io::Result<()> {
    fs::rename(from, to)
}

/// Windows `rename` refuses to replace an existing file; fall back to
/// remove-then-rename there.
#[cfg(windows)]
fn rename_overwrite(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            match fs::remove_file(to) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err),
            }
            fs::rename(from, to)
        }
    }
}
