use crate::shader::SourceFile;

use std::io;
use std::path::Path;

/// Lists the files in `dir` whose extension is one of `extensions`.
///
/// Symlinks are followed, so a link to a shader counts as a shader. An
/// unreadable directory entry is an error rather than a silently skipped file.
/// The result is sorted by path so that logs are stable between runs.
pub fn find_sources<P, S>(dir: P, extensions: &[S]) -> Result<Vec<SourceFile>, io::Error>
where
    P: AsRef<Path>,
    S: AsRef<str>,
{
    let paths = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()?;
    let mut files = paths
        .into_iter()
        .filter_map(|path| {
            if !path.is_file() {
                return None;
            }
            let source = SourceFile::new(path)?;
            if !extensions.iter().any(|ext| ext.as_ref() == source.extension()) {
                return None;
            }
            Some(source)
        })
        .collect::<Vec<_>>();
    files.sort_by(|a, b| a.path().cmp(b.path()));
    Ok(files)
}

/// Creates `dir` and any missing parents. Returns whether it had to be created.
pub fn ensure_dir<P: AsRef<Path>>(dir: P) -> Result<bool, io::Error> {
    let dir = dir.as_ref();
    if dir.is_dir() {
        return Ok(false);
    }
    std::fs::create_dir_all(dir)?;
    Ok(true)
}
