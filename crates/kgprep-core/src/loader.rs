//! Reading rating and knowledge-graph files.
//!
//! Both files are whitespace-separated integer columns, one record per line:
//!
//! ```text
//! ratings_final.txt   user item label
//! kg_final.txt        head relation tail
//! ```
//!
//! With the `binary` feature the parsed arrays can be cached next to the text
//! files (`*.bin`, bincode) and reloaded without parsing.

use crate::{Error, Rating, Result, Triple};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Rating file stem inside a dataset directory.
pub const RATING_FILE: &str = "ratings_final";
/// Knowledge-graph file stem inside a dataset directory.
pub const KG_FILE: &str = "kg_final";

/// Text and cache paths of one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetFiles {
    dir: PathBuf,
}

impl DatasetFiles {
    /// Files under `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Dataset directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `ratings_final.txt`
    pub fn ratings_text(&self) -> PathBuf {
        self.dir.join(format!("{RATING_FILE}.txt"))
    }

    /// `ratings_final.bin`
    pub fn ratings_cache(&self) -> PathBuf {
        self.dir.join(format!("{RATING_FILE}.bin"))
    }

    /// `kg_final.txt`
    pub fn kg_text(&self) -> PathBuf {
        self.dir.join(format!("{KG_FILE}.txt"))
    }

    /// `kg_final.bin`
    pub fn kg_cache(&self) -> PathBuf {
        self.dir.join(format!("{KG_FILE}.bin"))
    }
}

/// Parse rows of three integer columns.
fn read_rows<R: Read, T>(
    reader: R,
    source: &Path,
    mut make: impl FnMut([i64; 3]) -> Option<T>,
) -> Result<Vec<T>> {
    let reader = BufReader::new(reader);
    let mut out = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parse_err = |message: String| Error::Parse {
            path: source.to_path_buf(),
            line: idx + 1,
            message,
        };

        let mut cols = [0i64; 3];
        let mut fields = line.split_whitespace();
        for (i, col) in cols.iter_mut().enumerate() {
            let field = fields
                .next()
                .ok_or_else(|| parse_err(format!("expected 3 columns, found {i}")))?;
            *col = field
                .parse()
                .map_err(|_| parse_err(format!("column {} is not an integer: {field:?}", i + 1)))?;
        }

        let row = make(cols).ok_or_else(|| parse_err("id out of range".to_string()))?;
        out.push(row);
    }

    Ok(out)
}

fn to_id(v: i64) -> Option<u32> {
    u32::try_from(v).ok()
}

/// Read `user item label` rows.
pub fn read_ratings<R: Read>(reader: R) -> Result<Vec<Rating>> {
    read_ratings_from(reader, Path::new("<reader>"))
}

fn read_ratings_from<R: Read>(reader: R, source: &Path) -> Result<Vec<Rating>> {
    read_rows(reader, source, |[user, item, label]| {
        Some(Rating::new(
            to_id(user)?,
            to_id(item)?,
            i32::try_from(label).ok()?,
        ))
    })
}

/// Read `head relation tail` rows.
pub fn read_triples<R: Read>(reader: R) -> Result<Vec<Triple>> {
    read_triples_from(reader, Path::new("<reader>"))
}

fn read_triples_from<R: Read>(reader: R, source: &Path) -> Result<Vec<Triple>> {
    read_rows(reader, source, |[head, relation, tail]| {
        Some(Triple::new(to_id(head)?, to_id(relation)?, to_id(tail)?))
    })
}

/// Read a rating text file.
pub fn read_ratings_file(path: impl AsRef<Path>) -> Result<Vec<Rating>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    read_ratings_from(file, path)
}

/// Read a knowledge-graph text file.
pub fn read_triples_file(path: impl AsRef<Path>) -> Result<Vec<Triple>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    read_triples_from(file, path)
}

/// Load ratings, preferring the binary cache when `use_cache` is set.
pub fn load_ratings(files: &DatasetFiles, use_cache: bool) -> Result<Vec<Rating>> {
    info!(dir = %files.dir().display(), "reading rating file");
    load_cached(
        &files.ratings_text(),
        &files.ratings_cache(),
        use_cache,
        |p| read_ratings_file(p),
    )
}

/// Load triples, preferring the binary cache when `use_cache` is set.
pub fn load_triples(files: &DatasetFiles, use_cache: bool) -> Result<Vec<Triple>> {
    info!(dir = %files.dir().display(), "reading KG file");
    load_cached(&files.kg_text(), &files.kg_cache(), use_cache, |p| {
        read_triples_file(p)
    })
}

#[cfg(feature = "binary")]
fn load_cached<T>(
    text: &Path,
    cache_path: &Path,
    use_cache: bool,
    parse: impl Fn(&Path) -> Result<Vec<T>>,
) -> Result<Vec<T>>
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    if use_cache && cache_path.exists() {
        let rows = cache::read(cache_path)?;
        debug!(path = %cache_path.display(), rows = rows.len(), "loaded from cache");
        return Ok(rows);
    }
    let rows = parse(text)?;
    debug!(path = %text.display(), rows = rows.len(), "parsed text file");
    if use_cache {
        cache::write(cache_path, &rows)?;
        debug!(path = %cache_path.display(), "wrote cache");
    }
    Ok(rows)
}

#[cfg(not(feature = "binary"))]
fn load_cached<T>(
    text: &Path,
    _cache: &Path,
    _use_cache: bool,
    parse: impl Fn(&Path) -> Result<Vec<T>>,
) -> Result<Vec<T>> {
    let rows = parse(text)?;
    debug!(path = %text.display(), rows = rows.len(), "parsed text file");
    Ok(rows)
}

/// Bincode cache of parsed rows.
#[cfg(feature = "binary")]
pub mod cache {
    use crate::{Error, Result};
    use serde::de::DeserializeOwned;
    use serde::Serialize;
    use std::fs::File;
    use std::io::{BufReader, BufWriter, Write};
    use std::path::Path;

    /// Read rows from a cache file.
    pub fn read<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
        let file = File::open(path)?;
        bincode::deserialize_from(BufReader::new(file)).map_err(|e| Error::Cache(e.to_string()))
    }

    /// Write rows to a cache file.
    pub fn write<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, rows).map_err(|e| Error::Cache(e.to_string()))?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_ratings() {
        let text = "0 10 1\n0 11 0\n\n3\t10\t1\n";
        let ratings = read_ratings(text.as_bytes()).unwrap();
        assert_eq!(
            ratings,
            vec![
                Rating::new(0, 10, 1),
                Rating::new(0, 11, 0),
                Rating::new(3, 10, 1)
            ]
        );
    }

    #[test]
    fn test_read_triples() {
        let triples = read_triples("1 5 2\n2 0 3\n".as_bytes()).unwrap();
        assert_eq!(triples, vec![Triple::new(1, 5, 2), Triple::new(2, 0, 3)]);
    }

    #[test]
    fn test_extra_columns_ignored() {
        let triples = read_triples("1 5 2 0.9\n".as_bytes()).unwrap();
        assert_eq!(triples, vec![Triple::new(1, 5, 2)]);
    }

    #[test]
    fn test_short_row_reports_line() {
        let err = read_triples("1 5 2\n7 8\n".as_bytes()).unwrap_err();
        match err {
            Error::Parse { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("expected 3 columns"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_integer_rejected() {
        let err = read_ratings("1 x 0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn test_negative_id_rejected() {
        let err = read_triples("-1 0 2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn test_negative_label_allowed() {
        let ratings = read_ratings("4 2 -1\n".as_bytes()).unwrap();
        assert_eq!(ratings, vec![Rating::new(4, 2, -1)]);
    }

    #[test]
    fn test_dataset_paths() {
        let files = DatasetFiles::new("data/movie");
        assert_eq!(files.ratings_text(), Path::new("data/movie/ratings_final.txt"));
        assert_eq!(files.kg_cache(), Path::new("data/movie/kg_final.bin"));
    }

    #[cfg(feature = "binary")]
    #[test]
    fn test_cache_written_and_preferred() {
        let dir = tempfile::tempdir().unwrap();
        let files = DatasetFiles::new(dir.path());
        std::fs::write(files.kg_text(), "0 1 2\n").unwrap();

        let first = load_triples(&files, true).unwrap();
        assert!(files.kg_cache().exists());

        // Cache wins over a changed text file.
        std::fs::write(files.kg_text(), "5 5 5\n").unwrap();
        let second = load_triples(&files, true).unwrap();
        assert_eq!(first, second);

        let fresh = load_triples(&files, false).unwrap();
        assert_eq!(fresh, vec![Triple::new(5, 5, 5)]);
    }
}
