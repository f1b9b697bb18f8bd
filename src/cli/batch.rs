use anyhow::{Context, Result};
use std::path::Path;

use crate::catalog::NameMap;
use crate::manager::ClipManager;

/// Marks an open-ended clip in the end column
pub const OPEN_END: &str = "-";

/// One line of a batch file:
///
/// ```text
/// https://youtu.be/_6_gwZd-HEE 0:06:52 00:06:53 test_category zh:rua jp:aaa en:fff
/// ^url                         ^start  ^end     ^category     ^names (locale:name)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub line: usize,
    pub url: String,
    pub start: String,
    pub end: Option<String>,
    pub category: String,
    pub names: NameMap,
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub published: Vec<String>,
    pub failed: Vec<(usize, String)>,
}

/// Parse a single line; blank lines and `#` comments yield `None`
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<BatchEntry>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 5 {
        anyhow::bail!(
            "line {}: expected `<url> <start> <end> <category> <locale:name>...`, got {} fields",
            line_no,
            fields.len()
        );
    }

    let names = crate::utils::parse_names(&fields[4..])
        .with_context(|| format!("line {}", line_no))?;

    Ok(Some(BatchEntry {
        line: line_no,
        url: fields[0].to_string(),
        start: fields[1].to_string(),
        end: (fields[2] != OPEN_END).then(|| fields[2].to_string()),
        category: fields[3].to_string(),
        names,
    }))
}

/// Parse a whole batch file, failing on the first malformed line
pub fn parse_file(path: &Path) -> Result<Vec<BatchEntry>> {
    let content = fs_err::read_to_string(path)?;
    let mut entries = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        if let Some(entry) = parse_line(idx + 1, line)? {
            entries.push(entry);
        }
    }

    Ok(entries)
}

/// Generate and publish every entry; a failing line is reported and skipped
pub async fn run(manager: &mut ClipManager, entries: Vec<BatchEntry>) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for entry in entries {
        tracing::info!("Batch line {}: {}", entry.line, entry.url);

        let result = async {
            let uid = manager
                .generate(&entry.url, &entry.start, entry.end.as_deref())
                .await?;
            manager.publish(&uid, &entry.category, entry.names.clone()).await?;
            Ok::<_, crate::ClipperError>(uid)
        }
        .await;

        match result {
            Ok(uid) => summary.published.push(uid),
            Err(e) => {
                tracing::warn!("Batch line {} failed: {}", entry.line, e);
                summary.failed.push((entry.line, e.to_string()));
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogClient, CatalogDocument, MockCatalogBackend};
    use crate::clip::ClipStatus;
    use crate::extractors::MockMediaExtractor;
    use crate::normalize::MockNormalizer;
    use crate::storage::MockObjectStorage;
    use crate::store::ClipStore;
    use std::path::PathBuf;

    #[test]
    fn test_parse_line() {
        let entry = parse_line(
            1,
            "https://youtu.be/_6_gwZd-HEE 0:06:52 00:06:53 test_category zh:rua jp:aaa en:fff",
        )
        .unwrap()
        .unwrap();

        assert_eq!(entry.url, "https://youtu.be/_6_gwZd-HEE");
        assert_eq!(entry.start, "0:06:52");
        assert_eq!(entry.end.as_deref(), Some("00:06:53"));
        assert_eq!(entry.category, "test_category");
        assert_eq!(entry.names.len(), 3);
        assert_eq!(entry.names["jp"], "aaa");
    }

    #[test]
    fn test_open_end_and_comments() {
        assert_eq!(parse_line(1, "   ").unwrap(), None);
        assert_eq!(parse_line(2, "# skipped").unwrap(), None);

        let entry = parse_line(3, "https://youtu.be/x 0:00:10 - moe en:Hi").unwrap().unwrap();
        assert_eq!(entry.end, None);
    }

    #[test]
    fn test_short_or_bad_lines_fail() {
        assert!(parse_line(1, "https://youtu.be/x 0:00:10 0:00:11 moe").is_err());
        let err = parse_line(7, "https://youtu.be/x 0:00:10 0:00:11 moe english").unwrap_err();
        assert!(format!("{:#}", err).contains("line 7"));
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bat");
        fs_err::write(
            &path,
            "# clips\nhttps://youtu.be/a 0:00:01 0:00:02 moe en:A\n\nhttps://youtu.be/b 0:00:03 - moe zh:B\n",
        )
        .unwrap();

        let entries = parse_file(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].line, 2);
        assert_eq!(entries[1].line, 4);
    }

    #[tokio::test]
    async fn test_run_continues_after_failed_line() {
        let dir = tempfile::TempDir::new().unwrap();

        let mut backend = MockCatalogBackend::new();
        backend.expect_authorize().returning(|| Ok(()));
        backend.expect_fetch().returning(|| {
            let mut doc = CatalogDocument::default();
            doc.categories.insert("moe".into(), NameMap::from([("en".to_string(), "Moe".to_string())]));
            Ok(doc)
        });
        backend.expect_push().times(1).returning(|_| Ok(()));

        let mut extractor = MockMediaExtractor::new();
        extractor.expect_platform_name().return_const("mock");
        extractor
            .expect_extract()
            .returning(|_, _, name| Ok(PathBuf::from(format!("storage/{}.mp3", name))));
        let mut normalizer = MockNormalizer::new();
        normalizer
            .expect_normalize()
            .returning(|input, _| Ok(PathBuf::from("normalized").join(input.file_name().unwrap())));
        let mut storage = MockObjectStorage::new();
        storage
            .expect_upload()
            .returning(|_, name| Ok(format!("https://cdn.example/{}", name)));

        let mut manager = ClipManager::new(
            ClipStore::load(dir.path().join("clips.json")).unwrap(),
            CatalogClient::connect(Box::new(backend)).await.unwrap(),
            Box::new(extractor),
            Box::new(normalizer),
            Box::new(storage),
        );

        let entries = vec![
            parse_line(1, "https://youtu.be/a 0:00:01 0:00:02 moe en:A").unwrap().unwrap(),
            parse_line(2, "https://youtu.be/b 0:00:01 0:00:02 nope en:B").unwrap().unwrap(),
            parse_line(3, "https://youtu.be/c 0:61:00 - moe en:C").unwrap().unwrap(),
        ];
        let summary = run(&mut manager, entries).await;

        assert_eq!(summary.published.len(), 1);
        assert_eq!(summary.failed.iter().map(|(line, _)| *line).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(manager.status(&summary.published[0]).unwrap(), ClipStatus::Published);
        // the clip of the failed publish stays uploaded
        assert_eq!(manager.list().len(), 2);
    }
}
