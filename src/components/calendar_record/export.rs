use crate::error::AppResult;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// File name for an exported event: the title slugified, with an `.ics` suffix
pub fn file_name(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for word in title.split_whitespace() {
        let cleaned: String = word
            .chars()
            .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
            .flat_map(char::to_lowercase)
            .collect();
        let cleaned = cleaned.trim_matches('.');
        if cleaned.is_empty() {
            continue;
        }
        if !slug.is_empty() {
            slug.push('-');
        }
        slug.push_str(cleaned);
    }
    if slug.is_empty() {
        slug.push_str("event");
    }
    format!("{}.ics", slug)
}

/// Write one encoded event into `dir`, returning the written path
pub async fn write_event(dir: &Path, title: &str, body: &str) -> AppResult<PathBuf> {
    fs::create_dir_all(dir).await?;
    let path = dir.join(file_name(title));
    fs::write(&path, body).await?;
    info!("Wrote calendar file {}", path.display());
    Ok(path)
}

/// Write a batch of `(title, body)` pairs, keeping file names distinct
pub async fn export_events<'a, I>(dir: &Path, events: I) -> AppResult<Vec<PathBuf>>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    fs::create_dir_all(dir).await?;
    let mut used = HashSet::new();
    let mut written = Vec::new();

    for (title, body) in events {
        let base = file_name(title);
        let mut name = base.clone();
        let mut n = 2;
        while !used.insert(name.clone()) {
            name = format!("{}-{}.ics", base.trim_end_matches(".ics"), n);
            n += 1;
        }
        let path = dir.join(&name);
        fs::write(&path, body).await?;
        written.push(path);
    }

    info!("Exported {} calendar files to {}", written.len(), dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("Dinner with sam"), "dinner-with-sam.ics");
        assert_eq!(file_name("  Team   sync "), "team-sync.ics");
        assert_eq!(file_name("Q3/Q4 review: budget?"), "q3q4-review-budget.ics");
        assert_eq!(file_name("../../etc"), "etc.ics");
        assert_eq!(file_name("???"), "event.ics");
        assert_eq!(file_name(""), "event.ics");
    }

    #[tokio::test]
    async fn test_export_keeps_names_distinct() {
        let dir = std::env::temp_dir().join(format!("snapcal-export-{}", uuid::Uuid::new_v4()));
        let written = export_events(
            &dir,
            vec![("Standup", "A"), ("Standup", "B"), ("Lunch", "C")],
        )
        .await
        .unwrap();

        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["standup.ics", "standup-2.ics", "lunch.ics"]);
        assert_eq!(std::fs::read_to_string(&written[1]).unwrap(), "B");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_write_event() {
        let dir = std::env::temp_dir().join(format!("snapcal-write-{}", uuid::Uuid::new_v4()));
        let path = write_event(&dir, "Dentist", "BODY").await.unwrap();
        assert_eq!(path, dir.join("dentist.ics"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "BODY");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
