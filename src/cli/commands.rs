use std::path::Path;

use crate::app::{AppContext, AppError, Result};
use crate::domain::{NewColumn, PreviewRecord};
use crate::extractor::text::truncate_chars;
use crate::store::ColumnStore;

/// URLs from the command line followed by those in `file`.
/// Blank lines and `#` comments in the file are skipped.
pub fn collect_urls(urls: &[String], file: Option<&Path>) -> Result<Vec<String>> {
    let mut all: Vec<String> = urls.to_vec();

    if let Some(path) = file {
        let content = std::fs::read_to_string(path)?;
        all.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(String::from),
        );
    }

    Ok(all)
}

async fn scrape(ctx: &AppContext, urls: &[String]) -> Result<Vec<PreviewRecord>> {
    if urls.is_empty() {
        return Err(AppError::Validation("no URLs given".into()));
    }

    let scraper = ctx.batch_scraper();
    let records = scraper.run(urls, ctx.config.scraper.max_batch_urls).await?;
    Ok(records)
}

pub async fn preview(ctx: &AppContext, urls: &[String], json: bool) -> Result<()> {
    let records = scrape(ctx, urls).await?;

    if json {
        let out = serde_json::to_string_pretty(&records).map_err(|e| AppError::Other(e.to_string()))?;
        println!("{}", out);
        return Ok(());
    }

    if records.is_empty() {
        println!("No columns scraped");
        return Ok(());
    }

    for record in &records {
        println!("{}", format_record(record));
    }
    println!("{} of {} pages scraped", records.len(), urls.len());
    Ok(())
}

pub async fn import(ctx: &AppContext, urls: &[String]) -> Result<()> {
    let records = scrape(ctx, urls).await?;

    if records.is_empty() {
        println!("No columns scraped, nothing saved");
        return Ok(());
    }

    let columns: Vec<NewColumn> = records.into_iter().map(NewColumn::from).collect();
    let saved = ctx.store.insert_columns(&columns)?;

    for column in &saved {
        println!("Saved {} ({})", column.name, column.id);
    }
    println!("Saved {} columns", saved.len());
    Ok(())
}

pub fn list_columns(ctx: &AppContext) -> Result<()> {
    let columns = ctx.store.list_columns()?;

    if columns.is_empty() {
        println!("No columns");
        return Ok(());
    }

    for column in columns {
        let status = if column.is_published { "published" } else { "draft" };
        println!(
            "{} by {} [{}]\n  {} readers, {} posts, added {}\n  {}",
            column.name,
            column.author,
            status,
            column.subscribers,
            column.content_count,
            column.created_at.format("%Y-%m-%d"),
            column.url
        );
    }

    Ok(())
}

fn format_record(record: &PreviewRecord) -> String {
    let mut out = format!(
        "{} by {}\n  {} readers, {} posts\n  {}",
        record.name, record.author, record.reader_count, record.content_count, record.url
    );
    if !record.description.is_empty() {
        out.push_str("\n  ");
        out.push_str(&truncate_chars(&record.description, 80));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_collect_urls_from_args_and_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# reading list").unwrap();
        writeln!(file, "https://site/p/b").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  https://site/p/c  ").unwrap();

        let urls = assert_ok!(collect_urls(&["https://site/p/a".to_string()], Some(file.path())));
        assert_eq!(urls, vec!["https://site/p/a", "https://site/p/b", "https://site/p/c"]);
    }

    #[test]
    fn test_collect_urls_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = collect_urls(&[], Some(&dir.path().join("missing.txt")));
        assert!(matches!(assert_err!(result), AppError::Io(_)));
    }

    #[tokio::test]
    async fn test_scrape_requires_urls() {
        let ctx = AppContext::in_memory(Default::default()).unwrap();
        let result = scrape(&ctx, &[]).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_format_record() {
        let record = PreviewRecord {
            url: "https://site/p/abc".into(),
            name: "效率手册".into(),
            author: "阿明".into(),
            description: "每周一篇深度文章".into(),
            avatar: String::new(),
            reader_count: 1280,
            content_count: 56,
        };
        let out = format_record(&record);
        assert!(out.starts_with("效率手册 by 阿明"));
        assert!(out.contains("1280 readers, 56 posts"));
        assert!(out.ends_with("每周一篇深度文章"));
    }
}
