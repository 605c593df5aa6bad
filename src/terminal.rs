//! Interactive prompt loop: choose an archive, search it, page through matches

use chrono::Local;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::archive::Message;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::search::SearchResults;
use crate::search::config::MAX_SEARCH_HITS;
use crate::service::ArchiveSearchService;

/// Number of matches shown per page
pub const PAGE_SIZE: usize = 5;

const RULE: &str = "──────────────────────────────";

const SEARCH_HELP: &str = "\
┌───Search syntax──────────────
│ You can enter a simple query to search the message text, or use the
│ field and boolean syntax below. Search is not case-sensitive.
│
│ Available fields:
│   date (in ISO-8601 format like \"2015-01-30T15:00:00\", in UTC; quote
│     dates and times, a quoted date like \"2015-01-30\" matches the whole day);
│   channel (like 'lunch');
│   user (like 'jesse.plamondon');
│   text (in slack format).
│
│ Example searches:
│   pineapple
│   pineapple OR mango
│   +channel:lunch +user:jesse.plamondon pineapple
│   +channel:(developers OR deployment) +text:\"deployed release\"
│   date:\"2015-01-30\" -channel:random
└──────────────────────────────";

/// Console front end over an [`ArchiveSearchService`]
pub struct Terminal<R, W> {
    input: R,
    output: W,
    page_size: usize,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            page_size: PAGE_SIZE,
        }
    }

    /// Run until the input is closed
    pub fn run(&mut self, service: &ArchiveSearchService) -> Result<()> {
        let Some(dataset) = self.choose_dataset(service)? else {
            return Ok(());
        };
        self.search_loop(service, &dataset)
    }

    /// Ask for an archive to import, or a blank line to reuse the last import
    pub fn choose_dataset(&mut self, service: &ArchiveSearchService) -> Result<Option<Dataset>> {
        loop {
            writeln!(
                self.output,
                "Enter the directory path of the Slack archive (or leave it blank to use the last import):"
            )?;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };

            let archive_dir = line.trim();
            let archive_dir = (!archive_dir.is_empty()).then(|| Path::new(archive_dir));
            match service.import_or_load(archive_dir) {
                Ok(Some(dataset)) => return Ok(Some(dataset)),
                Ok(None) => writeln!(self.output, "There's no cached import available.")?,
                Err(e) if e.is_recoverable() => writeln!(self.output, "{e}")?,
                Err(e) => return Err(e),
            }
        }
    }

    fn search_loop(&mut self, service: &ArchiveSearchService, dataset: &Dataset) -> Result<()> {
        loop {
            self.write_header(dataset)?;
            writeln!(self.output, "{SEARCH_HELP}")?;
            writeln!(self.output)?;
            writeln!(self.output, "What do you want to search?")?;
            write!(self.output, "> ")?;
            self.output.flush()?;

            let Some(line) = self.read_line()? else {
                return Ok(());
            };
            let query = line.trim();
            if query.is_empty() {
                continue;
            }

            let results = service
                .search(query, dataset)
                .and_then(|hits| hits.collect_results());
            match results {
                Ok(results) => {
                    if !self.display_results(&results)? {
                        return Ok(());
                    }
                }
                Err(e) if e.is_recoverable() => writeln!(self.output, "{e}")?,
                Err(e) => return Err(e),
            }
        }
    }

    fn write_header(&mut self, dataset: &Dataset) -> Result<()> {
        let summary = ArchiveSearchService::summary(dataset);
        let format = |t: Option<chrono::DateTime<chrono::Utc>>| {
            t.map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string())
        };

        writeln!(
            self.output,
            "Found {} messages by {} users in {} channels, posted between {} and {}.",
            summary.message_count,
            summary.user_count,
            summary.channel_count,
            format(summary.earliest),
            format(summary.latest)
        )?;
        writeln!(
            self.output,
            "All times are shown in local time (UTC{}).",
            Local::now().format("%:z")
        )?;
        writeln!(self.output)?;
        Ok(())
    }

    /// Page through search results; returns `false` once the input is closed
    pub fn display_results(&mut self, results: &SearchResults<'_>) -> Result<bool> {
        if !results.orphaned.is_empty() {
            writeln!(
                self.output,
                "{} matches were skipped because the search index is out of sync with the cached import. Import the archive again to rebuild it.",
                results.orphaned.len()
            )?;
        }

        let count = results.messages.len();
        if count == 0 {
            writeln!(self.output, "No matches found. :(")?;
            writeln!(self.output, "Hit enter to continue.")?;
            return Ok(self.read_line()?.is_some());
        }

        let rendered: Vec<String> = results.messages.iter().map(|m| render_message(m)).collect();
        let mut offset = 0;
        loop {
            writeln!(self.output, "Found {count} matches.")?;
            if results.total_matches > count && count == MAX_SEARCH_HITS {
                writeln!(
                    self.output,
                    "Only the first {count} of {} matches are shown; narrow the search to see the rest.",
                    results.total_matches
                )?;
            }

            let end = (offset + self.page_size).min(count);
            for entry in &rendered[offset..end] {
                writeln!(self.output, "{entry}")?;
            }
            writeln!(self.output, "Viewing matches {}–{} of {}.", offset + 1, end, count)?;

            let mut options = Vec::new();
            let mut question = String::new();
            if offset > 0 {
                options.push('p');
                question.push_str("[p]revious page  ");
            }
            if end < count {
                options.push('n');
                question.push_str("[n]ext page  ");
            }
            options.push('q');
            question.push_str("[q]uit");

            match self.read_option(&question, &options)? {
                Some('p') => offset = offset.saturating_sub(self.page_size),
                Some('n') => offset = end,
                Some(_) => return Ok(true),
                None => return Ok(false),
            }
        }
    }

    /// Ask until one of `options` is entered; `None` when the input is closed
    fn read_option(&mut self, question: &str, options: &[char]) -> Result<Option<char>> {
        loop {
            writeln!(self.output, "{question}")?;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };

            let mut chars = line.trim().chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if options.contains(&c) => return Ok(Some(c)),
                _ => writeln!(self.output, "Invalid answer.")?,
            }
        }
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

/// Render a match as a boxed entry, in local time
pub fn render_message(message: &Message) -> String {
    let date = message
        .timestamp()
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M");
    let text = message.text().split('\n').collect::<Vec<_>>().join("\n│ ");

    format!(
        "┌{RULE}\n│ Date:    {date}\n│ Channel: #{}\n│ User:    {}\n│ {text}\n└{RULE}",
        message.channel_name, message.resolved_author_handle
    )
}
