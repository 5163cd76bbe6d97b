//! Concurrent line page fetcher.
//!
//! Retrieves every catalog line's detail page, extracts its outbound and
//! inbound stop sequences, and checkpoints partial progress to disk. One
//! line failing never affects the others.

mod checkpoint;
mod page;
mod scheduler;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::catalog::LineRef;
use crate::domain::LineId;
use crate::source::{FetchError, PageSource};

pub use checkpoint::{Checkpoint, CheckpointError};
pub use page::{
    LineDirections, PAYLOAD_VAR, extract_json_after_var, parse_dom, parse_line_page,
    parse_payload, supplementary_url,
};
pub use scheduler::{SlotTable, for_each_indexed, worker_count};

/// Default number of pages fetched at once.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Default number of successful fetches between checkpoints.
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 5;

/// Configuration for a fetch run.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Maximum pages in flight
    pub concurrency: usize,
    /// Checkpoint after this many successes (0 disables checkpoints)
    pub checkpoint_interval: usize,
}

impl FetchConfig {
    pub fn new() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n;
        self
    }

    pub fn with_checkpoint_interval(mut self, n: usize) -> Self {
        self.checkpoint_interval = n;
        self
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A catalog line together with its fetched stop sequences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedLine {
    #[serde(flatten)]
    pub line: LineRef,
    pub directions: LineDirections,
}

/// Result of a fetch run: one slot per input line.
#[derive(Debug)]
pub struct FetchOutcome {
    /// `None` where the line failed.
    pub slots: Vec<Option<FetchedLine>>,
    /// Lines fetched in this run.
    pub succeeded: usize,
    /// Lines that failed.
    pub failed: usize,
    /// Lines taken from a previous checkpoint instead of fetched.
    pub resumed: usize,
}

impl FetchOutcome {
    /// Successfully obtained lines, in catalog order.
    pub fn into_lines(self) -> Vec<FetchedLine> {
        self.slots.into_iter().flatten().collect()
    }
}

/// Fetch one line's stop sequences.
///
/// If either direction is missing from the main page, the inbound variant
/// of the page is fetched once to fill it in.
pub async fn fetch_line<S: PageSource>(
    source: &S,
    line: &LineRef,
) -> Result<LineDirections, FetchError> {
    let html = source.fetch(&line.link).await?;
    let mut directions = parse_line_page(&html);

    if !directions.is_complete() {
        let url = supplementary_url(&line.link);
        debug!(line = %line.number, url = %url, "fetching supplementary page");
        match source.fetch(&url).await {
            Ok(extra) => directions.fill_missing(parse_line_page(&extra)),
            Err(e) if !directions.is_empty() => {
                warn!(line = %line.number, error = %e, "supplementary page failed");
            }
            Err(e) => return Err(e),
        }
    }

    if directions.is_empty() {
        return Err(FetchError::NoStops);
    }

    Ok(directions)
}

/// Fetch every line in `items`.
pub async fn fetch_all<S: PageSource>(
    items: &[LineRef],
    config: &FetchConfig,
    source: &S,
    checkpoint: Option<&Checkpoint>,
) -> FetchOutcome {
    fetch_all_resuming(items, config, source, checkpoint, Vec::new()).await
}

/// Fetch every line in `items`, reusing `resumed` results for lines they
/// already cover.
pub async fn fetch_all_resuming<S: PageSource>(
    items: &[LineRef],
    config: &FetchConfig,
    source: &S,
    checkpoint: Option<&Checkpoint>,
    resumed: Vec<FetchedLine>,
) -> FetchOutcome {
    let slots = SlotTable::new(items.len());

    let mut previous: HashMap<LineId, LineDirections> = resumed
        .into_iter()
        .map(|f| (f.line.number, f.directions))
        .collect();
    let mut resumed_count = 0;
    for (index, line) in items.iter().enumerate() {
        if let Some(directions) = previous.remove(&line.number) {
            slots.fill(
                index,
                FetchedLine {
                    line: line.clone(),
                    directions,
                },
            );
            resumed_count += 1;
        }
    }

    let succeeded = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let checkpoint_lock = Mutex::new(());
    let total = items.len();

    let (slots_ref, succeeded_ref, failed_ref, lock_ref) =
        (&slots, &succeeded, &failed, &checkpoint_lock);

    for_each_indexed(items, config.concurrency, move |index, line| async move {
        if slots_ref.is_filled(index) {
            return;
        }

        match fetch_line(source, line).await {
            Ok(directions) => {
                slots_ref.fill(
                    index,
                    FetchedLine {
                        line: line.clone(),
                        directions,
                    },
                );
                let done = succeeded_ref.fetch_add(1, Ordering::SeqCst) + 1;
                info!(
                    line = %line.number,
                    "processed line ({}/{})",
                    slots_ref.filled(),
                    total
                );

                if let Some(checkpoint) = checkpoint
                    && config.checkpoint_interval > 0
                    && done % config.checkpoint_interval == 0
                {
                    let _guard = lock_ref.lock().await;
                    let snapshot = slots_ref.snapshot();
                    match checkpoint.save(&snapshot).await {
                        Ok(()) => info!(
                            lines = snapshot.len(),
                            path = %checkpoint.path().display(),
                            "checkpoint saved"
                        ),
                        Err(e) => warn!(error = %e, "checkpoint failed"),
                    }
                }
            }
            Err(e) => {
                failed_ref.fetch_add(1, Ordering::SeqCst);
                warn!(line = %line.number, error = %e, "failed line");
            }
        }
    })
    .await;

    FetchOutcome {
        slots: slots.into_slots(),
        succeeded: succeeded.into_inner(),
        failed: failed.into_inner(),
        resumed: resumed_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    /// Canned pages keyed by URL; counts every request.
    struct MockSource {
        pages: HashMap<String, String>,
        calls: StdMutex<Vec<String>>,
    }

    impl MockSource {
        fn new() -> Self {
            Self {
                pages: HashMap::new(),
                calls: StdMutex::new(Vec::new()),
            }
        }

        fn add_page(&mut self, url: impl Into<String>, html: impl Into<String>) {
            self.pages.insert(url.into(), html.into());
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl PageSource for MockSource {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            tokio::task::yield_now().await;
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    fn line_ref(number: &str) -> LineRef {
        LineRef {
            number: LineId::parse(number).unwrap(),
            kind: "Bus".to_string(),
            colour: "#000000".to_string(),
            link: format!("https://example.org/en/lignes/{number}"),
            name: None,
        }
    }

    fn payload_page(aller: &[&str], retour: &[&str]) -> String {
        let entries = |names: &[&str]| -> String {
            names
                .iter()
                .enumerate()
                .map(|(i, n)| format!("\"{i}\":{{\"name\":\"{n}\",\"minute\":{i}}}"))
                .collect::<Vec<_>>()
                .join(",")
        };
        format!(
            "<script>var ligneArrets={{\"aller\":{{{}}},\"retour\":{{{}}}}};</script>",
            entries(aller),
            entries(retour)
        )
    }

    #[tokio::test]
    async fn one_request_per_item_and_one_slot_per_item() {
        let items: Vec<LineRef> = (1..=12).map(|n| line_ref(&n.to_string())).collect();
        let mut source = MockSource::new();
        for item in &items {
            source.add_page(&item.link, payload_page(&["A", "B"], &["B", "A"]));
        }

        let config = FetchConfig::new().with_concurrency(5);
        let outcome = fetch_all(&items, &config, &source, None).await;

        assert_eq!(source.call_count(), 12);
        assert_eq!(outcome.slots.len(), 12);
        assert_eq!(outcome.succeeded, 12);
        assert_eq!(outcome.failed, 0);
        for (item, slot) in items.iter().zip(&outcome.slots) {
            assert_eq!(slot.as_ref().unwrap().line.number, item.number);
        }
    }

    #[tokio::test]
    async fn failures_leave_empty_slots() {
        let items: Vec<LineRef> = (1..=4).map(|n| line_ref(&n.to_string())).collect();
        let mut source = MockSource::new();
        source.add_page(&items[0].link, payload_page(&["A"], &["B"]));
        source.add_page(&items[2].link, payload_page(&["C"], &["D"]));

        let outcome = fetch_all(&items, &FetchConfig::new(), &source, None).await;

        assert_eq!(outcome.slots.len(), 4);
        assert!(outcome.slots[0].is_some());
        assert!(outcome.slots[1].is_none());
        assert!(outcome.slots[2].is_some());
        assert!(outcome.slots[3].is_none());
        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.failed, 2);
        assert_eq!(outcome.into_lines().len(), 2);
    }

    #[tokio::test]
    async fn missing_direction_triggers_one_supplementary_fetch() {
        let line = line_ref("12");
        let mut source = MockSource::new();
        source.add_page(&line.link, payload_page(&["A", "B"], &[]));
        source.add_page(
            supplementary_url(&line.link),
            payload_page(&["X"], &["B", "A"]),
        );

        let directions = fetch_line(&source, &line).await.unwrap();

        assert_eq!(source.call_count(), 2);
        assert_eq!(directions.aller, vec!["A", "B"]);
        assert_eq!(directions.retour, vec!["B", "A"]);
    }

    #[tokio::test]
    async fn failed_supplementary_fetch_keeps_the_direction_found() {
        let line = line_ref("12");
        let mut source = MockSource::new();
        source.add_page(&line.link, payload_page(&["A", "B"], &[]));

        let directions = fetch_line(&source, &line).await.unwrap();
        assert_eq!(directions.aller, vec!["A", "B"]);
        assert!(directions.retour.is_empty());
    }

    #[tokio::test]
    async fn page_without_stops_fails() {
        let line = line_ref("12");
        let mut source = MockSource::new();
        source.add_page(&line.link, "<html></html>");
        source.add_page(supplementary_url(&line.link), "<html></html>");

        assert!(matches!(
            fetch_line(&source, &line).await,
            Err(FetchError::NoStops)
        ));
    }

    #[tokio::test]
    async fn checkpoints_are_written_during_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = Checkpoint::new(dir.path().join("lines.partial.json"));

        let items: Vec<LineRef> = (1..=5).map(|n| line_ref(&n.to_string())).collect();
        let mut source = MockSource::new();
        for item in &items {
            source.add_page(&item.link, payload_page(&["A"], &["B"]));
        }

        let config = FetchConfig::new()
            .with_concurrency(2)
            .with_checkpoint_interval(2);
        let outcome = fetch_all(&items, &config, &source, Some(&checkpoint)).await;

        assert_eq!(outcome.succeeded, 5);
        let saved = checkpoint.load().await.unwrap();
        assert!(saved.len() >= 4);
    }

    #[tokio::test]
    async fn resumed_lines_are_not_fetched_again() {
        let items: Vec<LineRef> = (1..=3).map(|n| line_ref(&n.to_string())).collect();
        let mut source = MockSource::new();
        for item in &items {
            source.add_page(&item.link, payload_page(&["A"], &["B"]));
        }

        let previous = vec![FetchedLine {
            line: items[1].clone(),
            directions: LineDirections {
                aller: vec!["Old".into()],
                retour: vec!["Older".into()],
            },
        }];

        let outcome =
            fetch_all_resuming(&items, &FetchConfig::new(), &source, None, previous).await;

        assert_eq!(source.call_count(), 2);
        assert_eq!(outcome.resumed, 1);
        assert_eq!(outcome.succeeded, 2);
        let second = outcome.slots[1].as_ref().unwrap();
        assert_eq!(second.directions.aller, vec!["Old"]);
    }
}
