use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::application::usecases::DeliverNotificationUseCase;
use crate::application::{AppError, AppResult, FeedSource, Notification, StateStore};
use crate::domain::{
    diff, CoreError, DiffResult, EventRecord, FilterOutcome, InvalidRecordPolicy, KeyedSnapshot,
    MarkerStyle,
};

const SHORT_HASH_LEN: usize = 12;

#[derive(Clone, Debug)]
pub struct RunSettings {
    /// Top-level key of the feed envelope holding the event list.
    pub envelope_key: String,
    pub invalid_records: InvalidRecordPolicy,
    pub marker_style: MarkerStyle,
    /// Zone used for "now" and for the timestamps in subjects and archive names.
    pub timezone: Tz,
    pub subject_prefix: String,
    pub subject_tag: String,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            envelope_key: "index".to_string(),
            invalid_records: InvalidRecordPolicy::Abort,
            marker_style: MarkerStyle::Glyph,
            timezone: chrono_tz::Europe::Berlin,
            subject_prefix: "PolDatenbank".to_string(),
            subject_tag: "#polizeistressiupdates".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Payload hash matches the stored one; nothing was parsed.
    Unchanged,
    /// No snapshot existed yet; the current one was stored without diffing.
    Initialized { events: usize },
    /// Payload changed but no event was added, removed or re-routed.
    NoChanges,
    Changes { count: usize, archive: String },
}

pub struct RunOnceUseCase<'a> {
    pub feed: &'a dyn FeedSource,
    pub state: StateStore<'a>,
    pub deliver: DeliverNotificationUseCase<'a>,
    pub settings: RunSettings,
}

impl<'a> RunOnceUseCase<'a> {
    pub async fn execute(&self) -> AppResult<RunOutcome> {
        self.execute_at(Utc::now()).await
    }

    /// One poll cycle. Snapshot and hash are only written once everything
    /// before them succeeded, so a failed run is simply repeated next time.
    pub async fn execute_at(&self, now: DateTime<Utc>) -> AppResult<RunOutcome> {
        let payload = self.feed.fetch().await?;
        let hash = payload_hash(&payload);
        let short_hash = &hash[..SHORT_HASH_LEN];

        let stored_hash = self.state.load_hash().await?;
        if stored_hash.as_deref() == Some(hash.as_str()) {
            tracing::info!(hash = short_hash, "feed payload unchanged");
            return Ok(RunOutcome::Unchanged);
        }

        let policy = self.settings.invalid_records;
        let feed = parse_feed(&payload, &self.settings.envelope_key, policy)?;
        for err in &feed.skipped {
            tracing::warn!(error = %err, "skipping undecodable feed record");
        }
        let current = feed.records;
        let local_now = now.with_timezone(&self.settings.timezone);

        let Some(previous) = self.state.load_snapshot().await? else {
            // a snapshot that cannot be diffed later must never be stored
            self.filter("fetched", &current, local_now.naive_local())?;
            self.state.save_snapshot(&current).await?;
            self.state.save_hash(&hash).await?;
            tracing::info!(events = current.len(), "no previous snapshot, initial data stored");
            return Ok(RunOutcome::Initialized {
                events: current.len(),
            });
        };

        let result = self.compare(&previous, &current, local_now.naive_local())?;
        let display_time = local_now.format("%d.%m.%Y_%H:%M").to_string();

        let outcome = if result.is_empty() {
            if stored_hash.is_some() {
                tracing::info!(hash = short_hash, "payload changed without relevant changes");
                self.deliver
                    .execute(&self.no_changes_notice(&display_time, short_hash))
                    .await?;
            }
            RunOutcome::NoChanges
        } else {
            tracing::info!(count = result.len(), "changes detected");
            let stamp = local_now.format("%y%m%d_%H:%M").to_string();
            let archive = self.state.archive_changes(&result.changes, &stamp).await?;
            tracing::info!(archive = %archive, "change-set archived");

            self.deliver
                .execute(&self.changes_notice(&result, &display_time, short_hash))
                .await?;
            RunOutcome::Changes {
                count: result.len(),
                archive,
            }
        };

        self.state.save_snapshot(&current).await?;
        self.state.save_hash(&hash).await?;
        Ok(outcome)
    }

    fn compare(
        &self,
        previous: &[EventRecord],
        current: &[EventRecord],
        now: chrono::NaiveDateTime,
    ) -> AppResult<DiffResult> {
        let old = self.filter("stored", previous, now)?;
        let new = self.filter("fetched", current, now)?;

        Ok(diff(&old.snapshot, &new.snapshot, self.settings.marker_style))
    }

    fn filter(
        &self,
        side: &str,
        records: &[EventRecord],
        now: chrono::NaiveDateTime,
    ) -> AppResult<FilterOutcome> {
        let outcome = KeyedSnapshot::build(records, now, self.settings.invalid_records)?;
        for key in &outcome.collisions {
            tracing::warn!(snapshot = side, key = %key, "duplicate event key, keeping the last record");
        }
        for err in &outcome.skipped {
            tracing::warn!(snapshot = side, error = %err, "skipping invalid record");
        }
        Ok(outcome)
    }

    fn changes_notice(&self, result: &DiffResult, time: &str, short_hash: &str) -> Notification {
        let legend = match self.settings.marker_style {
            MarkerStyle::Glyph => " (🟢 new, 🔴 deleted)",
            MarkerStyle::Plain => "",
        };
        Notification {
            subject: self.subject("Änderungen", time),
            body: format!(
                "{time}\n{} Changes{legend}\nHash: {short_hash}\n\n{}",
                result.len(),
                result.display.join("\n\n"),
            ),
        }
    }

    fn no_changes_notice(&self, time: &str, short_hash: &str) -> Notification {
        Notification {
            subject: self.subject("Keine_Änderungen", time),
            body: format!("{time}\nDatenbankupdate ohne Änderungen\nHash: {short_hash}"),
        }
    }

    fn subject(&self, label: &str, time: &str) -> String {
        format!(
            "{}_{label} {time} {}",
            self.settings.subject_prefix, self.settings.subject_tag
        )
        .trim_end()
        .to_string()
    }
}

/// Lowercase hex SHA-256 of the raw payload.
pub fn payload_hash(payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    format!("{:x}", hasher.finalize())
}

#[derive(Clone, Debug, Default)]
pub struct ParsedFeed {
    pub records: Vec<EventRecord>,
    /// Entries dropped under [`InvalidRecordPolicy::Skip`].
    pub skipped: Vec<CoreError>,
}

/// Parses the feed JSON and unwraps the event list under `envelope_key`.
///
/// Each list entry is decoded on its own; an entry that is not a valid
/// record fails the run or is dropped, depending on `policy`.
pub fn parse_feed(
    payload: &[u8],
    envelope_key: &str,
    policy: InvalidRecordPolicy,
) -> AppResult<ParsedFeed> {
    let envelope: Value = serde_json::from_slice(payload)
        .map_err(|e| AppError::InvalidFeed(format!("payload is not JSON: {e}")))?;

    let Value::Object(mut top) = envelope else {
        return Err(AppError::InvalidFeed("payload is not a JSON object".into()));
    };
    let list = top.remove(envelope_key).ok_or_else(|| {
        AppError::InvalidFeed(format!("expected key `{envelope_key}` not found"))
    })?;
    let Value::Array(entries) = list else {
        return Err(AppError::InvalidFeed(format!(
            "`{envelope_key}` is not an event list"
        )));
    };

    let mut out = ParsedFeed::default();
    for (index, entry) in entries.into_iter().enumerate() {
        match EventRecord::from_value(index, entry) {
            Ok(record) => out.records.push(record),
            Err(e) => match policy {
                InvalidRecordPolicy::Abort => return Err(e.into()),
                InvalidRecordPolicy::Skip => out.skipped.push(e),
            },
        }
    }
    Ok(out)
}
