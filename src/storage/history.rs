//! Durable log of completed exchanges, plus the in-memory active record

use std::cell::RefCell;

use chrono::{Local, NaiveDateTime, Timelike};

use crate::constants::{HISTORY_BUCKET, HISTORY_KEY_FORMAT};
use crate::models::{HistoryEntry, RequestResponse};
use crate::storage::{Database, StorageResult};

/// Nanoseconds in one unit of the key's five fractional digits
const TICK_NANOS: u32 = 10_000;

/// Write-once, delete-only history bucket
pub struct HistoryStore {
    db: Database,
    active: RefCell<Option<RequestResponse>>,
}

impl HistoryStore {
    pub fn new(db: Database) -> Self {
        HistoryStore {
            db,
            active: RefCell::new(None),
        }
    }

    /// All stored entries. Order is unspecified; sort by key for chronology.
    pub fn list_all(&self) -> StorageResult<Vec<HistoryEntry>> {
        self.db
            .read_all(HISTORY_BUCKET)?
            .into_iter()
            .map(|(key, value)| {
                let record = serde_json::from_slice(&value)?;
                Ok(HistoryEntry { key, record })
            })
            .collect()
    }

    pub fn write(&self, key: &str, record: &RequestResponse) -> StorageResult<()> {
        let value = serde_json::to_vec(record)?;
        self.db.put(HISTORY_BUCKET, key, &value)
    }

    /// Fails with `NotFound` when `key` was never written or has been deleted
    pub fn get(&self, key: &str) -> StorageResult<RequestResponse> {
        let value = self.db.read(HISTORY_BUCKET, key)?;
        Ok(serde_json::from_slice(&value)?)
    }

    pub fn delete(&self, key: &str) -> StorageResult<()> {
        self.db.remove(HISTORY_BUCKET, &[key.to_string()])?;
        Ok(())
    }

    /// Lists every key, then deletes them in a second transaction.
    ///
    /// Not atomic: an entry written between the two phases survives.
    pub fn delete_all(&self) -> StorageResult<usize> {
        let keys: Vec<String> = self
            .db
            .read_all(HISTORY_BUCKET)?
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        self.db.remove(HISTORY_BUCKET, &keys)
    }

    /// The exchange currently on screen, if any. Never persisted.
    pub fn active_record(&self) -> Option<RequestResponse> {
        self.active.borrow().clone()
    }

    pub fn set_active_record(&self, record: Option<RequestResponse>) {
        *self.active.borrow_mut() = record;
    }
}

/// Generates `YYYYMMDDHHMMSS.fffff` history keys that strictly increase
#[derive(Debug, Default)]
pub struct HistoryKeys {
    last: Option<NaiveDateTime>,
}

impl HistoryKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_key(&mut self) -> String {
        self.key_at(Local::now().naive_local())
    }

    /// Key for `now`, bumped one tick past the previous key if the clock
    /// has not moved far enough (or went backwards)
    pub fn key_at(&mut self, now: NaiveDateTime) -> String {
        let nanos = now.nanosecond().min(999_999_999);
        let mut at = now
            .with_nanosecond(nanos - nanos % TICK_NANOS)
            .unwrap_or(now);

        if let Some(last) = self.last {
            if at <= last {
                at = last + chrono::Duration::microseconds(10);
            }
        }

        self.last = Some(at);
        format_key(at)
    }
}

fn format_key(at: NaiveDateTime) -> String {
    let ticks = at.nanosecond().min(999_999_999) / TICK_NANOS;
    format!("{}.{:05}", at.format(HISTORY_KEY_FORMAT), ticks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HeaderMap, HttpMethod, RequestInput, RequestResult};
    use chrono::NaiveDate;
    use std::time::Duration;

    fn record(path: &str, status: u16) -> RequestResponse {
        let mut headers = HeaderMap::new();
        headers.insert("Accept".into(), vec!["*/*".into(), "text/html".into()]);
        RequestResponse {
            request: RequestInput {
                method: HttpMethod::POST,
                path: path.to_string(),
                headers,
                body: "{\"a\":1}".into(),
            },
            response: RequestResult {
                status_code: status,
                headers: HeaderMap::from([(
                    "content-type".to_string(),
                    vec!["text/plain".to_string()],
                )]),
                response_body: b"OK".to_vec(),
                duration: Duration::from_millis(42),
            },
        }
    }

    fn store() -> HistoryStore {
        HistoryStore::new(Database::open_in_memory().unwrap())
    }

    #[test]
    fn write_then_get_returns_equal_record() {
        let store = store();
        let rr = record("https://example.com/a", 201);
        store.write("20240101120000.00001", &rr).unwrap();

        assert_eq!(store.get("20240101120000.00001").unwrap(), rr);
    }

    #[test]
    fn empty_bucket_lists_nothing() {
        assert!(store().list_all().unwrap().is_empty());
    }

    #[test]
    fn get_missing_key_is_not_found() {
        let err = store().get("nope").unwrap_err();
        assert!(matches!(err, crate::storage::StorageError::NotFound { .. }));
    }

    #[test]
    fn delete_twice_is_fine() {
        let store = store();
        store.write("k1", &record("https://a", 200)).unwrap();

        store.delete("k1").unwrap();
        store.delete("k1").unwrap();
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn delete_all_empties_the_bucket() {
        let store = store();
        for (i, key) in ["k1", "k2", "k3"].iter().enumerate() {
            store.write(key, &record("https://a", 200 + i as u16)).unwrap();
        }
        assert_eq!(store.list_all().unwrap().len(), 3);

        assert_eq!(store.delete_all().unwrap(), 3);
        assert_eq!(store.list_all().unwrap().len(), 0);
    }

    #[test]
    fn active_record_is_memory_only() {
        let db = Database::open_in_memory().unwrap();
        let store = HistoryStore::new(db.clone());
        store.set_active_record(Some(record("https://a", 200)));
        assert!(store.active_record().is_some());
        assert!(store.list_all().unwrap().is_empty());

        let fresh = HistoryStore::new(db);
        assert!(fresh.active_record().is_none());

        store.set_active_record(None);
        assert!(store.active_record().is_none());
    }

    #[test]
    fn key_has_fixed_format() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_nano_opt(7, 5, 3, 123_456_789)
            .unwrap();
        assert_eq!(HistoryKeys::new().key_at(at), "20240309070503.12345");
    }

    #[test]
    fn successive_keys_strictly_increase() {
        let mut keys = HistoryKeys::new();
        let first = keys.next_key();
        let second = keys.next_key();
        assert!(second > first, "{second} should sort after {first}");
    }

    #[test]
    fn same_instant_is_bumped_one_tick() {
        let at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_nano_opt(23, 59, 59, 999_990_000)
            .unwrap();
        let mut keys = HistoryKeys::new();

        assert_eq!(keys.key_at(at), "20240101235959.99999");
        assert_eq!(keys.key_at(at), "20240102000000.00000");
    }

    #[test]
    fn clock_going_backwards_still_increases() {
        let later = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 1)
            .unwrap();
        let earlier = later - chrono::Duration::seconds(1);
        let mut keys = HistoryKeys::new();

        let a = keys.key_at(later);
        let b = keys.key_at(earlier);
        assert!(b > a);
    }
}
