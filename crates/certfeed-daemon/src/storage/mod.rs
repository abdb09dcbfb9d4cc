mod config;
mod metrics;

pub use config::*;
pub use metrics::*;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use certfeed_types::{
    CertfeedError, CertfeedResult, CertificateRoot, ContentId, CourseId, Nullifier, RejectReason,
    COURSE_ID_SIZE,
};
use sled::transaction::{abort, ConflictableTransactionError, TransactionError, Transactional};
use sled::{Db, IVec, Tree};
use tracing::{debug, info};

use crate::registry::{
    check_publishable, page_bounds, Admission, LedgerStore, RootOracle, RootRecord, RootRegistry,
};

const CURRENT_SCHEMA_VERSION: u32 = 1;
const SCHEMA_KEY: &[u8] = b"__schema_version__";
const COURSE_COUNT_KEY: &[u8] = b"course_count";

fn storage_error(context: &str, e: impl std::fmt::Display) -> CertfeedError {
    CertfeedError::Storage(format!("{}: {}", context, e))
}

fn decode_u64(bytes: &[u8]) -> Option<u64> {
    bytes.try_into().ok().map(u64::from_be_bytes)
}

fn counter(value: Option<IVec>) -> Result<u64, CertfeedError> {
    match value {
        Some(bytes) => decode_u64(&bytes)
            .ok_or_else(|| CertfeedError::Storage("Corrupt counter value".into())),
        None => Ok(0),
    }
}

/// `course ‖ suffix`, so one course's entries sort together.
fn course_key(course: &CourseId, suffix: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(COURSE_ID_SIZE + suffix.len());
    key.extend_from_slice(course.as_bytes());
    key.extend_from_slice(suffix);
    key
}

fn indexed_key(course: &CourseId, index: u64) -> Vec<u8> {
    course_key(course, &index.to_be_bytes())
}

/// Sled-backed ledgers and root registry.
///
/// Trees:
/// - `nullifiers`: `course ‖ nullifier` → empty
/// - `feedbacks`: `course ‖ index` → content id
/// - `feedback_counts`: `course` → next index
/// - `courses`: `index` → course, in registration order
/// - `course_index`: `course` → index
/// - `roots`: `course ‖ index` → bincode [`RootRecord`]
/// - `root_counts`: `course` → history length
pub struct SledLedger {
    db: Db,
    schema: Tree,
    meta: Tree,
    nullifiers: Tree,
    feedbacks: Tree,
    feedback_counts: Tree,
    courses: Tree,
    course_index: Tree,
    roots: Tree,
    root_counts: Tree,
    storage_config: StorageConfig,
    metrics: Arc<StorageMetrics>,
}

impl SledLedger {
    pub fn open(config: StorageConfig) -> CertfeedResult<Self> {
        info!("Opening ledger at {:?}", config.path);

        let sled_config = sled::Config::new()
            .path(&config.path)
            .cache_capacity(config.cache_capacity_bytes)
            .flush_every_ms(config.flush_every_ms);

        let db = sled_config
            .open()
            .map_err(|e| storage_error("Failed to open database", e))?;

        let storage = Self::create_from_db(db, config)?;
        storage.ensure_schema()?;

        info!("Ledger opened (schema version {})", CURRENT_SCHEMA_VERSION);
        Ok(storage)
    }

    pub fn in_memory() -> CertfeedResult<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| storage_error("Failed to open temp database", e))?;

        let config = StorageConfig {
            path: std::path::PathBuf::new(),
            ..Default::default()
        };

        let storage = Self::create_from_db(db, config)?;
        storage.ensure_schema()?;
        Ok(storage)
    }

    fn create_from_db(db: Db, config: StorageConfig) -> CertfeedResult<Self> {
        Ok(Self {
            schema: Self::open_tree(&db, "schema")?,
            meta: Self::open_tree(&db, "meta")?,
            nullifiers: Self::open_tree(&db, "nullifiers")?,
            feedbacks: Self::open_tree(&db, "feedbacks")?,
            feedback_counts: Self::open_tree(&db, "feedback_counts")?,
            courses: Self::open_tree(&db, "courses")?,
            course_index: Self::open_tree(&db, "course_index")?,
            roots: Self::open_tree(&db, "roots")?,
            root_counts: Self::open_tree(&db, "root_counts")?,
            db,
            storage_config: config,
            metrics: Arc::new(StorageMetrics::new()),
        })
    }

    fn open_tree(db: &Db, name: &str) -> CertfeedResult<Tree> {
        db.open_tree(name)
            .map_err(|e| storage_error(&format!("Failed to open {} tree", name), e))
    }

    fn ensure_schema(&self) -> CertfeedResult<()> {
        match self.schema_info()? {
            None => self.initialize_schema(),
            Some(info) if info.version > CURRENT_SCHEMA_VERSION => Err(CertfeedError::Storage(format!(
                "Database schema version {} is newer than supported {}",
                info.version, CURRENT_SCHEMA_VERSION
            ))),
            Some(_) => Ok(()),
        }
    }

    fn initialize_schema(&self) -> CertfeedResult<()> {
        info!("Initializing new ledger with schema version {}", CURRENT_SCHEMA_VERSION);
        self.write_schema(&SchemaInfo {
            version: CURRENT_SCHEMA_VERSION,
            created_at: chrono::Utc::now().timestamp(),
        })?;
        self.flush()
    }

    fn write_schema(&self, info: &SchemaInfo) -> CertfeedResult<()> {
        let bytes = bincode::serialize(info).map_err(|e| storage_error("Failed to serialize schema", e))?;
        self.schema
            .insert(SCHEMA_KEY, bytes)
            .map_err(|e| storage_error("Failed to store schema", e))?;
        Ok(())
    }

    pub fn schema_info(&self) -> CertfeedResult<Option<SchemaInfo>> {
        match self
            .schema
            .get(SCHEMA_KEY)
            .map_err(|e| storage_error("Failed to read schema", e))?
        {
            Some(bytes) => Ok(Some(
                bincode::deserialize(&bytes).map_err(|e| storage_error("Failed to deserialize schema", e))?,
            )),
            None => Ok(None),
        }
    }

    pub fn schema_version(&self) -> CertfeedResult<u32> {
        Ok(self.schema_info()?.map(|i| i.version).unwrap_or(0))
    }

    pub fn flush(&self) -> CertfeedResult<()> {
        self.metrics.flushes.fetch_add(1, Ordering::Relaxed);
        self.db.flush().map_err(|e| storage_error("Flush error", e))?;
        Ok(())
    }

    pub async fn flush_async(&self) -> CertfeedResult<()> {
        self.metrics.flushes.fetch_add(1, Ordering::Relaxed);
        self.db
            .flush_async()
            .await
            .map_err(|e| storage_error("Flush error", e))?;
        Ok(())
    }

    pub fn size_on_disk(&self) -> CertfeedResult<u64> {
        self.db.size_on_disk().map_err(|e| storage_error("Size error", e))
    }

    pub fn storage_metrics(&self) -> Arc<StorageMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn is_in_memory(&self) -> bool {
        self.storage_config.path.as_os_str().is_empty()
    }

    fn read<T>(&self, result: sled::Result<T>, context: &str) -> CertfeedResult<T> {
        self.metrics.reads.fetch_add(1, Ordering::Relaxed);
        result.map_err(|e| {
            self.metrics.errors.fetch_add(1, Ordering::Relaxed);
            storage_error(context, e)
        })
    }

    fn finish_transaction<T>(&self, result: Result<T, TransactionError<CertfeedError>>) -> CertfeedResult<T> {
        match result {
            Ok(value) => {
                self.metrics.writes.fetch_add(1, Ordering::Relaxed);
                Ok(value)
            }
            Err(TransactionError::Abort(e)) => {
                self.metrics.aborted_writes.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
            Err(TransactionError::Storage(e)) => {
                self.metrics.errors.fetch_add(1, Ordering::Relaxed);
                Err(storage_error("Transaction failed", e))
            }
        }
    }

    /// Appends `content`, optionally reserving `nullifier` first, in one
    /// transaction across every ledger tree.
    fn append(
        &self,
        course: &CourseId,
        nullifier: Option<&Nullifier>,
        content: &ContentId,
    ) -> CertfeedResult<Admission> {
        let nullifier_key = nullifier.map(|n| course_key(course, n.as_bytes()));
        let course_bytes = course.as_bytes();

        let result = (
            &self.nullifiers,
            &self.feedbacks,
            &self.feedback_counts,
            &self.courses,
            &self.course_index,
            &self.meta,
        )
            .transaction(|(nullifiers, feedbacks, counts, courses, course_index, meta)| {
                if let Some(key) = &nullifier_key {
                    if nullifiers.get(key)?.is_some() {
                        return abort(CertfeedError::Rejected(RejectReason::DuplicateNullifier));
                    }
                    nullifiers.insert(key.as_slice(), Vec::<u8>::new())?;
                }

                let index = match counter(counts.get(course_bytes)?) {
                    Ok(i) => i,
                    Err(e) => return abort(e),
                };
                feedbacks.insert(indexed_key(course, index), content.as_bytes())?;
                counts.insert(&course_bytes[..], &(index + 1).to_be_bytes()[..])?;

                let first_for_course = course_index.get(course_bytes)?.is_none();
                if first_for_course {
                    let position = match counter(meta.get(COURSE_COUNT_KEY)?) {
                        Ok(n) => n,
                        Err(e) => return abort(e),
                    };
                    courses.insert(&position.to_be_bytes()[..], &course_bytes[..])?;
                    course_index.insert(&course_bytes[..], &position.to_be_bytes()[..])?;
                    meta.insert(COURSE_COUNT_KEY, &(position + 1).to_be_bytes()[..])?;
                }

                Ok::<_, ConflictableTransactionError<CertfeedError>>(Admission {
                    course: *course,
                    index,
                    first_for_course,
                })
            });

        let admission = self.finish_transaction(result)?;
        self.metrics
            .write_bytes
            .fetch_add(content.len() as u64, Ordering::Relaxed);
        debug!(course = %course, index = admission.index, "Appended feedback");
        Ok(admission)
    }

    fn decode_content(bytes: &[u8]) -> CertfeedResult<ContentId> {
        let text = std::str::from_utf8(bytes).map_err(|e| storage_error("Corrupt content id", e))?;
        ContentId::new(text).map_err(|e| storage_error("Corrupt content id", e))
    }

    fn decode_course(bytes: &[u8]) -> CertfeedResult<CourseId> {
        CourseId::from_slice(bytes).map_err(|e| storage_error("Corrupt course id", e))
    }

    fn decode_root(bytes: &[u8]) -> CertfeedResult<RootRecord> {
        bincode::deserialize(bytes).map_err(|e| storage_error("Failed to deserialize root record", e))
    }
}

impl LedgerStore for SledLedger {
    fn try_consume(&self, course: &CourseId, nullifier: &Nullifier) -> CertfeedResult<bool> {
        let key = course_key(course, nullifier.as_bytes());
        let swapped = self
            .nullifiers
            .compare_and_swap(key, None::<&[u8]>, Some(Vec::<u8>::new()))
            .map_err(|e| {
                self.metrics.errors.fetch_add(1, Ordering::Relaxed);
                storage_error("Failed to consume nullifier", e)
            })?;
        self.metrics.writes.fetch_add(1, Ordering::Relaxed);
        Ok(swapped.is_ok())
    }

    fn contains_nullifier(&self, course: &CourseId, nullifier: &Nullifier) -> CertfeedResult<bool> {
        let key = course_key(course, nullifier.as_bytes());
        self.read(self.nullifiers.contains_key(key), "Failed to read nullifier")
    }

    fn append_feedback(&self, course: &CourseId, content: &ContentId) -> CertfeedResult<Admission> {
        self.append(course, None, content)
    }

    fn admit(
        &self,
        course: &CourseId,
        nullifier: &Nullifier,
        content: &ContentId,
    ) -> CertfeedResult<Admission> {
        self.append(course, Some(nullifier), content)
    }

    fn feedbacks(&self, course: &CourseId, offset: u64, limit: u64) -> CertfeedResult<Vec<ContentId>> {
        let len = self.feedback_count(course)?;
        let (start, end) = page_bounds(len, offset, limit);
        let mut page = Vec::with_capacity((end - start) as usize);
        for entry in self.feedbacks.range(indexed_key(course, start)..indexed_key(course, end)) {
            let (_, value) = self.read(entry, "Failed to iterate feedbacks")?;
            page.push(Self::decode_content(&value)?);
        }
        Ok(page)
    }

    fn feedback_count(&self, course: &CourseId) -> CertfeedResult<u64> {
        let value = self.read(self.feedback_counts.get(course.as_bytes()), "Failed to read feedback count")?;
        counter(value)
    }

    fn courses(&self, offset: u64, limit: u64) -> CertfeedResult<Vec<CourseId>> {
        let (start, end) = page_bounds(self.course_count()?, offset, limit);
        let mut page = Vec::with_capacity((end - start) as usize);
        for entry in self.courses.range(start.to_be_bytes()..end.to_be_bytes()) {
            let (_, value) = self.read(entry, "Failed to iterate courses")?;
            page.push(Self::decode_course(&value)?);
        }
        Ok(page)
    }

    fn course_count(&self) -> CertfeedResult<u64> {
        let value = self.read(self.meta.get(COURSE_COUNT_KEY), "Failed to read course count")?;
        counter(value)
    }
}

impl RootOracle for SledLedger {
    fn root(&self, course: &CourseId) -> CertfeedResult<CertificateRoot> {
        Ok(self
            .latest(course)?
            .map(|r| r.root)
            .unwrap_or_else(CertificateRoot::zero))
    }
}

impl RootRegistry for SledLedger {
    fn publish(&self, course: &CourseId, root: CertificateRoot) -> CertfeedResult<RootRecord> {
        check_publishable(&root)?;
        let published_at = chrono::Utc::now().timestamp();
        let course_bytes = course.as_bytes();

        let result = (&self.roots, &self.root_counts).transaction(|(roots, counts)| {
            let index = match counter(counts.get(course_bytes)?) {
                Ok(i) => i,
                Err(e) => return abort(e),
            };
            let record = RootRecord {
                course: *course,
                root,
                index,
                published_at,
            };
            let bytes = match bincode::serialize(&record) {
                Ok(b) => b,
                Err(e) => return abort(storage_error("Failed to serialize root record", e)),
            };
            roots.insert(indexed_key(course, index), bytes)?;
            counts.insert(&course_bytes[..], &(index + 1).to_be_bytes()[..])?;
            Ok::<_, ConflictableTransactionError<CertfeedError>>(record)
        });

        let record = self.finish_transaction(result)?;
        info!(course = %course, index = record.index, "Published certificate root");
        Ok(record)
    }

    fn latest(&self, course: &CourseId) -> CertfeedResult<Option<RootRecord>> {
        let len = self.history_len(course)?;
        if len == 0 {
            return Ok(None);
        }
        match self.read(self.roots.get(indexed_key(course, len - 1)), "Failed to read root")? {
            Some(bytes) => Ok(Some(Self::decode_root(&bytes)?)),
            None => Err(CertfeedError::Storage("Root history is missing its latest entry".into())),
        }
    }

    fn history(&self, course: &CourseId, offset: u64, limit: u64) -> CertfeedResult<Vec<RootRecord>> {
        let (start, end) = page_bounds(self.history_len(course)?, offset, limit);
        let mut page = Vec::with_capacity((end - start) as usize);
        for entry in self.roots.range(indexed_key(course, start)..indexed_key(course, end)) {
            let (_, value) = self.read(entry, "Failed to iterate roots")?;
            page.push(Self::decode_root(&value)?);
        }
        Ok(page)
    }

    fn history_len(&self, course: &CourseId) -> CertfeedResult<u64> {
        let value = self.read(self.root_counts.get(course.as_bytes()), "Failed to read root count")?;
        counter(value)
    }
}
