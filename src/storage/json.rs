//! Flat-file storage backend (JSON documents)
//!
//! One directory, two documents per profile:
//!
//! - `<name>.json`: `{ "id": ..., "name": ... }`
//! - `<name>_transactions.json`: array of `{ "id", "label", "amount", "tags" }`
//!
//! Documents without an `id` (profile or transaction) get one generated on
//! first read, and the document is rewritten with it.
//!
//! Every document is rewritten atomically. Reads and writes are serialized by
//! an in-process lock; a unit of work stages its changes in memory and
//! rewrites the touched documents once it succeeds.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{FinanceError, FinanceResult};
use crate::models::{Profile, ProfileId, Transaction, TransactionId};

use super::file_io::{read_json, read_json_optional, remove_file_if_exists, write_json_atomic};
use super::repository::{ProfileRepository, TransactionRepository, Work};

const TRANSACTIONS_SUFFIX: &str = "_transactions";

/// Serializable profile document
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProfileDocument {
    #[serde(default)]
    id: ProfileId,
    name: String,
}

impl ProfileDocument {
    fn into_profile(self) -> Profile {
        Profile {
            id: self.id,
            name: self.name,
            ..Profile::default()
        }
    }
}

/// One entry of a profile's transactions document
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TransactionRecord {
    #[serde(default)]
    id: TransactionId,
    label: String,
    amount: i64,
    #[serde(default)]
    tags: Vec<String>,
}

impl TransactionRecord {
    fn to_transaction(&self, owner: &ProfileId) -> Transaction {
        Transaction {
            id: self.id.clone(),
            profile_id: owner.clone(),
            label: self.label.clone(),
            amount: self.amount,
            tags: self.tags.clone(),
        }
    }
}

/// Reject names that cannot be used as a document file name
fn check_name(name: &str) -> FinanceResult<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.ends_with(TRANSACTIONS_SUFFIX);
    if bad {
        return Err(FinanceError::InvalidName(format!(
            "profile name cannot be stored as a file: {:?}",
            name
        )));
    }
    Ok(())
}

/// JSON-document-backed profile and transaction repository
pub struct JsonStorage {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStorage {
    /// Use `dir` as the document directory, creating it if needed
    pub fn open(dir: impl Into<PathBuf>) -> FinanceResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            FinanceError::CouldNotWriteSaveFile(format!(
                "Failed to create directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn profile_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    fn transactions_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}{}.json", name, TRANSACTIONS_SUFFIX))
    }

    fn lock(&self) -> FinanceResult<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    /// Read one profile document, assigning and persisting an ID if it has
    /// none. Caller must hold the lock.
    fn read_profile(&self, path: &Path) -> FinanceResult<Option<ProfileDocument>> {
        let Some(mut doc) = read_json_optional::<ProfileDocument, _>(path)? else {
            return Ok(None);
        };
        if doc.id.is_empty() {
            doc.id = ProfileId::generate();
            write_json_atomic(path, &doc)?;
            info!(profile = %doc.name, id = %doc.id, "json: assigned id to profile document");
        }
        Ok(Some(doc))
    }

    /// Every readable profile document in the directory, ordered by name.
    /// Files that do not parse as a profile are skipped. Caller must hold the
    /// lock.
    fn scan_profiles(&self) -> FinanceResult<Vec<ProfileDocument>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(FinanceError::CouldNotReadSaveFile(format!(
                    "Failed to list {}: {}",
                    self.dir.display(),
                    e
                )))
            }
        };

        let mut profiles = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                FinanceError::CouldNotReadSaveFile(format!(
                    "Failed to list {}: {}",
                    self.dir.display(),
                    e
                ))
            })?;
            let file_name = entry.file_name();
            let Some(stem) = file_name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            if stem.ends_with(TRANSACTIONS_SUFFIX) {
                continue;
            }
            match self.read_profile(&entry.path()) {
                Ok(Some(doc)) => profiles.push(doc),
                Ok(None) => {}
                Err(e) => {
                    warn!(file = %entry.path().display(), error = %e, "json: skipping unreadable profile document")
                }
            }
        }
        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(profiles)
    }

    fn find_profile(&self, id: &ProfileId) -> FinanceResult<Option<ProfileDocument>> {
        Ok(self.scan_profiles()?.into_iter().find(|p| &p.id == id))
    }

    /// Run read-only `f` against a fresh view of the documents
    fn read_ledger<T>(&self, f: impl FnOnce(&Ledger<'_>) -> FinanceResult<T>) -> FinanceResult<T> {
        let _guard = self.lock()?;
        let ledger = Ledger::new(self)?;
        f(&ledger)
    }

    /// Run `f` against a staged view and rewrite the touched documents if it
    /// succeeds
    fn write_ledger(&self, f: impl FnOnce(&Ledger<'_>) -> FinanceResult<()>) -> FinanceResult<()> {
        let _guard = self.lock()?;
        let ledger = Ledger::new(self)?;
        f(&ledger)?;
        ledger.flush()
    }
}

impl ProfileRepository for JsonStorage {
    fn load_by_id(&self, id: &ProfileId) -> FinanceResult<Profile> {
        debug!(profile_id = %id, "json: load profile by id");
        let _guard = self.lock()?;
        self.find_profile(id)?
            .map(ProfileDocument::into_profile)
            .ok_or_else(|| FinanceError::unknown_profile(id))
    }

    fn load_by_name(&self, name: &str) -> FinanceResult<Profile> {
        debug!(profile = name, "json: load profile by name");
        if check_name(name).is_err() {
            return Err(FinanceError::unknown_profile(name));
        }
        let _guard = self.lock()?;
        self.read_profile(&self.profile_path(name))?
            .map(ProfileDocument::into_profile)
            .ok_or_else(|| FinanceError::unknown_profile(name))
    }

    fn create(&self, profile: &Profile) -> FinanceResult<()> {
        check_name(&profile.name)?;
        let _guard = self.lock()?;
        debug!(profile_id = %profile.id, profile = %profile.name, "json: create profile");

        let path = self.profile_path(&profile.name);
        if path.exists() {
            return Err(FinanceError::duplicate_profile(&profile.name));
        }

        let doc = ProfileDocument {
            id: profile.id.clone(),
            name: profile.name.clone(),
        };
        // A leftover transactions document under this name belongs to no one
        write_json_atomic(
            self.transactions_path(&profile.name),
            &Vec::<TransactionRecord>::new(),
        )?;
        write_json_atomic(&path, &doc)
    }

    fn update(&self, profile: &Profile) -> FinanceResult<()> {
        check_name(&profile.name)?;
        let _guard = self.lock()?;
        debug!(profile_id = %profile.id, profile = %profile.name, "json: update profile");

        let current = self
            .find_profile(&profile.id)?
            .ok_or_else(|| FinanceError::unknown_profile(&profile.id))?;

        let doc = ProfileDocument {
            id: profile.id.clone(),
            name: profile.name.clone(),
        };

        if current.name == profile.name {
            return write_json_atomic(self.profile_path(&profile.name), &doc);
        }

        // Rename: both documents move to the new name
        let new_path = self.profile_path(&profile.name);
        if new_path.exists() {
            return Err(FinanceError::duplicate_profile(&profile.name));
        }
        let records: Vec<TransactionRecord> = read_json(self.transactions_path(&current.name))?;
        write_json_atomic(self.transactions_path(&profile.name), &records)?;
        write_json_atomic(&new_path, &doc)?;
        remove_file_if_exists(self.profile_path(&current.name))?;
        remove_file_if_exists(self.transactions_path(&current.name))
    }
}

impl TransactionRepository for JsonStorage {
    fn load_by_id(&self, id: &TransactionId) -> FinanceResult<Transaction> {
        debug!(transaction_id = %id, "json: load transaction");
        self.read_ledger(|ledger| ledger.load_by_id(id))
    }

    fn load_all_for_profile(&self, profile_id: &ProfileId) -> FinanceResult<Vec<Transaction>> {
        debug!(profile_id = %profile_id, "json: load transactions for profile");
        self.read_ledger(|ledger| ledger.load_all_for_profile(profile_id))
    }

    fn create(&self, transaction: &Transaction) -> FinanceResult<()> {
        self.write_ledger(|ledger| ledger.create(transaction))
    }

    fn update(&self, transaction: &Transaction) -> FinanceResult<()> {
        self.write_ledger(|ledger| ledger.update(transaction))
    }

    fn load_tags(&self, id: &TransactionId) -> FinanceResult<Vec<String>> {
        self.read_ledger(|ledger| ledger.load_tags(id))
    }

    fn add_tags(&self, id: &TransactionId, tags: &[String]) -> FinanceResult<()> {
        self.write_ledger(|ledger| ledger.add_tags(id, tags))
    }

    fn clear_tags(&self, id: &TransactionId) -> FinanceResult<()> {
        self.write_ledger(|ledger| ledger.clear_tags(id))
    }

    fn tags_embedded(&self) -> bool {
        true
    }

    fn atomically(&self, work: &mut Work<'_>) -> FinanceResult<()> {
        self.write_ledger(|ledger| work(ledger))?;
        debug!("json: unit of work committed");
        Ok(())
    }
}

/// In-memory view of the transaction documents, loaded lazily per profile.
/// Changes only reach disk through [`Ledger::flush`].
struct Ledger<'s> {
    storage: &'s JsonStorage,
    profiles: Vec<ProfileDocument>,
    records: RefCell<HashMap<ProfileId, Vec<TransactionRecord>>>,
    /// Owners of transactions already located or written in this ledger
    owners: RefCell<HashMap<TransactionId, ProfileId>>,
    dirty: RefCell<Vec<ProfileId>>,
}

impl<'s> Ledger<'s> {
    fn new(storage: &'s JsonStorage) -> FinanceResult<Self> {
        Ok(Self {
            storage,
            profiles: storage.scan_profiles()?,
            records: RefCell::new(HashMap::new()),
            owners: RefCell::new(HashMap::new()),
            dirty: RefCell::new(Vec::new()),
        })
    }

    fn profile(&self, id: &ProfileId) -> Option<&ProfileDocument> {
        self.profiles.iter().find(|p| &p.id == id)
    }

    fn ensure_loaded(&self, profile: &ProfileDocument) -> FinanceResult<()> {
        if self.records.borrow().contains_key(&profile.id) {
            return Ok(());
        }
        let path = self.storage.transactions_path(&profile.name);
        let mut records: Vec<TransactionRecord> = read_json(&path)?;

        let mut assigned = 0;
        for record in records.iter_mut().filter(|r| r.id.is_empty()) {
            record.id = TransactionId::generate();
            assigned += 1;
        }
        if assigned > 0 {
            write_json_atomic(&path, &records)?;
            info!(profile = %profile.name, count = assigned, "json: assigned ids to transactions");
        }

        self.records.borrow_mut().insert(profile.id.clone(), records);
        Ok(())
    }

    /// Owner and position of a transaction. Unreadable transaction documents
    /// of other profiles are skipped.
    fn locate(&self, id: &TransactionId) -> FinanceResult<(ProfileId, usize)> {
        let known = self.owners.borrow().get(id).cloned();
        if let Some(owner) = known {
            let records = self.records.borrow();
            let position = records
                .get(&owner)
                .and_then(|list| list.iter().position(|r| &r.id == id));
            if let Some(index) = position {
                return Ok((owner, index));
            }
        }

        for profile in &self.profiles {
            if let Err(e) = self.ensure_loaded(profile) {
                warn!(profile = %profile.name, error = %e, "json: skipping unreadable transactions document");
                continue;
            }
            let records = self.records.borrow();
            let position = records
                .get(&profile.id)
                .and_then(|list| list.iter().position(|r| &r.id == id));
            if let Some(index) = position {
                self.owners
                    .borrow_mut()
                    .insert(id.clone(), profile.id.clone());
                return Ok((profile.id.clone(), index));
            }
        }
        Err(FinanceError::unknown_transaction(id))
    }

    fn with_record<T>(
        &self,
        id: &TransactionId,
        f: impl FnOnce(&mut TransactionRecord) -> T,
    ) -> FinanceResult<(ProfileId, T)> {
        let (owner, index) = self.locate(id)?;
        let mut records = self.records.borrow_mut();
        let record = records
            .get_mut(&owner)
            .and_then(|list| list.get_mut(index))
            .ok_or_else(|| FinanceError::unknown_transaction(id))?;
        let out = f(record);
        Ok((owner, out))
    }

    fn mark_dirty(&self, profile_id: &ProfileId) {
        let mut dirty = self.dirty.borrow_mut();
        if !dirty.contains(profile_id) {
            dirty.push(profile_id.clone());
        }
    }

    fn flush(self) -> FinanceResult<()> {
        let records = self.records.into_inner();
        for profile_id in self.dirty.into_inner() {
            let (Some(profile), Some(list)) = (
                self.profiles.iter().find(|p| p.id == profile_id),
                records.get(&profile_id),
            ) else {
                continue;
            };
            write_json_atomic(self.storage.transactions_path(&profile.name), list)?;
        }
        Ok(())
    }
}

impl TransactionRepository for Ledger<'_> {
    fn load_by_id(&self, id: &TransactionId) -> FinanceResult<Transaction> {
        let (owner, index) = self.locate(id)?;
        let records = self.records.borrow();
        records
            .get(&owner)
            .and_then(|list| list.get(index))
            .map(|r| r.to_transaction(&owner))
            .ok_or_else(|| FinanceError::unknown_transaction(id))
    }

    fn load_all_for_profile(&self, profile_id: &ProfileId) -> FinanceResult<Vec<Transaction>> {
        let Some(profile) = self.profile(profile_id) else {
            return Ok(Vec::new());
        };
        self.ensure_loaded(profile)?;
        let records = self.records.borrow();
        Ok(records
            .get(profile_id)
            .map(|list| list.iter().map(|r| r.to_transaction(profile_id)).collect())
            .unwrap_or_default())
    }

    fn create(&self, transaction: &Transaction) -> FinanceResult<()> {
        let profile = self
            .profile(&transaction.profile_id)
            .ok_or_else(|| FinanceError::unknown_profile(&transaction.profile_id))?;
        self.ensure_loaded(profile)?;
        let mut records = self.records.borrow_mut();
        if let Some(list) = records.get_mut(&profile.id) {
            if list.iter().any(|r| r.id == transaction.id) {
                return Err(FinanceError::Storage(format!(
                    "transaction already exists: {}",
                    transaction.id
                )));
            }
            list.push(TransactionRecord {
                id: transaction.id.clone(),
                label: transaction.label.clone(),
                amount: transaction.amount,
                tags: Vec::new(),
            });
        }
        self.owners
            .borrow_mut()
            .insert(transaction.id.clone(), profile.id.clone());
        self.mark_dirty(&profile.id);
        Ok(())
    }

    fn update(&self, transaction: &Transaction) -> FinanceResult<()> {
        let (owner, index) = self.locate(&transaction.id)?;
        let target = self
            .profile(&transaction.profile_id)
            .ok_or_else(|| FinanceError::unknown_profile(&transaction.profile_id))?;
        self.ensure_loaded(target)?;

        let mut records = self.records.borrow_mut();
        let mut record = match records.get_mut(&owner) {
            Some(list) if index < list.len() => list.remove(index),
            _ => return Err(FinanceError::unknown_transaction(&transaction.id)),
        };
        record.label = transaction.label.clone();
        record.amount = transaction.amount;

        let Some(list) = records.get_mut(&target.id) else {
            return Err(FinanceError::unknown_profile(&target.id));
        };
        if owner == target.id {
            // Keep the transaction's position within its own document
            list.insert(index.min(list.len()), record);
        } else {
            list.push(record);
        }
        drop(records);

        self.owners
            .borrow_mut()
            .insert(transaction.id.clone(), target.id.clone());
        self.mark_dirty(&owner);
        self.mark_dirty(&target.id);
        Ok(())
    }

    fn load_tags(&self, id: &TransactionId) -> FinanceResult<Vec<String>> {
        self.with_record(id, |record| record.tags.clone())
            .map(|(_, tags)| tags)
    }

    fn add_tags(&self, id: &TransactionId, tags: &[String]) -> FinanceResult<()> {
        let (owner, _) = self.with_record(id, |record| {
            for tag in tags {
                if !record.tags.contains(tag) {
                    record.tags.push(tag.clone());
                }
            }
        })?;
        self.mark_dirty(&owner);
        Ok(())
    }

    fn clear_tags(&self, id: &TransactionId) -> FinanceResult<()> {
        let (owner, _) = self.with_record(id, |record| record.tags.clear())?;
        self.mark_dirty(&owner);
        Ok(())
    }

    fn tags_embedded(&self) -> bool {
        true
    }

    fn atomically(&self, work: &mut Work<'_>) -> FinanceResult<()> {
        work(self)
    }
}
