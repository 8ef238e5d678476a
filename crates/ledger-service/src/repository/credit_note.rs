//! # Credit Note Repository
//!
//! Storage contract for credit notes. Saves compare on the stored status so
//! two callers cannot both move the same note out of `Pendiente`.

use std::collections::HashMap;
use std::sync::Mutex;

use ledger_core::{CreditNote, CreditNoteStatus};
use tracing::debug;

use super::lock;
use crate::error::{ServiceError, ServiceResult};

/// Storage for credit notes.
pub trait CreditNoteRepository: Send + Sync {
    fn get(&self, id: &str) -> ServiceResult<Option<CreditNote>>;

    /// Stores a note.
    ///
    /// `expected_status` is the status the caller read; `None` inserts.
    fn save(&self, note: CreditNote, expected_status: Option<CreditNoteStatus>) -> ServiceResult<CreditNote>;

    /// Removes a note whose stored status is still `expected_status`.
    fn delete(&self, id: &str, expected_status: CreditNoteStatus) -> ServiceResult<()>;

    /// All notes, ordered by number.
    fn list(&self) -> ServiceResult<Vec<CreditNote>>;

    /// Number of stored notes.
    fn count(&self) -> ServiceResult<usize>;

    /// Reserves the next value of the numbering sequence.
    ///
    /// Never reused, even after a note is deleted.
    fn next_sequence(&self) -> ServiceResult<u64>;
}

#[derive(Debug, Default)]
struct NoteTable {
    notes: HashMap<String, CreditNote>,
    sequence: u64,
}

/// `Mutex<HashMap>` backed credit note storage.
#[derive(Debug, Default)]
pub struct InMemoryCreditNoteRepository {
    table: Mutex<NoteTable>,
}

impl InMemoryCreditNoteRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CreditNoteRepository for InMemoryCreditNoteRepository {
    fn get(&self, id: &str) -> ServiceResult<Option<CreditNote>> {
        Ok(lock(&self.table, "credit_notes")?.notes.get(id).cloned())
    }

    fn save(&self, note: CreditNote, expected_status: Option<CreditNoteStatus>) -> ServiceResult<CreditNote> {
        let mut table = lock(&self.table, "credit_notes")?;

        match (table.notes.get(&note.id), expected_status) {
            (Some(_), None) => {
                return Err(ServiceError::AlreadyExists {
                    entity: "CreditNote".to_string(),
                    id: note.id,
                });
            }
            (None, Some(_)) => return Err(ServiceError::not_found("CreditNote", note.id)),
            (Some(stored), Some(expected)) if stored.status != expected => {
                return Err(ServiceError::version_conflict(
                    "CreditNote",
                    note.id,
                    expected,
                    stored.status,
                ));
            }
            _ => {}
        }

        debug!(id = %note.id, numero = %note.numero, status = %note.status, "Saving credit note");
        table.notes.insert(note.id.clone(), note.clone());
        Ok(note)
    }

    fn delete(&self, id: &str, expected_status: CreditNoteStatus) -> ServiceResult<()> {
        let mut table = lock(&self.table, "credit_notes")?;
        let stored = table
            .notes
            .get(id)
            .map(|n| n.status)
            .ok_or_else(|| ServiceError::not_found("CreditNote", id))?;
        if stored != expected_status {
            return Err(ServiceError::version_conflict("CreditNote", id, expected_status, stored));
        }

        table.notes.remove(id);
        debug!(id = %id, "Deleted credit note");
        Ok(())
    }

    fn list(&self) -> ServiceResult<Vec<CreditNote>> {
        let mut notes: Vec<CreditNote> = lock(&self.table, "credit_notes")?
            .notes
            .values()
            .cloned()
            .collect();
        notes.sort_by(|a, b| a.numero.cmp(&b.numero));
        Ok(notes)
    }

    fn count(&self) -> ServiceResult<usize> {
        Ok(lock(&self.table, "credit_notes")?.notes.len())
    }

    fn next_sequence(&self) -> ServiceResult<u64> {
        let mut table = lock(&self.table, "credit_notes")?;
        table.sequence += 1;
        Ok(table.sequence)
    }
}
