//! Range-aware streaming of stored content.

use crate::access::AccessGuard;
use cubby_core::{AccessCredential, AppError, FileRecord, RangeSpec, ResolvedRange};
use cubby_storage::{ByteStream, ChunkStores};
use uuid::Uuid;

/// What portion of the entity a stream covers.
#[derive(Debug, Clone, Copy)]
pub enum Served {
    /// The whole entity; `size` is the total length.
    Full { size: u64 },
    /// A validated inclusive byte window.
    Partial(ResolvedRange),
}

/// An authorized, opened read: record metadata, the served window, and the
/// lazy body. Carries everything the HTTP layer needs for 200/206 responses.
pub struct FileStream {
    pub record: FileRecord,
    pub served: Served,
    pub body: ByteStream,
}

/// Serves whole-file and byte-range reads against a stored file.
///
/// Range reads go through `ChunkStore::read_range`, which is random-access on
/// every backend; seeking never reads and discards preceding bytes.
#[derive(Clone)]
pub struct RangeStreamer {
    guard: AccessGuard,
    stores: ChunkStores,
}

impl RangeStreamer {
    pub fn new(guard: AccessGuard, stores: ChunkStores) -> Self {
        RangeStreamer { guard, stores }
    }

    /// Authorize the credential and open a stream over the requested range,
    /// or the whole file when no range is given.
    pub async fn open(
        &self,
        credential: &AccessCredential,
        file_id: Uuid,
        range: Option<RangeSpec>,
    ) -> Result<FileStream, AppError> {
        let record = self.guard.authorize_read(credential, file_id).await?;
        let store = self.stores.for_backend(record.backend)?;
        let size = record.size as u64;

        let (served, body) = match range {
            None => {
                let body = store.read_all(record.id).await?;
                (Served::Full { size }, body)
            }
            Some(spec) => {
                let resolved = spec.resolve(size)?;
                let body = store
                    .read_range(record.id, resolved.start, resolved.end)
                    .await?;
                (Served::Partial(resolved), body)
            }
        };

        tracing::debug!(
            file_id = %record.id,
            backend = %record.backend,
            served = ?served,
            "Opened content stream"
        );

        Ok(FileStream {
            record,
            served,
            body,
        })
    }
}
