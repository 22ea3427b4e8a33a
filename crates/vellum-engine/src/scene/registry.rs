use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::context::{TextureHandle, TextureId, TextureOwner};
use crate::coords::PixelSize;

/// RGBA8 pixels registered but not yet uploaded to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub id: TextureId,
    pub size: PixelSize,
    pub rgba: Vec<u8>,
}

/// Bookkeeping for user textures shared between a scene and its handles.
///
/// Handles may be dropped on any thread; the registry only queues the delete.
/// The renderer drains uploads and deletes on the submission thread.
#[derive(Debug, Default)]
pub struct TextureRegistry {
    state: Mutex<RegistryState>,
}

#[derive(Debug, Default)]
struct RegistryState {
    next_id: u32,
    live: HashMap<TextureId, PixelSize>,
    pending: Vec<PendingUpload>,
    deleted: Vec<TextureId>,
}

impl TextureRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers pixel data and returns the first handle to it.
    pub fn register(self: &Arc<Self>, size: PixelSize, rgba: Vec<u8>) -> TextureHandle {
        let id = {
            let mut st = self.lock();
            let id = TextureId(st.next_id);
            st.next_id = st.next_id.wrapping_add(1);
            st.live.insert(id, size);
            st.pending.push(PendingUpload { id, size, rgba });
            id
        };
        log::debug!("registered {id} ({size})");
        TextureHandle::new(id, self)
    }

    pub fn size(&self, id: TextureId) -> Option<PixelSize> {
        self.lock().live.get(&id).copied()
    }

    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }

    pub fn take_pending_uploads(&self) -> Vec<PendingUpload> {
        std::mem::take(&mut self.lock().pending)
    }

    pub fn take_deleted(&self) -> Vec<TextureId> {
        std::mem::take(&mut self.lock().deleted)
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TextureOwner for TextureRegistry {
    fn delete_texture(&self, id: TextureId) {
        let mut st = self.lock();
        if st.live.remove(&id).is_none() {
            debug_assert!(false, "{id} deleted twice");
            log::error!("{id} deleted twice; ignoring");
            return;
        }
        // Never reached the device.
        st.pending.retain(|p| p.id != id);
        st.deleted.push(id);
        drop(st);
        log::debug!("{id} released");
    }
}
