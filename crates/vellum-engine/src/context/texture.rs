use std::fmt;
use std::sync::{Arc, Weak};

/// Identifier of a texture owned by a render context.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "texture#{}", self.0)
    }
}

/// The side of a render context that frees textures.
///
/// Implementations must defer the GPU-side free until in-flight frames that
/// sample the texture have completed.
pub trait TextureOwner: Send + Sync {
    fn delete_texture(&self, id: TextureId);
}

/// Shared ownership of a texture allocated by a render context.
///
/// Clones share one reference count. When the last clone drops, the owner's
/// [`TextureOwner::delete_texture`] runs exactly once; this is the only path by
/// which user textures are freed.
///
/// Handles must be dropped before their owning context. That order is the
/// caller's responsibility; violating it asserts in debug builds and leaks the
/// texture id with a warning in release builds.
#[derive(Clone)]
pub struct TextureHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    id: TextureId,
    owner: Weak<dyn TextureOwner>,
}

impl TextureHandle {
    pub fn new<O>(id: TextureId, owner: &Arc<O>) -> Self
    where
        O: TextureOwner + 'static,
    {
        let owner = Arc::downgrade(owner);
        let owner: Weak<dyn TextureOwner> = owner;
        Self {
            inner: Arc::new(HandleInner { id, owner }),
        }
    }

    #[inline]
    pub fn id(&self) -> TextureId {
        self.inner.id
    }

    /// Number of live clones of this handle.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Returns `true` while the owning context is alive.
    pub fn is_owner_alive(&self) -> bool {
        self.inner.owner.strong_count() > 0
    }
}

impl Drop for HandleInner {
    fn drop(&mut self) {
        match self.owner.upgrade() {
            Some(owner) => owner.delete_texture(self.id),
            None => {
                debug_assert!(false, "{} outlived its owning render context", self.id);
                log::warn!("{} dropped after its render context; nothing to free", self.id);
            }
        }
    }
}

impl PartialEq for TextureHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for TextureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureHandle")
            .field("id", &self.inner.id)
            .field("refs", &self.ref_count())
            .finish()
    }
}
