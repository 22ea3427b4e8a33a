//! In-crate mock device used by submitter tests.
//!
//! The mock records every committed command buffer and lets a test decide when
//! (and in which order) completion handlers fire.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::compositor::Compositor;
use crate::context::RenderContext;
use crate::coords::{PixelSize, Viewport};
use crate::device::{CommandBuffer, CompletionHandler, GpuBackend, TextureAllocError};
use crate::scene::{Primitive, Scene};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct MockDrawable(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct MockTexture {
    pub id: u32,
    pub size: PixelSize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MockOp {
    Encode { drawable: MockDrawable, primitives: Vec<Primitive> },
    EncodeOffscreen { texture: MockTexture, primitives: Vec<Primitive> },
    Composite { texture: MockTexture, drawable: MockDrawable },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Committed {
    pub label: String,
    pub ops: Vec<MockOp>,
    pub presented: Option<MockDrawable>,
}

struct MockState {
    drawable_available: bool,
    drawable_error: bool,
    fail_texture_alloc: bool,
    max_texture_dimension: u32,
    auto_complete: bool,
    next_drawable: u32,
    next_texture: u32,
    buffers_created: usize,
    committed: Vec<Committed>,
    allocations: Vec<MockTexture>,
    surface_sizes: Vec<PixelSize>,
    pending: Vec<CompletionHandler>,
}

/// Test-side view of the mock device; cheap to clone and `Send`.
#[derive(Clone)]
pub(crate) struct MockHandle(Arc<Mutex<MockState>>);

impl MockHandle {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.0.lock().unwrap()
    }

    pub fn set_drawable_available(&self, yes: bool) {
        self.lock().drawable_available = yes;
    }

    /// Makes `current_drawable` fail as an unrecoverable surface error.
    pub fn set_drawable_error(&self, yes: bool) {
        self.lock().drawable_error = yes;
    }

    pub fn set_fail_texture_alloc(&self, yes: bool) {
        self.lock().fail_texture_alloc = yes;
    }

    pub fn set_max_texture_dimension(&self, max: u32) {
        self.lock().max_texture_dimension = max;
    }

    pub fn buffers_created(&self) -> usize {
        self.lock().buffers_created
    }

    pub fn committed(&self) -> Vec<Committed> {
        self.lock().committed.clone()
    }

    pub fn allocations(&self) -> Vec<MockTexture> {
        self.lock().allocations.clone()
    }

    pub fn surface_sizes(&self) -> Vec<PixelSize> {
        self.lock().surface_sizes.clone()
    }

    pub fn pending_completions(&self) -> usize {
        self.lock().pending.len()
    }

    /// Fires the completion registered at `index` among the pending ones.
    /// Handlers run outside the lock.
    pub fn complete_at(&self, index: usize) {
        let handler = self.lock().pending.remove(index);
        handler();
    }

    pub fn complete_oldest(&self) {
        self.complete_at(0);
    }

    pub fn complete_newest(&self) {
        let last = self.pending_completions() - 1;
        self.complete_at(last);
    }

    pub fn complete_all(&self) {
        let handlers = std::mem::take(&mut self.lock().pending);
        for h in handlers {
            h();
        }
    }
}

pub(crate) struct MockBackend {
    handle: MockHandle,
}

impl MockBackend {
    /// Completions are held until the test fires them.
    pub fn new() -> (Self, MockHandle) {
        Self::with_auto_complete(false)
    }

    /// Completions fire as soon as the buffer is committed.
    pub fn completing_immediately() -> (Self, MockHandle) {
        Self::with_auto_complete(true)
    }

    fn with_auto_complete(auto_complete: bool) -> (Self, MockHandle) {
        let handle = MockHandle(Arc::new(Mutex::new(MockState {
            drawable_available: true,
            drawable_error: false,
            fail_texture_alloc: false,
            max_texture_dimension: 8192,
            auto_complete,
            next_drawable: 0,
            next_texture: 0,
            buffers_created: 0,
            committed: Vec::new(),
            allocations: Vec::new(),
            surface_sizes: Vec::new(),
            pending: Vec::new(),
        })));
        (Self { handle: handle.clone() }, handle)
    }
}

pub(crate) struct MockCommandBuffer {
    handle: MockHandle,
    label: String,
    ops: Vec<MockOp>,
    presented: Option<MockDrawable>,
    handlers: Vec<CompletionHandler>,
}

impl MockCommandBuffer {
    pub fn record(&mut self, op: MockOp) {
        self.ops.push(op);
    }
}

impl CommandBuffer for MockCommandBuffer {
    type Drawable = MockDrawable;

    fn add_completed_handler(&mut self, handler: CompletionHandler) {
        self.handlers.push(handler);
    }

    fn present(&mut self, drawable: MockDrawable) {
        self.presented = Some(drawable);
    }

    fn commit(self) {
        let MockCommandBuffer { handle, label, ops, presented, handlers } = self;
        let run_now = {
            let mut st = handle.lock();
            st.committed.push(Committed { label, ops, presented });
            if st.auto_complete {
                handlers
            } else {
                st.pending.extend(handlers);
                Vec::new()
            }
        };
        for h in run_now {
            h();
        }
    }
}

impl GpuBackend for MockBackend {
    type Drawable = MockDrawable;
    type Texture = MockTexture;
    type CommandBuffer = MockCommandBuffer;

    fn make_command_buffer(&mut self, label: &str) -> MockCommandBuffer {
        self.handle.lock().buffers_created += 1;
        MockCommandBuffer {
            handle: self.handle.clone(),
            label: label.to_owned(),
            ops: Vec::new(),
            presented: None,
            handlers: Vec::new(),
        }
    }

    fn current_drawable(&mut self) -> anyhow::Result<Option<MockDrawable>> {
        let mut st = self.handle.lock();
        if st.drawable_error {
            anyhow::bail!("mock surface lost");
        }
        if !st.drawable_available {
            return Ok(None);
        }
        let d = MockDrawable(st.next_drawable);
        st.next_drawable += 1;
        Ok(Some(d))
    }

    fn create_render_texture(&mut self, size: PixelSize) -> Result<MockTexture, TextureAllocError> {
        if size.is_empty() {
            return Err(TextureAllocError::ZeroSize(size));
        }
        let mut st = self.handle.lock();
        let max = st.max_texture_dimension;
        if size.width > max || size.height > max {
            return Err(TextureAllocError::TooLarge { size, max });
        }
        if st.fail_texture_alloc {
            return Err(TextureAllocError::Device {
                size,
                message: "mock allocation failure".to_owned(),
            });
        }
        let t = MockTexture { id: st.next_texture, size };
        st.next_texture += 1;
        st.allocations.push(t);
        Ok(t)
    }

    fn texture_size(&self, texture: &MockTexture) -> PixelSize {
        texture.size
    }

    fn resize_surface(&mut self, size: PixelSize) {
        self.handle.lock().surface_sizes.push(size);
    }
}

impl RenderContext<MockBackend> for Scene {
    fn begin(&mut self, viewport: Viewport) {
        Scene::begin(self, viewport);
    }

    fn encode(&mut self, _: &MockBackend, buffer: &mut MockCommandBuffer, target: &MockDrawable) {
        buffer.record(MockOp::Encode {
            drawable: *target,
            primitives: self.primitives().to_vec(),
        });
    }

    fn encode_offscreen(&mut self, _: &MockBackend, buffer: &mut MockCommandBuffer, target: &MockTexture) {
        buffer.record(MockOp::EncodeOffscreen {
            texture: *target,
            primitives: self.primitives().to_vec(),
        });
    }
}

pub(crate) struct MockCompositor;

impl Compositor<MockBackend> for MockCompositor {
    fn composite(
        &self,
        _: &MockBackend,
        buffer: &mut MockCommandBuffer,
        target: &MockDrawable,
        source: &MockTexture,
    ) {
        buffer.record(MockOp::Composite { texture: *source, drawable: *target });
    }
}
