use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use esim_core::SimError;
use esim_core::SimResult;
use esim_core::core::{CoreHandle, CoreRegistry, DecodeEngine};

/// Call counters shared between a `FakeEngine` and the test that created it.
#[derive(Debug, Default)]
pub struct EngineCalls {
    pub attach: AtomicUsize,
    pub detach: AtomicUsize,
}

impl EngineCalls {
    pub fn attached(&self) -> usize {
        self.attach.load(Ordering::SeqCst)
    }

    pub fn detached(&self) -> usize {
        self.detach.load(Ordering::SeqCst)
    }
}

/// Decode engine that records calls and can be told to refuse attachment.
#[derive(Debug)]
pub struct FakeEngine {
    extra: usize,
    fail_attach: bool,
    pub calls: Arc<EngineCalls>,
    pub bound: Option<CoreHandle>,
}

impl FakeEngine {
    pub fn new(extra: usize) -> Self {
        Self {
            extra,
            fail_attach: false,
            calls: Arc::new(EngineCalls::default()),
            bound: None,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail_attach = true;
        self
    }
}

impl DecodeEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    fn extra_bytes(&self) -> usize {
        self.extra
    }

    fn attach(&mut self, core: CoreHandle, cores: &CoreRegistry) -> SimResult<()> {
        let _ = self.calls.attach.fetch_add(1, Ordering::SeqCst);
        if self.fail_attach {
            return Err(SimError::AllocationFailed { requested: 0 });
        }
        assert!(cores.get(core).is_some());
        self.bound = Some(core);
        Ok(())
    }

    fn detach(&mut self) {
        let _ = self.calls.detach.fetch_add(1, Ordering::SeqCst);
        self.bound = None;
    }
}
