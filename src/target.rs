use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::error::{CertificateError, Result};

/// The certificate layout is pinned to this width for capture so the output
/// has a deterministic aspect ratio; height follows content flow.
pub const PINNED_WIDTH_PX: f32 = 1200.0;

/// Capture lifecycle of a render target. Terminal state is always `Idle`;
/// a capture may not begin unless the target is observed `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CapturePhase {
    Idle = 0,
    Capturing = 1,
    Restoring = 2,
}

impl CapturePhase {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => CapturePhase::Capturing,
            2 => CapturePhase::Restoring,
            _ => CapturePhase::Idle,
        }
    }
}

/// Presentation overrides applied while a capture is in flight. Off-screen
/// (hidden, no pinned width) is the resting state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Presentation {
    pub visible: bool,
    pub width_override: Option<f32>,
}

impl Presentation {
    fn hidden() -> Self {
        Self {
            visible: false,
            width_override: None,
        }
    }
}

pub(crate) struct SlotState {
    /// Identity of the last record successfully rendered on this mount.
    pub(crate) last_rendered: Option<Uuid>,
}

/// The off-screen scene a generation captures. Created on mount, destroyed
/// when the owning `Arc` drops; one logical caller per target.
pub struct RenderTarget {
    presentation: Mutex<Presentation>,
    phase: AtomicU8,
    pub(crate) capture_slot: AsyncMutex<SlotState>,
}

impl RenderTarget {
    pub fn mount() -> Arc<Self> {
        Arc::new(Self {
            presentation: Mutex::new(Presentation::hidden()),
            phase: AtomicU8::new(CapturePhase::Idle as u8),
            capture_slot: AsyncMutex::new(SlotState { last_rendered: None }),
        })
    }

    /// An opaque handle the pipeline resolves at generation time. Stops
    /// resolving once the mount is dropped.
    pub fn handle(self: &Arc<Self>) -> TargetHandle {
        TargetHandle {
            inner: Arc::downgrade(self),
        }
    }

    pub fn phase(&self) -> CapturePhase {
        CapturePhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub fn presentation(&self) -> Presentation {
        *lock_presentation(&self.presentation)
    }
}

#[derive(Clone)]
pub struct TargetHandle {
    inner: Weak<RenderTarget>,
}

impl TargetHandle {
    /// A handle that never resolves, standing in for an unmounted target.
    pub fn detached() -> Self {
        Self { inner: Weak::new() }
    }

    pub(crate) fn resolve(&self) -> Option<Arc<RenderTarget>> {
        self.inner.upgrade()
    }
}

/// Scoped visibility override. Acquisition flips the target to `Capturing`
/// and forces it visible at the pinned width; dropping the guard restores
/// the hidden state on every exit path, including early error returns.
pub(crate) struct CaptureGuard {
    target: Arc<RenderTarget>,
}

impl CaptureGuard {
    pub(crate) fn acquire(target: &Arc<RenderTarget>) -> Result<Self> {
        target
            .phase
            .compare_exchange(
                CapturePhase::Idle as u8,
                CapturePhase::Capturing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| CertificateError::CaptureInProgress)?;

        let mut presentation = lock_presentation(&target.presentation);
        presentation.visible = true;
        presentation.width_override = Some(PINNED_WIDTH_PX);
        drop(presentation);

        Ok(Self {
            target: Arc::clone(target),
        })
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.target
            .phase
            .store(CapturePhase::Restoring as u8, Ordering::Release);
        let mut presentation = lock_presentation(&self.target.presentation);
        *presentation = Presentation::hidden();
        drop(presentation);
        self.target
            .phase
            .store(CapturePhase::Idle as u8, Ordering::Release);
    }
}

fn lock_presentation(lock: &Mutex<Presentation>) -> MutexGuard<'_, Presentation> {
    lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_starts_hidden_and_idle() {
        let target = RenderTarget::mount();
        assert_eq!(target.phase(), CapturePhase::Idle);
        assert!(!target.presentation().visible);
        assert_eq!(target.presentation().width_override, None);
    }

    #[test]
    fn guard_forces_visibility_and_restores_on_drop() {
        let target = RenderTarget::mount();
        {
            let _guard = CaptureGuard::acquire(&target).unwrap();
            assert_eq!(target.phase(), CapturePhase::Capturing);
            let p = target.presentation();
            assert!(p.visible);
            assert_eq!(p.width_override, Some(PINNED_WIDTH_PX));
        }
        assert_eq!(target.phase(), CapturePhase::Idle);
        assert!(!target.presentation().visible);
    }

    #[test]
    fn second_acquire_is_rejected_while_capturing() {
        let target = RenderTarget::mount();
        let _guard = CaptureGuard::acquire(&target).unwrap();
        assert!(matches!(
            CaptureGuard::acquire(&target),
            Err(CertificateError::CaptureInProgress)
        ));
    }

    #[test]
    fn handle_stops_resolving_after_unmount() {
        let target = RenderTarget::mount();
        let handle = target.handle();
        assert!(handle.resolve().is_some());
        drop(target);
        assert!(handle.resolve().is_none());
        assert!(TargetHandle::detached().resolve().is_none());
    }
}
