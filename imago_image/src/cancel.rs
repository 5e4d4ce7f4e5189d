use imago_core::{IiifError, IiifResult};
use std::sync::{
	Arc,
	atomic::{AtomicBool, Ordering},
};

/// Shared flag telling a running transformation to stop at the next step boundary.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.0.store(true, Ordering::Relaxed);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::Relaxed)
	}

	/// Returns an internal error once the flag has been raised.
	pub fn check(&self) -> IiifResult<()> {
		if self.is_cancelled() {
			Err(IiifError::Internal(anyhow::anyhow!("request was cancelled")))
		} else {
			Ok(())
		}
	}

	/// Guard that raises the flag when dropped, unless [`CancelGuard::disarm`] was called.
	pub fn guard(&self) -> CancelGuard {
		CancelGuard {
			flag: Some(self.clone()),
		}
	}
}

#[derive(Debug)]
pub struct CancelGuard {
	flag: Option<CancelFlag>,
}

impl CancelGuard {
	pub fn disarm(mut self) {
		self.flag = None;
	}
}

impl Drop for CancelGuard {
	fn drop(&mut self) {
		if let Some(flag) = self.flag.take() {
			flag.cancel();
		}
	}
}
