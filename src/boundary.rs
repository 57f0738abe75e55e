//! Failure containment for the globe.
//!
//! The globe is the one part of the scene that depends on external image
//! files and the GPU. Everything it does runs through an [`ErrorBoundary`]:
//! an error or a panic inside is logged, the boundary trips, and the globe
//! is replaced by a static message for the rest of the session. Nothing
//! escapes to the caller.

use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};

use crate::globe::textures::panic_message;

/// Message shown in place of the globe once it has failed.
pub const FALLBACK_MARKUP: &str =
    "The globe view hit an error and has been disabled to keep the page usable.";

#[derive(Debug, Clone)]
pub struct ErrorBoundary {
    name: String,
    failure: Option<String>,
}

impl ErrorBoundary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failure: None,
        }
    }

    /// Run `f` inside the boundary.
    ///
    /// Returns `None` if the boundary is (or becomes) tripped: when `f`
    /// returns `Err` or panics, and on every call after that without
    /// running `f` again.
    pub fn run<T, E, F>(&mut self, f: F) -> Option<T>
    where
        E: Display,
        F: FnOnce() -> Result<T, E>,
    {
        if self.failure.is_some() {
            return None;
        }

        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                self.trip(e.to_string());
                None
            }
            Err(payload) => {
                self.trip(format!("panic: {}", panic_message(payload.as_ref())));
                None
            }
        }
    }

    /// Trip the boundary from outside, e.g. for an error reported by the GPU.
    pub fn trip(&mut self, reason: impl Into<String>) {
        if self.failure.is_some() {
            return;
        }
        let reason = reason.into();
        log::error!("{} failed, showing fallback: {}", self.name, reason);
        self.failure = Some(reason);
    }

    pub fn is_tripped(&self) -> bool {
        self.failure.is_some()
    }

    /// Why the boundary tripped.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fallback_markup(&self) -> &'static str {
        FALLBACK_MARKUP
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_passes_through() {
        let mut b = ErrorBoundary::new("globe");
        assert_eq!(b.run(|| Ok::<_, String>(42)), Some(42));
        assert!(!b.is_tripped());
    }

    #[test]
    fn test_err_trips() {
        let mut b = ErrorBoundary::new("globe");
        assert_eq!(b.run(|| Err::<(), _>("texture decode failed")), None);
        assert!(b.is_tripped());
        assert_eq!(b.failure(), Some("texture decode failed"));
    }

    #[test]
    fn test_panic_is_contained() {
        let mut b = ErrorBoundary::new("globe");
        let out: Option<()> = b.run(|| -> Result<(), String> { panic!("no graphics context") });
        assert!(out.is_none());
        assert!(b.failure().unwrap().contains("no graphics context"));
    }

    #[test]
    fn test_stays_tripped() {
        let mut b = ErrorBoundary::new("globe");
        b.trip("lost device");
        let mut ran = false;
        let out = b.run(|| {
            ran = true;
            Ok::<_, String>(())
        });
        assert!(out.is_none());
        assert!(!ran);
        assert_eq!(b.fallback_markup(), FALLBACK_MARKUP);
    }
}
