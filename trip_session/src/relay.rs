// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use std::sync::Mutex;
use tokio::sync::Notify;

struct SlotInner<T> {
    value: Option<T>,
    closed: bool,
}

/// A single-slot conflating relay between one producer and one consumer.
///
/// The slot holds at most the latest unconsumed value: a [`put`](Self::put)
/// while an older value is still pending silently overwrites it. Fixes can
/// arrive faster than they are processed and only the freshest one matters,
/// so conflation caps both memory and lag at a single element.
///
/// [`take`](Self::take) suspends until a value exists. [`close`](Self::close)
/// wakes pending takers and makes all pending and future `take` calls return
/// `None`; a value still sitting in the slot at close time is discarded so
/// that nothing is delivered after shutdown.
pub struct ConflatedSlot<T> {
    inner: Mutex<SlotInner<T>>,
    notify: Notify,
}

impl<T> ConflatedSlot<T> {
    pub fn new() -> Self {
        ConflatedSlot {
            inner: Mutex::new(SlotInner {
                value: None,
                closed: false,
            }),
            notify: Notify::new(),
        }
    }

    /// Stores a value in the slot, overwriting an unconsumed one.
    ///
    /// Never blocks. Returns `false` when the slot is closed and the value
    /// was dropped.
    pub fn put(&self, value: T) -> bool {
        {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            if inner.closed {
                return false;
            }
            inner.value = Some(value);
        }
        self.notify.notify_one();
        true
    }

    /// Takes the freshest value out of the slot, waiting until one exists.
    ///
    /// Returns `None` once the slot has been closed.
    pub async fn take(&self) -> Option<T> {
        loop {
            // The notified future must exist before the slot is checked,
            // otherwise a put between check and await would be lost.
            let notified = self.notify.notified();
            {
                let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
                if inner.closed {
                    return None;
                }
                if let Some(value) = inner.value.take() {
                    return Some(value);
                }
            }
            notified.await;
        }
    }

    /// Closes the slot, discarding an unconsumed value.
    ///
    /// Idempotent. Pending takers are woken up and observe the closed state.
    pub fn close(&self) {
        {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            inner.closed = true;
            inner.value = None;
        }
        self.notify.notify_waiters();
        self.notify.notify_one();
    }
}

impl<T> Default for ConflatedSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
