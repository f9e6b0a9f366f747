use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::ptr;

/// A raw device object that is handed to `release` when dropped, so setup can
/// bail out with `?` without leaking what it already created.
pub struct Owned<'a, T> {
    value: ManuallyDrop<T>,
    release: Option<Box<dyn FnOnce(T) + 'a>>,
}

impl<'a, T> Owned<'a, T> {
    pub fn new(value: T, release: impl FnOnce(T) + 'a) -> Self {
        Owned {
            value: ManuallyDrop::new(value),
            release: Some(Box::new(release)),
        }
    }
}

impl<'a, T> Deref for Owned<'a, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<'a, T> DerefMut for Owned<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<'a, T> Drop for Owned<'a, T> {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release(unsafe { ManuallyDrop::into_inner(ptr::read(&self.value)) });
        }
    }
}
