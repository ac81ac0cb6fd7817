// Keymerge - Scoped keychain item handle
//
// Wraps a backend item handle and releases it when dropped, so every exit
// path (including `?` early returns) gives the handle back.

use std::ops::Deref;

use super::KeychainBackend;

pub struct ItemGuard<'a, B: KeychainBackend + ?Sized> {
    backend: &'a B,
    item: B::Item,
}

impl<'a, B: KeychainBackend + ?Sized> ItemGuard<'a, B> {
    /// Take responsibility for releasing `item`.
    pub fn new(backend: &'a B, item: B::Item) -> Self {
        Self { backend, item }
    }
}

impl<B: KeychainBackend + ?Sized> Deref for ItemGuard<'_, B> {
    type Target = B::Item;

    fn deref(&self) -> &B::Item {
        &self.item
    }
}

impl<B: KeychainBackend + ?Sized> Drop for ItemGuard<'_, B> {
    fn drop(&mut self) {
        self.backend.release(&self.item);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
