// src/handle.rs

// --- Define Handle Trait ---
// Any type stored in the bounded buffer must implement this trait.
//
// A handle is an opaque, copyable, word-sized reference to caller-owned
// data: a raw index, a key into a caller-side table, or a pointer wrapper
// the caller manages. The buffer stores and returns handle values only; it
// never inspects one, never dereferences one, and never frees what a handle
// refers to.
pub trait Handle: Copy + Send + 'static {}

// Every copyable, sendable value qualifies; the bound exists to document
// the contract at the type seam, not to restrict callers.
impl<T: Copy + Send + 'static> Handle for T {}
