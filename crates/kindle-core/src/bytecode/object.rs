//! Heap objects and the string interner
//!
//! Objects live behind reference-counted handles owned by a [`Heap`]. The
//! heap is passed explicitly to whoever needs to allocate (the compiler for
//! string literals, the VM for concatenation); there is no global allocator.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A heap-allocated object
#[derive(Debug, PartialEq, Eq)]
pub enum Object {
    /// An interned string
    String(Box<str>),
}

impl Object {
    /// Returns the type name of this object (for error messages)
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Object::String(_) => "string",
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::String(s) => write!(f, "{s}"),
        }
    }
}

/// Shared handle to a heap object
///
/// Two handles are equal when they point at the same object. Strings are
/// interned, so equal text always yields the same object.
#[derive(Clone)]
pub struct ObjRef(Rc<Object>);

impl ObjRef {
    /// The referenced object
    #[must_use]
    pub fn object(&self) -> &Object {
        &self.0
    }

    /// The string contents, if this is a string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self.object() {
            Object::String(s) => Some(s),
        }
    }
}

impl PartialEq for ObjRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ObjRef {}

impl fmt::Debug for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.object() {
            Object::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl fmt::Display for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.object())
    }
}

/// Registry of live objects
#[derive(Default)]
pub struct Heap {
    strings: HashMap<Box<str>, ObjRef>,
}

impl Heap {
    /// Create an empty heap
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the interned string object for `text`, allocating it if needed
    pub fn intern(&mut self, text: &str) -> ObjRef {
        if let Some(existing) = self.strings.get(text) {
            return existing.clone();
        }
        let object = ObjRef(Rc::new(Object::String(text.into())));
        self.strings.insert(text.into(), object.clone());
        object
    }

    /// Number of live objects
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Returns true if nothing has been allocated
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Release every object held by the heap
    ///
    /// Handles still held elsewhere stay valid but are no longer interned.
    pub fn clear(&mut self) {
        self.strings.clear();
    }
}

impl fmt::Debug for Heap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Heap")
            .field("strings", &self.strings.len())
            .finish()
    }
}
