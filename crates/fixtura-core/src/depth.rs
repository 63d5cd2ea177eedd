use std::ops::Deref;
use std::sync::Arc;

/// Leading marker on a blueprint name requesting one more level of indirection.
pub const INDIRECTION_MARKER: char = '*';

/// Number of reference levels wrapped around a generated record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Depth {
    Value,
    Ref,
    RefRef,
}

impl Depth {
    pub fn level(self) -> usize {
        match self {
            Depth::Value => 0,
            Depth::Ref => 1,
            Depth::RefRef => 2,
        }
    }

    pub fn from_level(level: usize) -> Option<Self> {
        match level {
            0 => Some(Depth::Value),
            1 => Some(Depth::Ref),
            2 => Some(Depth::RefRef),
            _ => None,
        }
    }

    /// Add `markers` levels, or `None` past `RefRef`.
    pub fn deepen(self, markers: usize) -> Option<Self> {
        Self::from_level(self.level().checked_add(markers)?)
    }
}

/// Split leading indirection markers off a requested blueprint name.
///
/// A name made only of markers is kept as-is so it can still be looked up.
pub fn split_markers(name: &str) -> (usize, &str) {
    let stripped = name.trim_start_matches(INDIRECTION_MARKER);
    if stripped.is_empty() {
        return (0, name);
    }
    let markers = name.len() - stripped.len();
    (markers, stripped)
}

/// A generated record wrapped to the depth it was requested at.
#[derive(Debug, Clone, PartialEq)]
pub enum Instance<R> {
    Value(R),
    Ref(Arc<R>),
    RefRef(Arc<Arc<R>>),
}

impl<R> Instance<R> {
    pub fn wrap(record: R, depth: Depth) -> Self {
        match depth {
            Depth::Value => Instance::Value(record),
            Depth::Ref => Instance::Ref(Arc::new(record)),
            Depth::RefRef => Instance::RefRef(Arc::new(Arc::new(record))),
        }
    }

    pub fn depth(&self) -> Depth {
        match self {
            Instance::Value(_) => Depth::Value,
            Instance::Ref(_) => Depth::Ref,
            Instance::RefRef(_) => Depth::RefRef,
        }
    }

    /// The unwrapped record.
    pub fn get(&self) -> &R {
        match self {
            Instance::Value(record) => record,
            Instance::Ref(record) => record,
            Instance::RefRef(record) => record,
        }
    }

    pub fn shared(&self) -> Option<&Arc<R>> {
        match self {
            Instance::Ref(record) => Some(record),
            _ => None,
        }
    }

    pub fn shared_twice(&self) -> Option<&Arc<Arc<R>>> {
        match self {
            Instance::RefRef(record) => Some(record),
            _ => None,
        }
    }

    /// Take the record out, cloning it if the reference is still shared.
    pub fn into_record(self) -> R
    where
        R: Clone,
    {
        match self {
            Instance::Value(record) => record,
            Instance::Ref(record) => Arc::unwrap_or_clone(record),
            Instance::RefRef(record) => Arc::unwrap_or_clone(Arc::unwrap_or_clone(record)),
        }
    }

    /// Whether both instances point at the same allocation. Values never do.
    pub fn shares_allocation(&self, other: &Self) -> bool {
        match (self, other) {
            (Instance::Ref(left), Instance::Ref(right)) => Arc::ptr_eq(left, right),
            (Instance::RefRef(left), Instance::RefRef(right)) => Arc::ptr_eq(left, right),
            _ => false,
        }
    }
}

impl<R> Deref for Instance<R> {
    type Target = R;

    fn deref(&self) -> &R {
        self.get()
    }
}
