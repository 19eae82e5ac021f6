//! Hierarchical names
//!
//! Every named entity in the system is keyed by a `Name`: a chain of
//! string and numeric components grown from an anonymous root, like
//! `Nat.add` or `foo.bla.1`. Names are immutable and structurally
//! shared: extending a name allocates one new node that points at the
//! unchanged prefix.
//!
//! # Hash Caching
//!
//! The structural hash is computed once at construction by mixing the
//! prefix's cached hash with the leaf component's hash, so hashing a
//! deeply nested name is O(1) and equal names always hash equally
//! within a process run. The hash is not stable across runs.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, OnceLock, RwLock};

/// Counter backing [`Name::mk_unique`]. Monotonic for the whole process
/// lifetime; never reset, so two calls can never collide.
static UNIQUE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Global name interner for deduplicating `Name` allocations.
static NAME_INTERNER: OnceLock<NameInterner> = OnceLock::new();

/// Reserved namespace for internally generated names. User-facing
/// identifiers never start with this component.
const UNIQUE_NAMESPACE: &str = "_uniq";

/// Thread-safe interner caching names by their dotted rendering.
///
/// Constructing the same name over and over (environment lookups,
/// ambient-library constants) otherwise reallocates the whole chain.
pub struct NameInterner {
    cache: RwLock<HashMap<String, Arc<Name>>>,
}

impl NameInterner {
    fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Get the global interner instance.
    pub fn global() -> &'static Self {
        NAME_INTERNER.get_or_init(NameInterner::new)
    }

    /// Intern a dotted string like `Nat.add`, returning a shared `Arc`.
    pub fn intern(&self, s: &str) -> Arc<Name> {
        if let Some(name) = self
            .cache
            .read()
            .expect("name interner lock poisoned")
            .get(s)
            .cloned()
        {
            return name;
        }
        let mut cache = self.cache.write().expect("name interner lock poisoned");
        cache
            .entry(s.to_string())
            .or_insert_with(|| Arc::new(Name::from_string(s)))
            .clone()
    }

    /// Drop every cached name.
    pub fn clear(&self) {
        self.cache
            .write()
            .expect("name interner lock poisoned")
            .clear();
    }

    /// Number of cached names.
    pub fn len(&self) -> usize {
        self.cache.read().expect("name interner lock poisoned").len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The recursive spine of a hierarchical name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NameKind {
    /// The anonymous root.
    Anonymous,
    /// String component appended to a prefix.
    Str(Arc<Name>, Arc<str>),
    /// Numeric component appended to a prefix (auto-generated names).
    Num(Arc<Name>, u64),
}

/// Hierarchical name with cached structural hash.
#[derive(Clone, Debug)]
pub struct Name {
    kind: NameKind,
    cached_hash: u64,
}

// Serialize only the spine; the hash is rebuilt on the way in.
impl Serialize for Name {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.kind.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let kind = NameKind::deserialize(deserializer)?;
        Ok(Self::from_kind(kind))
    }
}

/// Mix two hash values (64-bit variant of boost-style hash_combine).
fn mix_hash(h1: u64, h2: u64) -> u64 {
    h1 ^ h2
        .wrapping_add(0x9e37_79b9_7f4a_7c15)
        .wrapping_add(h1 << 6)
        .wrapping_add(h1 >> 2)
}

fn str_hash(s: &str) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

impl Name {
    fn from_kind(kind: NameKind) -> Self {
        let cached_hash = match &kind {
            NameKind::Anonymous => 11,
            NameKind::Str(prefix, s) => mix_hash(prefix.cached_hash, str_hash(s)),
            NameKind::Num(prefix, n) => mix_hash(prefix.cached_hash, *n),
        };
        Name { kind, cached_hash }
    }

    /// The anonymous root name.
    pub fn anon() -> Self {
        Self::from_kind(NameKind::Anonymous)
    }

    /// Extend with a string component.
    #[must_use]
    pub fn str(self, s: impl AsRef<str>) -> Self {
        Self::from_kind(NameKind::Str(Arc::new(self), Arc::from(s.as_ref())))
    }

    /// Extend with a numeric component.
    #[must_use]
    pub fn num(self, n: u64) -> Self {
        Self::from_kind(NameKind::Num(Arc::new(self), n))
    }

    /// Check if this is the anonymous root.
    pub fn is_anon(&self) -> bool {
        matches!(self.kind, NameKind::Anonymous)
    }

    /// The spine, for pattern matching.
    #[inline]
    pub fn kind(&self) -> &NameKind {
        &self.kind
    }

    /// The cached structural hash.
    #[inline]
    pub fn get_hash(&self) -> u64 {
        self.cached_hash
    }

    /// Everything but the leaf component. The prefix of the anonymous
    /// name is the anonymous name itself.
    pub fn get_prefix(&self) -> Name {
        match &self.kind {
            NameKind::Anonymous => Name::anon(),
            NameKind::Str(prefix, _) | NameKind::Num(prefix, _) => (**prefix).clone(),
        }
    }

    /// True iff the leaf component is a string.
    pub fn is_string(&self) -> bool {
        matches!(self.kind, NameKind::Str(_, _))
    }

    /// True iff the leaf component is a numeral.
    pub fn is_numeral(&self) -> bool {
        matches!(self.kind, NameKind::Num(_, _))
    }

    /// Exactly one component over the anonymous root.
    pub fn is_atomic(&self) -> bool {
        match &self.kind {
            NameKind::Anonymous => false,
            NameKind::Str(prefix, _) | NameKind::Num(prefix, _) => prefix.is_anon(),
        }
    }

    /// The string of the leaf component.
    ///
    /// # Panics
    /// If the leaf is not a string component. That is a caller bug, not
    /// a recoverable condition.
    pub fn get_string(&self) -> &str {
        match &self.kind {
            NameKind::Str(_, s) => s,
            _ => panic!("name kind mismatch: leaf of '{self}' is not a string component"),
        }
    }

    /// The numeral of the leaf component.
    ///
    /// # Panics
    /// If the leaf is not a numeric component.
    pub fn get_numeral(&self) -> u64 {
        match &self.kind {
            NameKind::Num(_, n) => *n,
            _ => panic!("name kind mismatch: leaf of '{self}' is not a numeric component"),
        }
    }

    /// True iff every string component is pure ASCII.
    pub fn is_safe_ascii(&self) -> bool {
        match &self.kind {
            NameKind::Anonymous => true,
            NameKind::Str(prefix, s) => s.is_ascii() && prefix.is_safe_ascii(),
            NameKind::Num(prefix, _) => prefix.is_safe_ascii(),
        }
    }

    /// Number of components between the root and this name.
    pub fn depth(&self) -> usize {
        match &self.kind {
            NameKind::Anonymous => 0,
            NameKind::Str(prefix, _) | NameKind::Num(prefix, _) => prefix.depth() + 1,
        }
    }

    /// Walk up `k` components.
    fn ancestor(&self, k: usize) -> &Name {
        let mut cur = self;
        for _ in 0..k {
            cur = match &cur.kind {
                NameKind::Anonymous => cur,
                NameKind::Str(prefix, _) | NameKind::Num(prefix, _) => prefix,
            };
        }
        cur
    }

    /// True iff `self`'s component chain is a (non-strict) prefix of
    /// `other`'s.
    pub fn is_prefix_of(&self, other: &Name) -> bool {
        let da = self.depth();
        let db = other.depth();
        da <= db && *self == *other.ancestor(db - da)
    }

    /// Re-root `other`'s chain onto `self`.
    ///
    /// `anon.concat(b) == b`, `a.concat(anon) == a`, and concatenation
    /// is associative.
    #[must_use]
    pub fn concat(&self, other: &Name) -> Name {
        match &other.kind {
            NameKind::Anonymous => self.clone(),
            NameKind::Str(prefix, s) => self.concat(prefix).str(s.as_ref()),
            NameKind::Num(prefix, n) => self.concat(prefix).num(*n),
        }
    }

    /// A fresh name from the reserved `_uniq` namespace, distinct from
    /// every name any prior call returned in this process.
    pub fn mk_unique() -> Name {
        let n = UNIQUE_COUNTER.fetch_add(1, AtomicOrdering::Relaxed);
        Name::anon().str(UNIQUE_NAMESPACE).num(n)
    }

    /// Create from a dotted string like `Nat.add`. Components that
    /// parse as `u64` become numeric components.
    pub fn from_string(s: &str) -> Self {
        s.parse().expect("Name::from_str is infallible")
    }

    /// Create from a dotted string through the global interner; cheap
    /// for names constructed many times.
    #[inline]
    pub fn interned(s: &str) -> Self {
        (*NameInterner::global().intern(s)).clone()
    }

    /// Interned variant returning the shared `Arc` itself.
    #[inline]
    pub fn interned_arc(s: &str) -> Arc<Name> {
        NameInterner::global().intern(s)
    }

    /// Equal-depth lexicographic comparison, root to leaf.
    fn cmp_core(&self, other: &Name) -> Ordering {
        match (&self.kind, &other.kind) {
            (NameKind::Anonymous, NameKind::Anonymous) => Ordering::Equal,
            (NameKind::Str(p1, s1), NameKind::Str(p2, s2)) => {
                p1.cmp_core(p2).then_with(|| s1.cmp(s2))
            }
            (NameKind::Num(p1, n1), NameKind::Num(p2, n2)) => {
                p1.cmp_core(p2).then_with(|| n1.cmp(n2))
            }
            // At equal depth a numeral sorts before a string.
            (NameKind::Num(p1, _), NameKind::Str(p2, _)) => {
                p1.cmp_core(p2).then(Ordering::Less)
            }
            (NameKind::Str(p1, _), NameKind::Num(p2, _)) => {
                p1.cmp_core(p2).then(Ordering::Greater)
            }
            (NameKind::Anonymous, _) | (_, NameKind::Anonymous) => {
                unreachable!("cmp_core called on names of unequal depth")
            }
        }
    }
}

impl Default for Name {
    fn default() -> Self {
        Name::anon()
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        // Hash mismatch settles it without walking the chains.
        self.cached_hash == other.cached_hash && self.kind == other.kind
    }
}

impl Eq for Name {}

impl Hash for Name {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cached_hash.hash(state);
    }
}

impl Ord for Name {
    /// Total order: lexicographic over root-to-leaf component chains.
    /// A strict prefix sorts before any extension of it.
    fn cmp(&self, other: &Self) -> Ordering {
        let da = self.depth();
        let db = other.depth();
        match da.cmp(&db) {
            Ordering::Equal => self.cmp_core(other),
            Ordering::Less => self.cmp_core(other.ancestor(db - da)).then(Ordering::Less),
            Ordering::Greater => self.ancestor(da - db).cmp_core(other).then(Ordering::Greater),
        }
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::ops::Add<&Name> for &Name {
    type Output = Name;

    fn add(self, rhs: &Name) -> Name {
        self.concat(rhs)
    }
}

impl FromStr for Name {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.split('.').fold(Name::anon(), |acc, part| {
            if let Ok(n) = part.parse::<u64>() {
                acc.num(n)
            } else {
                acc.str(part)
            }
        }))
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            NameKind::Anonymous => write!(f, "[anonymous]"),
            NameKind::Str(prefix, s) => {
                if prefix.is_anon() {
                    write!(f, "{s}")
                } else {
                    write!(f, "{prefix}.{s}")
                }
            }
            NameKind::Num(prefix, n) => {
                if prefix.is_anon() {
                    write!(f, "{n}")
                } else {
                    write!(f, "{prefix}.{n}")
                }
            }
        }
    }
}

/// Set up the name module's process-global state (the interner).
///
/// First use also initializes lazily; calling this explicitly pins the
/// init-before-use ordering for embedders that care.
pub fn initialize_name() {
    let _ = NameInterner::global();
}

/// Tear down the name module's process-global state. The unique-name
/// counter is deliberately left alone so uniqueness survives an
/// initialize/finalize cycle within one process.
pub fn finalize_name() {
    if let Some(interner) = NAME_INTERNER.get() {
        interner.clear();
    }
}
