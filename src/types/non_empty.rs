use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// A vector that guarantees at least one element exists.
///
/// Used for edge waypoint sequences: a connection without any waypoint has
/// no geometry at all and is represented by an absent layout instead.
/// Serialized as a plain sequence; deserializing an empty sequence fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyVec<T> {
    head: T,
    tail: Vec<T>,
}

impl<T> NonEmptyVec<T> {
    /// Create a new NonEmptyVec with a single element
    pub fn new(head: T) -> Self {
        Self {
            head,
            tail: Vec::new(),
        }
    }

    /// Take ownership of a vector, or `None` when it is empty.
    pub fn from_vec(items: Vec<T>) -> Option<Self> {
        let mut items = items.into_iter();
        let head = items.next()?;
        Some(Self {
            head,
            tail: items.collect(),
        })
    }

    /// Get the first element (guaranteed to exist)
    pub fn first(&self) -> &T {
        &self.head
    }

    pub fn last(&self) -> &T {
        self.tail.last().unwrap_or(&self.head)
    }

    /// Add an element to the end
    pub fn push(&mut self, value: T) {
        self.tail.push(value);
    }

    /// Get the length (always >= 1)
    pub fn len(&self) -> usize {
        1 + self.tail.len()
    }

    /// Iterator over all elements
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        std::iter::once(&self.head).chain(self.tail.iter())
    }
}

impl<T> From<T> for NonEmptyVec<T> {
    fn from(head: T) -> Self {
        Self::new(head)
    }
}

impl<T: Serialize> Serialize for NonEmptyVec<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for NonEmptyVec<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        Self::from_vec(items).ok_or_else(|| de::Error::invalid_length(0, &"at least one element"))
    }
}
