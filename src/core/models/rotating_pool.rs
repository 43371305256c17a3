use crate::global_constants::LOG_TAG_POOL;

/// Maps a logical index seen through the rotated view onto the backing
/// storage. Callers must guarantee `count > 0`.
pub fn physical_index(logical_index: usize, offset: usize, count: usize) -> usize {
    (logical_index + offset) % count
}

/// An order-preserving container with a movable "current" offset.
///
/// Rotation (`next`/`previous`) only moves the offset, never the elements,
/// so it stays O(1) no matter how often the scheduler rotates. Logical index
/// 0 is the current element.
pub struct RotatingPool<T> {
    items: Vec<T>,
    offset: usize,
}

#[allow(dead_code)]
impl<T> RotatingPool<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            offset: 0,
        }
    }

    pub fn from_items(items: Vec<T>) -> Self {
        Self { items, offset: 0 }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn get(&self, logical_index: usize) -> Option<&T> {
        if logical_index >= self.items.len() {
            return None;
        }
        Some(&self.items[physical_index(logical_index, self.offset, self.items.len())])
    }

    pub fn get_mut(&mut self, logical_index: usize) -> Option<&mut T> {
        if logical_index >= self.items.len() {
            return None;
        }
        let index = physical_index(logical_index, self.offset, self.items.len());
        Some(&mut self.items[index])
    }

    pub fn current(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn current_mut(&mut self) -> Option<&mut T> {
        self.get_mut(0)
    }

    pub fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.offset = (self.offset + 1) % self.items.len();
        log::trace!("{} advanced offset to {}", LOG_TAG_POOL, self.offset);
    }

    pub fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.offset = (self.offset + self.items.len() - 1) % self.items.len();
        log::trace!("{} retreated offset to {}", LOG_TAG_POOL, self.offset);
    }

    /// Inserts so that the element lands at `logical_index` of the current
    /// rotated view, preserving the relative order of existing elements.
    pub fn insert(&mut self, logical_index: usize, item: T) {
        let position = physical_index(logical_index, self.offset, self.items.len() + 1);
        self.items.insert(position, item);
    }

    /// Appends to the end of the logical view.
    pub fn push(&mut self, item: T) {
        let len = self.items.len();
        self.insert(len, item);
    }

    pub fn remove_at(&mut self, logical_index: usize) -> Option<T> {
        if logical_index >= self.items.len() {
            return None;
        }
        let position = physical_index(logical_index, self.offset, self.items.len());
        let removed = self.items.remove(position);
        self.clamp_offset_after_removal();
        Some(removed)
    }

    /// Removes the first element (in logical order) matching the predicate.
    pub fn remove_first<F>(&mut self, predicate: F) -> Option<T>
    where
        F: Fn(&T) -> bool,
    {
        let logical_index = self.iter().position(predicate)?;
        self.remove_at(logical_index)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.offset = 0;
    }

    /// Iterates the logical (rotated) view, starting at the current element.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        (0..self.items.len()).map(move |logical_index| {
            &self.items[physical_index(logical_index, self.offset, self.items.len())]
        })
    }

    fn clamp_offset_after_removal(&mut self) {
        if self.items.is_empty() {
            self.offset = 0;
        } else if self.offset >= self.items.len() {
            self.offset %= self.items.len();
        }
    }
}

impl<T> Default for RotatingPool<T> {
    fn default() -> Self {
        Self::new()
    }
}
