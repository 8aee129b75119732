/* # Handle recycling

Handles are small positive integers handed across an embedding boundary, so
they should stay small: freed slots are reused for the next insertion, and
trailing empty slots are compacted away so the backing storage does not grow
monotonically over long sessions.
*/

/// Registry of objects keyed by integer handles.
///
/// Handles start at 1, auto-increment, and are recycled once objects are
/// removed. Handle 0 is never issued, so it can serve as a sentinel on the
/// embedding side.
#[derive(Debug)]
pub struct HandleRegistry<T> {
    slots: Vec<Option<T>>,
    free: usize,
}

impl<T> HandleRegistry<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: 0,
        }
    }

    /// Inserts an element and returns its newly assigned handle.
    /// Reuses the lowest free slot if one exists.
    pub fn add(&mut self, element: T) -> u32 {
        if self.free > 0 {
            for (index, slot) in self.slots.iter_mut().enumerate() {
                if slot.is_none() {
                    *slot = Some(element);
                    self.free -= 1;
                    return index as u32 + 1;
                }
            }
        }
        self.slots.push(Some(element));
        self.slots.len() as u32
    }

    pub fn get(&self, handle: u32) -> Option<&T> {
        let index = handle.checked_sub(1)? as usize;
        self.slots.get(index)?.as_ref()
    }

    pub fn get_mut(&mut self, handle: u32) -> Option<&mut T> {
        let index = handle.checked_sub(1)? as usize;
        self.slots.get_mut(index)?.as_mut()
    }

    /// Removes and returns the element for a handle, freeing the slot for
    /// reuse. Trailing empty slots are dropped entirely.
    pub fn remove(&mut self, handle: u32) -> Option<T> {
        let index = handle.checked_sub(1)? as usize;
        let element = self.slots.get_mut(index)?.take()?;
        self.free += 1;
        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
            self.free -= 1;
        }
        Some(element)
    }

    /// Iterates over (handle, element) pairs of live entries.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|element| (index as u32 + 1, element)))
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for HandleRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
