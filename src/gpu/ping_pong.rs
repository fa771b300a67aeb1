//! Two-slot front/back ownership for iterative compute

/// Owns two values and an index saying which one is the front.
///
/// Swapping flips the index; the values themselves never move.
#[derive(Debug)]
pub struct PingPong<T> {
    slots: [T; 2],
    front: usize,
}

impl<T> PingPong<T> {
    pub fn new(front: T, back: T) -> Self {
        Self {
            slots: [front, back],
            front: 0,
        }
    }

    /// Index (0 or 1) of the slot currently read from
    pub fn front_index(&self) -> usize {
        self.front
    }

    pub fn front(&self) -> &T {
        &self.slots[self.front]
    }

    pub fn back(&self) -> &T {
        &self.slots[1 - self.front]
    }

    pub fn swap(&mut self) {
        self.front = 1 - self.front;
    }
}
