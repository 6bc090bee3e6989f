//! Array-backed binary min-heap used to pick the two lightest nodes during tree construction.

use crate::error::HuffError;

#[derive(Debug, Clone)]
pub struct MinHeap<T> {
    elements: Vec<T>,
}

impl<T> MinHeap<T> {
    pub fn new() -> Self {
        MinHeap { elements: vec![] }
    }

    /// Pre-size the backing storage. The heap still grows past `capacity` if needed.
    pub fn with_capacity(capacity: usize) -> Self {
        MinHeap {
            elements: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn parent(i: usize) -> usize {
        (i - 1) / 2
    }

    fn left(i: usize) -> usize {
        2 * i + 1
    }

    fn right(i: usize) -> usize {
        2 * i + 2
    }
}

impl<T: Ord> MinHeap<T> {
    /// Append `value` and swim it up while it is smaller than its parent.
    pub fn insert(&mut self, value: T) {
        self.elements.push(value);
        self.swim(self.elements.len() - 1);
    }

    /// The smallest element, without removing it.
    pub fn peek_min(&self) -> Result<&T, HuffError> {
        self.elements.first().ok_or(HuffError::EmptyQueue)
    }

    /// Remove and return the smallest element.
    pub fn delete_min(&mut self) -> Result<T, HuffError> {
        if self.elements.is_empty() {
            return Err(HuffError::EmptyQueue);
        }
        let last = self.elements.len() - 1;
        self.elements.swap(0, last);
        let min = self.elements.pop().ok_or(HuffError::EmptyQueue)?;
        self.sink(0);
        Ok(min)
    }

    fn swim(&mut self, mut i: usize) {
        while i > 0 {
            let p = Self::parent(i);
            if self.elements[i] >= self.elements[p] {
                break;
            }
            self.elements.swap(i, p);
            i = p;
        }
    }

    fn sink(&mut self, mut i: usize) {
        let n = self.elements.len();
        loop {
            let l = Self::left(i);
            if l >= n {
                break;
            }
            // Smaller child; the left one wins a tie
            let r = Self::right(i);
            let child = if r < n && self.elements[r] < self.elements[l] {
                r
            } else {
                l
            };
            if self.elements[i] <= self.elements[child] {
                break;
            }
            self.elements.swap(i, child);
            i = child;
        }
    }

    #[cfg(test)]
    fn valid_min_heap(&self) -> bool {
        (1..self.elements.len()).all(|i| self.elements[Self::parent(i)] <= self.elements[i])
    }
}

impl<T> Default for MinHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}
