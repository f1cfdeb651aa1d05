//! Bounded trail of each player's last legal positions.

use spacegate_types::{PlayerId, Point};
use std::collections::{HashMap, VecDeque};

/// Fixed-capacity FIFO of positions; the oldest entry is evicted first.
#[derive(Debug, Clone)]
pub struct PositionHistory {
    capacity: usize,
    positions: VecDeque<Point>,
}

impl PositionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            positions: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, position: Point) {
        if self.capacity == 0 {
            return;
        }
        self.positions.push_back(position);
        while self.positions.len() > self.capacity {
            self.positions.pop_front();
        }
    }

    /// Most recently pushed position.
    pub fn latest(&self) -> Option<Point> {
        self.positions.back().copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Positions from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.positions.iter()
    }
}

/// Per-player position histories for one space.
#[derive(Debug, Clone)]
pub struct PositionHistoryStore {
    capacity: usize,
    histories: HashMap<PlayerId, PositionHistory>,
}

impl PositionHistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            histories: HashMap::new(),
        }
    }

    pub fn record(&mut self, player_id: &PlayerId, position: Point) {
        let capacity = self.capacity;
        self.histories
            .entry(player_id.clone())
            .or_insert_with(|| PositionHistory::new(capacity))
            .push(position);
    }

    pub fn latest(&self, player_id: &PlayerId) -> Option<Point> {
        self.histories.get(player_id).and_then(PositionHistory::latest)
    }

    pub fn get(&self, player_id: &PlayerId) -> Option<&PositionHistory> {
        self.histories.get(player_id)
    }

    pub fn forget(&mut self, player_id: &PlayerId) -> bool {
        self.histories.remove(player_id).is_some()
    }

    pub fn player_count(&self) -> usize {
        self.histories.len()
    }
}
