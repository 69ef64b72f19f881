//! Double-buffered cell storage with a permanently dead one-cell border.
//!
//! Both buffers are `(gridsize + 2)^2` cells in row-major order. Which buffer
//! plays which role is a pure function of the generation index, so every
//! worker derives the same view from its own loop counter instead of reading
//! a shared, externally swapped pointer.
//!
//! Cells are `AtomicU8` so the grid can be shared by reference between
//! workers. Within a generation each worker writes only its own rows of the
//! `Current` buffer and reads only the `Previous` buffer; the barriers between
//! generations order those accesses, so relaxed loads and stores suffice.

use std::sync::atomic::{AtomicU8, Ordering};

pub const DEAD: u8 = 0;
pub const ALIVE: u8 = 1;

/// Role a buffer plays in the generation being computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferRole {
    /// Read-only source of the generation being computed.
    Previous,
    /// Write target of the generation being computed.
    Current,
}

/// Which of the two slots holds the `Current` generation.
///
/// Generation `g` is written into slot `g % 2`; the seed lives in slot 0 as
/// generation 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parity(usize);

impl Parity {
    #[inline]
    pub const fn of_generation(generation: u64) -> Self {
        Self((generation & 1) as usize)
    }

    #[inline]
    pub const fn slot(self, role: BufferRole) -> usize {
        match role {
            BufferRole::Current => self.0,
            BufferRole::Previous => 1 - self.0,
        }
    }
}

pub struct Grid {
    size: usize,
    stride: usize,
    buffers: [Box<[AtomicU8]>; 2],
    generation: u64,
}

impl Grid {
    /// Allocate both buffers, every cell dead.
    pub fn new(size: usize) -> Self {
        let stride = size + 2;
        let cells = stride * stride;
        let alloc = || (0..cells).map(|_| AtomicU8::new(DEAD)).collect::<Box<[_]>>();
        Self {
            size,
            stride,
            buffers: [alloc(), alloc()],
            generation: 0,
        }
    }

    /// Interior side length.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Generation currently held by the `Current` buffer.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn parity(&self) -> Parity {
        Parity::of_generation(self.generation)
    }

    /// View of the grid with an explicit parity, as handed to workers.
    #[inline]
    pub fn view(&self, parity: Parity) -> GridView<'_> {
        GridView { grid: self, parity }
    }

    #[inline]
    pub fn get(&self, role: BufferRole, row: usize, col: usize) -> u8 {
        self.view(self.parity()).get(role, row, col)
    }

    #[inline]
    pub fn set(&self, role: BufferRole, row: usize, col: usize, state: u8) {
        self.view(self.parity()).set(role, row, col, state);
    }

    /// Make `Current` the new `Previous` and vice versa.
    pub fn swap_roles(&mut self) {
        self.advance_roles(1);
    }

    /// Record that `generations` more generations have been written.
    pub fn advance_roles(&mut self, generations: u64) {
        self.generation += generations;
    }

    /// Live interior cells of the `Current` buffer.
    pub fn population(&self) -> u64 {
        let view = self.view(self.parity());
        (1..=self.size)
            .map(|row| view.row_population(BufferRole::Current, row))
            .sum()
    }

    /// Interior of the `Current` buffer as a dense row-major `size * size` copy.
    pub fn snapshot(&self) -> Vec<u8> {
        let view = self.view(self.parity());
        let mut out = Vec::with_capacity(self.size * self.size);
        for row in 1..=self.size {
            for col in 1..=self.size {
                out.push(view.get(BufferRole::Current, row, col));
            }
        }
        out
    }

    /// True when every border cell of both buffers is dead.
    pub fn border_is_dead(&self) -> bool {
        let last = self.size + 1;
        self.buffers.iter().all(|buf| {
            (0..=last).all(|i| {
                [(0, i), (last, i), (i, 0), (i, last)]
                    .into_iter()
                    .all(|(r, c)| buf[r * self.stride + c].load(Ordering::Relaxed) == DEAD)
            })
        })
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.stride && col < self.stride,
            "cell ({row},{col}) outside a {0}x{0} buffer",
            self.stride
        );
        row * self.stride + col
    }
}

/// A grid seen through a fixed parity.
#[derive(Clone, Copy)]
pub struct GridView<'a> {
    grid: &'a Grid,
    parity: Parity,
}

impl GridView<'_> {
    #[inline]
    pub fn get(&self, role: BufferRole, row: usize, col: usize) -> u8 {
        let idx = self.grid.index(row, col);
        self.grid.buffers[self.parity.slot(role)][idx].load(Ordering::Relaxed)
    }

    /// Write an interior cell. Border cells are never written and states
    /// other than `DEAD`/`ALIVE` are rejected.
    #[inline]
    pub fn set(&self, role: BufferRole, row: usize, col: usize, state: u8) {
        let size = self.grid.size;
        assert!(
            (1..=size).contains(&row) && (1..=size).contains(&col),
            "cell ({row},{col}) is not an interior cell of a {size}x{size} grid"
        );
        assert!(state <= ALIVE, "cell state must be 0 or 1, got {state}");
        let idx = self.grid.index(row, col);
        self.grid.buffers[self.parity.slot(role)][idx].store(state, Ordering::Relaxed);
    }

    /// Sum of the eight neighbours of an interior cell in the given buffer.
    #[inline]
    pub fn neighbor_count(&self, role: BufferRole, row: usize, col: usize) -> u8 {
        let buf = &self.grid.buffers[self.parity.slot(role)];
        let stride = self.grid.stride;
        let center = self.grid.index(row, col);
        debug_assert!(row >= 1 && col >= 1 && row <= self.grid.size && col <= self.grid.size);
        let above = center - stride;
        let below = center + stride;
        [
            above - 1,
            above,
            above + 1,
            center - 1,
            center + 1,
            below - 1,
            below,
            below + 1,
        ]
        .into_iter()
        .map(|i| buf[i].load(Ordering::Relaxed))
        .sum()
    }

    fn row_population(&self, role: BufferRole, row: usize) -> u64 {
        (1..=self.grid.size)
            .map(|col| u64::from(self.get(role, row, col)))
            .sum()
    }
}
