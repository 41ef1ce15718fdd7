use rand::Rng;

/// A single numbered cell on the board
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub value: usize,
    pub matched: bool,
}

/// Square board of `size * size` cells holding a permutation of `1..=size²`,
/// stored row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Vec<Cell>,
}

/// Unbiased in-place Fisher-Yates shuffle.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

impl Grid {
    pub fn generate<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Self {
        let mut values: Vec<usize> = (1..=size * size).collect();
        shuffle(&mut values, rng);

        Self::from_values(size, values)
    }

    /// Build a grid from an explicit layout. Used for fixed boards in tests
    /// and for the idle preview.
    pub fn from_values(size: usize, values: Vec<usize>) -> Self {
        debug_assert_eq!(values.len(), size * size);
        Self {
            size,
            cells: values
                .into_iter()
                .map(|value| Cell {
                    value,
                    matched: false,
                })
                .collect(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn total(&self) -> usize {
        self.size * self.size
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.size.max(1))
    }

    /// Row-major index of the cell labelled `value`
    pub fn position_of(&self, value: usize) -> Option<usize> {
        self.cells.iter().position(|c| c.value == value)
    }

    /// Flags the cell labelled `value` as matched. Returns false when no such
    /// cell exists.
    pub fn mark_matched(&mut self, value: usize) -> bool {
        match self.cells.iter_mut().find(|c| c.value == value) {
            Some(cell) => {
                cell.matched = true;
                true
            }
            None => false,
        }
    }

    pub fn matched_count(&self) -> usize {
        self.cells.iter().filter(|c| c.matched).count()
    }
}
