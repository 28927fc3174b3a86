//! Tic-tac-toe board used by [`BoardArbitrator`](crate::arbitrator::BoardArbitrator).
//!
//! Cells are encoded as `0` (empty), `1` (`X`, first seat) and `2` (`O`, second seat), which is
//! also what player services receive in the `board` query parameter. A 3×3 board is won with
//! three in a row, a 5×5 board with four.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    /// Symbol of the player seated at `seat` (0 or 1).
    pub fn for_seat(seat: usize) -> Symbol {
        if seat % 2 == 0 {
            Symbol::X
        } else {
            Symbol::O
        }
    }

    pub fn cell_value(self) -> u8 {
        match self {
            Symbol::X => 1,
            Symbol::O => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Symbol::X => "X",
            Symbol::O => "O",
        }
    }

    fn index(self) -> usize {
        self.cell_value() as usize - 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("cell {0} is already taken")]
    Occupied(usize),
    #[error("cell {0} is outside the board")]
    OutOfBounds(usize),
}

#[derive(Debug, Clone)]
pub struct Board {
    size: usize,
    cells: Vec<u8>,
    // marks of each symbol, oldest first
    history: [VecDeque<usize>; 2],
}

impl Board {
    pub fn new(size: usize) -> Result<Board, ValidationError> {
        if size != 3 && size != 5 {
            return Err(ValidationError::BoardSize(size));
        }
        Ok(Board {
            size,
            cells: vec![0; size * size],
            history: [VecDeque::new(), VecDeque::new()],
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Marks in a row needed to win.
    pub fn line_length(&self) -> usize {
        if self.size == 3 {
            3
        } else {
            4
        }
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|&c| c != 0)
    }

    /// Places `symbol` on `cell`.
    ///
    /// With `max_marks` set, a symbol never holds more than that many cells: its oldest mark is
    /// lifted first and returned.
    pub fn place(
        &mut self,
        cell: usize,
        symbol: Symbol,
        max_marks: Option<usize>,
    ) -> Result<Option<usize>, BoardError> {
        if cell >= self.cells.len() {
            return Err(BoardError::OutOfBounds(cell));
        }
        if self.cells[cell] != 0 {
            return Err(BoardError::Occupied(cell));
        }

        let history = &mut self.history[symbol.index()];
        let removed = match max_marks {
            Some(max) if history.len() >= max => history.pop_front(),
            _ => None,
        };
        if let Some(old) = removed {
            self.cells[old] = 0;
        }

        self.cells[cell] = symbol.cell_value();
        history.push_back(cell);
        Ok(removed)
    }

    /// The cells of a completed line of `symbol`, if any.
    pub fn winning_line(&self, symbol: Symbol) -> Option<Vec<usize>> {
        let n = self.size as isize;
        let len = self.line_length() as isize;
        let value = symbol.cell_value();
        let directions = [(0, 1), (1, 0), (1, 1), (1, -1)];

        for row in 0..n {
            for col in 0..n {
                for (dr, dc) in directions {
                    let end_row = row + dr * (len - 1);
                    let end_col = col + dc * (len - 1);
                    if !(0..n).contains(&end_row) || !(0..n).contains(&end_col) {
                        continue;
                    }
                    let line: Vec<usize> = (0..len)
                        .map(|k| ((row + dr * k) * n + col + dc * k) as usize)
                        .collect();
                    if line.iter().all(|&i| self.cells[i] == value) {
                        return Some(line);
                    }
                }
            }
        }
        None
    }
}
