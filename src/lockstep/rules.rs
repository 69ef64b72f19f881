//! The B3/S23 transition, with the event each transition represents.

/// What happened to a cell across one generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellEvent {
    /// State unchanged, alive or dead.
    None,
    Birth,
    Death,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub next: u8,
    pub event: CellEvent,
}

/// Next state of a cell from its live-neighbour count (0..=8) and current state (0 or 1).
#[inline]
pub const fn transition(neighbors: u8, current: u8) -> Transition {
    debug_assert!(neighbors <= 8 && current <= 1);
    match neighbors {
        2 => Transition {
            next: current,
            event: CellEvent::None,
        },
        3 => Transition {
            next: 1,
            event: if current == 0 {
                CellEvent::Birth
            } else {
                CellEvent::None
            },
        },
        _ => Transition {
            next: 0,
            event: if current == 1 {
                CellEvent::Death
            } else {
                CellEvent::None
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{CellEvent, Transition, transition};

    fn expected(neighbors: u8, current: u8) -> Transition {
        let alive = current == 1;
        let next_alive = if alive {
            neighbors == 2 || neighbors == 3
        } else {
            neighbors == 3
        };
        let event = match (alive, next_alive) {
            (false, true) => CellEvent::Birth,
            (true, false) => CellEvent::Death,
            _ => CellEvent::None,
        };
        Transition {
            next: next_alive as u8,
            event,
        }
    }

    #[test]
    fn transition_matches_reference_for_every_input() {
        for neighbors in 0u8..=8 {
            for current in 0u8..=1 {
                assert_eq!(
                    transition(neighbors, current),
                    expected(neighbors, current),
                    "neighbors {neighbors} current {current}"
                );
            }
        }
    }

    #[test]
    fn transition_matches_every_neighbourhood_pattern() {
        for pattern in 0u16..512 {
            let current = ((pattern >> 4) & 1) as u8;
            let neighbors = ((pattern & !(1 << 4)).count_ones()) as u8;
            assert_eq!(
                transition(neighbors, current),
                expected(neighbors, current),
                "pattern {pattern:03x}"
            );
        }
    }

    #[test]
    fn two_neighbours_preserve_state() {
        assert_eq!(transition(2, 0).next, 0);
        assert_eq!(transition(2, 1).next, 1);
        assert_eq!(transition(2, 0).event, CellEvent::None);
        assert_eq!(transition(2, 1).event, CellEvent::None);
    }

    #[test]
    fn three_neighbours_birth_only_dead_cells() {
        assert_eq!(transition(3, 0).event, CellEvent::Birth);
        assert_eq!(transition(3, 1).event, CellEvent::None);
        assert_eq!(transition(3, 1).next, 1);
    }

    #[test]
    fn other_counts_kill_live_cells() {
        for neighbors in [0u8, 1, 4, 5, 6, 7, 8] {
            assert_eq!(transition(neighbors, 1).event, CellEvent::Death);
            assert_eq!(transition(neighbors, 0).event, CellEvent::None);
            assert_eq!(transition(neighbors, 1).next, 0);
        }
    }
}
