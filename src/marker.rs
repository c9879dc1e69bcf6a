use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Where an occurrence was found: the resource's name or one of its lines.
///
/// `Name` sorts before every line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Position {
    Name,
    Line(usize),
}

/// One located occurrence of the search word and its exclusion verdict.
///
/// Identity is `(position, start)`; `excluded` is bookkeeping that may be
/// recomputed in place when the exclusion set changes.
#[derive(Debug, Clone, Copy)]
pub struct Marker {
    pub position: Position,
    /// Byte offset where the occurrence begins.
    pub start: usize,
    pub excluded: bool,
}

impl Marker {
    pub fn new(position: Position, start: usize, excluded: bool) -> Self {
        Self {
            position,
            start,
            excluded,
        }
    }

    fn key(&self) -> (Position, usize) {
        (self.position, self.start)
    }
}

impl PartialEq for Marker {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Marker {}

impl Hash for Marker {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for Marker {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Marker {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identity_ignores_exclusion_flag() {
        let a = Marker::new(Position::Line(3), 7, false);
        let b = Marker::new(Position::Line(3), 7, true);
        assert_eq!(a, b);

        let set: HashSet<Marker> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_name_markers_sort_first() {
        let mut markers = vec![
            Marker::new(Position::Line(1), 0, false),
            Marker::new(Position::Line(0), 9, false),
            Marker::new(Position::Name, 4, false),
            Marker::new(Position::Line(0), 2, false),
        ];
        markers.sort();
        let keys: Vec<_> = markers.iter().map(|m| (m.position, m.start)).collect();
        assert_eq!(
            keys,
            vec![
                (Position::Name, 4),
                (Position::Line(0), 2),
                (Position::Line(0), 9),
                (Position::Line(1), 0),
            ]
        );
    }
}
