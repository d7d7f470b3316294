/// Positions chosen by a query filter within one sorted run of entries.
///
/// A range selection walks `lo..hi` forwards, or backwards when reversed,
/// yielding at most `remaining` positions. A names selection yields explicit
/// positions in ascending order.
#[derive(Debug, Clone)]
pub enum Selection {
    Range {
        lo: usize,
        hi: usize,
        reversed: bool,
        remaining: usize,
    },
    Positions(std::vec::IntoIter<usize>),
}

impl Selection {
    pub fn empty() -> Self {
        Selection::Positions(Vec::new().into_iter())
    }
}

impl Iterator for Selection {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        match self {
            Selection::Range {
                lo,
                hi,
                reversed,
                remaining,
            } => {
                if *lo >= *hi || *remaining == 0 {
                    return None;
                }
                *remaining -= 1;
                if *reversed {
                    *hi -= 1;
                    Some(*hi)
                } else {
                    *lo += 1;
                    Some(*lo - 1)
                }
            }
            Selection::Positions(it) => it.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Selection::Range {
                lo, hi, remaining, ..
            } => {
                let n = hi.saturating_sub(*lo).min(*remaining);
                (n, Some(n))
            }
            Selection::Positions(it) => it.size_hint(),
        }
    }
}
