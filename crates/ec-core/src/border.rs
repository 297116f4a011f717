/// Out-of-range index policy for neighbourhood operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Border {
    /// Repeat the first/last element (`aaa|abc|ccc`).
    #[default]
    Replicate,
    /// Mirror around the edge element without repeating it (`cb|abc|ba`).
    Mirror,
}

impl Border {
    /// Maps a possibly out-of-range index onto `0..len`.
    ///
    /// Returns `None` only for an empty axis.
    pub fn resolve(self, i: isize, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        if (0..len as isize).contains(&i) {
            return Some(i as usize);
        }

        match self {
            Self::Replicate => Some(if i < 0 { 0 } else { len - 1 }),
            Self::Mirror => {
                if len == 1 {
                    return Some(0);
                }
                let period = (2 * len - 2) as isize;
                let r = i.rem_euclid(period) as usize;
                Some(if r < len { r } else { period as usize - r })
            }
        }
    }
}
