use crate::{rvec, Order, RVec};

/// Element strides, one per axis.
///
/// Strides of a [`Shape`](crate::Shape) are always derived from its dimensions and
/// [`Order`], they are signed so that view strides (negative step) fit the same type.
#[derive(Clone, PartialEq, Eq, Default, Hash)]
pub struct Strides(RVec<isize>);

impl Strides {
    /// Canonical strides for `dims` laid out in `order`.
    pub fn new(dims: &[usize], order: Order) -> Self {
        let rank = dims.len();
        let mut strides = rvec![0; rank];
        if rank == 0 {
            return Self(strides);
        }
        match order {
            Order::RowMajor => {
                strides[rank - 1] = 1;
                for i in (0..rank - 1).rev() {
                    strides[i] = strides[i + 1] * dims[i + 1] as isize;
                }
            }
            Order::ColumnMajor => {
                strides[0] = 1;
                for i in 1..rank {
                    strides[i] = strides[i - 1] * dims[i - 1] as isize;
                }
            }
        }
        Self(strides)
    }

    pub fn zeros(rank: usize) -> Self {
        Self(rvec![0; rank])
    }

    pub fn inner(&self) -> &RVec<isize> {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<isize> {
        self.0.to_vec()
    }

    pub fn iter(&self) -> impl Iterator<Item = &isize> {
        self.0.iter()
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Dot product of `indices` with the strides.
    ///
    /// Only the leading `indices.len()` strides take part, which gives the offset of a
    /// prefix of coordinates.
    #[inline]
    pub fn offset(&self, indices: &[usize]) -> isize {
        indices
            .iter()
            .zip(self.0.iter())
            .map(|(&index, &stride)| index as isize * stride)
            .sum()
    }

    /// True if these strides address `dims` without gaps in `order`.
    ///
    /// Size-1 axes are skipped, their stride never moves. A shape with a zero-length axis
    /// holds no elements and is contiguous.
    pub fn is_contiguous(&self, dims: &[usize], order: Order) -> bool {
        if dims.len() != self.0.len() {
            return false;
        }
        if dims.iter().any(|&d| d == 0) {
            return true;
        }
        let mut expected = 1;
        let mut check = |axis: usize| {
            let dim = dims[axis];
            if dim == 1 {
                return true;
            }
            let ok = self.0[axis] == expected;
            expected *= dim as isize;
            ok
        };
        match order {
            Order::RowMajor => (0..dims.len()).rev().all(&mut check),
            Order::ColumnMajor => (0..dims.len()).all(&mut check),
        }
    }
}

impl std::fmt::Debug for Strides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut strides = format!("[{}", self.0.first().unwrap_or(&0));
        for stride in self.0.iter().skip(1) {
            strides.push_str(&format!("x{}", stride));
        }
        write!(f, "{}]", strides)
    }
}

impl std::ops::Index<usize> for Strides {
    type Output = isize;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl From<RVec<isize>> for Strides {
    fn from(strides: RVec<isize>) -> Self {
        Self(strides)
    }
}
