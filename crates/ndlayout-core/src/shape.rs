use crate::{rvec, shape, BroadcastInfo, Order, RVec, Slice, SliceError, Strides};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("Subshape requires at least one index.")]
    InvalidIndexArity,
    #[error("Too many indices, {given} given for rank {rank}.")]
    TooManyIndices { given: usize, rank: usize },
    #[error("Rank mismatch, expected {expected} indices, got {actual}.")]
    RankMismatch { expected: usize, actual: usize },
    #[error("Index {index} out of range for axis {axis} of size {size}.")]
    IndexOutOfRange {
        index: isize,
        axis: usize,
        size: usize,
    },
    #[error("Offset {offset} out of range for shape of size {size}.")]
    OffsetOutOfRange { offset: usize, size: usize },
    #[error("Cannot reshape {from} elements into {to} elements.")]
    SizeMismatch { from: usize, to: usize },
    #[error("Only one dimension can be inferred.")]
    MultipleInferredDims,
    #[error("Cannot infer dimension, {size} is not divisible by {known}.")]
    NonIntegralInference { size: usize, known: usize },
    #[error("Invalid dimension {0}.")]
    InvalidDimension(isize),
    #[error("Too many slices, {given} given for rank {rank}.")]
    TooManySlices { given: usize, rank: usize },
    #[error("Axis {axis} out of range for rank {rank}.")]
    AxisOutOfRange { axis: isize, rank: usize },
    #[error("Shape {from} cannot be broadcast to {to}.")]
    BroadcastMismatch { from: Shape, to: Shape },
    #[error(transparent)]
    Slice(#[from] SliceError),
}

/// # Shape
///
/// Geometry of an array: dimensions, the strides derived from them and the memory
/// [`Order`] they were derived for.
///
/// Shapes are values. Operations that change the geometry (`reshape`,
/// `change_tensor_layout`, `slice`, ...) return a new shape with every derived field
/// recomputed.
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "ShapeRepr", into = "ShapeRepr")
)]
#[derive(Clone)]
pub struct Shape {
    dims: RVec<usize>,
    strides: Strides,
    order: Order,
    size: usize,
    hash: u64,
}

/// Zero is reserved for [`Shape::empty`].
const EMPTY_HASH: u64 = 0;

fn structural_hash(dims: &[usize], order: Order) -> (usize, u64) {
    let mut size = 1usize;
    let mut hash = (order.as_char() as u64).wrapping_mul(397);
    for &dim in dims {
        size *= dim;
        hash ^= (size as u64)
            .wrapping_mul(397)
            .wrapping_mul((dim as u64).wrapping_mul(397));
    }
    if hash == EMPTY_HASH {
        hash = 1;
    }
    (size, hash)
}

impl Shape {
    pub fn new(dims: RVec<usize>) -> Self {
        Self::with_order(dims, Order::RowMajor)
    }

    pub fn with_order(dims: RVec<usize>, order: Order) -> Self {
        let strides = Strides::new(&dims, order);
        let (size, hash) = structural_hash(&dims, order);
        Self {
            dims,
            strides,
            order,
            size,
            hash,
        }
    }

    pub fn from_dims(dims: &[usize]) -> Self {
        Self::new(dims.into())
    }

    /// Rank 0, one element.
    pub fn scalar() -> Self {
        shape![]
    }

    /// Placeholder of `rank` zeroed axes, to be filled in later.
    ///
    /// Distinct from a shape with a zero-length axis: it has no strides and no size yet.
    pub fn empty(rank: usize) -> Self {
        Self {
            dims: rvec![0; rank],
            strides: Strides::zeros(rank),
            order: Order::RowMajor,
            size: 0,
            hash: EMPTY_HASH,
        }
    }

    pub fn vector(len: usize) -> Self {
        shape![len]
    }

    pub fn matrix(rows: usize, cols: usize) -> Self {
        shape![rows, cols]
    }

    pub fn inner(&self) -> &RVec<usize> {
        &self.dims
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn strides(&self) -> &Strides {
        &self.strides
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn get(&self, axis: usize) -> Option<&usize> {
        self.dims.get(axis)
    }

    /// Extent of `axis`, negative axes count from the end.
    pub fn dim(&self, axis: isize) -> Option<usize> {
        let axis = self.normalize_axis(axis, self.rank()).ok()?;
        self.dims.get(axis).copied()
    }

    pub fn numel(&self) -> usize {
        self.size
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.dims.to_vec()
    }

    pub fn iter(&self) -> impl Iterator<Item = &usize> {
        self.dims.iter()
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn ndim(&self) -> usize {
        self.rank()
    }

    pub fn is_scalar(&self) -> bool {
        self.size == 1 && self.rank() == 0 && !self.is_empty()
    }

    /// True only for placeholders built by [`Shape::empty`].
    pub fn is_empty(&self) -> bool {
        self.hash == EMPTY_HASH
    }

    pub fn is_contiguous(&self) -> bool {
        self.strides.is_contiguous(&self.dims, self.order)
    }

    /// Flat offset of `indices`, the dot product with the strides.
    ///
    /// Coordinates are not validated. A rank 0 shape addressed with a single index
    /// returns that index, which is flat access into a scalar buffer.
    #[inline]
    pub fn offset_unchecked(&self, indices: &[usize]) -> usize {
        if self.rank() == 0 && indices.len() == 1 {
            return indices[0];
        }
        self.strides.offset(indices) as usize
    }

    /// Flat offset of `indices`, validated against every dimension.
    pub fn offset(&self, indices: &[usize]) -> Result<usize, ShapeError> {
        if self.rank() == 0 && indices.len() <= 1 {
            let index = indices.first().copied().unwrap_or(0);
            if index >= self.size {
                return Err(ShapeError::IndexOutOfRange {
                    index: index as isize,
                    axis: 0,
                    size: self.size,
                });
            }
            return Ok(index);
        }
        self.check_coords(indices)?;
        Ok(self.offset_unchecked(indices))
    }

    pub(crate) fn check_coords(&self, indices: &[usize]) -> Result<(), ShapeError> {
        if indices.len() != self.rank() {
            return Err(ShapeError::RankMismatch {
                expected: self.rank(),
                actual: indices.len(),
            });
        }
        for (axis, (&index, &size)) in indices.iter().zip(self.dims.iter()).enumerate() {
            if index >= size {
                return Err(ShapeError::IndexOutOfRange {
                    index: index as isize,
                    axis,
                    size,
                });
            }
        }
        Ok(())
    }

    /// Coordinates of a flat `offset`, the inverse of [`Shape::offset_unchecked`].
    ///
    /// Axes are peeled off from the largest stride down, which depends on the order.
    pub fn coords(&self, offset: usize) -> RVec<usize> {
        let rank = self.rank();
        if rank == 1 {
            return rvec![offset];
        }
        let mut coords = rvec![0; rank];
        let mut remaining = offset;
        let mut peel = |axis: usize| {
            let stride = self.strides[axis] as usize;
            if stride == 0 {
                return;
            }
            coords[axis] = remaining / stride;
            remaining -= coords[axis] * stride;
        };
        match self.order {
            Order::RowMajor => (0..rank).for_each(&mut peel),
            Order::ColumnMajor => (0..rank).rev().for_each(&mut peel),
        }
        coords
    }

    pub fn coords_checked(&self, offset: usize) -> Result<RVec<usize>, ShapeError> {
        if offset >= self.size {
            return Err(ShapeError::OffsetOutOfRange {
                offset,
                size: self.size,
            });
        }
        Ok(self.coords(offset))
    }

    /// Apply a prefix of `indices`.
    ///
    /// Returns the shape of the remaining trailing axes and the offset contributed by
    /// the prefix. Indexing every axis yields the scalar shape and the element offset.
    pub fn get_subshape(&self, indices: &[usize]) -> Result<(Shape, usize), ShapeError> {
        if indices.is_empty() {
            return Err(ShapeError::InvalidIndexArity);
        }
        if indices.len() > self.rank() {
            return Err(ShapeError::TooManyIndices {
                given: indices.len(),
                rank: self.rank(),
            });
        }
        let offset = self.strides.offset(indices) as usize;
        if indices.len() == self.rank() {
            return Ok((Shape::scalar(), offset));
        }
        let inner = Shape::with_order(self.dims[indices.len()..].into(), self.order);
        Ok((inner, offset))
    }

    /// Same dimensions laid out in `order`.
    pub fn change_tensor_layout(&self, order: Order) -> Shape {
        Shape::with_order(self.dims.clone(), order)
    }

    /// Reshape to `dims`, one of which may be `-1` to infer it from the size.
    ///
    /// The element count must be preserved. The order is kept.
    pub fn reshape(&self, dims: &[isize]) -> Result<Shape, ShapeError> {
        let mut inferred = None;
        let mut known = 1usize;
        for (axis, &dim) in dims.iter().enumerate() {
            match dim {
                -1 if inferred.is_some() => return Err(ShapeError::MultipleInferredDims),
                -1 => inferred = Some(axis),
                d if d < 0 => return Err(ShapeError::InvalidDimension(d)),
                d => known *= d as usize,
            }
        }

        let mut resolved = dims.iter().map(|&d| d.max(0) as usize).collect::<RVec<_>>();
        if let Some(axis) = inferred {
            if known == 0 || self.size % known != 0 {
                return Err(ShapeError::NonIntegralInference {
                    size: self.size,
                    known,
                });
            }
            resolved[axis] = self.size / known;
            log::trace!("Inferred axis {} of {:?} as {}", axis, dims, resolved[axis]);
        }

        let reshaped = Shape::with_order(resolved, self.order);
        if reshaped.size != self.size {
            return Err(ShapeError::SizeMismatch {
                from: self.size,
                to: reshaped.size,
            });
        }
        Ok(reshaped)
    }

    /// Reshape without validating the element count.
    pub fn reshape_unchecked(&self, dims: RVec<usize>) -> Shape {
        let reshaped = Shape::with_order(dims, self.order);
        if reshaped.size != self.size {
            log::warn!(
                "Unchecked reshape of {} into {} changes the size from {} to {}",
                self,
                reshaped,
                self.size,
                reshaped.size
            );
        }
        reshaped
    }

    /// Resize each axis by its slice. With `reduce`, axes picked by an index slice are
    /// dropped, otherwise they stay as size 1 axes.
    ///
    /// Missing trailing slices select the whole axis.
    pub fn slice(&self, slices: &[Slice], reduce: bool) -> Result<Shape, ShapeError> {
        if slices.len() > self.rank() {
            return Err(ShapeError::TooManySlices {
                given: slices.len(),
                rank: self.rank(),
            });
        }
        let mut dims = RVec::with_capacity(self.rank());
        for (axis, &dim) in self.dims.iter().enumerate() {
            match slices.get(axis) {
                Some(slice) if slice.is_index() && reduce => continue,
                Some(slice) => dims.push(slice.get_size(dim)),
                None => dims.push(dim),
            }
        }
        Ok(Shape::with_order(dims, self.order))
    }

    pub fn slice_notation(&self, notation: &str, reduce: bool) -> Result<Shape, ShapeError> {
        let slices = Slice::parse_slices(notation)?;
        self.slice(&slices, reduce)
    }

    /// Insert a size 1 axis at `axis`, `-1` appends.
    pub fn expand_dims(&self, axis: isize) -> Result<Shape, ShapeError> {
        let axis = self.normalize_axis(axis, self.rank() + 1)?;
        let mut dims = self.dims.clone();
        dims.insert(axis, 1);
        Ok(Shape::with_order(dims, self.order))
    }

    /// The shape without `axis`.
    pub fn remove_axis(&self, axis: isize) -> Result<Shape, ShapeError> {
        if self.rank() == 0 {
            return Ok(Shape::scalar());
        }
        let axis = self.normalize_axis(axis, self.rank())?;
        let mut dims = self.dims.clone();
        dims.remove(axis);
        Ok(Shape::with_order(dims, self.order))
    }

    /// Translate negative coordinates, `-1` is the last element of its axis.
    pub fn infer_negative_coordinates(&self, coords: &[isize]) -> Result<RVec<usize>, ShapeError> {
        if coords.len() > self.rank() {
            return Err(ShapeError::TooManyIndices {
                given: coords.len(),
                rank: self.rank(),
            });
        }
        coords
            .iter()
            .zip(self.dims.iter())
            .enumerate()
            .map(|(axis, (&coord, &size))| {
                let resolved = if coord < 0 {
                    coord + size as isize
                } else {
                    coord
                };
                if resolved < 0 {
                    return Err(ShapeError::IndexOutOfRange {
                        index: coord,
                        axis,
                        size,
                    });
                }
                Ok(resolved as usize)
            })
            .collect()
    }

    /// Compare by element count only, geometry is ignored.
    pub fn cmp_size(&self, other: &Shape) -> Ordering {
        self.size.cmp(&other.size)
    }

    pub fn broadcast_to(&self, target: &Shape) -> Result<BroadcastInfo, ShapeError> {
        BroadcastInfo::new(self, target)
    }

    pub fn multi_broadcast(shapes: &[&Shape]) -> Option<Shape> {
        let max_rank = shapes.iter().map(|shape| shape.rank()).max()?;
        let mut dims: RVec<usize> = rvec![];
        for i in 0..max_rank {
            let mut current_dim_size = 1;
            for shape in shapes {
                let len = shape.rank();
                let dim = if i < len { &shape[len - i - 1] } else { &1 };
                if dim != &1 {
                    if current_dim_size != 1 && dim != &current_dim_size {
                        return None;
                    }
                    current_dim_size = *dim;
                }
            }
            dims.insert(0, current_dim_size)
        }
        Some(Shape::new(dims))
    }

    fn normalize_axis(&self, axis: isize, bound: usize) -> Result<usize, ShapeError> {
        let resolved = if axis < 0 {
            axis + bound as isize
        } else {
            axis
        };
        if resolved < 0 || resolved as usize >= bound {
            return Err(ShapeError::AxisOutOfRange {
                axis,
                rank: self.rank(),
            });
        }
        Ok(resolved as usize)
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        if self.is_empty() || other.is_empty() {
            return self.is_empty() && other.is_empty();
        }
        self.hash == other.hash && self.order == other.order && self.dims == other.dims
    }
}

impl Eq for Shape {}

impl Hash for Shape {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl Default for Shape {
    fn default() -> Self {
        Shape::scalar()
    }
}

impl std::fmt::Debug for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut shape = String::from("[");
        if let Some(first) = self.dims.first() {
            shape.push_str(&first.to_string());
        }
        for dim in self.dims.iter().skip(1) {
            shape.push_str(&format!("x{}", dim));
        }
        if self.order == Order::ColumnMajor {
            shape.push_str(";F");
        }
        write!(f, "{}]", shape)
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dims = self
            .dims
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "({})", dims)
    }
}

impl std::ops::Index<usize> for Shape {
    type Output = usize;

    fn index(&self, index: usize) -> &Self::Output {
        &self.dims[index]
    }
}

impl std::ops::Index<std::ops::RangeTo<usize>> for Shape {
    type Output = [usize];

    fn index(&self, index: std::ops::RangeTo<usize>) -> &Self::Output {
        &self.dims[index]
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct ShapeRepr {
    dims: RVec<usize>,
    #[serde(default)]
    order: Order,
}

#[cfg(feature = "serde")]
impl From<ShapeRepr> for Shape {
    fn from(repr: ShapeRepr) -> Self {
        Shape::with_order(repr.dims, repr.order)
    }
}

#[cfg(feature = "serde")]
impl From<Shape> for ShapeRepr {
    fn from(shape: Shape) -> Self {
        ShapeRepr {
            dims: shape.dims,
            order: shape.order,
        }
    }
}

macro_rules! impl_try_from_shape {
    ($($N:expr),*) => {
        $(
            impl TryFrom<&Shape> for [usize; $N] {
                type Error = ShapeError;

                fn try_from(shape: &Shape) -> Result<Self, Self::Error> {
                    if shape.rank() == $N {
                        let mut arr = [0; $N];
                        for (i, &item) in shape.dims.iter().enumerate().take($N) {
                            arr[i] = item;
                        }
                        Ok(arr)
                    } else {
                        Err(ShapeError::RankMismatch { expected: $N, actual: shape.rank() })
                    }
                }
            }
        )*
    };
}

impl_try_from_shape!(0, 1, 2, 3, 4);

#[cfg(test)]
mod tests {
    use crate::{rvec, shape, slices, Order, Shape, ShapeError, Slice};
    use proptest::prelude::*;
    use proptest::strategy::{BoxedStrategy, Just, Strategy};
    use std::cmp::Ordering;
    use std::collections::HashSet;
    use std::ops::RangeInclusive;
    use test_strategy::proptest;

    impl Arbitrary for Shape {
        type Parameters = Vec<RangeInclusive<usize>>;
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with(args: Self::Parameters) -> Self::Strategy {
            args.prop_map(move |dims| Shape::from_dims(&dims)).boxed()
        }
    }

    #[derive(Debug)]
    struct CoordProblem {
        shape: Shape,
        coords: Vec<usize>,
    }

    impl Arbitrary for CoordProblem {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with(_args: ()) -> Self::Strategy {
            (1usize..=4, any::<bool>())
                .prop_flat_map(|(rank, column_major)| {
                    Shape::arbitrary_with(vec![1..=6; rank]).prop_map(move |s| {
                        if column_major {
                            s.change_tensor_layout(Order::ColumnMajor)
                        } else {
                            s
                        }
                    })
                })
                .prop_flat_map(|shape| {
                    let coords = shape.iter().map(|&d| 0..d).collect::<Vec<_>>();
                    (Just(shape), coords)
                })
                .prop_map(|(shape, coords)| CoordProblem { shape, coords })
                .boxed()
        }
    }

    #[proptest(cases = 256)]
    fn test_coords_round_trip(prob: CoordProblem) {
        let CoordProblem { shape, coords } = prob;
        let offset = shape.offset_unchecked(&coords);
        prop_assert!(offset < shape.size());
        prop_assert_eq!(shape.coords(offset).to_vec(), coords.clone());
        prop_assert_eq!(shape.offset(&coords).unwrap(), offset);
    }

    #[proptest]
    fn test_size_law(#[strategy(Shape::arbitrary_with(vec![0..=5, 0..=5, 0..=5]))] shape: Shape) {
        prop_assert_eq!(shape.size(), shape.iter().product::<usize>());
        prop_assert!(shape.is_contiguous());
    }

    #[proptest]
    fn test_row_major_stride_law(
        #[strategy(Shape::arbitrary_with(vec![1..=5, 1..=5, 1..=5, 1..=5]))] shape: Shape,
    ) {
        let strides = shape.strides();
        let rank = shape.rank();
        prop_assert_eq!(strides[rank - 1], 1);
        for i in 0..rank - 1 {
            prop_assert_eq!(strides[i], strides[i + 1] * shape[i + 1] as isize);
        }
    }

    #[proptest]
    fn test_layout_round_trip(
        #[strategy(Shape::arbitrary_with(vec![1..=5, 1..=5, 1..=5]))] shape: Shape,
    ) {
        let column_major = shape.change_tensor_layout(Order::ColumnMajor);
        prop_assert_eq!(column_major.dims(), shape.dims());
        prop_assert_eq!(column_major.size(), shape.size());
        let back = column_major.change_tensor_layout(Order::RowMajor);
        prop_assert_eq!(back.strides(), shape.strides());
        prop_assert_eq!(back, shape);
    }

    #[test]
    fn test_scalar() {
        let scalar = Shape::scalar();
        assert!(scalar.is_scalar());
        assert!(!scalar.is_empty());
        assert_eq!(scalar.size(), 1);
        assert_eq!(scalar.rank(), 0);
        assert_eq!(Shape::from_dims(&[]), scalar);
        assert_eq!(scalar.offset_unchecked(&[7]), 7);
        assert_eq!(scalar.offset(&[]).unwrap(), 0);
        assert!(scalar.offset(&[1]).is_err());
        assert!(scalar.coords(0).is_empty());
    }

    #[test]
    fn test_empty_sentinel() {
        let empty = Shape::empty(3);
        assert!(empty.is_empty());
        assert!(!empty.is_scalar());
        assert_eq!(empty.rank(), 3);
        assert_eq!(empty.strides().to_vec(), vec![0, 0, 0]);
        assert_eq!(empty, Shape::empty(1));

        let zero_len = shape![0, 0, 0];
        assert!(!zero_len.is_empty());
        assert_eq!(zero_len.size(), 0);
        assert_ne!(empty, zero_len);
        assert!(!Shape::empty(0).is_scalar());
    }

    #[test]
    fn test_vector_and_matrix() {
        assert_eq!(Shape::vector(10), shape![10]);
        assert_eq!(Shape::vector(0).strides(), shape![0].strides());
        assert_eq!(Shape::matrix(5, 1), shape![5, 1]);
        assert_eq!(Shape::matrix(5, 0).strides(), shape![5, 0].strides());
    }

    #[test]
    fn test_offset() {
        let shape = shape![4, 3];
        assert_eq!(shape.offset_unchecked(&[2, 1]), 3 * 2 + 1);

        let shape = shape![4, 3, 2];
        let offset = shape.offset_unchecked(&[1, 2, 1]);
        assert_eq!(shape.coords(offset).to_vec(), vec![1, 2, 1]);
    }

    #[test]
    fn test_row_major_element() {
        // [[1, 2, 3], [4, 5, 6]]
        let data = [1, 2, 3, 4, 5, 6];
        let shape = shape![2, 3];
        let offset = shape.offset_unchecked(&[1, 1]);
        assert_eq!(offset, 4);
        assert_eq!(data[offset], 5);
    }

    #[test]
    fn test_column_major() {
        let shape = Shape::with_order(rvec![2, 3, 4], Order::ColumnMajor);
        assert_eq!(shape.strides().to_vec(), vec![1, 2, 6]);
        assert_eq!(shape.offset_unchecked(&[1, 2, 3]), 1 + 4 + 18);
        assert_eq!(shape.coords(23).to_vec(), vec![1, 2, 3]);
        assert_ne!(shape, shape![2, 3, 4]);
    }

    #[test]
    fn test_checked_offset() {
        let shape = shape![2, 3];
        assert_eq!(
            shape.offset(&[2, 0]),
            Err(ShapeError::IndexOutOfRange {
                index: 2,
                axis: 0,
                size: 2
            })
        );
        assert_eq!(
            shape.offset(&[1]),
            Err(ShapeError::RankMismatch {
                expected: 2,
                actual: 1
            })
        );
        // the unchecked path computes whatever the arithmetic gives
        assert_eq!(shape.offset_unchecked(&[2, 0]), 6);
        assert!(shape.coords_checked(6).is_err());
        assert_eq!(shape.coords_checked(5).unwrap().to_vec(), vec![1, 2]);
    }

    #[test]
    fn test_get_subshape() {
        let shape = shape![5, 5];
        assert_eq!(shape.get_subshape(&[]), Err(ShapeError::InvalidIndexArity));

        let (inner, offset) = shape.get_subshape(&[2]).unwrap();
        assert_eq!(inner, shape![5]);
        assert_eq!(offset, 10);

        let (inner, offset) = shape.get_subshape(&[2, 3]).unwrap();
        assert!(inner.is_scalar());
        assert_eq!(offset, 13);

        let shape = shape![5, 1, 5];
        let (inner, offset) = shape.get_subshape(&[4]).unwrap();
        assert_eq!(inner, shape![1, 5]);
        assert_eq!(offset, 20);

        assert!(matches!(
            shape.get_subshape(&[0, 0, 0, 0]),
            Err(ShapeError::TooManyIndices { given: 4, rank: 3 })
        ));
    }

    #[test]
    fn test_reshape() {
        let shape = shape![2, 3, 4];
        assert_eq!(shape.reshape(&[6, 4]).unwrap(), shape![6, 4]);
        assert_eq!(shape.reshape(&[-1, 4]).unwrap(), shape![6, 4]);
        assert_eq!(shape.reshape(&[2, -1]).unwrap(), shape![2, 12]);
        assert_eq!(
            shape.reshape(&[5, 5]),
            Err(ShapeError::SizeMismatch { from: 24, to: 25 })
        );
        assert_eq!(
            shape.reshape(&[-1, -1]),
            Err(ShapeError::MultipleInferredDims)
        );
        assert_eq!(
            shape.reshape(&[5, -1]),
            Err(ShapeError::NonIntegralInference { size: 24, known: 5 })
        );
        assert_eq!(shape.reshape(&[-2, 12]), Err(ShapeError::InvalidDimension(-2)));

        let column_major = shape.change_tensor_layout(Order::ColumnMajor);
        let reshaped = column_major.reshape(&[4, 6]).unwrap();
        assert_eq!(reshaped.order(), Order::ColumnMajor);
        assert_eq!(reshaped.strides().to_vec(), vec![1, 4]);
    }

    #[test]
    fn test_reshape_unchecked() {
        let _ = env_logger::builder().is_test(true).try_init();
        let shape = shape![2, 3];
        let reshaped = shape.reshape_unchecked(rvec![4, 4]);
        assert_eq!(reshaped.size(), 16);
        assert_eq!(reshaped.strides().to_vec(), vec![4, 1]);
        // the source is untouched
        assert_eq!(shape.size(), 6);
    }

    #[test]
    fn test_slice_with_reduction() {
        let shape = shape![3, 4];
        let slices = [Slice::index(1), Slice::all()];
        assert_eq!(shape.slice(&slices, true).unwrap(), shape![4]);
        assert_eq!(shape.slice(&slices, false).unwrap(), shape![1, 4]);
    }

    #[test]
    fn test_slice_notation() {
        let shape = shape![5, 7];
        let sliced = shape.slice(&slices!["1:5:2,::3"], true).unwrap();
        assert_eq!(sliced, shape![2, 3]);
        assert_eq!(shape.slice_notation("-1", true).unwrap(), shape![7]);
        assert_eq!(shape.slice_notation("::-1, 2", true).unwrap(), shape![5]);
        assert!(matches!(
            shape.slice_notation("1,2,3", true),
            Err(ShapeError::TooManySlices { given: 3, rank: 2 })
        ));
        assert!(matches!(
            shape.slice_notation("1:x", true),
            Err(ShapeError::Slice(_))
        ));
        // out of range requests are empty, not errors
        assert_eq!(shape.slice_notation("10:20", true).unwrap(), shape![0, 7]);
    }

    #[test]
    fn test_expand_and_remove() {
        let shape = shape![2, 3, 4];
        assert_eq!(shape.expand_dims(0).unwrap(), shape![1, 2, 3, 4]);
        assert_eq!(shape.expand_dims(-1).unwrap(), shape![2, 3, 4, 1]);
        assert_eq!(shape.expand_dims(1).unwrap(), shape![2, 1, 3, 4]);
        assert!(shape.expand_dims(5).is_err());
        assert_eq!(Shape::scalar().expand_dims(0).unwrap(), shape![1]);

        let shape = shape![2, 3, 4, 5];
        assert_eq!(shape.remove_axis(0).unwrap(), shape![3, 4, 5]);
        assert_eq!(shape.remove_axis(2).unwrap(), shape![2, 3, 5]);
        assert_eq!(shape.remove_axis(-1).unwrap(), shape![2, 3, 4]);
        assert_eq!(
            shape.remove_axis(4),
            Err(ShapeError::AxisOutOfRange { axis: 4, rank: 4 })
        );
    }

    #[test]
    fn test_negative_coordinates() {
        let shape = shape![9, 4];
        assert_eq!(
            shape.infer_negative_coordinates(&[-1, -2]).unwrap().to_vec(),
            vec![8, 2]
        );
        assert_eq!(
            shape.infer_negative_coordinates(&[3, 1]).unwrap().to_vec(),
            vec![3, 1]
        );
        assert!(shape.infer_negative_coordinates(&[-10, 0]).is_err());
        assert_eq!(shape.dim(-1), Some(4));
        assert_eq!(shape.dim(-3), None);
    }

    #[test]
    fn test_equality() {
        assert_eq!(shape![2, 3], shape![2, 3]);
        assert_ne!(shape![2, 3], shape![3, 2]);
        assert_ne!(shape![1, 2, 3, 4, 5], shape![1, 2, 3, 4]);
        assert_eq!(Shape::vector(5), shape![5]);

        let mut set = HashSet::new();
        set.insert(shape![2, 3]);
        set.insert(shape![2, 3]);
        set.insert(shape![3, 2]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = shape![2, 3];
        let clone = original.clone();
        let changed = clone.change_tensor_layout(Order::ColumnMajor);
        assert_eq!(original.strides().to_vec(), vec![3, 1]);
        assert_eq!(clone.strides().to_vec(), vec![3, 1]);
        assert_eq!(changed.strides().to_vec(), vec![1, 2]);
    }

    #[test]
    fn test_cmp_size() {
        assert_eq!(shape![2, 3].cmp_size(&shape![6]), Ordering::Equal);
        assert_eq!(shape![2, 3].cmp_size(&shape![7]), Ordering::Less);
        assert_eq!(shape![2, 4].cmp_size(&Shape::scalar()), Ordering::Greater);
    }

    #[test]
    fn test_multi_broadcast() {
        let a = shape![8, 1, 6, 1];
        let b = shape![7, 1, 5];
        assert_eq!(Shape::multi_broadcast(&[&a, &b]), Some(shape![8, 7, 6, 5]));
        assert_eq!(Shape::multi_broadcast(&[&shape![3], &shape![4]]), None);
        assert_eq!(Shape::multi_broadcast(&[]), None);
    }

    #[test]
    fn test_formatting() {
        assert_eq!(shape![2, 3].to_string(), "(2, 3)");
        assert_eq!(format!("{:?}", shape![2, 3]), "[2x3]");
        assert_eq!(
            format!("{:?}", shape![2, 3].change_tensor_layout(Order::ColumnMajor)),
            "[2x3;F]"
        );
        assert_eq!(Shape::scalar().to_string(), "()");
    }

    #[test]
    fn test_try_into_array() {
        let shape = shape![2, 3, 4];
        let [a, b, c]: [usize; 3] = (&shape).try_into().unwrap();
        assert_eq!((a, b, c), (2, 3, 4));
        let err = <[usize; 2]>::try_from(&shape).unwrap_err();
        assert_eq!(
            err,
            ShapeError::RankMismatch {
                expected: 2,
                actual: 3
            }
        );
    }
}
