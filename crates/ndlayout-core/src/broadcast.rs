use crate::{rvec, RVec, Shape, ShapeError, Strides};

/// # BroadcastInfo
///
/// A shape stretched to a larger one under numpy broadcasting rules. Dimensions are
/// aligned from the right, missing leading axes and size 1 axes repeat with stride 0.
///
/// See https://numpy.org/doc/stable/user/basics.broadcasting.html
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastInfo {
    original_shape: Shape,
    broadcast_shape: Shape,
    strides: Strides,
}

impl BroadcastInfo {
    pub fn new(original: &Shape, target: &Shape) -> Result<Self, ShapeError> {
        let mismatch = || ShapeError::BroadcastMismatch {
            from: original.clone(),
            to: target.clone(),
        };
        let pad = target
            .rank()
            .checked_sub(original.rank())
            .ok_or_else(mismatch)?;

        let mut strides = rvec![0; target.rank()];
        for (axis, &dim) in original.iter().enumerate() {
            let target_dim = target[axis + pad];
            if dim == target_dim {
                strides[axis + pad] = original.strides()[axis];
            } else if dim != 1 {
                return Err(mismatch());
            }
        }
        log::trace!("Broadcast {:?} -> {:?}", original, target);
        Ok(Self {
            original_shape: original.clone(),
            broadcast_shape: target.clone(),
            strides: strides.into(),
        })
    }

    /// The common shape every one of `shapes` broadcasts to.
    pub fn resolve_shape(shapes: &[&Shape]) -> Result<Shape, ShapeError> {
        let mut resolved = Shape::scalar();
        for &shape in shapes {
            resolved = Shape::multi_broadcast(&[&resolved, shape]).ok_or_else(|| {
                ShapeError::BroadcastMismatch {
                    from: shape.clone(),
                    to: resolved.clone(),
                }
            })?;
        }
        Ok(resolved)
    }

    /// Broadcast every shape to their common shape.
    pub fn broadcast_all(shapes: &[&Shape]) -> Result<RVec<BroadcastInfo>, ShapeError> {
        let target = Self::resolve_shape(shapes)?;
        shapes
            .iter()
            .map(|shape| BroadcastInfo::new(shape, &target))
            .collect()
    }

    pub fn original_shape(&self) -> &Shape {
        &self.original_shape
    }

    pub fn shape(&self) -> &Shape {
        &self.broadcast_shape
    }

    /// Original strides aligned to the broadcast shape.
    pub fn strides(&self) -> &Strides {
        &self.strides
    }

    /// The original dimensions left-padded with 1 up to the broadcast rank.
    pub fn unreduced_shape(&self) -> Shape {
        let pad = self.pad();
        let mut dims: RVec<usize> = rvec![1; pad];
        dims.extend_from_slice(self.original_shape.dims());
        Shape::with_order(dims, self.original_shape.order())
    }

    /// Axes of the broadcast shape that repeat original data.
    pub fn broadcast_axes(&self) -> RVec<usize> {
        let pad = self.pad();
        self.broadcast_shape
            .iter()
            .enumerate()
            .filter(|&(axis, &dim)| axis < pad || self.original_shape[axis - pad] != dim)
            .map(|(axis, _)| axis)
            .collect()
    }

    /// Original coordinates read by the broadcast coordinate `coords`.
    pub fn unbroadcast_coords(&self, coords: &[usize]) -> RVec<usize> {
        let pad = self.pad();
        coords
            .iter()
            .skip(pad)
            .zip(self.original_shape.iter())
            .map(|(&coord, &dim)| if dim == 1 { 0 } else { coord })
            .collect()
    }

    #[inline]
    pub fn offset_unchecked(&self, coords: &[usize]) -> usize {
        self.strides.offset(coords) as usize
    }

    pub fn offset(&self, coords: &[usize]) -> Result<usize, ShapeError> {
        self.broadcast_shape.check_coords(coords)?;
        Ok(self.offset_unchecked(coords))
    }

    /// Broadcast views alias original elements, writing through them is refused.
    pub fn is_writeable(&self) -> bool {
        false
    }

    fn pad(&self) -> usize {
        self.broadcast_shape.rank() - self.original_shape.rank()
    }
}
