use crate::{RVec, Shape, ShapeError, Slice, SliceDef, Strides};

/// # ViewInfo
///
/// Provenance of a sliced view: the shape it was cut from and the per-axis slices
/// that cut it. Enough to address the parent buffer and to re-slice the view relative
/// to the same parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewInfo {
    original_shape: Shape,
    slices: RVec<Slice>,
    defs: RVec<SliceDef>,
    unreduced_shape: Shape,
    shape: Shape,
}

impl ViewInfo {
    /// Missing trailing slices select their whole axis.
    pub fn new(original: &Shape, slices: &[Slice]) -> Result<Self, ShapeError> {
        let rank = original.rank();
        if slices.len() > rank {
            return Err(ShapeError::TooManySlices {
                given: slices.len(),
                rank,
            });
        }
        let mut padded: RVec<Slice> = slices.iter().copied().collect();
        padded.resize(rank, Slice::all());

        let defs = padded
            .iter()
            .zip(original.iter())
            .enumerate()
            .map(|(axis, (slice, &dim))| {
                let def = slice.to_slice_def(dim);
                if slice.is_index() && (def.start < 0 || def.start as usize >= dim) {
                    return Err(ShapeError::IndexOutOfRange {
                        index: slice.start().unwrap_or_default(),
                        axis,
                        size: dim,
                    });
                }
                Ok(def)
            })
            .collect::<Result<RVec<_>, _>>()?;
        let unreduced_shape = original.slice(&padded, false)?;
        let shape = original.slice(&padded, true)?;
        log::trace!(
            "View {:?}[{}] -> {:?}",
            original,
            Slice::format_slices(&padded),
            shape
        );
        Ok(Self {
            original_shape: original.clone(),
            slices: padded,
            defs,
            unreduced_shape,
            shape,
        })
    }

    pub fn from_notation(original: &Shape, notation: &str) -> Result<Self, ShapeError> {
        Self::new(original, &Slice::parse_slices(notation)?)
    }

    pub fn original_shape(&self) -> &Shape {
        &self.original_shape
    }

    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    pub fn slice_defs(&self) -> &[SliceDef] {
        &self.defs
    }

    /// Shape of the view, index-sliced axes dropped.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Shape of the view with index-sliced axes kept at size 1.
    pub fn unreduced_shape(&self) -> &Shape {
        &self.unreduced_shape
    }

    /// Axes of the original shape dropped from [`ViewInfo::shape`].
    pub fn reduced_axes(&self) -> RVec<usize> {
        self.slices
            .iter()
            .enumerate()
            .filter_map(|(axis, slice)| slice.is_index().then_some(axis))
            .collect()
    }

    /// Offset of the first view element in the original buffer.
    pub fn base_offset(&self) -> usize {
        self.defs
            .iter()
            .zip(self.original_shape.strides().iter())
            .map(|(def, &stride)| def.start * stride)
            .sum::<isize>() as usize
    }

    /// Strides of [`ViewInfo::shape`] measured in the original buffer.
    pub fn strides(&self) -> Strides {
        self.defs
            .iter()
            .zip(self.slices.iter())
            .zip(self.original_shape.strides().iter())
            .filter(|((_, slice), _)| !slice.is_index())
            .map(|((def, _), &stride)| def.step * stride)
            .collect::<RVec<_>>()
            .into()
    }

    pub fn is_contiguous(&self) -> bool {
        self.strides()
            .is_contiguous(self.shape.dims(), self.original_shape.order())
    }

    /// Offset in the original buffer of the view coordinate `coords`.
    #[inline]
    pub fn offset_unchecked(&self, coords: &[usize]) -> usize {
        (self.base_offset() as isize + self.strides().offset(coords)) as usize
    }

    pub fn offset(&self, coords: &[usize]) -> Result<usize, ShapeError> {
        self.shape.check_coords(coords)?;
        Ok(self.offset_unchecked(coords))
    }

    /// Slice this view again.
    ///
    /// `slices` address the axes of [`ViewInfo::shape`]. The result still records
    /// slices of the original shape, `self` is left as it was.
    pub fn reslice(&self, slices: &[Slice]) -> Result<ViewInfo, ShapeError> {
        let rank = self.shape.rank();
        if slices.len() > rank {
            return Err(ShapeError::TooManySlices {
                given: slices.len(),
                rank,
            });
        }
        let mut children = slices.iter().enumerate();
        let composed = self
            .slices
            .iter()
            .zip(self.defs.iter())
            .map(|(parent, def)| {
                if parent.is_index() {
                    return Ok(*parent);
                }
                let (axis, child) = match children.next() {
                    Some((axis, &child)) => (axis, child),
                    None => return Ok(*parent),
                };
                let child_def = child.to_slice_def(def.count);
                if child.is_index() {
                    if child_def.start < 0 || child_def.start as usize >= def.count {
                        return Err(ShapeError::IndexOutOfRange {
                            index: child.start().unwrap_or_default(),
                            axis,
                            size: def.count,
                        });
                    }
                    return Ok(Slice::index(def.merge(&child_def).start));
                }
                Ok(def.merge(&child_def).to_slice())
            })
            .collect::<Result<RVec<_>, _>>()?;
        ViewInfo::new(&self.original_shape, &composed)
    }

    pub fn reslice_notation(&self, notation: &str) -> Result<ViewInfo, ShapeError> {
        self.reslice(&Slice::parse_slices(notation)?)
    }

    pub fn notation(&self) -> String {
        Slice::format_slices(&self.slices)
    }

    /// Writes through a slice view land on distinct parent elements.
    pub fn is_writeable(&self) -> bool {
        true
    }
}

impl std::fmt::Display for ViewInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.original_shape, self.notation())
    }
}
