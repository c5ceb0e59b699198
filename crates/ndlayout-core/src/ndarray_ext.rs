use crate::{BroadcastInfo, Order, RVec, Shape, SliceDef, Strides, ViewInfo};
use ndarray::{ArrayBase, ArrayViewD, Axis, Data, Dimension, IxDyn, ShapeBuilder};
use strum::IntoEnumIterator;

/// Layout queries on ndarray arrays, expressed in this crate's types.
pub trait NDArrayExt<A, S, D>
where
    S: Data<Elem = A>,
    D: Dimension,
{
    /// The [`Shape`] of a contiguous array, in whichever order it is stored.
    fn layout_shape(&self) -> anyhow::Result<Shape>;

    fn layout_strides(&self) -> Strides;
}

impl<A, S, D> NDArrayExt<A, S, D> for ArrayBase<S, D>
where
    S: Data<Elem = A>,
    D: Dimension,
{
    fn layout_shape(&self) -> anyhow::Result<Shape> {
        let dims: RVec<usize> = self.shape().into();
        let strides = self.layout_strides();
        if let Some(order) = Order::iter().find(|&order| Strides::new(&dims, order) == strides) {
            return Ok(Shape::with_order(dims, order));
        }
        // ndarray zeroes the strides of arrays without elements
        if self.is_standard_layout() {
            return Ok(Shape::with_order(dims, Order::RowMajor));
        }
        anyhow::bail!("Array with strides {:?} is not contiguous", self.strides())
    }

    fn layout_strides(&self) -> Strides {
        self.strides().iter().copied().collect::<RVec<_>>().into()
    }
}

impl Shape {
    pub fn to_ndarray_shape(&self) -> ndarray::Shape<IxDyn> {
        let dims = IxDyn(self.dims());
        match self.order() {
            Order::RowMajor => dims.into_shape(),
            Order::ColumnMajor => dims.f(),
        }
    }
}

impl From<SliceDef> for ndarray::Slice {
    fn from(def: SliceDef) -> Self {
        match def.last() {
            None => ndarray::Slice::new(0, Some(0), 1),
            Some(last) if def.step > 0 => ndarray::Slice::new(def.start, Some(last + 1), def.step),
            // ndarray walks negative steps back from the end of the range
            Some(last) => ndarray::Slice::new(last, Some(def.start + 1), def.step),
        }
    }
}

impl ViewInfo {
    /// Apply this view to `array`, which must have the original shape.
    pub fn view_ndarray<'a, A>(&self, array: ArrayViewD<'a, A>) -> anyhow::Result<ArrayViewD<'a, A>> {
        anyhow::ensure!(
            array.shape() == self.original_shape().dims(),
            "View of {} applied to array of shape {:?}",
            self.original_shape(),
            array.shape()
        );
        let mut view = array;
        // back to front so earlier axis numbers survive dropped axes
        for (axis, (slice, def)) in self
            .slices()
            .iter()
            .zip(self.slice_defs().iter())
            .enumerate()
            .rev()
        {
            if slice.is_index() {
                view = view.index_axis_move(Axis(axis), def.start as usize);
            } else {
                view.slice_axis_inplace(Axis(axis), (*def).into());
            }
        }
        Ok(view)
    }
}

impl BroadcastInfo {
    pub fn broadcast_ndarray<'a, A, S>(
        &self,
        array: &'a ArrayBase<S, IxDyn>,
    ) -> anyhow::Result<ArrayViewD<'a, A>>
    where
        S: Data<Elem = A>,
    {
        array
            .broadcast(self.shape().dims())
            .ok_or_else(|| anyhow::anyhow!("Cannot broadcast {:?} to {}", array.shape(), self.shape()))
    }
}

#[cfg(test)]
mod tests {
    use super::NDArrayExt;
    use crate::{rvec, shape, Order, Shape, SliceDef, ViewInfo};
    use ndarray::{Array, Array2, ArrayD, Dimension};
    use proptest::prelude::*;
    use test_strategy::proptest;

    fn offsets_array(shape: &Shape) -> ArrayD<usize> {
        Array::from_shape_vec(shape.to_ndarray_shape(), (0..shape.size()).collect()).unwrap()
    }

    #[proptest(cases = 64)]
    fn test_strides_match_ndarray(
        #[strategy(Shape::arbitrary_with(vec![1..=5, 1..=5, 1..=5, 1..=5]))] shape: Shape,
        column_major: bool,
    ) {
        let shape = if column_major {
            shape.change_tensor_layout(Order::ColumnMajor)
        } else {
            shape
        };
        let array = ArrayD::<f32>::zeros(shape.to_ndarray_shape());
        prop_assert_eq!(array.layout_strides(), shape.strides().clone());
        let detected = array.layout_shape().unwrap();
        prop_assert_eq!(detected.dims(), shape.dims());
        prop_assert_eq!(detected.strides(), shape.strides());
    }

    #[test]
    fn test_offsets_match_ndarray() {
        for order in [Order::RowMajor, Order::ColumnMajor] {
            let shape = Shape::with_order(rvec![2, 3, 4], order);
            // element values are their buffer offsets
            let array = offsets_array(&shape);
            for (coords, &value) in array.indexed_iter() {
                assert_eq!(shape.offset_unchecked(coords.slice()), value);
                assert_eq!(shape.coords(value).as_slice(), coords.slice());
            }
        }
    }

    #[test]
    fn test_non_contiguous_layout() {
        let array = Array2::<f32>::zeros((4, 6));
        let stepped = array.slice(ndarray::s![.., ..;2]);
        assert!(stepped.layout_shape().is_err());
    }

    #[test]
    fn test_slice_def_conversion() {
        let data = ndarray::Array1::from_iter(0..10usize);
        for (def, expected) in [
            (SliceDef::new(1, 3, 3), vec![1, 4, 7]),
            (SliceDef::new(9, -4, 3), vec![9, 5, 1]),
            (SliceDef::new(4, -1, 5), vec![4, 3, 2, 1, 0]),
            (SliceDef::empty(), vec![]),
        ] {
            let sliced = data.slice_axis(ndarray::Axis(0), def.into());
            assert_eq!(sliced.to_vec(), expected);
            assert_eq!(def.iter().collect::<Vec<_>>(), expected);
        }
    }

    #[test]
    fn test_view_matches_ndarray() {
        let original = shape![4, 5, 6];
        let array = offsets_array(&original);
        let view = ViewInfo::from_notation(&original, "::-2, 1, 4:0:-3").unwrap();
        let expected = view.view_ndarray(array.view()).unwrap();
        assert_eq!(expected.shape(), view.shape().dims());
        for (coords, &value) in expected.indexed_iter() {
            assert_eq!(view.offset(coords.slice()).unwrap(), value);
        }

        assert!(view.view_ndarray(offsets_array(&shape![4, 5]).view()).is_err());
    }
}
