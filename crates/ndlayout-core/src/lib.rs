mod broadcast;
#[cfg(feature = "testing")]
mod ndarray_ext;
mod order;
mod shape;
mod slice;
mod strides;
mod view;

pub use broadcast::*;
#[cfg(feature = "testing")]
pub use ndarray_ext::*;
pub use order::*;
pub use shape::*;
pub use slice::*;
pub use strides::*;
pub use view::*;

use smallvec::SmallVec;
pub type RVec<T> = SmallVec<[T; 4]>;

//https://github.com/sonos/tract/blob/main/data/src/macros.rs#L2
#[macro_export]
macro_rules! rvec {
    (@one $x:expr) => (1usize);
    ($elem:expr; $n:expr) => ({
        $crate::RVec::from_elem($elem, $n)
    });
    ($($x:expr),*$(,)*) => ({
        let count = 0usize $(+ $crate::rvec![@one $x])*;
        #[allow(unused_mut)]
        let mut vec = $crate::RVec::new();
        if count <= vec.inline_size() {
            $(vec.push($x);)*
            vec
        } else {
            $crate::RVec::from_vec(vec![$($x,)*])
        }
    });
}

/// Row-major shape literal, `shape![2, 3]`.
#[macro_export]
macro_rules! shape {
    ($($x:expr),*$(,)*) => ({
        use $crate::rvec;
        $crate::Shape::new(rvec![$($x,)*])
    });
}

/// Per-axis slices from a notation literal, `slices!["1:5:2, ::3"]`.
///
/// Panics on malformed notation, it is meant for literals.
#[macro_export]
macro_rules! slices {
    ($notation:expr) => {{
        match $crate::Slice::parse_slices($notation) {
            Ok(slices) => slices,
            Err(e) => panic!("{}", e),
        }
    }};
}

pub mod prelude {
    pub use crate::{
        rvec, shape, slices, BroadcastInfo, Order, Shape, ShapeError, Slice, SliceDef,
        SliceError, Strides, ViewInfo,
    };
}
