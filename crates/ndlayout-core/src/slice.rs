use crate::RVec;
use lazy_static::lazy_static;
use regex::Regex;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SliceError {
    #[error("Invalid slice notation: '{text}'.")]
    Malformed { text: String },
    #[error("Slice step cannot be zero.")]
    ZeroStep,
    #[error("An index slice cannot also carry a stop or a step.")]
    IndexWithRange,
}

lazy_static! {
    static ref RANGE_NOTATION: Regex =
        Regex::new(r"^(?P<start>[+-]?\d+)?:(?P<stop>[+-]?\d+)?(?::(?P<step>[+-]?\d+)?)?$")
            .unwrap();
    static ref INDEX_NOTATION: Regex = Regex::new(r"^(?P<index>[+-]?\d+)$").unwrap();
    static ref DEF_NOTATION: Regex =
        Regex::new(r"^\((?P<start>[+-]?\d+)>>(?P<step>[+-]?\d+)\*(?P<count>\d+)\)$").unwrap();
}

/// # Slice
///
/// Extraction descriptor for one axis, `start:stop:step` or a single index.
///
/// Bounds are relative until resolved against an axis extent: negative values count
/// from the end, absent values mean "from the beginning"/"to the end" in the direction
/// of `step`. An index slice (`is_index`) picks exactly one element and drops the axis
/// when the owning shape is sliced with reduction.
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slice {
    start: Option<isize>,
    stop: Option<isize>,
    step: isize,
    is_index: bool,
}

impl Default for Slice {
    fn default() -> Self {
        Self::all()
    }
}

impl Slice {
    pub fn new(
        start: Option<isize>,
        stop: Option<isize>,
        step: isize,
    ) -> Result<Self, SliceError> {
        let mut builder = SliceBuilder::new().step(step);
        if let Some(start) = start {
            builder = builder.start(start);
        }
        if let Some(stop) = stop {
            builder = builder.stop(stop);
        }
        builder.build()
    }

    /// `:`
    pub const fn all() -> Self {
        Self {
            start: None,
            stop: None,
            step: 1,
            is_index: false,
        }
    }

    /// `0:0`, selects nothing.
    pub const fn none() -> Self {
        Self::range(0, 0)
    }

    /// `start:stop`
    pub const fn range(start: isize, stop: isize) -> Self {
        Self {
            start: Some(start),
            stop: Some(stop),
            step: 1,
            is_index: false,
        }
    }

    /// A single element, the axis is dropped when slicing with reduction.
    ///
    /// `isize::MAX` has no exclusive stop and keeps `stop` unset.
    pub const fn index(index: isize) -> Self {
        Self {
            start: Some(index),
            stop: index.checked_add(1),
            step: 1,
            is_index: true,
        }
    }

    pub fn start(&self) -> Option<isize> {
        self.start
    }

    pub fn stop(&self) -> Option<isize> {
        self.stop
    }

    pub fn step(&self) -> isize {
        self.step
    }

    pub fn is_index(&self) -> bool {
        self.is_index
    }

    /// Same start, stop and step, ignoring whether either side is an index.
    pub fn same_range(&self, other: &Slice) -> bool {
        self.start == other.start && self.stop == other.stop && self.step == other.step
    }

    /// Parse a single axis, e.g `1:5:2`, `::-1` or `-1`.
    ///
    /// Whitespace is ignored anywhere in the text.
    pub fn parse(text: &str) -> Result<Self, SliceError> {
        let malformed = || SliceError::Malformed {
            text: text.to_string(),
        };
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();

        let parse_int = |m: Option<regex::Match>| -> Result<Option<isize>, SliceError> {
            m.map(|m| m.as_str().parse::<isize>().map_err(|_| malformed()))
                .transpose()
        };

        if let Some(caps) = INDEX_NOTATION.captures(&compact) {
            let index = parse_int(caps.name("index"))?.ok_or_else(malformed)?;
            index.checked_add(1).ok_or_else(malformed)?;
            return SliceBuilder::new().index(index).build();
        }

        let caps = RANGE_NOTATION.captures(&compact).ok_or_else(malformed)?;
        let mut builder = SliceBuilder::new();
        if let Some(start) = parse_int(caps.name("start"))? {
            builder = builder.start(start);
        }
        if let Some(stop) = parse_int(caps.name("stop"))? {
            builder = builder.stop(stop);
        }
        if let Some(step) = parse_int(caps.name("step"))? {
            builder = builder.step(step);
        }
        builder.build()
    }

    /// Parse comma separated per-axis notation, e.g `1:5:2, ::3`.
    pub fn parse_slices(text: &str) -> Result<RVec<Slice>, SliceError> {
        let slices = text
            .split(',')
            .map(Slice::parse)
            .collect::<Result<RVec<_>, _>>()?;
        log::debug!("Parsed '{}' into {} slices", text, slices.len());
        Ok(slices)
    }

    pub fn format_slices(slices: &[Slice]) -> String {
        slices
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Absolute start on an axis of extent `dim`, no clamping.
    pub fn abs_start(&self, dim: usize) -> isize {
        let dim = dim as isize;
        match self.start {
            None if self.step < 0 => dim - 1,
            None => 0,
            Some(start) if start < 0 => dim + start,
            Some(start) => start,
        }
    }

    /// Absolute (exclusive) stop on an axis of extent `dim`, no clamping.
    ///
    /// A reverse slice without a stop ends one before the first element.
    pub fn abs_stop(&self, dim: usize) -> isize {
        if self.is_index {
            return self.abs_start(dim).saturating_add(1);
        }
        let dim = dim as isize;
        match self.stop {
            None if self.step < 0 => -1,
            None => dim,
            Some(stop) if stop < 0 => dim + stop,
            Some(stop) => stop,
        }
    }

    pub fn abs_step(&self) -> isize {
        self.step
    }

    /// Resolve against an axis of extent `dim`.
    ///
    /// Bounds are clamped into the axis the way numpy does, a request that runs
    /// backwards relative to `step` or past the end resolves to an empty [`SliceDef`].
    pub fn to_slice_def(&self, dim: usize) -> SliceDef {
        if self.is_index {
            return SliceDef::new(self.abs_start(dim), 1, 1);
        }
        let len = dim as isize;
        let step = self.step;
        let (lower, upper) = if step < 0 { (-1, len - 1) } else { (0, len) };
        let clamp = |bound: isize| {
            if bound < 0 {
                (bound + len).max(lower)
            } else {
                bound.min(upper)
            }
        };

        let start = match self.start {
            Some(start) => clamp(start),
            None if step < 0 => upper,
            None => lower,
        };
        let stop = match self.stop {
            Some(stop) => clamp(stop),
            None if step < 0 => lower,
            None => upper,
        };

        let span = if step < 0 { start - stop } else { stop - start };
        if span <= 0 {
            return SliceDef::empty();
        }
        let count = (span + step.abs() - 1) / step.abs();
        SliceDef::new(start, step, count as usize)
    }

    /// Number of elements this slice extracts from an axis of extent `dim`.
    pub fn get_size(&self, dim: usize) -> usize {
        if self.is_index {
            return 1;
        }
        self.to_slice_def(dim).count
    }

    /// Indices visited on an axis of extent `dim`, in order.
    pub fn indices(&self, dim: usize) -> impl Iterator<Item = usize> {
        self.to_slice_def(dim).iter()
    }
}

impl FromStr for Slice {
    type Err = SliceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Slice::parse(s)
    }
}

impl TryFrom<String> for Slice {
    type Error = SliceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Slice::parse(&s)
    }
}

impl From<Slice> for String {
    fn from(slice: Slice) -> Self {
        slice.to_string()
    }
}

impl std::fmt::Display for Slice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_index {
            return write!(f, "{}", self.start.unwrap_or(0));
        }
        if let Some(start) = self.start {
            write!(f, "{}", start)?;
        }
        write!(f, ":")?;
        if let Some(stop) = self.stop {
            write!(f, "{}", stop)?;
        }
        if self.step != 1 {
            write!(f, ":{}", self.step)?;
        }
        Ok(())
    }
}

/// # SliceBuilder
///
/// Typed construction of a [`Slice`], every other constructor goes through here.
#[derive(Debug, Default, Clone)]
pub struct SliceBuilder {
    start: Option<isize>,
    stop: Option<isize>,
    step: Option<isize>,
    index: Option<isize>,
}

impl SliceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(mut self, start: isize) -> Self {
        self.start = Some(start);
        self
    }

    pub fn stop(mut self, stop: isize) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn step(mut self, step: isize) -> Self {
        self.step = Some(step);
        self
    }

    pub fn index(mut self, index: isize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn build(self) -> Result<Slice, SliceError> {
        if let Some(index) = self.index {
            if self.start.is_some() || self.stop.is_some() || self.step.is_some() {
                return Err(SliceError::IndexWithRange);
            }
            let stop = index.checked_add(1).ok_or(SliceError::Malformed {
                text: index.to_string(),
            })?;
            return Ok(Slice {
                start: Some(index),
                stop: Some(stop),
                step: 1,
                is_index: true,
            });
        }
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Err(SliceError::ZeroStep);
        }
        Ok(Slice {
            start: self.start,
            stop: self.stop,
            step,
            is_index: false,
        })
    }
}

/// # SliceDef
///
/// A [`Slice`] resolved against a concrete axis: first index, signed step and element
/// count. Written as `(start>>step*count)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, derive_new::new)]
pub struct SliceDef {
    pub start: isize,
    pub step: isize,
    pub count: usize,
}

impl SliceDef {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The last visited index, if any.
    pub fn last(&self) -> Option<isize> {
        (self.count > 0).then(|| self.start + (self.count as isize - 1) * self.step)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> {
        let SliceDef { start, step, count } = *self;
        (0..count).map(move |k| (start + k as isize * step) as usize)
    }

    /// Compose with `child`, a def resolved against an axis of `self.count` elements.
    ///
    /// The result addresses the same axis `self` was resolved against.
    pub fn merge(&self, child: &SliceDef) -> SliceDef {
        if self.is_empty() || child.is_empty() {
            return SliceDef::empty();
        }
        SliceDef::new(
            self.start + child.start * self.step,
            self.step * child.step,
            child.count,
        )
    }

    /// A [`Slice`] that resolves back to this def on the axis it came from.
    pub fn to_slice(&self) -> Slice {
        if self.is_empty() {
            return Slice::none();
        }
        let stop = self.start + self.step * self.count as isize;
        Slice {
            start: Some(self.start),
            stop: (stop >= 0).then_some(stop),
            step: self.step,
            is_index: false,
        }
    }
}

impl std::fmt::Display for SliceDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}>>{}*{})", self.start, self.step, self.count)
    }
}

impl FromStr for SliceDef {
    type Err = SliceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || SliceError::Malformed {
            text: s.to_string(),
        };
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let caps = DEF_NOTATION.captures(&compact).ok_or_else(malformed)?;
        let field = |name: &str| caps.name(name).map(|m| m.as_str()).ok_or_else(malformed);
        Ok(SliceDef::new(
            field("start")?.parse().map_err(|_| malformed())?,
            field("step")?.parse().map_err(|_| malformed())?,
            field("count")?.parse().map_err(|_| malformed())?,
        ))
    }
}
