use crate::Result;
use crate::errors::RoiError;
use crate::mask::{LiftBounds, MaskBounds, MaskLevel};
use std::collections::BTreeMap;

type Lifted<M> = <<M as MaskLevel>::Bounds as LiftBounds>::Lifted;

/// A mask one dimension higher than `M`, stored as one `M` per index along the new outermost
/// axis. The bounds cover the union of the slice bounds on the inner axes and exactly the slice
/// range on the outer axis, so `slices[i]` sits at outer index `outer_start + i`.
#[derive(Debug, Clone)]
pub struct SliceMask<M>
where
    M: MaskLevel,
    M::Bounds: LiftBounds,
{
    bounds: Lifted<M>,
    slices: Vec<M>,
}

impl<M> SliceMask<M>
where
    M: MaskLevel,
    M::Bounds: LiftBounds,
{
    /// Create a mask from bounds and one slice per index of the outer axis of the bounds.
    pub fn new(bounds: Lifted<M>, slices: Vec<M>) -> Result<Self> {
        let (_, _, outer_size) = M::Bounds::split(&bounds);
        let expected = outer_size.max(0) as usize;
        if slices.len() != expected {
            return Err(RoiError::SliceCountMismatch {
                expected,
                actual: slices.len(),
            }
            .into());
        }
        Ok(Self { bounds, slices })
    }

    /// Build a mask from slices keyed by their outer index. Gaps between keys become empty
    /// slices and the inner bounds are the union of the non-empty slice bounds.
    pub fn from_slices(slices: BTreeMap<i32, M>) -> Self {
        let (Some(first), Some(last)) = (
            slices.keys().next().copied(),
            slices.keys().next_back().copied(),
        ) else {
            return Self::empty();
        };

        let inner = slices
            .values()
            .filter(|m| !m.bounds().is_empty_bounds())
            .fold(M::Bounds::empty_bounds(), |acc, m| acc.union_bounds(&m.bounds()));
        if inner.is_empty_bounds() {
            return Self::empty();
        }

        let mut slices = slices;
        let dense = (first..=last)
            .map(|k| slices.remove(&k).unwrap_or_else(M::empty))
            .collect();

        Self {
            bounds: inner.lift(first, last - first + 1),
            slices: dense,
        }
    }

    /// The range of indices along the outer axis which have a slice.
    pub fn outer_range(&self) -> std::ops::Range<i32> {
        let (_, pos, size) = M::Bounds::split(&self.bounds);
        pos..pos + size.max(0)
    }

    pub fn slice(&self, index: i32) -> Option<&M> {
        let (_, pos, _) = M::Bounds::split(&self.bounds);
        let i = index.checked_sub(pos)?;
        if i < 0 {
            return None;
        }
        self.slices.get(i as usize)
    }

    /// Iterate over the slices together with their outer index.
    pub fn slices(&self) -> impl Iterator<Item = (i32, &M)> {
        self.outer_range().zip(self.slices.iter())
    }

    fn to_map(&self) -> BTreeMap<i32, M> {
        self.slices()
            .filter(|(_, m)| !m.is_empty())
            .map(|(k, m)| (k, m.clone()))
            .collect()
    }
}

impl<M> MaskLevel for SliceMask<M>
where
    M: MaskLevel,
    M::Bounds: LiftBounds,
{
    type Bounds = Lifted<M>;

    const DIM: usize = M::DIM + 1;

    fn empty() -> Self {
        Self {
            bounds: <Lifted<M> as MaskBounds>::empty_bounds(),
            slices: Vec::new(),
        }
    }

    fn bounds(&self) -> Self::Bounds {
        self.bounds
    }

    fn cardinality(&self) -> usize {
        self.slices.iter().map(|m| m.cardinality()).sum()
    }

    fn is_empty(&self) -> bool {
        self.slices.iter().all(|m| m.is_empty())
    }

    fn contains_coords(&self, coords: &[i32]) -> bool {
        let n = M::DIM;
        self.slice(coords[n])
            .is_some_and(|m| m.contains_coords(&coords[..n]))
    }

    fn contains_mask(&self, other: &Self) -> bool {
        other
            .slices()
            .filter(|(_, om)| !om.is_empty())
            .all(|(k, om)| self.slice(k).is_some_and(|m| m.contains_mask(om)))
    }

    fn intersects_mask(&self, other: &Self) -> bool {
        other
            .slices()
            .any(|(k, om)| self.slice(k).is_some_and(|m| m.intersects_mask(om)))
    }

    fn optimize_bounds(&mut self) {
        let mut map = BTreeMap::new();
        for (k, m) in self.slices() {
            let mut m = m.clone();
            m.optimize_bounds();
            if !m.is_empty() {
                map.insert(k, m);
            }
        }
        *self = Self::from_slices(map);
    }

    fn visit_points(&self, f: &mut dyn FnMut(&[i32])) {
        let n = M::DIM;
        let mut buffer = [0i32; 5];
        for (k, m) in self.slices() {
            m.visit_points(&mut |p| {
                buffer[..n].copy_from_slice(p);
                buffer[n] = k;
                f(&buffer[..=n]);
            });
        }
    }

    fn union(&self, other: &Self) -> Self {
        let mut map = self.to_map();
        for (k, om) in other.slices() {
            if om.is_empty() {
                continue;
            }
            let merged = match map.get(&k) {
                Some(m) => m.union(om),
                None => om.clone(),
            };
            map.insert(k, merged);
        }
        Self::from_slices(map)
    }

    fn intersection(&self, other: &Self) -> Self {
        let mut map = BTreeMap::new();
        for (k, m) in self.slices() {
            if let Some(om) = other.slice(k) {
                let both = m.intersection(om);
                if !both.is_empty() {
                    map.insert(k, both);
                }
            }
        }
        Self::from_slices(map)
    }

    fn subtraction(&self, other: &Self) -> Self {
        let mut map = BTreeMap::new();
        for (k, m) in self.slices() {
            let mut rest = match other.slice(k) {
                Some(om) => m.subtraction(om),
                None => m.clone(),
            };
            rest.optimize_bounds();
            if !rest.is_empty() {
                map.insert(k, rest);
            }
        }
        Self::from_slices(map)
    }
}
