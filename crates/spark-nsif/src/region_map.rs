//! `RegionMap<T>`：不重叠键区间到值的只读映射。
//!
//! # 设计意图（Why）
//! - [`crate::projector`] 每次重建投影都会产出全新的不可变 `RegionMap`，旧版本由仍在读取的
//!   线程通过 `Arc` 继续持有，天然避免读写竞争；
//! - 借鉴 `spark-router::DefaultRouter` 用整表替换换取“读路径零锁”的思路：这里把“路由表”换成
//!   “区间表”，把“按意图匹配”换成“按键二分查找”。
//!
//! # 契约（What）
//! - 构造后的 `RegionMap` 不可变；区间按 `start` 升序排列；
//! - 调用方负责保证传入的区间两两不重叠（本类型不做重叠校验，仅负责存储与查找）。

use std::fmt;

use crate::ids::KeyRange;

/// 只读的区间映射，按区间起点升序排列。
#[derive(Clone)]
pub struct RegionMap<T> {
    entries: Vec<(KeyRange, T)>,
}

impl<T> RegionMap<T> {
    /// 空映射，常用作"尚无已知分配"的初始值。
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn builder() -> RegionMapBuilder<T> {
        RegionMapBuilder {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按键查找覆盖该键的区间对应的值；区间析取性由构造方保证，因此二分查找即可定位。
    pub fn get(&self, key: &[u8]) -> Option<&T> {
        let idx = self
            .entries
            .partition_point(|(range, _)| range.start() <= key);
        idx.checked_sub(1)
            .and_then(|idx| self.entries.get(idx))
            .filter(|(range, _)| range.contains(key))
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&KeyRange, &T)> {
        self.entries.iter().map(|(range, value)| (range, value))
    }
}

impl<T> Default for RegionMap<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: fmt::Debug> fmt::Debug for RegionMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// `RegionMap` 的构建器，由 [`crate::projector::DirectoryProjector`] 在重建投影时使用。
pub struct RegionMapBuilder<T> {
    entries: Vec<(KeyRange, T)>,
}

impl<T> RegionMapBuilder<T> {
    pub fn insert(&mut self, range: KeyRange, value: T) -> &mut Self {
        self.entries.push((range, value));
        self
    }

    pub fn build(mut self) -> RegionMap<T> {
        self.entries.sort_by(|a, b| a.0.cmp(&b.0));
        RegionMap {
            entries: self.entries,
        }
    }
}

impl<T> Default for RegionMapBuilder<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: &[u8], end: &[u8]) -> KeyRange {
        KeyRange::new(start.to_vec(), end.to_vec())
    }

    #[test]
    fn empty_map_has_no_hits() {
        let map: RegionMap<u32> = RegionMap::empty();
        assert!(map.is_empty());
        assert_eq!(map.get(b"anything"), None);
    }

    #[test]
    fn get_finds_the_covering_range_regardless_of_insertion_order() {
        let map = RegionMap::builder()
            .insert(range(b"m", b"z"), 2u32)
            .insert(range(b"a", b"m"), 1u32)
            .build();

        assert_eq!(map.get(b"a"), Some(&1));
        assert_eq!(map.get(b"f"), Some(&1));
        assert_eq!(map.get(b"m"), Some(&2));
        assert_eq!(map.get(b"y"), Some(&2));
    }

    #[test]
    fn get_misses_keys_outside_every_range_and_at_the_upper_bound() {
        let map = RegionMap::builder().insert(range(b"a", b"m"), 1u32).build();

        assert_eq!(map.get(b"m"), None, "end bound is exclusive");
        assert_eq!(map.get(b"0"), None, "below the first range's start");
    }

    #[test]
    fn get_misses_in_a_gap_between_two_ranges() {
        let map = RegionMap::builder()
            .insert(range(b"a", b"b"), 1u32)
            .insert(range(b"d", b"e"), 2u32)
            .build();

        assert_eq!(map.get(b"c"), None);
    }

    #[test]
    fn len_and_is_empty_reflect_the_built_entry_count() {
        let map = RegionMap::builder()
            .insert(range(b"a", b"b"), 1u32)
            .insert(range(b"b", b"c"), 2u32)
            .build();

        assert_eq!(map.len(), 2);
        assert!(!map.is_empty());
    }

    proptest::proptest! {
        /// Builds a `RegionMap` from an arbitrary set of disjoint byte-range boundaries
        /// and checks every possible single-byte key against a reference linear scan.
        #[test]
        fn get_matches_linear_scan_over_random_disjoint_ranges(
            mut boundaries in proptest::collection::btree_set(0u8..200, 1..20),
        ) {
            boundaries.insert(255);
            let boundaries: Vec<u8> = boundaries.into_iter().collect();

            let mut builder = RegionMap::builder();
            let mut reference = Vec::new();
            for window in boundaries.windows(2) {
                let (start, end) = (window[0], window[1]);
                builder.insert(range(&[start], &[end]), start as u32);
                reference.push((start, end, start as u32));
            }
            let map = builder.build();

            for key in 0u8..255 {
                let expected = reference
                    .iter()
                    .find(|(start, end, _)| key >= *start && key < *end)
                    .map(|(_, _, value)| *value);
                proptest::prop_assert_eq!(map.get(&[key]), expected.as_ref());
            }
        }
    }
}
