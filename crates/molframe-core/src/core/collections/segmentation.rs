use std::ops::Range;

/// Partition of `0..count` into contiguous segments (residues of a model, chains of a model).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation {
    offsets: Vec<usize>,
    index: Vec<usize>,
}

impl Default for Segmentation {
    fn default() -> Self {
        Self::from_offsets(Vec::new())
    }
}

/// A run of positions `start..end` inside a sorted index slice that all fall in segment `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

impl Segment {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl Segmentation {
    /// Builds a segmentation from boundaries `[0, b1, b2, ..., count]`.
    pub fn from_offsets(offsets: Vec<usize>) -> Self {
        let count = offsets.last().copied().unwrap_or(0);
        let mut index = vec![0; count];
        for (segment, bounds) in offsets.windows(2).enumerate() {
            index[bounds[0]..bounds[1]].fill(segment);
        }
        let offsets = if offsets.is_empty() { vec![0] } else { offsets };
        Self { offsets, index }
    }

    /// Number of segments.
    pub fn count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Number of segmented elements.
    pub fn element_count(&self) -> usize {
        self.index.len()
    }

    pub fn segment_of(&self, element: usize) -> usize {
        self.index[element]
    }

    pub fn range(&self, segment: usize) -> Range<usize> {
        self.offsets[segment]..self.offsets[segment + 1]
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Walks a strictly increasing slice of element indices one segment at a time.
    pub fn segments<'a>(&'a self, elements: &'a [usize]) -> Segments<'a> {
        Segments {
            segmentation: self,
            elements,
            position: 0,
            end: elements.len(),
        }
    }

    /// Same as [`Self::segments`] restricted to `elements[range]`; yielded positions stay
    /// relative to the full slice.
    pub fn segments_in<'a>(&'a self, elements: &'a [usize], range: Range<usize>) -> Segments<'a> {
        Segments {
            segmentation: self,
            elements,
            position: range.start,
            end: range.end,
        }
    }
}

pub struct Segments<'a> {
    segmentation: &'a Segmentation,
    elements: &'a [usize],
    position: usize,
    end: usize,
}

impl Iterator for Segments<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.end {
            return None;
        }
        let start = self.position;
        let segment = self.segmentation.segment_of(self.elements[start]);
        let boundary = self.segmentation.offsets[segment + 1];
        let run = self.elements[start..self.end].partition_point(|&e| e < boundary);
        self.position = start + run;
        Some(Segment {
            index: segment,
            start,
            end: self.position,
        })
    }
}
