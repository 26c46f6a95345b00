use crate::processing::store::EntityRecord;
use serde::{Serialize, Serializer};

/// Row layout: `[id, lng, lat, status, movingFlag]`.
pub const RENDER_STRIDE: usize = 5;

/// Flat per-frame buffer handed to the rendering surface.
///
/// Not `Clone`. Emission moves it to the consumer; every frame builds a new one.
#[derive(Debug, PartialEq)]
pub struct RenderBuffer {
    data: Vec<f32>,
}

impl RenderBuffer {
    pub fn rows(&self) -> usize {
        self.data.len() / RENDER_STRIDE
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&[f32]> {
        let start = index.checked_mul(RENDER_STRIDE)?;
        self.data.get(start..start + RENDER_STRIDE)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

impl Serialize for RenderBuffer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.data.serialize(serializer)
    }
}

/// Fills rows in decode order, sized up front for the frame's record count.
pub struct RenderBufferBuilder {
    data: Vec<f32>,
}

impl RenderBufferBuilder {
    pub fn with_rows(max_rows: usize) -> Self {
        Self {
            data: Vec::with_capacity(max_rows * RENDER_STRIDE),
        }
    }

    pub fn push(&mut self, record: &EntityRecord) {
        self.data.extend_from_slice(&[
            record.id as f32,
            record.lng as f32,
            record.lat as f32,
            f32::from(record.status),
            if record.is_moving { 1.0 } else { 0.0 },
        ]);
    }

    pub fn rows(&self) -> usize {
        self.data.len() / RENDER_STRIDE
    }

    pub fn finish(mut self) -> RenderBuffer {
        self.data.shrink_to_fit();
        RenderBuffer { data: self.data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i32, lat: f64, lng: f64, is_moving: bool) -> EntityRecord {
        EntityRecord {
            id,
            lat,
            lng,
            status: 1,
            last_update: 0,
            is_moving,
        }
    }

    #[test]
    fn rows_are_lng_before_lat() {
        let mut builder = RenderBufferBuilder::with_rows(2);
        builder.push(&record(1, 37.5, -122.0, true));
        builder.push(&record(2, 10.0, 20.0, false));
        let buffer = builder.finish();

        assert_eq!(buffer.rows(), 2);
        assert_eq!(buffer.row(0).unwrap(), &[1.0, -122.0, 37.5, 1.0, 1.0]);
        assert_eq!(buffer.row(1).unwrap(), &[2.0, 20.0, 10.0, 1.0, 0.0]);
        assert_eq!(buffer.row(2), None);
    }

    #[test]
    fn unused_capacity_is_truncated() {
        let mut builder = RenderBufferBuilder::with_rows(16);
        builder.push(&record(3, 0.0, 0.0, true));
        let buffer = builder.finish();
        assert_eq!(buffer.as_slice().len(), RENDER_STRIDE);
        assert_eq!(buffer.into_vec().len(), RENDER_STRIDE);
    }

    #[test]
    fn serializes_as_flat_array() {
        let mut builder = RenderBufferBuilder::with_rows(1);
        builder.push(&record(4, 1.5, 2.5, false));
        let json = serde_json::to_string(&builder.finish()).unwrap();
        assert_eq!(json, "[4.0,2.5,1.5,1.0,0.0]");
    }
}
