//! Grouping of the six cube faces into multi-render-target passes.

/// Number of faces in a cubemap.
pub const CUBE_FACE_COUNT: u32 = 6;

/// A run of consecutive cube faces rendered by one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceChunk {
    pub index: u32,
    pub first_face: u32,
    pub size: u32,
}

/// Partition faces 0..6 into chunks no larger than the device's
/// simultaneous color attachment count.
pub fn partition_faces(max_color_attachments: u32) -> Vec<FaceChunk> {
    let chunk_size = max_color_attachments.clamp(1, CUBE_FACE_COUNT);
    let mut chunks = Vec::new();
    let mut first_face = 0;
    let mut index = 0;
    while first_face < CUBE_FACE_COUNT {
        let size = chunk_size.min(CUBE_FACE_COUNT - first_face);
        chunks.push(FaceChunk {
            index,
            first_face,
            size,
        });
        first_face += size;
        index += 1;
    }
    chunks
}
