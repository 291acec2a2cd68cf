//! Affine transform stack handed to producers.

/// Row-major 3x4 affine matrix.
type Affine = [[f32; 4]; 3];

const IDENTITY: Affine = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
];

/// Push/pop stack of affine transforms.
///
/// Operations post-multiply the top entry, so the last operation applied is
/// the first one a point goes through.
#[derive(Debug, Clone)]
pub struct TransformStack {
    stack: Vec<Affine>,
}

impl TransformStack {
    /// Creates a stack holding the identity.
    #[must_use]
    pub fn new() -> Self {
        let mut stack = Vec::with_capacity(8);
        stack.push(IDENTITY);
        Self { stack }
    }

    /// Creates a stack whose base entry is a translation.
    #[must_use]
    pub fn translated(offset: [f32; 3]) -> Self {
        let mut transform = Self::new();
        transform.translate(offset);
        transform
    }

    /// Duplicates the top entry.
    pub fn push(&mut self) {
        let top = *self.top();
        self.stack.push(top);
    }

    /// Discards the top entry. The base entry is never popped.
    pub fn pop(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// Stack depth, counting the base entry.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Pops entries until the stack is at most `depth` deep. The base entry
    /// is kept even for a depth of zero.
    pub fn truncate_to(&mut self, depth: usize) {
        self.stack.truncate(depth.max(1));
    }

    /// Appends a translation.
    pub fn translate(&mut self, offset: [f32; 3]) {
        let m = self.top_mut();
        for row in m.iter_mut() {
            row[3] += row[0] * offset[0] + row[1] * offset[1] + row[2] * offset[2];
        }
    }

    /// Appends a per-axis scale.
    pub fn scale(&mut self, factor: [f32; 3]) {
        let m = self.top_mut();
        for row in m.iter_mut() {
            row[0] *= factor[0];
            row[1] *= factor[1];
            row[2] *= factor[2];
        }
    }

    /// Appends a rotation about the Y axis.
    pub fn rotate_y(&mut self, radians: f32) {
        let (sin, cos) = radians.sin_cos();
        let m = self.top_mut();
        for row in m.iter_mut() {
            let (a, c) = (row[0], row[2]);
            row[0] = a * cos - c * sin;
            row[2] = a * sin + c * cos;
        }
    }

    /// Transforms a point by the top entry.
    #[must_use]
    pub fn apply(&self, point: [f32; 3]) -> [f32; 3] {
        let m = self.top();
        let mut out = [0.0; 3];
        for (o, row) in out.iter_mut().zip(m.iter()) {
            *o = row[0] * point[0] + row[1] * point[1] + row[2] * point[2] + row[3];
        }
        out
    }

    fn top(&self) -> &Affine {
        // The base entry is never popped.
        &self.stack[self.stack.len() - 1]
    }

    fn top_mut(&mut self) -> &mut Affine {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}
