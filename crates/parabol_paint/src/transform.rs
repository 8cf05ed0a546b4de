//! 2D affine transforms and the transform stack glyph quads are positioned through

/// 2D affine transform
///
/// Maps `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform2D {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform2D {
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn translate(x: f32, y: f32) -> Self {
        Self {
            e: x,
            f: y,
            ..Self::identity()
        }
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::identity()
        }
    }

    /// `self` applied after `local`: points go through `local` first
    pub fn then_local(&self, local: &Transform2D) -> Self {
        Self {
            a: self.a * local.a + self.c * local.b,
            b: self.b * local.a + self.d * local.b,
            c: self.a * local.c + self.c * local.d,
            d: self.b * local.c + self.d * local.d,
            e: self.a * local.e + self.c * local.f + self.e,
            f: self.b * local.e + self.d * local.f + self.f,
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> [f32; 2] {
        [
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        ]
    }
}

/// Stack of accumulated transforms
///
/// The top of the stack is the current transform. `translate`/`scale` compose
/// onto the top in local space, like a matrix stack in an immediate-mode renderer.
#[derive(Clone, Debug)]
pub struct TransformStack {
    stack: Vec<Transform2D>,
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformStack {
    pub fn new() -> Self {
        Self {
            stack: vec![Transform2D::identity()],
        }
    }

    pub fn with_root(root: Transform2D) -> Self {
        Self { stack: vec![root] }
    }

    pub fn current(&self) -> Transform2D {
        self.stack
            .last()
            .copied()
            .unwrap_or_else(Transform2D::identity)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn push(&mut self) {
        let top = self.current();
        self.stack.push(top);
    }

    /// Pop the current transform. The root entry is never popped.
    pub fn pop(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        } else {
            tracing::warn!("TransformStack::pop on root transform ignored");
        }
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.compose(Transform2D::translate(x, y));
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.compose(Transform2D::scale(sx, sy));
    }

    fn compose(&mut self, local: Transform2D) {
        if let Some(top) = self.stack.last_mut() {
            *top = top.then_local(&local);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_then_scale() {
        let mut stack = TransformStack::new();
        stack.push();
        stack.translate(10.0, 20.0);
        stack.scale(0.5, 0.5);

        // Scale applies first (local), then translation
        assert_eq!(stack.current().apply(4.0, 8.0), [12.0, 24.0]);

        stack.pop();
        assert_eq!(stack.current(), Transform2D::identity());
    }

    #[test]
    fn test_root_is_never_popped() {
        let mut stack = TransformStack::with_root(Transform2D::translate(1.0, 1.0));
        stack.pop();
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.current().apply(0.0, 0.0), [1.0, 1.0]);
    }
}
